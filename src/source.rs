use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::models::RawReview;

/// Read path of the persistence service: the full review corpus.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn fetch_reviews(&self) -> Result<Vec<RawReview>, SourceError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReviewPayload {
    Bare(Vec<Value>),
    Envelope { reviews: Vec<Value> },
}

/// Decodes either the `{success, reviews, meta}` envelope or a bare array.
/// Items that are not review-shaped objects are skipped.
pub fn decode_reviews(body: &str) -> Result<Vec<RawReview>, SourceError> {
    let payload: ReviewPayload =
        serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;
    let items = match payload {
        ReviewPayload::Bare(reviews) => reviews,
        ReviewPayload::Envelope { reviews } => reviews,
    };

    let mut raw = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RawReview>(item) {
            Ok(review) => raw.push(review),
            Err(err) => warn!("Skipping undecodable review - index={}, error={}", index, err),
        }
    }
    Ok(raw)
}

/// One CSV row, read verbatim. Cells stay text so ids like `007` or a
/// review body of `100` are not turned into numbers.
#[derive(Debug, Default, Deserialize)]
struct CsvRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    rating: Option<String>,
    #[serde(default)]
    review: Option<String>,
    #[serde(default, alias = "aiSummary")]
    ai_summary: Option<String>,
    #[serde(default, alias = "aiAction")]
    ai_action: Option<String>,
    #[serde(default, alias = "aiUserResponse")]
    ai_user_response: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "createdAt")]
    created_at: Option<String>,
}

impl From<CsvRow> for RawReview {
    fn from(row: CsvRow) -> Self {
        let text = |cell: Option<String>| cell.map(Value::String);
        RawReview {
            id: text(row.id),
            name: text(row.name),
            email: text(row.email),
            city: text(row.city),
            rating: text(row.rating),
            review: text(row.review),
            ai_summary: text(row.ai_summary),
            ai_action: text(row.ai_action),
            ai_user_response: text(row.ai_user_response),
            status: text(row.status),
            // Exports may carry epoch millis instead of an ISO string.
            created_at: row.created_at.map(|cell| match cell.trim().parse::<i64>() {
                Ok(millis) => Value::from(millis),
                Err(_) => Value::String(cell),
            }),
        }
    }
}

/// A CSV export with a header row using the backend's column names.
pub fn decode_csv<R: std::io::Read>(reader: R) -> Result<Vec<RawReview>, SourceError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut raw = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        match row {
            Ok(row) => raw.push(RawReview::from(row)),
            Err(err) => warn!("Skipping unreadable CSV row - index={}, error={}", index, err),
        }
    }
    Ok(raw)
}

/// Reviews exported to disk, as JSON (`.json`) or CSV (`.csv`).
#[derive(Debug, Clone)]
pub struct FileReviewSource {
    path: PathBuf,
}

impl FileReviewSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_csv(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }
}

#[async_trait]
impl ReviewSource for FileReviewSource {
    async fn fetch_reviews(&self) -> Result<Vec<RawReview>, SourceError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let raw = if self.is_csv() {
            decode_csv(contents.as_bytes())?
        } else {
            decode_reviews(&contents)?
        };
        debug!("Loaded reviews from {} - count={}", self.path.display(), raw.len());
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use std::io::Write;

    #[test]
    fn decodes_envelope_and_bare_arrays() {
        let envelope = r#"{"success": true, "reviews": [{"id": "a", "rating": 4}], "meta": {"total": 1}}"#;
        let bare = r#"[{"id": "a", "rating": 4}, {"id": "b", "rating": 2}]"#;
        assert_eq!(decode_reviews(envelope).expect("envelope").len(), 1);
        assert_eq!(decode_reviews(bare).expect("bare").len(), 2);
    }

    #[test]
    fn skips_items_that_are_not_objects() {
        let body = r#"[{"id": "a", "rating": 4}, 17, "oops"]"#;
        assert_eq!(decode_reviews(body).expect("decoded").len(), 1);
        assert!(matches!(
            decode_reviews("{not json"),
            Err(SourceError::Decode(_))
        ));
    }

    #[test]
    fn decodes_csv_exports() {
        let csv = "id,name,city,rating,review,created_at\n\
                   r1,Arjun Reddy,Kochi,5,Great,2026-01-10T10:00:00\n\
                   r2,,Madurai,9,Too high,2026-01-10T11:00:00\n\
                   r3,Sneha Pillai,,2,,2026-01-11T08:00:00\n";
        let raw = decode_csv(csv.as_bytes()).expect("csv");
        assert_eq!(raw.len(), 3);

        let (records, report) = normalize(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(records[0].city.as_deref(), Some("Kochi"));
        assert_eq!(records[1].city, None);
        assert_eq!(records[1].review, None);
    }

    #[test]
    fn csv_cells_keep_their_text() {
        let csv = "id,name,city,rating,review,created_at\n\
                   007,true,Pune,5,100,1768039200000\n";
        let (records, report) = normalize(decode_csv(csv.as_bytes()).expect("csv"));
        assert!(report.dropped.is_empty());

        let record = &records[0];
        assert_eq!(record.id, "007");
        assert_eq!(record.name.as_deref(), Some("true"));
        assert_eq!(record.review.as_deref(), Some("100"));
        assert_eq!(record.rating, 5);
        assert_eq!(record.created_at.timestamp_millis(), 1_768_039_200_000);
    }

    #[tokio::test]
    async fn file_source_picks_format_by_extension() {
        let dir = tempfile::tempdir().expect("temp dir");

        let json_path = dir.path().join("reviews.json");
        std::fs::write(
            &json_path,
            r#"{"reviews": [{"id": "a", "rating": 3, "created_at": "2026-01-10T10:00:00"}]}"#,
        )
        .expect("write json");

        let csv_path = dir.path().join("reviews.CSV");
        let mut file = std::fs::File::create(&csv_path).expect("create csv");
        writeln!(file, "id,rating,created_at").expect("header");
        writeln!(file, "b,1,2026-01-10T10:00:00").expect("row");
        writeln!(file, "c,2,2026-01-10T11:00:00").expect("row");

        let json = FileReviewSource::new(&json_path).fetch_reviews().await.expect("json");
        let csv = FileReviewSource::new(&csv_path).fetch_reviews().await.expect("csv");
        assert_eq!(json.len(), 1);
        assert_eq!(csv.len(), 2);

        let missing = FileReviewSource::new(dir.path().join("nope.json"))
            .fetch_reviews()
            .await;
        assert!(matches!(missing, Err(SourceError::Io { .. })));
    }
}
