use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{RawReview, ReviewRecord, ReviewStatus, MAX_RATING, MIN_RATING};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropReason {
    #[error("missing id")]
    MissingId,
    #[error("rating {0} is not an integer between 1 and 5")]
    InvalidRating(String),
    #[error("missing created_at")]
    MissingTimestamp,
    #[error("unparseable created_at {0}")]
    InvalidTimestamp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    pub index: usize,
    pub id: Option<String>,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub kept: usize,
    pub dropped: Vec<DroppedRecord>,
}

/// Validates a raw corpus, keeping input order and dropping what cannot be
/// coerced into a `ReviewRecord`.
pub fn normalize(raw: Vec<RawReview>) -> (Vec<ReviewRecord>, NormalizeReport) {
    let mut records = Vec::with_capacity(raw.len());
    let mut report = NormalizeReport::default();

    for (index, item) in raw.into_iter().enumerate() {
        let id = item.id.as_ref().and_then(coerce_id);
        match normalize_one(item) {
            Ok(record) => records.push(record),
            Err(reason) => {
                warn!("Dropping review - index={}, id={:?}, reason={}", index, id, reason);
                report.dropped.push(DroppedRecord { index, id, reason });
            }
        }
    }

    report.kept = records.len();
    debug!(
        "Normalized reviews - kept={}, dropped={}",
        report.kept,
        report.dropped.len()
    );
    (records, report)
}

pub fn normalize_one(raw: RawReview) -> Result<ReviewRecord, DropReason> {
    let id = raw
        .id
        .as_ref()
        .and_then(coerce_id)
        .ok_or(DropReason::MissingId)?;

    let rating = match raw.rating.as_ref() {
        Some(value) => coerce_rating(value).ok_or_else(|| DropReason::InvalidRating(value.to_string()))?,
        None => return Err(DropReason::InvalidRating("null".to_string())),
    };

    let created_at = match raw.created_at.as_ref() {
        Some(value) => parse_timestamp(value)
            .ok_or_else(|| DropReason::InvalidTimestamp(value.to_string()))?,
        None => return Err(DropReason::MissingTimestamp),
    };

    let ai_summary = raw.ai_summary.and_then(present_text);
    let status = raw
        .status
        .as_ref()
        .and_then(Value::as_str)
        .and_then(ReviewStatus::parse)
        .unwrap_or(if ai_summary.is_some() {
            ReviewStatus::Complete
        } else {
            ReviewStatus::PendingEnrichment
        });

    Ok(ReviewRecord {
        id,
        name: raw.name.and_then(present_text),
        email: raw.email.and_then(present_text),
        city: raw.city.and_then(present_text),
        rating,
        review: raw.review.and_then(present_text),
        ai_summary,
        ai_action: raw.ai_action.and_then(present_text),
        ai_reply: raw.ai_user_response.and_then(present_text),
        status,
        created_at,
    })
}

/// Accepts integers, integral floats and numeric strings in `1..=5`.
pub fn coerce_rating(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i as f64,
            None => n.as_f64()?,
        },
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if number.fract() != 0.0 || number < MIN_RATING as f64 || number > MAX_RATING as f64 {
        return None;
    }
    Some(number as u8)
}

fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Blank strings and non-string values are both "absent".
fn present_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

/// RFC 3339, naive ISO-8601 (UTC, as the backend writes it) or epoch millis.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
                return Some(parsed.with_timezone(&Utc));
            }
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
