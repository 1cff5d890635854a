use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
/// Every rating bucket, ascending.
pub const RATINGS: [u8; 5] = [1, 2, 3, 4, 5];

/// A review as the persistence service hands it over, before any validation.
///
/// Every field is loosely typed so a single malformed record cannot fail the
/// decoding of the whole corpus; `normalize` decides what survives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub city: Option<Value>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub review: Option<Value>,
    #[serde(default, alias = "aiSummary")]
    pub ai_summary: Option<Value>,
    #[serde(default, alias = "aiAction")]
    pub ai_action: Option<Value>,
    #[serde(default, alias = "aiUserResponse")]
    pub ai_user_response: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Complete,
    PendingEnrichment,
    EnrichmentFailed,
}

impl ReviewStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "complete" => Some(Self::Complete),
            "pending_enrichment" | "pending_ai" | "pending" => Some(Self::PendingEnrichment),
            "enrichment_failed" | "ai_failed" | "failed" => Some(Self::EnrichmentFailed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub rating: u8,
    pub review: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_action: Option<String>,
    #[serde(rename = "ai_user_response")]
    pub ai_reply: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

impl ReviewRecord {
    pub fn is_negative(&self) -> bool {
        self.rating <= 2
    }

    /// The generated summary, but only once enrichment has completed.
    pub fn authoritative_summary(&self) -> Option<&str> {
        match self.status {
            ReviewStatus::Complete => self.ai_summary.as_deref(),
            _ => None,
        }
    }

    pub fn authoritative_action(&self) -> Option<&str> {
        match self.status {
            ReviewStatus::Complete => self.ai_action.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedStatistics {
    pub total: usize,
    pub average_rating: f64,
    pub distinct_city_count: usize,
    pub negative_ratio: f64,
    pub recent_count: usize,
}

impl DerivedStatistics {
    pub fn negative_percent(&self) -> f64 {
        self.negative_ratio * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingHistogramEntry {
    pub rating: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    pub day: NaiveDate,
    pub count: usize,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityAggregate {
    pub city: String,
    pub count: usize,
    pub rank: usize,
}

/// Marker class of a single review on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub fn from_rating(rating: u8) -> Self {
        match rating {
            0..=2 => Sentiment::Negative,
            3 => Sentiment::Neutral,
            _ => Sentiment::Positive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub review_id: String,
    pub city: String,
    pub longitude: f64,
    pub latitude: f64,
    pub rating: u8,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightBucket {
    pub rating: u8,
    pub status: InsightStatus,
    pub items: Vec<String>,
    pub error: Option<String>,
}
