//! Record builders shared by the unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{ReviewRecord, ReviewStatus};

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

pub fn review(id: &str, rating: u8, city: Option<&str>, created_at: DateTime<Utc>) -> ReviewRecord {
    ReviewRecord {
        id: id.to_string(),
        name: None,
        email: None,
        city: city.map(str::to_string),
        rating,
        review: None,
        ai_summary: None,
        ai_action: None,
        ai_reply: None,
        status: ReviewStatus::PendingEnrichment,
        created_at,
    }
}

pub fn enriched(
    id: &str,
    rating: u8,
    city: Option<&str>,
    text: &str,
    summary: &str,
    created_at: DateTime<Utc>,
) -> ReviewRecord {
    ReviewRecord {
        review: Some(text.to_string()),
        ai_summary: Some(summary.to_string()),
        ai_action: Some(format!("Follow up on {id}")),
        status: ReviewStatus::Complete,
        ..review(id, rating, city, created_at)
    }
}
