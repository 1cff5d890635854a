use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{DerivedStatistics, ReviewRecord};

pub fn default_recent_window() -> Duration {
    Duration::hours(24)
}

pub fn compute_statistics(
    records: &[ReviewRecord],
    now: DateTime<Utc>,
    recent_window: Duration,
) -> DerivedStatistics {
    let total = records.len();
    if total == 0 {
        return DerivedStatistics::default();
    }

    let rating_sum: u64 = records.iter().map(|r| r.rating as u64).sum();
    let negative = records.iter().filter(|r| r.is_negative()).count();
    let cities: HashSet<&str> = records.iter().filter_map(|r| r.city.as_deref()).collect();
    let recent_count = records
        .iter()
        .filter(|r| now.signed_duration_since(r.created_at) < recent_window)
        .count();

    DerivedStatistics {
        total,
        average_rating: rating_sum as f64 / total as f64,
        distinct_city_count: cities.len(),
        negative_ratio: negative as f64 / total as f64,
        recent_count,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLevel {
    NeedsAttention,
    Neutral,
    Positive,
}

impl SentimentLevel {
    pub fn from_average(average_rating: f64) -> Self {
        if average_rating <= 2.5 {
            SentimentLevel::NeedsAttention
        } else if average_rating <= 3.5 {
            SentimentLevel::Neutral
        } else {
            SentimentLevel::Positive
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SentimentLevel::NeedsAttention => "Needs Attention",
            SentimentLevel::Neutral => "Neutral",
            SentimentLevel::Positive => "Positive",
        }
    }
}

/// Maps the mean rating onto 0..=100; an empty corpus scores 0.
pub fn sentiment_score(stats: &DerivedStatistics) -> f64 {
    if stats.total == 0 {
        return 0.0;
    }
    (((stats.average_rating - 1.0) / 4.0) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, review};

    #[test]
    fn empty_corpus_is_all_zero() {
        let now = Utc::now();
        let stats = compute_statistics(&[], now, default_recent_window());
        assert_eq!(
            stats,
            DerivedStatistics {
                total: 0,
                average_rating: 0.0,
                distinct_city_count: 0,
                negative_ratio: 0.0,
                recent_count: 0,
            }
        );
        assert!(!stats.average_rating.is_nan());
        assert_eq!(sentiment_score(&stats), 0.0);
    }

    #[test]
    fn pune_delhi_scenario() {
        let d1 = at(2026, 1, 10, 9);
        let d2 = at(2026, 1, 11, 9);
        let records = vec![
            review("1", 5, Some("Pune"), d1),
            review("2", 1, Some("Pune"), d1),
            review("3", 3, Some("Delhi"), d2),
        ];

        let stats = compute_statistics(&records, d2, default_recent_window());
        assert_eq!(stats.total, 3);
        assert!((stats.average_rating - 3.0).abs() < 1e-9);
        assert!((stats.negative_ratio - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.distinct_city_count, 2);
        assert_eq!(stats.recent_count, 1);
    }

    #[test]
    fn city_matching_is_exact_and_ignores_absent() {
        let now = at(2026, 1, 10, 9);
        let records = vec![
            review("1", 4, Some("Pune"), now),
            review("2", 4, Some("pune"), now),
            review("3", 4, None, now),
        ];
        let stats = compute_statistics(&records, now, default_recent_window());
        assert_eq!(stats.distinct_city_count, 2);
    }

    #[test]
    fn recent_window_is_relative_to_supplied_now() {
        let now = at(2026, 1, 10, 12);
        let records = vec![
            review("1", 4, None, now - Duration::hours(23)),
            review("2", 4, None, now - Duration::hours(24)),
            review("3", 4, None, now - Duration::days(3)),
        ];
        let stats = compute_statistics(&records, now, default_recent_window());
        assert_eq!(stats.recent_count, 1);

        let wide = compute_statistics(&records, now, Duration::days(7));
        assert_eq!(wide.recent_count, 3);
    }

    #[test]
    fn sentiment_levels_follow_health_bar_thresholds() {
        assert_eq!(SentimentLevel::from_average(2.5), SentimentLevel::NeedsAttention);
        assert_eq!(SentimentLevel::from_average(3.0), SentimentLevel::Neutral);
        assert_eq!(SentimentLevel::from_average(3.51), SentimentLevel::Positive);

        let stats = DerivedStatistics {
            total: 2,
            average_rating: 3.0,
            ..Default::default()
        };
        assert!((sentiment_score(&stats) - 50.0).abs() < 1e-9);
    }
}
