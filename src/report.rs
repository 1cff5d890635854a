use std::fmt::Write;

use crate::histogram::share;
use crate::models::ReviewRecord;
use crate::session::DashboardSnapshot;

pub fn build_report(scope: Option<&str>, snapshot: &DashboardSnapshot, records: &[ReviewRecord]) -> String {
    let stats = &snapshot.statistics;
    let mut output = String::new();
    let scope_label = scope.unwrap_or("all reviews");

    let _ = writeln!(output, "# Customer Feedback Report");
    let _ = writeln!(
        output,
        "Generated for {} at {}",
        scope_label,
        snapshot.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headline");
    let _ = writeln!(output, "- Total reviews: {}", stats.total);
    let _ = writeln!(
        output,
        "- Average rating: {:.2} ({}, score {:.0}/100)",
        stats.average_rating,
        snapshot.sentiment.label(),
        snapshot.sentiment_score
    );
    let _ = writeln!(output, "- Negative ratio: {:.1}%", stats.negative_percent());
    let _ = writeln!(output, "- Cities reached: {}", stats.distinct_city_count);
    let _ = writeln!(output, "- Recent reviews: {}", stats.recent_count);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Rating Mix");
    if stats.total == 0 {
        let _ = writeln!(output, "No reviews recorded yet.");
    } else {
        for entry in snapshot.histogram.iter().rev() {
            let _ = writeln!(
                output,
                "- {}★: {} ({:.0}%)",
                entry.rating,
                entry.count,
                share(entry, stats.total) * 100.0
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## {}-Day Trend", snapshot.trend.len());
    for bucket in snapshot.trend.iter() {
        if bucket.count == 0 {
            let _ = writeln!(output, "- {}: no reviews", bucket.day);
        } else {
            let _ = writeln!(
                output,
                "- {}: {} reviews (avg {:.1})",
                bucket.day, bucket.count, bucket.average_rating
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Cities");
    if snapshot.top_cities.is_empty() {
        let _ = writeln!(output, "No reviews with a city yet.");
    } else {
        for city in snapshot.top_cities.iter() {
            let _ = writeln!(output, "{}. {} ({} reviews)", city.rank, city.city, city.count);
        }
    }

    let mut recent: Vec<&ReviewRecord> = records.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Feedback");

    if recent.is_empty() {
        let _ = writeln!(output, "No reviews recorded yet.");
    } else {
        for record in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}★, {}) on {}: {}",
                record.name.as_deref().unwrap_or("Anonymous"),
                record.rating,
                record.city.as_deref().unwrap_or("Unknown city"),
                record.created_at.format("%Y-%m-%d"),
                record.review.as_deref().unwrap_or("No written feedback")
            );
            if let Some(action) = record.authoritative_action() {
                let _ = writeln!(output, "  - Recommended: {}", action);
            }
        }
    }

    output
}

/// One-line listing; pending or failed enrichment shows the review text instead.
pub fn review_line(record: &ReviewRecord) -> String {
    format!(
        "[{}★] {} ({}): {}",
        record.rating,
        record.name.as_deref().unwrap_or("Anonymous"),
        record.city.as_deref().unwrap_or("Global"),
        record
            .authoritative_summary()
            .or(record.review.as_deref())
            .unwrap_or("No written feedback")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::geo::CityCoordinates;
    use crate::models::ReviewStatus;
    use crate::fixtures::{at, enriched, review};
    use crate::session::build_snapshot;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snapshot_for(records: &[ReviewRecord]) -> DashboardSnapshot {
        build_snapshot(
            records,
            at(2026, 1, 12, 18),
            &EngineConfig::default(),
            &CityCoordinates::builtin(),
            &mut StdRng::seed_from_u64(0),
        )
    }

    #[test]
    fn empty_report_has_placeholders() {
        let report = build_report(None, &snapshot_for(&[]), &[]);
        assert!(report.contains("Generated for all reviews"));
        assert!(report.contains("- Total reviews: 0"));
        assert!(report.contains("- Average rating: 0.00"));
        assert!(report.contains("No reviews recorded yet."));
        assert!(report.contains("No reviews with a city yet."));
        assert!(report.contains("## 7-Day Trend"));
    }

    #[test]
    fn report_lists_newest_first_with_actions() {
        let records = vec![
            review("old", 2, Some("Delhi"), at(2026, 1, 5, 9)),
            enriched("new", 5, Some("Kochi"), "Super smooth", "Happy", at(2026, 1, 12, 9)),
        ];
        let report = build_report(Some("Kochi pilot"), &snapshot_for(&records), &records);

        assert!(report.contains("Generated for Kochi pilot"));
        let newest = report.find("Super smooth").expect("newest review");
        let oldest = report.find("No written feedback").expect("oldest review");
        assert!(newest < oldest);
        assert!(report.contains("Recommended: Follow up on new"));
        assert!(report.contains("1. Delhi (1 reviews)"));
        assert!(report.contains("- 5★: 1 (50%)"));
    }

    #[test]
    fn listing_ignores_summaries_from_failed_enrichment() {
        let mut failed = review("f", 2, Some("Pune"), at(2026, 1, 10, 9));
        failed.review = Some("App froze on login".to_string());
        failed.ai_summary = Some("AI processing failed".to_string());
        failed.status = ReviewStatus::EnrichmentFailed;
        assert_eq!(review_line(&failed), "[2★] Anonymous (Pune): App froze on login");

        let done = enriched("d", 5, None, "Loved it", "Happy customer", at(2026, 1, 10, 9));
        assert_eq!(review_line(&done), "[5★] Anonymous (Global): Happy customer");
    }
}
