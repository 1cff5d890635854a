use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::filter::{self, ReviewFilter};
use crate::geo::{self, CityCoordinates};
use crate::histogram;
use crate::insights::{InsightProvider, InsightSession};
use crate::models::{
    CityAggregate, DerivedStatistics, MapPoint, RatingHistogramEntry, RawReview, ReviewRecord,
    TimeBucket,
};
use crate::normalize::{normalize, NormalizeReport};
use crate::stats::{self, SentimentLevel};
use crate::timeseries;

/// Every aggregate the dashboard renders, computed at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub statistics: DerivedStatistics,
    pub sentiment: SentimentLevel,
    pub sentiment_score: f64,
    pub histogram: Vec<RatingHistogramEntry>,
    pub trend: Vec<TimeBucket>,
    pub timeline: Vec<TimeBucket>,
    pub top_cities: Vec<CityAggregate>,
    pub map_points: Vec<MapPoint>,
}

pub fn build_snapshot<R: rand::Rng>(
    records: &[ReviewRecord],
    now: DateTime<Utc>,
    config: &EngineConfig,
    coordinates: &CityCoordinates,
    rng: &mut R,
) -> DashboardSnapshot {
    let statistics = stats::compute_statistics(records, now, config.recent_window());
    DashboardSnapshot {
        generated_at: now,
        sentiment: SentimentLevel::from_average(statistics.average_rating),
        sentiment_score: stats::sentiment_score(&statistics),
        histogram: histogram::build_histogram(records),
        trend: timeseries::build_trailing_window(records, now, config.trend_days, config.time_zone),
        timeline: timeseries::build_timeline(records, config.time_zone),
        top_cities: geo::top_cities(records, config.top_cities),
        map_points: geo::project_for_map(records, coordinates, config.map_jitter_degrees, rng),
        statistics,
    }
}

/// Explicit dashboard state: the current records, the active filter and
/// the insight cache.
pub struct DashboardSession {
    config: EngineConfig,
    coordinates: CityCoordinates,
    records: Vec<ReviewRecord>,
    filter: ReviewFilter,
    insights: InsightSession,
    rng: StdRng,
}

impl DashboardSession {
    pub fn new(config: EngineConfig, provider: Arc<dyn InsightProvider>, jitter_seed: u64) -> Self {
        Self {
            coordinates: config.city_coordinates(),
            config,
            records: Vec::new(),
            filter: ReviewFilter::default(),
            insights: InsightSession::new(provider),
            rng: StdRng::seed_from_u64(jitter_seed),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn records(&self) -> &[ReviewRecord] {
        &self.records
    }

    /// Replaces the whole record set; nothing is merged incrementally.
    pub fn replace_records(&mut self, raw: Vec<RawReview>) -> NormalizeReport {
        let (records, report) = normalize(raw);
        self.records = records;
        report
    }

    pub fn set_records(&mut self, records: Vec<ReviewRecord>) {
        self.records = records;
    }

    pub fn filter(&self) -> &ReviewFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ReviewFilter) {
        self.filter = filter;
    }

    pub fn filtered(&self) -> Vec<ReviewRecord> {
        filter::filter(&self.records, &self.filter)
    }

    pub fn city_options(&self) -> Vec<String> {
        filter::city_options(&self.records)
    }

    pub fn snapshot(&mut self, now: DateTime<Utc>) -> DashboardSnapshot {
        build_snapshot(&self.records, now, &self.config, &self.coordinates, &mut self.rng)
    }

    pub fn insights(&self) -> &InsightSession {
        &self.insights
    }

    /// Navigating away from the insights view drops the cached buckets.
    pub fn leave_insights(&self) {
        self.insights.invalidate();
    }
}
