//! Review analytics for the customer-feedback dashboard.
//!
//! Raw reviews from the persistence service are normalized once and then
//! fed to pure aggregation functions (statistics, histogram, time series,
//! geography, filtering). The insight session is the only stateful,
//! asynchronous part.

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod geo;
pub mod histogram;
pub mod insights;
pub mod models;
pub mod normalize;
pub mod refresh;
pub mod report;
pub mod seed;
pub mod session;
pub mod source;
pub mod stats;
pub mod timeseries;

#[cfg(test)]
mod fixtures;

pub use config::EngineConfig;
pub use error::{ConfigError, InsightError, SourceError};
pub use filter::{filter, CitySelector, RatingSelector, ReviewFilter};
pub use geo::{project_for_map, top_cities, CityCoordinates};
pub use histogram::build_histogram;
pub use insights::{InsightProvider, InsightSession};
pub use models::{
    CityAggregate, DerivedStatistics, InsightBucket, InsightStatus, MapPoint,
    RatingHistogramEntry, RawReview, ReviewRecord, ReviewStatus, TimeBucket,
};
pub use normalize::normalize;
pub use session::{DashboardSession, DashboardSnapshot};
pub use source::ReviewSource;
pub use stats::compute_statistics;
pub use timeseries::{build_timeline, build_trailing_window};
