//! Periodic re-fetch of the review corpus.
//!
//! Every tick fetches the full corpus and rebuilds all aggregates from
//! scratch. The loop lives as long as the caller's `RefreshHandle`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::models::ReviewRecord;
use crate::normalize::{normalize, NormalizeReport};
use crate::session::{build_snapshot, DashboardSnapshot};
use crate::source::ReviewSource;

#[derive(Debug, Clone)]
pub struct RefreshUpdate {
    pub refreshed_at: DateTime<Utc>,
    pub records: Vec<ReviewRecord>,
    pub report: NormalizeReport,
    pub snapshot: DashboardSnapshot,
}

type Latest = Option<Arc<RefreshUpdate>>;

pub struct RefreshHandle {
    updates: watch::Receiver<Latest>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn subscribe(&self) -> watch::Receiver<Latest> {
        self.updates.clone()
    }

    /// Most recent successful refresh, if any.
    pub fn latest(&self) -> Latest {
        (*self.updates.borrow()).clone()
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Starts the refresh loop; the first fetch happens immediately. A failed
/// fetch is logged and the previous update stays current.
pub fn spawn_refresh(
    source: Arc<dyn ReviewSource>,
    config: EngineConfig,
    interval: Duration,
    jitter_seed: u64,
) -> RefreshHandle {
    let (tx, rx) = watch::channel::<Latest>(None);

    let task = tokio::spawn(async move {
        let coordinates = config.city_coordinates();
        let mut rng = StdRng::seed_from_u64(jitter_seed);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                debug!("Refresh loop has no subscribers left, stopping");
                break;
            }

            match source.fetch_reviews().await {
                Ok(raw) => {
                    let now = Utc::now();
                    let (records, report) = normalize(raw);
                    let snapshot = build_snapshot(&records, now, &config, &coordinates, &mut rng);
                    info!(
                        "Dashboard refreshed - records={}, dropped={}",
                        records.len(),
                        report.dropped.len()
                    );
                    tx.send_replace(Some(Arc::new(RefreshUpdate {
                        refreshed_at: now,
                        records,
                        report,
                        snapshot,
                    })));
                }
                Err(err) => warn!("Refresh failed, keeping previous data - error={}", err),
            }
        }
    });

    RefreshHandle { updates: rx, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::models::RawReview;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds for the first `successes` calls, then fails.
    struct CountingSource {
        calls: AtomicUsize,
        successes: usize,
    }

    impl CountingSource {
        fn new(successes: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                successes,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReviewSource for CountingSource {
        async fn fetch_reviews(&self) -> Result<Vec<RawReview>, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.successes {
                return Err(SourceError::Decode("backend returned garbage".to_string()));
            }
            let raw = vec![
                json!({"id": format!("r{call}"), "rating": 4, "city": "Pune", "created_at": Utc::now().to_rfc3339()}),
                json!({"id": "bad", "rating": 11, "created_at": Utc::now().to_rfc3339()}),
            ];
            Ok(raw
                .into_iter()
                .map(|v| serde_json::from_value(v).expect("raw review"))
                .collect())
        }
    }

    #[tokio::test]
    async fn publishes_a_fresh_snapshot_every_tick() {
        let source = CountingSource::new(usize::MAX);
        let handle = spawn_refresh(
            source.clone(),
            EngineConfig::default(),
            Duration::from_millis(10),
            1,
        );
        let mut updates = handle.subscribe();

        updates.changed().await.expect("first update");
        updates.changed().await.expect("second update");

        let latest = handle.latest().expect("latest update");
        assert_eq!(latest.records.len(), 1);
        assert_eq!(latest.report.dropped.len(), 1);
        assert_eq!(latest.snapshot.statistics.total, 1);
        assert_eq!(latest.snapshot.statistics.recent_count, 1);
        assert!(source.calls() >= 2);
    }

    #[tokio::test]
    async fn cancelled_loop_stops_fetching() {
        let source = CountingSource::new(usize::MAX);
        let handle = spawn_refresh(
            source.clone(),
            EngineConfig::default(),
            Duration::from_millis(5),
            1,
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.is_finished());

        let settled = source.calls();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(source.calls(), settled);
    }

    #[tokio::test]
    async fn failures_before_any_success_publish_nothing() {
        let source = CountingSource::new(0);
        let handle = spawn_refresh(
            source.clone(),
            EngineConfig::default(),
            Duration::from_millis(5),
            1,
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(source.calls() >= 2);
        assert!(handle.latest().is_none());
        assert!(!handle.is_finished());
    }

    #[tokio::test]
    async fn failed_ticks_keep_the_last_good_update() {
        let source = CountingSource::new(1);
        let handle = spawn_refresh(
            source.clone(),
            EngineConfig::default(),
            Duration::from_millis(5),
            1,
        );
        let mut updates = handle.subscribe();
        updates.changed().await.expect("first update");
        let first = handle.latest().expect("first update published");

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(source.calls() >= 3);

        let latest = handle.latest().expect("update survives failures");
        assert!(Arc::ptr_eq(&first, &latest));
        assert_eq!(latest.records.len(), 1);
        assert_eq!(latest.records[0].id, "r0");
        assert!(!handle.is_finished());
    }
}
