//! Per-rating cache of generated action items.
//!
//! Each bucket moves through idle -> loading -> ready | failed. At most one
//! provider call is outstanding per bucket; callers that arrive while a
//! bucket is loading wait on the same result instead of issuing another
//! call. Buckets are independent, so several may be loading at once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::InsightError;
use crate::models::{InsightBucket, InsightStatus, MAX_RATING, MIN_RATING, RATINGS};

/// Source of generated insights for one rating bucket.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn fetch_insights(&self, rating: u8) -> Result<Vec<String>, InsightError>;
}

type Outcome = Result<Arc<Vec<String>>, InsightError>;

enum BucketState {
    Idle,
    Loading(watch::Receiver<Option<Outcome>>),
    Ready(Arc<Vec<String>>),
    Failed(InsightError),
}

#[derive(Default)]
struct Buckets {
    states: HashMap<u8, BucketState>,
    // Bumped on invalidation so fetches started earlier do not repopulate
    // the cache.
    generation: u64,
}

#[derive(Clone)]
pub struct InsightSession {
    provider: Arc<dyn InsightProvider>,
    buckets: Arc<Mutex<Buckets>>,
}

impl InsightSession {
    pub fn new(provider: Arc<dyn InsightProvider>) -> Self {
        Self {
            provider,
            buckets: Arc::new(Mutex::new(Buckets::default())),
        }
    }

    /// Returns the insights for `rating`, fetching them only when the bucket
    /// is idle or failed.
    pub async fn request(&self, rating: u8) -> Result<Vec<String>, InsightError> {
        validate(rating)?;

        let mut rx = {
            let mut buckets = lock(&self.buckets);
            match buckets.states.get(&rating) {
                Some(BucketState::Ready(items)) => {
                    debug!("Insight cache hit - rating={}", rating);
                    return Ok(items.as_ref().clone());
                }
                Some(BucketState::Loading(rx)) => {
                    debug!("Joining in-flight insight fetch - rating={}", rating);
                    rx.clone()
                }
                Some(BucketState::Idle) | Some(BucketState::Failed(_)) | None => {
                    self.start_fetch(&mut buckets, rating)
                }
            }
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };

        match outcome {
            Some(Ok(items)) => Ok(items.as_ref().clone()),
            Some(Err(err)) => Err(err),
            None => {
                let err = InsightError::WorkerLost(rating);
                let mut buckets = lock(&self.buckets);
                if let Some(BucketState::Loading(current)) = buckets.states.get(&rating) {
                    if current.same_channel(&rx) {
                        buckets.states.insert(rating, BucketState::Failed(err.clone()));
                    }
                }
                Err(err)
            }
        }
    }

    fn start_fetch(&self, buckets: &mut Buckets, rating: u8) -> watch::Receiver<Option<Outcome>> {
        let (tx, rx) = watch::channel(None);
        buckets.states.insert(rating, BucketState::Loading(rx.clone()));

        let generation = buckets.generation;
        let provider = Arc::clone(&self.provider);
        let shared = Arc::clone(&self.buckets);
        let own = rx.clone();

        // Runs detached so a dropped caller cannot leave the bucket loading.
        tokio::spawn(async move {
            let start = Instant::now();
            info!("Insight fetch started - rating={}", rating);

            let outcome: Outcome = provider.fetch_insights(rating).await.map(Arc::new);
            match &outcome {
                Ok(items) => info!(
                    "Insight fetch completed - rating={}, items={}, duration={:.2}s",
                    rating,
                    items.len(),
                    start.elapsed().as_secs_f32()
                ),
                Err(err) => warn!("Insight fetch failed - rating={}, error={}", rating, err),
            }

            {
                let mut buckets = lock(&shared);
                let current = matches!(
                    buckets.states.get(&rating),
                    Some(BucketState::Loading(rx)) if rx.same_channel(&own)
                );
                if current {
                    let next = if buckets.generation == generation {
                        match &outcome {
                            Ok(items) => BucketState::Ready(Arc::clone(items)),
                            Err(err) => BucketState::Failed(err.clone()),
                        }
                    } else {
                        debug!("Discarding insight result after invalidation - rating={}", rating);
                        BucketState::Idle
                    };
                    buckets.states.insert(rating, next);
                }
            }

            tx.send_replace(Some(outcome));
        });

        rx
    }

    pub fn state(&self, rating: u8) -> InsightBucket {
        let buckets = lock(&self.buckets);
        describe(rating, buckets.states.get(&rating))
    }

    /// All five buckets, ascending by rating.
    pub fn snapshot(&self) -> Vec<InsightBucket> {
        let buckets = lock(&self.buckets);
        RATINGS
            .iter()
            .map(|&rating| describe(rating, buckets.states.get(&rating)))
            .collect()
    }

    /// Resets every settled bucket to idle. A bucket that is still loading
    /// keeps its fetch, so later requests join it instead of issuing a
    /// second call; its result reaches the waiters but is not cached.
    pub fn invalidate(&self) {
        let mut buckets = lock(&self.buckets);
        buckets
            .states
            .retain(|_, state| matches!(state, BucketState::Loading(_)));
        buckets.generation += 1;
        debug!("Insight cache invalidated - generation={}", buckets.generation);
    }
}

fn validate(rating: u8) -> Result<(), InsightError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(InsightError::InvalidBucket(rating))
    }
}

fn lock(buckets: &Mutex<Buckets>) -> MutexGuard<'_, Buckets> {
    buckets.lock().unwrap_or_else(PoisonError::into_inner)
}

fn describe(rating: u8, state: Option<&BucketState>) -> InsightBucket {
    let (status, items, error) = match state {
        None | Some(BucketState::Idle) => (InsightStatus::Idle, Vec::new(), None),
        Some(BucketState::Loading(_)) => (InsightStatus::Loading, Vec::new(), None),
        Some(BucketState::Ready(items)) => (InsightStatus::Ready, items.as_ref().clone(), None),
        Some(BucketState::Failed(err)) => (InsightStatus::Failed, Vec::new(), Some(err.to_string())),
    };
    InsightBucket {
        rating,
        status,
        items,
        error,
    }
}
