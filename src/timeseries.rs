use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::models::{ReviewRecord, TimeBucket};

/// Longest trailing window accepted from configuration, about ten years.
pub const MAX_TREND_DAYS: u32 = 3660;

/// Calendar day of a review in the reference zone.
pub fn day_of(record: &ReviewRecord, tz: Tz) -> NaiveDate {
    record.created_at.with_timezone(&tz).date_naive()
}

#[derive(Debug, Clone, Copy, Default)]
struct DayAccumulator {
    count: usize,
    rating_sum: u64,
}

impl DayAccumulator {
    fn add(&mut self, rating: u8) {
        self.count += 1;
        self.rating_sum += rating as u64;
    }

    fn into_bucket(self, day: NaiveDate) -> TimeBucket {
        TimeBucket {
            day,
            count: self.count,
            average_rating: if self.count == 0 {
                0.0
            } else {
                self.rating_sum as f64 / self.count as f64
            },
        }
    }
}

/// Exactly `days` zero-filled buckets ending on `now`'s date, oldest first.
pub fn build_trailing_window(
    records: &[ReviewRecord],
    now: DateTime<Utc>,
    days: u32,
    tz: Tz,
) -> Vec<TimeBucket> {
    if days == 0 {
        return Vec::new();
    }

    let end = now.with_timezone(&tz).date_naive();
    let Some(start) = end.checked_sub_signed(Duration::days(days as i64 - 1)) else {
        warn!("Trailing window start out of range - days={}", days);
        return Vec::new();
    };
    let mut slots = vec![DayAccumulator::default(); days as usize];

    for record in records {
        let offset = (day_of(record, tz) - start).num_days();
        if (0..days as i64).contains(&offset) {
            slots[offset as usize].add(record.rating);
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(idx, acc)| acc.into_bucket(start + Duration::days(idx as i64)))
        .collect()
}

/// One bucket per date present in the data, ascending, no zero-filling.
pub fn build_timeline(records: &[ReviewRecord], tz: Tz) -> Vec<TimeBucket> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for record in records {
        days.entry(day_of(record, tz)).or_default().add(record.rating);
    }

    days.into_iter()
        .map(|(day, acc)| acc.into_bucket(day))
        .collect()
}
