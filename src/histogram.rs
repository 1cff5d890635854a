use crate::models::{RatingHistogramEntry, ReviewRecord, MIN_RATING, RATINGS};

/// One entry per rating 1..=5, ascending, zero counts included.
pub fn build_histogram(records: &[ReviewRecord]) -> Vec<RatingHistogramEntry> {
    let mut counts = [0usize; RATINGS.len()];
    for record in records {
        // Out-of-range ratings never survive normalization, but stay safe here.
        if let Some(slot) = (record.rating as usize)
            .checked_sub(MIN_RATING as usize)
            .and_then(|idx| counts.get_mut(idx))
        {
            *slot += 1;
        }
    }

    RATINGS
        .iter()
        .zip(counts)
        .map(|(&rating, count)| RatingHistogramEntry { rating, count })
        .collect()
}

/// Chart-facing view without empty ratings.
pub fn non_empty(histogram: &[RatingHistogramEntry]) -> Vec<RatingHistogramEntry> {
    histogram.iter().copied().filter(|e| e.count > 0).collect()
}

pub fn share(entry: &RatingHistogramEntry, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        entry.count as f64 / total as f64
    }
}
