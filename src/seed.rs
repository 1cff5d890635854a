//! Deterministic sample corpus for demos and local dashboards.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::models::{ReviewRecord, ReviewStatus};

const NAMES: &[&str] = &[
    "Arjun Reddy",
    "Sahana Iyer",
    "Vishal Kumar",
    "Anika Nair",
    "Karthik Rao",
    "Meera Menon",
    "Raghav R",
    "Divya Krishnan",
    "Hari Prasad",
    "Sneha Pillai",
    "Aravindh S",
    "Lakshmi Raj",
];

const CITIES: &[&str] = &[
    "Coimbatore",
    "Mysore",
    "Visakhapatnam",
    "Vijayawada",
    "Trivandrum",
    "Kochi",
    "Madurai",
    "Pune",
    "Delhi",
];

const NEGATIVE: &[&str] = &[
    "Very poor experience. The app keeps crashing and AI responses are often irrelevant.",
    "Worst customer service ever. No replies, no solutions.",
    "Extremely slow and buggy. The app freezes frequently and basic features don't work.",
];

const NEUTRAL: &[&str] = &[
    "It's okay. Gets the job done but lacks advanced features.",
    "Average experience. The UI could be more modern and some workflows feel unintuitive.",
    "The pricing seems a bit high for the features offered.",
];

const POSITIVE: &[&str] = &[
    "Excellent service! The interface is smooth and the responses are lightning fast.",
    "Good experience overall, the mobile app lags slightly but the web interface is flawless.",
    "Great support team! Solved my query in minutes.",
];

const RATING_WEIGHTS: [u32; 5] = [15, 10, 15, 25, 35];

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub count: usize,
    pub end: DateTime<Utc>,
    pub span_days: i64,
    pub seed: u64,
}

pub fn generate_sample(options: &SeedOptions) -> Vec<ReviewRecord> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let ratings = match WeightedIndex::new(RATING_WEIGHTS) {
        Ok(dist) => dist,
        Err(_) => return Vec::new(),
    };
    let span_minutes = options.span_days.max(1) * 24 * 60;

    (0..options.count)
        .map(|_| {
            let rating = ratings.sample(&mut rng) as u8 + 1;
            let name = NAMES[rng.gen_range(0..NAMES.len())];
            let city = CITIES[rng.gen_range(0..CITIES.len())];
            let pool = match rating {
                1 | 2 => NEGATIVE,
                3 => NEUTRAL,
                _ => POSITIVE,
            };
            // Roughly one in ten reviews is rating-only.
            let text = (!rng.gen_bool(0.1)).then(|| pool[rng.gen_range(0..pool.len())].to_string());
            let created_at = options.end - Duration::minutes(rng.gen_range(0..span_minutes));
            let id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string();
            let enriched = rng.gen_bool(0.9);

            let (ai_summary, ai_action, ai_reply, status) = if enriched {
                (
                    Some(summary_for(rating, city, text.as_deref())),
                    Some(action_for(rating).to_string()),
                    Some(reply_for(rating).to_string()),
                    ReviewStatus::Complete,
                )
            } else {
                (None, None, None, ReviewStatus::PendingEnrichment)
            };

            ReviewRecord {
                id,
                name: Some(name.to_string()),
                email: Some(format!("{}@south.in", name.to_lowercase().replace(' ', "."))),
                city: Some(city.to_string()),
                rating,
                review: text,
                ai_summary,
                ai_action,
                ai_reply,
                status,
                created_at,
            }
        })
        .collect()
}

fn summary_for(rating: u8, city: &str, text: Option<&str>) -> String {
    match text {
        Some(text) => format!("{rating}-star review from {city}: {text}"),
        None => format!("Rating {rating}/5 from {city} without written feedback."),
    }
}

fn action_for(rating: u8) -> &'static str {
    match rating {
        1 => "Escalate to support lead within 24 hours",
        2 => "Reach out with a fix timeline",
        3 => "Log friction points for the UX backlog",
        4 => "Share roadmap for requested improvements",
        _ => "Invite to referral programme",
    }
}

fn reply_for(rating: u8) -> &'static str {
    match rating {
        1 | 2 => "We're sorry about your experience. Our team is already looking into it.",
        3 => "Thanks for the honest feedback. We're working on making things smoother.",
        _ => "Thank you so much! We're glad you're enjoying the platform.",
    }
}
