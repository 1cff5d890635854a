use std::collections::HashSet;
use std::str::FromStr;

use serde::Serialize;

use crate::models::ReviewRecord;

const ALL: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum RatingSelector {
    #[default]
    All,
    Exactly(u8),
}

impl FromStr for RatingSelector {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(ALL) {
            return Ok(RatingSelector::All);
        }
        value
            .parse::<u8>()
            .map(RatingSelector::Exactly)
            .map_err(|_| format!("expected a star rating or \"all\", got {value:?}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum CitySelector {
    #[default]
    All,
    Exactly(String),
}

impl FromStr for CitySelector {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() || value.trim().eq_ignore_ascii_case(ALL) {
            Ok(CitySelector::All)
        } else {
            Ok(CitySelector::Exactly(value.to_string()))
        }
    }
}

/// The three dashboard predicates; all of them must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewFilter {
    pub text: Option<String>,
    pub rating: RatingSelector,
    pub city: CitySelector,
}

impl ReviewFilter {
    pub fn matches(&self, record: &ReviewRecord) -> bool {
        self.matches_text(record) && self.matches_rating(record) && self.matches_city(record)
    }

    fn matches_text(&self, record: &ReviewRecord) -> bool {
        let needle = match self.text.as_deref() {
            Some(text) if !text.is_empty() => text.to_lowercase(),
            _ => return true,
        };
        let haystack = format!(
            "{} {} {} {}",
            record.name.as_deref().unwrap_or(""),
            record.city.as_deref().unwrap_or(""),
            record.review.as_deref().unwrap_or(""),
            record.ai_summary.as_deref().unwrap_or(""),
        );
        haystack.to_lowercase().contains(&needle)
    }

    fn matches_rating(&self, record: &ReviewRecord) -> bool {
        match self.rating {
            RatingSelector::All => true,
            RatingSelector::Exactly(rating) => record.rating == rating,
        }
    }

    fn matches_city(&self, record: &ReviewRecord) -> bool {
        match &self.city {
            CitySelector::All => true,
            CitySelector::Exactly(city) => record.city.as_deref() == Some(city.as_str()),
        }
    }
}

/// Records satisfying `filter`, in input order.
pub fn filter(records: &[ReviewRecord], filter: &ReviewFilter) -> Vec<ReviewRecord> {
    records.iter().filter(|r| filter.matches(r)).cloned().collect()
}

/// Distinct present cities in first-seen order, for the city selector.
pub fn city_options(records: &[ReviewRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| r.city.as_deref())
        .filter(|city| seen.insert(*city))
        .map(str::to_string)
        .collect()
}
