use std::collections::HashMap;

use rand::Rng;

use crate::models::{CityAggregate, MapPoint, ReviewRecord, Sentiment};

/// Half-width of the marker spread, in degrees.
pub const DEFAULT_JITTER_DEGREES: f64 = 0.4;

const BUILTIN_CITIES: &[(&str, f64, f64)] = &[
    ("Mumbai", 72.8777, 19.0760),
    ("Delhi", 77.1025, 28.7041),
    ("Bangalore", 77.5946, 12.9716),
    ("Hyderabad", 78.4867, 17.3850),
    ("Ahmedabad", 72.5714, 23.0225),
    ("Chennai", 80.2707, 13.0827),
    ("Kolkata", 88.3639, 22.5726),
    ("Surat", 72.8311, 21.1702),
    ("Pune", 73.8567, 18.5204),
    ("Jaipur", 75.7873, 26.9124),
    ("Lucknow", 80.9462, 26.8467),
    ("Kanpur", 80.3319, 26.4499),
    ("Nagpur", 79.0882, 21.1458),
    ("Indore", 75.8577, 22.7196),
    ("Thane", 72.9781, 19.2183),
    ("Assam", 91.7362, 26.1445),
    ("Faridabad", 77.3178, 28.4089),
    ("Nerul", 73.0169, 19.0330),
    ("Ratnagiri", 73.3120, 16.9902),
    ("Coimbatore", 76.9560, 11.0168),
    ("Mysore", 76.6394, 12.2958),
    ("Visakhapatnam", 83.2185, 17.6868),
    ("Vijayawada", 80.6380, 16.5062),
    ("Trivandrum", 76.9366, 8.5241),
    ("Kochi", 76.2673, 9.9312),
    ("Madurai", 78.1198, 9.9252),
];

/// `(longitude, latitude)` by exact city name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityCoordinates {
    coords: HashMap<String, (f64, f64)>,
}

impl CityCoordinates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut table = Self::new();
        for &(city, lon, lat) in BUILTIN_CITIES {
            table.insert(city, lon, lat);
        }
        table
    }

    pub fn insert(&mut self, city: impl Into<String>, longitude: f64, latitude: f64) {
        self.coords.insert(city.into(), (longitude, latitude));
    }

    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, (f64, f64))>,
    {
        self.coords.extend(entries);
    }

    pub fn get(&self, city: &str) -> Option<(f64, f64)> {
        self.coords.get(city).copied()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Busiest cities first. Ties keep the order in which the cities first
/// appear in `records`, so re-aggregating the same input is stable.
pub fn top_cities(records: &[ReviewRecord], n: usize) -> Vec<CityAggregate> {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for city in records.iter().filter_map(|r| r.city.as_deref()) {
        match index.get(city) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                index.insert(city, order.len());
                order.push((city, 1));
            }
        }
    }

    // Stable sort: equal counts keep first-seen order.
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, (city, count))| CityAggregate {
            city: city.to_string(),
            count,
            rank: idx + 1,
        })
        .collect()
}

/// One jittered point per review whose city has a known coordinate.
/// Reviews without a city, or with an unknown one, are left out.
pub fn project_for_map<R: Rng>(
    records: &[ReviewRecord],
    coordinates: &CityCoordinates,
    jitter_degrees: f64,
    rng: &mut R,
) -> Vec<MapPoint> {
    let spread = jitter_degrees.abs();
    records
        .iter()
        .filter_map(|record| {
            let city = record.city.as_deref()?;
            let (lon, lat) = coordinates.get(city)?;
            let (dx, dy) = if spread > 0.0 {
                (rng.gen_range(-spread..=spread), rng.gen_range(-spread..=spread))
            } else {
                (0.0, 0.0)
            };
            Some(MapPoint {
                review_id: record.id.clone(),
                city: city.to_string(),
                longitude: lon + dx,
                latitude: lat + dy,
                rating: record.rating,
                sentiment: Sentiment::from_rating(record.rating),
            })
        })
        .collect()
}
