//! Addresses and distances for publications and zone searches.

use std::collections::HashMap;
use std::fmt;

use chatflow_core::config::PlaceConfig;
use chatflow_forms::{Lookup, LookupError};

pub const UNKNOWN_ADDRESS: &str = "I could not find that address.";

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A resolved address.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Great-circle distance to `other`, in kilometres.
    pub fn distance_km(&self, other: &Location) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// The geocoding collaborator behind address prompts.
pub type Geocoder = dyn Lookup<Output = Location>;

/// A geocoder over a fixed table of known addresses.
///
/// Queries match case-insensitively, with runs of whitespace collapsed.
#[derive(Debug, Default)]
pub struct Gazetteer {
    places: HashMap<String, Location>,
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, address: &str, latitude: f64, longitude: f64) -> Self {
        self.places.insert(
            normalize(address),
            Location {
                address: address.trim().to_string(),
                latitude,
                longitude,
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl From<&[PlaceConfig]> for Gazetteer {
    fn from(places: &[PlaceConfig]) -> Self {
        places.iter().fold(Gazetteer::new(), |g, p| {
            g.with_place(&p.address, p.latitude, p.longitude)
        })
    }
}

impl Lookup for Gazetteer {
    type Output = Location;

    fn lookup(&self, query: &str) -> Result<Location, LookupError> {
        self.places
            .get(&normalize(query))
            .cloned()
            .ok_or_else(|| LookupError::Rejected(UNKNOWN_ADDRESS.to_string()))
    }
}

fn normalize(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
