//! Proximity queries: "what's near this point, nearest first".
//!
//! The heavy lifting (inventory, availability, paging) lives in the remote
//! backend; this module only ranks and filters entities the backend already
//! returned, by great-circle distance from a reference point.

use crate::geo::{self, CoordinateError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A nearby-entities request: a center point and a radius in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

impl LocationQuery {
    /// A validated query. Negative radii are treated as zero.
    pub fn new(latitude: f64, longitude: f64, radius_m: f64) -> Result<Self, CoordinateError> {
        geo::validate_coords(latitude, longitude)?;
        Ok(Self { latitude, longitude, radius_m: radius_m.max(0.0) })
    }

    /// Whether a point lies within the query radius.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        geo::distance_km(self.latitude, self.longitude, lat, lon) * 1000.0 <= self.radius_m
    }

    /// Keep only the entries within the radius, preserving order.
    pub fn filter<T, F>(&self, items: Vec<T>, coords: F) -> Vec<T>
    where
        F: Fn(&T) -> (f64, f64),
    {
        items
            .into_iter()
            .filter(|item| {
                let (lat, lon) = coords(item);
                self.contains(lat, lon)
            })
            .collect()
    }
}

/// Pair each entry with its distance from the origin in kilometers and sort
/// ascending.
pub fn rank_by_distance<T, F>(latitude: f64, longitude: f64, items: Vec<T>, coords: F) -> Vec<(T, f64)>
where
    F: Fn(&T) -> (f64, f64),
{
    let mut ranked: Vec<(T, f64)> = items
        .into_iter()
        .map(|item| {
            let (lat, lon) = coords(&item);
            let d = geo::distance_km(latitude, longitude, lat, lon);
            (item, d)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    ranked
}
