//! Row-level predicates applied after the SQL query ran.
//!
//! Some conditions cannot be expressed as a plain SQL comparison. The
//! compiler emits a sound SQL over-approximation for them and registers a
//! hook that checks each returned row exactly.

use std::fmt;

/// Predicate over an item's position, in decimal degrees.
pub trait PostHook: fmt::Debug + Send + Sync {
    fn check_position(&self, latitude: f64, longitude: f64) -> bool;
}

/// All hooks of one compiled query, combined with AND.
#[derive(Debug, Default)]
pub struct PostHooks {
    hooks: Vec<Box<dyn PostHook>>,
}

impl PostHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hook(&mut self, hook: Box<dyn PostHook>) {
        self.hooks.push(hook);
    }

    /// True if every hook accepts the position.
    pub fn check_position(&self, latitude: f64, longitude: f64) -> bool {
        self.hooks
            .iter()
            .all(|hook| hook.check_position(latitude, longitude))
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Exact circle test using the Haversine great-circle distance.
///
/// Holds its own copy of center and threshold; nothing is shared with the
/// calculator that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaversinePostHook {
    lat1: f64,
    lon1: f64,
    cos_lat1: f64,
    distance_in_radians: f64,
}

impl HaversinePostHook {
    /// Center in degrees; `distance` and `radius_of_curvature` in meters.
    pub fn new(latitude: f64, longitude: f64, radius_of_curvature: f64, distance: f64) -> Self {
        let lat1 = latitude.to_radians();
        Self {
            lat1,
            lon1: longitude.to_radians(),
            cos_lat1: lat1.cos(),
            distance_in_radians: distance / radius_of_curvature,
        }
    }

    /// Angular radius of the circle.
    pub fn distance_in_radians(&self) -> f64 {
        self.distance_in_radians
    }
}

impl PostHook for HaversinePostHook {
    fn check_position(&self, latitude: f64, longitude: f64) -> bool {
        let lat2 = latitude.to_radians();
        let lon2 = longitude.to_radians();
        let dlon = lon2 - self.lon1;
        let dlat = lat2 - self.lat1;
        let a = (dlat / 2.0).sin().powi(2) + self.cos_lat1 * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        c < self.distance_in_radians
    }
}
