//! Geodetic module - ellipsoid models and geodesic computations.
//!
//! Used by the position field of the query compiler to turn a center point
//! and a radius into a bounding rectangle.

mod calculator;
mod ellipsoid;

pub use calculator::{cast_to_angle_range, GeodeticCalculator};
pub use ellipsoid::Ellipsoid;
