//! Reference ellipsoids.

use std::f64::consts::PI;

/// Geometric figure of the earth, defined by its semi-axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    name: String,
    semi_major_axis: f64,
    semi_minor_axis: f64,
    inverse_flattening: f64,
    ivf_definitive: bool,
}

impl Ellipsoid {
    pub fn wgs84() -> Self {
        Self::from_inverse_flattening("WGS84", 6378137.0, 298.257223563)
    }

    pub fn grs80() -> Self {
        Self::from_inverse_flattening("GRS80", 6378137.0, 298.257222101)
    }

    pub fn international_1924() -> Self {
        Self::from_inverse_flattening("International 1924", 6378388.0, 297.0)
    }

    pub fn clarke_1866() -> Self {
        Self::from_inverse_flattening("Clarke 1866", 6378206.4, 294.9786982)
    }

    /// Sphere with the mean earth radius.
    pub fn sphere() -> Self {
        Self::from_axes("SPHERE", 6371000.0, 6371000.0)
    }

    /// Ellipsoid from both semi-axes, in meters.
    pub fn from_axes(name: &str, semi_major_axis: f64, semi_minor_axis: f64) -> Self {
        let inverse_flattening = if semi_major_axis == semi_minor_axis {
            f64::INFINITY
        } else {
            semi_major_axis / (semi_major_axis - semi_minor_axis)
        };

        Self {
            name: name.to_string(),
            semi_major_axis,
            semi_minor_axis,
            inverse_flattening,
            ivf_definitive: false,
        }
    }

    /// Ellipsoid from the semi-major axis and inverse flattening. An
    /// infinite inverse flattening gives a sphere.
    pub fn from_inverse_flattening(name: &str, semi_major_axis: f64, inverse_flattening: f64) -> Self {
        let semi_minor_axis = if inverse_flattening.is_infinite() {
            semi_major_axis
        } else {
            semi_major_axis * (1.0 - 1.0 / inverse_flattening)
        };

        Self {
            name: name.to_string(),
            semi_major_axis,
            semi_minor_axis,
            inverse_flattening,
            ivf_definitive: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    pub fn semi_minor_axis(&self) -> f64 {
        self.semi_minor_axis
    }

    pub fn inverse_flattening(&self) -> f64 {
        self.inverse_flattening
    }

    /// Whether the inverse flattening (rather than the minor axis) is the
    /// defining parameter.
    pub fn is_ivf_definitive(&self) -> bool {
        self.ivf_definitive
    }

    pub fn is_sphere(&self) -> bool {
        self.semi_major_axis == self.semi_minor_axis
    }

    pub fn eccentricity(&self) -> f64 {
        if self.is_sphere() {
            return 0.0;
        }

        let f = 1.0 - self.semi_minor_axis / self.semi_major_axis;
        (2.0 * f - f * f).sqrt()
    }

    /// Radius of curvature at the given latitude in degrees.
    pub fn radius_of_curvature(&self, latitude: f64) -> f64 {
        let esquare = self.eccentricity().powi(2);
        self.semi_major_axis * (1.0 - esquare).sqrt()
            / (1.0 - esquare * latitude.to_radians().sin().powi(2))
    }

    /// Geodesic distance in meters between two points given in degrees.
    ///
    /// Vincenty's inverse solution (NGS subroutine INVER1). Returns 0 when
    /// the iteration does not converge, except for points on the equator.
    pub fn orthodromic_distance(&self, lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
        const MAX_ITERATIONS: usize = 100;
        const EPS: f64 = 0.5e-13;

        let x1 = lon1.to_radians();
        let y1 = lat1.to_radians();
        let x2 = lon2.to_radians();
        let y2 = lat2.to_radians();

        let f = 1.0 / self.inverse_flattening;
        let r = 1.0 - f;

        let mut tu1 = r * y1.sin() / y1.cos();
        let mut tu2 = r * y2.sin() / y2.cos();
        let cu1 = 1.0 / (tu1 * tu1 + 1.0).sqrt();
        let cu2 = 1.0 / (tu2 * tu2 + 1.0).sqrt();
        let su1 = cu1 * tu1;
        let s = cu1 * cu2;
        let baz = s * tu2;
        let faz = baz * tu1;
        let mut x = x2 - x1;

        for _ in 0..MAX_ITERATIONS {
            let sx = x.sin();
            let cx = x.cos();
            tu1 = cu2 * sx;
            tu2 = baz - su1 * cu2 * cx;
            let sy = (tu1 * tu1 + tu2 * tu2).sqrt();
            let cy = s * cx + faz;
            let y = sy.atan2(cy);
            let sa = s * sx / sy;
            let c2a = 1.0 - sa * sa;

            let mut cz = faz + faz;
            if c2a > 0.0 {
                cz = -cz / c2a + cy;
            }

            let e = cz * cz * 2.0 - 1.0;
            let c = ((-3.0 * c2a + 4.0) * f + 4.0) * c2a * f / 16.0;
            let previous = x;
            x = ((e * cy * c + cz) * sy * c + y) * sa;
            x = (1.0 - c) * x * f + x2 - x1;

            if (previous - x).abs() <= EPS {
                let mut x = ((1.0 / (r * r) - 1.0) * c2a + 1.0).sqrt() + 1.0;
                x = (x - 2.0) / x;
                let c = (x * x / 4.0 + 1.0) / (1.0 - x);
                let d = (0.375 * x * x - 1.0) * x;
                let x = e * cy;
                let s = 1.0 - 2.0 * e;
                return ((((sy * sy * 4.0 - 3.0) * s * cz * d / 6.0 - x) * d / 4.0 + cz) * sy * d
                    + y)
                    * c
                    * r
                    * self.semi_major_axis;
            }
        }

        // No convergence: equal points or antipodes
        const LEPS: f64 = 1e-10;

        if (x1 - x2).abs() <= LEPS && (y1 - y2).abs() <= LEPS {
            return 0.0;
        }

        if y1.abs() <= LEPS && y2.abs() <= LEPS {
            return (x1 - x2).abs() * self.semi_major_axis;
        }

        tracing::debug!(
            "No geodesic solution between ({}, {}) and ({}, {})",
            lon1,
            lat1,
            lon2,
            lat2
        );
        0.0
    }

    /// Length of one degree along the equator, in meters.
    pub fn equatorial_degree(&self) -> f64 {
        self.semi_major_axis * PI / 180.0
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::wgs84()
    }
}
