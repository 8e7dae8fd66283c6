//! Direct and inverse geodetic problems on an ellipsoid.
//!
//! Coordinates are taken and returned in degrees, distances in meters.
//! Internally everything is kept in radians.

use std::f64::consts::PI;

use super::ellipsoid::Ellipsoid;

const TOLERANCE_0: f64 = 5.0e-15;
const TOLERANCE_1: f64 = 5.0e-14;
const TOLERANCE_2: f64 = 5.0e-13;
const TOLERANCE_3: f64 = 7.0e-3;
const TOLERANCE_CHECK: f64 = 1e-8;

const MAX_DIRECT_ITERATIONS: usize = 100;
const MAX_INVERSE_ITERATIONS: usize = 8;

/// Wrap an angle in radians into [-PI, PI).
pub fn cast_to_angle_range(alpha: f64) -> f64 {
    alpha - (2.0 * PI) * (alpha / (2.0 * PI) + 0.5).floor()
}

/// Series coefficients derived from the ellipsoid's flattening.
#[derive(Debug, Clone)]
struct Series {
    f: f64,
    fo: f64,
    eccentricity_squared: f64,

    // meridian arc length (GPNARC)
    arc: [f64; 6],

    // inverse problem (GPNHRI)
    t1: f64,
    t2: f64,
    t4: f64,
    t6: f64,
    a01: f64,
    a02: f64,
    a03: f64,
    a21: f64,
    a22: f64,
    a23: f64,
    a42: f64,
    a43: f64,
    a63: f64,
}

impl Series {
    fn new(semi_major_axis: f64, semi_minor_axis: f64) -> Self {
        let f = (semi_major_axis - semi_minor_axis) / semi_major_axis;
        let f2 = f * f;
        let f3 = f * f2;
        let f4 = f * f3;
        let e2 = f * (2.0 - f);

        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let e8 = e6 * e2;
        let ex = e8 * e2;

        let arc = [
            1.0 + 0.75 * e2 + 0.703125 * e4 + 0.68359375 * e6 + 0.67291259765625 * e8
                + 0.6661834716796875 * ex,
            0.75 * e2 + 0.9375 * e4 + 1.025390625 * e6 + 1.07666015625 * e8
                + 1.1103057861328125 * ex,
            0.234375 * e4 + 0.41015625 * e6 + 0.538330078125 * e8 + 0.63446044921875 * ex,
            0.068359375 * e6 + 0.15380859375 * e8 + 0.23792266845703125 * ex,
            0.01922607421875 * e8 + 0.0528717041015625 * ex,
            0.00528717041015625 * ex,
        ];

        let a = f3 * (1.0 + 2.25 * f);
        let a01 = -f2 * (1.0 + f + f2) / 4.0;

        Self {
            f,
            fo: 1.0 - f,
            eccentricity_squared: e2,
            arc,
            t1: 1.0,
            t2: -0.25 * f * (1.0 + f + f2),
            t4: 0.1875 * f2 * (1.0 + 2.25 * f),
            t6: 0.1953125 * f3,
            a01,
            a02: 0.1875 * a,
            a03: -0.1953125 * f4,
            a21: -a01,
            a22: -0.25 * a,
            a23: 0.29296875 * f4,
            a42: 0.03125 * a,
            a43: 0.05859375 * f4,
            a63: 5.0 * f4 / 768.0,
        }
    }
}

/// Stateful solver: set a starting point, then either a direction
/// (azimuth + distance) or a destination, and read the other one back.
#[derive(Debug, Clone)]
pub struct GeodeticCalculator {
    ellipsoid: Ellipsoid,
    semi_major_axis: f64,
    semi_minor_axis: f64,
    series: Series,
    max_orthodromic_distance: f64,

    lat1: f64,
    long1: f64,
    lat2: f64,
    long2: f64,
    distance: f64,
    azimuth: f64,
    destination_valid: bool,
    direction_valid: bool,
}

impl GeodeticCalculator {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        let semi_major_axis = ellipsoid.semi_major_axis();
        let semi_minor_axis = ellipsoid.semi_minor_axis();
        let series = Series::new(semi_major_axis, semi_minor_axis);
        let max_orthodromic_distance =
            semi_major_axis * (1.0 - series.eccentricity_squared) * PI * series.arc[0] - 1.0;

        Self {
            ellipsoid,
            semi_major_axis,
            semi_minor_axis,
            series,
            max_orthodromic_distance,
            lat1: 0.0,
            long1: 0.0,
            lat2: 0.0,
            long2: 0.0,
            distance: 0.0,
            azimuth: 0.0,
            destination_valid: false,
            direction_valid: false,
        }
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Longest distance accepted by [`set_direction`](Self::set_direction).
    pub fn max_orthodromic_distance(&self) -> f64 {
        self.max_orthodromic_distance
    }

    /// Returns false and leaves the calculator unchanged for out-of-range
    /// coordinates.
    pub fn set_starting_geographic_point(&mut self, longitude: f64, latitude: f64) -> bool {
        let (Some(longitude), Some(latitude)) = (check_longitude(longitude), check_latitude(latitude))
        else {
            tracing::warn!(
                "Invalid starting point: longitude {} latitude {}",
                longitude,
                latitude
            );
            return false;
        };

        self.long1 = longitude;
        self.lat1 = latitude;
        self.destination_valid = false;
        self.direction_valid = false;
        true
    }

    /// (longitude, latitude) in degrees.
    pub fn starting_geographic_point(&self) -> (f64, f64) {
        (self.long1.to_degrees(), self.lat1.to_degrees())
    }

    pub fn set_destination_geographic_point(&mut self, longitude: f64, latitude: f64) -> bool {
        let (Some(longitude), Some(latitude)) = (check_longitude(longitude), check_latitude(latitude))
        else {
            tracing::warn!(
                "Invalid destination point: longitude {} latitude {}",
                longitude,
                latitude
            );
            return false;
        };

        self.long2 = longitude;
        self.lat2 = latitude;
        self.destination_valid = true;
        self.direction_valid = false;
        true
    }

    /// (longitude, latitude) in degrees, computing it from the direction if
    /// needed. `None` if neither destination nor direction were set.
    pub fn destination_geographic_point(&mut self) -> Option<(f64, f64)> {
        if !self.destination_valid && !self.compute_destination_point() {
            return None;
        }

        Some((self.long2.to_degrees(), self.lat2.to_degrees()))
    }

    /// Azimuth in degrees from north in [-180, 180], distance in meters.
    pub fn set_direction(&mut self, azimuth: f64, distance: f64) -> bool {
        let Some(azimuth) = check_azimuth(azimuth) else {
            tracing::warn!("Invalid azimuth: {}", azimuth);
            return false;
        };

        if !(distance >= 0.0 && distance <= self.max_orthodromic_distance) {
            tracing::warn!("Invalid orthodromic distance: {}", distance);
            return false;
        }

        self.azimuth = azimuth;
        self.distance = distance;
        self.destination_valid = false;
        self.direction_valid = true;
        true
    }

    /// Azimuth in degrees, computing it from the destination if needed.
    pub fn azimuth(&mut self) -> Option<f64> {
        if !self.direction_valid && !self.compute_direction() {
            return None;
        }

        Some(self.azimuth.to_degrees())
    }

    /// Distance in meters, computing it from the destination if needed.
    pub fn orthodromic_distance(&mut self) -> Option<f64> {
        if !self.direction_valid {
            if !self.compute_direction() {
                return None;
            }

            if !self.is_distance_consistent() {
                tracing::debug!(
                    "Geodesic distance {} disagrees with the ellipsoid's solution",
                    self.distance
                );
            }
        }

        Some(self.distance)
    }

    /// Length of the meridian arc between two latitudes in degrees.
    pub fn meridian_arc_length(&self, latitude1: f64, latitude2: f64) -> Option<f64> {
        let latitude1 = check_latitude(latitude1)?;
        let latitude2 = check_latitude(latitude2)?;
        Some(self.meridian_arc_length_radians(latitude1, latitude2))
    }

    fn is_distance_consistent(&self) -> bool {
        let check = self.ellipsoid.orthodromic_distance(
            self.long1.to_degrees(),
            self.lat1.to_degrees(),
            self.long2.to_degrees(),
            self.lat2.to_degrees(),
        );
        (self.distance - check).abs() <= (self.distance + 1.0) * TOLERANCE_CHECK
    }

    /// Vincenty's direct solution (NGS subroutine DIRECT1).
    fn compute_destination_point(&mut self) -> bool {
        if !self.direction_valid {
            return false;
        }

        let lat1 = self.lat1;
        let long1 = self.long1;
        let azimuth = self.azimuth;
        let distance = self.distance;
        let f = self.series.f;
        let fo = self.series.fo;

        let tu = fo * lat1.sin() / lat1.cos();
        let sf = azimuth.sin();
        let cf = azimuth.cos();
        let baz = if cf != 0.0 { tu.atan2(cf) * 2.0 } else { 0.0 };
        let cu = 1.0 / (tu * tu + 1.0).sqrt();
        let su = tu * cu;
        let sa = cu * sf;
        let c2a = 1.0 - sa * sa;
        let mut x = ((1.0 / fo / fo - 1.0) * c2a + 1.0).sqrt() + 1.0;
        x = (x - 2.0) / x;
        let mut c = (x * x / 4.0 + 1.0) / (1.0 - x);
        let mut d = (0.375 * x * x - 1.0) * x;
        let tu = distance / fo / self.semi_major_axis / c;
        let mut y = tu;

        let mut iterations = 0;
        let (sy, cy, cz, e) = loop {
            iterations += 1;
            if iterations > MAX_DIRECT_ITERATIONS {
                tracing::warn!("Direct geodetic problem did not converge");
                return false;
            }

            let sy = y.sin();
            let cy = y.cos();
            let cz = (baz + y).cos();
            let e = cz * cz * 2.0 - 1.0;
            c = y;
            x = e * cy;
            y = e + e - 1.0;
            y = (((sy * sy * 4.0 - 3.0) * y * cz * d / 6.0 + x) * d / 4.0 - cz) * sy * d + tu;

            if (y - c).abs() <= TOLERANCE_1 {
                break (sy, cy, cz, e);
            }
        };

        let baz = cu * cy * cf - su * sy;
        c = fo * (sa * sa + baz * baz).sqrt();
        d = su * cy + cu * sy * cf;
        self.lat2 = d.atan2(c);
        c = cu * cy - su * sy * cf;
        x = (sy * sf).atan2(c);
        c = ((-3.0 * c2a + 4.0) * f + 4.0) * c2a * f / 16.0;
        d = ((e * cy * c + cz) * sy * c + y) * sa;
        self.long2 = cast_to_angle_range(long1 + x - (1.0 - c) * d * f);
        self.destination_valid = true;
        true
    }

    /// Meridian arc length (NGS subroutine GPNARC), latitudes in radians.
    fn meridian_arc_length_radians(&self, p1: f64, p2: f64) -> f64 {
        let [a, b, c, d, e, f] = self.series.arc;

        let da = p2 - p1;
        let db = (p2 * 2.0).sin() - (p1 * 2.0).sin();
        let dc = (p2 * 4.0).sin() - (p1 * 4.0).sin();
        let dd = (p2 * 6.0).sin() - (p1 * 6.0).sin();
        let de = (p2 * 8.0).sin() - (p1 * 8.0).sin();
        let df = (p2 * 10.0).sin() - (p1 * 10.0).sin();

        let s2 = -db * b / 2.0 + dc * c / 4.0 - dd * d / 6.0 + de * e / 8.0 - df * f / 10.0;
        let s1 = da * a;

        (self.semi_major_axis * (1.0 - self.series.eccentricity_squared) * (s1 + s2)).abs()
    }

    /// Vincenty's inverse solution (NGS subroutine GPNHRI).
    fn compute_direction(&mut self) -> bool {
        if !self.destination_valid {
            return false;
        }

        let long1 = self.long1;
        let lat1 = self.lat1;
        let long2 = self.long2;
        let lat2 = self.lat2;
        let s = &self.series;
        let (f, fo) = (s.f, s.fo);

        let dlon = cast_to_angle_range(long2 - long1);
        let ss = dlon.abs();

        if ss < TOLERANCE_1 {
            self.distance = self.meridian_arc_length_radians(lat1, lat2);
            self.azimuth = if lat2 > lat1 { 0.0 } else { PI };
            self.direction_valid = true;
            return true;
        }

        let esqp = s.eccentricity_squared / (1.0 - s.eccentricity_squared);
        let alimit = PI * fo;

        // antipodal points on the equator
        if ss >= alimit
            && lat1 < TOLERANCE_3
            && lat1 > -TOLERANCE_3
            && lat2 < TOLERANCE_3
            && lat2 > -TOLERANCE_3
        {
            let cons = (PI - ss) / (PI * f);
            let mut az = cons.asin();
            let mut iterations = 0;

            let (sin_az, ao) = loop {
                iterations += 1;
                if iterations > MAX_INVERSE_ITERATIONS {
                    tracing::warn!("Inverse geodetic problem did not converge");
                    return false;
                }

                let cos_az = az.cos();
                let c2 = cos_az * cos_az;
                let ao = s.t1 + s.t2 * c2 + s.t4 * c2 * c2 + s.t6 * c2 * c2 * c2;
                let next = (cons / ao).asin();
                let previous = az;
                az = next;

                if (next - previous).abs() < TOLERANCE_2 {
                    break (next, ao);
                }
            };

            let az1 = if dlon < 0.0 { 2.0 * PI - sin_az } else { sin_az };
            let cos_az1 = az1.cos();

            let u2 = esqp * cos_az1 * cos_az1;
            let u4 = u2 * u2;
            let u6 = u4 * u2;
            let u8 = u6 * u2;
            let bo = 1.0 + 0.25 * u2 + 0.046875 * u4 + 0.01953125 * u6 - 0.01068115234375 * u8;
            let sms = self.semi_major_axis * PI * (1.0 - f * az1.sin().abs() * ao - bo * fo);

            self.azimuth = cast_to_angle_range(az1);
            self.distance = self.semi_major_axis * ss - sms;
            self.direction_valid = true;
            return true;
        }

        // reduced latitudes
        let u1 = (fo * lat1.sin() / lat1.cos()).atan();
        let u2 = (fo * lat2.sin() / lat2.cos()).atan();
        let su1 = u1.sin();
        let cu1 = u1.cos();
        let su2 = u2.sin();
        let cu2 = u2.cos();

        let mut ab = dlon;
        let mut iterations = 0;

        let (w, q2, q4, q6, r2, r3, sig, ssig, slon, clon, sinalf) = loop {
            iterations += 1;
            if iterations > MAX_INVERSE_ITERATIONS {
                tracing::warn!("Inverse geodetic problem did not converge");
                return false;
            }

            let clon = ab.cos();
            let slon = ab.sin();
            let csig = su1 * su2 + cu1 * cu2 * clon;
            let ssig = ((slon * cu2).powi(2) + (su2 * cu1 - su1 * cu2 * clon).powi(2)).sqrt();
            let sig = ssig.atan2(csig);
            let sinalf = cu1 * cu2 * slon / ssig;
            let w = 1.0 - sinalf * sinalf;
            let t4 = w * w;
            let t6 = w * t4;

            // coefficients of type a
            let ao = f + s.a01 * w + s.a02 * t4 + s.a03 * t6;
            let a2 = s.a21 * w + s.a22 * t4 + s.a23 * t6;
            let a4 = s.a42 * t4 + s.a43 * t6;
            let a6 = s.a63 * t6;

            // multiple angle functions
            let qo = if w > TOLERANCE_0 { -2.0 * su1 * su2 / w } else { 0.0 };
            let q2 = csig + qo;
            let q4 = 2.0 * q2 * q2 - 1.0;
            let q6 = q2 * (4.0 * q2 * q2 - 3.0);
            let r2 = 2.0 * ssig * csig;
            let r3 = ssig * (3.0 - 4.0 * ssig * ssig);

            // longitude difference
            let correction = sinalf * (ao * sig + a2 * ssig * q2 + a4 * r2 * q4 + a6 * r3 * q6);
            let xy = (dlon + correction - ab).abs();
            ab = dlon + correction;

            if xy < TOLERANCE_1 {
                break (w, q2, q4, q6, r2, r3, sig, ssig, slon, clon, sinalf);
            }
        };

        let z = esqp * w;
        let bo = 1.0 + z * (1.0 / 4.0 + z * (-3.0 / 64.0 + z * (5.0 / 256.0 - z * (175.0 / 16384.0))));
        let b2 = z * (-1.0 / 4.0 + z * (1.0 / 16.0 + z * (-15.0 / 512.0 + z * (35.0 / 2048.0))));
        let b4 = z * z * (-1.0 / 128.0 + z * (3.0 / 512.0 - z * (35.0 / 8192.0)));
        let b6 = z * z * z * (-1.0 / 1536.0 + z * (5.0 / 6144.0));

        let distance = self.semi_minor_axis * (bo * sig + b2 * ssig * q2 + b4 * r2 * q4 + b6 * r3 * q6);

        let mut az1 = if dlon < 0.0 { PI * 1.5 } else { PI / 2.0 };

        // latitudes not on the equator
        if su1.abs() >= TOLERANCE_0 || su2.abs() >= TOLERANCE_0 {
            let tana1 = slon * cu2 / (su2 * cu1 - clon * su1 * cu2);
            let sina1 = sinalf / cu1;
            az1 = sina1.atan2(sina1 / tana1);
        }

        self.distance = distance;
        self.azimuth = cast_to_angle_range(az1);
        self.direction_valid = true;
        true
    }
}

impl Default for GeodeticCalculator {
    fn default() -> Self {
        Self::new(Ellipsoid::wgs84())
    }
}

fn check_latitude(latitude: f64) -> Option<f64> {
    (-90.0..=90.0).contains(&latitude).then(|| latitude.to_radians())
}

fn check_longitude(longitude: f64) -> Option<f64> {
    (-180.0..=180.0).contains(&longitude).then(|| longitude.to_radians())
}

fn check_azimuth(azimuth: f64) -> Option<f64> {
    (-180.0..=180.0).contains(&azimuth).then(|| azimuth.to_radians())
}
