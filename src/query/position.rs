//! Geographic Near/Inside searches on `ImagePositions`.
//!
//! A radius search is compiled to a rectangle the SQL engine can test,
//! paired with a [`HaversinePostHook`] that keeps only the rows inside the
//! circle. The rectangle must contain the whole circle.

use tracing::{debug, warn};

use super::field_builder::FieldQueryBuilder;
use super::hooks::{HaversinePostHook, PostHooks};
use crate::geodetic::{Ellipsoid, GeodeticCalculator};
use crate::searchxml::Relation;

/// Default radius of a Near search, in meters.
pub const DEFAULT_NEAR_DISTANCE: f64 = 100.0;

/// Extra margin so points on the rectangle edge survive rounding.
const EDGE_MARGIN_DEGREES: f64 = 1e-9;

/// Longitude/latitude rectangle in degrees.
///
/// `west > east` means the rectangle crosses the 180° meridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRect {
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub south: f64,
}

impl GeoRect {
    pub fn new(west: f64, north: f64, east: f64, south: f64) -> Self {
        Self {
            west,
            north,
            east,
            south,
        }
    }

    /// Rectangle enclosing every point within `distance` meters of the center.
    ///
    /// Covers both the ellipsoidal projections in the four cardinal
    /// directions and the spherical circle tested by [`HaversinePostHook`].
    /// `None` for invalid coordinates or a negative distance.
    pub fn around(ellipsoid: &Ellipsoid, longitude: f64, latitude: f64, distance: f64) -> Option<Self> {
        let mut calculator = GeodeticCalculator::new(ellipsoid.clone());
        if !calculator.set_starting_geographic_point(longitude, latitude) {
            return None;
        }

        let mut project = |azimuth: f64| -> Option<(f64, f64)> {
            if !calculator.set_direction(azimuth, distance) {
                return None;
            }
            calculator.destination_geographic_point()
        };

        let (west, _) = project(-90.0)?;
        let (_, north) = project(0.0)?;
        let (east, _) = project(90.0)?;
        let (_, south) = project(180.0)?;

        let angular = distance / ellipsoid.radius_of_curvature(latitude);
        let angular_degrees = angular.to_degrees();

        let north = north.max(latitude + angular_degrees) + EDGE_MARGIN_DEGREES;
        let south = south.min(latitude - angular_degrees) - EDGE_MARGIN_DEGREES;

        let spherical_span = (angular.sin() / latitude.to_radians().cos()).abs();
        let pole_inside = north >= 90.0 || south <= -90.0;
        if pole_inside || angular >= std::f64::consts::FRAC_PI_2 || spherical_span >= 1.0 {
            return Some(Self::new(-180.0, north.min(90.0), 180.0, south.max(-90.0)));
        }

        let spherical_offset = spherical_span.asin().to_degrees();
        let west_offset = longitude_difference(longitude, west).max(spherical_offset) + EDGE_MARGIN_DEGREES;
        let east_offset = longitude_difference(east, longitude).max(spherical_offset) + EDGE_MARGIN_DEGREES;

        if west_offset + east_offset >= 360.0 {
            return Some(Self::new(-180.0, north, 180.0, south));
        }

        Some(Self::new(
            wrap_longitude(longitude - west_offset),
            north,
            wrap_longitude(longitude + east_offset),
            south,
        ))
    }

    /// Whether the rectangle crosses the 180° meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Same test as the SQL emitted for this rectangle.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        let in_latitude = latitude < self.north && latitude > self.south;
        let in_longitude = if self.crosses_antimeridian() {
            longitude > self.west || longitude < self.east
        } else {
            longitude > self.west && longitude < self.east
        };
        in_latitude && in_longitude
    }
}

/// Eastward angle from `from` to `to`, in [0, 360).
fn longitude_difference(to: f64, from: f64) -> f64 {
    (to - from).rem_euclid(360.0)
}

fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}

impl FieldQueryBuilder<'_, '_> {
    /// Near or Inside search; other relations decline.
    pub(crate) fn add_position(&mut self, hooks: &mut PostHooks, ellipsoid: &Ellipsoid) -> bool {
        match self.relation {
            Relation::Near => self.add_near_position(hooks, ellipsoid),
            Relation::Inside => self.add_inside_position(),
            other => {
                debug!("Relation {} is not supported for positions", other.as_str());
                false
            }
        }
    }

    fn add_near_position(&mut self, hooks: &mut PostHooks, ellipsoid: &Ellipsoid) -> bool {
        let radius_search = self.reader.attribute("type") != Some("rectangle");
        let distance = match self.reader.attribute("distance") {
            None => DEFAULT_NEAR_DISTANCE,
            Some(text) => match text.trim().parse::<f64>() {
                Ok(distance) if distance >= 0.0 => distance,
                _ => {
                    warn!("Invalid distance '{}' for relation 'Near'", text);
                    return false;
                }
            },
        };

        let values = self.reader.value_to_double_list();
        let &[longitude, latitude] = values.as_slice() else {
            warn!("Relation 'Near' requires a list of two values");
            return false;
        };

        let Some(rect) = GeoRect::around(ellipsoid, longitude, latitude, distance) else {
            warn!(
                "Cannot compute the area around {}, {} for a distance of {} m",
                longitude, latitude, distance
            );
            return false;
        };

        self.sql.push_str(" ( ");
        self.add_rectangle_position_search(&rect);
        self.sql.push_str(" ) ");

        if radius_search {
            hooks.add_hook(Box::new(HaversinePostHook::new(
                latitude,
                longitude,
                ellipsoid.radius_of_curvature(latitude),
                distance,
            )));
        }
        true
    }

    fn add_inside_position(&mut self) -> bool {
        if let Some(kind) = self.reader.attribute("type") {
            if kind != "rectangle" {
                warn!(
                    "Relation 'Inside' supports no other type than 'rectangle', got '{}'",
                    kind
                );
                return false;
            }
        }

        let values = self.reader.value_to_double_list();
        let &[west, north, east, south] = values.as_slice() else {
            warn!("Relation 'Inside' requires a list of four values");
            return false;
        };

        self.sql.push_str(" ( ");
        self.add_rectangle_position_search(&GeoRect::new(west, north, east, south));
        self.sql.push_str(" ) ");
        true
    }

    fn add_rectangle_position_search(&mut self, rect: &GeoRect) {
        if rect.crosses_antimeridian() {
            self.sql.push_str(
                " (ImagePositions.LongitudeNumber > ? OR ImagePositions.LongitudeNumber < ?) \
                 AND ImagePositions.LatitudeNumber < ? AND ImagePositions.LatitudeNumber > ? ",
            );
            self.sql.bind(rect.west);
            self.sql.bind(rect.east);
            self.sql.bind(rect.north);
            self.sql.bind(rect.south);
        } else {
            self.sql.push_str(
                " ImagePositions.LongitudeNumber > ? AND ImagePositions.LatitudeNumber < ? \
                 AND ImagePositions.LongitudeNumber < ? AND ImagePositions.LatitudeNumber > ? ",
            );
            self.sql.bind(rect.west);
            self.sql.bind(rect.north);
            self.sql.bind(rect.east);
            self.sql.bind(rect.south);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::buffer::SqlBuffer;
    use crate::query::hooks::PostHook;
    use crate::query::SqlParam;
    use crate::searchxml::SearchXmlCachingReader;

    /// Spherical destination point, returns (latitude, longitude).
    fn destination(lat: f64, lon: f64, bearing: f64, angular: f64) -> (f64, f64) {
        let (lat1, lon1, theta) = (lat.to_radians(), lon.to_radians(), bearing.to_radians());
        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());
        (lat2.to_degrees(), wrap_longitude(lon2.to_degrees()))
    }

    fn compile(field: &str) -> Option<(SqlBuffer, PostHooks)> {
        let xml = format!("<search><group>{}</group></search>", field);
        let mut reader = SearchXmlCachingReader::new(&xml);
        reader.read_to_first_field();
        let relation = reader.field_relation();

        let mut sql = SqlBuffer::new();
        let mut hooks = PostHooks::new();
        let accepted = FieldQueryBuilder::new(&mut sql, &mut reader, relation)
            .add_position(&mut hooks, &Ellipsoid::wgs84());
        accepted.then_some((sql, hooks))
    }

    #[test]
    fn test_near_radius_adds_one_hook() {
        let (sql, hooks) = compile(
            r#"<field name="position" relation="near" type="radius" distance="100"><listitem>8.5</listitem><listitem>47.3</listitem></field>"#,
        )
        .unwrap();

        assert!(sql.sql().starts_with(" ( "));
        assert!(sql.sql().contains("ImagePositions.LongitudeNumber > ?"));
        assert_eq!(sql.values().len(), 4);
        assert_eq!(sql.placeholder_count(), 4);
        assert_eq!(hooks.len(), 1);

        assert!(hooks.check_position(47.3, 8.5));
        // 1000 m north of the center
        assert!(!hooks.check_position(47.3 + 1000.0 / 111_200.0, 8.5));
    }

    #[test]
    fn test_near_rectangle_has_no_hook() {
        let (_, hooks) = compile(
            r#"<field name="position" relation="near" type="rectangle" distance="500"><listitem>8.5</listitem><listitem>47.3</listitem></field>"#,
        )
        .unwrap();
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_near_default_distance() {
        let (sql, _) = compile(
            r#"<field name="position" relation="near"><listitem>0</listitem><listitem>0</listitem></field>"#,
        )
        .unwrap();
        let Some(SqlParam::Real(north)) = sql.values().get(1) else {
            panic!("expected the north bound");
        };
        // 100 m is about 0.0009 degrees of latitude
        assert!(*north > 0.0008 && *north < 0.0011);
    }

    #[test]
    fn test_near_requires_two_values() {
        assert!(compile(
            r#"<field name="position" relation="near"><listitem>8.5</listitem></field>"#
        )
        .is_none());
    }

    #[test]
    fn test_near_rejects_bad_distance_and_coordinates() {
        assert!(compile(
            r#"<field name="position" relation="near" distance="-5"><listitem>8.5</listitem><listitem>47.3</listitem></field>"#
        )
        .is_none());
        assert!(compile(
            r#"<field name="position" relation="near"><listitem>8.5</listitem><listitem>95</listitem></field>"#
        )
        .is_none());
    }

    #[test]
    fn test_inside_rectangle() {
        let (sql, hooks) = compile(
            r#"<field name="position" relation="inside" type="rectangle"><listitem>5</listitem><listitem>50</listitem><listitem>10</listitem><listitem>45</listitem></field>"#,
        )
        .unwrap();
        assert_eq!(
            sql.sql(),
            " (  ImagePositions.LongitudeNumber > ? AND ImagePositions.LatitudeNumber < ? \
             AND ImagePositions.LongitudeNumber < ? AND ImagePositions.LatitudeNumber > ?  ) "
        );
        assert_eq!(
            sql.values(),
            &[
                SqlParam::Real(5.0),
                SqlParam::Real(50.0),
                SqlParam::Real(10.0),
                SqlParam::Real(45.0)
            ]
        );
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_inside_across_antimeridian() {
        let (sql, _) = compile(
            r#"<field name="position" relation="inside"><listitem>170</listitem><listitem>10</listitem><listitem>-170</listitem><listitem>-10</listitem></field>"#,
        )
        .unwrap();
        assert!(sql
            .sql()
            .starts_with(" (  (ImagePositions.LongitudeNumber > ? OR ImagePositions.LongitudeNumber < ?)"));
        assert_eq!(
            sql.values(),
            &[
                SqlParam::Real(170.0),
                SqlParam::Real(-170.0),
                SqlParam::Real(10.0),
                SqlParam::Real(-10.0)
            ]
        );
    }

    #[test]
    fn test_inside_rejects_other_type_and_counts() {
        assert!(compile(
            r#"<field name="position" relation="inside" type="circle"><listitem>5</listitem><listitem>50</listitem><listitem>10</listitem><listitem>45</listitem></field>"#
        )
        .is_none());
        assert!(compile(
            r#"<field name="position" relation="inside"><listitem>5</listitem><listitem>50</listitem></field>"#
        )
        .is_none());
    }

    #[test]
    fn test_other_relation_declines() {
        assert!(compile(r#"<field name="position" relation="equal">5</field>"#).is_none());
    }

    #[test]
    fn test_rectangle_contains_circle() {
        let ellipsoid = Ellipsoid::wgs84();
        let centers = [
            (8.5, 47.3),
            (0.0, 0.0),
            (179.99, -33.0),
            (-179.995, 60.0),
            (20.0, 89.0),
            (-70.0, -85.0),
        ];
        let distances = [100.0, 5_000.0, 250_000.0];

        for (lon, lat) in centers {
            for distance in distances {
                let rect = GeoRect::around(&ellipsoid, lon, lat, distance).unwrap();
                let hook = HaversinePostHook::new(lat, lon, ellipsoid.radius_of_curvature(lat), distance);
                let angular = hook.distance_in_radians() * 0.999_999;

                for step in 0..72 {
                    let (plat, plon) = destination(lat, lon, step as f64 * 5.0, angular);
                    if hook.check_position(plat, plon) {
                        assert!(
                            rect.contains(plat, plon),
                            "{:?} misses {}, {} around {}, {} at {} m",
                            rect,
                            plat,
                            plon,
                            lat,
                            lon,
                            distance
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_rectangle_near_pole_spans_all_longitudes() {
        let rect = GeoRect::around(&Ellipsoid::wgs84(), 10.0, 89.99, 5_000.0).unwrap();
        assert_eq!(rect.west, -180.0);
        assert_eq!(rect.east, 180.0);
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(190.0), -170.0);
        assert_eq!(wrap_longitude(-190.0), 170.0);
        assert_eq!(wrap_longitude(180.0), 180.0);
    }
}
