//! Geospatial predicates over building coordinates.
//!
//! # Responsibility
//! - Validate query coordinates before any filtering happens.
//! - Provide great-circle radius and bounding-rectangle predicates.
//!
//! # Invariants
//! - All functions are pure and never touch storage.
//! - A point always lies within any radius `>= 0` of itself.
//! - Rectangle bounds are inclusive on both axes, with no antimeridian
//!   wraparound.

use crate::model::building::Building;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mean Earth radius used by distance math.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Invalid coordinate or radius input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    /// A coordinate or bound is NaN or infinite.
    NonFinite(&'static str),
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    /// Radius is negative or not finite.
    InvalidRadius(f64),
}

impl Display for GeoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite(field) => write!(f, "{field} must be a finite number"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
            Self::InvalidRadius(value) => {
                write!(f, "radius_km must be a finite number >= 0, got {value}")
            }
        }
    }
}

impl Error for GeoError {}

/// Validated coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Validates ranges `[-90, 90]` and `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() {
            return Err(GeoError::NonFinite("latitude"));
        }
        if !longitude.is_finite() {
            return Err(GeoError::NonFinite("longitude"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Great-circle distance in kilometers (spherical law of cosines).
///
/// The `acos` argument is clamped to `[-1, 1]`, so coincident and
/// antipodal points never produce `NaN`.
pub fn great_circle_distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    if from == to {
        return 0.0;
    }
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_lambda = (to.longitude - from.longitude).to_radians();
    let cosine = phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * delta_lambda.cos();
    cosine.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_KM
}

/// Circle query: center point plus non-negative radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusQuery {
    center: GeoPoint,
    radius_km: f64,
}

impl RadiusQuery {
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Result<Self, GeoError> {
        let center = GeoPoint::new(latitude, longitude)?;
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(GeoError::InvalidRadius(radius_km));
        }
        Ok(Self { center, radius_km })
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Returns whether `point` lies on or inside the circle.
    pub fn contains(&self, point: GeoPoint) -> bool {
        great_circle_distance_km(self.center, point) <= self.radius_km
    }
}

/// Latitude/longitude rectangle with inclusive bounds.
///
/// Bounds are only checked for finiteness. Inverted bounds (`min > max`)
/// are accepted and match nothing; rectangles crossing the ±180° meridian
/// are not supported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn new(
        min_latitude: f64,
        max_latitude: f64,
        min_longitude: f64,
        max_longitude: f64,
    ) -> Result<Self, GeoError> {
        for (field, value) in [
            ("min_lat", min_latitude),
            ("max_lat", max_latitude),
            ("min_lon", min_longitude),
            ("max_lon", max_longitude),
        ] {
            if !value.is_finite() {
                return Err(GeoError::NonFinite(field));
            }
        }
        Ok(Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        })
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&point.latitude)
            && (self.min_longitude..=self.max_longitude).contains(&point.longitude)
    }
}

/// Returns buildings inside the circle, preserving input order.
pub fn filter_in_radius<'a>(query: &RadiusQuery, buildings: &'a [Building]) -> Vec<&'a Building> {
    buildings
        .iter()
        .filter(|building| building_point(building).is_some_and(|point| query.contains(point)))
        .collect()
}

/// Returns buildings inside the rectangle, preserving input order.
pub fn filter_in_rectangle<'a>(
    bounds: &BoundingBox,
    buildings: &'a [Building],
) -> Vec<&'a Building> {
    buildings
        .iter()
        .filter(|building| building_point(building).is_some_and(|point| bounds.contains(point)))
        .collect()
}

// Rows violating the coordinate ranges never match any query.
fn building_point(building: &Building) -> Option<GeoPoint> {
    GeoPoint::new(building.latitude, building.longitude).ok()
}

#[cfg(test)]
mod tests {
    use super::{
        filter_in_radius, filter_in_rectangle, great_circle_distance_km, BoundingBox, GeoError,
        GeoPoint, RadiusQuery,
    };
    use crate::model::building::Building;

    fn building(id: i64, latitude: f64, longitude: f64) -> Building {
        Building {
            id,
            address: format!("building {id}"),
            latitude,
            longitude,
        }
    }

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude).expect("test point should be valid")
    }

    #[test]
    fn distance_between_identical_points_is_zero() {
        let moscow = point(55.7558, 37.6176);
        assert_eq!(great_circle_distance_km(moscow, moscow), 0.0);
    }

    #[test]
    fn distance_matches_known_city_pair() {
        let moscow = point(55.7558, 37.6176);
        let saint_petersburg = point(59.9343, 30.3351);
        let distance = great_circle_distance_km(moscow, saint_petersburg);
        assert!((distance - 634.0).abs() < 5.0, "got {distance}");
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let distance = great_circle_distance_km(point(0.0, 0.0), point(0.0, 180.0));
        assert!(distance.is_finite());
        assert!((distance - std::f64::consts::PI * 6371.0).abs() < 1e-6);
    }

    #[test]
    fn radius_filter_is_reflexive_for_zero_radius() {
        let buildings = vec![building(1, 55.7558, 37.6176), building(2, 55.7520, 37.5934)];
        let query = RadiusQuery::new(55.7558, 37.6176, 0.0).unwrap();

        let hits = filter_in_radius(&query, &buildings);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn radius_filter_includes_points_within_distance() {
        let buildings = vec![
            building(1, 55.7558, 37.6176),
            building(2, 55.7520, 37.5934),
            building(3, 59.9343, 30.3351),
        ];
        let query = RadiusQuery::new(55.7558, 37.6176, 5.0).unwrap();

        let ids: Vec<i64> = filter_in_radius(&query, &buildings)
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn radius_query_keeps_validated_center_and_radius() {
        let query = RadiusQuery::new(55.7558, 37.6176, 2.5).unwrap();

        assert_eq!(query.center().latitude(), 55.7558);
        assert_eq!(query.center().longitude(), 37.6176);
        assert_eq!(query.radius_km(), 2.5);
        assert!(query.contains(query.center()));
    }

    #[test]
    fn radius_query_rejects_negative_and_non_finite_radius() {
        assert_eq!(
            RadiusQuery::new(55.7558, 37.6176, -1.0),
            Err(GeoError::InvalidRadius(-1.0))
        );
        assert!(matches!(
            RadiusQuery::new(55.7558, 37.6176, f64::INFINITY),
            Err(GeoError::InvalidRadius(_))
        ));
    }

    #[test]
    fn geo_point_rejects_out_of_range_and_nan() {
        assert_eq!(
            GeoPoint::new(90.5, 0.0),
            Err(GeoError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            GeoPoint::new(0.0, -180.5),
            Err(GeoError::LongitudeOutOfRange(-180.5))
        );
        assert_eq!(
            GeoPoint::new(f64::NAN, 0.0),
            Err(GeoError::NonFinite("latitude"))
        );
    }

    #[test]
    fn rectangle_filter_is_inclusive_at_every_edge() {
        let bounds = BoundingBox::new(55.0, 56.0, 37.0, 38.0).unwrap();
        let buildings = vec![
            building(1, 55.0, 37.5),
            building(2, 56.0, 37.5),
            building(3, 55.5, 37.0),
            building(4, 55.5, 38.0),
            building(5, 56.0001, 37.5),
        ];

        let ids: Vec<i64> = filter_in_rectangle(&bounds, &buildings)
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn inverted_rectangle_matches_nothing() {
        let bounds = BoundingBox::new(56.0, 55.0, 37.0, 38.0).unwrap();
        assert!(!bounds.contains(point(55.5, 37.5)));
    }

    #[test]
    fn rectangle_rejects_non_finite_bounds() {
        assert_eq!(
            BoundingBox::new(55.0, f64::NAN, 37.0, 38.0),
            Err(GeoError::NonFinite("max_lat"))
        );
    }
}
