use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::EARTH_RADIUS_KM;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCoordinate {
    lat: f64,
    lng: f64,
}

impl ValidatedCoordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// For compile-time constants known to be in range.
    pub(crate) const fn new_unchecked(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lng(self) -> f64 {
        self.lng
    }

    #[must_use]
    pub fn distance_km(self, other: Self) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

impl TryFrom<(f64, f64)> for ValidatedCoordinate {
    type Error = CoordinateError;

    fn try_from((lat, lng): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(lat, lng)
    }
}

/// Great-circle distance in kilometres.
///
/// Inputs are not validated: region data comes straight from JSON and a
/// non-finite result simply never wins a nearest-neighbour comparison.
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EPSILON: f64 = 1e-12;

    if (lat1 - lat2).abs() < EPSILON && (lng1 - lng2).abs() < EPSILON {
        return 0.0;
    }

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);

    let a = a.clamp(0.0, 1.0);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().asin()
}

/// Axis-aligned lat/lng box, used to fit the map around every located group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    #[must_use]
    pub fn around(point: ValidatedCoordinate) -> Self {
        Self {
            south: point.lat,
            west: point.lng,
            north: point.lat,
            east: point.lng,
        }
    }

    pub fn extend(&mut self, point: ValidatedCoordinate) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    /// `None` when the iterator yields no points.
    pub fn covering(points: impl IntoIterator<Item = ValidatedCoordinate>) -> Option<Self> {
        let mut points = points.into_iter();
        let mut bounds = Self::around(points.next()?);
        for point in points {
            bounds.extend(point);
        }
        Some(bounds)
    }
}
