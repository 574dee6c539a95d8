use chrono::{DateTime, Utc};
use geo_types::Point;

use crate::{distance::haversine_distance, error::RideError};

/// A single fix. The position follows the geo convention of x = longitude, y = latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub position: Point,
    pub timestamp: DateTime<Utc>,
}

impl TrackPoint {
    pub fn new(position: Point, timestamp: DateTime<Utc>) -> Self {
        Self {
            position,
            timestamp,
        }
    }

    /// Builds a fix from WGS-84 coordinates in degrees. Out of range values are rejected, not clamped.
    pub fn from_coordinates(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Result<Self, RideError> {
        if !(-90. ..=90.).contains(&latitude) {
            return Err(RideError::invalid(format!("Latitude {latitude} is outside [-90, 90]")));
        }
        if !(-180. ..=180.).contains(&longitude) {
            return Err(RideError::invalid(format!("Longitude {longitude} is outside [-180, 180]")));
        }

        Ok(Self::new(Point::new(longitude, latitude), timestamp))
    }

    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    pub fn longitude(&self) -> f64 {
        self.position.x()
    }

    /// Kilometers to another fix.
    pub fn distance_to(&self, other: &TrackPoint) -> f64 {
        haversine_distance(self.position, other.position)
    }
}

#[test]
fn test_coordinates_are_validated() {
    let now = Utc::now();

    let point = TrackPoint::from_coordinates(28.7, 77.1, now).unwrap();
    assert_eq!(point.latitude(), 28.7);
    assert_eq!(point.longitude(), 77.1);

    assert!(TrackPoint::from_coordinates(90., 180., now).is_ok());
    assert!(TrackPoint::from_coordinates(-90., -180., now).is_ok());

    assert!(TrackPoint::from_coordinates(90.01, 0., now).is_err());
    assert!(TrackPoint::from_coordinates(0., -180.5, now).is_err());
    assert!(TrackPoint::from_coordinates(f64::NAN, 0., now).is_err());
    assert!(TrackPoint::from_coordinates(0., f64::INFINITY, now).is_err());
}
