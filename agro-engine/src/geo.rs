//! Planar distance between entity coordinates
//!
//! Distances are Euclidean in degree space scaled by a fixed 111 km per
//! degree. This is not geodesically accurate and makes no attempt to be.

use crate::{Error, Result};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Kilometres per degree of latitude or longitude
pub const KM_PER_DEGREE: f64 = 111.0;

/// Decimal places kept when a distance is priced
pub const DISTANCE_SCALE: u32 = 6;

/// Validated latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Create a point, rejecting latitudes outside [-90, 90] and longitudes
    /// outside [-180, 180]
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidCoordinates(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinates(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Planar distance to `other` in kilometres
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlon = self.longitude - other.longitude;
        (dlat * dlat + dlon * dlon).sqrt() * KM_PER_DEGREE
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Convert a distance to a decimal suitable for pricing
pub fn km_to_decimal(km: f64) -> Decimal {
    Decimal::from_f64(km)
        .map(|d| d.round_dp(DISTANCE_SCALE))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_ranges() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
        assert!(matches!(
            GeoPoint::new(90.5, 0.0),
            Err(Error::InvalidCoordinates(_))
        ));
        assert!(GeoPoint::new(0.0, -180.1).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_planar_distance() {
        let supplier = GeoPoint::new(3.168, 101.708).unwrap();
        let retailer = GeoPoint::new(3.148, 101.698).unwrap();

        let km = supplier.distance_km(&retailer);
        assert!((km - 2.482).abs() < 0.001);
        assert_eq!(km, retailer.distance_km(&supplier));
        assert_eq!(supplier.distance_km(&supplier), 0.0);
    }

    #[test]
    fn test_km_to_decimal_rounds() {
        let d = km_to_decimal(2.482035457);
        assert_eq!(d, Decimal::new(2_482_035, 6));
        assert_eq!(km_to_decimal(f64::NAN), Decimal::ZERO);
    }
}
