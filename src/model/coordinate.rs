use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A latitude/longitude pair, flattened into separate scalar fields both in
/// JSON bodies and in MySQL columns (the storage contract keeps no nested
/// location structure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    #[schema(example = 24.7136)]
    pub latitude: f64,
    #[schema(example = 46.6753)]
    pub longitude: f64,
    #[schema(example = "King Fahd Rd, Riyadh", nullable = true)]
    pub address: Option<String>,
}

#[derive(Debug, Display, Error, PartialEq)]
pub enum CoordinateError {
    #[display(fmt = "latitude {} is outside [-90, 90]", value)]
    Latitude { value: f64 },
    #[display(fmt = "longitude {} is outside [-180, 180]", value)]
    Longitude { value: f64 },
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64, address: Option<String>) -> Result<Self, CoordinateError> {
        let coordinate = Self {
            latitude,
            longitude,
            address,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Deserialized coordinates bypass `new`, so boundary code re-checks
    /// before any geofence math. NaN fails both range checks.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoordinateError::Latitude {
                value: self.latitude,
            });
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoordinateError::Longitude {
                value: self.longitude,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_bounds() {
        assert!(Coordinate::new(90.0, -180.0, None).is_ok());
        assert!(Coordinate::new(-90.0, 180.0, None).is_ok());
        assert!(Coordinate::new(24.7136, 46.6753, Some("Riyadh".into())).is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = Coordinate::new(91.0, 0.0, None).unwrap_err();
        assert_eq!(err, CoordinateError::Latitude { value: 91.0 });
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        let err = Coordinate::new(0.0, -180.5, None).unwrap_err();
        assert_eq!(err, CoordinateError::Longitude { value: -180.5 });
    }

    #[test]
    fn rejects_nan() {
        assert!(Coordinate::new(f64::NAN, 0.0, None).is_err());
        assert!(Coordinate::new(0.0, f64::NAN, None).is_err());
    }
}
