use super::{check_point, distance_km, GeoError};

pub const DEFAULT_OBSERVER_NAME: &str = "Unknown";

/// Fixed location alerts are measured from.
#[derive(Debug, Clone, PartialEq)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub name: String,
}

impl Observer {
    pub fn new(latitude_deg: f64, longitude_deg: f64, name: impl Into<String>) -> Result<Self, GeoError> {
        check_point((latitude_deg, longitude_deg))?;
        Ok(Self {
            latitude_deg,
            longitude_deg,
            name: name.into(),
        })
    }

    pub fn position(&self) -> (f64, f64) {
        (self.latitude_deg, self.longitude_deg)
    }

    pub fn distance_km_to(&self, lat: f64, lon: f64) -> Result<f64, GeoError> {
        distance_km(self.position(), (lat, lon))
    }
}
