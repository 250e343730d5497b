mod error;
mod observer;

pub use error::GeoError;
pub use observer::{Observer, DEFAULT_OBSERVER_NAME};

/// Mean Earth radius (IUGG), km.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

const FEET_PER_METER: f64 = 3.28084;
const MILES_PER_KM: f64 = 0.621371;

pub fn to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}

pub fn to_miles(km: f64) -> f64 {
    km * MILES_PER_KM
}

/// Great-circle distance between two `(lat, lon)` points in degrees, in km.
pub fn distance_km(a: (f64, f64), b: (f64, f64)) -> Result<f64, GeoError> {
    check_point(a)?;
    check_point(b)?;

    let phi1 = a.0.to_radians();
    let phi2 = b.0.to_radians();
    let dphi = (b.0 - a.0).to_radians();
    let dlambda = (b.1 - a.1).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    Ok(2.0 * EARTH_RADIUS_KM * h.sqrt().asin())
}

pub fn check_point((lat, lon): (f64, f64)) -> Result<(), GeoError> {
    // NaN fails both comparisons
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoError::LatitudeOutOfRange(lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeoError::LongitudeOutOfRange(lon));
    }
    Ok(())
}
