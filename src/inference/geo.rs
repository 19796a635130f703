use serde::{Deserialize, Serialize};

/// Mean Earth radius used for every distance in the application.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point on the globe in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_distance(*self, *other)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Self::new(latitude, longitude)
    }
}

/// Great-circle distance in meters between two coordinates.
///
/// Results are meaningless for non-finite input. Samples are validated before they get here, so
/// there's no check.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lon / 2.).sin().powi(2);
    let c = 2. * h.sqrt().atan2((1. - h).sqrt());

    EARTH_RADIUS_M * c
}
