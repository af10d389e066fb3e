//! Geodesic helpers
//!
//! Coordinates are WGS84 degrees. Distances are metres on a spherical earth.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance in metres
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lng1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lng2) = (b.lat.to_radians(), b.lng.to_radians());

    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    2.0 * h.sqrt().min(1.0).asin() * EARTH_RADIUS_M
}

/// Local equirectangular projection around a reference latitude
///
/// Accurate to well under a metre across a farm field.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    origin: GeoPoint,
    m_per_deg_lat: f64,
    m_per_deg_lng: f64,
}

impl LocalProjection {
    pub fn new(origin: GeoPoint) -> Self {
        let m_per_deg_lat = EARTH_RADIUS_M.to_radians();
        Self {
            origin,
            m_per_deg_lat,
            m_per_deg_lng: m_per_deg_lat * origin.lat.to_radians().cos(),
        }
    }

    /// (x east, y north) in metres
    pub fn to_xy(&self, p: GeoPoint) -> (f64, f64) {
        (
            (p.lng - self.origin.lng) * self.m_per_deg_lng,
            (p.lat - self.origin.lat) * self.m_per_deg_lat,
        )
    }

    pub fn to_geo(&self, x: f64, y: f64) -> GeoPoint {
        GeoPoint {
            lat: self.origin.lat + y / self.m_per_deg_lat,
            lng: self.origin.lng + x / self.m_per_deg_lng,
        }
    }
}
