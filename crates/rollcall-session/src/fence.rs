//! Optional location gate for check-ins.
//!
//! Disabled by default. When enabled, a check-in must carry coordinates
//! within `radius_m` of a fixed point, measured as great-circle distance.

use crate::FenceConfig;

/// Mean Earth radius used for the great-circle distance, in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point reported by the student's device, decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Decides whether a check-in location is acceptable.
pub trait GeoFence: Send + Sync + 'static {
    /// `false` means the fence accepts every check-in and coordinates are
    /// not required.
    fn enforced(&self) -> bool;

    fn contains(&self, location: Location) -> bool;
}

/// Accepts everything. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFence;

impl GeoFence for OpenFence {
    fn enforced(&self) -> bool {
        false
    }

    fn contains(&self, _location: Location) -> bool {
        true
    }
}

/// A circle around a fixed point.
#[derive(Debug, Clone, PartialEq)]
pub struct CampusFence {
    pub center: Location,
    pub radius_m: f64,
}

impl CampusFence {
    pub fn from_config(config: &FenceConfig) -> Self {
        Self {
            center: Location {
                lat: config.latitude,
                lng: config.longitude,
            },
            radius_m: config.radius_m,
        }
    }
}

impl GeoFence for CampusFence {
    fn enforced(&self) -> bool {
        true
    }

    fn contains(&self, location: Location) -> bool {
        haversine_m(self.center, location) <= self.radius_m
    }
}

/// Great-circle distance between two points in metres.
pub fn haversine_m(a: Location, b: Location) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campus() -> CampusFence {
        CampusFence::from_config(&FenceConfig::default())
    }

    #[test]
    fn test_haversine_m_same_point_is_zero() {
        let p = Location { lat: 13.72, lng: 100.45 };
        assert!(haversine_m(p, p).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_m_one_degree_latitude_is_about_111_km() {
        let d = haversine_m(
            Location { lat: 0.0, lng: 0.0 },
            Location { lat: 1.0, lng: 0.0 },
        );
        assert!((d - 111_195.0).abs() < 10.0, "{d}");
    }

    #[test]
    fn test_contains_center_is_inside() {
        let fence = campus();
        assert!(fence.contains(fence.center));
    }

    #[test]
    fn test_contains_point_two_km_away_is_outside() {
        let fence = campus();
        let far = Location {
            lat: fence.center.lat + 0.018,
            lng: fence.center.lng,
        };
        assert!(!fence.contains(far));
    }

    #[test]
    fn test_contains_nan_is_outside() {
        let fence = campus();
        assert!(!fence.contains(Location { lat: f64::NAN, lng: 0.0 }));
    }

    #[test]
    fn test_open_fence_is_not_enforced() {
        assert!(!OpenFence.enforced());
        assert!(OpenFence.contains(Location { lat: 90.0, lng: 0.0 }));
    }
}
