//! Geolocation capture with coastal fallback points.

use super::Resolved;
use crate::store::Location;

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

/// A position fix reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters
    pub accuracy: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
}

impl GeoFix {
    fn is_plausible(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.accuracy.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && self.accuracy >= 0.0
    }
}

/// Why the device could not provide a position.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoError {
    #[error("permission denied")]
    Denied,
    #[error("position unavailable")]
    Unavailable,
    #[error("position request timed out")]
    Timeout,
    #[error("geolocation not supported")]
    Unsupported,
}

/// A known coastal location used when the device position is unusable.
#[derive(Debug, Clone, Copy)]
pub struct CoastalPoint {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
}

pub const FALLBACK_POINTS: &[CoastalPoint] = &[
    CoastalPoint { name: "Marine Drive, Mumbai", latitude: 18.943582, longitude: 72.823776, accuracy_m: 8.0 },
    CoastalPoint { name: "Marina Beach, Chennai", latitude: 13.048319, longitude: 80.282463, accuracy_m: 12.0 },
    CoastalPoint { name: "Calangute Beach, Goa", latitude: 15.543697, longitude: 73.755035, accuracy_m: 6.0 },
    CoastalPoint { name: "Kovalam Beach, Kerala", latitude: 8.400568, longitude: 76.978016, accuracy_m: 15.0 },
    CoastalPoint { name: "Puri Beach, Odisha", latitude: 19.813542, longitude: 85.831329, accuracy_m: 10.0 },
];

/// Full width of the random offset applied to fallback coordinates, in degrees.
pub const FALLBACK_JITTER_DEG: f64 = 0.001;

/// Resolve a device position (or its failure) into a location.
pub fn resolve_location(fix: Result<GeoFix, GeoError>, captured_at_ms: i64) -> Resolved<Location> {
    resolve_location_with(fix, captured_at_ms, &mut rand::thread_rng())
}

/// Like [`resolve_location`] with an explicit random source.
pub fn resolve_location_with<R: Rng + ?Sized>(
    fix: Result<GeoFix, GeoError>,
    captured_at_ms: i64,
    rng: &mut R,
) -> Resolved<Location> {
    match fix {
        Ok(fix) if fix.is_plausible() => Resolved::Ok(Location {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy_m: fix.accuracy,
            altitude_m: fix.altitude.filter(|a| a.is_finite()),
            speed_ms: fix.speed.filter(|s| s.is_finite()),
            address: Some(reverse_geocode(fix.latitude, fix.longitude).to_string()),
            captured_at_ms,
        }),
        Ok(fix) => {
            tracing::warn!(
                "Discarding implausible position fix ({}, {}), using fallback",
                fix.latitude,
                fix.longitude
            );
            Resolved::Fallback(fallback_location(captured_at_ms, rng))
        }
        Err(e) => {
            tracing::info!("Geolocation failed ({}), using fallback coastal point", e);
            Resolved::Fallback(fallback_location(captured_at_ms, rng))
        }
    }
}

/// Pick a coastal point at random and jitter it slightly.
pub fn fallback_location<R: Rng + ?Sized>(captured_at_ms: i64, rng: &mut R) -> Location {
    let point = &FALLBACK_POINTS[rng.gen_range(0..FALLBACK_POINTS.len())];

    Location {
        latitude: point.latitude + (rng.gen::<f64>() - 0.5) * FALLBACK_JITTER_DEG,
        longitude: point.longitude + (rng.gen::<f64>() - 0.5) * FALLBACK_JITTER_DEG,
        accuracy_m: point.accuracy_m + (rng.gen::<f64>() * 5.0).floor(),
        altitude_m: Some((rng.gen::<f64>() * 50.0).floor() + 5.0),
        speed_ms: None,
        address: Some(point.name.to_string()),
        captured_at_ms,
    }
}

/// Mock reverse geocoding over a few known stretches of coast.
pub fn reverse_geocode(latitude: f64, longitude: f64) -> &'static str {
    if (18.9..=19.1).contains(&latitude) && (72.8..=73.0).contains(&longitude) {
        "Marine Drive, Mumbai"
    } else if (13.0..=13.1).contains(&latitude) && (80.2..=80.3).contains(&longitude) {
        "Marina Beach, Chennai"
    } else if (15.5..=15.6).contains(&latitude) && (73.7..=73.8).contains(&longitude) {
        "Calangute Beach, Goa"
    } else {
        "Indian Coastline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn nearest_point(loc: &Location) -> &'static CoastalPoint {
        FALLBACK_POINTS
            .iter()
            .find(|p| Some(p.name) == loc.address.as_deref())
            .expect("fallback address names a known point")
    }

    #[test]
    fn test_device_fix_is_used() {
        let fix = GeoFix {
            latitude: 19.0,
            longitude: 72.85,
            accuracy: 4.5,
            altitude: Some(12.0),
            speed: None,
        };
        let resolved = resolve_location(Ok(fix), 1_700_000_000_000);
        assert!(!resolved.is_fallback());

        let loc = resolved.into_inner();
        assert_eq!(loc.latitude, 19.0);
        assert_eq!(loc.accuracy_m, 4.5);
        assert_eq!(loc.altitude_m, Some(12.0));
        assert_eq!(loc.address.as_deref(), Some("Marine Drive, Mumbai"));
        assert_eq!(loc.captured_at_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_every_failure_falls_back() {
        let mut rng = StdRng::seed_from_u64(7);
        for err in [GeoError::Denied, GeoError::Unavailable, GeoError::Timeout, GeoError::Unsupported] {
            let resolved = resolve_location_with(Err(err), 0, &mut rng);
            assert!(resolved.is_fallback());
            let loc = resolved.into_inner();
            assert!(loc.latitude.is_finite());
            assert!(loc.longitude.is_finite());
            assert!(loc.accuracy_m.is_finite());
        }
    }

    #[test]
    fn test_fallback_stays_near_a_coastal_point() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let loc = fallback_location(0, &mut rng);
            let point = nearest_point(&loc);
            assert!((loc.latitude - point.latitude).abs() <= FALLBACK_JITTER_DEG / 2.0);
            assert!((loc.longitude - point.longitude).abs() <= FALLBACK_JITTER_DEG / 2.0);
            assert!(loc.accuracy_m >= point.accuracy_m && loc.accuracy_m < point.accuracy_m + 5.0);
            let altitude = loc.altitude_m.unwrap();
            assert!((5.0..55.0).contains(&altitude));
        }
    }

    #[test]
    fn test_implausible_fix_falls_back() {
        let fix = GeoFix {
            latitude: f64::NAN,
            longitude: 72.8,
            accuracy: 5.0,
            altitude: None,
            speed: None,
        };
        assert!(resolve_location(Ok(fix), 0).is_fallback());

        let out_of_range = GeoFix { latitude: 123.0, ..fix };
        assert!(resolve_location(Ok(out_of_range), 0).is_fallback());
    }

    #[test]
    fn test_reverse_geocode() {
        assert_eq!(reverse_geocode(13.05, 80.25), "Marina Beach, Chennai");
        assert_eq!(reverse_geocode(15.55, 73.75), "Calangute Beach, Goa");
        assert_eq!(reverse_geocode(8.4, 76.9), "Indian Coastline");
    }
}
