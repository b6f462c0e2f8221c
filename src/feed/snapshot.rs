//! Current-conditions view derived from a series.

use crate::store::{OceanSample, TidePhase};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UvCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvCategory {
    pub fn from_index(uv_index: f64) -> Self {
        if uv_index <= 2.0 {
            UvCategory::Low
        } else if uv_index <= 5.0 {
            UvCategory::Moderate
        } else if uv_index <= 7.0 {
            UvCategory::High
        } else if uv_index <= 10.0 {
            UvCategory::VeryHigh
        } else {
            UvCategory::Extreme
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UvCategory::Low => "Low",
            UvCategory::Moderate => "Moderate",
            UvCategory::High => "High",
            UvCategory::VeryHigh => "Very High",
            UvCategory::Extreme => "Extreme",
        }
    }
}

/// 8-point compass label for a bearing in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    if !degrees.is_finite() {
        return "N";
    }
    let normalized = degrees.rem_euclid(360.0);
    let idx = ((normalized + 22.5) / 45.0).floor() as usize % POINTS.len();
    POINTS[idx]
}

/// The newest reading of a panel, or a zeroed placeholder before the first load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSnapshot {
    pub has_data: bool,
    pub time: Option<String>,
    pub wave_height_m: f64,
    pub wave_period_s: f64,
    pub tide_level_m: f64,
    pub tide_phase: Option<TidePhase>,
    pub wind_speed_kmh: f64,
    pub wind_direction_deg: f64,
    pub wind_compass: Option<&'static str>,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub uv_index: f64,
    pub uv_category: UvCategory,
    /// Display form of `uv_category`, e.g. "Very High"
    pub uv_label: &'static str,
    pub salinity_psu: f64,
    pub current_speed_ms: f64,
}

impl LiveSnapshot {
    pub fn placeholder() -> Self {
        Self {
            has_data: false,
            time: None,
            wave_height_m: 0.0,
            wave_period_s: 0.0,
            tide_level_m: 0.0,
            tide_phase: None,
            wind_speed_kmh: 0.0,
            wind_direction_deg: 0.0,
            wind_compass: None,
            temperature_c: 0.0,
            humidity_pct: 0.0,
            uv_index: 0.0,
            uv_category: UvCategory::Low,
            uv_label: UvCategory::Low.label(),
            salinity_psu: 0.0,
            current_speed_ms: 0.0,
        }
    }

    pub fn from_series(series: &[OceanSample]) -> Self {
        match series.last() {
            Some(latest) => Self::from_sample(latest),
            None => Self::placeholder(),
        }
    }

    fn from_sample(s: &OceanSample) -> Self {
        Self {
            has_data: true,
            time: Some(s.time.clone()),
            wave_height_m: s.wave_height_m,
            wave_period_s: s.wave_period_s,
            tide_level_m: s.tide_level_m,
            tide_phase: Some(s.tide_phase),
            wind_speed_kmh: s.wind_speed_kmh,
            wind_direction_deg: s.wind_direction_deg,
            wind_compass: Some(compass_point(s.wind_direction_deg)),
            temperature_c: s.temperature_c,
            humidity_pct: s.humidity_pct,
            uv_index: s.uv_index,
            uv_category: UvCategory::from_index(s.uv_index),
            uv_label: UvCategory::from_index(s.uv_index).label(),
            salinity_psu: s.salinity_psu,
            current_speed_ms: s.current_speed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{SeriesSource, SyntheticSeries};
    use chrono::Utc;

    #[test]
    fn test_empty_series_gives_placeholder() {
        let snap = LiveSnapshot::from_series(&[]);
        assert!(!snap.has_data);
        assert_eq!(snap.wave_height_m, 0.0);
        assert_eq!(snap, LiveSnapshot::placeholder());
    }

    #[test]
    fn test_snapshot_tracks_newest_sample() {
        let series = SyntheticSeries::default().generate(Utc::now());
        let snap = LiveSnapshot::from_series(&series);
        let latest = series.last().unwrap();

        assert!(snap.has_data);
        assert_eq!(snap.time.as_deref(), Some(latest.time.as_str()));
        assert_eq!(snap.wave_height_m, latest.wave_height_m);
        assert_eq!(snap.uv_category, UvCategory::from_index(latest.uv_index));
        assert_eq!(snap.uv_label, snap.uv_category.label());
    }

    #[test]
    fn test_uv_category_thresholds() {
        assert_eq!(UvCategory::from_index(0.0), UvCategory::Low);
        assert_eq!(UvCategory::from_index(2.0), UvCategory::Low);
        assert_eq!(UvCategory::from_index(2.1), UvCategory::Moderate);
        assert_eq!(UvCategory::from_index(7.0), UvCategory::High);
        assert_eq!(UvCategory::from_index(10.0), UvCategory::VeryHigh);
        assert_eq!(UvCategory::from_index(10.5), UvCategory::Extreme);
        assert_eq!(UvCategory::VeryHigh.label(), "Very High");
    }

    #[test]
    fn test_compass_point() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(22.4), "N");
        assert_eq!(compass_point(22.5), "NE");
        assert_eq!(compass_point(225.0), "SW");
        assert_eq!(compass_point(359.0), "N");
        assert_eq!(compass_point(-90.0), "W");
        assert_eq!(compass_point(f64::NAN), "N");
    }
}
