//! Data model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One synthetic oceanographic reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OceanSample {
    pub timestamp: DateTime<Utc>,
    /// Display label, `hh:mm AM/PM`
    pub time: String,
    pub wave_height_m: f64,
    pub wave_period_s: f64,
    pub wave_direction_deg: f64,
    pub tide_level_m: f64,
    pub tide_phase: TidePhase,
    pub wind_speed_kmh: f64,
    pub wind_direction_deg: f64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    /// Never negative
    pub uv_index: f64,
    pub salinity_psu: f64,
    pub current_speed_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TidePhase {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    Active,
    Maintenance,
    Offline,
    Alert,
}

impl StationStatus {
    /// Same form as the serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            StationStatus::Active => "active",
            StationStatus::Maintenance => "maintenance",
            StationStatus::Offline => "offline",
            StationStatus::Alert => "alert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StationType {
    DeepWater,
    Coastal,
    Buoy,
    TideGauge,
}

/// Sparse snapshot of a station's latest reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StationReading {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_height_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_kmh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tide_level_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salinity_psu: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_speed_ms: Option<f64>,
}

/// A catalog-defined sensing location.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStation {
    pub id: &'static str,
    pub name: &'static str,
    /// (longitude, latitude)
    pub coordinates: (f64, f64),
    pub status: StationStatus,
    pub last_update: &'static str,
    pub current_reading: StationReading,
    pub station_type: StationType,
}

/// Where a report was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub captured_at_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Device,
    Fallback,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardType {
    Tsunami,
    Cyclone,
    #[default]
    Highwaves,
    Pollution,
    Erosion,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// A user-submitted hazard observation. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedReport {
    pub id: i64,
    pub image_data: String,
    pub location: Location,
    pub location_source: LocationSource,
    pub description: String,
    pub hazard_type: HazardType,
    pub urgency: Urgency,
    pub submitted_by: String,
    pub verified: bool,
    pub vote_count: u32,
}
