//! Static catalog of monitoring stations.

use super::models::{MonitoringStation, StationReading, StationStatus, StationType};
use serde::Serialize;

const fn reading(wave: f64, wind: f64, temp: f64, tide: f64, salinity: f64, current: f64) -> StationReading {
    StationReading {
        wave_height_m: Some(wave),
        wind_speed_kmh: Some(wind),
        temperature_c: Some(temp),
        tide_level_m: Some(tide),
        salinity_psu: Some(salinity),
        current_speed_ms: Some(current),
    }
}

pub const STATIONS: &[MonitoringStation] = &[
    MonitoringStation {
        id: "MUM001",
        name: "Mumbai Deep Water",
        coordinates: (72.8777, 19.076),
        status: StationStatus::Active,
        last_update: "2 min ago",
        current_reading: reading(2.3, 18.0, 28.5, 1.2, 34.8, 0.4),
        station_type: StationType::DeepWater,
    },
    MonitoringStation {
        id: "CHN001",
        name: "Chennai Port Station",
        coordinates: (80.2707, 13.0827),
        status: StationStatus::Active,
        last_update: "1 min ago",
        current_reading: reading(1.8, 22.0, 30.2, 0.8, 35.1, 0.3),
        station_type: StationType::Coastal,
    },
    MonitoringStation {
        id: "GOA001",
        name: "Goa Coastal Buoy",
        coordinates: (73.8278, 15.2993),
        status: StationStatus::Active,
        last_update: "3 min ago",
        current_reading: reading(1.5, 15.0, 29.8, 1.0, 34.6, 0.2),
        station_type: StationType::Buoy,
    },
    MonitoringStation {
        id: "VZG001",
        name: "Visakhapatnam Naval Base",
        coordinates: (83.3018, 17.6868),
        status: StationStatus::Maintenance,
        last_update: "2h ago",
        current_reading: reading(2.1, 25.0, 27.9, 1.3, 34.9, 0.5),
        station_type: StationType::Coastal,
    },
    MonitoringStation {
        id: "KOL001",
        name: "Kolkata Tide Gauge",
        coordinates: (88.3639, 22.5726),
        status: StationStatus::Active,
        last_update: "1 min ago",
        current_reading: reading(0.8, 12.0, 26.5, 2.1, 28.2, 0.1),
        station_type: StationType::TideGauge,
    },
    MonitoringStation {
        id: "KOC001",
        name: "Kochi Backwater Station",
        coordinates: (76.2673, 9.9312),
        status: StationStatus::Active,
        last_update: "4 min ago",
        current_reading: reading(1.2, 14.0, 31.1, 0.7, 33.8, 0.2),
        station_type: StationType::Coastal,
    },
    MonitoringStation {
        id: "PDB001",
        name: "Paradip Deep Sea",
        coordinates: (86.6947, 20.2648),
        status: StationStatus::Alert,
        last_update: "30 sec ago",
        current_reading: reading(2.8, 28.0, 27.2, 1.5, 35.0, 0.6),
        station_type: StationType::DeepWater,
    },
    MonitoringStation {
        id: "PBL001",
        name: "Port Blair Island Station",
        coordinates: (92.7265, 11.6234),
        status: StationStatus::Active,
        last_update: "5 min ago",
        current_reading: reading(1.9, 20.0, 29.5, 0.9, 34.7, 0.3),
        station_type: StationType::Buoy,
    },
];

pub fn find_station(id: &str) -> Option<&'static MonitoringStation> {
    STATIONS.iter().find(|s| s.id.eq_ignore_ascii_case(id))
}

/// Station counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StationStats {
    pub active: usize,
    pub maintenance: usize,
    pub alert: usize,
    pub offline: usize,
    pub total: usize,
}

pub fn station_stats(stations: &[MonitoringStation]) -> StationStats {
    stations.iter().fold(
        StationStats { total: stations.len(), ..Default::default() },
        |mut stats, s| {
            match s.status {
                StationStatus::Active => stats.active += 1,
                StationStatus::Maintenance => stats.maintenance += 1,
                StationStatus::Alert => stats.alert += 1,
                StationStatus::Offline => stats.offline += 1,
            }
            stats
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_station_ids_are_unique() {
        let ids: HashSet<_> = STATIONS.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), STATIONS.len());
    }

    #[test]
    fn test_station_stats_add_up() {
        let stats = station_stats(STATIONS);
        assert_eq!(stats.total, 8);
        assert_eq!(stats.active, 6);
        assert_eq!(stats.maintenance, 1);
        assert_eq!(stats.alert, 1);
        assert_eq!(stats.offline, 0);
        assert_eq!(stats.active + stats.maintenance + stats.alert + stats.offline, stats.total);
    }

    #[test]
    fn test_find_station() {
        assert_eq!(find_station("pdb001").map(|s| s.name), Some("Paradip Deep Sea"));
        assert!(find_station("XYZ999").is_none());
    }

    #[test]
    fn test_status_string_matches_serialized_form() {
        for station in STATIONS {
            let json = serde_json::to_value(station.status).unwrap();
            assert_eq!(json, station.status.as_str());
        }
        assert_eq!(StationStatus::Maintenance.as_str(), "maintenance");
    }
}
