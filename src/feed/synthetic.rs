//! Synthetic oceanographic series: periodic baseline plus uniform noise.

use super::SeriesSource;
use crate::store::{OceanSample, TidePhase};

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Offset, Utc};
use rand::Rng;

/// Samples per generated series, one per hour.
pub const SERIES_LEN: usize = 24;

/// Spacing between consecutive samples.
pub const SAMPLE_SPACING_MS: i64 = 60 * 60 * 1000;

/// What happens when a generated value drops below a metric's floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Floor {
    /// Raise the value to the floor.
    Clamp(f64),
    /// Keep the value, log a warning.
    Flag(f64),
}

/// `baseline + amplitude * sin((i + phase) * frequency) + uniform(0, noise)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waveform {
    pub name: &'static str,
    pub baseline: f64,
    pub amplitude: f64,
    pub frequency: f64,
    pub phase: f64,
    pub noise: f64,
    pub floor: Floor,
}

impl Waveform {
    pub const fn new(name: &'static str, baseline: f64, amplitude: f64, frequency: f64, noise: f64) -> Self {
        Self {
            name,
            baseline,
            amplitude,
            frequency,
            phase: 0.0,
            noise,
            floor: Floor::Flag(0.0),
        }
    }

    pub const fn with_phase(self, phase: f64) -> Self {
        Self { phase, ..self }
    }

    pub const fn with_floor(self, floor: Floor) -> Self {
        Self { floor, ..self }
    }

    /// The periodic term alone, in `[-1, 1]`.
    pub fn cycle(&self, i: usize) -> f64 {
        ((i as f64 + self.phase) * self.frequency).sin()
    }

    /// Noise-free value at index `i`.
    pub fn periodic(&self, i: usize) -> f64 {
        self.baseline + self.amplitude * self.cycle(i)
    }

    pub fn sample<R: Rng + ?Sized>(&self, i: usize, rng: &mut R) -> f64 {
        let value = self.periodic(i) + rng.gen::<f64>() * self.noise;

        match self.floor {
            Floor::Clamp(min) => value.max(min),
            Floor::Flag(min) => {
                if value < min {
                    tracing::warn!("Synthetic {} below floor at index {}: {:.3} < {}", self.name, i, value, min);
                }
                value
            }
        }
    }
}

/// Per-metric waveforms for one synthetic feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OceanProfile {
    pub wave_height: Waveform,
    pub wave_period: Waveform,
    pub wave_direction: Waveform,
    pub tide_level: Waveform,
    pub wind_speed: Waveform,
    pub wind_direction: Waveform,
    pub temperature: Waveform,
    pub humidity: Waveform,
    pub uv_index: Waveform,
    pub salinity: Waveform,
    pub current_speed: Waveform,
}

/// Tropical Indian coastline conditions.
pub const INDIAN_COAST: OceanProfile = OceanProfile {
    wave_height: Waveform::new("wave height", 1.5, 0.8, 0.5, 0.4),
    wave_period: Waveform::new("wave period", 8.0, 2.0, 0.3, 1.0),
    wave_direction: Waveform::new("wave direction", 225.0, 30.0, 0.2, 10.0),
    tide_level: Waveform::new("tide level", 0.5, 0.4, 0.26, 0.1),
    wind_speed: Waveform::new("wind speed", 15.0, 5.0, 0.4, 3.0),
    wind_direction: Waveform::new("wind direction", 180.0, 45.0, 0.3, 20.0),
    temperature: Waveform::new("temperature", 28.0, 3.0, 0.25, 2.0),
    humidity: Waveform::new("humidity", 65.0, 15.0, 0.35, 5.0),
    // peak lines up with midday
    uv_index: Waveform::new("uv index", 6.0, 4.0, 0.26, 2.0)
        .with_phase(-6.0)
        .with_floor(Floor::Clamp(0.0)),
    salinity: Waveform::new("salinity", 34.5, 0.0, 0.0, 0.5),
    current_speed: Waveform::new("current speed", 0.3, 0.2, 0.4, 0.1),
};

/// Randomized stand-in for a live sensor feed.
#[derive(Debug, Clone)]
pub struct SyntheticSeries {
    profile: OceanProfile,
    display_offset: FixedOffset,
}

impl SyntheticSeries {
    pub fn new(profile: OceanProfile, display_offset: FixedOffset) -> Self {
        Self { profile, display_offset }
    }

    /// Indian coast profile with labels rendered `offset_minutes` east of UTC.
    pub fn with_offset_minutes(offset_minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| Utc.fix());
        Self::new(INDIAN_COAST, offset)
    }

    /// Generate with an explicit random source.
    pub fn generate_with<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> Vec<OceanSample> {
        let p = &self.profile;

        (0..SERIES_LEN)
            .map(|i| {
                let hours_back = (SERIES_LEN - 1 - i) as i64;
                let timestamp = now - ChronoDuration::milliseconds(hours_back * SAMPLE_SPACING_MS);

                OceanSample {
                    timestamp,
                    time: self.label(timestamp),
                    wave_height_m: p.wave_height.sample(i, rng),
                    wave_period_s: p.wave_period.sample(i, rng),
                    wave_direction_deg: p.wave_direction.sample(i, rng),
                    tide_level_m: p.tide_level.sample(i, rng),
                    tide_phase: if p.tide_level.cycle(i) > 0.0 {
                        TidePhase::High
                    } else {
                        TidePhase::Low
                    },
                    wind_speed_kmh: p.wind_speed.sample(i, rng),
                    wind_direction_deg: p.wind_direction.sample(i, rng),
                    temperature_c: p.temperature.sample(i, rng),
                    humidity_pct: p.humidity.sample(i, rng),
                    uv_index: p.uv_index.sample(i, rng),
                    salinity_psu: p.salinity.sample(i, rng),
                    current_speed_ms: p.current_speed.sample(i, rng),
                }
            })
            .collect()
    }

    fn label(&self, timestamp: DateTime<Utc>) -> String {
        timestamp
            .with_timezone(&self.display_offset)
            .format("%I:%M %p")
            .to_string()
    }
}

impl Default for SyntheticSeries {
    fn default() -> Self {
        Self::with_offset_minutes(330)
    }
}

impl SeriesSource for SyntheticSeries {
    fn generate(&self, now: DateTime<Utc>) -> Vec<OceanSample> {
        self.generate_with(now, &mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 23, 45, 0).unwrap()
    }

    #[test]
    fn test_series_has_fixed_length_and_hourly_spacing() {
        let series = SyntheticSeries::default().generate(now());
        assert_eq!(series.len(), SERIES_LEN);
        assert_eq!(series[SERIES_LEN - 1].timestamp, now());

        for pair in series.windows(2) {
            let gap = pair[1].timestamp - pair[0].timestamp;
            assert_eq!(gap.num_milliseconds(), SAMPLE_SPACING_MS);
        }
    }

    #[test]
    fn test_labels_advance_one_hour() {
        let series = SyntheticSeries::default().generate(now());

        for pair in series.windows(2) {
            let prev = NaiveTime::parse_from_str(&pair[0].time, "%I:%M %p").unwrap();
            let next = NaiveTime::parse_from_str(&pair[1].time, "%I:%M %p").unwrap();
            let (advanced, _) = prev.overflowing_add_signed(ChronoDuration::hours(1));
            assert_eq!(advanced, next, "{} -> {}", pair[0].time, pair[1].time);
        }
    }

    #[test]
    fn test_labels_use_display_offset() {
        // 23:45 UTC is 05:15 IST the next morning
        let series = SyntheticSeries::default().generate(now());
        assert_eq!(series[SERIES_LEN - 1].time, "05:15 AM");

        let utc = SyntheticSeries::with_offset_minutes(0).generate(now());
        assert_eq!(utc[SERIES_LEN - 1].time, "11:45 PM");
    }

    #[test]
    fn test_uv_index_never_negative() {
        let generator = SyntheticSeries::default();
        let mut rng = StdRng::seed_from_u64(1);
        for k in 0..200 {
            let at = now() + ChronoDuration::minutes(k * 37);
            for sample in generator.generate_with(at, &mut rng) {
                assert!(sample.uv_index >= 0.0);
            }
        }
    }

    #[test]
    fn test_clamp_applies_to_aggressive_profile() {
        let mut profile = INDIAN_COAST;
        profile.uv_index = Waveform::new("uv index", 0.0, 10.0, 0.26, 0.0).with_floor(Floor::Clamp(0.0));
        let series = SyntheticSeries::new(profile, Utc.fix()).generate(now());

        assert!(series.iter().all(|s| s.uv_index >= 0.0));
        assert!(series.iter().any(|s| s.uv_index == 0.0));
    }

    #[test]
    fn test_values_stay_within_waveform_envelope() {
        let series = SyntheticSeries::default().generate(now());
        for (i, s) in series.iter().enumerate() {
            let w = INDIAN_COAST.wave_height;
            assert!(s.wave_height_m >= w.periodic(i) && s.wave_height_m < w.periodic(i) + w.noise);

            let t = INDIAN_COAST.tide_level;
            assert!(s.tide_level_m >= t.periodic(i) && s.tide_level_m < t.periodic(i) + t.noise);

            assert!((34.5..35.0).contains(&s.salinity_psu));
        }
    }

    #[test]
    fn test_tide_phase_follows_cycle() {
        let series = SyntheticSeries::default().generate(now());
        assert_eq!(series[0].tide_phase, TidePhase::Low);
        assert_eq!(series[1].tide_phase, TidePhase::High);
        // sin(13 * 0.26) < 0
        assert_eq!(series[13].tide_phase, TidePhase::Low);
    }

    #[test]
    fn test_same_seed_same_series() {
        let generator = SyntheticSeries::default();
        let a = generator.generate_with(now(), &mut StdRng::seed_from_u64(9));
        let b = generator.generate_with(now(), &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let generator = SyntheticSeries::default();
        let a = generator.generate(now());
        let b = generator.generate(now());

        assert_eq!(a.len(), SERIES_LEN);
        assert_eq!(b.len(), SERIES_LEN);
        assert!(b.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
