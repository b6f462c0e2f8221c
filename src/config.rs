//! Configuration module for Snapby.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::scheduler::{DEFAULT_MAX_PANELS, DEFAULT_PANEL_IDLE_TIMEOUT};

use std::env;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Seconds between synthetic series refreshes of a mounted panel (default: 30)
    pub refresh_interval: Duration,
    /// Panels nobody has read for this long are unmounted (default: 300s)
    pub panel_idle_timeout: Duration,
    /// Upper bound on concurrently mounted panels (default: 256)
    pub max_panels: usize,
    /// Offset applied to sample time labels, in minutes east of UTC (default: IST, 330)
    pub display_offset_minutes: i32,
    /// Optional cap on session reports; `None` keeps every report
    pub max_reports: Option<usize>,
    /// Simulated assistant "typing" delay, in milliseconds
    pub reply_delay_ms: RangeInclusive<u64>,
    /// Timeout for remote image checks
    pub image_timeout: Duration,
    /// Maximum request body size; photos are submitted inline as base64
    pub max_body_bytes: usize,
    /// Assistant conversations kept before the least recently used is dropped
    pub max_conversations: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            refresh_interval: Duration::from_secs(30),
            panel_idle_timeout: DEFAULT_PANEL_IDLE_TIMEOUT,
            max_panels: DEFAULT_MAX_PANELS,
            display_offset_minutes: 330,
            max_reports: None,
            reply_delay_ms: 1000..=2000,
            image_timeout: Duration::from_millis(3000),
            // 10 MB photo after base64 expansion, plus the JSON envelope
            max_body_bytes: 14 * 1024 * 1024,
            max_conversations: 256,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SNAPBY_HTTP_PORT`: HTTP port (default: 8080)
    /// - `SNAPBY_REFRESH_SECS`: panel refresh interval (default: 30)
    /// - `SNAPBY_PANEL_IDLE_SECS`: unmount panels unread for this long (default: 300)
    /// - `SNAPBY_MAX_PANELS`: concurrently mounted panels (default: 256)
    /// - `SNAPBY_DISPLAY_OFFSET_MINUTES`: label offset from UTC (default: 330)
    /// - `SNAPBY_MAX_REPORTS`: report cap (default: unbounded)
    /// - `SNAPBY_REPLY_DELAY_MS`: assistant delay as `min-max` or a single value (default: 1000-2000)
    /// - `SNAPBY_IMAGE_TIMEOUT_MS`: remote image check timeout (default: 3000)
    /// - `SNAPBY_MAX_BODY_BYTES`: request body limit (default: 14 MiB)
    /// - `SNAPBY_MAX_CONVERSATIONS`: assistant conversations kept (default: 256)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Values that fail to parse keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = lookup("SNAPBY_HTTP_PORT").and_then(|v| v.parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(secs) = lookup("SNAPBY_REFRESH_SECS").and_then(|v| v.parse::<u64>().ok()) {
            if secs > 0 {
                cfg.refresh_interval = Duration::from_secs(secs);
            }
        }

        if let Some(secs) = lookup("SNAPBY_PANEL_IDLE_SECS").and_then(|v| v.parse::<u64>().ok()) {
            if secs > 0 {
                cfg.panel_idle_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(max) = lookup("SNAPBY_MAX_PANELS").and_then(|v| v.parse::<usize>().ok()) {
            if max > 0 {
                cfg.max_panels = max;
            }
        }

        if let Some(offset) = lookup("SNAPBY_DISPLAY_OFFSET_MINUTES").and_then(|v| v.parse::<i32>().ok()) {
            // chrono rejects offsets of a full day or more
            if offset.abs() < 24 * 60 {
                cfg.display_offset_minutes = offset;
            }
        }

        if let Some(max) = lookup("SNAPBY_MAX_REPORTS").and_then(|v| v.parse::<usize>().ok()) {
            cfg.max_reports = if max == 0 { None } else { Some(max) };
        }

        if let Some(range) = lookup("SNAPBY_REPLY_DELAY_MS").and_then(|v| parse_delay_range(&v)) {
            cfg.reply_delay_ms = range;
        }

        if let Some(ms) = lookup("SNAPBY_IMAGE_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
            cfg.image_timeout = Duration::from_millis(ms);
        }

        if let Some(bytes) = lookup("SNAPBY_MAX_BODY_BYTES").and_then(|v| v.parse().ok()) {
            cfg.max_body_bytes = bytes;
        }

        if let Some(max) = lookup("SNAPBY_MAX_CONVERSATIONS").and_then(|v| v.parse::<usize>().ok()) {
            if max > 0 {
                cfg.max_conversations = max;
            }
        }

        cfg
    }
}

/// Parse `"1000-2000"` or `"1500"` into an inclusive millisecond range.
fn parse_delay_range(s: &str) -> Option<RangeInclusive<u64>> {
    let s = s.trim();
    match s.split_once('-') {
        Some((lo, hi)) => {
            let lo: u64 = lo.trim().parse().ok()?;
            let hi: u64 = hi.trim().parse().ok()?;
            if lo > hi {
                return None;
            }
            Some(lo..=hi)
        }
        None => {
            let v: u64 = s.parse().ok()?;
            Some(v..=v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.refresh_interval, Duration::from_secs(30));
        assert_eq!(cfg.display_offset_minutes, 330);
        assert_eq!(cfg.max_reports, None);
        assert_eq!(cfg.reply_delay_ms, 1000..=2000);
        assert_eq!(cfg.panel_idle_timeout, Duration::from_secs(300));
        assert_eq!(cfg.max_panels, 256);
        assert_eq!(cfg.max_conversations, 256);
    }

    #[test]
    fn test_body_limit_fits_ten_megabyte_photo() {
        let cfg = ServerConfig::default();
        let photo = 10 * 1000 * 1000;
        let encoded = (photo + 2) / 3 * 4 + "data:image/jpeg;base64,".len();
        assert!(encoded < cfg.max_body_bytes);
    }

    #[test]
    fn test_overrides() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[
            ("SNAPBY_HTTP_PORT", "9090"),
            ("SNAPBY_REFRESH_SECS", "5"),
            ("SNAPBY_MAX_REPORTS", "100"),
            ("SNAPBY_REPLY_DELAY_MS", "200-400"),
            ("SNAPBY_PANEL_IDLE_SECS", "60"),
            ("SNAPBY_MAX_PANELS", "8"),
            ("SNAPBY_MAX_CONVERSATIONS", "16"),
        ]));
        assert_eq!(cfg.http_port, 9090);
        assert_eq!(cfg.refresh_interval, Duration::from_secs(5));
        assert_eq!(cfg.max_reports, Some(100));
        assert_eq!(cfg.reply_delay_ms, 200..=400);
        assert_eq!(cfg.panel_idle_timeout, Duration::from_secs(60));
        assert_eq!(cfg.max_panels, 8);
        assert_eq!(cfg.max_conversations, 16);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[
            ("SNAPBY_HTTP_PORT", "not-a-port"),
            ("SNAPBY_REFRESH_SECS", "0"),
            ("SNAPBY_DISPLAY_OFFSET_MINUTES", "99999"),
            ("SNAPBY_REPLY_DELAY_MS", "900-100"),
            ("SNAPBY_MAX_PANELS", "0"),
        ]));
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.refresh_interval, Duration::from_secs(30));
        assert_eq!(cfg.display_offset_minutes, 330);
        assert_eq!(cfg.reply_delay_ms, 1000..=2000);
        assert_eq!(cfg.max_panels, 256);
    }

    #[test]
    fn test_parse_delay_range_single_value() {
        assert_eq!(parse_delay_range("1500"), Some(1500..=1500));
        assert_eq!(parse_delay_range(" 10 - 20 "), Some(10..=20));
        assert_eq!(parse_delay_range("abc"), None);
    }
}
