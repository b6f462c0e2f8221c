//! Feed module for oceanographic time series.
//!
//! Consumers depend only on [`SeriesSource`]; the synthetic generator is one
//! implementation and a real ingest client can take its place.

mod snapshot;
mod synthetic;

pub use snapshot::*;
pub use synthetic::*;

use crate::store::OceanSample;
use chrono::{DateTime, Utc};

/// Produces the hourly series shown on a dashboard panel.
pub trait SeriesSource: Send + Sync {
    /// Return the samples ending at `now`, oldest first.
    fn generate(&self, now: DateTime<Utc>) -> Vec<OceanSample>;
}
