//! Store module for Snapby.
//!
//! Holds the data model, the static station catalog, and the in-memory
//! registry of session reports.

mod models;
mod registry;
mod reports;
mod stations;

pub use models::*;
pub use registry::*;
pub use reports::*;
pub use stations::*;
