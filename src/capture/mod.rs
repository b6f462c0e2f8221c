//! Capture module for device-provided inputs.
//!
//! Geolocation and image references both degrade to a usable default
//! instead of failing, so every resolver here returns [`Resolved`].

mod geo;
mod image;

pub use geo::*;
pub use image::*;

use serde::Serialize;

/// Outcome of resolving a device input.
///
/// `Fallback` is a success from the caller's point of view: it carries a
/// fully usable value that was substituted for the real one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Resolved<T> {
    Ok(T),
    Fallback(T),
}

impl<T> Resolved<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolved::Fallback(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Resolved::Ok(v) | Resolved::Fallback(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_accessors() {
        let ok = Resolved::Ok(3);
        let fb = Resolved::Fallback(4);
        assert!(!ok.is_fallback());
        assert!(fb.is_fallback());
        assert_eq!(ok.into_inner(), 3);
        assert_eq!(fb.into_inner(), 4);
    }

    #[test]
    fn test_resolved_serializes_with_status_tag() {
        let json = serde_json::to_value(Resolved::Fallback("x")).unwrap();
        assert_eq!(json["status"], "fallback");
        assert_eq!(json["value"], "x");
    }
}
