//! Hazard report submission.

use super::models::*;
use super::registry::UploadRegistry;
use crate::capture::{resolve_location, validate_data_url, GeoError, GeoFix, ImageError};

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SUBMITTER: &str = "SnapbyUser";
pub const DEFAULT_DESCRIPTION: &str = "User-uploaded hazard report";
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Report submission error types.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("invalid image: {0}")]
    Image(#[from] ImageError),
    #[error("description is {0} characters, limit is {1}")]
    DescriptionTooLong(usize, usize),
}

/// User-supplied fields of a report; everything else is filled in on submit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportDraft {
    pub image_data: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hazard_type: Option<HazardType>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub submitted_by: Option<String>,
}

/// Turn a draft and the device position into a report and add it to the registry.
///
/// A failed position never fails the submission; it resolves to a fallback
/// coastal location instead.
pub async fn submit_report(
    registry: &UploadRegistry,
    draft: ReportDraft,
    position: Result<GeoFix, GeoError>,
) -> Result<UploadedReport, ReportError> {
    validate_data_url(&draft.image_data)?;

    let description = match draft.description.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => DEFAULT_DESCRIPTION.to_string(),
    };
    let chars = description.chars().count();
    if chars > MAX_DESCRIPTION_CHARS {
        return Err(ReportError::DescriptionTooLong(chars, MAX_DESCRIPTION_CHARS));
    }

    let submitted_by = match draft.submitted_by.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_SUBMITTER.to_string(),
    };

    let location = resolve_location(position, Utc::now().timestamp_millis());
    let location_source = if location.is_fallback() {
        LocationSource::Fallback
    } else {
        LocationSource::Device
    };

    let report = UploadedReport {
        id: registry.next_id(),
        image_data: draft.image_data,
        location: location.into_inner(),
        location_source,
        description,
        hazard_type: draft.hazard_type.unwrap_or_default(),
        urgency: draft.urgency.unwrap_or_default(),
        submitted_by,
        verified: false,
        vote_count: 0,
    };

    tracing::info!(
        "Report {} submitted by {} ({:?}, location from {:?})",
        report.id,
        report.submitted_by,
        report.hazard_type,
        report.location_source
    );

    registry.add(report.clone()).await;
    Ok(report)
}
