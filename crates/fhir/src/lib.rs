//! FHIR-aligned resource projection.
//!
//! This crate provides **wire models** and pure projection helpers that
//! render the canonical record into Patient-like, Encounter-like,
//! Observation-like, and DiagnosticReport-like structures. No validation
//! lives here: invalid data has been filtered
//! out upstream, and malformed input reaching this stage indicates an
//! upstream contract violation.
//!
//! Absent canonical fields are skipped on the wire rather than coerced
//! into defaults that look like real data.

pub mod encounter;
pub mod observation;
pub mod patient;

pub use encounter::{project_encounter, EncounterResource};
pub use observation::{
    project_diagnostic_report, project_observations, DiagnosticReportResource,
    ObservationResource,
};
pub use patient::{project_patient, PatientResource};

use intake_types::CanonicalRecord;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("failed to serialise resource: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Project both resources from one canonical record.
///
/// The record is borrowed read-only; the encounter resource exists only
/// when the record carries encounter data.
pub fn project_resources(
    record: &CanonicalRecord,
) -> (PatientResource, Option<EncounterResource>) {
    (project_patient(record), project_encounter(record))
}
