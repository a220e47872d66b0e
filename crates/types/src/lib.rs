//! Shared domain types for the intake workspace.
//!
//! This crate defines the vocabulary every other crate speaks:
//! - field references and validation findings with their severities
//! - the tri-state verdict derived from a finding set
//! - the canonical patient/encounter record that downstream projections consume
//! - the store-failure error that separates infrastructure health from data quality
//!
//! **No business logic**: rule tables, mapping, and pipelines belong in `intake-core`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a field position within a message segment.
///
/// Indices are 1-based per HL7 v2 convention, so `FieldRef::new("PID", 3)`
/// displays as `PID-3`. An optional component index selects a sub-part of
/// the field (`PID-3.1`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    /// Segment type code (e.g. `MSH`, `PID`, `PV1`).
    pub segment: String,
    /// 1-based field index within the segment.
    pub field: u16,
    /// Optional 1-based component index within the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<u16>,
}

impl FieldRef {
    pub fn new(segment: impl Into<String>, field: u16) -> Self {
        Self {
            segment: segment.into(),
            field,
            component: None,
        }
    }

    pub fn with_component(segment: impl Into<String>, field: u16, component: u16) -> Self {
        Self {
            segment: segment.into(),
            field,
            component: Some(component),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component {
            Some(c) => write!(f, "{}-{}.{}", self.segment, self.field, c),
            None => write!(f, "{}-{}", self.segment, self.field),
        }
    }
}

/// Severity of a single validation finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Reject,
}

/// One field-level observation produced by the validation engine.
///
/// Findings accumulate; they are never thrown. The verdict is derived from
/// the full set afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub field: FieldRef,
    pub severity: Severity,
    pub description: String,
    /// True when a documented fallback assumption was applied in place of
    /// the absent value.
    pub assumption_applied: bool,
}

impl Finding {
    pub fn info(field: FieldRef, description: impl Into<String>) -> Self {
        Self {
            field,
            severity: Severity::Info,
            description: description.into(),
            assumption_applied: false,
        }
    }

    pub fn reject(field: FieldRef, description: impl Into<String>) -> Self {
        Self {
            field,
            severity: Severity::Reject,
            description: description.into(),
            assumption_applied: false,
        }
    }

    pub fn warning(field: FieldRef, description: impl Into<String>) -> Self {
        Self {
            field,
            severity: Severity::Warning,
            description: description.into(),
            assumption_applied: false,
        }
    }

    /// A warning recording that a documented assumption stood in for an
    /// absent value.
    pub fn assumption(field: FieldRef, description: impl Into<String>) -> Self {
        Self {
            field,
            severity: Severity::Warning,
            description: description.into(),
            assumption_applied: true,
        }
    }
}

/// Tri-state outcome of validating one message.
///
/// The serialized form matches the display form, so JSON output and log
/// lines speak the same vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Accepted,
    AcceptedWithWarning,
    Rejected,
}

impl Verdict {
    /// Derive the verdict from a finding set.
    ///
    /// Any reject-severity finding forces `Rejected`; otherwise any warning
    /// forces `AcceptedWithWarning`; otherwise `Accepted`. Deterministic by
    /// construction.
    pub fn from_findings(findings: &[Finding]) -> Self {
        if findings.iter().any(|f| f.severity == Severity::Reject) {
            Verdict::Rejected
        } else if findings.iter().any(|f| f.severity == Severity::Warning) {
            Verdict::AcceptedWithWarning
        } else {
            Verdict::Accepted
        }
    }

    pub fn is_rejected(self) -> bool {
        self == Verdict::Rejected
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Accepted => "ACCEPTED",
            Verdict::AcceptedWithWarning => "ACCEPTED_WITH_WARNING",
            Verdict::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

/// Administrative sex as carried in PID-8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Other,
    Unknown,
}

impl Sex {
    /// Parse the HL7 table 0001 code.
    pub fn from_hl7(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Sex::Male),
            "F" => Some(Sex::Female),
            "O" => Some(Sex::Other),
            "U" => Some(Sex::Unknown),
            _ => None,
        }
    }

    /// FHIR administrative-gender wire string.
    pub fn as_fhir(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
            Sex::Unknown => "unknown",
        }
    }
}

/// Encounter class as carried in PV1-2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterClass {
    Inpatient,
    Outpatient,
    Emergency,
}

impl EncounterClass {
    pub fn from_hl7(code: &str) -> Option<Self> {
        match code {
            "I" => Some(EncounterClass::Inpatient),
            "O" => Some(EncounterClass::Outpatient),
            "E" => Some(EncounterClass::Emergency),
            _ => None,
        }
    }

    /// v3-ActCode class code used in the encounter projection.
    pub fn act_code(self) -> &'static str {
        match self {
            EncounterClass::Inpatient => "IMP",
            EncounterClass::Outpatient => "AMB",
            EncounterClass::Emergency => "EMER",
        }
    }
}

/// Attending provider reference from PV1-7 (`id^family^given`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
}

/// Postal address parts from PID-11.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.line.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
    }
}

/// Encounter attributes within the canonical record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEncounter {
    pub class: EncounterClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admit_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discharge_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attending: Option<ProviderRef>,
}

/// One observation result from an OBX segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalObservation {
    /// Observation code, OBX-3 first component.
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
}

/// Order context for a set of observations, from the OBR segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReport {
    /// Ordered panel code, OBR-4 first component.
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<NaiveDateTime>,
}

/// The internal, format-agnostic patient + encounter record.
///
/// Produced only for non-rejected messages. Optional fields stay `None`
/// when the source value was absent; downstream projections must carry
/// that absence through rather than substituting defaults that look like
/// real data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<CanonicalEncounter>,
    /// Order context for observation-result messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CanonicalReport>,
    /// Observation results, in message order. Empty for ADT messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<CanonicalObservation>,
}

/// Failure of an injected persistence capability (trace store or patient
/// lookup). Infrastructure health, not data quality: callers must never
/// record this as a processing verdict.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
