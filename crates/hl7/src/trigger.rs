//! Message classification from the MSH header.
//!
//! The trigger is read once from MSH-9 (`ADT^A01` form) and is immutable
//! thereafter. Unknown or unsupported combinations classify as
//! [`MessageType::Unknown`]; classification itself never fails.

use crate::ParsedMessage;
use serde::{Deserialize, Serialize};

/// Semantic category of a message, derived from its MSH-9 trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// ADT^A01: inpatient/ER admit.
    Admission,
    /// ADT^A02: bed/unit change.
    Transfer,
    /// ADT^A03: discharge.
    Discharge,
    /// ADT^A04: outpatient/ER registration.
    Registration,
    /// ADT^A08: patient information update.
    Update,
    /// ORU^R01: observation report (lab result).
    ObservationResult,
    /// Anything else, including a missing MSH-9.
    Unknown,
}

/// Classify a parsed message by its MSH-9 value.
///
/// Components are read through the parsed segment so the message's
/// declared component separator applies, not the default one.
pub fn classify(message: &ParsedMessage) -> MessageType {
    let header = message.header();
    let msg = header.component_value(9, 1).unwrap_or("");
    let evt = header.component_value(9, 2).unwrap_or("");
    MessageType::from_parts(msg, evt)
}

impl MessageType {
    /// Parse an MSH-9 value in default-delimiter form, such as `ADT^A01`.
    pub fn from_code(code: &str) -> Self {
        let mut parts = code.split('^');
        let msg = parts.next().unwrap_or("");
        let evt = parts.next().unwrap_or("");
        Self::from_parts(msg, evt)
    }

    fn from_parts(msg: &str, evt: &str) -> Self {
        match (msg, evt) {
            ("ADT", "A01") => MessageType::Admission,
            ("ADT", "A02") => MessageType::Transfer,
            ("ADT", "A03") => MessageType::Discharge,
            ("ADT", "A04") => MessageType::Registration,
            ("ADT", "A08") => MessageType::Update,
            ("ORU", "R01") => MessageType::ObservationResult,
            _ => MessageType::Unknown,
        }
    }

    /// Wire form of the trigger (`ADT^A01`), when known.
    pub fn code(self) -> Option<&'static str> {
        match self {
            MessageType::Admission => Some("ADT^A01"),
            MessageType::Transfer => Some("ADT^A02"),
            MessageType::Discharge => Some("ADT^A03"),
            MessageType::Registration => Some("ADT^A04"),
            MessageType::Update => Some("ADT^A08"),
            MessageType::ObservationResult => Some("ORU^R01"),
            MessageType::Unknown => None,
        }
    }

    /// Human label for the trigger event.
    pub fn label(self) -> &'static str {
        match self {
            MessageType::Admission => "Admission (Inpatient/ER -> Admit)",
            MessageType::Transfer => "Transfer (Bed/Unit Change)",
            MessageType::Discharge => "Discharge",
            MessageType::Registration => "Registration (Outpatient/ER)",
            MessageType::Update => "Update Patient Info",
            MessageType::ObservationResult => "Lab Result (Observation Report)",
            MessageType::Unknown => "Unknown",
        }
    }

    /// Why this trigger matters downstream.
    pub fn business_reason(self) -> &'static str {
        match self {
            MessageType::Admission => "Start inpatient workflow: care coordination + billing",
            MessageType::Discharge => {
                "Close encounter: discharge workflow + billing finalization"
            }
            MessageType::Update => "Update demographics/visit data; downstream reconciliation",
            MessageType::ObservationResult => {
                "Publish lab results: clinical review + charge capture"
            }
            MessageType::Transfer | MessageType::Registration | MessageType::Unknown => "",
        }
    }

    /// Analyst-facing profile string, e.g. `HL7 v2 ADT (Admission ...)`.
    pub fn profile(self) -> String {
        match self.code() {
            Some(code) => {
                let standard = code.split('^').next().unwrap_or("");
                format!("HL7 v2 {standard} ({})", self.label())
            }
            None => "HL7 v2 (Unknown)".to_string(),
        }
    }

    pub fn is_adt(self) -> bool {
        matches!(
            self,
            MessageType::Admission
                | MessageType::Transfer
                | MessageType::Discharge
                | MessageType::Registration
                | MessageType::Update
        )
    }
}
