//! Per-message-type validation rule tables.
//!
//! Rules are data, not branching logic: each [`FieldRule`] names a field,
//! whether it is required, the expected value format, and, when absence
//! is tolerable, the documented assumption that stands in for the value.
//! New message types are added by adding a table, not a code path.

use chrono::{NaiveDate, NaiveDateTime};
use hl7::MessageType;
use intake_types::{EncounterClass, FieldRef, Sex};
use std::fmt;

/// Expected format of a field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueFormat {
    /// Any non-empty text.
    Any,
    /// HL7 date, `YYYYMMDD`.
    Date,
    /// HL7 timestamp, `YYYYMMDDHHMM` with optional seconds.
    DateTime,
    /// Administrative sex code from table 0001 (M/F/O/U).
    Sex,
    /// Patient class code (I/O/E).
    PatientClass,
}

impl ValueFormat {
    /// Whether a present value conforms to this format.
    pub fn check(self, raw: &str) -> bool {
        match self {
            ValueFormat::Any => true,
            ValueFormat::Date => parse_date(raw).is_some(),
            ValueFormat::DateTime => parse_datetime(raw).is_some(),
            ValueFormat::Sex => Sex::from_hl7(raw).is_some(),
            ValueFormat::PatientClass => EncounterClass::from_hl7(raw).is_some(),
        }
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueFormat::Any => "text",
            ValueFormat::Date => "YYYYMMDD",
            ValueFormat::DateTime => "YYYYMMDDHHMM[SS]",
            ValueFormat::Sex => "sex code (M/F/O/U)",
            ValueFormat::PatientClass => "patient class (I/O/E)",
        };
        f.write_str(s)
    }
}

/// Parse an HL7 `YYYYMMDD` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
}

/// Parse an HL7 `YYYYMMDDHHMM` or `YYYYMMDDHHMMSS` timestamp.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match raw.len() {
        12 => NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M").ok(),
        14 => NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S").ok(),
        _ => None,
    }
}

/// One row of a rule table.
#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    /// Segment type code the field lives in.
    pub segment: &'static str,
    /// 1-based field index.
    pub field: u16,
    /// Analyst-facing field label used in finding descriptions.
    pub label: &'static str,
    pub required: bool,
    pub format: ValueFormat,
    /// Documented fallback applied when the value is absent. Presence of
    /// an assumption downgrades absence from reject to warning; it never
    /// excuses a malformed present value.
    pub assumption: Option<&'static str>,
}

impl FieldRule {
    pub fn field_ref(&self) -> FieldRef {
        FieldRef::new(self.segment, self.field)
    }
}

const ADT_RULES: &[FieldRule] = &[
    FieldRule {
        segment: "PID",
        field: 3,
        label: "Patient Identifier",
        required: true,
        format: ValueFormat::Any,
        assumption: None,
    },
    FieldRule {
        segment: "PID",
        field: 7,
        label: "Date of Birth",
        required: false,
        format: ValueFormat::Date,
        assumption: None,
    },
    FieldRule {
        segment: "PID",
        field: 8,
        label: "Administrative Sex",
        required: false,
        format: ValueFormat::Sex,
        assumption: Some("treat missing sex as unknown"),
    },
    FieldRule {
        segment: "MSH",
        field: 7,
        label: "Message Date/Time",
        required: false,
        format: ValueFormat::DateTime,
        assumption: None,
    },
    FieldRule {
        segment: "PV1",
        field: 2,
        label: "Patient Class",
        required: true,
        format: ValueFormat::PatientClass,
        assumption: Some("encounter will not be generated"),
    },
    FieldRule {
        segment: "PV1",
        field: 44,
        label: "Admit Date/Time",
        required: false,
        format: ValueFormat::DateTime,
        assumption: None,
    },
    FieldRule {
        segment: "PV1",
        field: 45,
        label: "Discharge Date/Time",
        required: false,
        format: ValueFormat::DateTime,
        assumption: None,
    },
];

const ORU_RULES: &[FieldRule] = &[
    FieldRule {
        segment: "PID",
        field: 3,
        label: "Patient Identifier",
        required: true,
        format: ValueFormat::Any,
        assumption: None,
    },
    FieldRule {
        segment: "PID",
        field: 7,
        label: "Date of Birth",
        required: false,
        format: ValueFormat::Date,
        assumption: None,
    },
    FieldRule {
        segment: "PID",
        field: 8,
        label: "Administrative Sex",
        required: false,
        format: ValueFormat::Sex,
        assumption: Some("treat missing sex as unknown"),
    },
    FieldRule {
        segment: "OBX",
        field: 3,
        label: "Observation Identifier",
        required: true,
        format: ValueFormat::Any,
        assumption: None,
    },
    FieldRule {
        segment: "OBR",
        field: 7,
        label: "Observation Date/Time",
        required: false,
        format: ValueFormat::DateTime,
        assumption: None,
    },
];

/// Rule table for a message type. `Unknown` has no table; the validation
/// engine rejects it outright with an unsupported-type finding.
pub fn rules_for(message_type: MessageType) -> &'static [FieldRule] {
    match message_type {
        MessageType::Admission
        | MessageType::Transfer
        | MessageType::Discharge
        | MessageType::Registration
        | MessageType::Update => ADT_RULES,
        MessageType::ObservationResult => ORU_RULES,
        MessageType::Unknown => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_format_accepts_only_yyyymmdd() {
        assert!(parse_date("19800101").is_some());
        assert!(parse_date("1980-01-01").is_none());
        assert!(parse_date("19801301").is_none());
        assert!(parse_date("1980010").is_none());
        assert!(ValueFormat::Date.check("19800101"));
        assert!(!ValueFormat::Date.check("notadate"));
    }

    #[test]
    fn datetime_format_accepts_minute_and_second_precision() {
        assert!(parse_datetime("202501011230").is_some());
        assert!(parse_datetime("20250101123045").is_some());
        assert!(parse_datetime("20250101").is_none());
        assert!(parse_datetime("2025010112304").is_none());
    }

    #[test]
    fn coded_formats_reject_unknown_codes() {
        assert!(ValueFormat::Sex.check("M"));
        assert!(!ValueFormat::Sex.check("male"));
        assert!(ValueFormat::PatientClass.check("I"));
        assert!(!ValueFormat::PatientClass.check("X"));
    }

    #[test]
    fn adt_tables_require_patient_identifier_without_assumption() {
        let rule = rules_for(MessageType::Admission)
            .iter()
            .find(|r| r.segment == "PID" && r.field == 3)
            .expect("PID-3 rule");
        assert!(rule.required);
        assert!(rule.assumption.is_none());
        assert_eq!(rule.field_ref().to_string(), "PID-3");
    }

    #[test]
    fn unknown_type_has_no_rule_table() {
        assert!(rules_for(MessageType::Unknown).is_empty());
        assert!(!rules_for(MessageType::Discharge).is_empty());
    }
}
