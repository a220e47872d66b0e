//! Validation & assumption engine.
//!
//! Walks the rule table for the classified message type and accumulates
//! findings; nothing here aborts processing. The verdict is a pure
//! function of the finding set.
//!
//! Policy, fixed across all tables:
//! - required + absent + no assumption -> reject
//! - absent + documented assumption -> warning, assumption recorded
//! - present but malformed -> reject, regardless of requiredness or any
//!   assumption (malformed never falls back to the assumption path)

use crate::rules::{rules_for, FieldRule};
use hl7::{MessageType, ParsedMessage};
use intake_types::{FieldRef, Finding, Verdict};
use serde::Serialize;

/// Outcome of validating one message: the accumulated findings and the
/// verdict derived from them.
#[derive(Clone, Debug, Serialize)]
pub struct Validation {
    pub findings: Vec<Finding>,
    pub verdict: Verdict,
}

/// Validate a parsed message against its type's rule table.
///
/// `Unknown` types yield a single reject finding naming MSH-9; an
/// unsupported trigger is a rejected message, never a hard failure.
pub fn validate(message: &ParsedMessage, message_type: MessageType) -> Validation {
    if message_type == MessageType::Unknown {
        let raw = message.header().value(9).unwrap_or("(missing)");
        let findings = vec![Finding::reject(
            FieldRef::new("MSH", 9),
            format!("unsupported message type: {raw}"),
        )];
        return Validation {
            verdict: Verdict::from_findings(&findings),
            findings,
        };
    }

    let mut findings = Vec::new();
    for rule in rules_for(message_type) {
        check_rule(message, rule, &mut findings);
    }

    Validation {
        verdict: Verdict::from_findings(&findings),
        findings,
    }
}

fn check_rule(message: &ParsedMessage, rule: &FieldRule, findings: &mut Vec<Finding>) {
    // First occurrence of the segment carries the fields of record.
    let value = message
        .segment(rule.segment)
        .and_then(|seg| seg.value(rule.field));

    match value {
        None => {
            if let Some(assumption) = rule.assumption {
                findings.push(Finding::assumption(
                    rule.field_ref(),
                    format!("{} absent; assumption applied: {assumption}", rule.label),
                ));
            } else if rule.required {
                findings.push(Finding::reject(
                    rule.field_ref(),
                    format!("missing {}", rule.label),
                ));
            }
        }
        Some(raw) => {
            if !rule.format.check(raw) {
                findings.push(Finding::reject(
                    rule.field_ref(),
                    format!("malformed {}: expected {}", rule.label, rule.format),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_types::Severity;

    fn parse(raw: &str) -> ParsedMessage {
        ParsedMessage::parse(raw).expect("parse")
    }

    const ADMIT: &str = "MSH|^~\\&|SENDING|FACILITY|RECEIVING|FACILITY|202501011230||ADT^A01|MSG00001|P|2.3\n\
PID|||12345^^^MRN||DOE^JOHN||19800101|M\n\
PV1||I|W^389^1||||1234^PROVIDER^TEST";

    #[test]
    fn well_formed_admission_is_accepted() {
        let msg = parse(ADMIT);
        let v = validate(&msg, MessageType::Admission);
        assert_eq!(v.verdict, Verdict::Accepted);
        assert!(v.findings.is_empty());
    }

    #[test]
    fn present_well_formed_required_field_draws_no_reject() {
        let msg = parse(ADMIT);
        let v = validate(&msg, MessageType::Admission);
        let pid3 = FieldRef::new("PID", 3);
        assert!(!v
            .findings
            .iter()
            .any(|f| f.field == pid3 && f.severity == Severity::Reject));
    }

    #[test]
    fn missing_required_identifier_rejects_with_one_finding() {
        let raw = "MSH|^~\\&|SENDING|FACILITY|||202501011230||ADT^A01|MSG1|P|2.3\n\
PID|||||DOE^JOHN||19800101|M\n\
PV1||I|W^389^1";
        let msg = parse(raw);
        let v = validate(&msg, MessageType::Admission);
        assert_eq!(v.verdict, Verdict::Rejected);
        let rejects: Vec<_> = v
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Reject)
            .collect();
        assert_eq!(rejects.len(), 1);
        assert_eq!(rejects[0].field, FieldRef::new("PID", 3));
    }

    #[test]
    fn missing_sex_applies_documented_assumption() {
        let raw = "MSH|^~\\&|SENDING|FACILITY|||202501011230||ADT^A01|MSG1|P|2.3\n\
PID|||12345^^^MRN||DOE^JOHN||19800101\n\
PV1||I|W^389^1";
        let msg = parse(raw);
        let v = validate(&msg, MessageType::Admission);
        assert_eq!(v.verdict, Verdict::AcceptedWithWarning);
        assert_eq!(v.findings.len(), 1);
        let f = &v.findings[0];
        assert_eq!(f.field, FieldRef::new("PID", 8));
        assert_eq!(f.severity, Severity::Warning);
        assert!(f.assumption_applied);
        assert!(f.description.contains("unknown"));
    }

    #[test]
    fn malformed_value_rejects_even_when_assumption_exists() {
        // PID-8 has an absence assumption; a malformed present value must
        // still reject.
        let raw = "MSH|^~\\&|SENDING|FACILITY|||202501011230||ADT^A01|MSG1|P|2.3\n\
PID|||12345^^^MRN||DOE^JOHN||19800101|BAD\n\
PV1||I|W";
        let msg = parse(raw);
        let v = validate(&msg, MessageType::Admission);
        assert_eq!(v.verdict, Verdict::Rejected);
        assert!(v
            .findings
            .iter()
            .any(|f| f.field == FieldRef::new("PID", 8)
                && f.severity == Severity::Reject
                && !f.assumption_applied));
    }

    #[test]
    fn malformed_optional_birth_date_rejects() {
        let raw = "MSH|^~\\&|SENDING|FACILITY|||202501011230||ADT^A01|MSG1|P|2.3\n\
PID|||12345^^^MRN||DOE^JOHN||1980-01-01|M\n\
PV1||I|W";
        let msg = parse(raw);
        let v = validate(&msg, MessageType::Admission);
        assert_eq!(v.verdict, Verdict::Rejected);
        assert!(v
            .findings
            .iter()
            .any(|f| f.field == FieldRef::new("PID", 7) && f.severity == Severity::Reject));
    }

    #[test]
    fn missing_pv1_warns_that_encounter_is_omitted() {
        let raw = "MSH|^~\\&|SENDING|FACILITY|||202501011230||ADT^A01|MSG1|P|2.3\n\
PID|||12345^^^MRN||DOE^JOHN||19800101|M";
        let msg = parse(raw);
        let v = validate(&msg, MessageType::Admission);
        assert_eq!(v.verdict, Verdict::AcceptedWithWarning);
        let f = v
            .findings
            .iter()
            .find(|f| f.field == FieldRef::new("PV1", 2))
            .expect("PV1-2 finding");
        assert_eq!(f.severity, Severity::Warning);
        assert!(f.assumption_applied);
    }

    #[test]
    fn unknown_type_rejects_with_unsupported_finding() {
        let raw = "MSH|^~\\&|SENDING|FACILITY|||202501011230||SIU^S12|MSG1|P|2.3\nPID|||12345";
        let msg = parse(raw);
        let v = validate(&msg, MessageType::Unknown);
        assert_eq!(v.verdict, Verdict::Rejected);
        assert_eq!(v.findings.len(), 1);
        assert_eq!(v.findings[0].field, FieldRef::new("MSH", 9));
        assert!(v.findings[0].description.contains("SIU^S12"));
    }

    #[test]
    fn oru_requires_an_observation_segment() {
        let raw = "MSH|^~\\&|LAB|FACILITY|||202501011230||ORU^R01|MSG1|P|2.3\n\
PID|||12345^^^MRN||DOE^JOHN||19800101|M";
        let msg = parse(raw);
        let v = validate(&msg, MessageType::ObservationResult);
        assert_eq!(v.verdict, Verdict::Rejected);
        assert!(v
            .findings
            .iter()
            .any(|f| f.field == FieldRef::new("OBX", 3) && f.severity == Severity::Reject));
    }
}
