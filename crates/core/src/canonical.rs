//! Normalization mapper: validated fields into the canonical record.
//!
//! Field positions follow the classified type's rule table. Unmapped
//! fields are ignored; optional values that fail to parse stay absent
//! rather than being guessed. Never invoked for rejected messages;
//! that is a caller contract, enforced as a loud precondition error.

use crate::error::{IntakeError, IntakeResult};
use crate::rules::{parse_date, parse_datetime};
use hl7::{MessageType, ParsedMessage, Segment};
use intake_types::{
    Address, CanonicalEncounter, CanonicalObservation, CanonicalRecord, CanonicalReport,
    EncounterClass, ProviderRef, Sex, Verdict,
};

/// Map a validated message into a [`CanonicalRecord`].
///
/// # Errors
///
/// Returns [`IntakeError::Precondition`] when called with a `Rejected`
/// verdict or when the message lacks the PID identifier the validation
/// rules guarantee for accepted messages.
pub fn normalize(
    message: &ParsedMessage,
    message_type: MessageType,
    verdict: Verdict,
) -> IntakeResult<CanonicalRecord> {
    if verdict.is_rejected() {
        return Err(IntakeError::Precondition(
            "normalize called on a rejected message",
        ));
    }

    let pid = message.segment("PID").ok_or(IntakeError::Precondition(
        "normalize called without a PID segment",
    ))?;

    // PID-3 first component is the identifier of record.
    let patient_id = pid
        .component_value(3, 1)
        .ok_or(IntakeError::Precondition(
            "normalize called without a patient identifier",
        ))?
        .to_string();

    let family = pid.component_value(5, 1).map(str::to_string);
    let given = pid
        .component_value(5, 2)
        .map(|g| vec![g.to_string()])
        .unwrap_or_default();

    let birth_date = pid.value(7).and_then(parse_date);
    let sex = pid.value(8).and_then(Sex::from_hl7);
    let address = map_address(pid);

    let encounter = if message_type.is_adt() {
        message.segment("PV1").and_then(map_encounter)
    } else {
        None
    };

    let (report, observations) = if message_type == MessageType::ObservationResult {
        (
            message.segment("OBR").and_then(map_report),
            message.segments_of("OBX").filter_map(map_observation).collect(),
        )
    } else {
        (None, Vec::new())
    };

    Ok(CanonicalRecord {
        patient_id,
        family,
        given,
        birth_date,
        sex,
        address,
        encounter,
        report,
        observations,
    })
}

fn map_address(pid: &Segment) -> Option<Address> {
    let address = Address {
        line: pid.component_value(11, 1).map(str::to_string),
        city: pid.component_value(11, 3).map(str::to_string),
        state: pid.component_value(11, 4).map(str::to_string),
        postal_code: pid.component_value(11, 5).map(str::to_string),
    };
    (!address.is_empty()).then_some(address)
}

fn map_encounter(pv1: &Segment) -> Option<CanonicalEncounter> {
    // No patient class means no encounter; validation has already
    // recorded the assumption warning for that case.
    let class = pv1.value(2).and_then(EncounterClass::from_hl7)?;

    // PV1-3 is a composite location; keep the display form as-is.
    let location = pv1.value(3).map(str::to_string);

    let attending = pv1.component_value(7, 1).map(|id| ProviderRef {
        id: id.to_string(),
        family: pv1.component_value(7, 2).map(str::to_string),
        given: pv1.component_value(7, 3).map(str::to_string),
    });

    Some(CanonicalEncounter {
        class,
        location,
        admit_time: pv1.value(44).and_then(parse_datetime),
        discharge_time: pv1.value(45).and_then(parse_datetime),
        attending,
    })
}

fn map_report(obr: &Segment) -> Option<CanonicalReport> {
    // OBR-4 is the ordered panel; no code means no usable order context.
    let code = obr.component_value(4, 1)?.to_string();
    Some(CanonicalReport {
        code,
        display: obr.component_value(4, 2).map(str::to_string),
        observed_at: obr.value(7).and_then(parse_datetime),
    })
}

fn map_observation(obx: &Segment) -> Option<CanonicalObservation> {
    // Validation has already rejected messages without OBX-3; stray
    // codeless segments are skipped rather than invented.
    let code = obx.component_value(3, 1)?.to_string();
    Some(CanonicalObservation {
        code,
        display: obx.component_value(3, 2).map(str::to_string),
        value: obx.value(5).map(str::to_string),
        unit: obx.component_value(6, 1).map(str::to_string),
        reference_range: obx.value(7).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(raw: &str) -> ParsedMessage {
        ParsedMessage::parse(raw).expect("parse")
    }

    fn admit_message() -> ParsedMessage {
        // PV1-7 attending, then padding out to PV1-44/45 admit/discharge.
        let pv1 = format!(
            "PV1||I|W^389^1||||1234^PROVIDER^TEST{}|202501011200|202501031415",
            "|".repeat(36)
        );
        parse(&format!(
            "MSH|^~\\&|SENDING|FACILITY|RECEIVING|FACILITY|202501011230||ADT^A01|MSG00001|P|2.3\n\
PID|||12345^^^MRN||DOE^JOHN||19800101|M|||123 MAIN ST^^DALLAS^TX^75001\n{pv1}"
        ))
    }

    #[test]
    fn maps_demographics_and_encounter() {
        let msg = admit_message();
        let record = normalize(&msg, MessageType::Admission, Verdict::Accepted).expect("record");

        assert_eq!(record.patient_id, "12345");
        assert_eq!(record.family.as_deref(), Some("DOE"));
        assert_eq!(record.given, vec!["JOHN"]);
        assert_eq!(
            record.birth_date,
            NaiveDate::from_ymd_opt(1980, 1, 1)
        );
        assert_eq!(record.sex, Some(Sex::Male));

        let address = record.address.expect("address");
        assert_eq!(address.line.as_deref(), Some("123 MAIN ST"));
        assert_eq!(address.city.as_deref(), Some("DALLAS"));
        assert_eq!(address.state.as_deref(), Some("TX"));
        assert_eq!(address.postal_code.as_deref(), Some("75001"));

        let encounter = record.encounter.expect("encounter");
        assert_eq!(encounter.class, EncounterClass::Inpatient);
        assert_eq!(encounter.location.as_deref(), Some("W^389^1"));
        let attending = encounter.attending.expect("attending");
        assert_eq!(attending.id, "1234");
        assert_eq!(attending.family.as_deref(), Some("PROVIDER"));
        assert!(encounter.admit_time.is_some());
        assert!(encounter.discharge_time.is_some());
    }

    #[test]
    fn rejected_verdict_is_a_precondition_violation() {
        let msg = admit_message();
        let err = normalize(&msg, MessageType::Admission, Verdict::Rejected)
            .expect_err("must fail fast");
        assert!(matches!(err, IntakeError::Precondition(_)));
    }

    #[test]
    fn absent_optionals_stay_absent() {
        let raw = "MSH|^~\\&|SENDING|FACILITY|||202501011230||ADT^A01|MSG1|P|2.3\n\
PID|||67890||SMITH^JANE\n\
PV1||O";
        let msg = parse(raw);
        let record = normalize(&msg, MessageType::Admission, Verdict::AcceptedWithWarning)
            .expect("record");
        assert_eq!(record.patient_id, "67890");
        assert!(record.birth_date.is_none());
        assert!(record.sex.is_none());
        assert!(record.address.is_none());
        let encounter = record.encounter.expect("encounter");
        assert_eq!(encounter.class, EncounterClass::Outpatient);
        assert!(encounter.admit_time.is_none());
        assert!(encounter.attending.is_none());
    }

    #[test]
    fn missing_pv1_means_no_encounter() {
        let raw = "MSH|^~\\&|SENDING|FACILITY|||202501011230||ADT^A01|MSG1|P|2.3\n\
PID|||12345||DOE^JOHN||19800101|M";
        let msg = parse(raw);
        let record = normalize(&msg, MessageType::Admission, Verdict::AcceptedWithWarning)
            .expect("record");
        assert!(record.encounter.is_none());
    }

    #[test]
    fn unparseable_optional_timestamp_is_left_absent() {
        // Validation would reject a malformed PV1-44; the mapper itself
        // stays lenient and simply leaves the value out.
        let pv1 = format!("PV1||E|ER^1^1{}|garbage", "|".repeat(40));
        let msg = parse(&format!(
            "MSH|^~\\&|SENDING|FACILITY|||202501011230||ADT^A01|MSG1|P|2.3\n\
PID|||12345||DOE^JOHN||19800101|M\n{pv1}"
        ));
        let record =
            normalize(&msg, MessageType::Admission, Verdict::Accepted).expect("record");
        let encounter = record.encounter.expect("encounter");
        assert!(encounter.admit_time.is_none());
    }

    #[test]
    fn oru_messages_map_observations_without_encounter() {
        let raw = "MSH|^~\\&|LAB|FACILITY|||202501011230||ORU^R01|MSG1|P|2.3\n\
PID|||55555||ROE^RICHARD||19751130|M\n\
OBR|1||ORD1|80048^BASIC METABOLIC PANEL|||202501011100\n\
OBX|1|ST|GLU^GLUCOSE||98|mg/dL|70-99|N\n\
OBX|2|ST|NA^SODIUM||140|mmol/L|136-145|N";
        let msg = parse(raw);
        let record = normalize(&msg, MessageType::ObservationResult, Verdict::Accepted)
            .expect("record");
        assert_eq!(record.patient_id, "55555");
        assert!(record.encounter.is_none());

        let report = record.report.expect("report");
        assert_eq!(report.code, "80048");
        assert_eq!(report.display.as_deref(), Some("BASIC METABOLIC PANEL"));
        assert!(report.observed_at.is_some());

        assert_eq!(record.observations.len(), 2);
        let glucose = &record.observations[0];
        assert_eq!(glucose.code, "GLU");
        assert_eq!(glucose.display.as_deref(), Some("GLUCOSE"));
        assert_eq!(glucose.value.as_deref(), Some("98"));
        assert_eq!(glucose.unit.as_deref(), Some("mg/dL"));
        assert_eq!(glucose.reference_range.as_deref(), Some("70-99"));
        assert_eq!(record.observations[1].code, "NA");
    }

    #[test]
    fn adt_messages_carry_no_observations() {
        let msg = admit_message();
        let record = normalize(&msg, MessageType::Admission, Verdict::Accepted).expect("record");
        assert!(record.report.is_none());
        assert!(record.observations.is_empty());
    }
}
