//! Encounter resource wire model and projection.

use intake_types::CanonicalRecord;
use serde::{Deserialize, Serialize};

const ACT_CODE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";

/// Wire representation of an Encounter-like resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct EncounterResource {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub status: String,

    pub class: CodingWire,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<ReferenceWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<LocationWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant: Vec<ParticipantWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CodingWire {
    pub system: String,
    pub code: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReferenceWire {
    pub reference: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PeriodWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct LocationWire {
    pub location: DisplayWire,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DisplayWire {
    pub display: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ParticipantWire {
    pub individual: DisplayWire,
}

impl EncounterResource {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> crate::FhirResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Pure projection of the canonical record into an Encounter resource.
///
/// Returns `None` when the record carries no encounter data (the
/// validation stage has already warned about the omission).
pub fn project_encounter(record: &CanonicalRecord) -> Option<EncounterResource> {
    let encounter = record.encounter.as_ref()?;

    // A discharge timestamp closes the encounter.
    let status = if encounter.discharge_time.is_some() {
        "finished"
    } else {
        "in-progress"
    };

    let period = if encounter.admit_time.is_some() || encounter.discharge_time.is_some() {
        Some(PeriodWire {
            start: encounter
                .admit_time
                .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
            end: encounter
                .discharge_time
                .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
        })
    } else {
        None
    };

    let participant = encounter
        .attending
        .as_ref()
        .map(|p| {
            let display = match (&p.family, &p.given) {
                (Some(family), Some(given)) => format!("{given} {family} ({})", p.id),
                (Some(family), None) => format!("{family} ({})", p.id),
                _ => p.id.clone(),
            };
            ParticipantWire {
                individual: DisplayWire { display },
            }
        })
        .into_iter()
        .collect();

    Some(EncounterResource {
        resource_type: "Encounter".to_string(),
        status: status.to_string(),
        class: CodingWire {
            system: ACT_CODE_SYSTEM.to_string(),
            code: encounter.class.act_code().to_string(),
        },
        subject: Some(ReferenceWire {
            reference: format!("Patient/{}", record.patient_id),
        }),
        period,
        location: encounter
            .location
            .as_ref()
            .map(|display| LocationWire {
                location: DisplayWire {
                    display: display.clone(),
                },
            })
            .into_iter()
            .collect(),
        participant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use intake_types::{CanonicalEncounter, EncounterClass, ProviderRef};

    fn record(encounter: Option<CanonicalEncounter>) -> CanonicalRecord {
        CanonicalRecord {
            patient_id: "12345".into(),
            family: Some("DOE".into()),
            given: vec!["JOHN".into()],
            birth_date: None,
            sex: None,
            address: None,
            encounter,
            report: None,
            observations: vec![],
        }
    }

    fn inpatient() -> CanonicalEncounter {
        CanonicalEncounter {
            class: EncounterClass::Inpatient,
            location: Some("W^389^1".into()),
            admit_time: NaiveDate::from_ymd_opt(2025, 1, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0)),
            discharge_time: None,
            attending: Some(ProviderRef {
                id: "1234".into(),
                family: Some("PROVIDER".into()),
                given: Some("TEST".into()),
            }),
        }
    }

    #[test]
    fn projects_inpatient_encounter() {
        let encounter = project_encounter(&record(Some(inpatient()))).expect("encounter");
        assert_eq!(encounter.resource_type, "Encounter");
        assert_eq!(encounter.status, "in-progress");
        assert_eq!(encounter.class.code, "IMP");
        assert_eq!(
            encounter.subject.as_ref().expect("subject").reference,
            "Patient/12345"
        );
        let period = encounter.period.expect("period");
        assert_eq!(period.start.as_deref(), Some("2025-01-01T12:00:00"));
        assert!(period.end.is_none());
        assert_eq!(encounter.location[0].location.display, "W^389^1");
        assert_eq!(
            encounter.participant[0].individual.display,
            "TEST PROVIDER (1234)"
        );
    }

    #[test]
    fn discharge_closes_the_encounter() {
        let mut enc = inpatient();
        enc.discharge_time = NaiveDate::from_ymd_opt(2025, 1, 3)
            .and_then(|d| d.and_hms_opt(14, 15, 0));
        let encounter = project_encounter(&record(Some(enc))).expect("encounter");
        assert_eq!(encounter.status, "finished");
        assert_eq!(
            encounter.period.expect("period").end.as_deref(),
            Some("2025-01-03T14:15:00")
        );
    }

    #[test]
    fn no_encounter_data_means_no_resource() {
        assert!(project_encounter(&record(None)).is_none());
    }

    #[test]
    fn absent_period_and_location_are_skipped() {
        let enc = CanonicalEncounter {
            class: EncounterClass::Emergency,
            location: None,
            admit_time: None,
            discharge_time: None,
            attending: None,
        };
        let encounter = project_encounter(&record(Some(enc))).expect("encounter");
        assert_eq!(encounter.class.code, "EMER");
        assert!(encounter.period.is_none());
        let json = encounter.to_json().expect("json");
        assert!(!json.contains("period"));
        assert!(!json.contains("location"));
        assert!(!json.contains("participant"));
    }
}
