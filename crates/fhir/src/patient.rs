//! Patient resource wire model and projection.

use intake_types::CanonicalRecord;
use serde::{Deserialize, Serialize};

const MRN_SYSTEM: &str = "urn:intake:hospital-mrn";

/// Wire representation of a Patient-like resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PatientResource {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<IdentifierWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanNameWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "birthDate", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<AddressWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdentifierWire {
    pub system: String,
    pub value: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct HumanNameWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AddressWire {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "postalCode", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl PatientResource {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> crate::FhirResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Pure projection of the canonical record into a Patient resource.
pub fn project_patient(record: &CanonicalRecord) -> PatientResource {
    let name = if record.family.is_some() || !record.given.is_empty() {
        vec![HumanNameWire {
            family: record.family.clone(),
            given: record.given.clone(),
        }]
    } else {
        vec![]
    };

    let address = record
        .address
        .as_ref()
        .map(|a| AddressWire {
            line: a.line.clone().into_iter().collect(),
            city: a.city.clone(),
            state: a.state.clone(),
            postal_code: a.postal_code.clone(),
        })
        .into_iter()
        .collect();

    PatientResource {
        resource_type: "Patient".to_string(),
        id: record.patient_id.clone(),
        identifier: vec![IdentifierWire {
            system: MRN_SYSTEM.to_string(),
            value: record.patient_id.clone(),
        }],
        name,
        gender: record.sex.map(|s| s.as_fhir().to_string()),
        birth_date: record.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
        address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use intake_types::{Address, Sex};

    fn record() -> CanonicalRecord {
        CanonicalRecord {
            patient_id: "12345".into(),
            family: Some("DOE".into()),
            given: vec!["JOHN".into()],
            birth_date: NaiveDate::from_ymd_opt(1980, 1, 1),
            sex: Some(Sex::Male),
            address: Some(Address {
                line: Some("123 MAIN ST".into()),
                city: Some("DALLAS".into()),
                state: Some("TX".into()),
                postal_code: Some("75001".into()),
            }),
            encounter: None,
            report: None,
            observations: vec![],
        }
    }

    #[test]
    fn projects_all_present_fields() {
        let patient = project_patient(&record());
        assert_eq!(patient.resource_type, "Patient");
        assert_eq!(patient.id, "12345");
        assert_eq!(patient.identifier[0].value, "12345");
        assert_eq!(patient.name[0].family.as_deref(), Some("DOE"));
        assert_eq!(patient.name[0].given, vec!["JOHN"]);
        assert_eq!(patient.gender.as_deref(), Some("male"));
        assert_eq!(patient.birth_date.as_deref(), Some("1980-01-01"));
        assert_eq!(patient.address[0].city.as_deref(), Some("DALLAS"));
    }

    #[test]
    fn absent_fields_are_skipped_on_the_wire() {
        let mut minimal = record();
        minimal.family = None;
        minimal.given = vec![];
        minimal.birth_date = None;
        minimal.sex = None;
        minimal.address = None;

        let patient = project_patient(&minimal);
        let json = patient.to_json().expect("json");
        assert!(!json.contains("gender"));
        assert!(!json.contains("birthDate"));
        assert!(!json.contains("\"name\""));
        assert!(!json.contains("\"address\""));
    }

    #[test]
    fn wire_json_round_trips() {
        let patient = project_patient(&record());
        let json = patient.to_json().expect("json");
        let reparsed: PatientResource = serde_json::from_str(&json).expect("reparse");
        assert_eq!(patient, reparsed);
    }
}
