//! Observation and DiagnosticReport wire models and projections for
//! observation-result records.

use crate::encounter::ReferenceWire;
use intake_types::CanonicalRecord;
use serde::{Deserialize, Serialize};

const LOINC_SYSTEM: &str = "http://loinc.org";

/// Wire representation of an Observation-like resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ObservationResource {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub id: String,

    pub status: String,

    pub code: CodeableConceptWire,

    #[serde(rename = "valueString", skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<ReferenceWire>,

    #[serde(
        rename = "effectiveDateTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub effective_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<NoteWire>,
}

/// Wire representation of a DiagnosticReport-like resource grouping the
/// observations of one order.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DiagnosticReportResource {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub status: String,

    pub code: CodeableConceptWire,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<ReferenceWire>,

    #[serde(
        rename = "effectiveDateTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub effective_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<ReferenceWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CodeableConceptWire {
    pub coding: Vec<ConceptCodingWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConceptCodingWire {
    pub system: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct NoteWire {
    pub text: String,
}

impl ObservationResource {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> crate::FhirResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl DiagnosticReportResource {
    pub fn to_json(&self) -> crate::FhirResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn loinc_concept(code: &str, display: Option<&str>) -> CodeableConceptWire {
    CodeableConceptWire {
        coding: vec![ConceptCodingWire {
            system: LOINC_SYSTEM.to_string(),
            code: code.to_string(),
            display: display.map(str::to_string),
        }],
    }
}

/// Project the record's observations into Observation resources, in
/// record order. Ids are `obx-1`, `obx-2`, ... so the report's result
/// references stay stable.
pub fn project_observations(record: &CanonicalRecord) -> Vec<ObservationResource> {
    let effective = record
        .report
        .as_ref()
        .and_then(|r| r.observed_at)
        .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string());

    record
        .observations
        .iter()
        .enumerate()
        .map(|(index, obs)| {
            let note = match (&obs.unit, &obs.reference_range) {
                (None, None) => vec![],
                (unit, range) => vec![NoteWire {
                    text: format!(
                        "Unit: {}  RefRange: {}",
                        unit.as_deref().unwrap_or_default(),
                        range.as_deref().unwrap_or_default()
                    ),
                }],
            };
            ObservationResource {
                resource_type: "Observation".to_string(),
                id: format!("obx-{}", index + 1),
                status: "final".to_string(),
                code: loinc_concept(&obs.code, obs.display.as_deref()),
                value_string: obs.value.clone(),
                subject: Some(ReferenceWire {
                    reference: format!("Patient/{}", record.patient_id),
                }),
                effective_date_time: effective.clone(),
                note,
            }
        })
        .collect()
}

/// Project the record's order context into a DiagnosticReport resource
/// referencing the projected observations.
///
/// Returns `None` when the record carries no report (ADT messages).
pub fn project_diagnostic_report(record: &CanonicalRecord) -> Option<DiagnosticReportResource> {
    let report = record.report.as_ref()?;

    Some(DiagnosticReportResource {
        resource_type: "DiagnosticReport".to_string(),
        status: "final".to_string(),
        code: loinc_concept(&report.code, report.display.as_deref()),
        subject: Some(ReferenceWire {
            reference: format!("Patient/{}", record.patient_id),
        }),
        effective_date_time: report
            .observed_at
            .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
        result: (1..=record.observations.len())
            .map(|i| ReferenceWire {
                reference: format!("Observation/obx-{i}"),
            })
            .collect(),
    })
}
