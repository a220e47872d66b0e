//! 837-style claim building.

use crate::format_cents;
use chrono::NaiveDate;
use intake_types::{Address, CanonicalRecord};
use serde::Serialize;

/// Billing context supplied by the caller. Defaults mirror the demo
/// clinic used throughout the billing examples.
#[derive(Clone, Debug)]
pub struct ClaimContext {
    pub billing_provider_name: String,
    pub billing_provider_npi: String,
    pub billing_provider_address: Address,
    /// Service lines for the claim; when empty, a single default
    /// office-visit line is used.
    pub service_lines: Vec<ServiceLine>,
}

impl Default for ClaimContext {
    fn default() -> Self {
        Self {
            billing_provider_name: "GOOD HEALTH CLINIC".to_string(),
            billing_provider_npi: "1234567893".to_string(),
            billing_provider_address: Address {
                line: Some("123 MAIN ST".to_string()),
                city: Some("DALLAS".to_string()),
                state: Some("TX".to_string()),
                postal_code: Some("75001".to_string()),
            },
            service_lines: Vec::new(),
        }
    }
}

/// One claim service line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceLine {
    /// Composite procedure code, e.g. `HC:99213`.
    pub procedure: String,
    pub charge_cents: i64,
    pub units: u32,
}

impl ServiceLine {
    /// Default office-visit line (CPT 99213, 150.00).
    pub fn office_visit() -> Self {
        Self {
            procedure: "HC:99213".to_string(),
            charge_cents: 15_000,
            units: 1,
        }
    }
}

/// Subscriber/patient block of a claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Subscriber {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// A simplified professional claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Claim {
    pub claim_id: String,
    pub subscriber: Subscriber,
    pub provider_name: String,
    pub provider_npi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_date: Option<NaiveDate>,
    pub lines: Vec<ServiceLine>,
    pub total_cents: i64,
}

/// Build a claim from the canonical record.
///
/// The claim id is the patient identifier; real systems would mint a
/// separate claim control number.
pub fn build_claim(record: &CanonicalRecord, context: &ClaimContext) -> Claim {
    let lines = if context.service_lines.is_empty() {
        vec![ServiceLine::office_visit()]
    } else {
        context.service_lines.clone()
    };
    let total_cents = lines.iter().map(|l| l.charge_cents).sum();

    let service_date = record
        .encounter
        .as_ref()
        .and_then(|e| e.admit_time)
        .map(|t| t.date());

    Claim {
        claim_id: record.patient_id.clone(),
        subscriber: Subscriber {
            identifier: record.patient_id.clone(),
            family: record.family.clone(),
            given: record.given.first().cloned(),
            address: record.address.clone(),
        },
        provider_name: context.billing_provider_name.clone(),
        provider_npi: context.billing_provider_npi.clone(),
        provider_address: (!context.billing_provider_address.is_empty())
            .then(|| context.billing_provider_address.clone()),
        service_date,
        lines,
        total_cents,
    }
}

/// Render the claim as simplified 837P segment text.
pub fn render_x12(claim: &Claim) -> String {
    let mut segments: Vec<String> = Vec::new();

    segments.push(
        "ISA*00*          *00*          *ZZ*SENDERID      *ZZ*RECEIVERID    \
*250101*1200*^*00501*000000001*0*T*:~"
            .to_string(),
    );
    segments.push("GS*HC*SENDERID*RECEIVERID*20250101*1200*1*X*005010X222A1~".to_string());
    segments.push("ST*837*0001*005010X222A1~".to_string());
    segments.push("BHT*0019*00*0123*20250102*1200*CH~".to_string());

    // Billing provider loop.
    segments.push(format!(
        "NM1*85*2*{}*****XX*{}~",
        claim.provider_name, claim.provider_npi
    ));
    if let Some(address) = &claim.provider_address {
        if let Some(line) = &address.line {
            segments.push(format!("N3*{line}~"));
        }
        segments.push(format!(
            "N4*{}*{}*{}~",
            address.city.as_deref().unwrap_or_default(),
            address.state.as_deref().unwrap_or_default(),
            address.postal_code.as_deref().unwrap_or_default()
        ));
    }

    segments.push("HL*1**20*1~".to_string());
    segments.push("HL*2*1*22*0~".to_string());
    segments.push("SBR*P*18*******MC~".to_string());

    let family = claim.subscriber.family.as_deref().unwrap_or_default();
    let given = claim.subscriber.given.as_deref().unwrap_or_default();
    segments.push(format!(
        "NM1*IL*1*{family}*{given}****MI*{}~",
        claim.subscriber.identifier
    ));
    if let Some(address) = &claim.subscriber.address {
        if let Some(line) = &address.line {
            segments.push(format!("N3*{line}~"));
        }
        segments.push(format!(
            "N4*{}*{}*{}~",
            address.city.as_deref().unwrap_or_default(),
            address.state.as_deref().unwrap_or_default(),
            address.postal_code.as_deref().unwrap_or_default()
        ));
    }

    segments.push(format!(
        "CLM*{}*{}***11:B:1*Y*A*Y*Y~",
        claim.claim_id,
        format_cents(claim.total_cents)
    ));

    for (index, line) in claim.lines.iter().enumerate() {
        segments.push(format!("LX*{}~", index + 1));
        segments.push(format!(
            "SV1*{}*{}*UN*{}***1~",
            line.procedure,
            format_cents(line.charge_cents),
            line.units
        ));
    }

    segments.push(format!("SE*{}*0001~", segments.len() - 1));
    segments.push("GE*1*1~".to_string());
    segments.push("IEA*1*000000001~".to_string());

    segments.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_types::{CanonicalEncounter, EncounterClass};

    fn record() -> CanonicalRecord {
        CanonicalRecord {
            patient_id: "12345".into(),
            family: Some("DOE".into()),
            given: vec!["JOHN".into()],
            birth_date: None,
            sex: None,
            address: Some(Address {
                line: Some("123 MAIN ST".into()),
                city: Some("DALLAS".into()),
                state: Some("TX".into()),
                postal_code: Some("75001".into()),
            }),
            encounter: Some(CanonicalEncounter {
                class: EncounterClass::Inpatient,
                location: None,
                admit_time: NaiveDate::from_ymd_opt(2025, 1, 1)
                    .and_then(|d| d.and_hms_opt(12, 0, 0)),
                discharge_time: None,
                attending: None,
            }),
            report: None,
            observations: vec![],
        }
    }

    #[test]
    fn builds_claim_with_default_office_visit_line() {
        let claim = build_claim(&record(), &ClaimContext::default());
        assert_eq!(claim.claim_id, "12345");
        assert_eq!(claim.total_cents, 15_000);
        assert_eq!(claim.lines.len(), 1);
        assert_eq!(claim.lines[0].procedure, "HC:99213");
        assert_eq!(
            claim.service_date,
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(claim.subscriber.family.as_deref(), Some("DOE"));
    }

    #[test]
    fn caller_supplied_lines_set_the_total() {
        let context = ClaimContext {
            service_lines: vec![
                ServiceLine {
                    procedure: "HC:99213".into(),
                    charge_cents: 15_000,
                    units: 1,
                },
                ServiceLine {
                    procedure: "HC:85025".into(),
                    charge_cents: 4_250,
                    units: 1,
                },
            ],
            ..ClaimContext::default()
        };
        let claim = build_claim(&record(), &context);
        assert_eq!(claim.total_cents, 19_250);
        assert_eq!(claim.lines.len(), 2);
    }

    #[test]
    fn renders_core_837_segments() {
        let claim = build_claim(&record(), &ClaimContext::default());
        let x12 = render_x12(&claim);
        assert!(x12.contains("ST*837*0001"));
        assert!(x12.contains("NM1*85*2*GOOD HEALTH CLINIC*****XX*1234567893~"));
        assert!(x12.contains("NM1*IL*1*DOE*JOHN****MI*12345~"));
        assert!(x12.contains("N3*123 MAIN ST~"));
        assert!(x12.contains("N4*DALLAS*TX*75001~"));
        assert!(x12.contains("CLM*12345*150.00***11:B:1*Y*A*Y*Y~"));
        assert!(x12.contains("SV1*HC:99213*150.00*UN*1***1~"));
        assert!(x12.ends_with("IEA*1*000000001~"));
    }

    #[test]
    fn claim_json_skips_absent_optional_fields() {
        let mut rec = record();
        rec.address = None;
        rec.encounter = None;
        let claim = build_claim(&rec, &ClaimContext::default());
        let json = serde_json::to_string(&claim).expect("serialize");
        assert!(!json.contains("\"address\""));
        assert!(!json.contains("service_date"));
        assert!(json.contains("\"total_cents\":15000"));
        assert!(json.contains("\"claim_id\":\"12345\""));
    }

    #[test]
    fn missing_subscriber_address_skips_subscriber_address_segments() {
        let mut rec = record();
        rec.address = None;
        let claim = build_claim(&rec, &ClaimContext::default());
        let x12 = render_x12(&claim);
        // Only the billing provider's N3 remains.
        assert_eq!(x12.matches("N3*").count(), 1);
        assert_eq!(x12.matches("N4*").count(), 1);
    }
}
