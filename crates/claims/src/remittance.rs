//! Deterministic 835-style remittance simulation and claim
//! reconciliation.
//!
//! Simulation is rule-driven, never randomized, so every test run sees
//! the same amounts: `Paid` pays 80% of billed with the remainder as
//! patient responsibility; `Denied` pays nothing and carries a CO-45
//! adjustment for the full billed amount.

use crate::claim::Claim;
use crate::{format_cents, ClaimError, ClaimResult};
use serde::Serialize;

/// Requested simulation outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemitOutcome {
    #[default]
    Paid,
    Denied,
}

/// CLP claim status codes carried on the remittance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ClaimStatus {
    Paid,
    Denied,
    Other,
}

impl ClaimStatus {
    fn clp_code(self) -> &'static str {
        match self {
            ClaimStatus::Paid => "1",
            ClaimStatus::Denied => "4",
            ClaimStatus::Other => "2",
        }
    }
}

/// One CAS adjustment on the remittance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Adjustment {
    /// Adjustment group code (`PR` patient responsibility, `CO`
    /// contractual obligation).
    pub group: String,
    pub reason_code: u16,
    pub amount_cents: i64,
}

impl Adjustment {
    fn render(&self) -> String {
        format!(
            "CAS*{}*{}*{}~",
            self.group,
            self.reason_code,
            format_cents(self.amount_cents)
        )
    }
}

/// A simulated remittance response for one claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Remittance {
    pub claim_id: String,
    pub status: ClaimStatus,
    pub billed_cents: i64,
    pub paid_cents: i64,
    pub patient_responsibility_cents: i64,
    pub adjustments: Vec<Adjustment>,
}

/// Simulate a remittance for a claim. Deterministic given the outcome.
pub fn simulate_remittance(claim: &Claim, outcome: RemitOutcome) -> Remittance {
    let billed = claim.total_cents;
    match outcome {
        RemitOutcome::Paid => {
            let paid = billed * 80 / 100;
            let patient_responsibility = billed - paid;
            let adjustments = if patient_responsibility > 0 {
                vec![Adjustment {
                    group: "PR".to_string(),
                    reason_code: 1,
                    amount_cents: patient_responsibility,
                }]
            } else {
                vec![]
            };
            Remittance {
                claim_id: claim.claim_id.clone(),
                status: ClaimStatus::Paid,
                billed_cents: billed,
                paid_cents: paid,
                patient_responsibility_cents: patient_responsibility,
                adjustments,
            }
        }
        RemitOutcome::Denied => Remittance {
            claim_id: claim.claim_id.clone(),
            status: ClaimStatus::Denied,
            billed_cents: billed,
            paid_cents: 0,
            patient_responsibility_cents: 0,
            adjustments: vec![Adjustment {
                group: "CO".to_string(),
                reason_code: 45,
                amount_cents: billed,
            }],
        },
    }
}

/// Render the remittance as simplified 835 segment text.
pub fn render_x12_835(remittance: &Remittance) -> String {
    let mut segments: Vec<String> = Vec::new();

    segments.push(
        "ISA*00*          *00*          *ZZ*SENDERID      *ZZ*RECEIVERID    \
*250101*1200*^*00501*000000905*0*T*:~"
            .to_string(),
    );
    segments.push("GS*HP*SENDERID*RECEIVERID*20250101*1200*1*X*005010X221A1~".to_string());
    segments.push("ST*835*0001~".to_string());
    segments.push("BPR*I*0*C*CHK************20250101~".to_string());
    segments.push("TRN*1*12345*9876543210~".to_string());
    segments.push("N1*PR*DEMO PAYER*PI*99999~".to_string());
    segments.push("N1*PE*GOOD HEALTH CLINIC*XX*1234567893~".to_string());

    segments.push(format!(
        "CLP*{}*{}*{}*{}*{}*MC*PCN123*11~",
        remittance.claim_id,
        remittance.status.clp_code(),
        format_cents(remittance.billed_cents),
        format_cents(remittance.paid_cents),
        format_cents(remittance.patient_responsibility_cents)
    ));
    for adjustment in &remittance.adjustments {
        segments.push(adjustment.render());
    }

    segments.push(format!("SE*{}*0001~", segments.len() - 1));
    segments.push("GE*1*1~".to_string());
    segments.push("IEA*1*000000905~".to_string());

    segments.join("\n")
}

/// Reconciliation of a submitted claim against its remittance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClaimReconciliation {
    pub claim_id: String,
    pub status: ClaimStatus,
    pub billed_cents: i64,
    pub paid_cents: i64,
    pub patient_responsibility_cents: i64,
    pub adjustments: Vec<Adjustment>,
    /// Outstanding amount the provider is still owed.
    pub balance_due_cents: i64,
}

/// Reconcile a claim with a remittance, matched by claim identifier.
///
/// # Errors
///
/// Returns [`ClaimError::ClaimIdMismatch`] when the remittance does not
/// belong to the claim.
pub fn reconcile(claim: &Claim, remittance: &Remittance) -> ClaimResult<ClaimReconciliation> {
    if claim.claim_id != remittance.claim_id {
        return Err(ClaimError::ClaimIdMismatch {
            claim: claim.claim_id.clone(),
            remittance: remittance.claim_id.clone(),
        });
    }

    let balance = (remittance.billed_cents
        - remittance.paid_cents
        - remittance.patient_responsibility_cents)
        .max(0);

    Ok(ClaimReconciliation {
        claim_id: claim.claim_id.clone(),
        status: remittance.status,
        billed_cents: remittance.billed_cents,
        paid_cents: remittance.paid_cents,
        patient_responsibility_cents: remittance.patient_responsibility_cents,
        adjustments: remittance.adjustments.clone(),
        balance_due_cents: balance,
    })
}
