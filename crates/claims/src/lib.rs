//! Simplified professional-claim building and remittance simulation.
//!
//! Renders the canonical record into an 837-style claim, simulates a
//! deterministic 835-style remittance response, and reconciles the pair
//! by claim identifier. Monetary amounts are integer cents throughout;
//! floats never touch money.
//!
//! Not a conformant X12 implementation: segment shapes are kept close
//! enough to the real formats to demonstrate the billing flow.

pub mod claim;
pub mod remittance;

pub use claim::{build_claim, render_x12, Claim, ClaimContext, ServiceLine, Subscriber};
pub use remittance::{
    reconcile, render_x12_835, simulate_remittance, Adjustment, ClaimReconciliation, ClaimStatus,
    Remittance, RemitOutcome,
};

/// Errors returned by the claims crate.
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("claim id mismatch: claim {claim}, remittance {remittance}")]
    ClaimIdMismatch { claim: String, remittance: String },
}

pub type ClaimResult<T> = Result<T, ClaimError>;

/// Format integer cents as a decimal amount string (`15000` -> `150.00`).
pub(crate) fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}
