//! # Intake Core
//!
//! Core business logic for the HL7 intake and reconciliation system:
//! - table-driven validation with documented fallback assumptions
//! - normalization of accepted messages into the canonical record
//! - an append-only, correlation-id-keyed trace of every decision
//! - the single-message pipeline and the batch reconciliation engine
//!
//! **No transport concerns**: HTTP/TCP listeners, page rendering, and
//! durable persistence backends are external collaborators that call
//! into this crate and implement its store traits.

pub mod canonical;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod rules;
pub mod trace;
pub mod validate;

pub use canonical::normalize;
pub use error::{IntakeError, IntakeResult};
pub use pipeline::{process_message, ProcessOutcome};
pub use reconcile::{
    export_rejects, parse_rows, reconcile_batch, AppliedRow, InMemoryPatientStore, NaturalKey,
    PatientLookup, PatientRow, ReconciliationSummary, RejectReason, RejectedRow, RowAction,
    StoredPatient,
};
pub use trace::{
    CorrelationId, InMemoryTraceStore, Stage, StepEntry, StepOutcome, TraceRecord, TraceStore,
};
pub use validate::{validate, Validation};
