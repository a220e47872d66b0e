//! Single entry point for the intake pipeline.
//!
//! raw text -> parse -> classify -> validate -> (if not rejected)
//! normalize, with every stage recorded in the trace store. Trace
//! completeness is an invariant: every submission gets a finalized
//! trace, including messages that fail at parse time.

use crate::canonical::normalize;
use crate::error::IntakeResult;
use crate::trace::{CorrelationId, Stage, StepEntry, StepOutcome, TraceStore};
use crate::validate::validate;
use hl7::{classify, MessageType, ParsedMessage};
use intake_types::{CanonicalRecord, FieldRef, Finding, Verdict};
use serde::Serialize;

/// Result of processing one raw message.
#[derive(Clone, Debug, Serialize)]
pub struct ProcessOutcome {
    pub correlation_id: String,
    /// Absent when the message failed structural parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
    /// Present only for non-rejected messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<CanonicalRecord>,
}

/// Process one raw message end to end.
///
/// Structural parse failures are terminal verdicts, not errors: the
/// trace records the failure and the outcome comes back `Rejected`.
/// Only trace-store failures surface as `Err`.
///
/// # Errors
///
/// Returns [`crate::IntakeError::Store`] when the trace store fails;
/// the retry policy, if any, belongs to the caller's persistence
/// adapter.
pub fn process_message(
    raw: &str,
    correlation_id: Option<CorrelationId>,
    trace: &dyn TraceStore,
) -> IntakeResult<ProcessOutcome> {
    let id = correlation_id.unwrap_or_else(CorrelationId::generate);

    let message = match ParsedMessage::parse(raw) {
        Ok(message) => message,
        Err(err) => {
            tracing::warn!(correlation_id = %id, error = %err, "message failed structural parsing");
            let finding = Finding::reject(
                FieldRef::new("MSH", 1),
                format!("message could not be parsed: {err}"),
            );
            trace.append(
                &id,
                StepEntry::new(Stage::Parse, StepOutcome::Error, err.to_string())
                    .with_findings(vec![finding.clone()]),
            )?;
            trace.finish(&id, Verdict::Rejected)?;
            return Ok(ProcessOutcome {
                correlation_id: id.as_str().to_string(),
                message_type: None,
                verdict: Verdict::Rejected,
                findings: vec![finding],
                canonical: None,
            });
        }
    };

    trace.append(
        &id,
        StepEntry::new(
            Stage::Parse,
            StepOutcome::Ok,
            format!("parsed {} segments", message.segments().len()),
        ),
    )?;

    let message_type = classify(&message);
    let classify_outcome = if message_type == MessageType::Unknown {
        StepOutcome::Warn
    } else {
        StepOutcome::Ok
    };
    trace.append(
        &id,
        StepEntry::new(Stage::Classify, classify_outcome, message_type.profile()),
    )?;

    let validation = validate(&message, message_type);
    let validate_outcome = match validation.verdict {
        Verdict::Rejected => StepOutcome::Error,
        Verdict::AcceptedWithWarning => StepOutcome::Warn,
        Verdict::Accepted => StepOutcome::Ok,
    };
    trace.append(
        &id,
        StepEntry::new(
            Stage::Validate,
            validate_outcome,
            format!("validation verdict: {}", validation.verdict),
        )
        .with_findings(validation.findings.clone()),
    )?;

    let canonical = if validation.verdict.is_rejected() {
        tracing::debug!(correlation_id = %id, "message rejected; skipping normalization");
        None
    } else {
        let record = normalize(&message, message_type, validation.verdict)?;
        trace.append(
            &id,
            StepEntry::new(
                Stage::Normalize,
                StepOutcome::Ok,
                format!("canonical record produced for patient {}", record.patient_id),
            ),
        )?;
        Some(record)
    };

    trace.finish(&id, validation.verdict)?;
    tracing::debug!(correlation_id = %id, verdict = %validation.verdict, "message processed");

    Ok(ProcessOutcome {
        correlation_id: id.as_str().to_string(),
        message_type: Some(message_type),
        verdict: validation.verdict,
        findings: validation.findings,
        canonical,
    })
}
