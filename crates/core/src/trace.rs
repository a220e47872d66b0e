//! Trace recorder: append-only processing history per correlation id.
//!
//! The store is an injected capability, not ambient state, so the
//! pipeline stays testable without a real persistence backend. The
//! in-process contract specified here: one record per correlation id,
//! steps ordered by submission, entries never mutated or removed. The
//! durable medium behind a production implementation is an external
//! collaborator.

use chrono::{DateTime, Utc};
use intake_types::{Finding, StoreError, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

/// Identifier tying together all trace steps for one message, 32-hex
/// uuid form. Generated at intake when the caller does not supply one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pipeline stage a step entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Parse,
    Classify,
    Validate,
    Normalize,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Classify => "classify",
            Stage::Validate => "validate",
            Stage::Normalize => "normalize",
        }
    }
}

/// Outcome of one pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Ok,
    Warn,
    Error,
}

/// One immutable step in a message's processing history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepEntry {
    pub stage: Stage,
    pub outcome: StepOutcome,
    pub message: String,
    /// Snapshot of the findings known when the step completed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
}

impl StepEntry {
    pub fn new(stage: Stage, outcome: StepOutcome, message: impl Into<String>) -> Self {
        Self {
            stage,
            outcome,
            message: message.into(),
            findings: Vec::new(),
        }
    }

    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = findings;
        self
    }
}

/// Complete trace for one message. Steps are append-only; corrections
/// are new entries, never edits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub correlation_id: String,
    pub received_at: DateTime<Utc>,
    pub steps: Vec<StepEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_verdict: Option<Verdict>,
}

/// Injected audit-store capability.
///
/// Implementations must keep steps ordered by submission per correlation
/// id and tolerate concurrent writers for *different* ids. Failures are
/// [`StoreError`], distinguishable from any validation outcome.
pub trait TraceStore {
    fn append(&self, id: &CorrelationId, step: StepEntry) -> Result<(), StoreError>;
    /// Record the final verdict. A trace is finalized at most once;
    /// later calls are ignored rather than rewriting history.
    fn finish(&self, id: &CorrelationId, verdict: Verdict) -> Result<(), StoreError>;
    fn get(&self, id: &CorrelationId) -> Result<Option<TraceRecord>, StoreError>;
}

/// In-memory trace store for tests and the CLI demo.
#[derive(Default)]
pub struct InMemoryTraceStore {
    records: Mutex<HashMap<String, TraceRecord>>,
}

impl InMemoryTraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, TraceRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("trace store lock poisoned".into()))
    }
}

impl TraceStore for InMemoryTraceStore {
    fn append(&self, id: &CorrelationId, step: StepEntry) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        let record = records
            .entry(id.as_str().to_string())
            .or_insert_with(|| TraceRecord {
                correlation_id: id.as_str().to_string(),
                received_at: Utc::now(),
                steps: Vec::new(),
                final_verdict: None,
            });
        record.steps.push(step);
        Ok(())
    }

    fn finish(&self, id: &CorrelationId, verdict: Verdict) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        if let Some(record) = records.get_mut(id.as_str()) {
            if record.final_verdict.is_none() {
                record.final_verdict = Some(verdict);
            } else {
                tracing::warn!(correlation_id = %id, "trace already finalized; ignoring");
            }
        }
        Ok(())
    }

    fn get(&self, id: &CorrelationId) -> Result<Option<TraceRecord>, StoreError> {
        let records = self.lock()?;
        Ok(records.get(id.as_str()).cloned())
    }
}
