//! Batch reconciliation engine.
//!
//! Consumes tabular patient rows, validates them with the same format
//! primitives as the message pipeline, deduplicates within the batch
//! (first-seen-wins, a policy choice, not an accident), and classifies
//! each survivor against existing state as insert or update. The whole
//! plan is computed before any write is suggested, so a caller can review
//! the summary before committing it.

use crate::error::{IntakeError, IntakeResult};
use crate::rules::parse_date;
use chrono::NaiveDate;
use intake_types::{Sex, StoreError};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One input row as read from the tabular source. Raw strings; the
/// engine validates and parses them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRow {
    pub identifier: String,
    pub family: String,
    pub given: String,
    pub birth_date: String,
    pub sex: String,
}

/// Why a row was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    MissingIdentifier,
    MissingBirthDate,
    MalformedBirthDate,
    MalformedSex,
    DuplicateInBatch,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::MissingIdentifier => "MISSING_IDENTIFIER",
            RejectReason::MissingBirthDate => "MISSING_BIRTH_DATE",
            RejectReason::MalformedBirthDate => "MALFORMED_BIRTH_DATE",
            RejectReason::MalformedSex => "MALFORMED_SEX",
            RejectReason::DuplicateInBatch => "DUPLICATE_IN_BATCH",
        };
        f.write_str(s)
    }
}

/// Natural key for dedupe and store lookup: normalized identifier plus
/// birth date.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub identifier: String,
    pub birth_date: NaiveDate,
}

impl NaturalKey {
    fn new(identifier: &str, birth_date: NaiveDate) -> Self {
        Self {
            identifier: identifier.trim().to_uppercase(),
            birth_date,
        }
    }
}

/// A validated, parsed patient as it would be persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredPatient {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    pub birth_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
}

impl StoredPatient {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(&self.identifier, self.birth_date)
    }
}

/// Lookup capability against existing records, injected by the caller.
/// Treated as fallible: a lookup failure aborts the batch with a store
/// error rather than misclassifying rows.
pub trait PatientLookup {
    fn find(&self, key: &NaturalKey) -> Result<Option<StoredPatient>, StoreError>;
}

/// In-memory patient store for tests and the CLI demo.
#[derive(Default)]
pub struct InMemoryPatientStore {
    patients: HashMap<NaturalKey, StoredPatient>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, patient: StoredPatient) {
        self.patients.insert(patient.natural_key(), patient);
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

impl PatientLookup for InMemoryPatientStore {
    fn find(&self, key: &NaturalKey) -> Result<Option<StoredPatient>, StoreError> {
        Ok(self.patients.get(key).cloned())
    }
}

/// Suggested write for one surviving row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RowAction {
    Insert,
    Update,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppliedRow {
    /// 1-based position in the input batch.
    pub row: usize,
    pub action: RowAction,
    pub patient: StoredPatient,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RejectedRow {
    /// 1-based position in the input batch.
    pub row: usize,
    pub identifier: String,
    pub reason: RejectReason,
}

/// Complete, reviewable reconciliation plan. Nothing has been written
/// when this is returned; `applied` is the suggested insert/update set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReconciliationSummary {
    pub seen: usize,
    pub duplicates: usize,
    pub inserts: usize,
    pub updates: usize,
    pub rejected: Vec<RejectedRow>,
    pub applied: Vec<AppliedRow>,
}

/// Reconcile a batch of rows against existing state.
///
/// Row order is the tie-break authority throughout: validation rejects,
/// duplicate rejects, and applied rows all report in input order, and
/// the first occurrence of a duplicated key wins.
///
/// # Errors
///
/// Returns [`IntakeError::Store`] when the lookup capability fails;
/// partial classification is never returned.
pub fn reconcile_batch(
    rows: &[PatientRow],
    lookup: &dyn PatientLookup,
) -> IntakeResult<ReconciliationSummary> {
    let mut rejected = Vec::new();
    let mut candidates: Vec<(usize, StoredPatient)> = Vec::new();

    // Validate every row first; invalid rows reject immediately.
    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        match validate_row(row) {
            Ok(patient) => candidates.push((row_number, patient)),
            Err(reason) => {
                tracing::debug!(row = row_number, reason = %reason, "row rejected");
                rejected.push(RejectedRow {
                    row: row_number,
                    identifier: row.identifier.trim().to_string(),
                    reason,
                });
            }
        }
    }

    // Dedupe within the batch by natural key, first-seen-wins.
    let mut seen_keys: HashSet<NaturalKey> = HashSet::new();
    let mut survivors: Vec<(usize, StoredPatient)> = Vec::new();
    let mut duplicates = 0usize;
    for (row_number, patient) in candidates {
        if seen_keys.insert(patient.natural_key()) {
            survivors.push((row_number, patient));
        } else {
            duplicates += 1;
            rejected.push(RejectedRow {
                row: row_number,
                identifier: patient.identifier.clone(),
                reason: RejectReason::DuplicateInBatch,
            });
        }
    }

    // Classify survivors against the store. Exact matches classify as
    // Update too; the apply step is idempotent.
    let mut applied = Vec::new();
    let mut inserts = 0usize;
    let mut updates = 0usize;
    for (row_number, patient) in survivors {
        let action = match lookup.find(&patient.natural_key())? {
            None => {
                inserts += 1;
                RowAction::Insert
            }
            Some(_) => {
                updates += 1;
                RowAction::Update
            }
        };
        applied.push(AppliedRow {
            row: row_number,
            action,
            patient,
        });
    }

    rejected.sort_by_key(|r| r.row);

    Ok(ReconciliationSummary {
        seen: rows.len(),
        duplicates,
        inserts,
        updates,
        rejected,
        applied,
    })
}

fn validate_row(row: &PatientRow) -> Result<StoredPatient, RejectReason> {
    let identifier = row.identifier.trim();
    if identifier.is_empty() {
        return Err(RejectReason::MissingIdentifier);
    }

    let birth_raw = row.birth_date.trim();
    if birth_raw.is_empty() {
        return Err(RejectReason::MissingBirthDate);
    }
    let birth_date = parse_birth_date(birth_raw).ok_or(RejectReason::MalformedBirthDate)?;

    let sex_raw = row.sex.trim();
    let sex = if sex_raw.is_empty() {
        None
    } else {
        Some(Sex::from_hl7(sex_raw).ok_or(RejectReason::MalformedSex)?)
    };

    let family = non_empty(&row.family);
    let given = non_empty(&row.given);

    Ok(StoredPatient {
        identifier: identifier.to_string(),
        family,
        given,
        birth_date,
        sex,
    })
}

// Tabular sources commonly carry ISO dates; HL7 compact form is accepted
// for parity with the message pipeline.
fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_date(raw))
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse the CSV-style batch form used by the CLI:
/// `identifier,family,given,birth_date,sex` with a header line.
///
/// # Errors
///
/// Returns [`IntakeError::MalformedBatch`] when the header is missing or
/// a line has the wrong column count.
pub fn parse_rows(text: &str) -> IntakeResult<Vec<PatientRow>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| IntakeError::MalformedBatch("empty batch input".into()))?;
    let expected = "identifier,family,given,birth_date,sex";
    if header.trim() != expected {
        return Err(IntakeError::MalformedBatch(format!(
            "unexpected header {header:?}; expected {expected:?}"
        )));
    }

    lines
        .enumerate()
        .map(|(index, line)| {
            let cols: Vec<&str> = line.split(',').collect();
            if cols.len() != 5 {
                return Err(IntakeError::MalformedBatch(format!(
                    "line {}: expected 5 columns, found {}",
                    index + 2,
                    cols.len()
                )));
            }
            Ok(PatientRow {
                identifier: cols[0].to_string(),
                family: cols[1].to_string(),
                given: cols[2].to_string(),
                birth_date: cols[3].to_string(),
                sex: cols[4].to_string(),
            })
        })
        .collect()
}

/// Render the ordered reject list as a CSV artifact.
pub fn export_rejects(summary: &ReconciliationSummary) -> Vec<u8> {
    let mut out = String::from("row,identifier,reason\n");
    for reject in &summary.rejected {
        out.push_str(&format!(
            "{},{},{}\n",
            reject.row, reject.identifier, reject.reason
        ));
    }
    out.into_bytes()
}
