use intake_types::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// A programming-contract violation, such as invoking the mapper on a
    /// rejected message. Surfaces loudly instead of producing a partial
    /// record.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),
    /// Unparseable batch input handed to the reconciliation engine.
    #[error("malformed batch input: {0}")]
    MalformedBatch(String),
    /// An injected store capability failed. Infrastructure health, not
    /// data quality; propagated unmodified, never retried here.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type IntakeResult<T> = std::result::Result<T, IntakeError>;
