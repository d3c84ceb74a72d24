use store::StoreError;

/// Errors surfaced by form sessions and the pipeline.
///
/// Field-level validation failures are not errors; they travel as
/// [`ValidationResult`](crate::ValidationResult)s and field markers.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field `{0}` is hidden and cannot be edited")]
    HiddenField(String),

    #[error("agent row {index} out of range (rows: {len})")]
    RowOutOfRange { index: usize, len: usize },

    #[error("the last agent row cannot be removed")]
    LastRow,

    #[error("form `{0}` has no repeating group")]
    NoRepeatingGroup(&'static str),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("submit error: {0}")]
    Submit(#[from] SubmitError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a [`Submitter`](crate::Submitter).
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("submission rejected: {0}")]
    Rejected(String),
}
