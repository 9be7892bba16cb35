use thiserror::Error;

/// Failures that indicate caller misuse. Lookups that are expected to
/// sometimes miss return `Option` instead of erroring.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("roll number already registered: {0}")]
    DuplicateKey(String),

    #[error("no student with id {0}")]
    NotFound(uuid::Uuid),

    #[error("required field is empty: {0}")]
    EmptyField(&'static str),
}
