use thiserror::Error;

/// Errors from key-value store operations.
///
/// Absence of a key is never an error: operations report it as `None` or
/// `false`. Every variant here means the store itself could not answer.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}
