use thiserror::Error;

use vanish_state::StateError;

use crate::passphrase::HashError;

/// Errors surfaced by [`SecretStore`](crate::SecretStore) operations.
///
/// Each variant maps onto one transport status without the core knowing any
/// transport vocabulary.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The request is malformed or out of range. The message is safe to show.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing, wrong, or mismatched credential. Deliberately carries no detail.
    #[error("unauthorized")]
    Unauthorized,

    /// The photo is absent: expired, consumed, burned, or never existed.
    #[error("photo not found or has expired")]
    NotFound,

    /// The uploaded payload could not be transcoded.
    #[error("unprocessable content: {0}")]
    UnprocessableContent(String),

    /// A stored record failed to deserialize.
    #[error("corrupted state: {0}")]
    CorruptedState(String),

    /// The key-value store could not be reached or rejected the call.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] StateError),

    /// The passphrase hasher itself failed.
    #[error("passphrase hashing failed: {0}")]
    Passphrase(String),
}

impl From<HashError> for VaultError {
    fn from(e: HashError) -> Self {
        match e {
            HashError::Hash(msg) => Self::Passphrase(msg),
            HashError::Malformed(msg) => {
                Self::CorruptedState(format!("stored passphrase hash: {msg}"))
            }
        }
    }
}
