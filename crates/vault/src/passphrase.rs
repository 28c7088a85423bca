use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;
use thiserror::Error;

/// Errors from the passphrase hashing collaborator.
#[derive(Debug, Error)]
pub enum HashError {
    /// Producing a hash failed.
    #[error("hashing failed: {0}")]
    Hash(String),

    /// A stored hash could not be parsed or uses an unsupported scheme.
    #[error("malformed hash: {0}")]
    Malformed(String),
}

/// Salted, slow passphrase hashing with verification against a stored hash.
///
/// Both operations are CPU-bound and synchronous.
pub trait PassphraseHasher: Send + Sync {
    /// Hash `passphrase` with a fresh random salt into a PHC string.
    fn hash(&self, passphrase: &str) -> Result<String, HashError>;

    /// Check `candidate` against a PHC string produced by [`hash`](Self::hash).
    ///
    /// Returns `Ok(false)` on mismatch; errors are reserved for hashes that
    /// cannot be checked at all.
    fn verify(&self, hash: &str, candidate: &str) -> Result<bool, HashError>;
}

/// Argon2id [`PassphraseHasher`].
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Create a hasher with explicit cost parameters for new hashes.
    ///
    /// Verification always uses the parameters embedded in the stored hash.
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self { params }
    }
}

impl PassphraseHasher for Argon2Hasher {
    fn hash(&self, passphrase: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
            .hash_password(passphrase.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::Hash(e.to_string()))
    }

    fn verify(&self, hash: &str, candidate: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| HashError::Malformed(e.to_string()))?;
        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Malformed(e.to_string())),
        }
    }
}
