use std::time::Duration;

use async_trait::async_trait;

use crate::error::StateError;
use crate::key::StateKey;
use crate::script::AtomicScript;

/// Values returned by [`KvStore::run_script`].
pub type ScriptReply = Option<Vec<Vec<u8>>>;

/// Typed adapter over an external key-value store.
///
/// Values are opaque bytes and must round-trip byte-exact. Implementations
/// must be `Send + Sync` and safe for concurrent access; absence is reported
/// through `None`/`false`, never through an error.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get the value for a key. Returns `None` if not found or expired.
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StateError>;

    /// Get the value for a key as UTF-8 text.
    async fn get_string(&self, key: &StateKey) -> Result<Option<String>, StateError> {
        self.get(key)
            .await?
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|e| {
                    StateError::Serialization(format!("value at {key} is not UTF-8: {e}"))
                })
            })
            .transpose()
    }

    /// Set a value that expires after `ttl`, overwriting any previous value.
    async fn set_with_ttl(
        &self,
        key: &StateKey,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), StateError>;

    /// Set a value with no expiry, overwriting any previous value.
    async fn set(&self, key: &StateKey, value: &[u8]) -> Result<(), StateError>;

    /// Delete a key. Returns `true` if a live key was removed.
    async fn delete(&self, key: &StateKey) -> Result<bool, StateError>;

    /// Check whether a live key exists.
    async fn exists(&self, key: &StateKey) -> Result<bool, StateError>;

    /// Time left before the key expires.
    ///
    /// Returns `None` when the key is missing or carries no TTL.
    async fn remaining_ttl(&self, key: &StateKey) -> Result<Option<Duration>, StateError>;

    /// Run an [`AtomicScript`] over `keys` as a single indivisible step.
    async fn run_script(
        &self,
        script: AtomicScript,
        keys: &[StateKey],
        args: &[String],
    ) -> Result<ScriptReply, StateError>;
}

/// Reject a script call whose key list does not match the script's arity.
pub fn check_script_keys(script: AtomicScript, keys: &[StateKey]) -> Result<(), StateError> {
    if keys.len() == script.key_count() {
        Ok(())
    } else {
        Err(StateError::Backend(format!(
            "script {script} expects {} keys, got {}",
            script.key_count(),
            keys.len()
        )))
    }
}
