use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;

use vanish_state::error::StateError;
use vanish_state::key::StateKey;
use vanish_state::script::AtomicScript;
use vanish_state::store::{KvStore, ScriptReply, check_script_keys};

/// A single entry in the in-memory store.
#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    /// Returns `true` if this entry has passed its TTL deadline.
    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// In-memory [`KvStore`] backed by a [`DashMap`].
///
/// Entries are lazily evicted on read when their TTL has elapsed. Every
/// mutation, scripts included, runs under a single write gate, so a script
/// never sees another write land between its steps. Reads take no gate.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    data: DashMap<String, Entry>,
    write_gate: Mutex<()>,
}

impl MemoryKvStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a [`StateKey`] into the string used as the map key.
    fn render_key(key: &StateKey) -> String {
        key.canonical()
    }

    /// Fetch a live entry, evicting it if its TTL has passed.
    fn live(&self, rendered: &str) -> Option<Entry> {
        let entry = self.data.get(rendered)?;
        if entry.is_expired() {
            // Drop the read guard before touching the shard again.
            drop(entry);
            self.data.remove_if(rendered, |_, e| e.is_expired());
            return None;
        }
        Some(entry.clone())
    }

    /// Remove an entry, returning it only if it was still live.
    fn take_live(&self, rendered: &str) -> Option<Entry> {
        self.data
            .remove(rendered)
            .map(|(_, entry)| entry)
            .filter(|entry| !entry.is_expired())
    }

    fn insert(&self, key: &StateKey, value: &[u8], ttl: Option<Duration>) {
        self.data.insert(
            Self::render_key(key),
            Entry {
                value: value.to_vec(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
    }

    /// `TakePair`: read both keys, delete both, or clean a dangling primary.
    fn take_pair(&self, primary: &str, companion: &str) -> ScriptReply {
        let first = self.live(primary)?;
        let Some(second) = self.live(companion) else {
            self.data.remove(primary);
            return None;
        };
        self.data.remove(primary);
        self.data.remove(companion);
        Some(vec![first.value, second.value])
    }

    /// `DeletePair`: remove both keys if either is live.
    fn delete_pair(&self, first: &str, second: &str) -> ScriptReply {
        let removed_first = self.take_live(first).is_some();
        let removed_second = self.take_live(second).is_some();
        (removed_first || removed_second).then(Vec::new)
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.live(&Self::render_key(key)).map(|entry| entry.value))
    }

    async fn set_with_ttl(
        &self,
        key: &StateKey,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), StateError> {
        let _gate = self.write_gate.lock().await;
        self.insert(key, value, Some(ttl));
        Ok(())
    }

    async fn set(&self, key: &StateKey, value: &[u8]) -> Result<(), StateError> {
        let _gate = self.write_gate.lock().await;
        self.insert(key, value, None);
        Ok(())
    }

    async fn delete(&self, key: &StateKey) -> Result<bool, StateError> {
        let _gate = self.write_gate.lock().await;
        // Expired entries count as "not found".
        Ok(self.take_live(&Self::render_key(key)).is_some())
    }

    async fn exists(&self, key: &StateKey) -> Result<bool, StateError> {
        Ok(self.live(&Self::render_key(key)).is_some())
    }

    async fn remaining_ttl(&self, key: &StateKey) -> Result<Option<Duration>, StateError> {
        Ok(self
            .live(&Self::render_key(key))
            .and_then(|entry| entry.expires_at)
            .map(|deadline| deadline.saturating_duration_since(Instant::now())))
    }

    async fn run_script(
        &self,
        script: AtomicScript,
        keys: &[StateKey],
        _args: &[String],
    ) -> Result<ScriptReply, StateError> {
        check_script_keys(script, keys)?;
        let first = Self::render_key(&keys[0]);
        let second = Self::render_key(&keys[1]);

        let _gate = self.write_gate.lock().await;
        let reply = match script {
            AtomicScript::TakePair => self.take_pair(&first, &second),
            AtomicScript::DeletePair => self.delete_pair(&first, &second),
        };
        Ok(reply)
    }
}
