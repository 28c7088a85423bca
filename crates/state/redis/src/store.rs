use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::{AsyncCommands, RedisError, Script};
use tracing::debug;

use vanish_state::error::StateError;
use vanish_state::key::StateKey;
use vanish_state::script::AtomicScript;
use vanish_state::store::{KvStore, ScriptReply, check_script_keys};

use crate::config::RedisConfig;
use crate::key_render::render_key;
use crate::scripts;

/// Redis-backed implementation of [`KvStore`].
///
/// Uses a `deadpool-redis` connection pool and Lua scripts for atomicity.
/// Values are stored as plain Redis strings, which are binary-safe.
pub struct RedisKvStore {
    pool: Pool,
    prefix: String,
}

impl RedisKvStore {
    /// Create a new `RedisKvStore` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, StateError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| StateError::Connection(e.to_string()))?
            .map_err(|e| StateError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
        })
    }

    /// Build the full Redis key for an entry.
    fn redis_key(&self, key: &StateKey) -> String {
        render_key(&self.prefix, key)
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, StateError> {
        self.pool
            .get()
            .await
            .map_err(|e| StateError::Connection(e.to_string()))
    }
}

/// Classify a Redis error: transport failures become `Connection`, anything
/// the server rejected becomes `Backend`.
fn map_err(e: &RedisError) -> StateError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
        StateError::Connection(e.to_string())
    } else {
        StateError::Backend(e.to_string())
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    // Redis rejects a zero expiry; round sub-millisecond TTLs up.
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;
        conn.get(&redis_key).await.map_err(|e| map_err(&e))
    }

    async fn set_with_ttl(
        &self,
        key: &StateKey,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;

        redis::cmd("SET")
            .arg(&redis_key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| map_err(&e))
    }

    async fn set(&self, key: &StateKey, value: &[u8]) -> Result<(), StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;

        redis::cmd("SET")
            .arg(&redis_key)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| map_err(&e))
    }

    async fn delete(&self, key: &StateKey) -> Result<bool, StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;

        let deleted: i64 = conn.del(&redis_key).await.map_err(|e| map_err(&e))?;
        Ok(deleted > 0)
    }

    async fn exists(&self, key: &StateKey) -> Result<bool, StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;
        conn.exists(&redis_key).await.map_err(|e| map_err(&e))
    }

    async fn remaining_ttl(&self, key: &StateKey) -> Result<Option<Duration>, StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;

        // PTTL: -2 when the key is missing, -1 when it has no expiry.
        let millis: i64 = conn.pttl(&redis_key).await.map_err(|e| map_err(&e))?;
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }

    async fn run_script(
        &self,
        script: AtomicScript,
        keys: &[StateKey],
        args: &[String],
    ) -> Result<ScriptReply, StateError> {
        check_script_keys(script, keys)?;

        let source = match script {
            AtomicScript::TakePair => scripts::TAKE_PAIR,
            AtomicScript::DeletePair => scripts::DELETE_PAIR,
        };
        let lua = Script::new(source);
        let mut invocation = lua.prepare_invoke();
        for key in keys {
            invocation.key(self.redis_key(key));
        }
        for arg in args {
            invocation.arg(arg);
        }

        let mut conn = self.conn().await?;
        debug!(script = %script, "invoking redis script");

        match script {
            AtomicScript::TakePair => {
                let taken: Option<Vec<Vec<u8>>> = invocation
                    .invoke_async(&mut conn)
                    .await
                    .map_err(|e| map_err(&e))?;
                Ok(taken)
            }
            AtomicScript::DeletePair => {
                let deleted: i64 = invocation
                    .invoke_async(&mut conn)
                    .await
                    .map_err(|e| map_err(&e))?;
                Ok((deleted == 1).then(Vec::new))
            }
        }
    }
}
