use std::sync::Arc;

use vanish_state::KvStore;
use vanish_state_memory::MemoryKvStore;
#[cfg(feature = "redis")]
use vanish_state_redis::{RedisConfig, RedisKvStore};

use crate::config::StateConfig;
use crate::error::ServerError;

/// Create the key-value backend from the given configuration.
#[allow(clippy::unused_async)]
pub async fn create_kv_store(config: &StateConfig) -> Result<Arc<dyn KvStore>, ServerError> {
    let store: Arc<dyn KvStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryKvStore::new()),
        #[cfg(feature = "redis")]
        "redis" => {
            let url = config.url.as_deref().ok_or_else(|| {
                ServerError::Config("redis backend requires [state] url".into())
            })?;

            let mut redis_config = RedisConfig::new(url);
            if let Some(prefix) = &config.prefix {
                redis_config.prefix.clone_from(prefix);
            }
            if let Some(pool_size) = config.pool_size {
                redis_config.pool_size = pool_size;
            }
            if let Some(secs) = config.connection_timeout_seconds {
                redis_config.connection_timeout = std::time::Duration::from_secs(secs);
            }

            let store = RedisKvStore::new(&redis_config)
                .map_err(|e| ServerError::Config(format!("redis: {e}")))?;
            Arc::new(store)
        }
        other => {
            return Err(ServerError::Config(format!(
                "unsupported state backend: {other}"
            )));
        }
    };

    tracing::info!(backend = %config.backend, "state backend initialized");
    Ok(store)
}
