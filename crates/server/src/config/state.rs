use serde::Deserialize;

/// Configuration for the key-value backend.
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// Which backend to use: `"memory"` or `"redis"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Connection URL for the backend (e.g. `redis://localhost:6379`).
    pub url: Option<String>,

    /// Key prefix for backends that support it. Defaults to `"vanish"`.
    pub prefix: Option<String>,

    /// Maximum pooled connections.
    pub pool_size: Option<usize>,

    /// Seconds to wait for a pooled connection before failing.
    pub connection_timeout_seconds: Option<u64>,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            prefix: None,
            pool_size: None,
            connection_timeout_seconds: None,
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}
