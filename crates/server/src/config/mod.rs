mod logging;
mod media;
mod server;
mod state;
mod upload;


pub use logging::*;
pub use media::*;
pub use server::*;
pub use state::*;
pub use upload::*;

use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the vanish server, loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VanishConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Key-value backend configuration.
    #[serde(default)]
    pub state: StateConfig,
    /// Upload limits enforced at the HTTP layer.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Image transcoding configuration.
    #[serde(default)]
    pub media: MediaConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VanishConfig {
    /// Read and parse the TOML file at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist so the caller can fall
    /// back to defaults.
    pub fn load(path: &Path) -> Result<Option<Self>, ServerError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&contents)
            .map(Some)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }
}
