use serde::Deserialize;

/// Upload limits enforced before a request reaches the vault.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted photo, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: usize,
    /// Declared content types accepted for the `photo` part.
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

impl UploadConfig {
    /// Whether `mime_type` is on the allow list, ignoring case and parameters.
    pub fn allows(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024
}

fn default_allowed_mime_types() -> Vec<String> {
    ["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}
