use std::fmt;

/// Longest passphrase accepted on upload, in characters.
pub const MAX_PASSPHRASE_CHARS: usize = 256;

/// Everything needed to store a new one-time photo.
#[derive(Clone, Default)]
pub struct UploadRequest {
    /// Raw uploaded bytes, before transcoding.
    pub bytes: Vec<u8>,
    /// Client-supplied filename, used only to derive the stored name.
    pub filename: Option<String>,
    /// Client-declared mime type, used as a decoding hint.
    pub mime_type: Option<String>,
    /// Requested lifetime. `None` means the default.
    pub ttl_seconds: Option<u64>,
    /// Optional passphrase. Blank values are treated as absent.
    pub passphrase: Option<String>,
}

impl UploadRequest {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    #[must_use]
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    /// The passphrase to protect the photo with, if any.
    pub(crate) fn effective_passphrase(&self) -> Option<&str> {
        self.passphrase
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("bytes", &format_args!("[{} bytes]", self.bytes.len()))
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("ttl_seconds", &self.ttl_seconds)
            .field(
                "passphrase",
                &self.passphrase.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
