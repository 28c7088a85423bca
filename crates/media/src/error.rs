use thiserror::Error;

/// Errors from normalizing an uploaded image.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The input could not be recognised or decoded as an image.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The normalized image could not be re-encoded.
    #[error("encode failed: {0}")]
    Encode(String),
}
