//! Transcoding collaborator for uploads.
//!
//! The secret store only needs "given raw bytes, produce bytes, a mime type
//! and a size, or fail". [`Transcoder`] is that seam; [`ImageTranscoder`] is
//! the production implementation built on the `image` crate.

mod error;
mod transcoder;

pub use error::TranscodeError;
pub use transcoder::{
    DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY, ImageTranscoder, MediaOptions, SourceHint,
    TranscodedImage, Transcoder,
};
