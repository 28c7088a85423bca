use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};

use crate::error::TranscodeError;

/// Longest side, in pixels, an image is scaled down to.
pub const DEFAULT_MAX_DIMENSION: u32 = 1920;

/// JPEG quality used for the re-encode.
pub const DEFAULT_QUALITY: u8 = 82;

const OUTPUT_MIME: &str = "image/jpeg";
const OUTPUT_EXTENSION: &str = "jpg";
const FALLBACK_STEM: &str = "photo";

/// What the uploader told us about the file. Both fields are advisory.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceHint<'a> {
    pub filename: Option<&'a str>,
    pub mime_type: Option<&'a str>,
}

/// A normalized image ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}

impl TranscodedImage {
    /// Size of the encoded payload in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Turns arbitrary uploaded bytes into a compact, orientation-normalized image.
///
/// Implementations are CPU-bound and synchronous; callers in async code are
/// expected to run them on a blocking thread.
pub trait Transcoder: Send + Sync {
    fn transcode(
        &self,
        input: &[u8],
        hint: SourceHint<'_>,
    ) -> Result<TranscodedImage, TranscodeError>;
}

/// Tuning knobs for [`ImageTranscoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaOptions {
    /// Longest side after scaling. Smaller images are never upscaled.
    pub max_dimension: u32,
    /// Lossy encoder quality, 1..=100.
    pub quality: u8,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// [`Transcoder`] backed by the `image` crate.
///
/// Applies EXIF orientation, bounds the longest side to
/// [`MediaOptions::max_dimension`] keeping the aspect ratio, drops any alpha
/// channel and re-encodes as JPEG.
#[derive(Debug, Clone, Default)]
pub struct ImageTranscoder {
    options: MediaOptions,
}

impl ImageTranscoder {
    /// Create a transcoder with the given options.
    #[must_use]
    pub fn new(options: MediaOptions) -> Self {
        Self {
            options: MediaOptions {
                max_dimension: options.max_dimension.max(1),
                quality: options.quality.clamp(1, 100),
            },
        }
    }

    fn decode(input: &[u8], mime_hint: Option<&str>) -> Result<DynamicImage, TranscodeError> {
        let mut reader = ImageReader::new(Cursor::new(input))
            .with_guessed_format()
            .map_err(|e| TranscodeError::Decode(e.to_string()))?;

        // Content sniffing wins; the declared type is only a fallback.
        if reader.format().is_none()
            && let Some(format) = mime_hint.and_then(ImageFormat::from_mime_type)
        {
            reader.set_format(format);
        }

        let mut decoder = reader
            .into_decoder()
            .map_err(|e| TranscodeError::Decode(e.to_string()))?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut img =
            DynamicImage::from_decoder(decoder).map_err(|e| TranscodeError::Decode(e.to_string()))?;
        img.apply_orientation(orientation);
        Ok(img)
    }

    fn bound(&self, img: DynamicImage) -> DynamicImage {
        let max = self.options.max_dimension;
        if img.width().max(img.height()) <= max {
            return img;
        }
        img.resize(max, max, FilterType::Lanczos3)
    }

    fn encode(&self, img: &DynamicImage) -> Result<Vec<u8>, TranscodeError> {
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, self.options.quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| TranscodeError::Encode(e.to_string()))?;
        Ok(out)
    }
}

impl Transcoder for ImageTranscoder {
    fn transcode(
        &self,
        input: &[u8],
        hint: SourceHint<'_>,
    ) -> Result<TranscodedImage, TranscodeError> {
        let img = Self::decode(input, hint.mime_type)?;
        let img = self.bound(img);
        let bytes = self.encode(&img)?;

        Ok(TranscodedImage {
            bytes,
            mime_type: OUTPUT_MIME.to_owned(),
            filename: output_filename(hint.filename),
        })
    }
}

/// Derive the stored filename: the original stem with the output extension.
///
/// Anything that could break out of a `Content-Disposition` header or name a
/// path is dropped from the stem.
fn output_filename(original: Option<&str>) -> String {
    let stem = original
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name))
        .map(|name| name.rsplit_once('.').map_or(name, |(stem, _)| stem))
        .map(|stem| {
            stem.chars()
                .filter(|c| !c.is_control() && !matches!(c, '"' | '\\' | '/' | ';'))
                .collect::<String>()
        })
        .filter(|stem| !stem.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_owned());
    format!("{stem}.{OUTPUT_EXTENSION}")
}
