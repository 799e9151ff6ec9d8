use std::fmt;
use std::io::Cursor;

use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder, ImageReader, Limits};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const WEBP_MIME_TYPE: &str = "image/webp";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("failed to decode image: {reason}")]
    Decode { reason: String },

    #[error("webp encoding failed: width={width}, height={height}, reason={reason}")]
    Encode {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("image too large: {width}x{height} = {pixels} pixels, max {max_pixels}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },

    #[error("input too large: {size} bytes, max {max_size}")]
    InputTooLarge { size: usize, max_size: usize },

    #[error("input bytes empty")]
    EmptyInput,

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("at most {max} photos can be attached")]
    TooMany { max: usize },
}

impl From<image::ImageError> for ImageError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Unsupported(_) => ImageError::UnsupportedFormat,
            other => ImageError::Decode {
                reason: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLimits {
    pub max_input_bytes: usize,
    pub max_dimension: u32,
    pub max_image_pixels: u64,
    pub max_alloc_bytes: u64,
    /// Longest side of the re-encoded attachment.
    pub output_max_side: u32,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 25 * 1024 * 1024,
            max_dimension: 12_000,
            max_image_pixels: 60_000_000,
            max_alloc_bytes: 512 * 1024 * 1024,
            output_max_side: 1280,
        }
    }
}

/// A picked photo after decoding, downscaling and re-encoding as WebP.
/// Re-encoding drops EXIF and any other metadata the source file carried.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    /// blake3 of the bytes the shell handed us, hex encoded.
    pub digest: String,
}

impl DecodedImage {
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.webp", &self.digest[..self.digest.len().min(32)])
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_len", &self.data.len())
            .field("digest", &self.digest)
            .finish()
    }
}

#[instrument(skip(limits, raw_bytes), fields(input_size = raw_bytes.len()))]
pub fn decode_attachment(limits: &ImageLimits, raw_bytes: &[u8]) -> Result<DecodedImage, ImageError> {
    let img = decode_image(limits, raw_bytes).inspect_err(|e| warn!(error = %e, "decode failed"))?;

    let (w, h) = img.dimensions();
    let img = if w.max(h) > limits.output_max_side {
        img.resize(
            limits.output_max_side,
            limits.output_max_side,
            image::imageops::FilterType::Triangle,
        )
    } else {
        img
    };

    let (width, height) = img.dimensions();
    let data = encode_webp(&img)?;
    debug!(width, height, output_size = data.len(), "attachment decoded");

    Ok(DecodedImage {
        width,
        height,
        data,
        digest: hex::encode(blake3::hash(raw_bytes).as_bytes()),
    })
}

fn decode_image(limits: &ImageLimits, raw_bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    if raw_bytes.is_empty() {
        return Err(ImageError::EmptyInput);
    }

    if raw_bytes.len() > limits.max_input_bytes {
        return Err(ImageError::InputTooLarge {
            size: raw_bytes.len(),
            max_size: limits.max_input_bytes,
        });
    }

    let mut reader = ImageReader::new(Cursor::new(raw_bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode {
            reason: e.to_string(),
        })?;

    if reader.format().is_none() {
        return Err(ImageError::UnsupportedFormat);
    }

    let mut decode_limits = Limits::default();
    decode_limits.max_image_width = Some(limits.max_dimension);
    decode_limits.max_image_height = Some(limits.max_dimension);
    decode_limits.max_alloc = Some(limits.max_alloc_bytes);
    reader.limits(decode_limits);

    let img = reader.decode()?;
    let (w, h) = img.dimensions();
    let pixels = u64::from(w) * u64::from(h);

    if pixels > limits.max_image_pixels {
        return Err(ImageError::ImageTooLarge {
            width: w,
            height: h,
            pixels,
            max_pixels: limits.max_image_pixels,
        });
    }

    Ok(img)
}

fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    if width == 0 || height == 0 {
        return Err(ImageError::Encode {
            width,
            height,
            reason: "zero dimension".into(),
        });
    }

    let mut buffer = Vec::with_capacity((width * height * 4) as usize / 10);
    WebPEncoder::new_lossless(&mut buffer)
        .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|e| ImageError::Encode {
            width,
            height,
            reason: e.to_string(),
        })?;

    if buffer.len() < 12 || &buffer[0..4] != b"RIFF" || &buffer[8..12] != b"WEBP" {
        return Err(ImageError::Encode {
            width,
            height,
            reason: "invalid webp magic bytes".into(),
        });
    }

    Ok(buffer)
}

/// Ordered list of photos attached to a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachments {
    images: Vec<DecodedImage>,
    max: usize,
}

impl Attachments {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            images: Vec::new(),
            max,
        }
    }

    pub fn push(&mut self, image: DecodedImage) -> Result<(), ImageError> {
        if self.images.len() >= self.max {
            return Err(ImageError::TooMany { max: self.max });
        }
        self.images.push(image);
        Ok(())
    }

    /// Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<DecodedImage> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.images.len() >= self.max
    }

    #[must_use]
    pub fn as_slice(&self) -> &[DecodedImage] {
        &self.images
    }
}
