//! Grayscale image decoding with format-specific optimizations.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than image crate),
//! falls back to image crate for other formats.

use crate::error::DecodeError;
use image::GrayImage;
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Image formats with a dedicated decode path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Other,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("jpg" | "jpeg") => Self::Jpeg,
            _ => Self::Other,
        }
    }
}

/// Decoder that picks the fastest available path per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image file straight to a single-channel intensity grid.
    pub fn decode(path: &Path) -> Result<GrayImage, DecodeError> {
        let image = match ImageFormat::from_path(path) {
            ImageFormat::Jpeg => Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path)),
            ImageFormat::Other => Self::decode_fallback(path),
        }?;

        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::EmptyImage {
                path: path.to_path_buf(),
            });
        }

        Ok(image)
    }

    /// Read width and height without decoding pixel data
    pub fn dimensions(path: &Path) -> Result<(u32, u32), DecodeError> {
        image::image_dimensions(path).map_err(|e| DecodeError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn decode_jpeg(path: &Path) -> Result<GrayImage, DecodeError> {
        let file_bytes = fs::read(path).map_err(|e| DecodeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::Luma);
        let mut decoder = JpegDecoder::new_with_options(&file_bytes, options);

        let pixels = decoder.decode().map_err(|e| DecodeError::Unreadable {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| DecodeError::Unreadable {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        if decoder.get_output_colorspace() != Some(ColorSpace::Luma) {
            return Self::decode_fallback(path);
        }

        GrayImage::from_raw(info.width as u32, info.height as u32, pixels).ok_or_else(|| {
            DecodeError::Unreadable {
                path: path.to_path_buf(),
                reason: "Failed to create Luma buffer".to_string(),
            }
        })
    }

    fn decode_fallback(path: &Path) -> Result<GrayImage, DecodeError> {
        image::open(path)
            .map(|image| image.to_luma8())
            .map_err(|e| DecodeError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
