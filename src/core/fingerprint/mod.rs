//! # Fingerprint Module
//!
//! Reduces an image to a short hexadecimal stamp.
//!
//! ## How It Works
//! 1. Convert to grayscale and downsample to a small grid (8x8) with
//!    linear interpolation
//! 2. Quantize every cell to a few levels (8 levels: `value / 32`)
//! 3. Sum each pair of horizontally adjacent cells into one hex symbol
//! 4. Record the mean and variance of those sums for clustering
//!
//! An 8x8 grid gives a 32-symbol fingerprint such as
//! `"0000123477776542..."`.
//!
//! ## Example
//! ```rust,ignore
//! use photo_stamp::core::fingerprint::{FingerprintConfig, Fingerprinter};
//!
//! let fingerprinter = Fingerprinter::new(FingerprintConfig::default())?;
//! let digest = fingerprinter.fingerprint_file(&path)?;
//! println!("{}", digest.fingerprint);
//! ```

mod digest;
pub mod fast_decode;
pub mod fast_resize;

pub use digest::{Digest, Fingerprint, ParseFingerprintError};
pub use fast_decode::FastDecoder;
pub use fast_resize::FastResizer;

use crate::error::{ConfigError, DecodeError};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest grid the fingerprinter accepts
const MAX_GRID_CELLS: u32 = 4096;

/// Grid and quantization settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Grid width in cells (must be even)
    pub grid_width: u32,
    /// Grid height in cells
    pub grid_height: u32,
    /// Number of quantization levels per cell
    pub levels: u8,
}

impl FingerprintConfig {
    pub fn new() -> Self {
        Self {
            grid_width: 8,
            grid_height: 8,
            levels: 8,
        }
    }

    pub fn grid(mut self, width: u32, height: u32) -> Self {
        self.grid_width = width;
        self.grid_height = height;
        self
    }

    pub fn levels(mut self, levels: u8) -> Self {
        self.levels = levels;
        self
    }

    /// Number of symbols every fingerprint will have
    pub fn fingerprint_len(&self) -> usize {
        (self.grid_width * self.grid_height / 2) as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width < 2 || self.grid_width % 2 != 0 {
            return Err(ConfigError::invalid(
                "grid_width",
                self.grid_width,
                "must be an even number of at least 2",
            ));
        }
        if self.grid_height == 0 {
            return Err(ConfigError::invalid(
                "grid_height",
                self.grid_height,
                "must be at least 1",
            ));
        }
        if self.grid_width.saturating_mul(self.grid_height) > MAX_GRID_CELLS {
            return Err(ConfigError::invalid(
                "grid",
                format!("{}x{}", self.grid_width, self.grid_height),
                "must have at most 4096 cells",
            ));
        }
        // Two adjacent levels must sum to a single hex digit
        if !(2..=8).contains(&self.levels) {
            return Err(ConfigError::invalid(
                "levels",
                self.levels,
                "must be between 2 and 8",
            ));
        }
        Ok(())
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes digests from grayscale images
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    config: FingerprintConfig,
}

impl Fingerprinter {
    pub fn new(config: FingerprintConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    /// Compute the digest of a decoded grayscale image.
    ///
    /// Pure: identical pixel data always yields an identical digest.
    pub fn fingerprint(&self, image: &GrayImage) -> Result<Digest, DecodeError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::NoPixels);
        }

        let (width, height) = (self.config.grid_width, self.config.grid_height);
        let levels = if image.dimensions() == (width, height) {
            self.quantize(image.as_raw())
        } else {
            let grid = fast_resize::resize_to_grid(image, width, height)?;
            self.quantize(grid.as_raw())
        };

        Ok(Digest::from_levels(&levels))
    }

    /// Decode a file and compute its digest.
    ///
    /// Also returns the original image dimensions.
    pub fn fingerprint_file(&self, path: &Path) -> Result<(Digest, (u32, u32)), DecodeError> {
        let image = FastDecoder::decode(path)?;
        let dimensions = image.dimensions();
        let digest = self.fingerprint(&image).map_err(|e| match e {
            DecodeError::NoPixels => DecodeError::EmptyImage {
                path: path.to_path_buf(),
            },
            other => other,
        })?;
        Ok((digest, dimensions))
    }

    fn quantize(&self, pixels: &[u8]) -> Vec<u8> {
        let levels = self.config.levels as u32;
        pixels
            .iter()
            .map(|&value| (value as u32 * levels / 256) as u8)
            .collect()
    }
}
