//! # Scanner Module
//!
//! Enumerates picture files under the configured roots.
//!
//! The order in which files are returned defines the index space used by
//! every later stage (index 0 is the first file returned), so the walk is
//! sorted by file name.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - BMP (.bmp)
//! - GIF (.gif)
//! - TIFF (.tiff, .tif)
//! - WebP (.webp)

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A discovered picture file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoFile {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Extension exactly as it appears in the file name (no leading dot)
    pub extension: String,
}

impl PhotoFile {
    /// Build a record for a path, reading the extension from the file name
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        Self {
            path,
            size,
            extension,
        }
    }
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Discovered photos in index order
    pub photos: Vec<PhotoFile>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for photo scanners
///
/// Implement this trait to feed the pipeline from somewhere other than
/// the local filesystem.
pub trait PhotoScanner: Send + Sync {
    /// Scan directories and return discovered photos
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError>;

    /// Scan with progress reporting via events
    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError>;
}
