//! # Error Module
//!
//! Error types for the stamp-based duplicate finder.
//!
//! ## Propagation
//! - **Per-image decode failures** are recovered: the image is left out of
//!   clustering and matching, and the failure is reported in the result
//! - **Configuration errors** are fatal and raised before any work starts
//! - **File actions** collect one error per file and keep going

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum StampError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File action error: {0}")]
    Action(#[from] ActionError),

    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Errors that occur during photo scanning
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while turning a file into a grayscale grid
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode image {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Image has no pixel data: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Image {index} has no pixel data")]
    EmptyFrame { index: usize },

    #[error("Image has no pixel data")]
    NoPixels,

    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Resize failed: {0}")]
    Resize(String),
}

/// Invalid or unrecognized configuration values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown comparison policy '{0}' (expected exact, threshold or nearest)")]
    UnknownPolicy(String),

    #[error(
        "Unknown resolution rule '{0}' (expected keep-first, keep-last, keep-larger or keep-smaller)"
    )]
    UnknownRule(String),

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        field: &'static str,
        value: impl ToString,
        reason: &'static str,
    ) -> Self {
        ConfigError::InvalidValue {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

/// Errors from deleting or renaming files on disk
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to overwrite existing file: {path}")]
    TargetExists { path: PathBuf },

    #[error("Source file not found: {path}")]
    SourceMissing { path: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, StampError>;
