//! # Core Module
//!
//! The GUI-agnostic duplicate detection engine.
//!
//! ## Modules
//! - `scanner` - Discovers photos in directories
//! - `fingerprint` - Turns a grayscale image into a fingerprint and statistics
//! - `cluster` - Buckets fingerprints by variance
//! - `comparator` - Finds duplicate pairs inside each bucket
//! - `resolution` - Picks the redundant photo of each pair
//! - `actions` - Deletes or renames files on disk
//! - `pipeline` - Orchestrates the full workflow

pub mod actions;
pub mod cluster;
pub mod comparator;
pub mod fingerprint;
pub mod pipeline;
pub mod resolution;
pub mod scanner;

// Re-export commonly used types
pub use cluster::{Cluster, ClusterConfig, Clusterer};
pub use comparator::{DuplicatePair, MatchPolicy};
pub use fingerprint::{Digest, Fingerprint, FingerprintConfig, Fingerprinter};
pub use pipeline::{ImageRecord, Pipeline, PipelineResult};
pub use resolution::{ResolutionDecision, ResolutionRule};
pub use scanner::PhotoFile;
