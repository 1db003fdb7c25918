//! # Photo Stamp
//!
//! Finds near-duplicate pictures by comparing short "stamps" of their
//! pixel content.
//!
//! Every picture is reduced to a tiny grayscale grid, quantized and encoded
//! as a hexadecimal fingerprint. Fingerprints are bucketed by their variance
//! and compared within each bucket, and a resolution rule marks one photo of
//! every duplicate pair as redundant.
//!
//! ## Architecture
//! - `core` - The duplicate detection engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//!
//! ## Example
//! ```no_run
//! use photo_stamp::core::{MatchPolicy, Pipeline, ResolutionRule};
//!
//! let pipeline = Pipeline::builder()
//!     .paths(vec!["/photos".into()])
//!     .policy(MatchPolicy::nearest_distance())
//!     .rule(ResolutionRule::KeepLarger)
//!     .build()?;
//!
//! let result = pipeline.run()?;
//! for decision in &result.decisions {
//!     println!("{}", result.records[decision.redundant].path.display());
//! }
//! # Ok::<(), photo_stamp::StampError>(())
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, StampError};

/// Initialize tracing for the library
///
/// `RUST_LOG` takes precedence; otherwise `default_level` is used.
/// This should be called by the application entry point.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
