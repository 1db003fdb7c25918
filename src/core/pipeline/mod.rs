//! # Pipeline Module
//!
//! Orchestrates the full duplicate detection workflow.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Discover all photos in the specified directories
//! 2. **Fingerprint** - Decode, downsample and quantize every photo
//! 3. **Cluster** - Bucket fingerprints by variance
//! 4. **Compare** - Find duplicate pairs inside each bucket
//! 5. **Resolve** - Mark one photo of each pair as redundant
//!
//! A photo that cannot be decoded is reported and left out; the run
//! carries on with the rest.
//!
//! ## Parallelism
//! Uses rayon for fingerprinting and for comparing clusters. Results are
//! collected in input order, so parallelism never changes the output.

mod executor;

pub use executor::{
    ImageRecord, Pipeline, PipelineBuilder, PipelineConfig, PipelineResult,
};
