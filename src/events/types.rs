//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the stamp pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Fingerprinting phase events
    Fingerprint(FingerprintEvent),
    /// Clustering phase events
    Cluster(ClusterEvent),
    /// Comparison phase events
    Compare(CompareEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { paths: Vec<PathBuf> },
    /// A photo was found
    PhotoFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_photos: usize },
}

/// Events during the fingerprinting phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FingerprintEvent {
    /// Fingerprinting has started
    Started { total_photos: usize },
    /// Progress update during fingerprinting
    Progress(FingerprintProgress),
    /// A photo could not be decoded and was left out
    Error { path: PathBuf, message: String },
    /// Fingerprinting completed
    Completed { fingerprinted: usize, failed: usize },
}

/// Progress information during fingerprinting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintProgress {
    /// Number of photos processed so far
    pub completed: usize,
    /// Total number of photos to process
    pub total: usize,
    /// Photo that was just processed
    pub current_path: PathBuf,
}

/// Events during the clustering phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClusterEvent {
    /// Clustering has started
    Started { total_digests: usize, clusters: usize },
    /// Clustering completed
    Completed { cluster_sizes: Vec<usize> },
}

/// Events during the comparison phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Comparison has started
    Started { total_comparisons: usize },
    /// One cluster has been fully compared
    ClusterCompared { cluster: usize, pairs_found: usize },
    /// Comparison completed
    Completed { total_pairs: usize },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Fingerprinting,
    Clustering,
    Comparing,
    Resolving,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Total photos found by the scanner
    pub total_photos: usize,
    /// Photos that produced a fingerprint
    pub fingerprinted: usize,
    /// Number of clusters used for comparison
    pub clusters: usize,
    /// Number of duplicate pairs found
    pub duplicate_pairs: usize,
    /// Number of distinct photos marked redundant
    pub redundant_photos: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Fingerprinting => write!(f, "Fingerprinting"),
            PipelinePhase::Clustering => write!(f, "Clustering"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
            PipelinePhase::Resolving => write!(f, "Resolving"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Fingerprint(FingerprintEvent::Progress(FingerprintProgress {
            completed: 10,
            total: 50,
            current_path: PathBuf::from("/photos/a.jpg"),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Fingerprint(FingerprintEvent::Progress(p)) => {
                assert_eq!(p.total, 50);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn pipeline_summary_is_serializable() {
        let summary = PipelineSummary {
            total_photos: 1000,
            fingerprinted: 998,
            clusters: 10,
            duplicate_pairs: 37,
            redundant_photos: 30,
            duration_ms: 5000,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"duplicate_pairs\":37"));
    }

    #[test]
    fn phase_display() {
        assert_eq!(PipelinePhase::Clustering.to_string(), "Clustering");
    }
}
