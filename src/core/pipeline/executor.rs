//! Pipeline execution implementation.

use crate::core::cluster::{Cluster, ClusterConfig, Clusterer, IndexedDigest};
use crate::core::comparator::{find_duplicate_pairs_with_events, DuplicatePair, MatchPolicy};
use crate::core::fingerprint::{Digest, FastDecoder, FingerprintConfig, Fingerprinter};
use crate::core::resolution::{redundant_indices, resolve_all, ResolutionDecision, ResolutionRule};
use crate::core::scanner::{PhotoFile, PhotoScanner, ScanConfig, WalkDirScanner};
use crate::error::{ConfigError, DecodeError, StampError};
use crate::events::{
    null_sender, ClusterEvent, Event, EventSender, FingerprintEvent, FingerprintProgress,
    PipelineEvent, PipelinePhase, PipelineSummary,
};
use image::GrayImage;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Everything known about one input photo
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRecord {
    /// Position in the enumeration order
    pub index: usize,
    /// Source file (empty for in-memory images)
    pub path: PathBuf,
    /// File extension without the dot (empty when unknown)
    pub extension: String,
    /// Width and height of the decoded image
    pub dimensions: Option<(u32, u32)>,
    /// Fingerprint and statistics; `None` when decoding failed
    pub digest: Option<Digest>,
    /// Cluster the photo was compared in
    pub cluster: Option<usize>,
}

impl ImageRecord {
    fn hole(index: usize, photo: Option<&PhotoFile>) -> Self {
        Self {
            index,
            path: photo.map(|p| p.path.clone()).unwrap_or_default(),
            extension: photo.map(|p| p.extension.clone()).unwrap_or_default(),
            dimensions: None,
            digest: None,
            cluster: None,
        }
    }
}

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// One record per input index, in index order
    pub records: Vec<ImageRecord>,
    /// Clusters used for comparison
    pub clusters: Vec<Cluster>,
    /// Duplicate pairs, cluster by cluster
    pub pairs: Vec<DuplicatePair>,
    /// One decision per resolved pair
    pub decisions: Vec<ResolutionDecision>,
    /// Errors encountered (non-fatal)
    pub errors: Vec<StampError>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Number of photos that produced a fingerprint
    pub fn fingerprinted(&self) -> usize {
        self.records.iter().filter(|r| r.digest.is_some()).count()
    }

    /// Distinct redundant photo indices
    pub fn redundant(&self) -> Vec<usize> {
        redundant_indices(&self.decisions)
    }

    /// Pairs that were found but could not be resolved
    pub fn unresolved(&self) -> Vec<DuplicatePair> {
        self.pairs
            .iter()
            .filter(|pair| !self.decisions.iter().any(|d| d.pair == **pair))
            .copied()
            .collect()
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Directories to scan
    pub paths: Vec<PathBuf>,
    /// Grid and quantization settings
    pub fingerprint: FingerprintConfig,
    /// Clustering settings
    pub cluster: ClusterConfig,
    /// How fingerprints are compared
    pub policy: MatchPolicy,
    /// Which member of a pair is redundant
    pub rule: ResolutionRule,
    /// Scanner configuration
    pub scan_config: ScanConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fingerprint.validate()?;
        self.cluster.validate()?;
        self.policy.validate()
    }
}

/// Builder for pipeline configuration
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add directories to scan
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    /// Set grid and quantization settings
    pub fn fingerprint(mut self, config: FingerprintConfig) -> Self {
        self.config.fingerprint = config;
        self
    }

    /// Set clustering settings
    pub fn cluster(mut self, config: ClusterConfig) -> Self {
        self.config.cluster = config;
        self
    }

    /// Set the comparison policy
    pub fn policy(mut self, policy: MatchPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Set the resolution rule
    pub fn rule(mut self, rule: ResolutionRule) -> Self {
        self.config.rule = rule;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        self.config.validate()?;
        Ok(Pipeline {
            fingerprinter: Fingerprinter::new(self.config.fingerprint)?,
            clusterer: Clusterer::new(self.config.cluster.clone())?,
            config: self.config,
        })
    }
}

/// The duplicate detection pipeline
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    fingerprinter: Fingerprinter,
    clusterer: Clusterer,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, StampError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<PipelineResult, StampError> {
        let start_time = Instant::now();
        let mut errors: Vec<StampError> = Vec::new();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        phase(events, PipelinePhase::Scanning);

        let scanner = WalkDirScanner::new(self.config.scan_config.clone());
        let scan_result = scanner.scan_with_events(&self.config.paths, events)?;
        errors.extend(scan_result.errors.into_iter().map(StampError::from));

        let photos = scan_result.photos;
        tracing::info!(photos = photos.len(), "scan finished");

        // Phase 2: Fingerprinting
        phase(events, PipelinePhase::Fingerprinting);
        events.send(Event::Fingerprint(FingerprintEvent::Started {
            total_photos: photos.len(),
        }));

        let completed = AtomicUsize::new(0);
        let outcomes: Vec<Result<(Digest, (u32, u32)), DecodeError>> = photos
            .par_iter()
            .map(|photo| {
                let outcome = self.fingerprinter.fingerprint_file(&photo.path);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;

                match &outcome {
                    Ok(_) => events.send(Event::Fingerprint(FingerprintEvent::Progress(
                        FingerprintProgress {
                            completed: done,
                            total: photos.len(),
                            current_path: photo.path.clone(),
                        },
                    ))),
                    Err(e) => events.send(Event::Fingerprint(FingerprintEvent::Error {
                        path: photo.path.clone(),
                        message: e.to_string(),
                    })),
                }

                outcome
            })
            .collect();

        let mut records = Vec::with_capacity(photos.len());
        for (index, (photo, outcome)) in photos.iter().zip(outcomes).enumerate() {
            match outcome {
                Ok((digest, dimensions)) => records.push(ImageRecord {
                    index,
                    path: photo.path.clone(),
                    extension: photo.extension.clone(),
                    dimensions: Some(dimensions),
                    digest: Some(digest),
                    cluster: None,
                }),
                Err(e) => {
                    tracing::warn!(path = %photo.path.display(), error = %e, "photo skipped");
                    errors.push(e.into());
                    records.push(ImageRecord::hole(index, Some(photo)));
                }
            }
        }

        Ok(self.analyze(records, errors, events, start_time))
    }

    /// Run the core stages on images the caller already decoded.
    ///
    /// Index `i` of the result refers to `images[i]`; `None` entries are
    /// decode holes and take no part in clustering.
    pub fn detect(&self, images: Vec<Option<GrayImage>>) -> PipelineResult {
        self.detect_with_events(images, &null_sender())
    }

    /// [`Pipeline::detect`] with event reporting
    pub fn detect_with_events(
        &self,
        images: Vec<Option<GrayImage>>,
        events: &EventSender,
    ) -> PipelineResult {
        let start_time = Instant::now();
        let mut errors: Vec<StampError> = Vec::new();

        events.send(Event::Pipeline(PipelineEvent::Started));
        phase(events, PipelinePhase::Fingerprinting);
        events.send(Event::Fingerprint(FingerprintEvent::Started {
            total_photos: images.len(),
        }));

        let outcomes: Vec<Option<Result<Digest, DecodeError>>> = images
            .par_iter()
            .enumerate()
            .map(|(index, image)| {
                image.as_ref().map(|img| {
                    self.fingerprinter.fingerprint(img).map_err(|e| match e {
                        DecodeError::NoPixels => DecodeError::EmptyFrame { index },
                        other => other,
                    })
                })
            })
            .collect();

        let mut records = Vec::with_capacity(images.len());
        for (index, (image, outcome)) in images.iter().zip(outcomes).enumerate() {
            match (image, outcome) {
                (Some(image), Some(Ok(digest))) => records.push(ImageRecord {
                    index,
                    path: PathBuf::new(),
                    extension: String::new(),
                    dimensions: Some(image.dimensions()),
                    digest: Some(digest),
                    cluster: None,
                }),
                (_, Some(Err(e))) => {
                    tracing::warn!(index, error = %e, "image skipped");
                    errors.push(e.into());
                    records.push(ImageRecord::hole(index, None));
                }
                _ => records.push(ImageRecord::hole(index, None)),
            }
        }

        self.analyze(records, errors, events, start_time)
    }

    /// Cluster, compare and resolve fingerprinted records
    fn analyze(
        &self,
        mut records: Vec<ImageRecord>,
        mut errors: Vec<StampError>,
        events: &EventSender,
        start_time: Instant,
    ) -> PipelineResult {
        let digests: Vec<IndexedDigest> = records
            .iter()
            .filter_map(|r| {
                r.digest.as_ref().map(|digest| IndexedDigest {
                    index: r.index,
                    digest: digest.clone(),
                })
            })
            .collect();

        let fingerprinted = digests.len();
        events.send(Event::Fingerprint(FingerprintEvent::Completed {
            fingerprinted,
            failed: records.len() - fingerprinted,
        }));
        tracing::info!(
            fingerprinted,
            failed = records.len() - fingerprinted,
            "fingerprinting finished"
        );

        // Phase 3: Clustering
        phase(events, PipelinePhase::Clustering);
        events.send(Event::Cluster(ClusterEvent::Started {
            total_digests: fingerprinted,
            clusters: self.clusterer.config().cluster_count(fingerprinted),
        }));

        let clusters = self.clusterer.classify(&digests);
        for cluster in &clusters {
            for member in &cluster.members {
                records[member.index].cluster = Some(cluster.id);
            }
        }

        events.send(Event::Cluster(ClusterEvent::Completed {
            cluster_sizes: clusters.iter().map(Cluster::len).collect(),
        }));
        tracing::info!(clusters = clusters.len(), "clustering finished");

        // Phase 4: Comparing
        phase(events, PipelinePhase::Comparing);
        let pairs = find_duplicate_pairs_with_events(&clusters, &self.config.policy, events);
        tracing::info!(pairs = pairs.len(), policy = %self.config.policy, "comparison finished");

        // Phase 5: Resolving
        phase(events, PipelinePhase::Resolving);
        let lookup = |index: usize| -> Result<u64, DecodeError> {
            let record = &records[index];
            let (width, height) = match record.dimensions {
                Some(dimensions) => dimensions,
                None => FastDecoder::dimensions(&record.path)?,
            };
            Ok(width as u64 * height as u64)
        };
        let (decisions, resolve_errors) = resolve_all(&pairs, &lookup, self.config.rule);
        errors.extend(resolve_errors.into_iter().map(StampError::from));

        let redundant_photos = redundant_indices(&decisions).len();
        let duration_ms = start_time.elapsed().as_millis() as u64;

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_photos: records.len(),
                fingerprinted,
                clusters: clusters.len(),
                duplicate_pairs: pairs.len(),
                redundant_photos,
                duration_ms,
            },
        }));

        PipelineResult {
            records,
            clusters,
            pairs,
            decisions,
            errors,
            duration_ms,
        }
    }
}

fn phase(events: &EventSender, phase: PipelinePhase) {
    events.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use image::Luma;
    use tempfile::TempDir;

    fn solid(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    fn seeded() -> Pipeline {
        Pipeline::builder()
            .cluster(ClusterConfig {
                seed: Some(11),
                ..Default::default()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn builder_rejects_invalid_grid() {
        let result = Pipeline::builder()
            .fingerprint(FingerprintConfig::new().grid(3, 8))
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "grid_width", .. })
        ));
    }

    #[test]
    fn builder_rejects_invalid_similarity() {
        let result = Pipeline::builder()
            .policy(MatchPolicy::threshold().with_percent(0))
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn builder_keeps_settings() {
        let pipeline = Pipeline::builder()
            .paths(vec![PathBuf::from("/photos")])
            .policy(MatchPolicy::Exact)
            .rule(ResolutionRule::KeepFirst)
            .include_hidden(true)
            .build()
            .unwrap();

        assert_eq!(pipeline.config().policy, MatchPolicy::Exact);
        assert_eq!(pipeline.config().rule, ResolutionRule::KeepFirst);
        assert!(pipeline.config().scan_config.include_hidden);
    }

    #[test]
    fn no_images_gives_empty_result() {
        let result = seeded().detect(Vec::new());

        assert!(result.records.is_empty());
        assert!(result.clusters.is_empty());
        assert!(result.pairs.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn identical_images_are_paired_and_resolved() {
        let images = vec![
            Some(solid(64, 64, 128)),
            Some(solid(8, 8, 0)),
            Some(solid(32, 32, 128)),
        ];

        let result = seeded().detect(images);

        assert_eq!(result.pairs.len(), 1);
        assert_eq!((result.pairs[0].first, result.pairs[0].second), (0, 2));
        // Keep larger: 32x32 is redundant
        assert_eq!(result.redundant(), vec![2]);
    }

    #[test]
    fn decode_holes_are_left_out() {
        let images = vec![Some(solid(8, 8, 200)), None, Some(solid(8, 8, 200))];

        let result = seeded().detect(images);

        assert_eq!(result.records.len(), 3);
        assert!(result.records[1].digest.is_none());
        assert!(result.records[1].cluster.is_none());
        assert_eq!(result.fingerprinted(), 2);
        assert!(result
            .clusters
            .iter()
            .all(|c| c.members.iter().all(|m| m.index != 1)));
        assert_eq!(result.pairs.len(), 1);
    }

    #[test]
    fn empty_image_is_reported_not_fatal() {
        let images = vec![Some(GrayImage::new(0, 0)), Some(solid(8, 8, 10))];

        let result = seeded().detect(images);

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.fingerprinted(), 1);
    }

    #[test]
    fn pairs_without_a_decision_are_unresolved() {
        let pair = |first, second| DuplicatePair {
            first,
            second,
            cluster: 0,
            score: 64,
        };
        let result = PipelineResult {
            records: Vec::new(),
            clusters: Vec::new(),
            pairs: vec![pair(0, 1), pair(2, 3)],
            decisions: vec![ResolutionDecision {
                pair: pair(0, 1),
                redundant: 1,
            }],
            errors: Vec::new(),
            duration_ms: 0,
        };

        assert_eq!(result.unresolved(), vec![pair(2, 3)]);
        assert!(seeded().detect(vec![Some(solid(8, 8, 1))]).unresolved().is_empty());
    }

    #[test]
    fn empty_in_memory_image_names_its_index() {
        let images = vec![Some(solid(8, 8, 10)), None, Some(GrayImage::new(0, 4))];

        let result = seeded().detect(images);

        assert!(matches!(
            result.errors[0],
            StampError::Decode(DecodeError::EmptyFrame { index: 2 })
        ));
        assert_eq!(result.errors[0].to_string(), "Decode error: Image 2 has no pixel data");
    }

    #[test]
    fn every_fingerprinted_record_has_a_cluster() {
        let images: Vec<_> = (0..30u8).map(|v| Some(solid(8, 8, v * 8))).collect();

        let result = seeded().detect(images);

        assert!(result.records.iter().all(|r| r.cluster.is_some()));
        assert_eq!(result.clusters.len(), 3);
    }

    #[test]
    fn run_handles_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let result = Pipeline::builder()
            .paths(vec![temp_dir.path().to_path_buf()])
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert!(result.records.is_empty());
        assert!(result.pairs.is_empty());
    }

    #[test]
    fn run_reports_phases_in_order() {
        let temp_dir = TempDir::new().unwrap();
        solid(16, 16, 90).save(temp_dir.path().join("a.png")).unwrap();
        solid(16, 16, 90).save(temp_dir.path().join("b.png")).unwrap();

        let (sender, receiver) = EventChannel::new();
        let result = Pipeline::builder()
            .paths(vec![temp_dir.path().to_path_buf()])
            .build()
            .unwrap()
            .run_with_events(&sender)
            .unwrap();
        drop(sender);

        let phases: Vec<_> = receiver
            .iter()
            .filter_map(|e| match e {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => Some(phase),
                _ => None,
            })
            .collect();

        assert_eq!(
            phases,
            vec![
                PipelinePhase::Scanning,
                PipelinePhase::Fingerprinting,
                PipelinePhase::Clustering,
                PipelinePhase::Comparing,
                PipelinePhase::Resolving,
            ]
        );
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.records[0].extension, "png");
    }
}
