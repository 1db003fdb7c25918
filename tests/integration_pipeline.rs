//! Integration tests for the pipeline module.
//!
//! These tests verify end-to-end pipeline behavior including:
//! - Empty directories
//! - Nonexistent paths
//! - Corrupt files
//! - Identical and near-identical pictures on disk

use image::{GrayImage, Luma};
use photo_stamp::core::cluster::ClusterConfig;
use photo_stamp::core::comparator::MatchPolicy;
use photo_stamp::core::pipeline::Pipeline;
use photo_stamp::core::resolution::ResolutionRule;
use photo_stamp::StampError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Left-to-right gradient, darker towards the bottom
fn gradient(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let v = (x * 255 / width.max(1)) as i32 - (y * 64 / height.max(1)) as i32;
        Luma([v.clamp(0, 255) as u8])
    })
}

fn save(image: &GrayImage, path: &Path) {
    image.save(path).unwrap();
}

fn pipeline_for(dir: &Path) -> Pipeline {
    Pipeline::builder()
        .paths(vec![dir.to_path_buf()])
        .cluster(ClusterConfig {
            seed: Some(3),
            ..Default::default()
        })
        .build()
        .unwrap()
}

#[test]
fn pipeline_handles_empty_directory() {
    let temp_dir = TempDir::new().unwrap();

    let result = pipeline_for(temp_dir.path()).run().unwrap();

    assert!(result.records.is_empty());
    assert!(result.pairs.is_empty());
    assert!(result.decisions.is_empty());
}

#[test]
fn pipeline_handles_corrupt_file_gracefully() {
    let temp_dir = TempDir::new().unwrap();

    let corrupt_path = temp_dir.path().join("corrupt.jpg");
    let mut file = File::create(&corrupt_path).unwrap();
    file.write_all(b"this is not a valid image file").unwrap();
    drop(file);
    save(&gradient(40, 40), &temp_dir.path().join("fine.png"));

    // Should not panic - errors are captured, not fatal
    let result = pipeline_for(temp_dir.path()).run().unwrap();

    assert_eq!(result.records.len(), 2);
    assert!(result.records[0].digest.is_none());
    assert!(result.records[1].digest.is_some());
    assert!(matches!(result.errors[0], StampError::Decode(_)));
    assert!(result.pairs.is_empty());
}

#[test]
fn pipeline_handles_nonexistent_path() {
    let result = pipeline_for(Path::new("/nonexistent/path/that/does/not/exist"))
        .run()
        .unwrap();

    assert!(result.records.is_empty());
    assert!(matches!(result.errors[0], StampError::Scan(_)));
}

#[test]
fn identical_pictures_are_flagged_under_every_policy() {
    let temp_dir = TempDir::new().unwrap();
    save(&gradient(64, 48), &temp_dir.path().join("a.png"));
    save(&GrayImage::from_pixel(64, 48, Luma([0])), &temp_dir.path().join("b.png"));
    save(&gradient(64, 48), &temp_dir.path().join("c.png"));

    for policy in [
        MatchPolicy::Exact,
        MatchPolicy::threshold(),
        MatchPolicy::nearest_distance(),
    ] {
        let result = Pipeline::builder()
            .paths(vec![temp_dir.path().to_path_buf()])
            .policy(policy)
            .build()
            .unwrap()
            .run()
            .unwrap();

        let pairs: Vec<_> = result.pairs.iter().map(|p| (p.first, p.second)).collect();
        assert_eq!(pairs, vec![(0, 2)], "{}", policy);
    }
}

#[test]
fn keep_larger_marks_the_smaller_copy() {
    let temp_dir = TempDir::new().unwrap();
    save(&gradient(32, 32), &temp_dir.path().join("small.png"));
    // Same content at a larger size
    let big = image::imageops::resize(
        &gradient(32, 32),
        128,
        128,
        image::imageops::FilterType::Nearest,
    );
    save(&big, &temp_dir.path().join("big.png"));

    let result = pipeline_for(temp_dir.path()).run().unwrap();

    // big.png sorts first
    assert_eq!(result.records[0].path.file_name().unwrap(), "big.png");
    assert_eq!(result.pairs.len(), 1);
    assert_eq!(result.redundant(), vec![1]);
}

#[test]
fn keep_first_ignores_sizes() {
    let temp_dir = TempDir::new().unwrap();
    save(&gradient(16, 16), &temp_dir.path().join("a.png"));
    save(&gradient(16, 16), &temp_dir.path().join("b.png"));

    let result = Pipeline::builder()
        .paths(vec![temp_dir.path().to_path_buf()])
        .rule(ResolutionRule::KeepFirst)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.redundant(), vec![1]);
}

#[test]
fn records_expose_fingerprint_and_extension() {
    let temp_dir = TempDir::new().unwrap();
    save(&gradient(24, 24), &temp_dir.path().join("photo.PNG"));

    let result = pipeline_for(temp_dir.path()).run().unwrap();
    let record = &result.records[0];

    assert_eq!(record.extension, "PNG");
    assert_eq!(record.dimensions, Some((24, 24)));
    let fingerprint = record.digest.as_ref().unwrap().fingerprint.to_string();
    assert_eq!(fingerprint.len(), 32);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn repeated_runs_give_identical_fingerprints() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["a.png", "b.png", "c.png"] {
        save(&gradient(50, 30), &temp_dir.path().join(name));
    }

    let first = pipeline_for(temp_dir.path()).run().unwrap();
    let second = pipeline_for(temp_dir.path()).run().unwrap();

    let digests = |r: &photo_stamp::core::PipelineResult| {
        r.records.iter().map(|r| r.digest.clone()).collect::<Vec<_>>()
    };
    assert_eq!(digests(&first), digests(&second));
    assert_eq!(first.pairs, second.pairs);
}

#[test]
fn unknown_policy_is_rejected_before_any_work() {
    let err = "fuzzy".parse::<MatchPolicy>().unwrap_err();
    assert!(err.to_string().contains("fuzzy"));

    let err = Pipeline::builder()
        .paths(vec![PathBuf::from("/photos")])
        .cluster(ClusterConfig {
            max_clusters: 0,
            ..Default::default()
        })
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("max_clusters"));
}
