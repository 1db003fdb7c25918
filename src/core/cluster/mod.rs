//! # Cluster Module
//!
//! Splits the collection into a few buckets so that only photos in the same
//! bucket are compared.
//!
//! Photos are grouped by the variance of their fingerprint with k-means on
//! that single value. Two photos that land in different buckets are never
//! compared, trading a little recall for far fewer comparisons.
//!
//! Initial centers are random, so bucket ids (and, for borderline photos,
//! bucket membership) can differ between runs unless a seed is configured.
//! Within one run every photo belongs to exactly one bucket.

mod kmeans;

pub use kmeans::{KMeans, KMeansFit};

use crate::core::fingerprint::{Digest, Fingerprint};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Upper bound for `max_clusters`
pub const HARD_MAX_CLUSTERS: usize = 64;

/// Clustering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Never use more clusters than this
    pub max_clusters: usize,
    /// Aim for roughly this many photos per cluster
    pub group_size: usize,
    /// Independent k-means runs; the most compact one wins
    pub attempts: usize,
    /// Iteration cap per run
    pub max_iterations: usize,
    /// Center movement below which a run has converged
    pub epsilon: f64,
    /// Fixed seed for reproducible clustering
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_clusters: 10,
            group_size: 10,
            attempts: 3,
            max_iterations: 10,
            epsilon: 0.5,
            seed: None,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=HARD_MAX_CLUSTERS).contains(&self.max_clusters) {
            return Err(ConfigError::invalid(
                "max_clusters",
                self.max_clusters,
                "must be between 1 and 64",
            ));
        }
        if self.group_size == 0 {
            return Err(ConfigError::invalid("group_size", 0, "must be at least 1"));
        }
        if self.attempts == 0 {
            return Err(ConfigError::invalid("attempts", 0, "must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::invalid(
                "max_iterations",
                0,
                "must be at least 1",
            ));
        }
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return Err(ConfigError::invalid(
                "epsilon",
                self.epsilon,
                "must be zero or positive",
            ));
        }
        Ok(())
    }

    /// Number of clusters used for `count` digests
    pub fn cluster_count(&self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        (count / self.group_size).clamp(1, self.max_clusters.min(HARD_MAX_CLUSTERS))
    }
}

/// A digest tagged with the index of the photo it came from
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDigest {
    pub index: usize,
    pub digest: Digest,
}

/// A photo inside a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub index: usize,
    pub fingerprint: Fingerprint,
}

/// One bucket of photos with similar fingerprint variance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: usize,
    /// Members in ascending index order; may be empty
    pub members: Vec<ClusterMember>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of pairwise comparisons this cluster needs
    pub fn comparisons(&self) -> usize {
        let n = self.members.len();
        n * n.saturating_sub(1) / 2
    }
}

/// Partitions digests into clusters
#[derive(Debug, Clone)]
pub struct Clusterer {
    config: ClusterConfig,
}

impl Clusterer {
    pub fn new(config: ClusterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Group digests by variance.
    ///
    /// Every input index ends up in exactly one cluster. No input gives no
    /// clusters.
    pub fn classify(&self, digests: &[IndexedDigest]) -> Vec<Cluster> {
        let k = self.config.cluster_count(digests.len());
        if k == 0 {
            return Vec::new();
        }

        let points: Vec<f64> = digests.iter().map(|d| d.digest.variance as f64).collect();
        let fit = KMeans::new(k)
            .attempts(self.config.attempts)
            .max_iterations(self.config.max_iterations)
            .epsilon(self.config.epsilon)
            .seed(self.config.seed)
            .fit(&points);

        let mut clusters: Vec<Cluster> = (0..k)
            .map(|id| Cluster {
                id,
                members: Vec::new(),
            })
            .collect();

        for (entry, &label) in digests.iter().zip(&fit.labels) {
            clusters[label].members.push(ClusterMember {
                index: entry.index,
                fingerprint: entry.digest.fingerprint.clone(),
            });
        }

        for cluster in &mut clusters {
            cluster.members.sort_by_key(|m| m.index);
            tracing::debug!(cluster = cluster.id, size = cluster.len(), "cluster built");
        }

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn digest(index: usize, fingerprint: &str, variance: f32) -> IndexedDigest {
        IndexedDigest {
            index,
            digest: Digest {
                fingerprint: fingerprint.parse().unwrap(),
                mean: 0,
                variance,
            },
        }
    }

    fn seeded() -> Clusterer {
        Clusterer::new(ClusterConfig {
            seed: Some(5),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn cluster_count_follows_group_size_and_cap() {
        let config = ClusterConfig::default();
        assert_eq!(config.cluster_count(0), 0);
        assert_eq!(config.cluster_count(3), 1);
        assert_eq!(config.cluster_count(25), 2);
        assert_eq!(config.cluster_count(99), 9);
        assert_eq!(config.cluster_count(10_000), 10);
    }

    #[test]
    fn config_rejects_cap_above_hard_limit() {
        let config = ClusterConfig {
            max_clusters: HARD_MAX_CLUSTERS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_zero_group_size() {
        let config = ClusterConfig {
            group_size: 0,
            ..Default::default()
        };
        assert!(Clusterer::new(config).is_err());
    }

    #[test]
    fn empty_input_gives_no_clusters() {
        assert!(seeded().classify(&[]).is_empty());
    }

    #[test]
    fn every_index_lands_in_exactly_one_cluster() {
        let digests: Vec<_> = (0..57)
            .map(|i| digest(i * 2, "0123", ((i * 13) % 17) as f32))
            .collect();

        let clusters = seeded().classify(&digests);
        assert_eq!(clusters.len(), 5);

        let mut seen = HashSet::new();
        for cluster in &clusters {
            for member in &cluster.members {
                assert!(seen.insert(member.index), "index {} seen twice", member.index);
            }
        }
        let expected: HashSet<_> = digests.iter().map(|d| d.index).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn members_are_sorted_by_index() {
        let digests = vec![
            digest(9, "00", 1.0),
            digest(2, "00", 1.0),
            digest(5, "00", 1.0),
        ];

        let clusters = seeded().classify(&digests);
        let indices: Vec<_> = clusters[0].members.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![2, 5, 9]);
    }

    #[test]
    fn equal_variance_shares_a_cluster() {
        let mut digests: Vec<_> = (0..40).map(|i| digest(i, "11", i as f32)).collect();
        digests.push(digest(40, "11", 17.0));

        let clusters = seeded().classify(&digests);
        let cluster_of = |index: usize| {
            clusters
                .iter()
                .find(|c| c.members.iter().any(|m| m.index == index))
                .map(|c| c.id)
        };
        assert_eq!(cluster_of(17), cluster_of(40));
    }

    #[test]
    fn comparisons_count_unordered_pairs() {
        let cluster = Cluster {
            id: 0,
            members: (0..5)
                .map(|index| ClusterMember {
                    index,
                    fingerprint: "0".parse().unwrap(),
                })
                .collect(),
        };
        assert_eq!(cluster.comparisons(), 10);
    }
}
