//! # Comparator Module
//!
//! Finds duplicate pairs by comparing fingerprints inside each cluster.
//!
//! ## How It Works
//! 1. For every cluster, compare each unordered pair of members
//! 2. Apply the selected [`MatchPolicy`]
//! 3. Emit pairs in ascending `(first, second)` order within a cluster,
//!    clusters in id order
//!
//! ## Policies
//! | Policy | Duplicate when (32 symbols) |
//! |--------|-----------------------------|
//! | Exact | all 32 symbols equal |
//! | Threshold | at least 25 symbols equal |
//! | Nearest distance | more than 51 votes out of 64 |

mod policy;

pub use policy::{MatchPolicy, DEFAULT_SIMILARITY_PERCENT};

use crate::core::cluster::Cluster;
use crate::events::{CompareEvent, Event, EventSender};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Two photos flagged as near-duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// Lower index of the pair
    pub first: usize,
    /// Higher index of the pair
    pub second: usize,
    /// Cluster both photos belong to
    pub cluster: usize,
    /// Policy score (equal symbols or votes)
    pub score: u32,
}

/// Compare all members of one cluster
pub fn compare_cluster(cluster: &Cluster, policy: &MatchPolicy) -> Vec<DuplicatePair> {
    let members = &cluster.members;
    let mut pairs = Vec::new();

    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            let (a, b) = (&members[i], &members[j]);

            if policy.is_duplicate(&a.fingerprint, &b.fingerprint) {
                pairs.push(DuplicatePair {
                    first: a.index.min(b.index),
                    second: a.index.max(b.index),
                    cluster: cluster.id,
                    score: policy.score(&a.fingerprint, &b.fingerprint),
                });
            }
        }
    }

    pairs
}

/// Find all duplicate pairs across clusters.
///
/// Clusters are compared in parallel; the output order only depends on
/// cluster membership.
pub fn find_duplicate_pairs(clusters: &[Cluster], policy: &MatchPolicy) -> Vec<DuplicatePair> {
    clusters
        .par_iter()
        .map(|cluster| compare_cluster(cluster, policy))
        .collect::<Vec<_>>()
        .concat()
}

/// Find all duplicate pairs, reporting one event per cluster
pub fn find_duplicate_pairs_with_events(
    clusters: &[Cluster],
    policy: &MatchPolicy,
    events: &EventSender,
) -> Vec<DuplicatePair> {
    let total_comparisons = clusters.iter().map(Cluster::comparisons).sum();
    events.send(Event::Compare(CompareEvent::Started { total_comparisons }));

    let per_cluster: Vec<Vec<DuplicatePair>> = clusters
        .par_iter()
        .map(|cluster| {
            let pairs = compare_cluster(cluster, policy);
            events.send(Event::Compare(CompareEvent::ClusterCompared {
                cluster: cluster.id,
                pairs_found: pairs.len(),
            }));
            pairs
        })
        .collect();

    let pairs = per_cluster.concat();

    events.send(Event::Compare(CompareEvent::Completed {
        total_pairs: pairs.len(),
    }));

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cluster::ClusterMember;
    use crate::events::EventChannel;

    fn cluster(id: usize, members: &[(usize, &str)]) -> Cluster {
        Cluster {
            id,
            members: members
                .iter()
                .map(|&(index, fp)| ClusterMember {
                    index,
                    fingerprint: fp.parse().unwrap(),
                })
                .collect(),
        }
    }

    #[test]
    fn empty_clusters_give_no_pairs() {
        let pairs = find_duplicate_pairs(&[cluster(0, &[])], &MatchPolicy::default());
        assert!(pairs.is_empty());
    }

    #[test]
    fn single_member_gives_no_pairs() {
        let pairs = find_duplicate_pairs(&[cluster(0, &[(4, "0000")])], &MatchPolicy::Exact);
        assert!(pairs.is_empty());
    }

    #[test]
    fn exact_policy_pairs_identical_fingerprints() {
        let clusters = [cluster(0, &[(0, "1234"), (1, "1234"), (2, "1235")])];
        let pairs = find_duplicate_pairs(&clusters, &MatchPolicy::Exact);

        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].first, pairs[0].second), (0, 1));
        assert_eq!(pairs[0].score, 4);
    }

    #[test]
    fn pairs_come_out_in_ascending_order() {
        let clusters = [
            cluster(0, &[(1, "aaaa"), (4, "aaaa"), (6, "aaaa")]),
            cluster(1, &[(0, "3333"), (2, "3333")]),
        ];
        let pairs = find_duplicate_pairs(&clusters, &MatchPolicy::Exact);

        let order: Vec<_> = pairs.iter().map(|p| (p.cluster, p.first, p.second)).collect();
        assert_eq!(order, vec![(0, 1, 4), (0, 1, 6), (0, 4, 6), (1, 0, 2)]);
    }

    #[test]
    fn photos_in_different_clusters_are_never_compared() {
        let clusters = [cluster(0, &[(0, "7777")]), cluster(1, &[(1, "7777")])];
        assert!(find_duplicate_pairs(&clusters, &MatchPolicy::Exact).is_empty());
    }

    #[test]
    fn pair_members_are_distinct() {
        let clusters = [cluster(0, &[(3, "00"), (5, "00"), (8, "01")])];
        for pair in find_duplicate_pairs(&clusters, &MatchPolicy::nearest_distance()) {
            assert!(pair.first < pair.second);
        }
    }

    #[test]
    fn events_bracket_the_comparison() {
        let (sender, receiver) = EventChannel::new();
        let clusters = [
            cluster(0, &[(0, "00"), (1, "00")]),
            cluster(1, &[(2, "11"), (3, "ee")]),
        ];

        let pairs =
            find_duplicate_pairs_with_events(&clusters, &MatchPolicy::Exact, &sender);
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        assert_eq!(pairs.len(), 1);
        assert!(matches!(
            events.first(),
            Some(Event::Compare(CompareEvent::Started { total_comparisons: 2 }))
        ));
        assert!(matches!(
            events.last(),
            Some(Event::Compare(CompareEvent::Completed { total_pairs: 1 }))
        ));
        assert_eq!(events.len(), 4);
    }
}
