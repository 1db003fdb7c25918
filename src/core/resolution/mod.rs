//! # Resolution Module
//!
//! Decides which photo of a duplicate pair is redundant.
//!
//! | Rule | Redundant member | Tie |
//! |------|------------------|-----|
//! | KeepFirst | `second` | - |
//! | KeepLast | `first` | - |
//! | KeepLarger | fewer pixels | `second` |
//! | KeepSmaller | more pixels | `first` |
//!
//! Only decisions are made here; deleting files is up to the caller.

use crate::core::comparator::DuplicatePair;
use crate::error::{ConfigError, DecodeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which member of a pair to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionRule {
    KeepFirst,
    KeepLast,
    #[default]
    KeepLarger,
    KeepSmaller,
}

impl ResolutionRule {
    /// Whether this rule needs image sizes
    pub fn needs_sizes(&self) -> bool {
        matches!(self, ResolutionRule::KeepLarger | ResolutionRule::KeepSmaller)
    }
}

impl fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionRule::KeepFirst => write!(f, "keep-first"),
            ResolutionRule::KeepLast => write!(f, "keep-last"),
            ResolutionRule::KeepLarger => write!(f, "keep-larger"),
            ResolutionRule::KeepSmaller => write!(f, "keep-smaller"),
        }
    }
}

impl FromStr for ResolutionRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace('_', "-");
        match name.strip_prefix("keep-").unwrap_or(&name) {
            "first" => Ok(ResolutionRule::KeepFirst),
            "last" => Ok(ResolutionRule::KeepLast),
            "larger" | "large" => Ok(ResolutionRule::KeepLarger),
            "smaller" | "small" => Ok(ResolutionRule::KeepSmaller),
            _ => Err(ConfigError::UnknownRule(s.to_string())),
        }
    }
}

/// Source of total pixel counts by photo index
pub trait SizeLookup {
    fn pixel_count(&self, index: usize) -> Result<u64, DecodeError>;
}

impl<F> SizeLookup for F
where
    F: Fn(usize) -> Result<u64, DecodeError>,
{
    fn pixel_count(&self, index: usize) -> Result<u64, DecodeError> {
        self(index)
    }
}

/// The redundant member of one duplicate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionDecision {
    pub pair: DuplicatePair,
    pub redundant: usize,
}

/// Pick the redundant index of a pair.
///
/// `sizes` is only consulted by the size-based rules.
pub fn resolve(
    pair: &DuplicatePair,
    sizes: &dyn SizeLookup,
    rule: ResolutionRule,
) -> Result<usize, DecodeError> {
    Ok(match rule {
        ResolutionRule::KeepLast => pair.first,
        ResolutionRule::KeepFirst => pair.second,
        ResolutionRule::KeepLarger => {
            let (first, second) = (sizes.pixel_count(pair.first)?, sizes.pixel_count(pair.second)?);
            if first < second {
                pair.first
            } else {
                pair.second
            }
        }
        ResolutionRule::KeepSmaller => {
            let (first, second) = (sizes.pixel_count(pair.first)?, sizes.pixel_count(pair.second)?);
            if second > first {
                pair.second
            } else {
                pair.first
            }
        }
    })
}

/// Resolve every pair.
///
/// Pairs whose sizes cannot be read are skipped and returned as errors.
pub fn resolve_all(
    pairs: &[DuplicatePair],
    sizes: &dyn SizeLookup,
    rule: ResolutionRule,
) -> (Vec<ResolutionDecision>, Vec<DecodeError>) {
    let mut decisions = Vec::with_capacity(pairs.len());
    let mut errors = Vec::new();

    for pair in pairs {
        match resolve(pair, sizes, rule) {
            Ok(redundant) => decisions.push(ResolutionDecision {
                pair: *pair,
                redundant,
            }),
            Err(e) => errors.push(e),
        }
    }

    (decisions, errors)
}

/// Distinct redundant indices in first-decision order
pub fn redundant_indices(decisions: &[ResolutionDecision]) -> Vec<usize> {
    let mut seen = std::collections::HashSet::new();
    decisions
        .iter()
        .map(|d| d.redundant)
        .filter(|index| seen.insert(*index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pair(first: usize, second: usize) -> DuplicatePair {
        DuplicatePair {
            first,
            second,
            cluster: 0,
            score: 64,
        }
    }

    fn sizes(table: &'static [u64]) -> impl Fn(usize) -> Result<u64, DecodeError> {
        move |index| Ok(table[index])
    }

    fn never_called(_: usize) -> Result<u64, DecodeError> {
        panic!("size lookup should not run for order-based rules")
    }

    #[test]
    fn order_rules_skip_size_lookup() {
        let p = pair(2, 5);
        assert_eq!(resolve(&p, &never_called, ResolutionRule::KeepFirst).unwrap(), 5);
        assert_eq!(resolve(&p, &never_called, ResolutionRule::KeepLast).unwrap(), 2);
    }

    #[test]
    fn keep_larger_marks_smaller_image() {
        let lookup = sizes(&[0, 0, 100, 0, 0, 400]);
        assert_eq!(resolve(&pair(2, 5), &lookup, ResolutionRule::KeepLarger).unwrap(), 2);
    }

    #[test]
    fn keep_smaller_marks_larger_image() {
        let lookup = sizes(&[0, 0, 100, 0, 0, 400]);
        assert_eq!(resolve(&pair(2, 5), &lookup, ResolutionRule::KeepSmaller).unwrap(), 5);
    }

    #[test]
    fn equal_sizes_use_fixed_tie_break() {
        let lookup = sizes(&[0, 0, 640, 0, 0, 640]);
        assert_eq!(resolve(&pair(2, 5), &lookup, ResolutionRule::KeepLarger).unwrap(), 5);
        assert_eq!(resolve(&pair(2, 5), &lookup, ResolutionRule::KeepSmaller).unwrap(), 2);
    }

    #[test]
    fn size_lookup_failure_is_reported() {
        let failing = |index: usize| -> Result<u64, DecodeError> {
            Err(DecodeError::EmptyImage {
                path: PathBuf::from(format!("/photos/{}.png", index)),
            })
        };
        let (decisions, errors) =
            resolve_all(&[pair(0, 1)], &failing, ResolutionRule::KeepLarger);

        assert!(decisions.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn redundant_indices_are_distinct() {
        let decisions: Vec<_> = [(0, 1), (1, 2), (0, 2)]
            .iter()
            .map(|&(a, b)| ResolutionDecision {
                pair: pair(a, b),
                redundant: b,
            })
            .collect();

        assert_eq!(redundant_indices(&decisions), vec![1, 2]);
    }

    #[test]
    fn rules_parse_from_names() {
        assert_eq!("keep-first".parse::<ResolutionRule>(), Ok(ResolutionRule::KeepFirst));
        assert_eq!("KEEP_LAST".parse::<ResolutionRule>(), Ok(ResolutionRule::KeepLast));
        assert_eq!("larger".parse::<ResolutionRule>(), Ok(ResolutionRule::KeepLarger));
        assert_eq!("smaller".parse::<ResolutionRule>(), Ok(ResolutionRule::KeepSmaller));
        assert_eq!(
            "keep-both".parse::<ResolutionRule>(),
            Err(ConfigError::UnknownRule("keep-both".to_string()))
        );
    }

    #[test]
    fn only_size_rules_need_sizes() {
        assert!(ResolutionRule::KeepLarger.needs_sizes());
        assert!(!ResolutionRule::KeepFirst.needs_sizes());
    }
}
