//! Comparison policies for pairs of fingerprints.

use crate::core::fingerprint::Fingerprint;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default share of the maximum score a pair needs
pub const DEFAULT_SIMILARITY_PERCENT: u8 = 80;

/// How two fingerprints are judged to be duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Every symbol must be identical
    Exact,
    /// Positionally equal symbols must reach `percent` of the length
    Threshold { percent: u8 },
    /// Votes (2 for equal, 1 for adjacent values) must exceed `percent` of
    /// twice the length
    NearestDistance { percent: u8 },
}

impl MatchPolicy {
    pub fn threshold() -> Self {
        MatchPolicy::Threshold {
            percent: DEFAULT_SIMILARITY_PERCENT,
        }
    }

    pub fn nearest_distance() -> Self {
        MatchPolicy::NearestDistance {
            percent: DEFAULT_SIMILARITY_PERCENT,
        }
    }

    /// Same policy kind with a different similarity percent.
    ///
    /// `Exact` has no percent and is returned unchanged.
    pub fn with_percent(self, percent: u8) -> Self {
        match self {
            MatchPolicy::Exact => MatchPolicy::Exact,
            MatchPolicy::Threshold { .. } => MatchPolicy::Threshold { percent },
            MatchPolicy::NearestDistance { .. } => MatchPolicy::NearestDistance { percent },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            MatchPolicy::Exact => Ok(()),
            MatchPolicy::Threshold { percent } | MatchPolicy::NearestDistance { percent } => {
                if (1..=100).contains(&percent) {
                    Ok(())
                } else {
                    Err(ConfigError::invalid(
                        "similarity",
                        percent,
                        "must be between 1 and 100",
                    ))
                }
            }
        }
    }

    /// Raw score of a pair under this policy.
    ///
    /// Exact and threshold count equal positions; nearest distance counts
    /// votes.
    pub fn score(&self, a: &Fingerprint, b: &Fingerprint) -> u32 {
        match self {
            MatchPolicy::Exact | MatchPolicy::Threshold { .. } => equal_symbols(a, b),
            MatchPolicy::NearestDistance { .. } => votes(a, b),
        }
    }

    /// Highest score possible for fingerprints of `len` symbols
    pub fn max_score(&self, len: usize) -> u32 {
        match self {
            MatchPolicy::Exact | MatchPolicy::Threshold { .. } => len as u32,
            MatchPolicy::NearestDistance { .. } => 2 * len as u32,
        }
    }

    /// Decide whether a pair is a duplicate.
    ///
    /// Fingerprints of different lengths never match.
    pub fn is_duplicate(&self, a: &Fingerprint, b: &Fingerprint) -> bool {
        if a.len() != b.len() {
            return false;
        }

        match *self {
            MatchPolicy::Exact => a == b,
            MatchPolicy::Threshold { percent } => {
                equal_symbols(a, b) >= share(self.max_score(a.len()), percent)
            }
            MatchPolicy::NearestDistance { percent } => {
                votes(a, b) > share(self.max_score(a.len()), percent)
            }
        }
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy::nearest_distance()
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Exact => write!(f, "exact match"),
            MatchPolicy::Threshold { percent } => write!(f, "threshold match ({}%)", percent),
            MatchPolicy::NearestDistance { percent } => {
                write!(f, "nearest-distance match ({}%)", percent)
            }
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "exact" | "exact-match" => Ok(MatchPolicy::Exact),
            "threshold" | "threshold-match" | "most-matches" => Ok(MatchPolicy::threshold()),
            "nearest" | "nearest-distance" => Ok(MatchPolicy::nearest_distance()),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

/// `percent` of `total`, rounded down
fn share(total: u32, percent: u8) -> u32 {
    total * percent as u32 / 100
}

fn equal_symbols(a: &Fingerprint, b: &Fingerprint) -> u32 {
    a.symbols()
        .iter()
        .zip(b.symbols())
        .filter(|(x, y)| x == y)
        .count() as u32
}

fn votes(a: &Fingerprint, b: &Fingerprint) -> u32 {
    a.symbols()
        .iter()
        .zip(b.symbols())
        .map(|(&x, &y)| match x.abs_diff(y) {
            0 => 2,
            1 => 1,
            _ => 0,
        })
        .sum()
}
