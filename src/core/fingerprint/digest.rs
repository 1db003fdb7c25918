//! Fingerprint and digest value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Fixed-length sequence of hexadecimal symbols (values 0-15)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint {
    symbols: Vec<u8>,
}

impl Fingerprint {
    /// Build a fingerprint from symbol values.
    ///
    /// Returns `None` if any value does not fit in one hex digit.
    pub fn from_symbols(symbols: Vec<u8>) -> Option<Self> {
        if symbols.iter().all(|&s| s < 16) {
            Some(Self { symbols })
        } else {
            None
        }
    }

    /// Symbol values in order
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Number of symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &symbol in &self.symbols {
            write!(f, "{}", HEX_DIGITS[symbol as usize] as char)?;
        }
        Ok(())
    }
}

/// Error returned when a string is not a valid fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFingerprintError(char);

impl fmt::Display for ParseFingerprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a hexadecimal digit", self.0)
    }
}

impl std::error::Error for ParseFingerprintError {}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbols = s
            .chars()
            .map(|c| {
                c.to_digit(16)
                    .map(|d| d as u8)
                    .ok_or(ParseFingerprintError(c))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { symbols })
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.to_string()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = ParseFingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Fingerprint plus the statistics used for clustering.
///
/// The statistics describe the pair sums that make up the fingerprint,
/// not the original pixel values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    pub fingerprint: Fingerprint,
    /// Mean of the pair sums, rounded half to even
    pub mean: i32,
    /// Population variance of the pair sums
    pub variance: f32,
}

impl Digest {
    /// Build a digest from a row-major grid of quantization levels.
    ///
    /// Horizontally adjacent cells are summed into one symbol, so the grid
    /// width must be even and `2 * max_level` must stay below 16.
    pub(crate) fn from_levels(levels: &[u8]) -> Self {
        let sums: Vec<u8> = levels
            .chunks_exact(2)
            .map(|pair| pair[0] + pair[1])
            .collect();

        let count = sums.len().max(1) as f64;
        let exact_mean = sums.iter().map(|&s| s as f64).sum::<f64>() / count;
        let variance = sums
            .iter()
            .map(|&s| {
                let d = s as f64 - exact_mean;
                d * d
            })
            .sum::<f64>()
            / count;

        Self {
            fingerprint: Fingerprint { symbols: sums },
            mean: exact_mean.round_ties_even() as i32,
            variance: variance as f32,
        }
    }
}
