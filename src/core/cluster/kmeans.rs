//! One-dimensional k-means with random restarts.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

/// Lloyd's algorithm on scalar points
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    attempts: usize,
    max_iterations: usize,
    epsilon: f64,
    seed: Option<u64>,
}

/// Outcome of the best attempt
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster id for each input point
    pub labels: Vec<usize>,
    /// Final center of each cluster
    pub centers: Vec<f64>,
    /// Sum of squared distances from points to their centers
    pub compactness: f64,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            attempts: 3,
            max_iterations: 10,
            epsilon: 0.5,
            seed: None,
        }
    }

    /// Number of independent random starts; the most compact wins
    pub fn attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Stop once no center moves by more than this
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&self, points: &[f64]) -> KMeansFit {
        if points.is_empty() || self.k == 0 {
            return KMeansFit {
                labels: vec![0; points.len()],
                centers: Vec::new(),
                compactness: 0.0,
            };
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut best: Option<KMeansFit> = None;
        for attempt in 0..self.attempts {
            let fit = self.run_once(points, &mut rng);
            tracing::debug!(attempt, compactness = fit.compactness, "k-means attempt finished");
            if best.as_ref().map_or(true, |b| fit.compactness < b.compactness) {
                best = Some(fit);
            }
        }

        best.unwrap_or_else(|| self.run_once(points, &mut rng))
    }

    fn run_once(&self, points: &[f64], rng: &mut StdRng) -> KMeansFit {
        let mut centers = initial_centers(points, self.k, rng);
        let mut labels = vec![0; points.len()];

        for _ in 0..self.max_iterations {
            assign(points, &centers, &mut labels);

            let mut sums = vec![0.0; self.k];
            let mut counts = vec![0usize; self.k];
            for (&point, &label) in points.iter().zip(&labels) {
                sums[label] += point;
                counts[label] += 1;
            }

            let mut max_shift: f64 = 0.0;
            for (c, center) in centers.iter_mut().enumerate() {
                // An empty cluster keeps its previous center
                if counts[c] > 0 {
                    let updated = sums[c] / counts[c] as f64;
                    max_shift = max_shift.max((updated - *center).abs());
                    *center = updated;
                }
            }

            if max_shift <= self.epsilon {
                break;
            }
        }

        let compactness = assign(points, &centers, &mut labels);
        KMeansFit {
            labels,
            centers,
            compactness,
        }
    }
}

/// Pick `k` starting centers among the points, distinct positions first.
fn initial_centers(points: &[f64], k: usize, rng: &mut StdRng) -> Vec<f64> {
    let distinct = k.min(points.len());
    let mut centers: Vec<f64> = index::sample(rng, points.len(), distinct)
        .into_iter()
        .map(|i| points[i])
        .collect();
    while centers.len() < k {
        centers.push(points[rng.gen_range(0..points.len())]);
    }
    centers
}

/// Label every point with its nearest center; ties go to the lower id.
///
/// Returns the compactness of the assignment.
fn assign(points: &[f64], centers: &[f64], labels: &mut [usize]) -> f64 {
    let mut compactness = 0.0;
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        let mut nearest = 0;
        let mut nearest_distance = f64::INFINITY;
        for (c, center) in centers.iter().enumerate() {
            let distance = (point - center) * (point - center);
            if distance < nearest_distance {
                nearest = c;
                nearest_distance = distance;
            }
        }
        *label = nearest;
        compactness += nearest_distance;
    }
    compactness
}
