//! Iterative k-means over RGB samples with random initial centroids.

use palette::Srgb;
use rand::Rng;

use crate::color::{Accumulator, Pixel, distance_squared, sort_by_luminance};

/// Default iteration budget.
pub const DEFAULT_MAX_ITERATIONS: usize = 30;

/// A run stops early once no centroid moves further than this.
pub const CONVERGENCE_DISTANCE: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Exactly `k` centroids, brightest first.
    pub centroids: Vec<Pixel>,
    /// Iterations actually run.
    pub iterations: usize,
    /// Whether the run settled before exhausting its budget.
    pub converged: bool,
}

/// Picks `k` initial centroids from distinct sample positions, padding with
/// random colors when there are fewer samples than `k`.
fn initial_centroids<R: Rng + ?Sized>(pixels: &[Pixel], k: usize, rng: &mut R) -> Vec<Pixel> {
    let picked = k.min(pixels.len());
    let mut centroids: Vec<Pixel> = rand::seq::index::sample(rng, pixels.len(), picked)
        .into_iter()
        .map(|i| pixels[i])
        .collect();
    while centroids.len() < k {
        centroids.push(Srgb::new(rng.random(), rng.random(), rng.random()));
    }
    centroids
}

fn nearest_centroid(pixel: Pixel, centroids: &[Pixel]) -> usize {
    let (mut min_index, mut min_distance) = (0, u32::MAX);
    for (i, &centroid) in centroids.iter().enumerate() {
        let distance = distance_squared(pixel, centroid);
        if distance < min_distance {
            min_distance = distance;
            min_index = i;
        }
    }
    min_index
}

/// Runs k-means with a caller-supplied random source.
///
/// Each iteration assigns every sample to its nearest centroid (first index
/// wins ties) and moves each centroid to the rounded mean of its samples.
/// A centroid nobody picked stays where it is.
pub fn fit<R: Rng + ?Sized>(
    pixels: &[Pixel],
    k: usize,
    max_iterations: usize,
    rng: &mut R,
) -> KMeansResult {
    if k == 0 {
        return KMeansResult {
            centroids: vec![],
            iterations: 0,
            converged: true,
        };
    }

    let mut centroids = initial_centroids(pixels, k, rng);
    let threshold = (CONVERGENCE_DISTANCE * CONVERGENCE_DISTANCE) as u32;

    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iterations {
        iterations += 1;

        let mut buckets = vec![Accumulator::default(); k];
        for &pixel in pixels {
            buckets[nearest_centroid(pixel, &centroids)].push(pixel);
        }

        let mut settled = true;
        for (centroid, bucket) in centroids.iter_mut().zip(&buckets) {
            let Some(mean) = bucket.mean() else {
                continue;
            };
            if distance_squared(mean, *centroid) > threshold {
                settled = false;
            }
            *centroid = mean;
        }

        if settled {
            converged = true;
            break;
        }
    }

    tracing::debug!(
        "k-means: {} samples, k = {k}, {iterations} iterations, converged: {converged}",
        pixels.len()
    );

    sort_by_luminance(&mut centroids);
    KMeansResult {
        centroids,
        iterations,
        converged,
    }
}

/// Like [`cluster`], drawing initial centroids from `rng`.
pub fn cluster_with<R: Rng + ?Sized>(
    pixels: &[Pixel],
    k: usize,
    max_iterations: usize,
    rng: &mut R,
) -> Vec<Pixel> {
    fit(pixels, k, max_iterations, rng).centroids
}

/// Reduces `pixels` to exactly `k` centroids, brightest first.
///
/// Initial centroids are random, so repeated calls on the same input may
/// settle on different palettes.
pub fn cluster(pixels: &[Pixel], k: usize, max_iterations: usize) -> Vec<Pixel> {
    cluster_with(pixels, k, max_iterations, &mut rand::rng())
}
