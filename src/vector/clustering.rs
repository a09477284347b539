//! K-means clustering used to train the IVF backend.
//!
//! Cosine similarity is the distance metric and centroids are kept at unit
//! length. Initialization uses K-means++ so the coarse quantizer starts from
//! well separated centroids.
//!
//! # Algorithm Details
//! - Distance metric: cosine (1 - similarity)
//! - Initialization: K-means++
//! - Max iterations: 100
//! - Convergence tolerance: 1e-4

use rand::Rng;
use thiserror::Error;
use tracing::warn;

use crate::vector::similarity::{cosine_similarity, normalize, normalized};
use crate::vector::types::{ClusterId, VectorError};

/// Maximum number of iterations for K-means clustering.
const MAX_ITERATIONS: usize = 100;

/// Convergence tolerance for centroid updates.
const CONVERGENCE_TOLERANCE: f32 = 1e-4;

/// Epsilon for floating-point comparisons.
const EPSILON: f32 = 1e-10;

/// Result of K-means clustering operation.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Unit-length centroids, one per cluster.
    pub centroids: Vec<Vec<f32>>,

    /// Cluster assignment for each input vector, in input order.
    pub assignments: Vec<ClusterId>,

    /// Number of iterations until convergence.
    pub iterations: usize,
}

/// Errors that can occur during clustering operations.
#[derive(Error, Debug)]
pub enum ClusteringError {
    #[error(
        "Empty vector set provided for clustering\nSuggestion: Add documents before training the index"
    )]
    EmptyVectorSet,

    #[error("Invalid cluster count: {0}\nSuggestion: Use k between 1 and the number of vectors")]
    InvalidClusterCount(usize),

    #[error(
        "Dimension mismatch in vectors\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch,

    #[error(
        "Failed to initialize centroids\nSuggestion: Check that vectors contain valid floating-point values"
    )]
    InitializationFailed,

    #[error("Vector operation error: {0}")]
    VectorError(#[from] VectorError),
}

/// Performs K-means clustering on a set of vectors using cosine similarity.
///
/// Fewer than `k` centroids are returned when the input has fewer than `k`
/// distinct directions.
///
/// # Arguments
/// * `vectors` - Input vectors to cluster (must be non-empty and same dimension)
/// * `k` - Number of clusters (must be >= 1 and <= number of vectors)
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn kmeans_clustering(vectors: &[&[f32]], k: usize) -> Result<KMeansResult, ClusteringError> {
    if vectors.is_empty() {
        return Err(ClusteringError::EmptyVectorSet);
    }

    if k == 0 || k > vectors.len() {
        return Err(ClusteringError::InvalidClusterCount(k));
    }

    let dimension = vectors[0].len();
    if vectors.iter().any(|v| v.len() != dimension) {
        return Err(ClusteringError::DimensionMismatch);
    }

    let mut centroids = initialize_centroids_kmeans_plus_plus(vectors, k)?;
    let mut assignments = vec![ClusterId::from_index(0); vectors.len()];
    let mut iterations = 0;

    loop {
        iterations += 1;

        let centroid_refs: Vec<&[f32]> = centroids.iter().map(|c| c.as_slice()).collect();
        let new_assignments: Vec<ClusterId> = vectors
            .iter()
            .map(|vector| assign_to_nearest_centroid(vector, &centroid_refs))
            .collect();

        let converged = new_assignments == assignments;
        assignments = new_assignments;

        if converged || iterations >= MAX_ITERATIONS {
            break;
        }

        let new_centroids = update_centroids(vectors, &assignments, centroids.len());
        let movement = calculate_centroid_movement(&centroids, &new_centroids);
        centroids = new_centroids;

        if movement < CONVERGENCE_TOLERANCE {
            // Assignments must describe the centroids we return
            let centroid_refs: Vec<&[f32]> = centroids.iter().map(|c| c.as_slice()).collect();
            assignments = vectors
                .iter()
                .map(|vector| assign_to_nearest_centroid(vector, &centroid_refs))
                .collect();
            break;
        }
    }

    if iterations >= MAX_ITERATIONS {
        // Results are still usable, just not fully converged
        warn!("k-means did not fully converge after {MAX_ITERATIONS} iterations");
    }

    Ok(KMeansResult {
        centroids,
        assignments,
        iterations,
    })
}

/// Assigns a vector to the nearest centroid based on cosine similarity.
pub fn assign_to_nearest_centroid(vector: &[f32], centroids: &[&[f32]]) -> ClusterId {
    let mut best_similarity = f32::NEG_INFINITY;
    let mut best_cluster = 0;

    for (i, centroid) in centroids.iter().enumerate() {
        let similarity = cosine_similarity(vector, centroid);
        if similarity > best_similarity {
            best_similarity = similarity;
            best_cluster = i;
        }
    }

    ClusterId::from_index(best_cluster)
}

/// Ranks centroids by similarity to `vector` and returns the `n` closest.
pub fn nearest_centroids(vector: &[f32], centroids: &[Vec<f32>], n: usize) -> Vec<ClusterId> {
    let mut ranked: Vec<(usize, f32)> = centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, cosine_similarity(vector, c)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(n)
        .map(|(i, _)| ClusterId::from_index(i))
        .collect()
}

/// Updates centroids as the normalized mean of their assigned vectors.
fn update_centroids(vectors: &[&[f32]], assignments: &[ClusterId], k: usize) -> Vec<Vec<f32>> {
    let dimension = vectors[0].len();
    let mut new_centroids = vec![vec![0.0; dimension]; k];
    let mut cluster_sizes = vec![0usize; k];

    for (vector, cluster_id) in vectors.iter().zip(assignments.iter()) {
        let idx = cluster_id.index();
        for (acc, &value) in new_centroids[idx].iter_mut().zip(vector.iter()) {
            *acc += value;
        }
        cluster_sizes[idx] += 1;
    }

    let mut rng = rand::rng();
    for (centroid, &size) in new_centroids.iter_mut().zip(cluster_sizes.iter()) {
        if size == 0 {
            // Empty cluster: reseed from a random member
            let random_idx = rng.random_range(0..vectors.len());
            *centroid = normalized(vectors[random_idx]);
        } else {
            for value in centroid.iter_mut() {
                *value /= size as f32;
            }
            normalize(centroid);
        }
    }

    new_centroids
}

/// K-means++ selects initial centroids that are far apart.
fn initialize_centroids_kmeans_plus_plus(
    vectors: &[&[f32]],
    k: usize,
) -> Result<Vec<Vec<f32>>, ClusteringError> {
    let mut rng = rand::rng();
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);

    let first_idx = rng.random_range(0..vectors.len());
    centroids.push(normalized(vectors[first_idx]));

    while centroids.len() < k {
        let mut distances = vec![0.0f32; vectors.len()];
        let mut total_distance = 0.0f32;

        for (i, vector) in vectors.iter().enumerate() {
            let min_distance = centroids
                .iter()
                .map(|centroid| 1.0 - cosine_similarity(vector, centroid))
                .fold(f32::MAX, f32::min);

            distances[i] = min_distance * min_distance;
            total_distance += distances[i];
        }

        if !total_distance.is_finite() {
            return Err(ClusteringError::InitializationFailed);
        }

        if total_distance < EPSILON {
            // Every remaining point coincides with a centroid
            break;
        }

        let target = rng.random::<f32>() * total_distance;
        let mut cumulative = 0.0;
        let chosen = distances
            .iter()
            .position(|&distance| {
                cumulative += distance;
                cumulative >= target
            })
            .unwrap_or(vectors.len() - 1);

        centroids.push(normalized(vectors[chosen]));
    }

    Ok(centroids)
}

/// Mean cosine distance travelled by the centroids between iterations.
fn calculate_centroid_movement(old: &[Vec<f32>], new: &[Vec<f32>]) -> f32 {
    old.iter()
        .zip(new.iter())
        .map(|(old_c, new_c)| 1.0 - cosine_similarity(old_c, new_c))
        .sum::<f32>()
        / old.len() as f32
}
