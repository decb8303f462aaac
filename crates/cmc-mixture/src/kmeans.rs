//! K-means initialisation for the EM estimator
//!
//! Centers are seeded with k-means++ (probability proportional to squared
//! distance) and refined with Lloyd iterations. Only the final hard labels are
//! used, as starting responsibilities for EM.

use rand::Rng;

const NUMERICAL_EPS: f64 = 1e-12;

/// Result of k-means clustering
#[derive(Debug, Clone)]
pub struct KmeansResult {
    /// Cluster label of each observation
    pub labels: Vec<usize>,
    /// Cluster centers, one per cluster
    pub centers: Vec<Vec<f64>>,
    /// Lloyd iterations performed
    pub iterations: usize,
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// K-means++ seeding
///
/// Falls back to a uniform pick when every point coincides with a center.
pub fn kmeans_plusplus_init<R: Rng>(rows: &[&[f64]], k: usize, rng: &mut R) -> Vec<Vec<f64>> {
    let n = rows.len();
    let mut centers: Vec<Vec<f64>> = Vec::with_capacity(k);

    let first_idx = rng.gen_range(0..n);
    centers.push(rows[first_idx].to_vec());

    for _ in 1..k {
        let dist_sq: Vec<f64> = rows
            .iter()
            .map(|row| {
                centers
                    .iter()
                    .map(|c| squared_distance(row, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = dist_sq.iter().sum();

        let chosen = if total < NUMERICAL_EPS {
            rng.gen_range(0..n)
        } else {
            let r = rng.gen::<f64>() * total;
            let mut cumsum = 0.0;
            let mut chosen = n - 1;
            for (i, &d) in dist_sq.iter().enumerate() {
                cumsum += d;
                if cumsum >= r {
                    chosen = i;
                    break;
                }
            }
            chosen
        };
        centers.push(rows[chosen].to_vec());
    }

    centers
}

fn nearest_center(row: &[f64], centers: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (j, c) in centers.iter().enumerate() {
        let d = squared_distance(row, c);
        if d < best_dist {
            best_dist = d;
            best = j;
        }
    }
    best
}

/// Run k-means from k-means++ seeds until labels stop changing
///
/// Empty clusters keep their previous center.
pub fn kmeans<R: Rng>(rows: &[&[f64]], k: usize, max_iter: usize, rng: &mut R) -> KmeansResult {
    let dim = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut centers = kmeans_plusplus_init(rows, k, rng);
    let mut labels: Vec<usize> = rows.iter().map(|r| nearest_center(r, &centers)).collect();
    let mut iterations = 0;

    for _ in 0..max_iter {
        iterations += 1;

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (row, &label) in rows.iter().zip(&labels) {
            counts[label] += 1;
            for (s, x) in sums[label].iter_mut().zip(row.iter()) {
                *s += x;
            }
        }
        for j in 0..k {
            if counts[j] > 0 {
                centers[j] = sums[j].iter().map(|s| s / counts[j] as f64).collect();
            }
        }

        let new_labels: Vec<usize> = rows.iter().map(|r| nearest_center(r, &centers)).collect();
        if new_labels == labels {
            break;
        }
        labels = new_labels;
    }

    KmeansResult {
        labels,
        centers,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn two_blobs() -> Vec<Vec<f64>> {
        let mut rows = Vec::new();
        for i in 0..20 {
            rows.push(vec![0.0 + i as f64 * 0.01]);
            rows.push(vec![10.0 + i as f64 * 0.01]);
        }
        rows
    }

    #[test]
    fn test_kmeans_separates_blobs() {
        let data = two_blobs();
        let rows: Vec<&[f64]> = data.iter().map(|r| r.as_slice()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = kmeans(&rows, 2, 300, &mut rng);

        // Points alternate between blobs
        let a = result.labels[0];
        let b = result.labels[1];
        assert_ne!(a, b);
        for (i, &label) in result.labels.iter().enumerate() {
            assert_eq!(label, if i % 2 == 0 { a } else { b });
        }
    }

    #[test]
    fn test_kmeans_deterministic() {
        let data = two_blobs();
        let rows: Vec<&[f64]> = data.iter().map(|r| r.as_slice()).collect();
        let r1 = kmeans(&rows, 3, 300, &mut ChaCha8Rng::seed_from_u64(7));
        let r2 = kmeans(&rows, 3, 300, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(r1.labels, r2.labels);
        assert_eq!(r1.centers, r2.centers);
    }

    #[test]
    fn test_plusplus_on_identical_points() {
        let data = vec![vec![1.0, 1.0]; 5];
        let rows: Vec<&[f64]> = data.iter().map(|r| r.as_slice()).collect();
        let centers = kmeans_plusplus_init(&rows, 3, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(centers.len(), 3);
        assert!(centers.iter().all(|c| c == &vec![1.0, 1.0]));
    }
}
