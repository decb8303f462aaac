//! Per-transition connection counts

use crate::types::ConnectionRecord;
use nalgebra::DMatrix;

/// Column of connection counts, one row per transition
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    counts: DMatrix<usize>,
}

impl FeatureMatrix {
    /// Build from counts ordered by transition
    pub fn from_counts(counts: Vec<usize>) -> Self {
        let n = counts.len();
        Self {
            counts: DMatrix::from_vec(n, 1, counts),
        }
    }

    /// Always `(n_transitions, 1)`, including `(0, 1)` when empty
    pub fn shape(&self) -> (usize, usize) {
        self.counts.shape()
    }

    pub fn len(&self) -> usize {
        self.counts.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize) -> Option<usize> {
        self.counts.get((row, 0)).copied()
    }

    pub fn as_matrix(&self) -> &DMatrix<usize> {
        &self.counts
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.counts.iter().copied().collect()
    }

    /// Counts as floating point, for downstream models
    pub fn to_f64(&self) -> DMatrix<f64> {
        self.counts.map(|c| c as f64)
    }
}

/// Turns connection records into a feature column
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureAggregator;

impl FeatureAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Row `r` holds the link count of `records[r]`
    pub fn aggregate(&self, records: &[ConnectionRecord]) -> FeatureMatrix {
        FeatureMatrix::from_counts(records.iter().map(ConnectionRecord::num_connections).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LinkMatrix;

    fn record(t: usize, rows: &[Vec<bool>]) -> ConnectionRecord {
        let links = LinkMatrix::from_rows(rows);
        let (n, m) = links.shape();
        ConnectionRecord {
            t,
            links,
            distances: DMatrix::zeros(n, m),
            assignment: None,
        }
    }

    #[test]
    fn test_counts_per_transition() {
        let records = vec![
            record(1, &[vec![true, false], vec![false, false]]),
            record(2, &[vec![true, true], vec![true, false]]),
        ];
        let features = FeatureAggregator::new().aggregate(&records);
        assert_eq!(features.shape(), (2, 1));
        assert_eq!(features.to_vec(), vec![1, 3]);
        assert_eq!(features.to_f64()[(1, 0)], 3.0);
    }

    #[test]
    fn test_empty_records() {
        let features = FeatureAggregator::new().aggregate(&[]);
        assert_eq!(features.shape(), (0, 1));
        assert!(features.is_empty());
        assert_eq!(features.get(0), None);
    }
}
