//! Component matching policies
//!
//! Mixture components carry no identity across independent fits. A matching
//! policy decides which `(previous, current)` component pairs may link at all;
//! the linker then applies the distance threshold to those candidates.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Candidate pairs for one transition
#[derive(Debug, Clone, PartialEq)]
pub struct Matching {
    /// Pairs allowed to link
    pub candidates: DMatrix<bool>,
    /// `assignment[i]` is the current component matched to previous component `i`
    pub assignment: Option<Vec<usize>>,
}

/// Strategy for pairing components of adjacent windows
pub trait MatchingPolicy: Send + Sync {
    /// Select candidate pairs from the `K x K` distance matrix
    fn candidates(&self, distances: &DMatrix<f64>) -> Matching;

    fn name(&self) -> &'static str;
}

/// Every pair is a candidate; components are compared in estimator order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Positional;

impl MatchingPolicy for Positional {
    fn candidates(&self, distances: &DMatrix<f64>) -> Matching {
        let (n, m) = distances.shape();
        Matching {
            candidates: DMatrix::from_element(n, m, true),
            assignment: None,
        }
    }

    fn name(&self) -> &'static str {
        "positional"
    }
}

/// Minimum-total-distance one-to-one matching (Kuhn-Munkres)
///
/// Only matched pairs are candidates, so every component links to at most one
/// component of the next window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimalAssignment;

impl MatchingPolicy for OptimalAssignment {
    fn candidates(&self, distances: &DMatrix<f64>) -> Matching {
        let (n, m) = distances.shape();
        let assignment = hungarian(distances);
        let mut candidates = DMatrix::from_element(n, m, false);
        for (i, &j) in assignment.iter().enumerate() {
            if j < m {
                candidates[(i, j)] = true;
            }
        }
        Matching {
            candidates,
            assignment: Some(assignment),
        }
    }

    fn name(&self) -> &'static str {
        "optimal-assignment"
    }
}

/// Serializable choice of policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingStrategy {
    #[default]
    Positional,
    OptimalAssignment,
}

impl MatchingPolicy for MatchingStrategy {
    fn candidates(&self, distances: &DMatrix<f64>) -> Matching {
        match self {
            Self::Positional => Positional.candidates(distances),
            Self::OptimalAssignment => OptimalAssignment.candidates(distances),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Positional => Positional.name(),
            Self::OptimalAssignment => OptimalAssignment.name(),
        }
    }
}

/// Solve the rectangular assignment problem for rows `<=` columns
///
/// Returns, for each row, the assigned column. When there are more rows than
/// columns the surplus rows are assigned `usize::MAX`.
pub fn hungarian(cost: &DMatrix<f64>) -> Vec<usize> {
    let (rows, cols) = cost.shape();
    if rows == 0 {
        return Vec::new();
    }
    if rows > cols {
        // Solve the transpose and invert it
        let by_column = hungarian(&cost.transpose());
        let mut assignment = vec![usize::MAX; rows];
        for (j, &i) in by_column.iter().enumerate() {
            assignment[i] = j;
        }
        return assignment;
    }

    // Potentials formulation, 1-based with a virtual column 0
    let n = rows;
    let m = cols;
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    let mut owner = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        owner[0] = i;
        let mut j0 = 0;
        let mut min_v = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[j0] = true;
            let i0 = owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
                if reduced < min_v[j] {
                    min_v[j] = reduced;
                    way[j] = j0;
                }
                if min_v[j] < delta {
                    delta = min_v[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_v[j] -= delta;
                }
            }
            j0 = j1;
            if owner[j0] == 0 {
                break;
            }
        }
        loop {
            let j1 = way[j0];
            owner[j0] = owner[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![usize::MAX; n];
    for j in 1..=m {
        if owner[j] != 0 {
            assignment[owner[j] - 1] = j - 1;
        }
    }
    assignment
}
