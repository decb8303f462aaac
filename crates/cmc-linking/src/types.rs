//! Link matrices and connection records

use nalgebra::DMatrix;
use std::fmt;

/// Boolean `K x K` matrix for one transition `t-1 -> t`
///
/// Entry `(i, j)` is set when component `i` of the previous window links to
/// component `j` of the current window.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkMatrix {
    links: DMatrix<bool>,
}

impl LinkMatrix {
    pub fn new(links: DMatrix<bool>) -> Self {
        Self { links }
    }

    /// Matrix with no links
    pub fn empty(n_prev: usize, n_curr: usize) -> Self {
        Self::new(DMatrix::from_element(n_prev, n_curr, false))
    }

    /// Build from row vectors, mainly for tests
    pub fn from_rows(rows: &[Vec<bool>]) -> Self {
        let n = rows.len();
        let m = rows.first().map(Vec::len).unwrap_or(0);
        Self::new(DMatrix::from_fn(n, m, |i, j| rows[i][j]))
    }

    /// `(n_prev, n_curr)`
    pub fn shape(&self) -> (usize, usize) {
        self.links.shape()
    }

    pub fn get(&self, prev: usize, curr: usize) -> Option<bool> {
        self.links.get((prev, curr)).copied()
    }

    /// Number of `true` entries
    pub fn count_true(&self) -> usize {
        self.links.iter().filter(|&&linked| linked).count()
    }

    /// Linked `(prev, curr)` pairs in row-major order
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let (n, m) = self.shape();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in 0..m {
                if self.links[(i, j)] {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    pub fn as_matrix(&self) -> &DMatrix<bool> {
        &self.links
    }
}

impl fmt::Display for LinkMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, m) = self.shape();
        for i in 0..n {
            let row: String = (0..m)
                .map(|j| if self.links[(i, j)] { '1' } else { '.' })
                .collect();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// The links of one window-to-window transition
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRecord {
    /// Index of the later window of the transition
    pub t: usize,
    /// Thresholded links
    pub links: LinkMatrix,
    /// Euclidean distances between component means
    pub distances: DMatrix<f64>,
    /// Previous-to-current component assignment, when the policy computed one
    pub assignment: Option<Vec<usize>>,
}

impl ConnectionRecord {
    /// Number of links in this transition
    pub fn num_connections(&self) -> usize {
        self.links.count_true()
    }
}
