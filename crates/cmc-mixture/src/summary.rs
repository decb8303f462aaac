//! Per-window mixture fit results

use cmc_core::{Error, Result};
use nalgebra::{DMatrix, DVector};
use std::fmt;

/// Tolerance on `|sum(weights) - 1|`
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Diagnostics reported by an iterative estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitDiagnostics {
    /// EM iterations performed
    pub iterations: usize,
    /// Whether the lower bound settled within tolerance
    pub converged: bool,
    /// Final per-sample average log-likelihood
    pub lower_bound: f64,
}

/// K fitted Gaussian components with diagonal covariance
///
/// Rows of `means` and `std_devs` are components; columns are dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureSummary {
    means: DMatrix<f64>,
    std_devs: DMatrix<f64>,
    weights: DVector<f64>,
    diagnostics: Option<FitDiagnostics>,
}

impl MixtureSummary {
    /// Create a summary, validating shapes and the weight simplex
    pub fn new(means: DMatrix<f64>, std_devs: DMatrix<f64>, weights: DVector<f64>) -> Result<Self> {
        let (k, d) = means.shape();
        if k == 0 || d == 0 {
            return Err(Error::InvalidInput(format!(
                "Mixture means must be non-empty, got shape ({k}, {d})"
            )));
        }
        if std_devs.shape() != (k, d) {
            return Err(Error::InvalidInput(format!(
                "Std-dev shape {:?} does not match means shape ({k}, {d})",
                std_devs.shape()
            )));
        }
        if weights.len() != k {
            return Err(Error::size_mismatch(k, weights.len(), "mixture weights"));
        }
        if means.iter().any(|v| !v.is_finite()) {
            return Err(Error::non_finite("mixture means"));
        }
        if std_devs.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(Error::InvalidInput(
                "Mixture std-devs must be finite and positive".to_string(),
            ));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidInput(
                "Mixture weights must be finite and non-negative".to_string(),
            ));
        }
        let total = weights.sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::InvalidInput(format!(
                "Mixture weights sum to {total}, expected 1"
            )));
        }
        Ok(Self {
            means,
            std_devs,
            weights,
            diagnostics: None,
        })
    }

    /// Create a summary from per-component rows
    pub fn from_components(
        means: &[Vec<f64>],
        std_devs: &[Vec<f64>],
        weights: &[f64],
    ) -> Result<Self> {
        let k = means.len();
        let d = means.first().map(Vec::len).unwrap_or(0);
        if std_devs.len() != k {
            return Err(Error::size_mismatch(k, std_devs.len(), "std-dev rows"));
        }
        for (i, (m, s)) in means.iter().zip(std_devs).enumerate() {
            if m.len() != d {
                return Err(Error::size_mismatch(d, m.len(), &format!("mean row {i}")));
            }
            if s.len() != d {
                return Err(Error::size_mismatch(d, s.len(), &format!("std-dev row {i}")));
            }
        }
        Self::new(
            DMatrix::from_fn(k, d, |i, j| means[i][j]),
            DMatrix::from_fn(k, d, |i, j| std_devs[i][j]),
            DVector::from_column_slice(weights),
        )
    }

    /// Attach estimator diagnostics
    pub fn with_diagnostics(mut self, diagnostics: FitDiagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn n_components(&self) -> usize {
        self.means.nrows()
    }

    pub fn dim(&self) -> usize {
        self.means.ncols()
    }

    /// `K x D` component means
    pub fn means(&self) -> &DMatrix<f64> {
        &self.means
    }

    /// `K x D` component standard deviations
    pub fn std_devs(&self) -> &DMatrix<f64> {
        &self.std_devs
    }

    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    /// Mean vector of component `k`
    pub fn mean(&self, k: usize) -> Option<Vec<f64>> {
        (k < self.n_components()).then(|| self.means.row(k).iter().copied().collect())
    }

    pub fn diagnostics(&self) -> Option<&FitDiagnostics> {
        self.diagnostics.as_ref()
    }
}

impl fmt::Display for MixtureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "MixtureSummary ({} components, dim {})",
            self.n_components(),
            self.dim()
        )?;
        for k in 0..self.n_components() {
            let mean: Vec<String> = self.means.row(k).iter().map(|v| format!("{v:.3}")).collect();
            writeln!(
                f,
                "  [{k}] weight={:.3} mean=[{}]",
                self.weights[k],
                mean.join(", ")
            )?;
        }
        Ok(())
    }
}
