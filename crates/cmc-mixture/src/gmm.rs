//! Expectation-maximisation for diagonal-covariance Gaussian mixtures
//!
//! Responsibilities are initialised from k-means hard labels, then EM runs
//! until the change in the per-sample average log-likelihood drops below
//! `tol`. `reg_covar` is added to every variance so a component collapsing
//! onto identical points keeps a strictly positive spread.

use crate::kmeans::kmeans;
use crate::summary::{FitDiagnostics, MixtureSummary};
use crate::traits::MixtureEstimator;
use cmc_core::{Error, Result, Window};
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::{Continuous, Normal};
use tracing::{debug, instrument, warn};

/// Added to component mass so empty components do not divide by zero
const MASS_EPS: f64 = 10.0 * f64::EPSILON;

/// Maximum Lloyd iterations used for initialisation
const KMEANS_MAX_ITER: usize = 300;

/// EM estimator for diagonal-covariance Gaussian mixtures
#[derive(Debug, Clone)]
pub struct DiagonalGmm {
    max_iter: usize,
    tol: f64,
    reg_covar: f64,
    require_convergence: bool,
}

impl Default for DiagonalGmm {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: 1e-3,
            reg_covar: 1e-6,
            require_convergence: true,
        }
    }
}

impl DiagonalGmm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the EM iteration budget
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the lower-bound convergence threshold
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the variance regulariser
    pub fn with_reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    /// Whether running out of iterations is an error (default) or a warning
    pub fn with_require_convergence(mut self, require: bool) -> Self {
        self.require_convergence = require;
        self
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn tol(&self) -> f64 {
        self.tol
    }

    pub fn reg_covar(&self) -> f64 {
        self.reg_covar
    }

    /// Check the tuning parameters; called at the start of every fit
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(Error::Configuration(
                "max_iter must be positive".to_string(),
            ));
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(Error::Configuration(format!(
                "tol must be finite and non-negative, got {}",
                self.tol
            )));
        }
        if !self.reg_covar.is_finite() || self.reg_covar < 0.0 {
            return Err(Error::Configuration(format!(
                "reg_covar must be finite and non-negative, got {}",
                self.reg_covar
            )));
        }
        Ok(())
    }

    /// M-step: weights, means and variances from responsibilities
    fn m_step(
        &self,
        data: &DMatrix<f64>,
        resp: &DMatrix<f64>,
    ) -> (DVector<f64>, DMatrix<f64>, DMatrix<f64>) {
        let (n, d) = data.shape();
        let k = resp.ncols();

        let mass: DVector<f64> = DVector::from_fn(k, |j, _| resp.column(j).sum() + MASS_EPS);
        let means = DMatrix::from_fn(k, d, |j, dim| {
            let mut acc = 0.0;
            for i in 0..n {
                acc += resp[(i, j)] * data[(i, dim)];
            }
            acc / mass[j]
        });
        let variances = DMatrix::from_fn(k, d, |j, dim| {
            let mut acc = 0.0;
            for i in 0..n {
                let diff = data[(i, dim)] - means[(j, dim)];
                acc += resp[(i, j)] * diff * diff;
            }
            acc / mass[j] + self.reg_covar
        });
        let total = mass.sum();
        let weights = mass / total;

        (weights, means, variances)
    }

    /// E-step: normalised responsibilities and the average log-likelihood
    fn e_step(
        &self,
        data: &DMatrix<f64>,
        weights: &DVector<f64>,
        means: &DMatrix<f64>,
        variances: &DMatrix<f64>,
    ) -> Result<(DMatrix<f64>, f64)> {
        let (n, d) = data.shape();
        let k = weights.len();

        let mut normals = Vec::with_capacity(k * d);
        for j in 0..k {
            for dim in 0..d {
                let normal = Normal::new(means[(j, dim)], variances[(j, dim)].sqrt())
                    .map_err(|e| Error::convergence(0, format!("degenerate component {j}: {e}")))?;
                normals.push(normal);
            }
        }

        let mut resp = DMatrix::zeros(n, k);
        let mut total_log_likelihood = 0.0;
        let mut log_prob = vec![0.0; k];
        for i in 0..n {
            for (j, lp) in log_prob.iter_mut().enumerate() {
                let mut acc = weights[j].ln();
                for dim in 0..d {
                    acc += normals[j * d + dim].ln_pdf(data[(i, dim)]);
                }
                *lp = acc;
            }
            let max = log_prob.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let norm = max + log_prob.iter().map(|lp| (lp - max).exp()).sum::<f64>().ln();
            if !norm.is_finite() {
                return Err(Error::convergence(
                    0,
                    format!("non-finite log-likelihood at observation {i}"),
                ));
            }
            for j in 0..k {
                resp[(i, j)] = (log_prob[j] - norm).exp();
            }
            total_log_likelihood += norm;
        }

        Ok((resp, total_log_likelihood / n as f64))
    }
}

impl MixtureEstimator for DiagonalGmm {
    #[instrument(skip(self, window), fields(window = window.index(), len = window.len()))]
    fn fit(
        &self,
        window: &Window<'_>,
        n_components: usize,
        seed: Option<u64>,
    ) -> Result<MixtureSummary> {
        self.validate()?;
        if n_components == 0 {
            return Err(Error::Configuration(
                "n_components must be positive".to_string(),
            ));
        }
        let n = window.len();
        if n < n_components {
            return Err(Error::InsufficientData {
                expected: n_components,
                actual: n,
            });
        }

        let seed = seed.unwrap_or_else(|| {
            let drawn = rand::thread_rng().gen();
            debug!("No seed given, drew {drawn}");
            drawn
        });
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let rows: Vec<&[f64]> = window.rows().collect();
        let init = kmeans(&rows, n_components, KMEANS_MAX_ITER, &mut rng);
        debug!("k-means initialisation took {} iterations", init.iterations);

        let data = DMatrix::from_row_slice(n, window.dim(), window.as_slice());
        let resp = DMatrix::from_fn(n, n_components, |i, j| {
            if init.labels[i] == j {
                1.0
            } else {
                0.0
            }
        });
        let (mut weights, mut means, mut variances) = self.m_step(&data, &resp);

        let mut lower_bound = f64::NEG_INFINITY;
        let mut converged = false;
        let mut iterations = 0;
        for iter in 1..=self.max_iter {
            iterations = iter;
            let previous = lower_bound;
            let (resp, bound) = self.e_step(&data, &weights, &means, &variances)?;
            (weights, means, variances) = self.m_step(&data, &resp);
            lower_bound = bound;

            if (lower_bound - previous).abs() < self.tol {
                converged = true;
                break;
            }
        }

        if variances.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(Error::convergence(0, "ill-defined empirical covariance"));
        }
        if !converged {
            let message = format!(
                "EM did not converge within {} iterations (lower bound {lower_bound:.6})",
                self.max_iter
            );
            if self.require_convergence {
                return Err(Error::convergence(0, message));
            }
            warn!("{message}");
        }
        debug!(iterations, lower_bound, "EM finished");

        let std_devs = variances.map(f64::sqrt);
        let summary = MixtureSummary::new(means, std_devs, weights)
            .map_err(|e| Error::convergence(0, format!("invalid fitted mixture: {e}")))?;
        Ok(summary.with_diagnostics(FitDiagnostics {
            iterations,
            converged,
            lower_bound,
        }))
    }

    fn name(&self) -> &'static str {
        "diagonal-gmm"
    }
}
