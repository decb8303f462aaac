//! Estimator seam between the windowing pipeline and the numerical fit

use crate::summary::MixtureSummary;
use cmc_core::{Result, Window};

/// Fits a K-component diagonal-covariance Gaussian mixture to one window
///
/// Implementations must be deterministic for a fixed `seed`. Failures are
/// reported as `Error::Convergence` (or `Error::InsufficientData` when the
/// window has fewer rows than components) and must never be replaced by a
/// default summary.
pub trait MixtureEstimator: Send + Sync {
    /// Fit `n_components` Gaussians to `window`
    fn fit(
        &self,
        window: &Window<'_>,
        n_components: usize,
        seed: Option<u64>,
    ) -> Result<MixtureSummary>;

    /// Name used in logs and diagnostics
    fn name(&self) -> &'static str;
}

impl<E: MixtureEstimator + ?Sized> MixtureEstimator for &E {
    fn fit(
        &self,
        window: &Window<'_>,
        n_components: usize,
        seed: Option<u64>,
    ) -> Result<MixtureSummary> {
        (**self).fit(window, n_components, seed)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<E: MixtureEstimator + ?Sized> MixtureEstimator for Box<E> {
    fn fit(
        &self,
        window: &Window<'_>,
        n_components: usize,
        seed: Option<u64>,
    ) -> Result<MixtureSummary> {
        (**self).fit(window, n_components, seed)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<E: MixtureEstimator + ?Sized> MixtureEstimator for std::sync::Arc<E> {
    fn fit(
        &self,
        window: &Window<'_>,
        n_components: usize,
        seed: Option<u64>,
    ) -> Result<MixtureSummary> {
        (**self).fit(window, n_components, seed)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
