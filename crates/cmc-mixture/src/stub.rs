//! Scripted estimator for exercising the pipeline without numerical fitting
//!
//! Available in tests and with the `test-utils` feature.

use crate::summary::MixtureSummary;
use crate::traits::MixtureEstimator;
use cmc_core::{Error, Result, Window};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns a pre-built summary per window index
#[derive(Debug, Default)]
pub struct StubEstimator {
    summaries: HashMap<usize, MixtureSummary>,
    fallback: Option<MixtureSummary>,
    failures: HashMap<usize, String>,
    calls: AtomicUsize,
}

impl StubEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summaries returned for windows `0, 1, 2, ...` in order
    pub fn from_sequence(summaries: Vec<MixtureSummary>) -> Self {
        let mut stub = Self::new();
        stub.summaries = summaries.into_iter().enumerate().collect();
        stub
    }

    /// Summary returned for windows without a scripted entry
    pub fn with_fallback(mut self, summary: MixtureSummary) -> Self {
        self.fallback = Some(summary);
        self
    }

    /// Script a summary for one window
    pub fn with_window(mut self, window: usize, summary: MixtureSummary) -> Self {
        self.summaries.insert(window, summary);
        self
    }

    /// Script a convergence failure for one window
    pub fn failing_at(mut self, window: usize, reason: impl Into<String>) -> Self {
        self.failures.insert(window, reason.into());
        self
    }

    /// Number of `fit` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MixtureEstimator for StubEstimator {
    fn fit(
        &self,
        window: &Window<'_>,
        n_components: usize,
        _seed: Option<u64>,
    ) -> Result<MixtureSummary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let t = window.index();
        if let Some(reason) = self.failures.get(&t) {
            return Err(Error::convergence(t, reason.clone()));
        }
        let summary = self
            .summaries
            .get(&t)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| Error::convergence(t, "no scripted summary"))?;
        if summary.n_components() != n_components {
            return Err(Error::size_mismatch(
                n_components,
                summary.n_components(),
                &format!("scripted summary for window {t}"),
            ));
        }
        Ok(summary)
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// One-dimensional summary with the given means, unit spread and equal weights
pub fn summary_1d(means: &[f64]) -> MixtureSummary {
    let k = means.len();
    let rows: Vec<Vec<f64>> = means.iter().map(|&m| vec![m]).collect();
    let stds = vec![vec![1.0]; k];
    let weights = vec![1.0 / k as f64; k];
    MixtureSummary::from_components(&rows, &stds, &weights)
        .expect("scripted 1-d summary must be valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmc_core::Series;

    #[test]
    fn test_scripted_sequence() {
        let series = Series::from_column(&[0.0; 10]).unwrap();
        let stub =
            StubEstimator::from_sequence(vec![summary_1d(&[0.0, 1.0]), summary_1d(&[2.0, 3.0])]);

        let w0 = series.window(0, 0, 5).unwrap();
        let w1 = series.window(1, 5, 5).unwrap();
        assert_eq!(stub.fit(&w0, 2, None).unwrap().mean(0), Some(vec![0.0]));
        assert_eq!(stub.fit(&w1, 2, None).unwrap().mean(1), Some(vec![3.0]));
        assert_eq!(stub.calls(), 2);

        let w2 = series.window(2, 0, 5).unwrap();
        assert!(stub.fit(&w2, 2, None).is_err());
    }

    #[test]
    fn test_scripted_failure() {
        let series = Series::from_column(&[0.0; 4]).unwrap();
        let stub = StubEstimator::new()
            .with_fallback(summary_1d(&[0.0]))
            .failing_at(1, "collapsed");
        let w1 = series.window(1, 0, 2).unwrap();
        match stub.fit(&w1, 1, None) {
            Err(Error::Convergence { window, reason }) => {
                assert_eq!(window, 1);
                assert_eq!(reason, "collapsed");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
