//! Gaussian mixture estimation for sliding windows
//!
//! The pipeline only depends on the [`MixtureEstimator`] trait; [`DiagonalGmm`]
//! is the default implementation (k-means initialised EM with diagonal
//! covariance) and [`stub::StubEstimator`] scripts results for tests.
//!
//! # Example
//!
//! ```rust
//! use cmc_core::Series;
//! use cmc_mixture::{DiagonalGmm, MixtureEstimator};
//!
//! let values: Vec<f64> = (0..40)
//!     .map(|i| (if i % 2 == 0 { 0.0 } else { 3.0 }) + (i as f64) * 1e-3)
//!     .collect();
//! let series = Series::from_column(&values).unwrap();
//! let window = series.window(0, 0, series.len()).unwrap();
//!
//! let summary = DiagonalGmm::new().fit(&window, 2, Some(42)).unwrap();
//! assert_eq!(summary.n_components(), 2);
//! ```

pub mod gmm;
pub mod kmeans;
pub mod summary;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod stub;

pub use gmm::DiagonalGmm;
pub use summary::{FitDiagnostics, MixtureSummary};
pub use traits::MixtureEstimator;
