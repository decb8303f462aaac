//! Connected mixture components feature extraction
//!
//! Fits a Gaussian mixture to every sliding window of a series, links the
//! components of adjacent windows whose means lie within `epsilon` of each
//! other, and emits the number of links per transition as a feature column.
//!
//! # Example
//!
//! ```rust
//! use cmc_core::Series;
//! use cmc_model::{CmcConfig, ConnectedMixtureComponents};
//!
//! let values: Vec<f64> = (0..120)
//!     .map(|i| (if i % 3 == 0 { 0.2 } else { 0.8 }) + (i % 7) as f64 * 0.01)
//!     .collect();
//! let series = Series::from_column(&values).unwrap();
//!
//! let config = CmcConfig::builder()
//!     .n_components(2)
//!     .window_size(40)
//!     .step_size(20)
//!     .epsilon(0.1)
//!     .build()
//!     .unwrap();
//! let model = ConnectedMixtureComponents::new(config).unwrap();
//!
//! let fit = model.fit_transform(&series).unwrap();
//! assert_eq!(fit.features().shape(), (fit.n_windows() - 1, 1));
//! ```

pub mod config;
pub mod model;

pub use config::{CmcConfig, CmcConfigBuilder};
pub use model::{CmcFit, ConnectedMixtureComponents};
