//! # Connected Mixture Components
//!
//! Sliding-window Gaussian mixture features for time series. Every window of
//! the series gets its own mixture fit; components of adjacent windows whose
//! means are closer than `epsilon` count as connected, and the number of
//! connections per transition becomes a feature describing how stable the
//! local distribution is.
//!
//! ## Crates
//!
//! - [`core`]: series storage, windowing, execution engines, events, scaling
//! - [`mixture`]: the mixture estimator trait and the diagonal-covariance EM fit
//! - [`linking`]: component linking, feature aggregation, connection statistics
//! - [`model`]: the end-to-end `fit_transform` pipeline
//!
//! ## Quick Start
//!
//! ```rust
//! use connected_mixtures::prelude::*;
//!
//! let values: Vec<f64> = (0..300)
//!     .map(|i| (if i % 2 == 0 { 0.25 } else { 0.75 }) + (i % 5) as f64 * 0.01)
//!     .collect();
//! let series = Series::from_column(&values).unwrap();
//!
//! let config = CmcConfig::builder()
//!     .n_components(2)
//!     .window_size(100)
//!     .step_size(50)
//!     .epsilon(0.1)
//!     .build()
//!     .unwrap();
//!
//! let fit = ConnectedMixtureComponents::new(config)
//!     .unwrap()
//!     .fit_transform(&series)
//!     .unwrap();
//! let stats = fit.component_stats().unwrap();
//! assert_eq!(stats.time_index, vec![1, 2, 3]);
//! ```

// Re-export the workspace crates
pub use cmc_core as core;
pub use cmc_linking as linking;
pub use cmc_mixture as mixture;
pub use cmc_model as model;

pub use cmc_core::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use cmc_core::{
        CancellationToken, Error, ExecutionEngine, MinMaxScaler, Result, SequentialEngine, Series,
        WindowSlicer,
    };
    #[cfg(feature = "parallel")]
    pub use cmc_core::ParallelEngine;

    pub use cmc_linking::{
        ComponentLinker, ComponentStats, ConnectionRecord, FeatureAggregator, FeatureMatrix,
        LinkMatrix, MatchingPolicy, MatchingStrategy, OptimalAssignment, Positional,
        StatsReporter,
    };
    pub use cmc_mixture::{DiagonalGmm, MixtureEstimator, MixtureSummary};
    pub use cmc_model::{CmcConfig, CmcConfigBuilder, CmcFit, ConnectedMixtureComponents};
}
