//! Cross-window component linking
//!
//! Given one [`MixtureSummary`](cmc_mixture::MixtureSummary) per window, the
//! [`ComponentLinker`] compares the means of every adjacent pair and marks
//! components closer than `epsilon` as connected. [`FeatureAggregator`] turns
//! the resulting [`ConnectionRecord`]s into a single feature column and
//! [`StatsReporter`] into a per-transition table.
//!
//! # Example
//!
//! ```rust
//! use cmc_linking::{ComponentLinker, FeatureAggregator};
//! use cmc_mixture::MixtureSummary;
//!
//! let summary = |means: &[f64]| {
//!     let rows: Vec<Vec<f64>> = means.iter().map(|&m| vec![m]).collect();
//!     let stds = vec![vec![1.0]; means.len()];
//!     let weights = vec![1.0 / means.len() as f64; means.len()];
//!     MixtureSummary::from_components(&rows, &stds, &weights).unwrap()
//! };
//!
//! let linker = ComponentLinker::new(0.5).unwrap();
//! let records = linker
//!     .link(&[summary(&[0.0, 1.0]), summary(&[0.2, 5.0])])
//!     .unwrap();
//!
//! let features = FeatureAggregator::new().aggregate(&records);
//! assert_eq!(features.to_vec(), vec![1]);
//! ```

pub mod aggregate;
pub mod linker;
pub mod matching;
pub mod stats;
pub mod types;

pub use aggregate::{FeatureAggregator, FeatureMatrix};
pub use linker::{distance_matrix, ComponentLinker};
pub use matching::{
    hungarian, Matching, MatchingPolicy, MatchingStrategy, OptimalAssignment, Positional,
};
pub use stats::{ComponentStats, StatsReporter};
pub use types::{ConnectionRecord, LinkMatrix};
