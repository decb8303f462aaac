//! Core types for connected mixture component analysis
//!
//! This crate provides the pieces every stage of the pipeline shares:
//!
//! - [`Series`] / [`Window`]: shape-checked, row-major observation storage
//! - [`WindowSlicer`]: fixed-size sliding windows over a series
//! - [`ExecutionEngine`]: sequential or Rayon-backed fan-out with ordered results
//! - [`CancellationToken`]: cooperative cancellation between window fits
//! - [`pipeline`]: run context and event bus
//! - [`MinMaxScaler`]: the scaling stage that usually precedes fitting
//!
//! # Example
//!
//! ```rust
//! use cmc_core::{Series, WindowSlicer};
//!
//! let values: Vec<f64> = (0..200).map(|i| (i as f64 * 0.1).sin()).collect();
//! let series = Series::from_column(&values).unwrap();
//!
//! let slicer = WindowSlicer::new(50, 50).unwrap();
//! let offsets: Vec<usize> = slicer.slice(&series).map(|w| w.offset()).collect();
//! assert_eq!(offsets, vec![0, 50, 100]);
//! ```

pub mod error;
pub mod execution;
pub mod pipeline;
pub mod preprocess;
pub mod series;
pub mod window;

pub use error::{Error, Result};
pub use execution::{
    sequential, CancellationToken, ExecutionEngine, ExecutionStrategy, SequentialEngine,
};
#[cfg(feature = "parallel")]
pub use execution::{parallel, ParallelEngine};
pub use preprocess::MinMaxScaler;
pub use series::{Series, Window};
pub use window::{WindowSlicer, Windows};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
