//! Error types for connected mixture component analysis
//!
//! Provides a unified error type for all cmc crates.

use thiserror::Error;

/// Core error type for the windowing, estimation and linking pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration value (non-positive sizes, negative epsilon)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input data (shape mismatches, non-finite values)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not enough data for the requested operation
    #[error("Insufficient data: expected at least {expected}, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Mixture estimation failed for one window
    #[error("Convergence error in window {window}: {reason}")]
    Convergence { window: usize, reason: String },

    /// Results requested before a successful fit
    #[error("Not fitted: {0}")]
    NotFitted(String),

    /// Any other failure raised while fitting one window
    #[error("Window {window}: {source}")]
    Window {
        window: usize,
        #[source]
        source: Box<Error>,
    },

    /// The run was cancelled between window fits
    #[error("Cancelled after {completed} of {total} window fits")]
    Cancelled { completed: usize, total: usize },

    /// Threading or parallelization error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for a shape mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::InvalidInput(format!("{context} contains NaN or infinite values"))
    }

    /// Create a convergence error for the given window
    pub fn convergence(window: usize, reason: impl Into<String>) -> Self {
        Self::Convergence {
            window,
            reason: reason.into(),
        }
    }

    /// Tag an error with the window it occurred in.
    ///
    /// Estimators report failures without knowing their window position;
    /// the orchestrator fills it in. Convergence errors are re-tagged in
    /// place, other estimator failures are wrapped in [`Error::Window`].
    /// Cancellation and already-tagged errors pass through unchanged.
    pub fn in_window(self, window: usize) -> Self {
        match self {
            Self::Convergence { reason, .. } => Self::Convergence { window, reason },
            err @ (Self::Cancelled { .. } | Self::Window { .. }) => err,
            other => Self::Window {
                window,
                source: Box::new(other),
            },
        }
    }

    /// Window index carried by a per-window failure
    pub fn window(&self) -> Option<usize> {
        match self {
            Self::Convergence { window, .. } | Self::Window { window, .. } => Some(*window),
            _ => None,
        }
    }
}
