//! Pipeline configuration

use cmc_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters of one connected-mixture-components run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmcConfig {
    /// Mixture components fitted per window
    pub n_components: usize,
    /// Observations per window
    pub window_size: usize,
    /// Offset between consecutive window starts
    pub step_size: usize,
    /// Components link when their means are strictly closer than this
    pub epsilon: f64,
    /// Seed passed to the estimator for every window
    pub random_state: Option<u64>,
}

impl Default for CmcConfig {
    fn default() -> Self {
        Self {
            n_components: 4,
            window_size: 168,
            step_size: 24,
            epsilon: 0.5,
            random_state: Some(42),
        }
    }
}

impl CmcConfig {
    /// Validated configuration
    pub fn new(
        n_components: usize,
        window_size: usize,
        step_size: usize,
        epsilon: f64,
        random_state: Option<u64>,
    ) -> Result<Self> {
        let config = Self {
            n_components,
            window_size,
            step_size,
            epsilon,
            random_state,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn builder() -> CmcConfigBuilder {
        CmcConfigBuilder::new()
    }

    /// Check every parameter is in range
    pub fn validate(&self) -> Result<()> {
        if self.n_components == 0 {
            return Err(Error::Configuration(
                "n_components must be positive".to_string(),
            ));
        }
        if self.window_size == 0 {
            return Err(Error::Configuration(
                "window_size must be positive".to_string(),
            ));
        }
        if self.step_size == 0 {
            return Err(Error::Configuration(
                "step_size must be positive".to_string(),
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(Error::Configuration(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Builder for [`CmcConfig`], starting from the defaults
#[derive(Debug, Clone, Default)]
pub struct CmcConfigBuilder {
    config: CmcConfig,
}

impl CmcConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_components(mut self, n_components: usize) -> Self {
        self.config.n_components = n_components;
        self
    }

    pub fn window_size(mut self, window_size: usize) -> Self {
        self.config.window_size = window_size;
        self
    }

    pub fn step_size(mut self, step_size: usize) -> Self {
        self.config.step_size = step_size;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// `None` lets the estimator draw a fresh seed per window
    pub fn random_state(mut self, random_state: Option<u64>) -> Self {
        self.config.random_state = random_state;
        self
    }

    pub fn build(self) -> Result<CmcConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
