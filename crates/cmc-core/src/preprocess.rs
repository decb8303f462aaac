//! Min-max scaling applied to a series before fitting

use crate::series::Series;
use crate::{Error, Result};

/// Per-dimension scaling of a series into `[0, 1]`
///
/// Constant dimensions map to `0.0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the per-dimension range of `series`
    pub fn fit(&mut self, series: &Series) -> Result<&mut Self> {
        if series.is_empty() {
            return Err(Error::InsufficientData {
                expected: 1,
                actual: 0,
            });
        }
        let dim = series.dim();
        let mut min = vec![f64::INFINITY; dim];
        let mut max = vec![f64::NEG_INFINITY; dim];
        for row in series.rows() {
            for (d, &x) in row.iter().enumerate() {
                min[d] = min[d].min(x);
                max[d] = max[d].max(x);
            }
        }
        self.min = min;
        self.max = max;
        Ok(self)
    }

    pub fn is_fitted(&self) -> bool {
        !self.min.is_empty()
    }

    pub fn data_min(&self) -> &[f64] {
        &self.min
    }

    pub fn data_max(&self) -> &[f64] {
        &self.max
    }

    /// Scale `series` using the learned range
    pub fn transform(&self, series: &Series) -> Result<Series> {
        self.check_dim(series)?;
        let dim = series.dim();
        let values = series
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let d = i % dim;
                let range = self.max[d] - self.min[d];
                if range > 0.0 {
                    (x - self.min[d]) / range
                } else {
                    0.0
                }
            })
            .collect();
        Series::from_row_major(values, dim)
    }

    /// Fit then transform in one step
    pub fn fit_transform(&mut self, series: &Series) -> Result<Series> {
        self.fit(series)?;
        self.transform(series)
    }

    /// Map scaled values back to the original range
    pub fn inverse_transform(&self, series: &Series) -> Result<Series> {
        self.check_dim(series)?;
        let dim = series.dim();
        let values = series
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let d = i % dim;
                self.min[d] + x * (self.max[d] - self.min[d])
            })
            .collect();
        Series::from_row_major(values, dim)
    }

    fn check_dim(&self, series: &Series) -> Result<()> {
        if !self.is_fitted() {
            return Err(Error::NotFitted("MinMaxScaler has not been fitted".to_string()));
        }
        if series.dim() != self.min.len() {
            return Err(Error::size_mismatch(self.min.len(), series.dim(), "scaler dimension"));
        }
        Ok(())
    }
}
