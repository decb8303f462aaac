//! Shape-checked time series storage
//!
//! A [`Series`] holds `N` observations of dimension `D` in row-major order,
//! so every window over it is a contiguous slice.

use crate::{Error, Result};

/// An ordered sequence of `D`-dimensional observations
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    values: Vec<f64>,
    len: usize,
    dim: usize,
}

impl Series {
    /// Build a series from row-major values
    ///
    /// `values.len()` must be a multiple of `dim`.
    pub fn from_row_major(values: Vec<f64>, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidInput(
                "Series dimension must be at least 1".to_string(),
            ));
        }
        if values.len() % dim != 0 {
            return Err(Error::InvalidInput(format!(
                "Series of {} values cannot be split into rows of dimension {dim}",
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::non_finite("series"));
        }
        let len = values.len() / dim;
        Ok(Self { values, len, dim })
    }

    /// Build a series from one row per observation
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let dim = rows.first().map(|r| r.as_ref().len()).unwrap_or(1);
        let mut values = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(Error::size_mismatch(dim, row.len(), &format!("row {i}")));
            }
            values.extend_from_slice(row);
        }
        Self::from_row_major(values, dim)
    }

    /// Build a univariate series (`D = 1`)
    pub fn from_column(values: &[f64]) -> Result<Self> {
        Self::from_row_major(values.to_vec(), 1)
    }

    /// Number of observations `N`
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the series has no observations
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Observation dimension `D`
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// `(N, D)`
    pub fn shape(&self) -> (usize, usize) {
        (self.len, self.dim)
    }

    /// Row-major backing values
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// A single observation
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.len {
            return None;
        }
        let start = index * self.dim;
        Some(&self.values[start..start + self.dim])
    }

    /// Iterate over observations in order
    pub fn rows(&self) -> std::slice::Chunks<'_, f64> {
        self.values.chunks(self.dim)
    }

    /// Borrow `len` rows starting at `offset` as a window tagged `index`
    pub fn window(&self, index: usize, offset: usize, len: usize) -> Result<Window<'_>> {
        if offset + len > self.len {
            return Err(Error::InvalidInput(format!(
                "Window {index} [{offset}, {}) exceeds series length {}",
                offset + len,
                self.len
            )));
        }
        let start = offset * self.dim;
        let end = start + len * self.dim;
        Ok(Window {
            index,
            offset,
            dim: self.dim,
            values: &self.values[start..end],
        })
    }
}

/// A contiguous, borrowed slice of a [`Series`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a> {
    index: usize,
    offset: usize,
    dim: usize,
    values: &'a [f64],
}

impl<'a> Window<'a> {
    /// Position `t` of this window in the emitted window sequence
    pub fn index(&self) -> usize {
        self.index
    }

    /// Offset of the first row in the parent series
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of observations in the window
    pub fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    /// Whether the window has no observations
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observation dimension `D`
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Row-major values of the window
    pub fn as_slice(&self) -> &'a [f64] {
        self.values
    }

    /// Iterate over the observations of the window
    pub fn rows(&self) -> std::slice::Chunks<'a, f64> {
        self.values.chunks(self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_shape() {
        let series = Series::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
        assert_eq!(series.shape(), (3, 2));
        assert_eq!(series.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(series.row(3), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        let err = Series::from_rows(&rows).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Series::from_column(&[1.0, f64::NAN]).is_err());
        assert!(Series::from_column(&[f64::INFINITY]).is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(Series::from_row_major(vec![], 0).is_err());
    }

    #[test]
    fn test_window_is_contiguous_slice() {
        let series = Series::from_rows(&[[0.0, 0.5], [1.0, 1.5], [2.0, 2.5], [3.0, 3.5]]).unwrap();
        let window = series.window(1, 1, 2).unwrap();
        assert_eq!(window.index(), 1);
        assert_eq!(window.offset(), 1);
        assert_eq!(window.len(), 2);
        assert_eq!(window.as_slice(), &[1.0, 1.5, 2.0, 2.5]);
        let rows: Vec<&[f64]> = window.rows().collect();
        assert_eq!(rows, vec![&[1.0, 1.5][..], &[2.0, 2.5][..]]);
    }

    #[test]
    fn test_window_out_of_bounds() {
        let series = Series::from_column(&[1.0, 2.0, 3.0]).unwrap();
        assert!(series.window(0, 2, 2).is_err());
        assert!(series.window(0, 1, 2).is_ok());
    }
}
