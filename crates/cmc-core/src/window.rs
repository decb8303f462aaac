//! Fixed-size sliding windows over a series
//!
//! Windows start at offsets `0, step, 2 * step, ...` and only offsets strictly
//! below `N - window_size` are emitted. Windows are never padded, so a series
//! with `N <= window_size` yields no windows at all.

use crate::series::{Series, Window};
use crate::{Error, Result};

/// Partitions a series into fixed-size, possibly overlapping windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSlicer {
    window_size: usize,
    step_size: usize,
}

impl WindowSlicer {
    /// Create a slicer, rejecting zero sizes
    pub fn new(window_size: usize, step_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::Configuration(
                "window_size must be positive".to_string(),
            ));
        }
        if step_size == 0 {
            return Err(Error::Configuration("step_size must be positive".to_string()));
        }
        Ok(Self {
            window_size,
            step_size,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn step_size(&self) -> usize {
        self.step_size
    }

    /// Number of windows produced for a series of length `n`
    pub fn count(&self, n: usize) -> usize {
        if n <= self.window_size {
            return 0;
        }
        (n - self.window_size).div_ceil(self.step_size)
    }

    /// Start offsets of the windows for a series of length `n`
    pub fn offsets(&self, n: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.count(n)).map(move |t| t * self.step_size)
    }

    /// Lazily slice `series` into windows
    ///
    /// The returned iterator borrows the series; calling `slice` again restarts
    /// from the first window.
    pub fn slice<'a>(&self, series: &'a Series) -> Windows<'a> {
        Windows {
            series,
            window_size: self.window_size,
            step_size: self.step_size,
            next: 0,
            total: self.count(series.len()),
        }
    }
}

/// Iterator over the windows of a series
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    series: &'a Series,
    window_size: usize,
    step_size: usize,
    next: usize,
    total: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let t = self.next;
        self.next += 1;
        // Bounds were established by `count`
        self.series
            .window(t, t * self.step_size, self.window_size)
            .ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

impl std::iter::FusedIterator for Windows<'_> {}
