//! Connection statistics over a fitted run

use crate::types::ConnectionRecord;
use cmc_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parallel sequences of transition index and link count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStats {
    pub time_index: Vec<usize>,
    pub num_connections: Vec<usize>,
}

impl ComponentStats {
    pub fn len(&self) -> usize {
        self.time_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_index.is_empty()
    }

    /// `(t, count)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.time_index
            .iter()
            .copied()
            .zip(self.num_connections.iter().copied())
    }

    pub fn total_connections(&self) -> usize {
        self.num_connections.iter().sum()
    }

    pub fn mean_connections(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.total_connections() as f64 / self.len() as f64)
        }
    }

    pub fn max_connections(&self) -> Option<usize> {
        self.num_connections.iter().copied().max()
    }
}

impl fmt::Display for ComponentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8} {:>12}", "t", "connections")?;
        for (t, count) in self.iter() {
            writeln!(f, "{t:>8} {count:>12}")?;
        }
        Ok(())
    }
}

/// Builds [`ComponentStats`] from connection records
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsReporter;

impl StatsReporter {
    pub fn new() -> Self {
        Self
    }

    /// Fails with `NotFitted` when there are no records
    pub fn report(&self, records: &[ConnectionRecord]) -> Result<ComponentStats> {
        if records.is_empty() {
            return Err(Error::NotFitted(
                "no connection records; run fit_transform first".to_string(),
            ));
        }
        Ok(ComponentStats {
            time_index: records.iter().map(|r| r.t).collect(),
            num_connections: records.iter().map(ConnectionRecord::num_connections).collect(),
        })
    }
}
