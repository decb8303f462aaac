//! Fit execution context
//!
//! One `FitContext` is created per `fit_transform` call. It carries the trace
//! id stamped on every event of the run and the wall time of each [`Stage`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Stages of one pipeline run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Configure,
    Slice,
    Estimate,
    Link,
    Aggregate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::Slice => "slice",
            Stage::Estimate => "estimate",
            Stage::Link => "link",
            Stage::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run trace id and stage clock
#[derive(Debug, Clone)]
pub struct FitContext {
    pub trace_id: Uuid,
    started: Instant,
    timings: BTreeMap<Stage, Duration>,
}

impl FitContext {
    /// Context with a fresh v4 trace id
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4())
    }

    pub fn with_trace_id(trace_id: Uuid) -> Self {
        Self {
            trace_id,
            started: Instant::now(),
            timings: BTreeMap::new(),
        }
    }

    /// Run `f` and add its wall time to `stage`
    pub fn time_stage<F, R>(&mut self, stage: Stage, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        *self.timings.entry(stage).or_default() += start.elapsed();
        result
    }

    /// Time since the context was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Timed stages in execution order
    pub fn stage_timings(&self) -> &BTreeMap<Stage, Duration> {
        &self.timings
    }
}

impl Default for FitContext {
    fn default() -> Self {
        Self::new()
    }
}
