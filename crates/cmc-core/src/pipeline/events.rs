//! Events published while a fit runs
//!
//! Observers (logging, metrics, a plotting front end) subscribe to an
//! [`EventBus`] and follow a run without the orchestrator knowing about them.

use super::context::{FitContext, Stage};
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

/// What happened, tagged with the run's trace id
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Run started on a series of shape `(len, dim)`
    FitStarted { trace_id: Uuid, len: usize, dim: usize },

    WindowsSliced {
        trace_id: Uuid,
        n_windows: usize,
        window_size: usize,
        step_size: usize,
    },

    /// A window's mixture was estimated
    WindowFitted {
        trace_id: Uuid,
        window: usize,
        iterations: usize,
        converged: bool,
    },

    /// Transition `t - 1 -> t` was linked
    TransitionLinked {
        trace_id: Uuid,
        t: usize,
        connections: usize,
    },

    FitCompleted {
        trace_id: Uuid,
        n_transitions: usize,
        #[serde(skip)]
        duration: Duration,
    },

    FitFailed {
        trace_id: Uuid,
        stage: Stage,
        error: String,
    },
}

impl PipelineEvent {
    pub fn trace_id(&self) -> Uuid {
        match self {
            Self::FitStarted { trace_id, .. }
            | Self::WindowsSliced { trace_id, .. }
            | Self::WindowFitted { trace_id, .. }
            | Self::TransitionLinked { trace_id, .. }
            | Self::FitCompleted { trace_id, .. }
            | Self::FitFailed { trace_id, .. } => *trace_id,
        }
    }

    /// Per-window and per-transition events, as opposed to run milestones
    pub fn is_progress(&self) -> bool {
        matches!(
            self,
            Self::WindowFitted { .. } | Self::TransitionLinked { .. }
        )
    }
}

/// Subscriber to pipeline events
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &PipelineEvent, context: &FitContext);

    /// Filter consulted before `handle_event`
    fn is_interested(&self, event: &PipelineEvent) -> bool {
        let _ = event;
        true
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Fan-out of events to every registered handler, in registration order
///
/// Cloning shares the handler list.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<Mutex<Vec<Box<dyn EventHandler>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Box<dyn EventHandler>>>> {
        self.handlers
            .lock()
            .map_err(|e| Error::Execution(format!("event bus lock poisoned: {e}")))
    }

    pub fn register<H>(&self, handler: H) -> Result<()>
    where
        H: EventHandler + 'static,
    {
        self.lock()?.push(Box::new(handler));
        Ok(())
    }

    /// Deliver `event` to the interested handlers
    pub fn emit(&self, event: PipelineEvent, context: &FitContext) -> Result<()> {
        for handler in self.lock()?.iter().filter(|h| h.is_interested(&event)) {
            handler.handle_event(&event, context);
        }
        Ok(())
    }

    pub fn handler_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = match self.handlers.lock() {
            Ok(handlers) => handlers.iter().map(|h| h.name().to_string()).collect(),
            Err(_) => vec!["<poisoned>".to_string()],
        };
        f.debug_struct("EventBus").field("handlers", &names).finish()
    }
}

/// Writes milestones through the `log` facade at a fixed level
///
/// Progress events go to `trace`; failures always go to `error`.
pub struct LoggingHandler {
    level: log::Level,
}

impl LoggingHandler {
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl EventHandler for LoggingHandler {
    fn handle_event(&self, event: &PipelineEvent, _context: &FitContext) {
        match event {
            PipelineEvent::FitStarted { trace_id, len, dim } => {
                log::log!(self.level, "[{trace_id}] fitting series of shape ({len}, {dim})");
            }
            PipelineEvent::WindowsSliced {
                trace_id,
                n_windows,
                window_size,
                step_size,
            } => {
                log::log!(
                    self.level,
                    "[{trace_id}] {n_windows} windows of {window_size} rows, step {step_size}"
                );
            }
            PipelineEvent::FitCompleted {
                trace_id,
                n_transitions,
                duration,
            } => {
                log::log!(
                    self.level,
                    "[{trace_id}] {n_transitions} transitions linked in {duration:?}"
                );
            }
            PipelineEvent::FitFailed {
                trace_id,
                stage,
                error,
            } => {
                log::error!("[{trace_id}] {stage} failed: {error}");
            }
            progress => log::trace!("{progress:?}"),
        }
    }
}

/// Counters accumulated over every run seen by a [`MetricsHandler`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PipelineMetrics {
    pub total_runs: usize,
    pub completed_runs: usize,
    pub windows_fitted: usize,
    pub unconverged_windows: usize,
    pub transitions_linked: usize,
    pub total_connections: usize,
    /// Failures per stage
    pub errors: BTreeMap<Stage, usize>,
}

/// Aggregates events into [`PipelineMetrics`]
#[derive(Default)]
pub struct MetricsHandler {
    metrics: Arc<Mutex<PipelineMetrics>>,
}

impl MetricsHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Second handle on the same counters, to register on a bus
    pub fn shared(&self) -> Self {
        Self {
            metrics: Arc::clone(&self.metrics),
        }
    }

    pub fn snapshot(&self) -> Result<PipelineMetrics> {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .map_err(|e| Error::Execution(format!("metrics lock poisoned: {e}")))
    }
}

impl EventHandler for MetricsHandler {
    fn handle_event(&self, event: &PipelineEvent, _context: &FitContext) {
        let Ok(mut m) = self.metrics.lock() else {
            log::error!("metrics lock poisoned, dropping {event:?}");
            return;
        };

        match event {
            PipelineEvent::FitStarted { .. } => m.total_runs += 1,
            PipelineEvent::FitCompleted { .. } => m.completed_runs += 1,
            PipelineEvent::WindowFitted { converged, .. } => {
                m.windows_fitted += 1;
                if !converged {
                    m.unconverged_windows += 1;
                }
            }
            PipelineEvent::TransitionLinked { connections, .. } => {
                m.transitions_linked += 1;
                m.total_connections += connections;
            }
            PipelineEvent::FitFailed { stage, .. } => {
                *m.errors.entry(*stage).or_default() += 1;
            }
            PipelineEvent::WindowsSliced { .. } => {}
        }
    }
}

/// Handler that ignores everything
#[derive(Default, Clone)]
pub struct NullEventHandler;

impl EventHandler for NullEventHandler {
    fn handle_event(&self, _event: &PipelineEvent, _context: &FitContext) {}

    fn is_interested(&self, _event: &PipelineEvent) -> bool {
        false
    }
}
