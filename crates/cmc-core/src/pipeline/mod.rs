//! Pipeline infrastructure shared by the fitting stages
//!
//! The orchestrator itself lives in `cmc-model`; this module only provides
//! the run context and the event bus it reports through.

pub mod context;
pub mod events;

pub use context::{FitContext, Stage};
pub use events::{
    EventBus, EventHandler, LoggingHandler, MetricsHandler, NullEventHandler, PipelineEvent,
    PipelineMetrics,
};
