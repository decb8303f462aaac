//! The connected-mixture-components pipeline
//!
//! `fit_transform` slices the series into windows, fits one mixture per
//! window, links the components of every adjacent pair of windows and counts
//! the links. Everything a run produces is returned in a [`CmcFit`]; the
//! model itself holds no per-run state and can be shared across threads.

use crate::config::CmcConfig;
use cmc_core::pipeline::{EventBus, FitContext, PipelineEvent, Stage};
use cmc_core::{CancellationToken, Error, ExecutionEngine, Result, Series, WindowSlicer};
use cmc_linking::{
    ComponentLinker, ComponentStats, ConnectionRecord, FeatureAggregator, FeatureMatrix,
    MatchingPolicy, MatchingStrategy, StatsReporter,
};
use cmc_mixture::{DiagonalGmm, MixtureEstimator, MixtureSummary};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Sliding-window mixture fitting with cross-window component linking
#[derive(Debug, Clone)]
pub struct ConnectedMixtureComponents<E = DiagonalGmm, P = MatchingStrategy> {
    config: CmcConfig,
    estimator: E,
    policy: P,
    events: Option<EventBus>,
}

impl ConnectedMixtureComponents {
    /// Model with the default estimator and positional matching
    pub fn new(config: CmcConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            estimator: DiagonalGmm::new(),
            policy: MatchingStrategy::Positional,
            events: None,
        })
    }
}

impl Default for ConnectedMixtureComponents {
    fn default() -> Self {
        Self {
            config: CmcConfig::default(),
            estimator: DiagonalGmm::new(),
            policy: MatchingStrategy::Positional,
            events: None,
        }
    }
}

impl<E, P> ConnectedMixtureComponents<E, P>
where
    E: MixtureEstimator,
    P: MatchingPolicy + Clone,
{
    /// Replace the per-window mixture estimator
    pub fn with_estimator<E2: MixtureEstimator>(
        self,
        estimator: E2,
    ) -> ConnectedMixtureComponents<E2, P> {
        ConnectedMixtureComponents {
            config: self.config,
            estimator,
            policy: self.policy,
            events: self.events,
        }
    }

    /// Replace the component matching policy
    pub fn with_matching_policy<P2: MatchingPolicy + Clone>(
        self,
        policy: P2,
    ) -> ConnectedMixtureComponents<E, P2> {
        ConnectedMixtureComponents {
            config: self.config,
            estimator: self.estimator,
            policy,
            events: self.events,
        }
    }

    /// Publish pipeline events to `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn config(&self) -> &CmcConfig {
        &self.config
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Fit every window and return the per-transition connection counts
    ///
    /// Window fits run on a Rayon pool with the `parallel` feature and on the
    /// calling thread otherwise. The result does not depend on which.
    pub fn fit_transform(&self, series: &Series) -> Result<CmcFit> {
        #[cfg(feature = "parallel")]
        let engine = cmc_core::ParallelEngine::new();
        #[cfg(not(feature = "parallel"))]
        let engine = cmc_core::SequentialEngine::new();

        self.fit_transform_with(series, &engine, &CancellationToken::new())
    }

    /// [`fit_transform`](Self::fit_transform) on an explicit engine
    ///
    /// `token` is checked before every window fit. A cancelled run returns
    /// `Error::Cancelled` and no partial result.
    #[instrument(
        skip_all,
        fields(len = series.len(), dim = series.dim(), estimator = self.estimator.name())
    )]
    pub fn fit_transform_with<X: ExecutionEngine>(
        &self,
        series: &Series,
        engine: &X,
        token: &CancellationToken,
    ) -> Result<CmcFit> {
        let mut context = FitContext::new();
        self.emit(
            PipelineEvent::FitStarted {
                trace_id: context.trace_id,
                len: series.len(),
                dim: series.dim(),
            },
            &context,
        )?;

        self.config
            .validate()
            .map_err(|e| self.fail(&context, Stage::Configure, e))?;

        let CmcConfig {
            n_components,
            window_size,
            step_size,
            epsilon,
            random_state,
        } = self.config;

        let slicer = WindowSlicer::new(window_size, step_size)
            .map_err(|e| self.fail(&context, Stage::Slice, e))?;
        let n_windows = slicer.count(series.len());
        if n_windows < 2 {
            return Err(self.fail(
                &context,
                Stage::Slice,
                Error::InsufficientData {
                    expected: 2,
                    actual: n_windows,
                },
            ));
        }
        if window_size < n_components {
            return Err(self.fail(
                &context,
                Stage::Slice,
                Error::InsufficientData {
                    expected: n_components,
                    actual: window_size,
                },
            ));
        }
        debug!(n_windows, window_size, step_size, "Sliced series");
        self.emit(
            PipelineEvent::WindowsSliced {
                trace_id: context.trace_id,
                n_windows,
                window_size,
                step_size,
            },
            &context,
        )?;

        let windows: Vec<_> = slicer.slice(series).collect();
        let completed = AtomicUsize::new(0);
        let summaries = context
            .time_stage(Stage::Estimate, || {
                engine.try_execute_batch(n_windows, |i| {
                    token.checkpoint(completed.load(Ordering::SeqCst), n_windows)?;
                    let summary = self
                        .estimator
                        .fit(&windows[i], n_components, random_state)
                        .map_err(|e| e.in_window(i))?;
                    completed.fetch_add(1, Ordering::SeqCst);
                    Ok(summary)
                })
            })
            .map_err(|e| self.fail(&context, Stage::Estimate, e))?;

        for (window, summary) in summaries.iter().enumerate() {
            let (iterations, converged) = summary
                .diagnostics()
                .map(|d| (d.iterations, d.converged))
                .unwrap_or((0, true));
            self.emit(
                PipelineEvent::WindowFitted {
                    trace_id: context.trace_id,
                    window,
                    iterations,
                    converged,
                },
                &context,
            )?;
        }

        let linker = ComponentLinker::with_policy(epsilon, self.policy.clone())
            .map_err(|e| self.fail(&context, Stage::Link, e))?;
        let records = context
            .time_stage(Stage::Link, || linker.link_parallel(&summaries, engine))
            .map_err(|e| self.fail(&context, Stage::Link, e))?;
        for record in &records {
            self.emit(
                PipelineEvent::TransitionLinked {
                    trace_id: context.trace_id,
                    t: record.t,
                    connections: record.num_connections(),
                },
                &context,
            )?;
        }

        let features = context.time_stage(Stage::Aggregate, || {
            FeatureAggregator::new().aggregate(&records)
        });

        self.emit(
            PipelineEvent::FitCompleted {
                trace_id: context.trace_id,
                n_transitions: records.len(),
                duration: context.elapsed(),
            },
            &context,
        )?;
        debug!(
            trace_id = %context.trace_id,
            n_transitions = records.len(),
            "Fit completed in {:?}",
            context.elapsed()
        );

        Ok(CmcFit {
            trace_id: context.trace_id,
            features,
            records,
            summaries,
            stage_timings: context.stage_timings().clone(),
        })
    }

    fn emit(&self, event: PipelineEvent, context: &FitContext) -> Result<()> {
        match &self.events {
            Some(bus) => bus.emit(event, context),
            None => Ok(()),
        }
    }

    /// Report a failed stage and hand the error back
    fn fail(&self, context: &FitContext, stage: Stage, error: Error) -> Error {
        let event = PipelineEvent::FitFailed {
            trace_id: context.trace_id,
            stage,
            error: error.to_string(),
        };
        if let Err(emit_error) = self.emit(event, context) {
            warn!("Could not publish failure of stage {stage}: {emit_error}");
        }
        error
    }
}

/// Everything one `fit_transform` call produced
#[derive(Debug, Clone)]
pub struct CmcFit {
    trace_id: Uuid,
    features: FeatureMatrix,
    records: Vec<ConnectionRecord>,
    summaries: Vec<MixtureSummary>,
    stage_timings: BTreeMap<Stage, Duration>,
}

impl CmcFit {
    /// Connection counts, shape `(n_windows - 1, 1)`
    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn into_features(self) -> FeatureMatrix {
        self.features
    }

    /// One record per transition, ordered by `t`
    pub fn connection_records(&self) -> &[ConnectionRecord] {
        &self.records
    }

    /// One fitted mixture per window, ordered by window index
    pub fn summaries(&self) -> &[MixtureSummary] {
        &self.summaries
    }

    /// Per-transition connection counts as a table
    pub fn component_stats(&self) -> Result<ComponentStats> {
        StatsReporter::new().report(&self.records)
    }

    pub fn n_windows(&self) -> usize {
        self.summaries.len()
    }

    pub fn n_transitions(&self) -> usize {
        self.records.len()
    }

    /// Trace id shared with the events of this run
    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// Wall time of the timed stages
    pub fn stage_timings(&self) -> &BTreeMap<Stage, Duration> {
        &self.stage_timings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmc_core::pipeline::MetricsHandler;
    use cmc_core::{SequentialEngine, Window};
    use cmc_mixture::stub::{summary_1d, StubEstimator};

    fn config(
        n_components: usize,
        window_size: usize,
        step_size: usize,
        epsilon: f64,
    ) -> CmcConfig {
        CmcConfig::new(n_components, window_size, step_size, epsilon, Some(42)).unwrap()
    }

    fn ramp(n: usize) -> Series {
        let values: Vec<f64> = (0..n).map(|i| i as f64 / n as f64).collect();
        Series::from_column(&values).unwrap()
    }

    #[test]
    fn test_three_windows_two_transitions() {
        let stub = StubEstimator::new().with_fallback(summary_1d(&[0.0, 1.0]));
        let model = ConnectedMixtureComponents::new(config(2, 50, 50, 0.5))
            .unwrap()
            .with_estimator(&stub);

        let fit = model.fit_transform(&ramp(200)).unwrap();
        assert_eq!(fit.n_windows(), 3);
        assert_eq!(fit.n_transitions(), 2);
        assert_eq!(fit.features().shape(), (2, 1));
        assert_eq!(fit.features().to_vec(), vec![2, 2]);
        assert_eq!(stub.calls(), 3);

        let stats = fit.component_stats().unwrap();
        assert_eq!(stats.time_index, vec![1, 2]);
        assert_eq!(stats.num_connections, vec![2, 2]);
        assert!(fit.stage_timings().contains_key(&Stage::Estimate));
    }

    #[test]
    fn test_series_equal_to_window_is_insufficient() {
        let stub = StubEstimator::new().with_fallback(summary_1d(&[0.0, 1.0]));
        let model = ConnectedMixtureComponents::new(config(2, 50, 10, 0.5))
            .unwrap()
            .with_estimator(&stub);

        let err = model.fit_transform(&ramp(50)).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { expected: 2, actual: 0 }));
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_single_window_is_insufficient() {
        let stub = StubEstimator::new().with_fallback(summary_1d(&[0.0, 1.0]));
        let model = ConnectedMixtureComponents::new(config(2, 50, 50, 0.5))
            .unwrap()
            .with_estimator(&stub);

        let err = model.fit_transform(&ramp(60)).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_window_shorter_than_components() {
        let model = ConnectedMixtureComponents::new(config(3, 2, 1, 0.5)).unwrap();
        let err = model.fit_transform(&ramp(10)).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { expected: 3, actual: 2 }));
    }

    #[test]
    fn test_zero_epsilon_gives_zero_features() {
        let stub = StubEstimator::new().with_fallback(summary_1d(&[0.0, 1.0]));
        let model = ConnectedMixtureComponents::new(config(2, 50, 50, 0.0))
            .unwrap()
            .with_estimator(&stub);
        let fit = model.fit_transform(&ramp(200)).unwrap();
        assert_eq!(fit.features().to_vec(), vec![0, 0]);
    }

    #[test]
    fn test_failure_is_fail_fast_and_tagged() {
        let stub = StubEstimator::new()
            .with_fallback(summary_1d(&[0.0, 1.0]))
            .failing_at(1, "collapsed");
        let model = ConnectedMixtureComponents::new(config(2, 50, 50, 0.5))
            .unwrap()
            .with_estimator(&stub);

        let err = model
            .fit_transform_with(&ramp(200), &SequentialEngine, &CancellationToken::new())
            .unwrap_err();
        match err {
            Error::Convergence { window, reason } => {
                assert_eq!(window, 1);
                assert_eq!(reason, "collapsed");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(stub.calls(), 2);
    }

    #[test]
    fn test_estimator_shape_error_carries_window() {
        let stub = StubEstimator::new()
            .with_fallback(summary_1d(&[0.0, 1.0]))
            .with_window(2, summary_1d(&[0.0, 1.0, 2.0]));
        let model = ConnectedMixtureComponents::new(config(2, 50, 50, 0.5))
            .unwrap()
            .with_estimator(&stub);

        let err = model
            .fit_transform_with(&ramp(200), &SequentialEngine, &CancellationToken::new())
            .unwrap_err();
        assert_eq!(err.window(), Some(2));
        match err {
            Error::Window { window, source } => {
                assert_eq!(window, 2);
                assert!(matches!(*source, Error::InvalidInput(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let stub = StubEstimator::new().with_fallback(summary_1d(&[0.0, 1.0]));
        let model = ConnectedMixtureComponents::new(config(2, 50, 50, 0.5))
            .unwrap()
            .with_estimator(&stub);
        let token = CancellationToken::new();
        token.cancel();

        let err = model
            .fit_transform_with(&ramp(200), &SequentialEngine, &token)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { completed: 0, total: 3 }));
        assert_eq!(stub.calls(), 0);
    }

    struct CancelAt {
        inner: StubEstimator,
        token: CancellationToken,
        window: usize,
    }

    impl MixtureEstimator for CancelAt {
        fn fit(
            &self,
            window: &Window<'_>,
            n_components: usize,
            seed: Option<u64>,
        ) -> Result<MixtureSummary> {
            if window.index() == self.window {
                self.token.cancel();
            }
            self.inner.fit(window, n_components, seed)
        }

        fn name(&self) -> &'static str {
            "cancel-at"
        }
    }

    #[test]
    fn test_cancelled_between_windows() {
        let token = CancellationToken::new();
        let estimator = CancelAt {
            inner: StubEstimator::new().with_fallback(summary_1d(&[0.0, 1.0])),
            token: token.clone(),
            window: 1,
        };
        let model = ConnectedMixtureComponents::new(config(2, 50, 50, 0.5))
            .unwrap()
            .with_estimator(estimator);

        let err = model
            .fit_transform_with(&ramp(200), &SequentialEngine, &token)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { completed: 2, total: 3 }));
        assert_eq!(model.estimator().inner.calls(), 2);
    }

    #[test]
    fn test_events_reach_metrics() {
        let metrics = MetricsHandler::new();
        let bus = EventBus::new();
        bus.register(metrics.shared()).unwrap();

        let stub = StubEstimator::new().with_fallback(summary_1d(&[0.0, 1.0]));
        let model = ConnectedMixtureComponents::new(config(2, 50, 50, 0.5))
            .unwrap()
            .with_estimator(&stub)
            .with_event_bus(bus);
        model.fit_transform(&ramp(200)).unwrap();

        let snapshot = metrics.snapshot().unwrap();
        assert_eq!(snapshot.total_runs, 1);
        assert_eq!(snapshot.windows_fitted, 3);
        assert_eq!(snapshot.transitions_linked, 2);
        assert_eq!(snapshot.total_connections, 4);
        assert_eq!(snapshot.completed_runs, 1);
        assert!(snapshot.errors.is_empty());
    }

    #[test]
    fn test_failure_is_published() {
        let metrics = MetricsHandler::new();
        let bus = EventBus::new();
        bus.register(metrics.shared()).unwrap();

        let stub = StubEstimator::new()
            .with_fallback(summary_1d(&[0.0, 1.0]))
            .failing_at(0, "collapsed");
        let model = ConnectedMixtureComponents::new(config(2, 50, 50, 0.5))
            .unwrap()
            .with_estimator(&stub)
            .with_event_bus(bus);
        assert!(model.fit_transform(&ramp(200)).is_err());

        let snapshot = metrics.snapshot().unwrap();
        assert_eq!(snapshot.errors.get(&Stage::Estimate), Some(&1));
    }

    #[test]
    fn test_summaries_in_window_order() {
        let stub = StubEstimator::from_sequence(vec![
            summary_1d(&[0.0, 1.0]),
            summary_1d(&[0.2, 3.0]),
            summary_1d(&[0.4, 3.2]),
        ]);
        let model = ConnectedMixtureComponents::new(config(2, 50, 50, 0.5))
            .unwrap()
            .with_estimator(&stub);
        let fit = model.fit_transform(&ramp(200)).unwrap();

        assert_eq!(fit.summaries()[1].mean(1), Some(vec![3.0]));
        assert_eq!(fit.features().to_vec(), vec![1, 2]);
    }
}
