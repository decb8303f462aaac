//! Linking mixture components across adjacent windows

use crate::matching::{MatchingPolicy, MatchingStrategy};
use crate::types::{ConnectionRecord, LinkMatrix};
use cmc_core::{Error, ExecutionEngine, Result};
use cmc_mixture::MixtureSummary;
use nalgebra::DMatrix;
use tracing::{debug, instrument};

/// Links components whose means lie strictly closer than `epsilon`
#[derive(Debug, Clone)]
pub struct ComponentLinker<P = MatchingStrategy> {
    epsilon: f64,
    policy: P,
}

impl ComponentLinker<MatchingStrategy> {
    /// Linker with positional matching
    pub fn new(epsilon: f64) -> Result<Self> {
        Self::with_policy(epsilon, MatchingStrategy::Positional)
    }
}

impl<P: MatchingPolicy> ComponentLinker<P> {
    pub fn with_policy(epsilon: f64, policy: P) -> Result<Self> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(Error::Configuration(format!(
                "epsilon must be finite and non-negative, got {epsilon}"
            )));
        }
        Ok(Self { epsilon, policy })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Links for one transition; `t` is the index of `curr`
    pub fn link_pair(
        &self,
        prev: &MixtureSummary,
        curr: &MixtureSummary,
        t: usize,
    ) -> Result<ConnectionRecord> {
        if prev.dim() != curr.dim() {
            return Err(Error::size_mismatch(
                prev.dim(),
                curr.dim(),
                &format!("component dimension of window {t}"),
            ));
        }
        if prev.n_components() != curr.n_components() {
            return Err(Error::size_mismatch(
                prev.n_components(),
                curr.n_components(),
                &format!("component count of window {t}"),
            ));
        }

        let distances = distance_matrix(prev, curr);
        let matching = self.policy.candidates(&distances);
        let links = DMatrix::from_fn(distances.nrows(), distances.ncols(), |i, j| {
            matching.candidates[(i, j)] && distances[(i, j)] < self.epsilon
        });

        Ok(ConnectionRecord {
            t,
            links: LinkMatrix::new(links),
            distances,
            assignment: matching.assignment,
        })
    }

    /// One record per adjacent pair, `t = 1..summaries.len()`
    #[instrument(
        skip(self, summaries),
        fields(n_windows = summaries.len(), policy = self.policy.name())
    )]
    pub fn link(&self, summaries: &[MixtureSummary]) -> Result<Vec<ConnectionRecord>> {
        let records = summaries
            .windows(2)
            .enumerate()
            .map(|(i, pair)| self.link_pair(&pair[0], &pair[1], i + 1))
            .collect::<Result<Vec<_>>>()?;
        debug!("Linked {} transitions", records.len());
        Ok(records)
    }

    /// Same as [`link`](Self::link), with transitions distributed over `engine`
    pub fn link_parallel<E: ExecutionEngine>(
        &self,
        summaries: &[MixtureSummary],
        engine: &E,
    ) -> Result<Vec<ConnectionRecord>> {
        let n_transitions = summaries.len().saturating_sub(1);
        engine.try_execute_batch(n_transitions, |i| {
            self.link_pair(&summaries[i], &summaries[i + 1], i + 1)
        })
    }
}

/// `dist[(i, j)]` is the Euclidean distance between `prev` mean `i` and `curr` mean `j`
pub fn distance_matrix(prev: &MixtureSummary, curr: &MixtureSummary) -> DMatrix<f64> {
    let a = prev.means();
    let b = curr.means();
    DMatrix::from_fn(a.nrows(), b.nrows(), |i, j| {
        a.row(i)
            .iter()
            .zip(b.row(j).iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::OptimalAssignment;
    use approx::assert_relative_eq;
    use cmc_core::SequentialEngine;
    use cmc_mixture::stub::summary_1d;

    #[test]
    fn test_rejects_bad_epsilon() {
        assert!(matches!(ComponentLinker::new(-0.1), Err(Error::Configuration(_))));
        assert!(matches!(ComponentLinker::new(f64::NAN), Err(Error::Configuration(_))));
        assert!(ComponentLinker::new(0.0).is_ok());
    }

    #[test]
    fn test_distance_matrix_2d() {
        let prev = MixtureSummary::from_components(
            &[vec![0.0, 0.0], vec![1.0, 1.0]],
            &[vec![1.0, 1.0], vec![1.0, 1.0]],
            &[0.5, 0.5],
        )
        .unwrap();
        let curr = MixtureSummary::from_components(
            &[vec![3.0, 4.0], vec![1.0, 1.0]],
            &[vec![1.0, 1.0], vec![1.0, 1.0]],
            &[0.5, 0.5],
        )
        .unwrap();
        let d = distance_matrix(&prev, &curr);
        assert_relative_eq!(d[(0, 0)], 5.0);
        assert_relative_eq!(d[(1, 1)], 0.0);
        assert_relative_eq!(d[(0, 1)], 2.0_f64.sqrt());
    }

    #[test]
    fn test_single_transition() {
        // Only mean 0.0 sits within 0.5 of 0.2
        let linker = ComponentLinker::new(0.5).unwrap();
        let record = linker
            .link_pair(&summary_1d(&[0.0, 1.0]), &summary_1d(&[0.2, 5.0]), 1)
            .unwrap();
        assert_eq!(record.t, 1);
        assert_eq!(record.links.pairs(), vec![(0, 0)]);
        assert_eq!(record.num_connections(), 1);
        assert!(record.assignment.is_none());
    }

    #[test]
    fn test_threshold_is_strict() {
        let linker = ComponentLinker::new(0.5).unwrap();
        let record = linker
            .link_pair(&summary_1d(&[0.0]), &summary_1d(&[0.5]), 1)
            .unwrap();
        assert_eq!(record.num_connections(), 0);
    }

    #[test]
    fn test_positional_links_many_to_many() {
        let linker = ComponentLinker::new(1.0).unwrap();
        let record = linker
            .link_pair(&summary_1d(&[0.0, 0.1]), &summary_1d(&[0.05, 0.15]), 1)
            .unwrap();
        assert_eq!(record.num_connections(), 4);
    }

    #[test]
    fn test_optimal_assignment_links_one_to_one() {
        let linker = ComponentLinker::with_policy(1.0, OptimalAssignment).unwrap();
        let record = linker
            .link_pair(&summary_1d(&[0.0, 0.1]), &summary_1d(&[0.15, 0.05]), 1)
            .unwrap();
        assert_eq!(record.links.pairs(), vec![(0, 1), (1, 0)]);
        assert_eq!(record.assignment, Some(vec![1, 0]));
    }

    #[test]
    fn test_link_sequence_and_engine_agree() {
        let summaries = vec![
            summary_1d(&[0.0, 1.0]),
            summary_1d(&[0.1, 3.0]),
            summary_1d(&[0.2, 3.1]),
        ];
        let linker = ComponentLinker::new(0.5).unwrap();
        let records = linker.link(&summaries).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].t, 1);
        assert_eq!(records[1].t, 2);
        assert_eq!(records[0].num_connections(), 1);
        assert_eq!(records[1].num_connections(), 2);

        let via_engine = linker.link_parallel(&summaries, &SequentialEngine).unwrap();
        assert_eq!(records, via_engine);
    }

    #[test]
    fn test_fewer_than_two_summaries() {
        let linker = ComponentLinker::new(0.5).unwrap();
        assert!(linker.link(&[]).unwrap().is_empty());
        assert!(linker.link(&[summary_1d(&[0.0])]).unwrap().is_empty());
    }

    #[test]
    fn test_shape_mismatch_names_window() {
        let linker = ComponentLinker::new(0.5).unwrap();
        let summaries = vec![summary_1d(&[0.0, 1.0]), summary_1d(&[0.0])];
        match linker.link(&summaries) {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("window 1")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
