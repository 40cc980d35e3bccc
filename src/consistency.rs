//! Stochastic consistency test for a partition.
//!
//! Does a partition describe structure that a recovery method can find again?
//! The test fits a block model to the network with the partition fixed, then
//! for each trial:
//!
//! 1. samples a synthetic network from the model,
//! 2. runs the recovery method (e.g. [`Louvain`](crate::community::Louvain))
//!    on the sample,
//! 3. scores agreement between recovered labels and the partition (AMI by
//!    default).
//!
//! Consistently high scores mean the partition is reproducible under the
//! model; low or scattered scores suggest the recovery method is not
//! consistent with it. No threshold is applied; the caller reads the
//! distribution.
//!
//! [`community_agreement`] is a cheaper, deterministic-input check of a
//! single reduction: communities found on the macro network, lifted back to
//! micro nodes, against communities found on the micro network.
//!
//! Every trial draws from its own stream `StdRng::seed_from_u64(seed + t)`,
//! so a seeded run gives the same report sequentially or on rayon.
//!
//! ```rust
//! use coarsen::community::Louvain;
//! use coarsen::{ConsistencyTest, Network};
//!
//! let mut edges = vec![(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)];
//! edges.push((0, 5));
//! let network = Network::from_edges(edges);
//! let report = ConsistencyTest::new(10)
//!     .with_seed(3)
//!     .run(&network, &[0, 0, 0, 1, 1, 1], &Louvain::new())
//!     .unwrap();
//! assert_eq!(report.scores.len() + report.skipped, 10);
//! ```

use crate::blockmodel::{BlockModel, BlockModelKind};
use crate::coarsen::{Coarsener, Reduction};
use crate::community::{CommunityDetection, Detection, LabelPropagation, Louvain};
use crate::error::{Error, Result};
use crate::metrics::{nmi, AgreementScore};
use crate::network::{Network, NodeKey};
use rand::prelude::*;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Recovers a labeling from a synthetic network.
///
/// Randomized methods should draw from `rng`, the trial's own stream.
pub trait RecoveryMethod {
    /// Label per node position of `network`.
    fn recover(&self, network: &Network<usize>, rng: &mut StdRng) -> Result<Detection>;
}

impl RecoveryMethod for Louvain {
    fn recover(&self, network: &Network<usize>, rng: &mut StdRng) -> Result<Detection> {
        self.detect(network.as_graph(), rng)
    }
}

impl RecoveryMethod for LabelPropagation {
    fn recover(&self, network: &Network<usize>, rng: &mut StdRng) -> Result<Detection> {
        self.detect(network.as_graph(), rng)
    }
}

/// Uses a partitioner's supernodes as the recovered labels.
#[derive(Debug, Clone)]
pub struct CoarsenerRecovery<C>(pub C);

impl<C: Coarsener> RecoveryMethod for CoarsenerRecovery<C> {
    fn recover(&self, network: &Network<usize>, _rng: &mut StdRng) -> Result<Detection> {
        let coarsening = self.0.coarsen(network)?;
        Ok(Detection {
            labels: coarsening.mapping.labels(network)?,
            objective: None,
        })
    }
}

/// Closure as a recovery method.
#[derive(Debug, Clone)]
pub struct FnRecovery<F>(pub F);

impl<F> RecoveryMethod for FnRecovery<F>
where
    F: Fn(&Network<usize>, &mut StdRng) -> Result<Detection>,
{
    fn recover(&self, network: &Network<usize>, rng: &mut StdRng) -> Result<Detection> {
        (self.0)(network, rng)
    }
}

/// Per-trial results of a consistency run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsistencyReport {
    /// Agreement score of each completed trial, in trial order.
    pub scores: Vec<f64>,
    /// Recovery objective of each completed trial that reported one.
    pub objectives: Vec<f64>,
    /// Trials dropped because sampling, recovery or scoring failed.
    pub skipped: usize,
}

impl ConsistencyReport {
    /// Mean score.
    pub fn mean(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        Some(self.scores.iter().sum::<f64>() / self.scores.len() as f64)
    }

    /// Population standard deviation of the scores.
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let var = self.scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>()
            / self.scores.len() as f64;
        Some(var.sqrt())
    }

    /// Median score.
    pub fn median(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        let mut sorted = self.scores.clone();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        Some(if sorted.len() % 2 == 0 {
            0.5 * (sorted[mid - 1] + sorted[mid])
        } else {
            sorted[mid]
        })
    }
}

/// Configurable consistency test.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConsistencyTest {
    /// Number of synthetic networks.
    n_trials: usize,
    /// Block model flavour.
    model: BlockModelKind,
    /// Agreement score.
    score: AgreementScore,
    /// Base seed; trial `t` uses `seed + t`.
    seed: Option<u64>,
}

impl ConsistencyTest {
    /// Test with `n_trials` synthetic networks.
    pub fn new(n_trials: usize) -> Self {
        Self {
            n_trials,
            model: BlockModelKind::default(),
            score: AgreementScore::default(),
            seed: None,
        }
    }

    /// Set the base random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the block model flavour.
    pub fn with_model(mut self, model: BlockModelKind) -> Self {
        self.model = model;
        self
    }

    /// Set the agreement score.
    pub fn with_score(mut self, score: AgreementScore) -> Self {
        self.score = score;
        self
    }

    /// Run the test.
    ///
    /// `partition[i]` is the group of the node at position `i`.
    pub fn run<N, M>(
        &self,
        network: &Network<N>,
        partition: &[usize],
        recovery: &M,
    ) -> Result<ConsistencyReport>
    where
        N: NodeKey,
        M: RecoveryMethod + Sync,
    {
        if self.n_trials == 0 {
            return Err(Error::InvalidParameter {
                name: "n_trials",
                message: "at least one trial is required",
            });
        }
        let model = BlockModel::fit_with(network, partition, self.model)?;
        let base = self.seed.unwrap_or_else(|| rand::rng().random());

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Option<(f64, Option<f64>)>> = (0..self.n_trials)
            .into_par_iter()
            .map(|t| self.trial(&model, recovery, base, t))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Option<(f64, Option<f64>)>> = (0..self.n_trials)
            .map(|t| self.trial(&model, recovery, base, t))
            .collect();

        let mut report = ConsistencyReport::default();
        for outcome in outcomes {
            match outcome {
                Some((score, objective)) => {
                    report.scores.push(score);
                    report.objectives.extend(objective);
                }
                None => report.skipped += 1,
            }
        }

        if report.scores.is_empty() {
            warn!(trials = self.n_trials, "every consistency trial was skipped");
        }
        info!(
            trials = self.n_trials,
            skipped = report.skipped,
            blocks = model.block_count(),
            mean = report.mean().unwrap_or(f64::NAN),
            "consistency test done"
        );
        Ok(report)
    }

    fn trial<M: RecoveryMethod>(
        &self,
        model: &BlockModel,
        recovery: &M,
        base: u64,
        t: usize,
    ) -> Option<(f64, Option<f64>)> {
        let mut rng = StdRng::seed_from_u64(base.wrapping_add(t as u64));

        let sample = match model.sample(&mut rng) {
            Ok(sample) => sample,
            Err(e) => {
                debug!(trial = t, error = %e, "sampling failed; skipping trial");
                return None;
            }
        };
        let detection = match recovery.recover(&sample, &mut rng) {
            Ok(detection) => detection,
            Err(e) => {
                debug!(trial = t, error = %e, "recovery failed; skipping trial");
                return None;
            }
        };
        if detection.labels.len() != model.node_count() {
            debug!(
                trial = t,
                expected = model.node_count(),
                found = detection.labels.len(),
                "recovered labeling has wrong length; skipping trial"
            );
            return None;
        }

        let score = self.score.score(model.blocks(), &detection.labels);
        if !score.is_finite() {
            debug!(trial = t, score, "non-finite score; skipping trial");
            return None;
        }
        debug!(trial = t, score, edges = sample.edge_count(), "trial done");
        Some((score, detection.objective))
    }
}

/// Consistency test with default settings (degree-corrected model, AMI, unseeded).
pub fn consistency_scores<N, M>(
    network: &Network<N>,
    partition: &[usize],
    n_trials: usize,
    recovery: &M,
) -> Result<ConsistencyReport>
where
    N: NodeKey,
    M: RecoveryMethod + Sync,
{
    ConsistencyTest::new(n_trials).run(network, partition, recovery)
}

/// NMI between communities of the micro network and lifted communities of its reduction.
///
/// `detector` runs once on `network` and once on the macro network, whose
/// supernodes carry their internal weight as self-loops. Each micro node then
/// takes the community of its supernode.
pub fn community_agreement<N, D, R>(
    network: &Network<N>,
    reduction: &Reduction<N>,
    detector: &D,
    rng: &mut R,
) -> Result<f64>
where
    N: NodeKey,
    D: CommunityDetection,
    R: Rng + ?Sized,
{
    reduction.coarsening.mapping.validate(network)?;
    let micro = detector.detect(network.as_graph(), rng)?;

    let macro_net = reduction.aggregation.to_network_with_self_loops()?;
    let coarse = detector.detect(macro_net.as_graph(), rng)?;

    let mut lifted = Vec::with_capacity(network.node_count());
    for key in network.keys() {
        let label = reduction
            .coarsening
            .mapping
            .get(key)
            .and_then(|id| macro_net.position(id))
            .and_then(|pos| coarse.labels.get(pos).copied())
            .ok_or_else(|| Error::UnmappedNode {
                node: format!("{key:?}"),
            })?;
        lifted.push(label);
    }

    let score = nmi(&micro.labels, &lifted);
    debug!(
        micro_communities = distinct(&micro.labels),
        macro_communities = distinct(&coarse.labels),
        score,
        "community agreement done"
    );
    Ok(score)
}

fn distinct(labels: &[usize]) -> usize {
    let mut sorted = labels.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coarsen::{DiffusionPartitioner, SupernodePartitioner};

    fn barbell() -> Network<u32> {
        Network::from_edges([(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)])
    }

    #[test]
    fn test_report_statistics() {
        let report = ConsistencyReport {
            scores: vec![0.2, 0.8, 0.5, 0.9],
            objectives: vec![],
            skipped: 0,
        };
        assert!((report.mean().unwrap() - 0.6).abs() < 1e-12);
        assert!((report.median().unwrap() - 0.65).abs() < 1e-12);
        let expected_sd = ((0.16 + 0.04 + 0.01 + 0.09) / 4.0f64).sqrt();
        assert!((report.std_dev().unwrap() - expected_sd).abs() < 1e-12);
        assert_eq!(ConsistencyReport::default().mean(), None);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let test = ConsistencyTest::new(8).with_seed(21);
        let a = test.run(&barbell(), &[0, 0, 0, 1, 1, 1], &Louvain::new()).unwrap();
        let b = test.run(&barbell(), &[0, 0, 0, 1, 1, 1], &Louvain::new()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.scores.len() + a.skipped, 8);
        assert_eq!(a.objectives.len(), a.scores.len());
    }

    #[test]
    fn test_failed_trials_are_skipped() {
        let short = FnRecovery(|_: &Network<usize>, _: &mut StdRng| -> Result<Detection> {
            Ok(Detection {
                labels: vec![0],
                objective: None,
            })
        });
        let report = ConsistencyTest::new(5)
            .with_seed(1)
            .run(&barbell(), &[0, 0, 0, 1, 1, 1], &short)
            .unwrap();
        assert_eq!(report.skipped, 5);
        assert!(report.scores.is_empty());

        let failing = FnRecovery(|_: &Network<usize>, _: &mut StdRng| -> Result<Detection> {
            Err(Error::EmptyInput)
        });
        let report = consistency_scores(&barbell(), &[0, 0, 0, 1, 1, 1], 3, &failing).unwrap();
        assert_eq!(report.skipped, 3);
    }

    #[test]
    fn test_coarsener_as_recovery() {
        let recovery = CoarsenerRecovery(SupernodePartitioner::new(2).with_seed(4));
        let report = ConsistencyTest::new(4)
            .with_seed(2)
            .with_score(AgreementScore::Nmi)
            .run(&barbell(), &[0, 0, 0, 1, 1, 1], &recovery)
            .unwrap();
        assert_eq!(report.scores.len() + report.skipped, 4);
        assert!(report.objectives.is_empty());
        assert!(report.scores.iter().all(|s| (0.0..=1.0 + 1e-12).contains(s)));
    }

    #[test]
    fn test_rejects_bad_input() {
        let louvain = Louvain::new();
        assert!(matches!(
            consistency_scores(&barbell(), &[0, 0, 0, 1, 1, 1], 0, &louvain),
            Err(Error::InvalidParameter { name: "n_trials", .. })
        ));
        assert_eq!(
            consistency_scores(&barbell(), &[0, 1], 3, &louvain).unwrap_err(),
            Error::DimensionMismatch {
                expected: 6,
                found: 2
            }
        );
        assert_eq!(
            consistency_scores(&Network::<u32>::new(), &[], 3, &louvain).unwrap_err(),
            Error::EmptyInput
        );
    }

    #[test]
    fn test_community_agreement_on_merged_triangles() {
        let network = barbell();
        let reduction = DiffusionPartitioner::new(1.0).reduce(&network).unwrap();
        assert_eq!(reduction.aggregation.group_count(), 2);

        let mut rng = StdRng::seed_from_u64(6);
        let score = community_agreement(&network, &reduction, &Louvain::new(), &mut rng).unwrap();
        assert!((score - 1.0).abs() < 1e-12, "score {score}");
    }

    #[test]
    fn test_community_agreement_rejects_foreign_reduction() {
        let reduction = DiffusionPartitioner::new(1.0).reduce(&barbell()).unwrap();
        let other = Network::from_edges([(0u32, 1), (1, 2)]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(community_agreement(&other, &reduction, &Louvain::new(), &mut rng).is_err());
    }
}
