//! # coarsen
//!
//! Network coarse-graining: collapse a weighted undirected network into a
//! smaller macro network, and check whether a partition is reproducible.
//!
//! - [`Network`] holds the micro network; [`Mapping`] assigns every micro node
//!   to a supernode ([`MacroId`]).
//! - [`coarsen`] holds the grouping strategies (spectral, Laplacian
//!   renormalization, supernodes, orbit quotients, random burning), all behind
//!   the [`Coarsener`] trait.
//! - [`aggregate()`] collapses edges given any mapping.
//! - [`consistency`] resamples networks from a block model fitted to a
//!   partition and scores how well a recovery method finds it again.
//!
//! ```rust
//! use coarsen::{aggregate, Coarsener, DiffusionPartitioner, Network};
//!
//! let network = Network::from_edges([(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)]);
//! let coarsening = DiffusionPartitioner::new(1.0).coarsen(&network).unwrap();
//! let macro_net = aggregate(&network, &coarsening.mapping).unwrap();
//! assert_eq!(macro_net.group_count(), 2);
//! assert_eq!(macro_net.edges.len(), 1);
//! ```

pub mod aggregate;
pub mod automorphism;
pub mod blockmodel;
pub mod coarsen;
pub mod community;
pub mod consistency;
/// Error types used across `coarsen`.
pub mod error;
pub mod linalg;
pub mod mapping;
pub mod metrics;
pub mod network;
pub mod noise;


pub use aggregate::{aggregate, aggregate_with, Aggregation, EdgeWeighting, MacroEdge};
pub use automorphism::{AutomorphismSolver, RefinementSearch};
pub use blockmodel::{BlockModel, BlockModelKind};
pub use coarsen::{
    burning_partition, diffusion_partition, orbit_partition, spectral_partition,
    supernode_partition, BurningPartitioner, Coarsener, Coarsening, DiffusionPartitioner, Notice,
    OrbitPartitioner, RandomWalkSpectrum, Reduction, SpectralPartitioner, SupernodePartitioner,
    TieBreak,
};
pub use community::{CommunityDetection, Detection, LabelPropagation, Louvain};
pub use consistency::{
    community_agreement, consistency_scores, CoarsenerRecovery, ConsistencyReport,
    ConsistencyTest, FnRecovery, RecoveryMethod,
};
pub use error::{Error, Result};
pub use linalg::{Eigensolver, FaerEigensolver, SymmetricEigen};
pub use mapping::{MacroId, Mapping};
pub use metrics::{ami, ari, nmi, partition_overlap, AgreementScore};
pub use network::{Network, NodeKey};
pub use noise::perturb;
