//! Canonicalization: from a connected periodic graph to its topological
//! genome, a canonical string invariant under vertex relabeling,
//! unimodular offset basis change and per-vertex representative shifts.
//!
//! The phases run strictly in order, with a cooperative cancellation
//! check between them:
//!
//! 1. rank reduction over the cycle-offset lattice ([`rank`]),
//! 2. exact equilibrium placement ([`placement`]),
//! 3. translational quotient minimization ([`minimize`]),
//! 4. minimal-basis enumeration ([`basis`]),
//! 5. canonical labeling ([`labeling`]),
//! 6. serialization ([`genome`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::model::graph::PeriodicGraph;

mod basis;
mod error;
pub mod genome;
mod labeling;
mod linalg;
mod minimize;
mod placement;
mod rank;

pub use error::Error;
pub use genome::parse_genome;

/// Cooperative cancellation for long canonicalization runs. Cloning
/// shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), Error> {
        if self.is_cancelled() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }
}

/// A canonicalized net.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalNet {
    /// The topological genome.
    pub genome: String,
    /// Effective periodicity (ℤ-rank of the cycle-offset lattice).
    pub dim: usize,
    /// Vertex count of the minimized quotient.
    pub vertex_count: usize,
    /// Equilibrium placement had colliding vertices.
    pub unstable: bool,
}

/// Canonicalizes a connected periodic graph.
pub fn canonical_genome(g: &PeriodicGraph) -> Result<CanonicalNet, Error> {
    canonical_genome_with(g, &CancelToken::new())
}

/// Canonicalizes with a cancellation token checked between phases.
///
/// The input must be connected; disconnected inputs should be split with
/// [`PeriodicGraph::connected_components`] first and each component
/// canonicalized on its own.
pub fn canonical_genome_with(
    g: &PeriodicGraph,
    cancel: &CancelToken,
) -> Result<CanonicalNet, Error> {
    debug_assert!(g.is_connected());

    let mut net = rank::reduce_rank(g)?;
    cancel.check()?;

    let mut place = placement::equilibrium(&net);
    if !place.unstable {
        while let Some(reduced) = minimize::minimize_quotient(&net, &place) {
            net = reduced;
            place = placement::equilibrium(&net);
        }
    }
    cancel.check()?;

    let frames = basis::candidate_bases(&net, &place);
    cancel.check()?;

    let edges = labeling::canonical_edges(&net, &place, &frames);
    Ok(CanonicalNet {
        genome: genome::serialize(net.dim(), net.vertex_count(), &edges),
        dim: net.dim(),
        vertex_count: net.vertex_count(),
        unstable: place.unstable,
    })
}
