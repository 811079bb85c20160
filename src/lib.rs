//! Topological identification of crystal nets.
//!
//! Given a crystal structure (atoms in a unit cell, with explicit or
//! guessed bonds), this crate extracts the underlying periodic graph,
//! computes its canonical *topological genome* (a string invariant
//! under cell choice, vertex order and lattice basis), and looks the
//! genome up in an archive of known topologies.
//!
//! ```
//! use crystalnets::{identify_genome, Archive};
//!
//! let archive = Archive::builtin();
//! let dia = "3   1 2  0 0 0   1 2  0 0 1   1 2  0 1 0   1 2  1 0 0";
//! let result = identify_genome(dia, &archive)?;
//! assert_eq!(result.id.as_deref(), Some("dia"));
//! # Ok::<(), crystalnets::Error>(())
//! ```

pub mod archive;
pub mod ingest;
pub mod io;
pub mod model;
pub mod topology;

use std::path::Path;

use log::warn;
use thiserror::Error;

pub use archive::{Archive, ConflictError, ValidationFailure, KNOWN_UNSTABLE};
pub use ingest::{BondingMode, CrystalNet, Options, StructureType};
pub use model::atom::Atom;
pub use model::cell::{Cell, SymmetryOp};
pub use model::graph::{Edge, Offset, PeriodicGraph};
pub use model::types::{Element, ParseElementError};
pub use topology::{canonical_genome, parse_genome, CancelToken, CanonicalNet};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Ingest(#[from] ingest::Error),

    #[error(transparent)]
    Topology(#[from] topology::Error),
}

/// One connected subnet: its canonical form and, when archived, its
/// identifier.
#[derive(Debug, Clone)]
pub struct SubnetResult {
    pub net: CanonicalNet,
    pub id: Option<String>,
}

impl SubnetResult {
    /// The identifier, or `"UNKNOWN"`.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("UNKNOWN")
    }
}

/// The result of identifying one input structure: one entry per
/// periodic subnet.
#[derive(Debug, Clone)]
pub struct TopologyResult {
    pub subnets: Vec<SubnetResult>,
}

impl TopologyResult {
    /// The deduplicated subnet identifiers joined with `", "`.
    pub fn composite(&self) -> String {
        let mut ids: Vec<&str> = Vec::new();
        for s in &self.subnets {
            let id = s.display_id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids.join(", ")
    }

    /// Whether every subnet was found in the archive.
    pub fn recognized(&self) -> bool {
        !self.subnets.is_empty() && self.subnets.iter().all(|s| s.id.is_some())
    }
}

/// Identifies the net(s) of a structure file (CIF).
pub fn identify_file(
    path: &Path,
    options: &Options,
    archive: &Archive,
) -> Result<TopologyResult, Error> {
    let structure = io::cif::read_file(path)?;
    identify_structure(&structure, options, archive)
}

/// Identifies the net(s) of a parsed structure: ingestion, then one
/// canonicalization and archive lookup per periodic component.
/// Non-periodic components (solvent, isolated molecules) are skipped;
/// if nothing periodic remains the structure itself is non-periodic.
pub fn identify_structure(
    structure: &io::cif::CifStructure,
    options: &Options,
    archive: &Archive,
) -> Result<TopologyResult, Error> {
    let net = ingest::build_net(structure, options)?;
    let cancel = CancelToken::new();
    let mut subnets = Vec::new();
    for graph in net.component_graphs() {
        match topology::canonical_genome_with(&graph, &cancel) {
            Ok(canonical) => {
                let id = archive.lookup(&canonical.genome).map(str::to_string);
                subnets.push(SubnetResult { net: canonical, id });
            }
            Err(topology::Error::NonPeriodic) => {
                warn!(
                    "skipping a non-periodic component of {} vertex/vertices",
                    graph.vertex_count()
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    if subnets.is_empty() {
        return Err(topology::Error::NonPeriodic.into());
    }
    Ok(TopologyResult { subnets })
}

/// Canonicalizes a genome string and looks it up directly.
pub fn identify_genome(genome: &str, archive: &Archive) -> Result<SubnetResult, Error> {
    let graph = parse_genome(genome)?;
    if !graph.is_connected() {
        return Err(io::Error::parse(
            io::Format::Genome,
            1,
            "genome describes a disconnected graph",
        )
        .into());
    }
    let net = canonical_genome(&graph)?;
    let id = archive.lookup(&net.genome).map(str::to_string);
    Ok(SubnetResult { net, id })
}
