//! Structure ingestion: from a parsed crystal structure to a clean
//! periodic graph. The pipeline applies symmetry expansion, collision
//! pruning, bond resolution and the sanitation passes, strictly in that
//! order.

mod bonds;
mod collision;
mod config;
mod error;
mod sanitize;
mod symmetry;

pub use config::{valence_rule, BondingMode, Options, StructureType, ValenceRule};
pub use error::Error;

use log::warn;

use crate::io::cif::CifStructure;
use crate::model::atom::Atom;
use crate::model::cell::Cell;
use crate::model::graph::PeriodicGraph;

/// The sanitized periodic graph of one input structure, plus the atoms
/// backing its vertices.
#[derive(Debug, Clone)]
pub struct CrystalNet {
    pub cell: Cell,
    pub atoms: Vec<Atom>,
    pub labels: Vec<String>,
    /// Sanitized graph over all atoms; may be disconnected.
    pub graph: PeriodicGraph,
    /// Connected components as sorted vertex sets.
    pub components: Vec<Vec<usize>>,
    /// Atoms left under their valence minimum.
    pub invalid_atoms: Vec<usize>,
}

impl CrystalNet {
    /// One standalone graph per connected component, vertices renumbered
    /// in component order.
    pub fn component_graphs(&self) -> Vec<PeriodicGraph> {
        self.components
            .iter()
            .map(|c| self.graph.subgraph(c))
            .collect()
    }
}

/// Runs the full ingestion pipeline on a parsed structure.
pub fn build_net(structure: &CifStructure, options: &Options) -> Result<CrystalNet, Error> {
    if structure.atoms.is_empty() {
        return Err(Error::EmptyStructure);
    }

    let cell = structure.cell.clone();
    let (expanded_atoms, expanded_labels) =
        symmetry::expand(&cell, &structure.atoms, &structure.labels);

    let mask = collision::removal_mask(&cell, &expanded_atoms);
    let mut atoms = Vec::with_capacity(expanded_atoms.len());
    let mut labels = Vec::with_capacity(expanded_labels.len());
    for ((atom, label), &gone) in expanded_atoms
        .into_iter()
        .zip(expanded_labels)
        .zip(&mask)
    {
        if !gone {
            atoms.push(atom);
            labels.push(label);
        }
    }

    if options.structure == StructureType::Cluster {
        if let Some(i) = atoms.iter().position(|a| a.residue.is_none()) {
            return Err(Error::ResidueAssignment {
                index: i,
                label: labels[i].clone(),
            });
        }
    }

    let declared = bonds::from_declared(&cell, &atoms, &labels, &structure.bonds);
    let (mut edges, mut from_input) = match options.bonding {
        BondingMode::Input => {
            if declared.is_empty() {
                return Err(Error::BondingUnavailable);
            }
            (declared, true)
        }
        BondingMode::Guess => (bonds::guess(&cell, &atoms, options), false),
        BondingMode::Auto => {
            if declared.is_empty() {
                (bonds::guess(&cell, &atoms, options), false)
            } else {
                (declared, true)
            }
        }
    };

    let mut invalid_atoms;
    let graph = loop {
        let mut g = PeriodicGraph::new(3, atoms.len());
        for &(u, v, o) in &edges {
            g.add_edge(u, v, o);
        }
        sanitize::remove_aligned(&mut g, &cell, &atoms);
        sanitize::remove_triangles(&mut g, &cell, &atoms);
        invalid_atoms = sanitize::fix_valence(&mut g, &cell, &atoms, options.mof_valences(), true);
        let deleted = sanitize::sanity_check(&mut g, &cell, &atoms);
        if deleted > 0 && from_input && options.bonding == BondingMode::Auto {
            warn!("input bonds failed the sanity check; regressing to guessed bonds");
            edges = bonds::guess(&cell, &atoms, options);
            from_input = false;
            continue;
        }
        sanitize::remove_homoatomic(&mut g, &atoms, &options.homoatomic_targets);
        break g;
    };

    let components = graph.connected_components();
    Ok(CrystalNet {
        cell,
        atoms,
        labels,
        graph,
        components,
        invalid_atoms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::cif::DeclaredBond;
    use crate::model::types::Element;
    use nalgebra::Vector3;

    fn structure(cell: Cell, atoms: Vec<(Element, [f64; 3])>) -> CifStructure {
        let labels = atoms
            .iter()
            .enumerate()
            .map(|(i, (el, _))| format!("{}{}", el.symbol(), i + 1))
            .collect();
        CifStructure {
            cell,
            atoms: atoms
                .into_iter()
                .map(|(el, p)| Atom::new(el, Vector3::new(p[0], p[1], p[2])))
                .collect(),
            labels,
            bonds: Vec::new(),
        }
    }

    fn make_simple_cubic() -> CifStructure {
        structure(
            Cell::from_parameters(2.2, 2.2, 2.2, 90.0, 90.0, 90.0).unwrap(),
            vec![(Element::P, [0.0, 0.0, 0.0])],
        )
    }

    fn make_diamond() -> CifStructure {
        let sites = [
            [0.0, 0.0, 0.0],
            [0.0, 0.5, 0.5],
            [0.5, 0.0, 0.5],
            [0.5, 0.5, 0.0],
            [0.25, 0.25, 0.25],
            [0.25, 0.75, 0.75],
            [0.75, 0.25, 0.75],
            [0.75, 0.75, 0.25],
        ];
        structure(
            Cell::from_parameters(3.567, 3.567, 3.567, 90.0, 90.0, 90.0).unwrap(),
            sites.iter().map(|&p| (Element::C, p)).collect(),
        )
    }

    #[test]
    fn simple_cubic_becomes_one_six_coordinated_vertex() {
        let net = build_net(&make_simple_cubic(), &Options::default()).unwrap();
        assert_eq!(net.graph.vertex_count(), 1);
        assert_eq!(net.graph.degree(0), 6);
        assert_eq!(net.components.len(), 1);
        assert!(net.invalid_atoms.is_empty());
    }

    #[test]
    fn diamond_conventional_cell_is_four_coordinated() {
        let net = build_net(&make_diamond(), &Options::default()).unwrap();
        assert_eq!(net.graph.vertex_count(), 8);
        // Second-neighbor contacts fall inside the vdW cutoff but the
        // valence pass trims every carbon back to its four nearest.
        for v in 0..8 {
            assert_eq!(net.graph.degree(v), 4);
        }
        assert!(net.invalid_atoms.is_empty());
        assert_eq!(net.components.len(), 1);
    }

    #[test]
    fn empty_structure_is_rejected() {
        let cif = structure(
            Cell::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0).unwrap(),
            vec![],
        );
        assert!(matches!(
            build_net(&cif, &Options::default()),
            Err(Error::EmptyStructure)
        ));
    }

    #[test]
    fn input_mode_without_bonds_is_an_error() {
        let mut options = Options::default();
        options.bonding = BondingMode::Input;
        assert!(matches!(
            build_net(&make_simple_cubic(), &options),
            Err(Error::BondingUnavailable)
        ));
    }

    #[test]
    fn auto_mode_prefers_declared_bonds() {
        let mut cif = structure(
            Cell::from_parameters(10.0, 10.0, 10.0, 90.0, 90.0, 90.0).unwrap(),
            vec![
                (Element::C, [0.0, 0.0, 0.0]),
                (Element::C, [0.15, 0.0, 0.0]),
                (Element::C, [0.0, 0.15, 0.0]),
            ],
        );
        cif.bonds = vec![DeclaredBond {
            label_a: "C1".into(),
            label_b: "C2".into(),
            distance: Some(1.5),
        }];
        let net = build_net(&cif, &Options::default()).unwrap();
        // Only the declared bond, not the guessable C1–C3 contact.
        assert_eq!(net.graph.edge_count(), 1);
        assert!(net.graph.neighbors(0).iter().any(|&(n, _)| n == 1));
    }

    #[test]
    fn auto_mode_falls_back_to_guessing_after_failed_sanity() {
        let mut cif = structure(
            Cell::from_parameters(10.0, 10.0, 10.0, 90.0, 90.0, 90.0).unwrap(),
            vec![
                (Element::C, [0.0, 0.0, 0.0]),
                (Element::C, [0.45, 0.0, 0.0]),
                (Element::C, [0.15, 0.0, 0.0]),
            ],
        );
        // The declared bond spans 4.5 Å and fails the sanity check;
        // guessing then finds the genuine 1.5 Å contact instead.
        cif.bonds = vec![DeclaredBond {
            label_a: "C1".into(),
            label_b: "C2".into(),
            distance: Some(4.5),
        }];
        let net = build_net(&cif, &Options::default()).unwrap();
        assert_eq!(net.graph.edge_count(), 1);
        assert!(net.graph.neighbors(0).iter().any(|&(n, _)| n == 2));
    }

    #[test]
    fn cluster_mode_requires_residues() {
        let options = Options::for_structure(StructureType::Cluster);
        let err = build_net(&make_simple_cubic(), &options).unwrap_err();
        assert!(matches!(err, Error::ResidueAssignment { index: 0, .. }));
    }

    #[test]
    fn component_graphs_split_disconnected_nets() {
        // Two parallel unbonded chains along the short axis: P–N
        // contacts at 3.0 Å stay outside the 0.75·(rᵢ+rⱼ) cutoff.
        let cif = structure(
            Cell::from_parameters(2.2, 6.0, 6.0, 90.0, 90.0, 90.0).unwrap(),
            vec![(Element::P, [0.0, 0.0, 0.0]), (Element::N, [0.0, 0.0, 0.5])],
        );
        let net = build_net(&cif, &Options::default()).unwrap();
        assert_eq!(net.components, vec![vec![0], vec![1]]);
        let graphs = net.component_graphs();
        assert!(graphs.iter().all(|g| g.vertex_count() == 1 && g.edge_count() == 1));
    }
}
