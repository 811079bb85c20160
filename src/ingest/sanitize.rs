//! Sanitation passes over a freshly bonded periodic graph. The order is
//! load-bearing: aligned-neighbor removal, then triangle removal, then
//! valence fixing, then the length sanity check, then homoatomic
//! filtering.

use log::warn;
use nalgebra::Vector3;

use super::config::valence_rule;
use crate::model::atom::Atom;
use crate::model::cell::Cell;
use crate::model::graph::{Offset, PeriodicGraph};
use crate::model::types::Element;

/// cos(10°): two neighbor directions closer than this are "the same
/// direction" and one of the two bonds is an artifact.
const ALIGNED_COS: f64 = 0.984_807_753_012_208;

/// Triangle pass: long-edge cutoff in Å when an endpoint is a metal.
const TRIANGLE_CUTOFF_METAL: f64 = 2.5;
/// Triangle pass: long-edge cutoff in Å otherwise.
const TRIANGLE_CUTOFF: f64 = 3.0;

/// Any bond longer than this is deleted outright, in Å.
const MAX_BOND: f64 = 4.0;
/// Bonds between non-hydrogens shorter than this are deleted, in Å.
const MIN_NON_H_BOND: f64 = 0.65;

fn bond_length(cell: &Cell, atoms: &[Atom], u: usize, v: usize, o: Offset) -> f64 {
    cell.distance(&atoms[u].position, &atoms[v].position, o)
}

fn direction(cell: &Cell, atoms: &[Atom], v: usize, nb: usize, o: Offset) -> Vector3<f64> {
    let shift = Vector3::new(f64::from(o[0]), f64::from(o[1]), f64::from(o[2]));
    cell.matrix * (atoms[nb].position + shift - atoms[v].position)
}

/// Removes the farther of two bonds whenever a vertex sees two
/// neighbors within 10° of each other (an atom sitting on a bond).
/// Repeats until no such pair remains.
pub fn remove_aligned(graph: &mut PeriodicGraph, cell: &Cell, atoms: &[Atom]) {
    let mut fuel = graph.edge_count() + 1;
    let mut removed_total = 0usize;
    'outer: loop {
        fuel = fuel.saturating_sub(1);
        if fuel == 0 {
            break;
        }
        for v in 0..graph.vertex_count() {
            let nbrs = graph.neighbors(v).to_vec();
            for a in 0..nbrs.len() {
                for b in a + 1..nbrs.len() {
                    let va = direction(cell, atoms, v, nbrs[a].0, nbrs[a].1);
                    let vb = direction(cell, atoms, v, nbrs[b].0, nbrs[b].1);
                    let (na, nb_len) = (va.norm(), vb.norm());
                    if na < f64::EPSILON || nb_len < f64::EPSILON {
                        continue;
                    }
                    if va.dot(&vb) / (na * nb_len) > ALIGNED_COS {
                        let (gone_n, gone_o) = if na >= nb_len { nbrs[a] } else { nbrs[b] };
                        graph.remove_edge(v, gone_n, gone_o);
                        removed_total += 1;
                        continue 'outer;
                    }
                }
            }
        }
        break;
    }
    if removed_total > 0 {
        warn!(
            "removed {} bond(s) to atoms lying on another bond",
            removed_total
        );
    }
}

/// True when the triangle inequality marks the long edge `(s, d, o)` as
/// spurious: some third vertex closes a triangle whose two short sides
/// explain the span.
fn triangle_witness(
    graph: &PeriodicGraph,
    cell: &Cell,
    atoms: &[Atom],
    s: usize,
    d: usize,
    o: Offset,
) -> bool {
    let len2 = bond_length(cell, atoms, s, d, o).powi(2);
    for &(x, o1) in graph.neighbors(s) {
        if (x, o1) == (d, o) {
            continue;
        }
        let o2 = [o1[0] - o[0], o1[1] - o[1], o1[2] - o[2]];
        if graph.neighbors(d).binary_search(&(x, o2)).is_err() {
            continue;
        }
        let l1 = bond_length(cell, atoms, s, x, o1);
        let l2 = bond_length(cell, atoms, d, x, o2);
        if l1.powi(2) <= len2 && l2.powi(2) <= len2 && len2 > (l1.powi(2) + l2.powi(2)).min(9.0) {
            return true;
        }
    }
    false
}

/// Deletes long edges that a triangle of shorter edges explains away.
/// Edges whose witnessing triangle lost a side are reconsidered in the
/// next round; the pass ends when a round deletes nothing.
pub fn remove_triangles(graph: &mut PeriodicGraph, cell: &Cell, atoms: &[Atom]) {
    let mut removed_total = 0usize;
    loop {
        let marked: Vec<(usize, usize, Offset)> = graph
            .edges()
            .filter(|e| {
                let cutoff = if atoms[e.source].element.is_metal()
                    || atoms[e.target].element.is_metal()
                {
                    TRIANGLE_CUTOFF_METAL
                } else {
                    TRIANGLE_CUTOFF
                };
                bond_length(cell, atoms, e.source, e.target, e.offset) > cutoff
            })
            .map(|e| (e.source, e.target, e.offset))
            .collect();
        let mut removed_this_round = 0usize;
        for (s, d, o) in marked {
            // Re-verify against the current graph: an earlier removal
            // may have taken a side of the witnessing triangle.
            if triangle_witness(graph, cell, atoms, s, d, o) {
                graph.remove_edge(s, d, o);
                removed_this_round += 1;
            }
        }
        if removed_this_round == 0 {
            break;
        }
        removed_total += removed_this_round;
    }
    if removed_total > 0 {
        warn!("triangle pass removed {} spurious bond(s)", removed_total);
    }
}

/// Enforces the per-element degree bounds. With `apply`, excess bonds
/// are removed weakest (longest) first, never a hydrogen bond of
/// C, N or O; in either mode the returned set lists atoms below their
/// minimum degree.
pub fn fix_valence(
    graph: &mut PeriodicGraph,
    cell: &Cell,
    atoms: &[Atom],
    mof: bool,
    apply: bool,
) -> Vec<usize> {
    let mut invalid = Vec::new();
    for v in 0..graph.vertex_count() {
        let Some(rule) = valence_rule(atoms[v].element, mof) else {
            continue;
        };
        if apply && graph.degree(v) > rule.max {
            let protect_h = matches!(atoms[v].element, Element::C | Element::N | Element::O);
            let mut candidates: Vec<(f64, usize, Offset)> = graph
                .neighbors(v)
                .iter()
                .filter(|&&(nb, _)| !(protect_h && atoms[nb].element == Element::H))
                .map(|&(nb, o)| (bond_length(cell, atoms, v, nb, o), nb, o))
                .collect();
            candidates.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
                    .then(a.2.cmp(&b.2))
            });
            for (_, nb, o) in candidates {
                if graph.degree(v) <= rule.max {
                    break;
                }
                graph.remove_edge(v, nb, o);
            }
            if graph.degree(v) > rule.max {
                warn!(
                    "atom {} ({}) keeps {} bonds: only hydrogen bonds were removable",
                    v,
                    atoms[v].element,
                    graph.degree(v)
                );
            }
        }
        if graph.degree(v) < rule.min {
            invalid.push(v);
        }
    }
    if !invalid.is_empty() {
        warn!("{} atom(s) are bonded below their valence minimum", invalid.len());
    }
    invalid
}

/// Deletes bonds longer than 4 Å, and bonds between non-hydrogens
/// shorter than 0.65 Å. Returns how many were deleted.
pub fn sanity_check(graph: &mut PeriodicGraph, cell: &Cell, atoms: &[Atom]) -> usize {
    let doomed: Vec<(usize, usize, Offset)> = graph
        .edges()
        .filter(|e| {
            let len = bond_length(cell, atoms, e.source, e.target, e.offset);
            let non_h =
                atoms[e.source].element != Element::H && atoms[e.target].element != Element::H;
            len > MAX_BOND || (non_h && len < MIN_NON_H_BOND)
        })
        .map(|e| (e.source, e.target, e.offset))
        .collect();
    for &(s, d, o) in &doomed {
        warn!(
            "suspicious bond {}–{} at {:.2} Å deleted",
            s,
            d,
            bond_length(cell, atoms, s, d, o)
        );
        graph.remove_edge(s, d, o);
    }
    doomed.len()
}

/// Drops bonds between two atoms of the same element for each element
/// in `targets`. Returns how many were dropped.
pub fn remove_homoatomic(graph: &mut PeriodicGraph, atoms: &[Atom], targets: &[Element]) -> usize {
    let doomed: Vec<(usize, usize, Offset)> = graph
        .edges()
        .filter(|e| {
            atoms[e.source].element == atoms[e.target].element
                && targets.contains(&atoms[e.source].element)
        })
        .map(|e| (e.source, e.target, e.offset))
        .collect();
    for &(s, d, o) in &doomed {
        graph.remove_edge(s, d, o);
    }
    if !doomed.is_empty() {
        warn!("removed {} homoatomic bond(s)", doomed.len());
    }
    doomed.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn cell10() -> Cell {
        Cell::from_parameters(10.0, 10.0, 10.0, 90.0, 90.0, 90.0).unwrap()
    }

    fn carbon(x: f64, y: f64, z: f64) -> Atom {
        Atom::new(Element::C, Vector3::new(x, y, z))
    }

    #[test]
    fn aligned_neighbor_loses_farther_bond() {
        let cell = cell10();
        let atoms = vec![
            carbon(0.0, 0.0, 0.0),
            carbon(0.15, 0.0, 0.0),
            carbon(0.30, 0.001, 0.0),
        ];
        let mut g = PeriodicGraph::from_edges(
            3,
            3,
            &[(0, 1, [0, 0, 0]), (0, 2, [0, 0, 0]), (1, 2, [0, 0, 0])],
        );
        remove_aligned(&mut g, &cell, &atoms);
        // 1 and 2 are within 10° as seen from 0; the bond to 2 (3.0 Å)
        // goes, the bond to 1 (1.5 Å) stays.
        assert_eq!(g.degree(0), 1);
        assert_eq!(g.neighbors(0), &[(1, [0, 0, 0])]);
        assert!(g.neighbors(1).iter().any(|&(n, _)| n == 2));
    }

    #[test]
    fn perpendicular_neighbors_are_left_alone() {
        let cell = cell10();
        let atoms = vec![
            carbon(0.0, 0.0, 0.0),
            carbon(0.15, 0.0, 0.0),
            carbon(0.0, 0.15, 0.0),
        ];
        let mut g =
            PeriodicGraph::from_edges(3, 3, &[(0, 1, [0, 0, 0]), (0, 2, [0, 0, 0])]);
        remove_aligned(&mut g, &cell, &atoms);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn long_triangle_edge_is_removed() {
        let cell = cell10();
        let atoms = vec![
            carbon(0.0, 0.0, 0.0),
            carbon(0.32, 0.0, 0.0),
            carbon(0.16, 0.05, 0.0),
        ];
        let mut g = PeriodicGraph::from_edges(
            3,
            3,
            &[(0, 1, [0, 0, 0]), (0, 2, [0, 0, 0]), (1, 2, [0, 0, 0])],
        );
        remove_triangles(&mut g, &cell, &atoms);
        assert_eq!(g.edge_count(), 2);
        assert!(g.neighbors(0).binary_search(&(1, [0, 0, 0])).is_err());
    }

    #[test]
    fn short_triangles_survive() {
        let cell = cell10();
        let atoms = vec![
            carbon(0.0, 0.0, 0.0),
            carbon(0.14, 0.0, 0.0),
            carbon(0.07, 0.12, 0.0),
        ];
        let mut g = PeriodicGraph::from_edges(
            3,
            3,
            &[(0, 1, [0, 0, 0]), (0, 2, [0, 0, 0]), (1, 2, [0, 0, 0])],
        );
        remove_triangles(&mut g, &cell, &atoms);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn excess_valence_drops_longest_bonds_but_keeps_hydrogens() {
        let cell = cell10();
        let mut atoms = vec![
            carbon(0.5, 0.5, 0.5),
            Atom::new(Element::H, Vector3::new(0.5, 0.5, 0.4)),
            Atom::new(Element::O, Vector3::new(0.64, 0.5, 0.5)),
            Atom::new(Element::O, Vector3::new(0.5, 0.65, 0.5)),
            Atom::new(Element::O, Vector3::new(0.36, 0.5, 0.56)),
            Atom::new(Element::O, Vector3::new(0.5, 0.33, 0.5)),
        ];
        // The O at index 5 is the farthest heavy neighbor.
        atoms[5].position = Vector3::new(0.5, 0.32, 0.5);
        let mut g = PeriodicGraph::from_edges(
            3,
            6,
            &[
                (0, 1, [0, 0, 0]),
                (0, 2, [0, 0, 0]),
                (0, 3, [0, 0, 0]),
                (0, 4, [0, 0, 0]),
                (0, 5, [0, 0, 0]),
            ],
        );
        let invalid = fix_valence(&mut g, &cell, &atoms, false, true);
        assert_eq!(g.degree(0), 4);
        assert!(g.neighbors(0).iter().any(|&(n, _)| n == 1), "H bond kept");
        assert!(g.neighbors(0).iter().all(|&(n, _)| n != 5));
        // The dropped O is now under-bonded and reported invalid.
        assert_eq!(invalid, vec![5]);
    }

    #[test]
    fn report_mode_does_not_mutate() {
        let cell = cell10();
        let atoms = vec![
            Atom::new(Element::N, Vector3::new(0.0, 0.0, 0.0)),
            carbon(0.15, 0.0, 0.0),
        ];
        let mut g = PeriodicGraph::from_edges(3, 2, &[(0, 1, [0, 0, 0])]);
        let invalid = fix_valence(&mut g, &cell, &atoms, false, false);
        assert_eq!(g.edge_count(), 1);
        // N has degree 1 < 2 and C has degree 1 < 2.
        assert_eq!(invalid, vec![0, 1]);
    }

    #[test]
    fn sanity_check_removes_absurd_lengths() {
        let cell = cell10();
        let atoms = vec![
            carbon(0.0, 0.0, 0.0),
            carbon(0.45, 0.0, 0.0),
            carbon(0.05, 0.0, 0.0),
            Atom::new(Element::H, Vector3::new(0.003, 0.0, 0.0)),
        ];
        let mut g = PeriodicGraph::from_edges(
            3,
            4,
            &[(0, 1, [0, 0, 0]), (0, 2, [0, 0, 0]), (0, 3, [0, 0, 0])],
        );
        // 0–1 is 4.5 Å (too long), 0–2 is 0.5 Å between carbons (too
        // short), 0–3 is 0.03 Å but involves hydrogen (kept).
        let removed = sanity_check(&mut g, &cell, &atoms);
        assert_eq!(removed, 2);
        assert_eq!(g.edge_count(), 1);
        assert!(g.neighbors(0).iter().any(|&(n, _)| n == 3));
    }

    #[test]
    fn homoatomic_targets_are_filtered() {
        let atoms = vec![
            Atom::new(Element::O, Vector3::new(0.0, 0.0, 0.0)),
            Atom::new(Element::O, Vector3::new(0.2, 0.0, 0.0)),
            carbon(0.4, 0.0, 0.0),
        ];
        let mut g = PeriodicGraph::from_edges(
            3,
            3,
            &[(0, 1, [0, 0, 0]), (1, 2, [0, 0, 0])],
        );
        let removed = remove_homoatomic(&mut g, &atoms, &[Element::O]);
        assert_eq!(removed, 1);
        assert_eq!(g.edge_count(), 1);
    }
}
