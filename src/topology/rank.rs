//! Dimensionality reduction: the ℤ-rank of the lattice spanned by cycle
//! offsets decides the true periodicity, independent of the embedding
//! cell.

use std::collections::VecDeque;

use super::error::Error;
use super::linalg::{express, row_basis};
use crate::model::graph::PeriodicGraph;

/// Re-expresses a connected quotient graph over a basis of its cycle
/// lattice. The result has `dim` equal to the lattice rank, offsets
/// spanning all of ℤ^dim, and exactly one cover component represented.
pub(crate) fn reduce_rank(g: &PeriodicGraph) -> Result<PeriodicGraph, Error> {
    let n = g.vertex_count();
    debug_assert!(n > 0);

    // Spanning-tree anchors: the cell each vertex is first reached in.
    let mut anchor: Vec<Option<[i64; 3]>> = vec![None; n];
    anchor[0] = Some([0, 0, 0]);
    let mut queue = VecDeque::from([0usize]);
    while let Some(u) = queue.pop_front() {
        let au = anchor[u].expect("queued vertices are anchored");
        for &(v, o) in g.neighbors(u) {
            if anchor[v].is_none() {
                anchor[v] = Some([
                    au[0] + i64::from(o[0]),
                    au[1] + i64::from(o[1]),
                    au[2] + i64::from(o[2]),
                ]);
                queue.push_back(v);
            }
        }
    }

    let cycle = |u: usize, v: usize, o: [i32; 3]| -> [i64; 3] {
        let (au, av) = (anchor[u].unwrap(), anchor[v].unwrap());
        [
            au[0] + i64::from(o[0]) - av[0],
            au[1] + i64::from(o[1]) - av[1],
            au[2] + i64::from(o[2]) - av[2],
        ]
    };

    let vectors: Vec<[i64; 3]> = g
        .edges()
        .map(|e| cycle(e.source, e.target, e.offset))
        .collect();
    let basis = row_basis(vectors, g.dim());
    if basis.rank() == 0 {
        return Err(Error::NonPeriodic);
    }

    let mut reduced = PeriodicGraph::new(basis.rank(), n);
    for e in g.edges() {
        let c = cycle(e.source, e.target, e.offset);
        let coeffs =
            express(&basis, c).expect("cycle vectors lie in the lattice they generate");
        let mut o = [0i32; 3];
        for (k, &q) in coeffs.iter().enumerate() {
            o[k] = q as i32;
        }
        reduced.add_edge(e.source, e.target, o);
    }
    Ok(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_rank_graph_is_preserved() {
        let g = PeriodicGraph::from_edges(
            3,
            1,
            &[(0, 0, [1, 0, 0]), (0, 0, [0, 1, 0]), (0, 0, [0, 0, 1])],
        );
        let r = reduce_rank(&g).unwrap();
        assert_eq!(r.dim(), 3);
        assert_eq!(r.edge_count(), 3);
    }

    #[test]
    fn chain_embedded_in_three_dimensions_has_rank_one() {
        // A zigzag chain along the first axis: offsets use one lattice
        // direction only.
        let g = PeriodicGraph::from_edges(3, 2, &[(0, 1, [0, 0, 0]), (1, 0, [1, 0, 0])]);
        let r = reduce_rank(&g).unwrap();
        assert_eq!(r.dim(), 1);
        assert_eq!(r.edge_count(), 2);
    }

    #[test]
    fn layer_uses_oblique_directions() {
        // Honeycomb-like layer spanned by (1,0,1) and (0,1,1): rank 2.
        let g = PeriodicGraph::from_edges(
            3,
            2,
            &[(0, 1, [0, 0, 0]), (0, 1, [1, 0, 1]), (0, 1, [0, 1, 1])],
        );
        let r = reduce_rank(&g).unwrap();
        assert_eq!(r.dim(), 2);
        assert_eq!(r.edge_count(), 3);
    }

    #[test]
    fn molecular_graph_is_non_periodic() {
        let g = PeriodicGraph::from_edges(3, 2, &[(0, 1, [0, 0, 0])]);
        assert!(matches!(reduce_rank(&g), Err(Error::NonPeriodic)));
    }

    #[test]
    fn sublattice_offsets_are_rescaled() {
        // pcu drawn with doubled offsets: the cycle lattice is 2ℤ³, so
        // the reduced graph recovers unit strides.
        let g = PeriodicGraph::from_edges(
            3,
            1,
            &[(0, 0, [2, 0, 0]), (0, 0, [0, 2, 0]), (0, 0, [0, 0, 2])],
        );
        let r = reduce_rank(&g).unwrap();
        assert_eq!(r.dim(), 3);
        let offsets: Vec<[i32; 3]> = r.edges().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![[0, 0, 1], [0, 1, 0], [1, 0, 0]]);
    }
}
