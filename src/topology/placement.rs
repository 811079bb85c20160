//! Barycentric (equilibrium) placement: every vertex sits at the average
//! of its neighbors, with vertex 0 pinned at the origin. For a connected
//! quotient the solution is unique and rational.

use num_traits::Zero;

use super::linalg::{rat, solve, Rat};
use crate::model::graph::PeriodicGraph;

#[derive(Debug, Clone)]
pub(crate) struct Placement {
    /// Fractional coordinates per vertex; only the first `dim`
    /// components are meaningful.
    pub coords: Vec<[Rat; 3]>,
    /// Two distinct vertices collide (placements differ by an integer
    /// vector): the net is unstable.
    pub unstable: bool,
}

impl Placement {
    /// Position of the cover instance of `v` in cell `c`.
    pub fn cover_position(&self, v: usize, c: [i64; 3]) -> [Rat; 3] {
        let mut p = self.coords[v].clone();
        for k in 0..3 {
            p[k] += rat(c[k]);
        }
        p
    }
}

pub(crate) fn equilibrium(g: &PeriodicGraph) -> Placement {
    let n = g.vertex_count();
    let d = g.dim();
    let zero3 = || [Rat::zero(), Rat::zero(), Rat::zero()];

    let mut coords = vec![zero3(); n];
    if n > 1 {
        // deg(u)·x_u − Σ x_v = Σ o over neighbors (v, o); x_0 = 0.
        let mut a = vec![vec![Rat::zero(); n - 1]; n - 1];
        let mut b = vec![vec![Rat::zero(); d]; n - 1];
        for u in 1..n {
            a[u - 1][u - 1] = rat(g.degree(u) as i64);
            for &(v, o) in g.neighbors(u) {
                if v > 0 {
                    let t = &a[u - 1][v - 1] - &rat(1);
                    a[u - 1][v - 1] = t;
                }
                for k in 0..d {
                    let t = &b[u - 1][k] + &rat(i64::from(o[k]));
                    b[u - 1][k] = t;
                }
            }
        }
        let x = solve(a, b);
        for u in 1..n {
            for k in 0..d {
                coords[u][k] = x[u - 1][k].clone();
            }
        }
    }

    let unstable = (0..n).any(|u| {
        (u + 1..n).any(|v| {
            (0..d).all(|k| {
                let diff = &coords[u][k] - &coords[v][k];
                diff.is_integer()
            })
        })
    });

    Placement { coords, unstable }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_vertex_sits_at_origin() {
        let g = PeriodicGraph::from_edges(3, 1, &[(0, 0, [1, 0, 0]), (0, 0, [0, 1, 0]), (0, 0, [0, 0, 1])]);
        let p = equilibrium(&g);
        assert!(p.coords[0].iter().all(|c| c.is_zero()));
        assert!(!p.unstable);
    }

    #[test]
    fn diamond_vertex_sits_at_quarter_point() {
        let g = PeriodicGraph::from_edges(
            3,
            2,
            &[
                (0, 1, [0, 0, 0]),
                (0, 1, [0, 0, 1]),
                (0, 1, [0, 1, 0]),
                (0, 1, [1, 0, 0]),
            ],
        );
        let p = equilibrium(&g);
        // 4·x₁ = 4·x₀ + Σ(−o) = (−1,−1,−1)
        let expect = Rat::new((-1).into(), 4.into());
        for k in 0..3 {
            assert_eq!(p.coords[1][k], expect);
        }
        assert!(!p.unstable);
    }

    #[test]
    fn honeycomb_placement_is_third_points() {
        let g = PeriodicGraph::from_edges(
            2,
            2,
            &[(0, 1, [0, 0, 0]), (0, 1, [-1, 0, 0]), (0, 1, [0, -1, 0])],
        );
        let p = equilibrium(&g);
        let third = Rat::new(1.into(), 3.into());
        assert_eq!(p.coords[1][0], third);
        assert_eq!(p.coords[1][1], third);
        assert!(!p.unstable);
    }

    #[test]
    fn colliding_vertices_flag_unstable() {
        // Vertices 1 and 2 have identical neighborhoods and collapse to
        // the same barycenter.
        let g = PeriodicGraph::from_edges(
            3,
            3,
            &[
                (0, 1, [0, 0, 0]),
                (0, 1, [1, 0, 0]),
                (0, 2, [0, 0, 0]),
                (0, 2, [1, 0, 0]),
                (0, 0, [0, 1, 0]),
                (0, 0, [0, 0, 1]),
            ],
        );
        let p = equilibrium(&g);
        assert!(p.unstable);
    }

    #[test]
    fn cover_position_adds_cell() {
        let g = PeriodicGraph::from_edges(2, 1, &[(0, 0, [1, 0, 0]), (0, 0, [0, 1, 0])]);
        let p = equilibrium(&g);
        let pos = p.cover_position(0, [2, -1, 0]);
        assert_eq!(pos[0], rat(2));
        assert_eq!(pos[1], rat(-1));
    }
}
