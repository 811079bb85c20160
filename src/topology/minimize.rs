//! Translational quotient minimization: when the drawn cell is not
//! primitive, some vertices are images of others under a translation the
//! offsets do not express. Detecting those translations from the
//! equilibrium placement and re-expressing the quotient over the true
//! lattice makes a conventional cell and its primitive cell
//! indistinguishable downstream.

use std::collections::HashMap;

use log::warn;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use super::linalg::{invert, rat, rat_floor, row_basis, Rat};
use super::placement::Placement;
use crate::model::graph::PeriodicGraph;

fn frac(x: &Rat) -> Rat {
    x - Rat::from_integer(rat_floor(x))
}

fn frac_key(p: &[Rat; 3], d: usize) -> [Rat; 3] {
    let mut out = [Rat::zero(), Rat::zero(), Rat::zero()];
    for k in 0..d {
        out[k] = frac(&p[k]);
    }
    out
}

/// Returns the quotient over the true translation lattice, or `None`
/// when the quotient is already minimal. Must not be called on unstable
/// placements (colliding vertices make the vertex→position map
/// ambiguous).
pub(crate) fn minimize_quotient(g: &PeriodicGraph, place: &Placement) -> Option<PeriodicGraph> {
    debug_assert!(!place.unstable);
    let n = g.vertex_count();
    let d = g.dim();
    if n <= 1 {
        return None;
    }

    let mut index: HashMap<[Rat; 3], usize> = HashMap::with_capacity(n);
    for v in 0..n {
        if index.insert(frac_key(&place.coords[v], d), v).is_some() {
            return None;
        }
    }

    // Integer displacement x_u + s − x_w, when it is one.
    let int_disp = |u: usize, s: &[Rat; 3], w: usize| -> Option<[i64; 3]> {
        let mut out = [0i64; 3];
        for k in 0..d {
            let diff = &place.coords[u][k] + &s[k] - &place.coords[w][k];
            if !diff.is_integer() {
                return None;
            }
            out[k] = diff.to_integer().to_i64()?;
        }
        Some(out)
    };

    let mut translations: Vec<[Rat; 3]> = Vec::new();
    'candidates: for v in 1..n {
        let s = frac_key(&place.coords[v], d);
        if s.iter().all(Zero::is_zero) {
            continue;
        }
        // The induced vertex map and its per-vertex integer parts.
        let mut phi = vec![0usize; n];
        let mut gvec = vec![[0i64; 3]; n];
        for u in 0..n {
            let mut target = place.coords[u].clone();
            for k in 0..d {
                target[k] += &s[k];
            }
            let Some(&w) = index.get(&frac_key(&target, d)) else {
                continue 'candidates;
            };
            let Some(disp) = int_disp(u, &s, w) else {
                continue 'candidates;
            };
            phi[u] = w;
            gvec[u] = disp;
        }
        // Adjacency must be preserved edge for edge.
        for u in 0..n {
            for &(nb, o) in g.neighbors(u) {
                let mut shifted = [0i32; 3];
                for k in 0..3 {
                    let c = i64::from(o[k]) + gvec[nb][k] - gvec[u][k];
                    shifted[k] = match i32::try_from(c) {
                        Ok(c) => c,
                        Err(_) => continue 'candidates,
                    };
                }
                if g.neighbors(phi[u]).binary_search(&(phi[nb], shifted)).is_err() {
                    continue 'candidates;
                }
            }
        }
        translations.push(s);
    }
    if translations.is_empty() {
        return None;
    }

    // Scale the lattice ℤ^d + Σ ℤs into integers and reduce.
    let mut q = BigInt::one();
    for s in &translations {
        for k in 0..d {
            q = q.lcm(s[k].denom());
        }
    }
    let mut generators: Vec<[i64; 3]> = Vec::new();
    for k in 0..d {
        let mut e = [0i64; 3];
        e[k] = match q.to_i64() {
            Some(v) => v,
            None => {
                warn!("translation lattice denominators overflow; keeping quotient");
                return None;
            }
        };
        generators.push(e);
    }
    for s in &translations {
        let mut row = [0i64; 3];
        for k in 0..d {
            let scaled = &s[k] * Rat::from_integer(q.clone());
            row[k] = match scaled.to_integer().to_i64() {
                Some(v) => v,
                None => {
                    warn!("translation lattice denominators overflow; keeping quotient");
                    return None;
                }
            };
        }
        generators.push(row);
    }
    let basis = row_basis(generators, d);
    debug_assert_eq!(basis.rank(), d);

    // Rational basis rows t_i = rows_i / q; M[j][i] = t_i[j] solves
    // x = Σ y_i t_i for y.
    let qr = Rat::from_integer(q);
    let mut m = vec![vec![Rat::zero(); d]; d];
    for (i, row) in basis.rows.iter().enumerate() {
        for j in 0..d {
            m[j][i] = rat(row[j]) / &qr;
        }
    }
    let minv = invert(&m);
    let to_lattice = |x: &[Rat; 3]| -> [Rat; 3] {
        let mut y = [Rat::zero(), Rat::zero(), Rat::zero()];
        for (i, yi) in y.iter_mut().enumerate().take(d) {
            for j in 0..d {
                *yi += &minv[i][j] * &x[j];
            }
        }
        y
    };

    // Orbit representatives, in order of smallest original index.
    let mut class_of = vec![usize::MAX; n];
    let mut reps: Vec<usize> = Vec::new();
    let mut residues: HashMap<[Rat; 3], usize> = HashMap::new();
    for v in 0..n {
        let y = to_lattice(&place.coords[v]);
        let key = frac_key(&y, d);
        let class = *residues.entry(key).or_insert_with(|| {
            reps.push(v);
            reps.len() - 1
        });
        class_of[v] = class;
    }
    if reps.len() == n {
        return None;
    }

    let mut reduced = PeriodicGraph::new(d, reps.len());
    for (class, &u) in reps.iter().enumerate() {
        for &(nb, o) in g.neighbors(u) {
            let mut p = place.coords[nb].clone();
            for k in 0..d {
                p[k] += rat(i64::from(o[k]));
            }
            let rep_nb = reps[class_of[nb]];
            let mut rel = [Rat::zero(), Rat::zero(), Rat::zero()];
            for k in 0..d {
                rel[k] = &p[k] - &place.coords[rep_nb][k];
            }
            let y = to_lattice(&rel);
            let mut offset = [0i32; 3];
            for k in 0..d {
                debug_assert!(y[k].is_integer());
                offset[k] = y[k].to_integer().to_i32().unwrap_or_else(|| {
                    debug_assert!(false, "reduced offset out of range");
                    0
                });
            }
            reduced.add_edge(class, class_of[nb], offset);
        }
    }
    Some(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::placement::equilibrium;

    #[test]
    fn doubled_pcu_cell_reduces_to_one_vertex() {
        // Simple cubic drawn with two vertices stacked along the third
        // axis.
        let g = PeriodicGraph::from_edges(
            3,
            2,
            &[
                (0, 1, [0, 0, 0]),
                (1, 0, [0, 0, 1]),
                (0, 0, [1, 0, 0]),
                (0, 0, [0, 1, 0]),
                (1, 1, [1, 0, 0]),
                (1, 1, [0, 1, 0]),
            ],
        );
        let place = equilibrium(&g);
        let reduced = minimize_quotient(&g, &place).expect("should reduce");
        assert_eq!(reduced.vertex_count(), 1);
        assert_eq!(reduced.edge_count(), 3);
        let offsets: Vec<[i32; 3]> = reduced.edges().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![[0, 0, 1], [0, 1, 0], [1, 0, 0]]);
    }

    #[test]
    fn primitive_quotient_is_left_alone() {
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
        let place = equilibrium(&g);
        assert!(minimize_quotient(&g, &place).is_none());
    }

    #[test]
    fn quadrupled_chain_reduces_fully() {
        // A 1-periodic chain drawn with four vertices per period.
        let g = PeriodicGraph::from_edges(
            1,
            4,
            &[
                (0, 1, [0, 0, 0]),
                (1, 2, [0, 0, 0]),
                (2, 3, [0, 0, 0]),
                (3, 0, [1, 0, 0]),
            ],
        );
        let place = equilibrium(&g);
        let reduced = minimize_quotient(&g, &place).expect("should reduce");
        assert_eq!(reduced.vertex_count(), 1);
        let offsets: Vec<[i32; 3]> = reduced.edges().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![[1, 0, 0]]);
    }
}
