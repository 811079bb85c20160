//! Minimal-basis enumeration. The equilibrium placement induces a
//! quadratic form Q = Σ w·wᵀ over the geometric edge vectors; Q
//! transforms congruently under unimodular basis changes, so the set of
//! shortest-profile bases under Q is the same whatever coordinates the
//! input arrived in. Every such basis is a candidate offset frame for
//! the canonical labeling.

use num_traits::Zero;

use super::linalg::{det, rat, Rat};
use super::placement::Placement;
use crate::model::graph::PeriodicGraph;

const IDENTITY: [[i64; 3]; 3] = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];

/// All unimodular bases achieving the lexicographically smallest
/// Q-norm profile, as matrices whose columns are the basis vectors.
/// Degenerate Q (possible only for unstable placements) yields the
/// identity frame alone.
pub(crate) fn candidate_bases(g: &PeriodicGraph, place: &Placement) -> Vec<[[i64; 3]; 3]> {
    let d = g.dim();
    let q = gram(g, place);
    if gram_det(&q, d).is_zero() {
        return vec![IDENTITY];
    }

    let qnorm = |v: [i64; 3]| -> Rat {
        let mut acc = Rat::zero();
        for i in 0..d {
            for j in 0..d {
                acc += &q[i][j] * rat(v[i] * v[j]);
            }
        }
        acc
    };

    // Greedy (Minkowski-style) reduction of the identity basis.
    let mut basis: Vec<[i64; 3]> = (0..d)
        .map(|i| {
            let mut e = [0i64; 3];
            e[i] = 1;
            e
        })
        .collect();
    loop {
        let mut improved = false;
        for i in 0..d {
            let others: Vec<usize> = (0..d).filter(|&j| j != i).collect();
            let mut best = basis[i];
            let mut best_norm = qnorm(basis[i]);
            for mask in combinations(others.len()) {
                let mut cand = basis[i];
                for (slot, &j) in others.iter().enumerate() {
                    let c = mask[slot];
                    for k in 0..3 {
                        cand[k] += c * basis[j][k];
                    }
                }
                let norm = qnorm(cand);
                if norm < best_norm {
                    best = cand;
                    best_norm = norm;
                    improved = true;
                }
            }
            basis[i] = best;
        }
        if !improved {
            break;
        }
    }
    basis.sort_by(|a, b| qnorm(*a).cmp(&qnorm(*b)).then(a.cmp(b)));

    // Everything at least as short as the longest reduced vector, with
    // coefficients over the reduced basis bounded by 2.
    let bound = qnorm(basis[d - 1]);
    let mut candidates: Vec<[i64; 3]> = Vec::new();
    let mut coeff = vec![-2i64; d];
    'enumerate: loop {
        let mut v = [0i64; 3];
        for (i, &c) in coeff.iter().enumerate() {
            for k in 0..3 {
                v[k] += c * basis[i][k];
            }
        }
        if v != [0, 0, 0] && qnorm(v) <= bound {
            candidates.push(v);
        }
        for slot in 0..d {
            coeff[slot] += 1;
            if coeff[slot] <= 2 {
                continue 'enumerate;
            }
            coeff[slot] = -2;
        }
        break;
    }
    candidates.sort_by(|a, b| qnorm(*a).cmp(&qnorm(*b)).then(a.cmp(b)));
    candidates.dedup();

    // All ordered unimodular tuples; keep those with the minimal profile.
    let mut best_profile: Option<Vec<Rat>> = None;
    let mut frames: Vec<[[i64; 3]; 3]> = Vec::new();
    let mut pick = vec![0usize; d];
    'tuples: loop {
        let mut m = IDENTITY;
        for (c, &idx) in pick.iter().enumerate() {
            for r in 0..3 {
                m[r][c] = if r < d {
                    candidates[idx][r]
                } else {
                    i64::from(r == c)
                };
            }
        }
        if det(&m, d).abs() == 1 {
            let profile: Vec<Rat> = pick.iter().map(|&i| qnorm(candidates[i])).collect();
            match &best_profile {
                Some(best) if *best < profile => {}
                Some(best) if *best == profile => frames.push(m),
                _ => {
                    best_profile = Some(profile);
                    frames.clear();
                    frames.push(m);
                }
            }
        }
        for slot in 0..d {
            pick[slot] += 1;
            if pick[slot] < candidates.len() {
                continue 'tuples;
            }
            pick[slot] = 0;
        }
        break;
    }
    debug_assert!(!frames.is_empty());
    frames
}

fn combinations(len: usize) -> Vec<Vec<i64>> {
    let mut out = Vec::new();
    let mut cur = vec![-1i64; len];
    loop {
        if cur.iter().any(|&c| c != 0) {
            out.push(cur.clone());
        }
        let mut slot = 0;
        loop {
            if slot == len {
                return out;
            }
            cur[slot] += 1;
            if cur[slot] <= 1 {
                break;
            }
            cur[slot] = -1;
            slot += 1;
        }
    }
}

fn gram(g: &PeriodicGraph, place: &Placement) -> [[Rat; 3]; 3] {
    let d = g.dim();
    let mut q: [[Rat; 3]; 3] =
        std::array::from_fn(|_| std::array::from_fn(|_| Rat::zero()));
    for e in g.edges() {
        let mut w = [Rat::zero(), Rat::zero(), Rat::zero()];
        for k in 0..d {
            w[k] = &place.coords[e.target][k] + rat(i64::from(e.offset[k]))
                - &place.coords[e.source][k];
        }
        for i in 0..d {
            for j in 0..d {
                let t = &w[i] * &w[j];
                q[i][j] += t;
            }
        }
    }
    q
}

fn gram_det(q: &[[Rat; 3]; 3], d: usize) -> Rat {
    match d {
        1 => q[0][0].clone(),
        2 => &q[0][0] * &q[1][1] - &q[0][1] * &q[1][0],
        _ => {
            let m = |i: usize, j: usize| &q[i][j];
            m(0, 0) * &(m(1, 1) * m(2, 2) - m(1, 2) * m(2, 1))
                - m(0, 1) * &(m(1, 0) * m(2, 2) - m(1, 2) * m(2, 0))
                + m(0, 2) * &(m(1, 0) * m(2, 1) - m(1, 1) * m(2, 0))
        }
    }
}
