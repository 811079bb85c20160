//! Canonical vertex labeling. For every candidate offset frame and
//! every start vertex, a breadth-first traversal assigns labels in order
//! of the equilibrium positions of the frontier instances; the candidate
//! with the lexicographically smallest relabeled edge list wins.
//!
//! Sort keys are cover positions (placement plus cell), which are
//! intrinsic to the infinite graph: they do not move under input
//! relabeling or per-vertex representative shifts. Exact key ties are
//! possible only between colliding vertices of unstable nets; those
//! branch, so the minimum stays insertion-order independent.

use num_traits::Zero;

use super::linalg::{apply, inverse_unimodular, rat, Rat};
use super::placement::Placement;
use crate::model::graph::PeriodicGraph;

pub(crate) type Edge64 = (usize, usize, [i64; 3]);

fn lex_positive(o: [i64; 3]) -> bool {
    o.iter().find(|&&c| c != 0).is_some_and(|&c| c > 0)
}

fn direct64(u: usize, v: usize, o: [i64; 3]) -> Edge64 {
    if u < v || (u == v && lex_positive(o)) {
        (u, v, o)
    } else {
        (v, u, [-o[0], -o[1], -o[2]])
    }
}

#[derive(Clone)]
struct State {
    order: Vec<usize>,
    label: Vec<Option<usize>>,
    anchor: Vec<[i64; 3]>,
    cursor: usize,
}

impl State {
    fn start(n: usize, v0: usize) -> Self {
        let mut label = vec![None; n];
        label[v0] = Some(0);
        Self {
            order: vec![v0],
            label,
            anchor: vec![[0, 0, 0]; n],
            cursor: 0,
        }
    }

    fn assign(&mut self, v: usize, cell: [i64; 3]) {
        self.label[v] = Some(self.order.len());
        self.anchor[v] = cell;
        self.order.push(v);
    }
}

/// The lexicographically smallest relabeled direct edge list over all
/// frames, starts and tie orderings.
pub(crate) fn canonical_edges(
    g: &PeriodicGraph,
    place: &Placement,
    frames: &[[[i64; 3]; 3]],
) -> Vec<Edge64> {
    let n = g.vertex_count();
    let d = g.dim();
    let mut best: Option<Vec<Edge64>> = None;

    for frame in frames {
        let binv = inverse_unimodular(frame, d);
        // Adjacency and placement re-expressed in the frame.
        let adj: Vec<Vec<(usize, [i64; 3])>> = (0..n)
            .map(|u| {
                g.neighbors(u)
                    .iter()
                    .map(|&(v, o)| {
                        (
                            v,
                            apply(&binv, [i64::from(o[0]), i64::from(o[1]), i64::from(o[2])]),
                        )
                    })
                    .collect()
            })
            .collect();
        let coords: Vec<[Rat; 3]> = (0..n)
            .map(|v| {
                let mut out = [Rat::zero(), Rat::zero(), Rat::zero()];
                for (r, out_r) in out.iter_mut().enumerate().take(d) {
                    for c in 0..d {
                        *out_r += rat(binv[r][c]) * &place.coords[v][c];
                    }
                }
                out
            })
            .collect();

        for v0 in 0..n {
            explore(&adj, &coords, n, v0, &mut best);
        }
    }
    best.expect("at least one frame and one start vertex")
}

fn explore(
    adj: &[Vec<(usize, [i64; 3])>],
    coords: &[[Rat; 3]],
    n: usize,
    v0: usize,
    best: &mut Option<Vec<Edge64>>,
) {
    let cover_key = |v: usize, cell: [i64; 3]| -> [Rat; 3] {
        let mut key = coords[v].clone();
        for k in 0..3 {
            key[k] += rat(cell[k]);
        }
        key
    };

    let mut stack = vec![State::start(n, v0)];
    while let Some(mut st) = stack.pop() {
        loop {
            if st.cursor == st.order.len() {
                finalize(adj, &st, best);
                break;
            }
            let u = st.order[st.cursor];
            let mut frontier: Vec<([Rat; 3], usize, [i64; 3])> = adj[u]
                .iter()
                .filter(|&&(v, _)| st.label[v].is_none())
                .map(|&(v, o)| {
                    let cell = [
                        st.anchor[u][0] + o[0],
                        st.anchor[u][1] + o[1],
                        st.anchor[u][2] + o[2],
                    ];
                    (cover_key(v, cell), v, cell)
                })
                .collect();
            if frontier.is_empty() {
                st.cursor += 1;
                continue;
            }
            frontier.sort();
            let tied: Vec<(usize, [i64; 3])> = frontier
                .iter()
                .take_while(|(key, _, _)| *key == frontier[0].0)
                .map(|&(_, v, cell)| (v, cell))
                .collect();
            if tied.len() == 1 {
                st.assign(tied[0].0, tied[0].1);
            } else {
                // Placement collision: explore every choice.
                for &(v, cell) in tied.iter().skip(1) {
                    let mut branch = st.clone();
                    branch.assign(v, cell);
                    stack.push(branch);
                }
                st.assign(tied[0].0, tied[0].1);
            }
        }
    }
}

fn finalize(adj: &[Vec<(usize, [i64; 3])>], st: &State, best: &mut Option<Vec<Edge64>>) {
    let mut edges: Vec<Edge64> = Vec::new();
    for (u, nbrs) in adj.iter().enumerate() {
        let lu = st.label[u].expect("completed traversal labels every vertex");
        for &(v, o) in nbrs {
            let lv = st.label[v].expect("completed traversal labels every vertex");
            let shifted = [
                st.anchor[u][0] + o[0] - st.anchor[v][0],
                st.anchor[u][1] + o[1] - st.anchor[v][1],
                st.anchor[u][2] + o[2] - st.anchor[v][2],
            ];
            edges.push(direct64(lu, lv, shifted));
        }
    }
    edges.sort_unstable();
    edges.dedup();
    match best {
        Some(b) if *b <= edges => {}
        _ => *best = Some(edges),
    }
}
