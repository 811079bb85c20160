//! Exact arithmetic helpers shared by the canonicalization phases:
//! integer Hermite-style row reduction and small rational Gaussian
//! elimination. Machine integers carry the lattice work; `BigRational`
//! carries the placement solve.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

pub(crate) type Rat = BigRational;

pub(crate) fn rat(n: i64) -> Rat {
    Rat::from_integer(BigInt::from(n))
}

pub(crate) fn rat_floor(x: &Rat) -> BigInt {
    x.floor().to_integer()
}

/// Integer row-echelon form (Hermite-style) of a set of row vectors.
#[derive(Debug, Clone)]
pub(crate) struct RowBasis {
    pub rows: Vec<[i64; 3]>,
    pub pivots: Vec<usize>,
}

impl RowBasis {
    pub fn rank(&self) -> usize {
        self.rows.len()
    }
}

/// Reduces `rows` (entries beyond `width` must be zero) to an echelon
/// basis of their integer span: positive pivots, entries above each
/// pivot reduced into [0, pivot).
pub(crate) fn row_basis(mut rows: Vec<[i64; 3]>, width: usize) -> RowBasis {
    rows.retain(|r| r.iter().any(|&c| c != 0));
    let mut pivots = Vec::new();
    let mut r = 0;
    for c in 0..width {
        // Clear column c below row r by gcd elimination.
        loop {
            let Some(best) = (r..rows.len())
                .filter(|&i| rows[i][c] != 0)
                .min_by_key(|&i| rows[i][c].unsigned_abs())
            else {
                break;
            };
            rows.swap(r, best);
            let mut any_left = false;
            for i in r + 1..rows.len() {
                if rows[i][c] != 0 {
                    let q = rows[i][c].div_euclid(rows[r][c]);
                    for k in 0..3 {
                        rows[i][k] -= q * rows[r][k];
                    }
                    any_left |= rows[i][c] != 0;
                }
            }
            if !any_left {
                break;
            }
        }
        if r < rows.len() && rows[r][c] != 0 {
            if rows[r][c] < 0 {
                rows[r].iter_mut().for_each(|x| *x = -*x);
            }
            for i in 0..r {
                let q = rows[i][c].div_euclid(rows[r][c]);
                for k in 0..3 {
                    rows[i][k] -= q * rows[r][k];
                }
            }
            pivots.push(c);
            r += 1;
        }
    }
    rows.truncate(r);
    RowBasis { rows, pivots }
}

/// Expresses `v` as an integer combination of the basis rows; `None`
/// when `v` is outside the lattice they span.
pub(crate) fn express(basis: &RowBasis, mut v: [i64; 3]) -> Option<Vec<i64>> {
    let mut coeffs = Vec::with_capacity(basis.rank());
    for (row, &p) in basis.rows.iter().zip(&basis.pivots) {
        if v[p] % row[p] != 0 {
            return None;
        }
        let q = v[p] / row[p];
        for k in 0..3 {
            v[k] -= q * row[k];
        }
        coeffs.push(q);
    }
    if v != [0, 0, 0] {
        return None;
    }
    Some(coeffs)
}

/// Determinant of the top-left `d`×`d` block (other rows/columns treated
/// as identity).
pub(crate) fn det(m: &[[i64; 3]; 3], d: usize) -> i64 {
    let mut p = [[0i64; 3]; 3];
    for (i, row) in p.iter_mut().enumerate() {
        for (j, x) in row.iter_mut().enumerate() {
            *x = if i < d && j < d {
                m[i][j]
            } else {
                i64::from(i == j)
            };
        }
    }
    p[0][0] * (p[1][1] * p[2][2] - p[1][2] * p[2][1])
        - p[0][1] * (p[1][0] * p[2][2] - p[1][2] * p[2][0])
        + p[0][2] * (p[1][0] * p[2][1] - p[1][1] * p[2][0])
}

/// Inverse of a unimodular matrix (|det| = 1) via the adjugate. The
/// caller guarantees unimodularity.
pub(crate) fn inverse_unimodular(m: &[[i64; 3]; 3], d: usize) -> [[i64; 3]; 3] {
    let mut p = [[0i64; 3]; 3];
    for (i, row) in p.iter_mut().enumerate() {
        for (j, x) in row.iter_mut().enumerate() {
            *x = if i < d && j < d {
                m[i][j]
            } else {
                i64::from(i == j)
            };
        }
    }
    let s = det(m, d);
    debug_assert!(s == 1 || s == -1);
    let cof = |r: usize, c: usize| -> i64 {
        let (r1, r2) = match r {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        let (c1, c2) = match c {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        let minor = p[r1][c1] * p[r2][c2] - p[r1][c2] * p[r2][c1];
        if (r + c) % 2 == 0 {
            minor
        } else {
            -minor
        }
    };
    let mut inv = [[0i64; 3]; 3];
    for (i, row) in inv.iter_mut().enumerate() {
        for (j, x) in row.iter_mut().enumerate() {
            *x = s * cof(j, i);
        }
    }
    inv
}

/// Applies the top-left `d`×`d` block of `m` to an offset.
pub(crate) fn apply(m: &[[i64; 3]; 3], v: [i64; 3]) -> [i64; 3] {
    let mut out = [0i64; 3];
    for r in 0..3 {
        for c in 0..3 {
            out[r] += m[r][c] * v[c];
        }
    }
    out
}

/// Solves the square rational system `A · X = B` in place by Gaussian
/// elimination; `A` must be invertible (guaranteed for the graph
/// Laplacian of a connected quotient).
pub(crate) fn solve(mut a: Vec<Vec<Rat>>, mut b: Vec<Vec<Rat>>) -> Vec<Vec<Rat>> {
    let n = a.len();
    let m = if n == 0 { 0 } else { b[0].len() };
    for col in 0..n {
        let pivot = (col..n)
            .find(|&r| !a[r][col].is_zero())
            .expect("singular system");
        a.swap(col, pivot);
        b.swap(col, pivot);
        let inv = a[col][col].recip();
        for k in col..n {
            a[col][k] = &a[col][k] * &inv;
        }
        for k in 0..m {
            b[col][k] = &b[col][k] * &inv;
        }
        for r in 0..n {
            if r != col && !a[r][col].is_zero() {
                let factor = a[r][col].clone();
                for k in col..n {
                    let t = &a[col][k] * &factor;
                    a[r][k] = &a[r][k] - &t;
                }
                for k in 0..m {
                    let t = &b[col][k] * &factor;
                    b[r][k] = &b[r][k] - &t;
                }
            }
        }
    }
    b
}

/// Inverts a small rational matrix (top-left `d`×`d`).
pub(crate) fn invert(a: &[Vec<Rat>]) -> Vec<Vec<Rat>> {
    let d = a.len();
    let mut rhs = vec![vec![Rat::zero(); d]; d];
    for (i, row) in rhs.iter_mut().enumerate() {
        row[i] = rat(1);
    }
    solve(a.to_vec(), rhs)
}
