use nalgebra::{Matrix3, Vector3};
use num_rational::Ratio;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    #[error("lattice has zero or negative volume")]
    DegenerateLattice,
    #[error("invalid lattice angles")]
    InvalidAngles,
}

/// One crystallographic equivalent position: an integer rotation (or
/// reflection) matrix plus an exact rational translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetryOp {
    /// Row-major integer rotation part.
    pub rot: [[i32; 3]; 3],
    pub trans: [Ratio<i32>; 3],
}

impl SymmetryOp {
    pub fn identity() -> Self {
        Self {
            rot: [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
            trans: [Ratio::new(0, 1); 3],
        }
    }

    pub fn is_identity(&self) -> bool {
        self == &Self::identity()
    }

    /// Applies the operation to a fractional position.
    pub fn apply(&self, p: &Vector3<f64>) -> Vector3<f64> {
        let mut out = Vector3::zeros();
        for r in 0..3 {
            let mut acc = *self.trans[r].numer() as f64 / *self.trans[r].denom() as f64;
            for c in 0..3 {
                acc += self.rot[r][c] as f64 * p[c];
            }
            out[r] = acc;
        }
        out
    }
}

/// A unit cell: lattice vectors as the columns of `matrix`, the list of
/// non-identity equivalent positions, and the Hall number when known
/// (1 for P1, 0 for unknown).
#[derive(Debug, Clone)]
pub struct Cell {
    pub matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
    pub equivalents: Vec<SymmetryOp>,
    pub hall: u16,
}

impl Cell {
    pub fn new(matrix: Matrix3<f64>) -> Result<Self, CellError> {
        if matrix.determinant() <= 1e-9 {
            return Err(CellError::DegenerateLattice);
        }
        let inverse = matrix.try_inverse().ok_or(CellError::DegenerateLattice)?;
        Ok(Self {
            matrix,
            inverse,
            equivalents: Vec::new(),
            hall: 0,
        })
    }

    /// Builds the cell matrix from lengths (Å) and angles (degrees),
    /// with the conventional orientation: `a` along x, `b` in the xy
    /// plane.
    pub fn from_parameters(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, CellError> {
        let (ar, br, gr) = (alpha.to_radians(), beta.to_radians(), gamma.to_radians());

        let term = 1.0 - ar.cos().powi(2) - br.cos().powi(2) - gr.cos().powi(2)
            + 2.0 * ar.cos() * br.cos() * gr.cos();
        if term <= 0.0 {
            return Err(CellError::InvalidAngles);
        }

        let cy = c * (ar.cos() - br.cos() * gr.cos()) / gr.sin();
        let cz = c * term.sqrt() / gr.sin();
        let matrix = Matrix3::new(
            a,
            b * gr.cos(),
            c * br.cos(),
            0.0,
            b * gr.sin(),
            cy,
            0.0,
            0.0,
            cz,
        );
        Self::new(matrix)
    }

    pub fn with_equivalents(mut self, ops: Vec<SymmetryOp>) -> Self {
        self.equivalents = ops.into_iter().filter(|op| !op.is_identity()).collect();
        self
    }

    #[inline]
    pub fn to_cartesian(&self, frac: &Vector3<f64>) -> Vector3<f64> {
        self.matrix * frac
    }

    #[inline]
    pub fn to_fractional(&self, cart: &Vector3<f64>) -> Vector3<f64> {
        self.inverse * cart
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant()
    }

    /// Cartesian distance between atom `a` in cell 0 and atom `b` in
    /// cell `offset` (fractional positions).
    pub fn distance(&self, a: &Vector3<f64>, b: &Vector3<f64>, offset: [i32; 3]) -> f64 {
        let shift = Vector3::new(offset[0] as f64, offset[1] as f64, offset[2] as f64);
        (self.matrix * (b + shift - a)).norm()
    }

    /// Minimum-image distance over k ∈ {−1,0,1}³ together with the
    /// offset achieving it.
    pub fn min_image(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> ([i32; 3], f64) {
        let mut best = ([0, 0, 0], f64::INFINITY);
        for kx in -1..=1 {
            for ky in -1..=1 {
                for kz in -1..=1 {
                    let k = [kx, ky, kz];
                    let d = self.distance(a, b, k);
                    if d < best.1 {
                        best = (k, d);
                    }
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_cell_round_trips_coordinates() {
        let cell = Cell::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0).unwrap();
        let frac = Vector3::new(0.25, 0.5, 0.75);
        let cart = cell.to_cartesian(&frac);
        assert!((cart - Vector3::new(1.0, 2.0, 3.0)).norm() < 1e-9);
        assert!((cell.to_fractional(&cart) - frac).norm() < 1e-12);
        assert!((cell.volume() - 64.0).abs() < 1e-9);
    }

    #[test]
    fn triclinic_cell_has_positive_volume() {
        let cell = Cell::from_parameters(5.0, 6.0, 7.0, 80.0, 95.0, 112.0).unwrap();
        assert!(cell.volume() > 0.0);
        let (a, b) = (Vector3::new(0.1, 0.1, 0.1), Vector3::new(0.9, 0.9, 0.9));
        let (k, d) = cell.min_image(&a, &b);
        assert_eq!(k, [-1, -1, -1]);
        assert!(d < cell.distance(&a, &b, [0, 0, 0]));
    }

    #[test]
    fn degenerate_lattice_rejected() {
        assert!(matches!(
            Cell::from_parameters(5.0, 5.0, 5.0, 0.0, 90.0, 90.0),
            Err(CellError::InvalidAngles)
        ));
    }

    #[test]
    fn symmetry_op_applies_rotation_and_translation() {
        // -x, y+1/2, z
        let op = SymmetryOp {
            rot: [[-1, 0, 0], [0, 1, 0], [0, 0, 1]],
            trans: [
                Ratio::new(0, 1),
                Ratio::new(1, 2),
                Ratio::new(0, 1),
            ],
        };
        let p = op.apply(&Vector3::new(0.25, 0.25, 0.25));
        assert!((p - Vector3::new(-0.25, 0.75, 0.25)).norm() < 1e-12);
        assert!(!op.is_identity());
        assert!(SymmetryOp::identity().is_identity());
    }

    #[test]
    fn identity_filtered_from_equivalents() {
        let cell = Cell::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0)
            .unwrap()
            .with_equivalents(vec![SymmetryOp::identity()]);
        assert!(cell.equivalents.is_empty());
    }
}
