use nalgebra::Vector3;

use super::types::Element;

/// One crystallographic site: an element at a fractional position inside
/// the unit cell, with the optional occupancy and residue label some
/// input formats carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Element,
    /// Fractional coordinates; each component lies in [0, 1) after
    /// ingestion (`wrapped` enforces this).
    pub position: Vector3<f64>,
    /// Site occupancy in (0, 1]; `None` means fully occupied.
    pub occupancy: Option<f64>,
    /// Residue label from the input, when clustering modes need one.
    pub residue: Option<String>,
}

impl Atom {
    pub fn new(element: Element, position: Vector3<f64>) -> Self {
        Self {
            element,
            position,
            occupancy: None,
            residue: None,
        }
    }

    /// Returns the atom with every fractional component reduced to [0, 1).
    pub fn wrapped(mut self) -> Self {
        self.position = wrap(self.position);
        self
    }
}

/// Reduces each component of a fractional vector to [0, 1).
pub fn wrap(p: Vector3<f64>) -> Vector3<f64> {
    p.map(|x| {
        let r = x - x.floor();
        // x.floor() of a value like -1e-17 yields r == 1.0 exactly.
        if r >= 1.0 {
            0.0
        } else {
            r
        }
    })
}
