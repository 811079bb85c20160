//! Symmetry expansion: apply every equivalent position to every base
//! atom and drop the duplicates this creates.

use crate::model::atom::{wrap, Atom};
use crate::model::cell::Cell;

/// Two fractional positions are the same site when each component
/// difference is within this tolerance after reduction mod 1.
const POSITION_TOLERANCE: f64 = 1e-4;

pub(crate) fn same_position_mod_1(a: &nalgebra::Vector3<f64>, b: &nalgebra::Vector3<f64>) -> bool {
    (0..3).all(|k| {
        let d = a[k] - b[k];
        (d - d.round()).abs() <= POSITION_TOLERANCE
    })
}

/// Expands the base atom list under the cell's equivalent positions.
/// Labels follow their atoms, so bonds declared on labels expand with
/// them.
pub fn expand(cell: &Cell, atoms: &[Atom], labels: &[String]) -> (Vec<Atom>, Vec<String>) {
    debug_assert_eq!(atoms.len(), labels.len());
    let mut out_atoms: Vec<Atom> = Vec::with_capacity(atoms.len() * (cell.equivalents.len() + 1));
    let mut out_labels: Vec<String> = Vec::with_capacity(out_atoms.capacity());

    let mut push_unique = |atom: Atom, label: &str| {
        let duplicate = out_atoms
            .iter()
            .any(|a| a.element == atom.element && same_position_mod_1(&a.position, &atom.position));
        if !duplicate {
            out_atoms.push(atom);
            out_labels.push(label.to_string());
        }
    };

    for (atom, label) in atoms.iter().zip(labels) {
        push_unique(atom.clone().wrapped(), label);
    }
    for op in &cell.equivalents {
        for (atom, label) in atoms.iter().zip(labels) {
            let mut image = atom.clone();
            image.position = wrap(op.apply(&atom.position));
            push_unique(image, label);
        }
    }
    (out_atoms, out_labels)
}
