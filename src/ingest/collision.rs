//! Collision pruning: atoms closer than a hard floor are the same site
//! seen twice (disorder, symmetry artifacts, input errors); all but one
//! per cluster is dropped.

use log::warn;

use crate::model::atom::Atom;
use crate::model::cell::Cell;

/// Minimum-image distance below which two atoms collide, in Å.
const COLLISION_DISTANCE: f64 = 0.55;

/// Returns the removal mask. Within a colliding pair the atom with the
/// higher occupancy survives; on equal occupancy the earlier index does.
pub fn removal_mask(cell: &Cell, atoms: &[Atom]) -> Vec<bool> {
    let n = atoms.len();
    let mut remove = vec![false; n];
    for i in 0..n {
        if remove[i] {
            continue;
        }
        for j in i + 1..n {
            if remove[j] {
                continue;
            }
            let (_, d) = cell.min_image(&atoms[i].position, &atoms[j].position);
            if d < COLLISION_DISTANCE {
                let occ_i = atoms[i].occupancy.unwrap_or(1.0);
                let occ_j = atoms[j].occupancy.unwrap_or(1.0);
                if occ_j > occ_i {
                    remove[i] = true;
                    break;
                }
                remove[j] = true;
            }
        }
    }
    let dropped = remove.iter().filter(|&&r| r).count();
    if dropped > 0 {
        warn!("collision pruning removed {} atom(s)", dropped);
    }
    remove
}
