//! Bond resolution: geometric guessing from Van der Waals radii, and
//! expansion of input bonds declared on atom-site labels.

use crate::io::cif::DeclaredBond;
use crate::model::atom::Atom;
use crate::model::cell::Cell;
use crate::model::graph::lex_positive;
use crate::model::types::Element;

use super::config::Options;

/// Bonds shorter than this are artifacts, in Å.
const MIN_BOND: f64 = 0.4;

/// Tolerance when matching a declared bond distance against an image
/// pair, in Å.
const DECLARED_TOLERANCE: f64 = 1e-2;

const NEIGHBOR_OFFSETS: [i32; 3] = [-1, 0, 1];

fn offsets() -> impl Iterator<Item = [i32; 3]> {
    NEIGHBOR_OFFSETS.into_iter().flat_map(|x| {
        NEIGHBOR_OFFSETS
            .into_iter()
            .flat_map(move |y| NEIGHBOR_OFFSETS.into_iter().map(move |z| [x, y, z]))
    })
}

/// Geometric bond guessing: an (i, j, k) candidate is a bond when its
/// length is inside `(0.4 Å, c₀·(rᵢ + rⱼ))`, with radii widened by 1.5
/// for metals when enabled. Hydrogen never bonds hydrogen.
pub fn guess(cell: &Cell, atoms: &[Atom], options: &Options) -> Vec<(usize, usize, [i32; 3])> {
    let radius = |el: Element| {
        let r = el.vdw_radius();
        if options.widen_metal_radii && el.is_metal() {
            r * 1.5
        } else {
            r
        }
    };
    let mut out = Vec::new();
    for i in 0..atoms.len() {
        for j in i..atoms.len() {
            if atoms[i].element == Element::H && atoms[j].element == Element::H {
                continue;
            }
            let cutoff =
                options.cutoff_coefficient * (radius(atoms[i].element) + radius(atoms[j].element));
            for k in offsets() {
                if i == j && !lex_positive(k) {
                    continue;
                }
                let d = cell.distance(&atoms[i].position, &atoms[j].position, k);
                if d > MIN_BOND && d < cutoff {
                    out.push((i, j, k));
                }
            }
        }
    }
    out
}

/// Expands label-declared bonds to every image pair whose distance
/// matches the declared one; without a declared distance only the
/// minimum image is bonded.
pub fn from_declared(
    cell: &Cell,
    atoms: &[Atom],
    labels: &[String],
    declared: &[DeclaredBond],
) -> Vec<(usize, usize, [i32; 3])> {
    let mut out = Vec::new();
    for bond in declared {
        let left: Vec<usize> = (0..atoms.len()).filter(|&i| labels[i] == bond.label_a).collect();
        let right: Vec<usize> = (0..atoms.len()).filter(|&j| labels[j] == bond.label_b).collect();
        for &i in &left {
            for &j in &right {
                match bond.distance {
                    Some(target) => {
                        for k in offsets() {
                            if i == j && !lex_positive(k) {
                                continue;
                            }
                            let d = cell.distance(&atoms[i].position, &atoms[j].position, k);
                            if (d - target).abs() < DECLARED_TOLERANCE {
                                out.push((i, j, k));
                            }
                        }
                    }
                    None => {
                        let (k, _) = cell.min_image(&atoms[i].position, &atoms[j].position);
                        if i != j || k != [0, 0, 0] {
                            out.push((i.min(j), i.max(j), if i <= j { k } else { [-k[0], -k[1], -k[2]] }));
                        }
                    }
                }
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}
