//! Minimal CIF reader: key/value extraction, `loop_` scanning, symmetry
//! operator parsing and `geom_bond` records. Anything beyond the keys
//! the pipeline needs is skipped, not rejected.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;
use nalgebra::Vector3;
use num_rational::Ratio;

use super::{error::Error, Format};
use crate::model::atom::Atom;
use crate::model::cell::{Cell, SymmetryOp};
use crate::model::types::Element;

/// A bond declared on atom-site labels, prior to symmetry expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredBond {
    pub label_a: String,
    pub label_b: String,
    pub distance: Option<f64>,
}

/// The parts of a CIF file the pipeline consumes.
#[derive(Debug, Clone)]
pub struct CifStructure {
    pub cell: Cell,
    pub atoms: Vec<Atom>,
    /// `_atom_site_label` per atom, parallel to `atoms`.
    pub labels: Vec<String>,
    pub bonds: Vec<DeclaredBond>,
}

pub fn read_file(path: &Path) -> Result<CifStructure, Error> {
    read(BufReader::new(File::open(path)?))
}

pub fn read<R: BufRead>(reader: R) -> Result<CifStructure, Error> {
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

    let mut scalars: HashMap<String, String> = HashMap::new();
    let mut symop_strings: Vec<(usize, String)> = Vec::new();
    let mut atom_rows: Option<(usize, Vec<String>, Vec<Vec<String>>)> = None;
    let mut bond_rows: Option<(usize, Vec<String>, Vec<Vec<String>>)> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("data_") {
            i += 1;
            continue;
        }
        if line.eq_ignore_ascii_case("loop_") {
            i += 1;
            let mut headers = Vec::new();
            while i < lines.len() && lines[i].trim().starts_with('_') {
                headers.push(lines[i].trim().to_ascii_lowercase());
                i += 1;
            }
            let first_row = i;
            let mut rows = Vec::new();
            while i < lines.len() {
                let row = lines[i].trim();
                if row.is_empty()
                    || row.starts_with('_')
                    || row.starts_with('#')
                    || row.starts_with("data_")
                    || row.eq_ignore_ascii_case("loop_")
                {
                    break;
                }
                rows.push(tokenize(row));
                i += 1;
            }
            dispatch_loop(
                first_row,
                &headers,
                rows,
                &mut symop_strings,
                &mut atom_rows,
                &mut bond_rows,
            );
            continue;
        }
        if line.starts_with('_') {
            let tokens = tokenize(line);
            if tokens.len() >= 2 {
                let key = tokens[0].to_ascii_lowercase();
                if is_symop_key(&key) {
                    symop_strings.push((i + 1, tokens[1..].concat()));
                } else {
                    scalars.insert(key, tokens[1].clone());
                }
            }
        }
        i += 1;
    }

    let cell = build_cell(&scalars, &symop_strings)?;
    let (atoms, labels) = build_atoms(atom_rows)?;
    if atoms.is_empty() {
        return Err(Error::MissingAtomInformation(
            "no _atom_site records found".into(),
        ));
    }
    let bonds = build_bonds(bond_rows)?;

    Ok(CifStructure {
        cell,
        atoms,
        labels,
        bonds,
    })
}

fn is_symop_key(key: &str) -> bool {
    matches!(
        key,
        "_symmetry_equiv_pos_as_xyz" | "_space_group_symop_operation_xyz"
    )
}

#[allow(clippy::type_complexity)]
fn dispatch_loop(
    first_row: usize,
    headers: &[String],
    rows: Vec<Vec<String>>,
    symop_strings: &mut Vec<(usize, String)>,
    atom_rows: &mut Option<(usize, Vec<String>, Vec<Vec<String>>)>,
    bond_rows: &mut Option<(usize, Vec<String>, Vec<Vec<String>>)>,
) {
    if let Some(xyz) = headers.iter().position(|h| is_symop_key(h)) {
        for (k, row) in rows.iter().enumerate() {
            if row.len() > xyz {
                // Unquoted operators may have split on spaces; rejoin.
                symop_strings.push((first_row + k + 1, row[xyz..].concat()));
            }
        }
    } else if headers.iter().any(|h| h == "_atom_site_fract_x") {
        *atom_rows = Some((first_row, headers.to_vec(), rows));
    } else if headers.iter().any(|h| h == "_geom_bond_atom_site_label_1") {
        *bond_rows = Some((first_row, headers.to_vec(), rows));
    }
}

fn build_cell(
    scalars: &HashMap<String, String>,
    symop_strings: &[(usize, String)],
) -> Result<Cell, Error> {
    let param = |key: &str| -> Result<f64, Error> {
        let raw = scalars
            .get(key)
            .ok_or_else(|| Error::MissingAtomInformation(format!("missing CIF key '{}'", key)))?;
        parse_cif_float(raw)
            .ok_or_else(|| Error::parse(Format::Cif, 0, format!("bad number '{}' for {}", raw, key)))
    };

    let cell = Cell::from_parameters(
        param("_cell_length_a")?,
        param("_cell_length_b")?,
        param("_cell_length_c")?,
        param("_cell_angle_alpha")?,
        param("_cell_angle_beta")?,
        param("_cell_angle_gamma")?,
    )
    .map_err(|e| Error::parse(Format::Cif, 0, e.to_string()))?;

    let mut ops = Vec::new();
    for (line, s) in symop_strings {
        ops.push(parse_symop(s, *line)?);
    }

    let mut hall = 0;
    if ops.is_empty() {
        // No explicit operator list: only the trivial group is honored.
        let name = scalars
            .get("_space_group_name_hall")
            .or_else(|| scalars.get("_space_group_name_h-m_alt"))
            .or_else(|| scalars.get("_symmetry_space_group_name_h-m"))
            .map(|s| s.replace([' ', '_'], "").to_ascii_uppercase());
        let number = scalars
            .get("_symmetry_int_tables_number")
            .or_else(|| scalars.get("_space_group_it_number"))
            .and_then(|s| s.parse::<u16>().ok());
        match (name.as_deref(), number) {
            (Some("P1"), _) | (None, Some(1)) => hall = 1,
            (None, None) => hall = 1,
            (name, number) => {
                warn!(
                    "space group {:?}/{:?} given without operator list; assuming P1",
                    name, number
                );
            }
        }
    }

    Ok(cell.with_equivalents(ops))
}

#[allow(clippy::type_complexity)]
fn build_atoms(
    atom_rows: Option<(usize, Vec<String>, Vec<Vec<String>>)>,
) -> Result<(Vec<Atom>, Vec<String>), Error> {
    let Some((first_row, headers, rows)) = atom_rows else {
        return Ok((Vec::new(), Vec::new()));
    };
    let col = |name: &str| headers.iter().position(|h| h == name);
    let label_idx = col("_atom_site_label");
    let symbol_idx = col("_atom_site_type_symbol");
    let occ_idx = col("_atom_site_occupancy");
    let x_idx = col("_atom_site_fract_x")
        .ok_or_else(|| Error::MissingAtomInformation("missing _atom_site_fract_x".into()))?;
    let y_idx = col("_atom_site_fract_y")
        .ok_or_else(|| Error::MissingAtomInformation("missing _atom_site_fract_y".into()))?;
    let z_idx = col("_atom_site_fract_z")
        .ok_or_else(|| Error::MissingAtomInformation("missing _atom_site_fract_z".into()))?;

    let mut atoms = Vec::with_capacity(rows.len());
    let mut labels = Vec::with_capacity(rows.len());
    for (k, row) in rows.iter().enumerate() {
        let line = first_row + k + 1;
        if row.len() <= x_idx.max(y_idx).max(z_idx) {
            return Err(Error::parse(Format::Cif, line, "truncated atom_site row"));
        }
        let coord = |idx: usize| -> Result<f64, Error> {
            parse_cif_float(&row[idx]).ok_or_else(|| {
                Error::parse(Format::Cif, line, format!("bad coordinate '{}'", row[idx]))
            })
        };
        let label = label_idx
            .and_then(|i| row.get(i))
            .cloned()
            .unwrap_or_else(|| format!("site{}", k + 1));
        let symbol_source = symbol_idx
            .and_then(|i| row.get(i))
            .filter(|s| *s != "." && *s != "?")
            .unwrap_or(&label);
        let element = Element::from_label(symbol_source)
            .map_err(|e| Error::MissingAtomInformation(e.to_string()))?;
        let occupancy = occ_idx
            .and_then(|i| row.get(i))
            .filter(|s| *s != "." && *s != "?")
            .and_then(|s| parse_cif_float(s))
            .filter(|&o| o > 0.0 && o <= 1.0);

        let mut atom = Atom::new(
            element,
            Vector3::new(coord(x_idx)?, coord(y_idx)?, coord(z_idx)?),
        )
        .wrapped();
        atom.occupancy = occupancy;
        atoms.push(atom);
        labels.push(label);
    }
    Ok((atoms, labels))
}

#[allow(clippy::type_complexity)]
fn build_bonds(
    bond_rows: Option<(usize, Vec<String>, Vec<Vec<String>>)>,
) -> Result<Vec<DeclaredBond>, Error> {
    let Some((first_row, headers, rows)) = bond_rows else {
        return Ok(Vec::new());
    };
    let col = |name: &str| headers.iter().position(|h| h == name);
    let a_idx = col("_geom_bond_atom_site_label_1").expect("checked by dispatch");
    let b_idx = col("_geom_bond_atom_site_label_2")
        .ok_or_else(|| Error::parse(Format::Cif, first_row, "geom_bond loop lacks label_2"))?;
    let d_idx = col("_geom_bond_distance");

    let mut bonds = Vec::with_capacity(rows.len());
    for (k, row) in rows.iter().enumerate() {
        let line = first_row + k + 1;
        if row.len() <= a_idx.max(b_idx) {
            return Err(Error::parse(Format::Cif, line, "truncated geom_bond row"));
        }
        bonds.push(DeclaredBond {
            label_a: row[a_idx].clone(),
            label_b: row[b_idx].clone(),
            distance: d_idx
                .and_then(|i| row.get(i))
                .and_then(|s| parse_cif_float(s)),
        });
    }
    Ok(bonds)
}

/// Splits a CIF line into fields, honoring single/double quotes and `#`
/// comments.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '#' {
            break;
        } else if c == '\'' || c == '"' {
            chars.next();
            let mut tok = String::new();
            for d in chars.by_ref() {
                if d == c {
                    break;
                }
                tok.push(d);
            }
            tokens.push(tok);
        } else {
            let mut tok = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_whitespace() {
                    break;
                }
                tok.push(d);
                chars.next();
            }
            tokens.push(tok);
        }
    }
    tokens
}

/// Parses a CIF number, dropping a trailing uncertainty such as
/// `"1.234(5)"`.
fn parse_cif_float(s: &str) -> Option<f64> {
    s.split('(').next().and_then(|t| t.parse().ok())
}

/// Parses one symmetry operator such as `"x,y+1/2,-z"` into an integer
/// rotation and exact rational translation.
fn parse_symop(op: &str, line: usize) -> Result<SymmetryOp, Error> {
    let parts: Vec<&str> = op.split(',').collect();
    if parts.len() != 3 {
        return Err(Error::parse(
            Format::Cif,
            line,
            format!("symmetry operator '{}' does not have three components", op),
        ));
    }
    let mut rot = [[0i32; 3]; 3];
    let mut trans = [Ratio::new(0, 1); 3];
    for (r, part) in parts.iter().enumerate() {
        let (coeffs, t) = parse_symop_component(part).ok_or_else(|| {
            Error::parse(
                Format::Cif,
                line,
                format!("bad symmetry operator component '{}'", part),
            )
        })?;
        rot[r] = coeffs;
        trans[r] = t;
    }
    Ok(SymmetryOp { rot, trans })
}

/// One component like `-x+1/2` or `y-z` or `x+0.25`.
fn parse_symop_component(expr: &str) -> Option<([i32; 3], Ratio<i32>)> {
    let mut coeffs = [0i32; 3];
    let mut trans = Ratio::new(0, 1);
    let bytes: Vec<char> = expr.chars().filter(|c| !c.is_whitespace()).collect();
    let mut i = 0;
    while i < bytes.len() {
        let sign = match bytes[i] {
            '-' => {
                i += 1;
                -1
            }
            '+' => {
                i += 1;
                1
            }
            _ => 1,
        };
        let c = *bytes.get(i)?;
        match c {
            'x' | 'X' => {
                coeffs[0] += sign;
                i += 1;
            }
            'y' | 'Y' => {
                coeffs[1] += sign;
                i += 1;
            }
            'z' | 'Z' => {
                coeffs[2] += sign;
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == '.' || bytes[i] == '/') {
                    i += 1;
                }
                let num: String = bytes[start..i].iter().collect();
                trans += parse_fraction(&num)? * sign;
            }
            _ => return None,
        }
    }
    Some((coeffs, trans))
}

/// `"1/2"`, `"0.25"` or `"1"` as an exact rational; decimals are snapped
/// to twelfths (the only denominators space groups use).
fn parse_fraction(s: &str) -> Option<Ratio<i32>> {
    if let Some((n, d)) = s.split_once('/') {
        let (n, d) = (n.parse::<i32>().ok()?, d.parse::<i32>().ok()?);
        if d == 0 {
            return None;
        }
        return Some(Ratio::new(n, d));
    }
    let v = s.parse::<f64>().ok()?;
    let twelfths = (v * 12.0).round();
    if (v * 12.0 - twelfths).abs() > 1e-3 {
        return None;
    }
    Some(Ratio::new(twelfths as i32, 12))
}
