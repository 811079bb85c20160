use std::fmt;
use std::str::FromStr;

use crate::model::types::Element;

/// How the input structure should be interpreted. Types differ only in
/// the sanitation defaults they select; clustering into building units
/// happens upstream of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StructureType {
    #[default]
    Auto,
    Mof,
    Cluster,
    Zeolite,
    Guess,
    Atom,
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StructureType::Auto => "auto",
            StructureType::Mof => "mof",
            StructureType::Cluster => "cluster",
            StructureType::Zeolite => "zeolite",
            StructureType::Guess => "guess",
            StructureType::Atom => "atom",
        };
        f.write_str(s)
    }
}

impl FromStr for StructureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "mof" => Ok(Self::Mof),
            "cluster" => Ok(Self::Cluster),
            "zeolite" => Ok(Self::Zeolite),
            "guess" => Ok(Self::Guess),
            "atom" => Ok(Self::Atom),
            other => Err(format!("unknown structure type '{}'", other)),
        }
    }
}

/// Where the candidate edge set comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BondingMode {
    /// Input bonds when present, guessed bonds otherwise; guessing also
    /// replaces input bonds that fail the sanity check.
    #[default]
    Auto,
    /// Only bonds declared in the input.
    Input,
    /// Always guess from geometry.
    Guess,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub structure: StructureType,
    pub bonding: BondingMode,
    /// Coefficient c₀ in the `d < c₀·(rᵢ + rⱼ)` bond criterion.
    pub cutoff_coefficient: f64,
    /// Multiply metal radii by 1.5 during bond guessing.
    pub widen_metal_radii: bool,
    /// Elements whose homoatomic bonds are dropped after sanitation.
    pub homoatomic_targets: Vec<Element>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            structure: StructureType::Auto,
            bonding: BondingMode::Auto,
            cutoff_coefficient: 0.75,
            widen_metal_radii: false,
            homoatomic_targets: Vec::new(),
        }
    }
}

impl Options {
    /// The sanitation defaults each structure type selects.
    pub fn for_structure(structure: StructureType) -> Self {
        let base = Self {
            structure,
            ..Self::default()
        };
        match structure {
            StructureType::Mof => Self {
                widen_metal_radii: true,
                ..base
            },
            StructureType::Zeolite => Self {
                homoatomic_targets: vec![Element::O],
                ..base
            },
            StructureType::Guess => Self {
                bonding: BondingMode::Guess,
                ..base
            },
            _ => base,
        }
    }

    /// MOF mode widens the valence caps for O, C and N.
    pub fn mof_valences(&self) -> bool {
        self.structure == StructureType::Mof
    }
}

/// Per-element degree bounds consulted by valence fixing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValenceRule {
    pub min: usize,
    pub max: usize,
}

pub fn valence_rule(element: Element, mof: bool) -> Option<ValenceRule> {
    match element {
        Element::H => Some(ValenceRule { min: 1, max: 1 }),
        Element::O => Some(ValenceRule {
            min: 1,
            max: if mof { 4 } else { 2 },
        }),
        Element::C | Element::N => Some(ValenceRule {
            min: 2,
            max: if mof { 5 } else { 4 },
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_type_round_trips_through_strings() {
        for t in [
            StructureType::Auto,
            StructureType::Mof,
            StructureType::Cluster,
            StructureType::Zeolite,
            StructureType::Guess,
            StructureType::Atom,
        ] {
            assert_eq!(t.to_string().parse::<StructureType>().unwrap(), t);
        }
        assert!("nope".parse::<StructureType>().is_err());
    }

    #[test]
    fn structure_defaults() {
        assert!(Options::for_structure(StructureType::Mof).widen_metal_radii);
        assert_eq!(
            Options::for_structure(StructureType::Zeolite).homoatomic_targets,
            vec![Element::O]
        );
        assert_eq!(
            Options::for_structure(StructureType::Guess).bonding,
            BondingMode::Guess
        );
        assert!(!Options::for_structure(StructureType::Auto).widen_metal_radii);
    }

    #[test]
    fn valence_table_widens_in_mof_mode() {
        assert_eq!(valence_rule(Element::O, false).unwrap().max, 2);
        assert_eq!(valence_rule(Element::O, true).unwrap().max, 4);
        assert_eq!(valence_rule(Element::C, false).unwrap().max, 4);
        assert_eq!(valence_rule(Element::N, true).unwrap().max, 5);
        assert_eq!(valence_rule(Element::H, true).unwrap().max, 1);
        assert!(valence_rule(Element::Fe, false).is_none());
    }
}
