use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid or unsupported element symbol: '{0}'")]
pub struct ParseElementError(pub(crate) String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Element {
    H = 1,
    He,
    Li,
    Be,
    B,
    C,
    N,
    O,
    F,
    Ne,
    Na,
    Mg,
    Al,
    Si,
    P,
    S,
    Cl,
    Ar,
    K,
    Ca,
    Sc,
    Ti,
    V,
    Cr,
    Mn,
    Fe,
    Co,
    Ni,
    Cu,
    Zn,
    Ga,
    Ge,
    As,
    Se,
    Br,
    Kr,
    Rb,
    Sr,
    Y,
    Zr,
    Nb,
    Mo,
    Tc,
    Ru,
    Rh,
    Pd,
    Ag,
    Cd,
    In,
    Sn,
    Sb,
    Te,
    I,
    Xe,
    Cs,
    Ba,
    La,
    Ce,
    Pr,
    Nd,
    Pm,
    Sm,
    Eu,
    Gd,
    Tb,
    Dy,
    Ho,
    Er,
    Tm,
    Yb,
    Lu,
    Hf,
    Ta,
    W,
    Re,
    Os,
    Ir,
    Pt,
    Au,
    Hg,
    Tl,
    Pb,
    Bi,
    Po,
    At,
    Rn,
    Fr,
    Ra,
    Ac,
    Th,
    Pa,
    U,
    Np,
    Pu,
    Am,
    Cm,
    Bk,
    Cf,
    Es,
    Fm,
    Md,
    No,
    Lr,
    Rf,
    Db,
    Sg,
    Bh,
    Hs,
    Mt,
    Ds,
    Rg,
    Cn,
    Nh,
    Fl,
    Mc,
    Lv,
    Ts,
    Og = 118,
}

/// Element symbols indexed by atomic number − 1.
#[rustfmt::skip]
const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

#[rustfmt::skip]
const ALL: [Element; 118] = [
    Element::H, Element::He, Element::Li, Element::Be, Element::B,
    Element::C, Element::N, Element::O, Element::F, Element::Ne,
    Element::Na, Element::Mg, Element::Al, Element::Si, Element::P,
    Element::S, Element::Cl, Element::Ar, Element::K, Element::Ca,
    Element::Sc, Element::Ti, Element::V, Element::Cr, Element::Mn,
    Element::Fe, Element::Co, Element::Ni, Element::Cu, Element::Zn,
    Element::Ga, Element::Ge, Element::As, Element::Se, Element::Br,
    Element::Kr, Element::Rb, Element::Sr, Element::Y, Element::Zr,
    Element::Nb, Element::Mo, Element::Tc, Element::Ru, Element::Rh,
    Element::Pd, Element::Ag, Element::Cd, Element::In, Element::Sn,
    Element::Sb, Element::Te, Element::I, Element::Xe, Element::Cs,
    Element::Ba, Element::La, Element::Ce, Element::Pr, Element::Nd,
    Element::Pm, Element::Sm, Element::Eu, Element::Gd, Element::Tb,
    Element::Dy, Element::Ho, Element::Er, Element::Tm, Element::Yb,
    Element::Lu, Element::Hf, Element::Ta, Element::W, Element::Re,
    Element::Os, Element::Ir, Element::Pt, Element::Au, Element::Hg,
    Element::Tl, Element::Pb, Element::Bi, Element::Po, Element::At,
    Element::Rn, Element::Fr, Element::Ra, Element::Ac, Element::Th,
    Element::Pa, Element::U, Element::Np, Element::Pu, Element::Am,
    Element::Cm, Element::Bk, Element::Cf, Element::Es, Element::Fm,
    Element::Md, Element::No, Element::Lr, Element::Rf, Element::Db,
    Element::Sg, Element::Bh, Element::Hs, Element::Mt, Element::Ds,
    Element::Rg, Element::Cn, Element::Nh, Element::Fl, Element::Mc,
    Element::Lv, Element::Ts, Element::Og,
];

/// Van der Waals radii in Å, indexed by atomic number − 1.
///
/// Values after Alvarez (2013) for Z ≤ 96; heavier elements fall back to
/// a 2.45 Å actinide tail or 2.0 Å for superheavies, which only matters
/// for bond guessing on exotic inputs.
#[rustfmt::skip]
const VDW_RADII: [f64; 118] = [
    1.20, 1.43, 2.12, 1.98, 1.91, 1.77, 1.66, 1.50, 1.46, 1.58,
    2.50, 2.51, 2.25, 2.19, 1.90, 1.89, 1.82, 1.83, 2.73, 2.62,
    2.58, 2.46, 2.42, 2.45, 2.45, 2.44, 2.40, 2.40, 2.38, 2.39,
    2.32, 2.29, 1.88, 1.82, 1.86, 2.25, 3.21, 2.84, 2.75, 2.52,
    2.56, 2.45, 2.44, 2.46, 2.44, 2.15, 2.53, 2.49, 2.43, 2.42,
    2.47, 1.99, 2.04, 2.06, 3.48, 3.03, 2.98, 2.88, 2.92, 2.95,
    2.92, 2.90, 2.87, 2.83, 2.79, 2.87, 2.81, 2.83, 2.79, 2.80,
    2.74, 2.63, 2.53, 2.57, 2.49, 2.48, 2.41, 2.29, 2.32, 2.45,
    2.47, 2.60, 2.54, 2.50, 2.50, 2.50, 3.50, 3.00, 2.80, 2.93,
    2.88, 2.71, 2.82, 2.81, 2.83, 3.05, 2.45, 2.45, 2.45, 2.45,
    2.45, 2.45, 2.45, 2.00, 2.00, 2.00, 2.00, 2.00, 2.00, 2.00,
    2.00, 2.00, 2.00, 2.00, 2.00, 2.00, 2.00, 2.00,
];

impl Element {
    #[inline]
    pub fn atomic_number(&self) -> u8 {
        *self as u8
    }

    #[inline]
    pub fn symbol(&self) -> &'static str {
        SYMBOLS[*self as usize - 1]
    }

    /// Van der Waals radius in Å, used by geometric bond guessing.
    #[inline]
    pub fn vdw_radius(&self) -> f64 {
        VDW_RADII[*self as usize - 1]
    }

    /// Whether the element counts as metallic for bond guessing
    /// (alkali, alkaline-earth, transition, post-transition, lanthanide,
    /// actinide). Metalloids (B, Si, Ge, As, Sb, Te) count as non-metals.
    pub fn is_metal(&self) -> bool {
        use Element::*;
        !matches!(
            self,
            H | He
                | B | C | N | O | F | Ne
                | Si | P | S | Cl | Ar
                | Ge | As | Se | Br | Kr
                | Sb | Te | I | Xe
                | At | Rn
                | Ts | Og
        )
    }

    /// Parses an element from a CIF site label such as `"Cu1"`, `"O_w2"`
    /// or `"Zn2+"`: leading alphabetic characters are extracted and the
    /// longest matching symbol (two letters before one) wins.
    pub fn from_label(label: &str) -> Result<Self, ParseElementError> {
        let head: String = label
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if head.is_empty() {
            return Err(ParseElementError(label.to_string()));
        }
        fn normalized(s: &str) -> String {
            let mut chars = s.chars();
            let first = chars.next().unwrap().to_ascii_uppercase();
            chars.fold(first.to_string(), |mut acc, c| {
                acc.push(c.to_ascii_lowercase());
                acc
            })
        }
        if head.len() >= 2 {
            if let Ok(el) = normalized(&head[..2]).parse() {
                return Ok(el);
            }
        }
        normalized(&head[..1])
            .parse()
            .map_err(|_| ParseElementError(label.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SYMBOLS
            .iter()
            .position(|&sym| sym == s)
            .map(|i| ALL[i])
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn element_from_str_valid() {
        assert_eq!(Element::from_str("H").unwrap(), Element::H);
        assert_eq!(Element::from_str("Fe").unwrap(), Element::Fe);
        assert_eq!(Element::from_str("Og").unwrap(), Element::Og);
    }

    #[test]
    fn element_from_str_rejects_lowercase() {
        let err = Element::from_str("h").unwrap_err();
        assert_eq!(
            format!("{}", err),
            "invalid or unsupported element symbol: 'h'"
        );
    }

    #[test]
    fn symbol_display_and_atomic_number() {
        assert_eq!(Element::Na.symbol(), "Na");
        assert_eq!(Element::Na.to_string(), "Na");
        assert_eq!(Element::Na.atomic_number(), 11u8);
        assert_eq!(Element::Og.atomic_number(), 118u8);
    }

    #[test]
    fn vdw_radii_sane() {
        assert!((Element::H.vdw_radius() - 1.20).abs() < 1e-9);
        assert!((Element::C.vdw_radius() - 1.77).abs() < 1e-9);
        assert!(Element::Cs.vdw_radius() > Element::Li.vdw_radius());
        for el in super::ALL {
            assert!(el.vdw_radius() > 1.0 && el.vdw_radius() < 4.0);
        }
    }

    #[test]
    fn metal_classification() {
        assert!(Element::Fe.is_metal());
        assert!(Element::Zn.is_metal());
        assert!(Element::Cs.is_metal());
        assert!(Element::U.is_metal());
        assert!(!Element::C.is_metal());
        assert!(!Element::Si.is_metal());
        assert!(!Element::H.is_metal());
        assert!(!Element::Se.is_metal());
    }

    #[test]
    fn from_label_strips_decorations() {
        assert_eq!(Element::from_label("Cu1").unwrap(), Element::Cu);
        assert_eq!(Element::from_label("O_w2").unwrap(), Element::O);
        assert_eq!(Element::from_label("Zn2+").unwrap(), Element::Zn);
        assert_eq!(Element::from_label("C12").unwrap(), Element::C);
        assert_eq!(Element::from_label("ca").unwrap(), Element::Ca);
        assert!(Element::from_label("123").is_err());
        assert!(Element::from_label("Xx").is_err());
    }

    #[test]
    fn from_label_prefers_two_letter_match() {
        assert_eq!(Element::from_label("Ho1").unwrap(), Element::Ho);
        assert_eq!(Element::from_label("N2").unwrap(), Element::N);
    }
}
