use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("the structure contains no atoms")]
    EmptyStructure,

    #[error("bonding mode requires input bonds, but none were specified")]
    BondingUnavailable,

    #[error("clustering requires residue labels, but atom {index} ('{label}') has none")]
    ResidueAssignment { index: usize, label: String },

    #[error(transparent)]
    Io(#[from] crate::io::Error),
}
