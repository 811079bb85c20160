use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("the structure is not periodic: cycle offsets span a rank-0 lattice")]
    NonPeriodic,

    #[error("canonicalization interrupted by cancellation")]
    Interrupted,
}
