use thiserror::Error;

use super::ArchiveError;

pub type DictResult<T> = Result<T, DictError>;

/// Ошибки протокола словаря.
///
/// Usage-ошибки (`EmptyKey`, `PlaneEquationLength`) обнаруживаются
/// локально, до какого-либо обращения к потоку.
#[derive(Debug, Error)]
pub enum DictError {
    #[error("Empty entry key")]
    EmptyKey,

    #[error("Plane equation must have exactly 4 coefficients, got {0}")]
    PlaneEquationLength(usize),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
