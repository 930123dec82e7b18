use std::io;

use thiserror::Error;

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Ошибки уровня примитивного ввода-вывода архива.
///
/// После первой ошибки сессия чтения/записи «залипает»: каждый
/// последующий вызов возвращает [`ArchiveError::Failed`], не
/// трогая поток.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("archive operation failed")]
    Failed,
}
