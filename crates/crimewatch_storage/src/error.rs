#![forbid(unsafe_code)]

use std::path::PathBuf;

use crimewatch_kernel_contracts::ContractViolation;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("store '{}' unavailable: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store '{}' could not be encoded: {source}", .path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    ContractViolation(#[from] ContractViolation),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Unavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        let path = path.into();
        if !source.is_io_error() {
            return StorageError::Encoding { path, source };
        }
        let io = match source.into_kind() {
            csv::ErrorKind::Io(io) => io,
            _ => std::io::Error::other("csv i/o failure"),
        };
        StorageError::Unavailable { path, source: io }
    }
}
