use std::{io, path::PathBuf};

/// Errors surfaced by the import scanner.
///
/// Only errors about the target itself (or an explicitly loaded config file)
/// reach callers. Problems with individual candidate files are turned into
/// [`ScanWarning`](crate::ScanWarning)s instead.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{} is not a {expected}", path.display())]
    InvalidTarget { path: PathBuf, expected: TargetKind },
}

impl ScanError {
    /// Maps an I/O error for `path` onto `NotFound` or `Read`.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            ScanError::NotFound { path }
        } else {
            ScanError::Read { path, source }
        }
    }
}

/// Which shape of target a matching call expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    File,
    Directory,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::File => f.write_str("file"),
            TargetKind::Directory => f.write_str("directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
