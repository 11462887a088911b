use log::warn;
use std::{
    fmt,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

/// A recoverable problem encountered during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWarning {
    /// A candidate file could not be read and was left out of the results
    FileSkipped { path: PathBuf, error: String },
    /// Probing the file system for a specifier failed; the specifier is unresolved
    ResolutionFailed { from_file: PathBuf, specifier: String, error: String },
    /// An alias config file was malformed and the scan proceeds without it
    ConfigIgnored { path: PathBuf, error: String },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::FileSkipped { path, error } => {
                write!(f, "skipping {}: {}", path.display(), error)
            }
            ScanWarning::ResolutionFailed { from_file, specifier, error } => {
                let from = from_file.display();
                write!(f, "could not resolve '{}' from {}: {}", specifier, from, error)
            }
            ScanWarning::ConfigIgnored { path, error } => {
                write!(f, "ignoring {}: {}", path.display(), error)
            }
        }
    }
}

/// Sink for scan warnings.
///
/// The matcher may call `warn` from several worker threads at once.
pub trait Reporter: Send + Sync {
    fn warn(&self, warning: ScanWarning);
}

/// Forwards every warning to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn warn(&self, warning: ScanWarning) {
        warn!("{}", warning);
    }
}

/// Keeps warnings in memory so callers can inspect them after a scan.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    warnings: Mutex<Vec<ScanWarning>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<ScanWarning> {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
    }
}

impl Reporter for CollectingReporter {
    fn warn(&self, warning: ScanWarning) {
        warn!("{}", warning);
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner).push(warning);
    }
}
