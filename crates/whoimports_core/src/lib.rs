//! Core of the whoimports tool.
//!
//! Given a target file or directory and a list of candidate source files,
//! finds which candidates import the target. Includes:
//! - Line-based extraction of ES6 and CommonJS import specifiers
//! - Specifier resolution through `import_map.json`, tsconfig `paths`,
//!   relative and absolute paths
//! - Matching in file mode and directory mode, optionally in parallel
//! - Collecting candidate files from a project tree

mod collector;
mod config;
mod constants;
mod error;
mod extractor;
mod matcher;
mod reporter;
mod resolver;
mod types;

// Re-export public API
pub use collector::{CollectorConfig, collect_source_files};
pub use config::{
    AliasConfig, AliasMap, PathMapConfig, PathPattern, find_git_root, find_git_root_from,
    load_import_map, load_path_map,
};
pub use constants::{
    IMPORT_MAP_FILE, INDEX_FILES, RESOLVE_EXTENSIONS, SOURCE_EXTENSIONS, TSCONFIG_FILE,
};
pub use error::{Result, ScanError, TargetKind};
pub use extractor::{extract_imports, imports_for};
pub use matcher::{ImportFinder, find_directory_importers, find_importers};
pub use reporter::{CollectingReporter, LogReporter, Reporter, ScanWarning};
pub use resolver::Resolver;
pub use types::{
    DirectoryImporters, FileImporters, ImportGroup, ImportKind, Importer, RawImport,
    ResolvedImport, ScanOutcome,
};
