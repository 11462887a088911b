use indexmap::IndexSet;
use std::path::PathBuf;

/// Syntax family an import was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Es6,
    CommonJs,
}

/// One import statement as it appears in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    pub kind: ImportKind,
    pub specifier: String,
    pub is_dynamic: bool,
    /// 1-based line of the statement (the opening line for multi-line imports)
    pub line: usize,
}

/// An import of a candidate file that resolved onto the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    pub source_file: PathBuf,
    pub import_specifier: String,
    pub resolved_path: PathBuf,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Importer {
    pub source_file: PathBuf,
    pub import_specifier: String,
    pub line: usize,
}

/// All importers of one file inside a target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportGroup {
    /// Path of the referenced file relative to the target directory, `/`-separated
    pub referenced_path: String,
    pub importers: Vec<Importer>,
}

/// Result of a file-target scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileImporters {
    pub target: PathBuf,
    pub root: PathBuf,
    /// In input-file order
    pub imports: Vec<ResolvedImport>,
}

impl FileImporters {
    /// Distinct importing files, in the order they were first seen.
    pub fn importers(&self) -> Vec<&PathBuf> {
        self.distinct_sources().into_iter().collect()
    }

    pub fn count(&self) -> usize {
        self.distinct_sources().len()
    }

    fn distinct_sources(&self) -> IndexSet<&PathBuf> {
        self.imports.iter().map(|import| &import.source_file).collect()
    }
}

/// Result of a directory-target scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryImporters {
    pub target: PathBuf,
    pub root: PathBuf,
    /// Sorted by referenced path; importers sorted by source path
    pub groups: Vec<ImportGroup>,
}

impl DirectoryImporters {
    /// Number of distinct files importing anything inside the target.
    pub fn count(&self) -> usize {
        let mut files: Vec<&PathBuf> =
            self.groups.iter().flat_map(|g| g.importers.iter().map(|i| &i.source_file)).collect();
        files.sort();
        files.dedup();
        files.len()
    }
}

/// Outcome of a scan whose mode was picked from the target's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    File(FileImporters),
    Directory(DirectoryImporters),
}
