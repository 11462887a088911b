use dashmap::DashMap;
use log::{debug, info, trace, warn};
use path_clean::PathClean;
use rayon::{ThreadPoolBuilder, prelude::*};
use std::{
    collections::BTreeMap,
    fs,
    path::{Component, Path, PathBuf},
};

use crate::{
    config::{AliasConfig, absolutize},
    error::{Result, ScanError, TargetKind},
    extractor::imports_for,
    reporter::{LogReporter, Reporter, ScanWarning},
    resolver::{Resolver, probe},
    types::{
        DirectoryImporters, FileImporters, ImportGroup, Importer, ResolvedImport, ScanOutcome,
    },
};

/// Finds the files that import a target file or directory.
///
/// The finder owns the scan root and its alias configuration. Candidate files
/// may be absolute or relative to the root; targets may be absolute or
/// relative to the current directory.
pub struct ImportFinder<'r> {
    root: PathBuf,
    aliases: AliasConfig,
    reporter: &'r dyn Reporter,
    concurrency: usize,
}

impl<'r> ImportFinder<'r> {
    /// Creates a finder for `root`, loading `import_map.json` and
    /// `tsconfig.json` from it. Malformed config files are reported and
    /// ignored.
    pub fn new(root: &Path, reporter: &'r dyn Reporter) -> Result<Self> {
        let root = absolutize(root)?;
        info!("Using root directory: {}", root.display());
        let aliases = AliasConfig::load(&root, reporter);
        Ok(Self { root, aliases, reporter, concurrency: 1 })
    }

    /// Creates a finder with an already loaded alias configuration.
    pub fn with_aliases(
        root: &Path,
        aliases: AliasConfig,
        reporter: &'r dyn Reporter,
    ) -> Result<Self> {
        Ok(Self { root: absolutize(root)?, aliases, reporter, concurrency: 1 })
    }

    /// Processes up to `limit` files at a time. `1` (the default) keeps the
    /// scan on the calling thread.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn aliases(&self) -> &AliasConfig {
        &self.aliases
    }

    /// Picks file or directory mode from what `target` is on disk.
    pub fn find<P: AsRef<Path>>(&self, target: &Path, files: &[P]) -> Result<ScanOutcome> {
        let abs = absolutize(target)?;
        if abs.is_dir() {
            self.find_directory_importers(target, files).map(ScanOutcome::Directory)
        } else {
            self.find_importers(target, files).map(ScanOutcome::File)
        }
    }

    /// Every import, in input order, that resolves exactly to the target file.
    pub fn find_importers<P: AsRef<Path>>(
        &self,
        target: &Path,
        files: &[P],
    ) -> Result<FileImporters> {
        let target = normalize_file_target(target)?;
        info!("Finding importers of {}", target.display());

        let candidates = self.candidates(files, |file| file == target);
        let imports = self.scan(&candidates, &|resolved| resolved == target);

        info!("Found {} imports of {}", imports.len(), target.display());
        Ok(FileImporters { target, root: self.root.clone(), imports })
    }

    /// Imports of any file inside the target directory, grouped by the
    /// referenced file.
    pub fn find_directory_importers<P: AsRef<Path>>(
        &self,
        target: &Path,
        files: &[P],
    ) -> Result<DirectoryImporters> {
        let target = normalize_directory_target(target)?;
        info!("Finding importers of files under {}", target.display());

        let candidates = self.candidates(files, |file| file.starts_with(&target));
        // The best-effort relative fallback may name files that do not exist.
        let imports = self.scan(&candidates, &|resolved| {
            resolved != target && resolved.starts_with(&target) && resolved.is_file()
        });

        let groups = group_by_referenced_file(&target, imports);
        info!("Found {} referenced files under {}", groups.len(), target.display());
        Ok(DirectoryImporters { target, root: self.root.clone(), groups })
    }

    /// Absolute candidate paths, minus the ones `is_target` rejects.
    fn candidates<P, F>(&self, files: &[P], is_target: F) -> Vec<PathBuf>
    where
        P: AsRef<Path>,
        F: Fn(&Path) -> bool,
    {
        files
            .iter()
            .map(|f| self.root.join(f.as_ref()).clean())
            .filter(|f| {
                let excluded = is_target(f);
                if excluded {
                    trace!("Excluding target from candidates: {}", f.display());
                }
                !excluded
            })
            .collect()
    }

    fn scan(
        &self,
        candidates: &[PathBuf],
        is_match: &(dyn Fn(&Path) -> bool + Sync),
    ) -> Vec<ResolvedImport> {
        let resolver = Resolver::from_config(&self.aliases);
        debug!("Scanning {} candidate files", candidates.len());

        if self.concurrency > 1 {
            match ThreadPoolBuilder::new().num_threads(self.concurrency).build() {
                Ok(pool) => {
                    // Keyed by input position so the merge is independent of
                    // worker scheduling.
                    let found: DashMap<usize, Vec<ResolvedImport>> = DashMap::new();
                    pool.install(|| {
                        candidates.par_iter().enumerate().for_each(|(idx, file)| {
                            let matches = self.process_file(&resolver, file, is_match);
                            if !matches.is_empty() {
                                found.insert(idx, matches);
                            }
                        });
                    });

                    let mut by_index: Vec<(usize, Vec<ResolvedImport>)> =
                        found.into_iter().collect();
                    by_index.sort_by_key(|(idx, _)| *idx);
                    return by_index.into_iter().flat_map(|(_, matches)| matches).collect();
                }
                Err(e) => {
                    warn!(
                        "Could not start {} worker threads, scanning sequentially: {}",
                        self.concurrency, e
                    );
                }
            }
        }

        candidates.iter().flat_map(|file| self.process_file(&resolver, file, is_match)).collect()
    }

    fn process_file(
        &self,
        resolver: &Resolver,
        file: &Path,
        is_match: &(dyn Fn(&Path) -> bool + Sync),
    ) -> Vec<ResolvedImport> {
        let imports = match imports_for(file) {
            Ok(imports) => imports,
            Err(e) => {
                self.reporter.warn(ScanWarning::FileSkipped {
                    path: file.to_path_buf(),
                    error: e.to_string(),
                });
                return Vec::new();
            }
        };

        imports
            .into_iter()
            .filter(|import| {
                if import.is_dynamic {
                    trace!("Ignoring dynamic import '{}' in {}", import.specifier, file.display());
                }
                !import.is_dynamic
            })
            .filter_map(|import| {
                let resolved = resolver.resolve(file, &import.specifier, self.reporter)?;
                if !is_match(&resolved) {
                    return None;
                }
                debug!(
                    "{}:{} imports '{}' -> {}",
                    file.display(),
                    import.line,
                    import.specifier,
                    resolved.display()
                );
                Some(ResolvedImport {
                    source_file: file.to_path_buf(),
                    import_specifier: import.specifier,
                    resolved_path: resolved,
                    line: import.line,
                })
            })
            .collect()
    }
}

/// Finds importers of a target file, logging warnings through `log`.
pub fn find_importers<T, P, R>(target: T, files: &[P], root: R) -> Result<FileImporters>
where
    T: AsRef<Path>,
    P: AsRef<Path>,
    R: AsRef<Path>,
{
    ImportFinder::new(root.as_ref(), &LogReporter)?.find_importers(target.as_ref(), files)
}

/// Finds importers of files under a target directory, logging warnings
/// through `log`.
pub fn find_directory_importers<T, P, R>(
    target: T,
    files: &[P],
    root: R,
) -> Result<DirectoryImporters>
where
    T: AsRef<Path>,
    P: AsRef<Path>,
    R: AsRef<Path>,
{
    ImportFinder::new(root.as_ref(), &LogReporter)?.find_directory_importers(target.as_ref(), files)
}

fn normalize_file_target(target: &Path) -> Result<PathBuf> {
    let abs = absolutize(target)?;
    match fs::metadata(&abs) {
        Ok(meta) if meta.is_dir() => {
            return Err(ScanError::InvalidTarget { path: abs, expected: TargetKind::File });
        }
        Ok(_) => return Ok(abs),
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            return Err(ScanError::from_io(abs, e));
        }
        Err(_) => {}
    }

    trace!("Target {} does not exist, trying extensions", abs.display());
    match probe(&abs) {
        Ok(Some(found)) => {
            debug!("Target {} resolved to {}", abs.display(), found.display());
            Ok(found)
        }
        Ok(None) => Err(ScanError::NotFound { path: abs }),
        Err(e) => Err(ScanError::from_io(abs, e)),
    }
}

fn normalize_directory_target(target: &Path) -> Result<PathBuf> {
    let abs = absolutize(target)?;
    match fs::metadata(&abs) {
        Ok(meta) if meta.is_dir() => Ok(abs),
        Ok(_) => Err(ScanError::InvalidTarget { path: abs, expected: TargetKind::Directory }),
        Err(e) => Err(ScanError::from_io(abs, e)),
    }
}

fn group_by_referenced_file(dir: &Path, imports: Vec<ResolvedImport>) -> Vec<ImportGroup> {
    let mut groups: BTreeMap<String, Vec<Importer>> = BTreeMap::new();
    for import in imports {
        let Ok(rel) = import.resolved_path.strip_prefix(dir) else {
            continue;
        };
        groups.entry(slash_path(rel)).or_default().push(Importer {
            source_file: import.source_file,
            import_specifier: import.import_specifier,
            line: import.line,
        });
    }

    groups
        .into_iter()
        .map(|(referenced_path, mut importers)| {
            importers.sort_by(|a, b| {
                a.source_file
                    .as_os_str()
                    .cmp(b.source_file.as_os_str())
                    .then(a.line.cmp(&b.line))
            });
            ImportGroup { referenced_path, importers }
        })
        .collect()
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
