use log::{debug, trace};
use path_clean::PathClean;
use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    config::{AliasConfig, AliasMap, PathMapConfig},
    constants::{INDEX_FILES, RESOLVE_EXTENSIONS, SOURCE_EXTENSIONS},
    reporter::{Reporter, ScanWarning},
};

/// Maps import specifiers onto files.
///
/// Strategies are tried in a fixed order and the first one that produces a
/// path wins:
///
/// 1. import map, exact key
/// 2. import map, first key (in declaration order) that prefixes the specifier
/// 3. tsconfig `paths`, first matching pattern
/// 4. relative specifiers (`./`, `../`)
/// 5. absolute specifiers (`/`)
///
/// Anything else is a bare package specifier and stays unresolved. Strategies
/// 1-3 fall through when the mapped path does not exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver<'a> {
    import_map: Option<&'a AliasMap>,
    path_map: Option<&'a PathMapConfig>,
}

impl<'a> Resolver<'a> {
    pub fn new(import_map: Option<&'a AliasMap>, path_map: Option<&'a PathMapConfig>) -> Self {
        Self { import_map, path_map }
    }

    pub fn from_config(config: &'a AliasConfig) -> Self {
        Self::new(config.import_map.as_ref(), config.path_map.as_ref())
    }

    /// Resolves `specifier` as written in `from_file`.
    ///
    /// File-system errors are reported to `reporter` and leave the specifier
    /// unresolved.
    pub fn resolve(
        &self,
        from_file: &Path,
        specifier: &str,
        reporter: &dyn Reporter,
    ) -> Option<PathBuf> {
        match self.try_resolve(from_file, specifier) {
            Ok(resolved) => resolved,
            Err(e) => {
                reporter.warn(ScanWarning::ResolutionFailed {
                    from_file: from_file.to_path_buf(),
                    specifier: specifier.to_string(),
                    error: e.to_string(),
                });
                None
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but hands file-system errors back.
    ///
    /// A relative specifier that matches nothing on disk still resolves to its
    /// normalized, un-suffixed path. Callers must check existence before
    /// trusting such a result.
    pub fn try_resolve(&self, from_file: &Path, specifier: &str) -> io::Result<Option<PathBuf>> {
        trace!("Resolving: '{}' from {}", specifier, from_file.display());
        let dir = from_file.parent().unwrap_or(from_file);

        if let Some(map) = self.import_map {
            if let Some(replacement) = map.exact(from_file, specifier) {
                trace!("Import map entry '{}' -> '{}'", specifier, replacement);
                if let Some(found) = probe(&dir.join(replacement).clean())? {
                    debug!("Resolved '{}' via import map to {}", specifier, found.display());
                    return Ok(Some(found));
                }
                trace!("Import map target for '{}' does not exist", specifier);
            }

            if let Some((key, replaced)) = map.prefix(from_file, specifier) {
                trace!("Import map prefix '{}' matched '{}'", key, specifier);
                if let Some(found) = probe(&dir.join(replaced).clean())? {
                    debug!("Resolved '{}' via import map prefix to {}", specifier, found.display());
                    return Ok(Some(found));
                }
                trace!("Import map prefix target for '{}' does not exist", specifier);
            }
        }

        if let Some(path_map) = self.path_map
            && let Some(mapped) = path_map.lookup(specifier)
        {
            let candidate = dir.join(&path_map.base_dir).join(mapped).clean();
            if let Some(found) = probe(&candidate)? {
                debug!("Resolved '{}' via tsconfig paths to {}", specifier, found.display());
                return Ok(Some(found));
            }
            trace!("tsconfig paths target {} does not exist", candidate.display());
        }

        if is_relative(specifier) {
            let resolved = dir.join(specifier).clean();
            return match probe(&resolved)? {
                Some(found) => {
                    trace!("Resolved relative import '{}' to {}", specifier, found.display());
                    Ok(Some(found))
                }
                None => {
                    trace!("Nothing on disk for '{}', keeping {}", specifier, resolved.display());
                    Ok(Some(resolved))
                }
            };
        }

        if specifier.starts_with('/') {
            let found = probe(&Path::new(specifier).clean())?;
            if found.is_none() {
                trace!("Failed to resolve absolute import '{}'", specifier);
            }
            return Ok(found);
        }

        trace!("Leaving bare specifier '{}' unresolved", specifier);
        Ok(None)
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
}

/// Finds the file `path` refers to: the path itself, then the path with each
/// resolvable extension, then an index file inside it.
pub(crate) fn probe(path: &Path) -> io::Result<Option<PathBuf>> {
    if metadata(path)?.is_some_and(|m| m.is_file()) {
        return Ok(Some(path.to_path_buf()));
    }

    let base = strip_source_extension(path);
    for ext in RESOLVE_EXTENSIONS {
        let candidate = with_appended_extension(&base, ext);
        if metadata(&candidate)?.is_some_and(|m| m.is_file()) {
            return Ok(Some(candidate));
        }
    }

    if metadata(path)?.is_some_and(|m| m.is_dir()) {
        for index_file in INDEX_FILES {
            let candidate = path.join(index_file);
            if metadata(&candidate)?.is_some_and(|m| m.is_file()) {
                return Ok(Some(candidate));
            }
        }
    }

    Ok(None)
}

/// `Ok(None)` when nothing exists at `path`.
fn metadata(path: &Path) -> io::Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(m) => Ok(Some(m)),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// `a/button.js` -> `a/button`; `a/user.service` is left alone.
fn strip_source_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if SOURCE_EXTENSIONS.contains(&ext) => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

fn with_appended_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s: OsString = base.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
