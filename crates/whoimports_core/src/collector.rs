use anyhow::{Context, Result};
use ignore::{WalkBuilder, overrides::OverrideBuilder};
use log::{debug, trace, warn};
use std::{collections::HashSet, path::PathBuf};

use crate::constants::{DEFAULT_IGNORED_DIRS, SOURCE_EXTENSIONS};

pub struct CollectorConfig {
    pub root: PathBuf,
    /// Gitignore-style globs for paths to leave out
    pub ignore_patterns: Vec<String>,
    pub max_depth: Option<usize>,
}

impl CollectorConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ignore_patterns: Vec::new(), max_depth: None }
    }
}

/// Lists the source files under the root, in sorted walk order.
///
/// Symlinks are followed; the walker reports loops as errors, which are
/// logged and skipped. A file reachable through several links is listed once.
pub fn collect_source_files(cfg: &CollectorConfig) -> Result<Vec<PathBuf>> {
    debug!("Collecting source files");
    let root = &cfg.root;

    let mut overrides = OverrideBuilder::new(root);
    for pattern in &cfg.ignore_patterns {
        overrides
            .add(&format!("!{}", pattern))
            .with_context(|| format!("Invalid ignore pattern '{}'", pattern))?;
    }
    let overrides = overrides.build().context("Failed to build ignore patterns")?;

    debug!("Walking directory tree from root: {}", root.display());
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(true)
        .git_ignore(true)
        .follow_links(true)
        .max_depth(cfg.max_depth)
        .overrides(overrides)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|dent| {
            let is_dir = dent.file_type().is_some_and(|t| t.is_dir());
            let skip = is_dir
                && dent.file_name().to_str().is_some_and(|n| DEFAULT_IGNORED_DIRS.contains(&n));
            if skip {
                trace!("Skipping directory: {}", dent.path().display());
            }
            !skip
        })
        .build();

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files: Vec<PathBuf> = Vec::new();

    for res in walker {
        let dent = match res {
            Ok(dent) => dent,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let p = dent.path();
        if !p.is_file() {
            continue;
        }

        let Some(ext) = p.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !SOURCE_EXTENSIONS.contains(&ext) {
            continue;
        }

        let identity = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
        if !seen.insert(identity) {
            trace!("Skipping duplicate of an already collected file: {}", p.display());
            continue;
        }

        trace!("Found source file: {}", p.display());
        files.push(p.to_path_buf());
    }

    debug!("Collected {} source files", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn relative_names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_collects_source_extensions_only() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/a.ts", "");
        create_test_file(root, "src/b.jsx", "");
        create_test_file(root, "src/c.mts", "");
        create_test_file(root, "README.md", "");
        create_test_file(root, "src/styles.css", "");

        let files = collect_source_files(&CollectorConfig::new(root)).unwrap();
        assert_eq!(relative_names(root, &files), vec!["src/a.ts", "src/b.jsx", "src/c.mts"]);
    }

    #[test]
    fn test_skips_default_ignored_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "index.js", "");
        create_test_file(root, "node_modules/react/index.js", "");
        create_test_file(root, "dist/bundle.js", "");

        let files = collect_source_files(&CollectorConfig::new(root)).unwrap();
        assert_eq!(relative_names(root, &files), vec!["index.js"]);
    }

    #[test]
    fn test_ignore_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/a.ts", "");
        create_test_file(root, "src/a.test.ts", "");
        create_test_file(root, "generated/schema.ts", "");

        let cfg = CollectorConfig {
            root: root.to_path_buf(),
            ignore_patterns: vec!["*.test.ts".to_string(), "generated/".to_string()],
            max_depth: None,
        };
        let files = collect_source_files(&cfg).unwrap();
        assert_eq!(relative_names(root, &files), vec!["src/a.ts"]);
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = CollectorConfig {
            root: temp_dir.path().to_path_buf(),
            ignore_patterns: vec!["src/[".to_string()],
            max_depth: None,
        };
        assert!(collect_source_files(&cfg).is_err());
    }

    #[test]
    fn test_max_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "top.ts", "");
        create_test_file(root, "a/b/deep.ts", "");

        let cfg = CollectorConfig { max_depth: Some(1), ..CollectorConfig::new(root) };
        let files = collect_source_files(&cfg).unwrap();
        assert_eq!(relative_names(root, &files), vec!["top.ts"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_listed_once() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "real/a.ts", "");
        std::os::unix::fs::symlink(root.join("real"), root.join("zlink")).unwrap();
        std::os::unix::fs::symlink(root, root.join("real/loop")).unwrap();

        let files = collect_source_files(&CollectorConfig::new(root)).unwrap();
        assert_eq!(relative_names(root, &files), vec!["real/a.ts"]);
    }
}
