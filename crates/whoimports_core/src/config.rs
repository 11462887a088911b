//! Alias configuration: import maps and tsconfig path mappings.
//!
//! Both files are looked up directly under the scan root, never recursively
//! and never in parent directories. Loading distinguishes three outcomes:
//! the file is absent (`Ok(None)`), the file is valid (`Ok(Some(..))`, possibly
//! empty), or the file is malformed (`Err(ScanError::ParseConfig)`).

use anyhow::{Result as AnyResult, anyhow};
use indexmap::IndexMap;
use log::{debug, trace};
use path_clean::PathClean;
use serde::Deserialize;
use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use crate::{
    constants::{IMPORT_MAP_FILE, TSCONFIG_FILE},
    error::{Result, ScanError},
    reporter::{Reporter, ScanWarning},
};

/// Walks up from the current directory looking for a `.git` directory.
pub fn find_git_root() -> AnyResult<PathBuf> {
    find_git_root_from(&env::current_dir()?)
}

pub fn find_git_root_from(start: &Path) -> AnyResult<PathBuf> {
    debug!("Searching for git root");
    let mut current_dir = start.to_path_buf();
    trace!("Starting search from: {:?}", current_dir);

    loop {
        let git_dir = current_dir.join(".git");
        trace!("Checking for .git at: {:?}", git_dir);
        if git_dir.exists() {
            debug!("Found git root at: {:?}", current_dir);
            return Ok(current_dir);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                debug!("Could not find .git directory in any parent folder");
                return Err(anyhow!("Could not find .git directory in any parent folder"));
            }
        }
    }
}

/// An import map: specifiers (or specifier prefixes) mapped to paths.
///
/// Keys keep their declaration order, which is also the order prefix matching
/// tries them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    imports: IndexMap<String, String>,
    /// Most specific scope first
    scopes: Vec<Scope>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scope {
    dir: PathBuf,
    imports: IndexMap<String, String>,
}

impl AliasMap {
    pub fn new<I, K, V>(imports: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            imports: imports.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            scopes: Vec::new(),
        }
    }

    /// Adds mappings that only apply to importers located under `dir`.
    pub fn with_scope<I, K, V>(mut self, dir: impl Into<PathBuf>, imports: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.scopes.push(Scope {
            dir: dir.into(),
            imports: imports.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        });
        // Stable sort keeps declaration order among equally deep scopes.
        self.scopes.sort_by_key(|s| std::cmp::Reverse(s.dir.components().count()));
        self
    }

    pub fn len(&self) -> usize {
        self.imports.len() + self.scopes.iter().map(|s| s.imports.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn maps_for<'a>(
        &'a self,
        importer: &Path,
    ) -> impl Iterator<Item = &'a IndexMap<String, String>> {
        self.scopes
            .iter()
            .filter(move |s| importer.starts_with(&s.dir))
            .map(|s| &s.imports)
            .chain(std::iter::once(&self.imports))
    }

    /// Replacement for a specifier that appears verbatim as a key.
    pub(crate) fn exact(&self, importer: &Path, specifier: &str) -> Option<&str> {
        self.maps_for(importer).find_map(|m| m.get(specifier)).map(String::as_str)
    }

    /// Replacement with the unmatched suffix appended, for the first key that
    /// is a strict prefix of the specifier.
    pub(crate) fn prefix(&self, importer: &Path, specifier: &str) -> Option<(&str, String)> {
        self.maps_for(importer).find_map(|m| {
            m.iter().find_map(|(key, replacement)| {
                let rest = specifier.strip_prefix(key.as_str())?;
                if rest.is_empty() {
                    return None;
                }
                Some((key.as_str(), format!("{}{}", replacement, rest)))
            })
        })
    }
}

/// One `paths` entry from tsconfig, e.g. `"@components/*": ["src/components/*"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    pub pattern: String,
    pub templates: Vec<String>,
}

impl PathPattern {
    /// The span of `specifier` covered by the pattern's wildcard, or `""` for
    /// an exact (wildcard-free) pattern.
    fn capture<'s>(&self, specifier: &'s str) -> Option<&'s str> {
        match self.pattern.split_once('*') {
            None => (self.pattern == specifier).then_some(""),
            Some((prefix, suffix)) => {
                if specifier.len() < prefix.len() + suffix.len() {
                    return None;
                }
                specifier.strip_prefix(prefix)?.strip_suffix(suffix)
            }
        }
    }
}

/// Path mappings from tsconfig `compilerOptions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapConfig {
    /// Absolute directory templates are resolved against
    pub base_dir: PathBuf,
    pub patterns: Vec<PathPattern>,
}

impl PathMapConfig {
    pub fn new<I, K>(base_dir: impl Into<PathBuf>, patterns: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: Into<String>,
    {
        Self {
            base_dir: base_dir.into(),
            patterns: patterns
                .into_iter()
                .map(|(pattern, templates)| PathPattern { pattern: pattern.into(), templates })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Substitutes the specifier into the first template of the first
    /// matching pattern.
    pub(crate) fn lookup(&self, specifier: &str) -> Option<String> {
        let (pattern, capture) =
            self.patterns.iter().find_map(|p| p.capture(specifier).map(|c| (p, c)))?;
        trace!("Specifier '{}' matched path pattern '{}'", specifier, pattern.pattern);
        let template = pattern.templates.first()?;
        Some(template.replacen('*', capture, 1))
    }
}

/// Both alias sources for one scan root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasConfig {
    pub import_map: Option<AliasMap>,
    pub path_map: Option<PathMapConfig>,
}

impl AliasConfig {
    /// Loads both files, reporting malformed ones and carrying on without them.
    pub fn load(root: &Path, reporter: &dyn Reporter) -> Self {
        let import_map = load_import_map(root).unwrap_or_else(|e| {
            report_ignored(reporter, e);
            None
        });
        let path_map = load_path_map(root).unwrap_or_else(|e| {
            report_ignored(reporter, e);
            None
        });
        Self { import_map, path_map }
    }
}

fn report_ignored(reporter: &dyn Reporter, err: ScanError) {
    let path = match &err {
        ScanError::NotFound { path }
        | ScanError::Read { path, .. }
        | ScanError::ParseConfig { path, .. }
        | ScanError::InvalidTarget { path, .. } => path.clone(),
    };
    reporter.warn(ScanWarning::ConfigIgnored { path, error: err.to_string() });
}

#[derive(Debug, Deserialize)]
struct ImportMapFile {
    #[serde(default)]
    imports: IndexMap<String, String>,
    #[serde(default)]
    scopes: IndexMap<String, IndexMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsconfigFile {
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    base_url: Option<String>,
    #[serde(default)]
    paths: IndexMap<String, Vec<String>>,
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ScanError::Read { path: path.to_path_buf(), source: e }),
    }
}

/// `path` made absolute against the current directory, then cleaned.
pub(crate) fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.clean());
    }
    let cwd = env::current_dir().map_err(|e| ScanError::from_io(path, e))?;
    Ok(cwd.join(path).clean())
}

/// Reads `<root>/import_map.json`. Scope directories are stored absolute,
/// so a relative `root` is taken against the current directory.
pub fn load_import_map(root: &Path) -> Result<Option<AliasMap>> {
    let root = &absolutize(root)?;
    let path = root.join(IMPORT_MAP_FILE);
    debug!("Reading import map from {:?}", path);
    let Some(content) = read_optional(&path)? else {
        trace!("No import map at {:?}", path);
        return Ok(None);
    };

    let file: ImportMapFile = serde_json::from_str(&content)
        .map_err(|e| ScanError::ParseConfig { path: path.clone(), source: Box::new(e) })?;

    let mut map = AliasMap::new(file.imports);
    for (prefix, imports) in file.scopes {
        let rel = prefix.trim_start_matches("./").trim_start_matches('/');
        map = map.with_scope(root.join(rel).clean(), imports);
    }

    debug!("Loaded {} import map entries", map.len());
    Ok(Some(map))
}

/// Reads `compilerOptions.baseUrl` and `compilerOptions.paths` from
/// `<root>/tsconfig.json`.
pub fn load_path_map(root: &Path) -> Result<Option<PathMapConfig>> {
    let root = &absolutize(root)?;
    let path = root.join(TSCONFIG_FILE);
    debug!("Reading tsconfig paths from {:?}", path);
    let Some(content) = read_optional(&path)? else {
        trace!("No tsconfig at {:?}", path);
        return Ok(None);
    };

    let file = parse_tsconfig(&path, &content)?;

    let options = file.compiler_options;
    let base_dir = root.join(options.base_url.as_deref().unwrap_or(".")).clean();
    for (pattern, templates) in &options.paths {
        trace!("Found tsconfig path alias: '{}' -> {:?}", pattern, templates);
    }

    let config = PathMapConfig::new(base_dir, options.paths);
    debug!("Loaded {} tsconfig path patterns", config.patterns.len());
    Ok(Some(config))
}

/// Parses tsconfig text, which may carry comments and trailing commas.
///
/// Strict JSON is tried first; anything else goes through the JSON5 parser.
fn parse_tsconfig(path: &Path, content: &str) -> Result<TsconfigFile> {
    let value = match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value) => value,
        Err(_) => {
            trace!("{:?} is not strict JSON, parsing as JSON5", path);
            json_five::from_str::<serde_json::Value>(content).map_err(|e| {
                ScanError::ParseConfig { path: path.to_path_buf(), source: Box::new(e) }
            })?
        }
    };
    serde_json::from_value(value)
        .map_err(|e| ScanError::ParseConfig { path: path.to_path_buf(), source: Box::new(e) })
}
