use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{fs, path::Path};

use crate::{
    error::{Result, ScanError},
    types::{ImportKind, RawImport},
};

/// One row of the import-shape table.
struct ImportPattern {
    name: &'static str,
    kind: ImportKind,
    dynamic: bool,
    /// Whether the row is tried against joined multi-line `{ ... }` statements
    braced: bool,
    regex: Regex,
}

fn pattern(
    name: &'static str,
    kind: ImportKind,
    dynamic: bool,
    braced: bool,
    src: &str,
) -> ImportPattern {
    ImportPattern {
        name,
        kind,
        dynamic,
        braced,
        regex: Regex::new(src).expect("import pattern must compile"),
    }
}

// Rows are tried in order and the first match wins. ES6 shapes come before
// CommonJS shapes, which come before dynamic `import()`.
static IMPORT_PATTERNS: Lazy<Vec<ImportPattern>> = Lazy::new(|| {
    use ImportKind::{CommonJs, Es6};
    vec![
        pattern(
            "type-only",
            Es6,
            false,
            true,
            concat!(
                r#"^\s*import\s+type\s+(?:[\w$]+|\*\s*as\s+[\w$]+|\{[^}]*\})"#,
                r#"\s*from\s*['"]([^'"]+)['"]"#,
            ),
        ),
        pattern(
            "default-and-named",
            Es6,
            false,
            true,
            r#"^\s*import\s+[\w$]+\s*,\s*\{[^}]*\}\s*from\s*['"]([^'"]+)['"]"#,
        ),
        pattern(
            "default-and-namespace",
            Es6,
            false,
            false,
            r#"^\s*import\s+[\w$]+\s*,\s*\*\s*as\s+[\w$]+\s+from\s*['"]([^'"]+)['"]"#,
        ),
        pattern("named", Es6, false, true, r#"^\s*import\s*\{[^}]*\}\s*from\s*['"]([^'"]+)['"]"#),
        pattern(
            "namespace",
            Es6,
            false,
            false,
            r#"^\s*import\s*\*\s*as\s+[\w$]+\s+from\s*['"]([^'"]+)['"]"#,
        ),
        pattern("default", Es6, false, false, r#"^\s*import\s+[\w$]+\s+from\s*['"]([^'"]+)['"]"#),
        pattern("side-effect", Es6, false, false, r#"^\s*import\s*['"]([^'"]+)['"]"#),
        pattern(
            "re-export",
            Es6,
            false,
            true,
            concat!(
                r#"^\s*export(?:\s+type)?\s*(?:\{[^}]*\}|\*(?:\s*as\s+[\w$]+)?)"#,
                r#"\s*from\s*['"]([^'"]+)['"]"#,
            ),
        ),
        pattern(
            "import-equals",
            CommonJs,
            false,
            false,
            r#"^\s*(?:export\s+)?import\s+[\w$]+\s*=\s*require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        ),
        pattern(
            "require-destructured",
            CommonJs,
            false,
            false,
            r#"^\s*(?:const|let|var)\s*\{[^}]*\}\s*=\s*require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        ),
        pattern(
            "require-member",
            CommonJs,
            false,
            false,
            concat!(
                r#"^\s*(?:const|let|var)\s+[\w$]+\s*=\s*require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
                r#"\s*\.\s*[\w$]+"#,
            ),
        ),
        pattern(
            "require-binding",
            CommonJs,
            false,
            false,
            r#"^\s*(?:const|let|var)\s+[\w$]+\s*=\s*require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        ),
        pattern(
            "require-call",
            CommonJs,
            false,
            false,
            r#"(?:^|[^\w$.])require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        ),
        pattern(
            "dynamic-import",
            Es6,
            true,
            false,
            r#"(?:^|[^\w$.])import\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        ),
    ]
});

/// An `import {` / `export {` whose brace is left open on its own line.
static OPEN_BRACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"^\s*(import|export)"#,
        r#"(?:\s+(?:type\s+)?(?:[\w$]+\s*,\s*)?|\s*)\{[^}]*$"#,
    ))
    .expect("open brace pattern must compile")
});

static FROM_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bfrom\s*['"]"#).expect("from clause pattern must compile"));

/// A multi-line statement being joined back together.
struct Pending {
    text: String,
    line: usize,
    is_export: bool,
}

/// Reads `file` and extracts its imports.
///
/// A missing file is reported as `NotFound`; any other failure (including
/// non-UTF-8 content) as `Read`.
pub fn imports_for(file: &Path) -> Result<Vec<RawImport>> {
    trace!("Reading file for imports: {}", file.display());
    let src = fs::read_to_string(file).map_err(|e| ScanError::from_io(file, e))?;
    let imports = extract_imports(&src);
    debug!("Found {} import specifiers in {}", imports.len(), file.display());
    Ok(imports)
}

/// Extracts imports from source text, in line order.
///
/// This is a line-oriented scan, not a parser. Block comments are not
/// recognised, so a specifier inside `/* ... */` is reported like any other.
pub fn extract_imports(source: &str) -> Vec<RawImport> {
    let mut imports = Vec::new();
    let mut pending: Option<Pending> = None;

    for (idx, line) in source.lines().enumerate() {
        let lineno = idx + 1;

        if let Some(mut acc) = pending.take() {
            acc.text.push(' ');
            acc.text.push_str(line.trim());

            if FROM_CLAUSE.is_match(line) {
                match match_statement(&acc.text, true) {
                    Some(found) => imports.push(found.into_import(acc.line)),
                    None => trace!("Discarding unmatched multi-line import at line {}", acc.line),
                }
            } else if acc.is_export && line.contains('}') {
                // Plain `export { a, b }` lists have no module clause.
                trace!("Multi-line export at line {} has no module clause", acc.line);
            } else {
                pending = Some(acc);
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        if let Some(found) = match_statement(line, false) {
            trace!("Line {} matched '{}': '{}'", lineno, found.pattern.name, found.specifier);
            imports.push(found.into_import(lineno));
        } else if let Some(caps) = OPEN_BRACE.captures(line) {
            trace!("Line {} opens a multi-line statement", lineno);
            pending = Some(Pending {
                text: trimmed.to_string(),
                line: lineno,
                is_export: &caps[1] == "export",
            });
        }
    }

    if let Some(acc) = pending {
        trace!("Reached end of input inside multi-line import from line {}", acc.line);
    }

    imports
}

struct Match<'a> {
    pattern: &'a ImportPattern,
    specifier: String,
}

impl Match<'_> {
    fn into_import(self, line: usize) -> RawImport {
        RawImport {
            kind: self.pattern.kind,
            specifier: self.specifier,
            is_dynamic: self.pattern.dynamic,
            line,
        }
    }
}

fn match_statement(text: &str, braced_only: bool) -> Option<Match<'static>> {
    IMPORT_PATTERNS.iter().filter(|p| !braced_only || p.braced).find_map(|p| {
        p.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| Match { pattern: p, specifier: m.as_str().to_string() })
    })
}
