use std::{
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};
use serde::Serialize;
use whoimports_core::{DirectoryImporters, FileImporters, ScanOutcome};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    target: String,
    root: String,
    count: usize,
    importers: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryReport {
    target: String,
    root: String,
    count: usize,
    groups: Vec<GroupReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupReport {
    imported_file: String,
    importers: Vec<ImporterReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImporterReport {
    source_file: String,
    import_path: String,
    line: usize,
}

/// Path of `path` under `root`, with `/` separators. Paths outside the root
/// are returned as-is.
fn root_relative(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().to_string(),
    }
}

fn file_report(result: &FileImporters) -> FileReport {
    FileReport {
        target: result.target.to_string_lossy().to_string(),
        root: result.root.to_string_lossy().to_string(),
        count: result.count(),
        importers: result.importers().iter().map(|p| root_relative(&result.root, p)).collect(),
    }
}

fn directory_report(result: &DirectoryImporters) -> DirectoryReport {
    DirectoryReport {
        target: result.target.to_string_lossy().to_string(),
        root: result.root.to_string_lossy().to_string(),
        count: result.count(),
        groups: result
            .groups
            .iter()
            .map(|g| GroupReport {
                imported_file: g.referenced_path.clone(),
                importers: g
                    .importers
                    .iter()
                    .map(|i| ImporterReport {
                        source_file: root_relative(&result.root, &i.source_file),
                        import_path: i.import_specifier.clone(),
                        line: i.line,
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn write_json<W: Write>(writer: &mut W, outcome: &ScanOutcome) -> anyhow::Result<()> {
    match outcome {
        ScanOutcome::File(result) => {
            serde_json::to_writer_pretty(&mut *writer, &file_report(result))?
        }
        ScanOutcome::Directory(result) => {
            serde_json::to_writer_pretty(&mut *writer, &directory_report(result))?
        }
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Create a relative path from `base` to `target`
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let mut target_components = target.components().peekable();
    let mut base_components = base.components().peekable();

    // Paths on different roots or drives have no relative form.
    if target_components.peek() != base_components.peek() {
        return None;
    }

    while let (Some(t), Some(b)) = (target_components.peek(), base_components.peek()) {
        if t != b {
            break;
        }
        target_components.next();
        base_components.next();
    }

    let mut result = PathBuf::new();
    for _ in base_components {
        result.push("..");
    }
    for component in target_components {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

/// Shortens `path` relative to `base` (normally the current directory) so
/// terminals can turn it into a link.
fn display_path(path: &Path, base: &Path) -> String {
    match make_relative(path, base) {
        Some(rel) => {
            trace!("Relativized {} to {}", path.display(), rel.display());
            rel.to_string_lossy().to_string()
        }
        None => path.to_string_lossy().to_string(),
    }
}

fn importer_noun(count: usize) -> &'static str {
    if count == 1 { "file imports" } else { "files import" }
}

/// Lists every import of the target, one line per import statement.
pub fn print_file_importers<W: Write>(
    writer: &mut W,
    result: &FileImporters,
    base: &Path,
) -> io::Result<()> {
    debug!("Printing {} imports", result.imports.len());
    let target = display_path(&result.target, base);

    if result.imports.is_empty() {
        writeln!(writer, "{} No files import {}", "✓".green().bold(), target.blue())?;
        writer.flush()?;
        return Ok(());
    }

    writeln!(
        writer,
        "{} {} {} {}\n",
        "●".bright_blue(),
        result.count().to_string().cyan().bold(),
        importer_noun(result.count()),
        target.blue()
    )?;

    for import in &result.imports {
        writeln!(
            writer,
            "{}:{}  {}",
            display_path(&import.source_file, base).bright_white().bold(),
            import.line,
            import.import_specifier.dimmed()
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Prints one tree per referenced file under the target directory.
pub fn print_directory_importers<W: Write>(
    writer: &mut W,
    result: &DirectoryImporters,
    base: &Path,
) -> io::Result<()> {
    debug!("Printing importers tree for {} files", result.groups.len());
    let target = display_path(&result.target, base);

    if result.groups.is_empty() {
        writeln!(
            writer,
            "{} No files import anything under {}",
            "✓".green().bold(),
            target.blue()
        )?;
        writer.flush()?;
        return Ok(());
    }

    writeln!(
        writer,
        "{} {} {} from {}\n",
        "●".bright_blue(),
        result.count().to_string().cyan().bold(),
        importer_noun(result.count()),
        target.blue()
    )?;

    for group in &result.groups {
        writeln!(
            writer,
            "{} ({})",
            group.referenced_path.blue(),
            group.importers.len().to_string().yellow()
        )?;

        for (idx, importer) in group.importers.iter().enumerate() {
            let prefix = if idx == group.importers.len() - 1 { "└──" } else { "├──" };
            writeln!(
                writer,
                "{}  {}:{}  {}",
                prefix.dimmed(),
                display_path(&importer.source_file, base),
                importer.line,
                importer.import_specifier.dimmed()
            )?;
        }

        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn print_outcome<W: Write>(
    writer: &mut W,
    outcome: &ScanOutcome,
    base: &Path,
) -> io::Result<()> {
    match outcome {
        ScanOutcome::File(result) => print_file_importers(writer, result, base),
        ScanOutcome::Directory(result) => print_directory_importers(writer, result, base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whoimports_core::{ImportGroup, Importer, ResolvedImport};

    fn resolved(source: &str, specifier: &str, line: usize) -> ResolvedImport {
        ResolvedImport {
            source_file: PathBuf::from(source),
            import_specifier: specifier.to_string(),
            resolved_path: PathBuf::from("/project/src/button.tsx"),
            line,
        }
    }

    fn importer(source: &str, specifier: &str, line: usize) -> Importer {
        Importer {
            source_file: PathBuf::from(source),
            import_specifier: specifier.to_string(),
            line,
        }
    }

    fn file_result() -> FileImporters {
        FileImporters {
            target: PathBuf::from("/project/src/button.tsx"),
            root: PathBuf::from("/project"),
            imports: vec![
                resolved("/project/src/app.tsx", "./button", 3),
                resolved("/project/src/app.tsx", "./button.tsx", 9),
                resolved("/project/src/pages/home.tsx", "@/button", 1),
            ],
        }
    }

    fn directory_result() -> DirectoryImporters {
        DirectoryImporters {
            target: PathBuf::from("/project/lib"),
            root: PathBuf::from("/project"),
            groups: vec![
                ImportGroup {
                    referenced_path: "a/index.ts".to_string(),
                    importers: vec![importer("/project/app/z.ts", "../lib/a", 2)],
                },
                ImportGroup {
                    referenced_path: "b.ts".to_string(),
                    importers: vec![
                        importer("/project/app/m.ts", "../lib/b.ts", 1),
                        importer("/project/app/z.ts", "../lib/b", 1),
                    ],
                },
            ],
        }
    }

    fn render<F>(print: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        colored::control::set_override(false);
        let mut out = Vec::new();
        print(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_file_json() {
        let mut out = Vec::new();
        write_json(&mut out, &ScanOutcome::File(file_result())).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "target": "/project/src/button.tsx",
                "root": "/project",
                "count": 2,
                "importers": ["src/app.tsx", "src/pages/home.tsx"],
            })
        );
    }

    #[test]
    fn test_directory_json() {
        let mut out = Vec::new();
        write_json(&mut out, &ScanOutcome::Directory(directory_result())).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(json["count"], 2);
        assert_eq!(json["groups"][0]["importedFile"], "a/index.ts");
        assert_eq!(
            json["groups"][1]["importers"][0],
            serde_json::json!({ "sourceFile": "app/m.ts", "importPath": "../lib/b.ts", "line": 1 })
        );
    }

    #[test]
    fn test_print_file_importers() {
        let text = render(|out| print_file_importers(out, &file_result(), Path::new("/project")));
        assert_eq!(
            text,
            "● 2 files import src/button.tsx\n\n\
             src/app.tsx:3  ./button\n\
             src/app.tsx:9  ./button.tsx\n\
             src/pages/home.tsx:1  @/button\n"
        );
    }

    #[test]
    fn test_print_no_importers() {
        let result = FileImporters { imports: Vec::new(), ..file_result() };
        let text = render(|out| print_file_importers(out, &result, Path::new("/project/src")));
        assert_eq!(text, "✓ No files import button.tsx\n");
    }

    #[test]
    fn test_print_directory_tree() {
        let base = Path::new("/project");
        let text = render(|out| print_directory_importers(out, &directory_result(), base));
        assert_eq!(
            text,
            "● 2 files import from lib\n\n\
             a/index.ts (1)\n\
             └──  app/z.ts:2  ../lib/a\n\n\
             b.ts (2)\n\
             ├──  app/m.ts:1  ../lib/b.ts\n\
             └──  app/z.ts:1  ../lib/b\n\n"
        );
    }

    #[test]
    fn test_root_relative() {
        let root = Path::new("/project");
        assert_eq!(root_relative(root, Path::new("/project/src/a.ts")), "src/a.ts");
        assert_eq!(root_relative(root, Path::new("/elsewhere/a.ts")), "/elsewhere/a.ts");
    }

    #[test]
    fn test_make_relative_child_dir() {
        let result = make_relative(
            Path::new("/project/src/components/Button.tsx"),
            Path::new("/project/src"),
        );
        assert_eq!(result, Some(PathBuf::from("components/Button.tsx")));
    }

    #[test]
    fn test_make_relative_sibling_dir() {
        let result =
            make_relative(Path::new("/project/apps/web/index.ts"), Path::new("/project/apps/api"));
        assert_eq!(result, Some(PathBuf::from("../web/index.ts")));
    }

    #[test]
    fn test_make_relative_same_path() {
        let result = make_relative(Path::new("/project/src"), Path::new("/project/src"));
        assert_eq!(result, Some(PathBuf::from(".")));
    }

    #[test]
    fn test_make_relative_ancestor() {
        let result = make_relative(Path::new("/project"), Path::new("/project/apps/web"));
        assert_eq!(result, Some(PathBuf::from("../..")));
    }

    #[test]
    fn test_make_relative_without_common_root() {
        assert_eq!(make_relative(Path::new("src/a.ts"), Path::new("/project")), None);
    }
}
