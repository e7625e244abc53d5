//! Project walking and module naming.
//!
//! Enumerates the Python sources of a project in a deterministic order and
//! derives the dotted module name each file will be indexed under.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use walkdir::WalkDir;

/// Directories never descended into while indexing.
static SKIP_DIRS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        ".git",
        "__pycache__",
        ".venv",
        "venv",
        ".mypy_cache",
        ".pytest_cache",
        "build",
        "dist",
        ".eggs",
        ".tox",
        "node_modules",
    ]
    .into_iter()
    .collect()
});

/// A Python source file discovered under the project root.
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,
    /// Dotted module name relative to the project root.
    pub module: String,
}

/// Walk `root` and collect every `.py` file outside the skip set, sorted by
/// file name per directory so discovery order is stable across runs.
pub fn collect_sources(root: &Path) -> Vec<SourceFile> {
    let mut sources = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !SKIP_DIRS.contains(name.as_ref())
        });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        if let Some(module) = module_name(root, &path) {
            sources.push(SourceFile { path, module });
        }
    }
    sources
}

/// Dotted module name for a file under `root`: separators become dots, the
/// `.py` extension is dropped, and a trailing `.__init__` is stripped so a
/// package's init file names the package itself.
pub fn module_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts: Vec<String> = Vec::new();
    for comp in rel.components() {
        parts.push(comp.as_os_str().to_str()?.to_string());
    }
    let last = parts.last_mut()?;
    *last = last.strip_suffix(".py")?.to_string();
    let mut name = parts.join(".");
    if let Some(stripped) = name.strip_suffix(".__init__") {
        name = stripped.to_string();
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_name_strips_extension_and_init() {
        let root = Path::new("/proj");
        assert_eq!(
            module_name(root, Path::new("/proj/pkg/a.py")),
            Some("pkg.a".to_string())
        );
        assert_eq!(
            module_name(root, Path::new("/proj/pkg/__init__.py")),
            Some("pkg".to_string())
        );
        assert_eq!(
            module_name(root, Path::new("/proj/top.py")),
            Some("top".to_string())
        );
        // A bare top-level __init__.py has no package to collapse into.
        assert_eq!(
            module_name(root, Path::new("/proj/__init__.py")),
            Some("__init__".to_string())
        );
    }

    #[test]
    fn collect_sources_skips_caches_and_sorts() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let root = tmp.path();
        std::fs::create_dir_all(root.join("pkg")).expect("mkdir pkg");
        std::fs::create_dir_all(root.join("__pycache__")).expect("mkdir cache");
        std::fs::create_dir_all(root.join(".venv")).expect("mkdir venv");
        std::fs::write(root.join("pkg/b.py"), "").expect("write b");
        std::fs::write(root.join("pkg/a.py"), "").expect("write a");
        std::fs::write(root.join("__pycache__/x.py"), "").expect("write cached");
        std::fs::write(root.join(".venv/y.py"), "").expect("write venv");
        std::fs::write(root.join("notes.txt"), "").expect("write txt");

        let sources = collect_sources(root);
        let modules: Vec<&str> = sources.iter().map(|s| s.module.as_str()).collect();
        assert_eq!(modules, vec!["pkg.a", "pkg.b"]);
    }
}
