//! Building, persisting, and loading the static call-graph index.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analyzer::StaticAnalyzer;
use crate::error::{Error, Result};
use crate::scan;

/// Default index file name, written into the indexed project's root.
pub const DEFAULT_INDEX_FILE: &str = ".callscope_index.json";

/// The persisted call-graph index of one project.
///
/// `functions` keeps discovery order and tolerates duplicates; consumers
/// deduplicate. Every caller in `edges` appears in `functions`; callees may
/// be unresolved externals (e.g. `os.path.join`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Index {
    /// Absolute project root the index was built from.
    pub root: String,
    /// ISO-8601 UTC timestamp of the build.
    pub generated_at: String,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

/// Analyze every Python file under `project` and accumulate the index.
/// Files that fail to read or parse are skipped; they never abort the build.
pub fn build_index(project: &Path) -> Index {
    let root = project
        .canonicalize()
        .unwrap_or_else(|_| project.to_path_buf());

    let mut index = Index {
        root: root.to_string_lossy().to_string(),
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        functions: Vec::new(),
        edges: Vec::new(),
    };

    for source in scan::collect_sources(&root) {
        let text = match fs::read_to_string(&source.path) {
            Ok(text) => text,
            Err(_) => continue,
        };
        let mut analyzer = StaticAnalyzer::new(&source.module);
        if analyzer
            .analyze(&text, &source.path.to_string_lossy())
            .is_err()
        {
            continue;
        }
        index.functions.extend(analyzer.functions);
        index.edges.extend(analyzer.edges);
    }

    index
}

impl Index {
    /// Write the index as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::IndexFormat {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(|e| Error::IndexIo {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load a previously saved index.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IndexIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| Error::IndexFormat {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
