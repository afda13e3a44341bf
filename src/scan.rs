//! Source discovery.
//!
//! Walks a root directory recursively and turns every `*.py` file into a
//! [`Notebook`] of the requested [`Kind`]:
//!
//! ```text
//! notebooks/
//! ├── fibonacci.py          → Notebook
//! ├── README.md             (ignored)
//! └── stats/
//!     └── penguins.py       → Notebook
//! ```
//!
//! An absent root (no path, or an empty one) and a root that does not
//! exist both yield nothing. Entries are visited in file-name order, so
//! the result is stable across runs on the same tree.

use crate::kind::Kind;
use crate::notebook::{Notebook, NotebookError, SOURCE_EXTENSION};
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Notebook(#[from] NotebookError),
}

/// Find all notebooks under `root`, recursively.
///
/// A matching file that fails [`Notebook::new`] aborts the scan.
pub fn scan(root: Option<&Path>, kind: Kind) -> Result<Vec<Notebook>, ScanError> {
    let Some(root) = root.filter(|r| !r.as_os_str().is_empty()) else {
        return Ok(Vec::new());
    };
    if !root.exists() {
        debug!(root = %root.display(), %kind, "source root does not exist");
        return Ok(Vec::new());
    }

    let mut notebooks = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.depth() == 0 || !has_source_extension(entry.path()) {
            continue;
        }
        notebooks.push(Notebook::new(entry.into_path(), kind)?);
    }

    debug!(root = %root.display(), %kind, count = notebooks.len(), "scanned");
    Ok(notebooks)
}

fn has_source_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
}
