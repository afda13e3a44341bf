//! Shared test utilities for the marimushka test suite.
//!
//! Fixtures are built on the fly inside a `TempDir`; there is no static
//! fixtures directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{BuildConfig, ProcessingConfig};
use crate::kind::Kind;
use crate::notebook::Notebook;

/// A minimal marimo notebook body.
pub const NOTEBOOK_SOURCE: &str = "import marimo\n\napp = marimo.App()\n\n\n@app.cell\ndef _():\n    return\n\n\nif __name__ == \"__main__\":\n    app.run()\n";

/// Write a source file named `name` into `dir`, creating `dir` if needed.
pub fn write_source(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, NOTEBOOK_SOURCE).unwrap();
    path
}

/// Write `rel` under `root` and wrap it in a [`Notebook`].
pub fn notebook(root: &Path, rel: &str, kind: Kind) -> Notebook {
    let path = root.join(rel);
    let dir = path.parent().unwrap();
    let name = path.file_name().unwrap().to_str().unwrap();
    Notebook::new(write_source(dir, name), kind).unwrap()
}

/// A config whose three roots and output all live under `root`.
pub fn config_for(root: &Path) -> BuildConfig {
    BuildConfig {
        output: root.join("_site"),
        notebooks: root.join("notebooks"),
        apps: root.join("apps"),
        notebooks_wasm: root.join("notebooks_wasm"),
        processing: ProcessingConfig {
            max_processes: Some(2),
        },
        ..Default::default()
    }
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// File names in list order.
pub fn file_names(notebooks: &[Notebook]) -> Vec<String> {
    notebooks
        .iter()
        .map(|nb| nb.path().file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

/// Display names in list order.
pub fn display_names(notebooks: &[Notebook]) -> Vec<String> {
    notebooks.iter().map(Notebook::display_name).collect()
}
