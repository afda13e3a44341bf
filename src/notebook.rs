//! A single discovered marimo source file.
//!
//! A [`Notebook`] can only be built through [`Notebook::new`], which checks
//! that the path exists, is a regular file and ends in `.py`. Once built it
//! is never mutated; everything else about it is derived from the path:
//!
//! ```text
//! notebooks/monte_carlo.py  (Kind::Notebook)
//!   display_name  → "monte carlo"
//!   html_path     → notebooks/monte_carlo.html
//! ```

use crate::converter::{ConvertError, Converter};
use crate::kind::Kind;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Characters escaped in a link's file-name segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Extension every source file must carry.
pub const SOURCE_EXTENSION: &str = "py";

#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Path is not a file: {0}")]
    NotAFile(PathBuf),
    #[error("File is not a Python file: {0}")]
    NotPython(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notebook {
    path: PathBuf,
    kind: Kind,
}

impl Notebook {
    pub fn new(path: impl Into<PathBuf>, kind: Kind) -> Result<Self, NotebookError> {
        let path = path.into();
        if !path.exists() {
            return Err(NotebookError::NotFound(path));
        }
        if !path.is_file() {
            return Err(NotebookError::NotAFile(path));
        }
        if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
            return Err(NotebookError::NotPython(path));
        }
        Ok(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File stem with underscores turned into spaces.
    pub fn display_name(&self) -> String {
        self.stem().replace('_', " ")
    }

    /// Location of the exported file relative to the output root.
    pub fn html_path(&self) -> PathBuf {
        Path::new(self.kind.output_subdirectory()).join(format!("{}.html", self.stem()))
    }

    /// [`Notebook::html_path`] as a `/`-separated, percent-encoded link target.
    pub fn html_href(&self) -> String {
        format!(
            "{}/{}.html",
            self.kind.output_subdirectory(),
            utf8_percent_encode(&self.stem(), PATH_SEGMENT)
        )
    }

    /// Convert this notebook into `output_root/<html_path>`.
    ///
    /// Creates the kind's subdirectory if needed and removes any previous
    /// output first. Returns the path of the written file. A converter that
    /// claims success without producing the file is reported as
    /// [`ConvertError::MissingOutput`].
    pub fn export(
        &self,
        output_root: &Path,
        converter: &impl Converter,
    ) -> Result<PathBuf, ConvertError> {
        let output_file = output_root.join(self.html_path());
        if let Some(parent) = output_file.parent() {
            fs::create_dir_all(parent)?;
        }

        // A file left by an earlier build must not pass for this one's output.
        match fs::remove_file(&output_file) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        debug!(source = %self.path.display(), output = %output_file.display(), kind = %self.kind, "exporting");
        converter.convert(self.kind, &self.path, &output_file)?;

        if !output_file.is_file() {
            return Err(ConvertError::MissingOutput(output_file));
        }
        Ok(output_file)
    }
}

/// Notebooks grouped by kind, each list in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources {
    pub notebooks: Vec<Notebook>,
    pub apps: Vec<Notebook>,
    pub notebooks_wasm: Vec<Notebook>,
}

impl Sources {
    pub fn get(&self, kind: Kind) -> &[Notebook] {
        match kind {
            Kind::Notebook => &self.notebooks,
            Kind::NotebookWasm => &self.notebooks_wasm,
            Kind::App => &self.apps,
        }
    }

    pub fn get_mut(&mut self, kind: Kind) -> &mut Vec<Notebook> {
        match kind {
            Kind::Notebook => &mut self.notebooks,
            Kind::NotebookWasm => &mut self.notebooks_wasm,
            Kind::App => &mut self.apps,
        }
    }

    /// All notebooks, kind by kind in [`Kind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &Notebook> {
        Kind::ALL.into_iter().flat_map(|k| self.get(k))
    }

    pub fn len(&self) -> usize {
        self.notebooks.len() + self.apps.len() + self.notebooks_wasm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
