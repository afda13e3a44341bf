//! The closed set of ways a source file can be exported.
//!
//! Every [`Kind`] maps to exactly one marimo export recipe and one output
//! subdirectory. The table is fixed at compile time:
//!
//! | Kind | Export arguments | Output |
//! |------|------------------|--------|
//! | `Notebook` | `export html --sandbox` | `notebooks/` |
//! | `NotebookWasm` | `export html-wasm --sandbox --mode edit` | `notebooks_wasm/` |
//! | `App` | `export html-wasm --sandbox --mode run --no-show-code` | `apps/` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Tool prefix used when no converter command is configured.
pub const DEFAULT_TOOL: &[&str] = &["uvx", "marimo"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Static HTML export, rendered once.
    Notebook,
    /// WebAssembly export in edit mode.
    NotebookWasm,
    /// WebAssembly export in run mode with code hidden.
    App,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid kind: {0:?}. Must be one of [\"notebook\", \"notebook_wasm\", \"app\"]")]
pub struct ParseKindError(pub String);

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Notebook, Kind::NotebookWasm, Kind::App];

    /// Arguments passed to the tool, before the source path and output flag.
    pub fn export_args(self) -> &'static [&'static str] {
        match self {
            Kind::Notebook => &["export", "html", "--sandbox"],
            Kind::NotebookWasm => &["export", "html-wasm", "--sandbox", "--mode", "edit"],
            Kind::App => &[
                "export",
                "html-wasm",
                "--sandbox",
                "--mode",
                "run",
                "--no-show-code",
            ],
        }
    }

    /// The full default command prefix: [`DEFAULT_TOOL`] followed by [`Kind::export_args`].
    pub fn command(self) -> Vec<&'static str> {
        DEFAULT_TOOL
            .iter()
            .chain(self.export_args())
            .copied()
            .collect()
    }

    /// Subdirectory of the output root that receives this kind's HTML files.
    pub fn output_subdirectory(self) -> &'static str {
        match self {
            Kind::Notebook => "notebooks",
            Kind::NotebookWasm => "notebooks_wasm",
            Kind::App => "apps",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Notebook => "notebook",
            Kind::NotebookWasm => "notebook_wasm",
            Kind::App => "app",
        }
    }

    /// Human label used in CLI output headings.
    pub fn label(self) -> &'static str {
        match self {
            Kind::Notebook => "Notebooks",
            Kind::NotebookWasm => "Notebooks (WASM)",
            Kind::App => "Apps",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}
