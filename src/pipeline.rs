//! The full build: discover → export → render index.
//!
//! ```text
//! notebooks/ ─┐
//! apps/      ─┼─ scan ─→ Sources ─→ export_all ─→ listed ─→ render_index ─→ index.html
//! wasm/      ─┘                    (_site/<kind>/*.html)
//! ```
//!
//! Only discovery errors and failing to create the output directory stop a
//! build. Per-notebook failures, template failures and write failures are
//! reported as events and the build carries on. When every root is empty
//! the build stops early: no conversion runs and no `index.html` is written.

use crate::config::{BuildConfig, effective_threads, non_empty};
use crate::converter::Converter;
use crate::events::{BuildEvent, EventSink, emit};
use crate::export::{ExportError, ExportOptions, export_all};
use crate::index::render_index;
use crate::kind::Kind;
use crate::links::validate_links;
use crate::notebook::Sources;
use crate::scan::{ScanError, scan};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

fn root_for(config: &BuildConfig, kind: Kind) -> &Path {
    match kind {
        Kind::Notebook => &config.notebooks,
        Kind::NotebookWasm => &config.notebooks_wasm,
        Kind::App => &config.apps,
    }
}

/// Scan all three configured roots.
pub fn discover(config: &BuildConfig, events: EventSink<'_>) -> Result<Sources, ScanError> {
    let mut sources = Sources::default();
    for kind in Kind::ALL {
        let root = root_for(config, kind);
        let found = scan(non_empty(root), kind)?;
        if non_empty(root).is_some() {
            emit(
                events,
                BuildEvent::Discovered {
                    kind,
                    root: root.to_path_buf(),
                    count: found.len(),
                },
            );
        }
        *sources.get_mut(kind) = found;
    }
    Ok(sources)
}

/// Run a complete build and return the rendered index.
///
/// An empty string means no index was produced: either nothing was found
/// or the template failed. Events carry the distinction.
pub fn run(
    config: &BuildConfig,
    converter: &impl Converter,
    events: EventSink<'_>,
) -> Result<String, PipelineError> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        output = %config.output.display(),
        "starting build"
    );
    fs::create_dir_all(&config.output)?;

    let sources = discover(config, events)?;
    if sources.is_empty() {
        emit(events, BuildEvent::NothingFound);
        return Ok(String::new());
    }

    let options = ExportOptions {
        threads: effective_threads(&config.processing),
        include_failed: config.index.include_failed,
    };
    let report = export_all(&sources, &config.output, converter, &options, events)?;

    let html = render_index(
        &config.output,
        config.template_path(),
        &report.listed,
        events,
    );

    if !html.is_empty() {
        let broken = validate_links(&html, &config.output);
        if !broken.is_empty() {
            emit(
                events,
                BuildEvent::BrokenLinks {
                    links: broken.into_iter().collect(),
                },
            );
        }
    }

    Ok(html)
}
