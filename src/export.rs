//! Batch conversion of discovered notebooks.
//!
//! Every notebook is converted independently on a dedicated
//! [rayon](https://docs.rs/rayon) pool. A failed conversion is reported as a
//! [`BuildEvent::ExportFailed`] and never stops its siblings.
//!
//! The returned [`ExportReport::listed`] is what the index shows. By default
//! it holds only the notebooks whose export succeeded, so every index link
//! resolves; [`ExportOptions::include_failed`] lists other failures as well. Lists
//! keep discovery order regardless of which conversion finished first.
//!
//! Two sources with the same stem in one root (`a/report.py`, `b/report.py`)
//! map to the same output file. The first in discovery order is converted;
//! later ones fail with [`ConvertError::DuplicateOutput`] without running
//! the converter, so no two workers ever write the same file.

use crate::converter::{ConvertError, Converter};
use crate::events::{BuildEvent, EventSink, emit};
use crate::notebook::{Notebook, Sources};
use rayon::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Number of conversions allowed to run at once.
    pub threads: usize,
    pub include_failed: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            include_failed: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ExportReport {
    /// Notebooks to list in the index.
    pub listed: Sources,
    /// Source paths whose conversion failed, in discovery order.
    pub failed: Vec<PathBuf>,
}

/// Convert every notebook in `sources` into `output_root`.
pub fn export_all(
    sources: &Sources,
    output_root: &Path,
    converter: &impl Converter,
    options: &ExportOptions,
    events: EventSink<'_>,
) -> Result<ExportReport, ExportError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.max(1))
        .build()?;

    let all: Vec<&Notebook> = sources.iter().collect();
    let owners = output_owners(&all);
    let results: Vec<Result<PathBuf, ConvertError>> = pool.install(|| {
        all.par_iter()
            .zip(owners.par_iter())
            .map(|(nb, owner)| export_one(nb, *owner, output_root, converter, events))
            .collect()
    });

    let mut report = ExportReport::default();
    for (nb, result) in all.into_iter().zip(results) {
        let ok = result.is_ok();
        if !ok {
            report.failed.push(nb.path().to_path_buf());
        }
        // A duplicate would only ever link to another notebook's file.
        let duplicate = matches!(result, Err(ConvertError::DuplicateOutput { .. }));
        if ok || (options.include_failed && !duplicate) {
            report.listed.get_mut(nb.kind()).push(nb.clone());
        }
    }

    debug!(
        listed = report.listed.len(),
        failed = report.failed.len(),
        "export finished"
    );
    Ok(report)
}

/// For each notebook, the source that already claimed its output file, if any.
fn output_owners<'a>(notebooks: &[&'a Notebook]) -> Vec<Option<&'a Path>> {
    let mut claimed: HashMap<PathBuf, &'a Path> = HashMap::new();
    notebooks
        .iter()
        .map(|nb| match claimed.entry(nb.html_path()) {
            Entry::Occupied(first) => Some(*first.get()),
            Entry::Vacant(slot) => {
                slot.insert(nb.path());
                None
            }
        })
        .collect()
}

fn export_one(
    nb: &Notebook,
    owner: Option<&Path>,
    output_root: &Path,
    converter: &impl Converter,
    events: EventSink<'_>,
) -> Result<PathBuf, ConvertError> {
    let result = match owner {
        Some(first) => Err(ConvertError::DuplicateOutput {
            output: output_root.join(nb.html_path()),
            first: first.to_path_buf(),
        }),
        None => nb.export(output_root, converter),
    };
    match &result {
        Ok(_) => emit(
            events,
            BuildEvent::Exported {
                kind: nb.kind(),
                display_name: nb.display_name(),
                html_path: nb.html_href(),
            },
        ),
        Err(e) => emit(
            events,
            BuildEvent::ExportFailed {
                kind: nb.kind(),
                source: nb.path().to_path_buf(),
                error: e.to_string(),
            },
        ),
    }
    result
}
