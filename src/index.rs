//! Index page rendering.
//!
//! Renders the three notebook lists through a Jinja template with
//! [minijinja](https://docs.rs/minijinja) and writes `index.html` to the
//! output root. The template receives:
//!
//! | Variable | Items |
//! |----------|-------|
//! | `notebooks` | static HTML notebooks |
//! | `apps` | run-only WASM apps |
//! | `notebooks_wasm` | editable WASM notebooks |
//!
//! Each item exposes `display_name`, `html_path` (relative, `/`-separated)
//! and `kind`. Templates whose name ends in `.html`, `.htm` or `.xml`
//! (optionally followed by `.j2`/`.jinja`/`.jinja2`) are auto-escaped.
//!
//! With no template configured, the bundled `templates/default.html.j2`
//! is used.
//!
//! Neither a template failure nor a write failure escapes: both are reported
//! as events. A template failure yields an empty string; a write failure
//! still returns the rendered HTML.

use crate::events::{BuildEvent, EventSink, emit};
use crate::kind::Kind;
use crate::notebook::{Notebook, Sources};
use minijinja::{AutoEscape, Environment, context, path_loader};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const INDEX_FILE: &str = "index.html";

const DEFAULT_TEMPLATE_NAME: &str = "default.html.j2";
const DEFAULT_TEMPLATE: &str = include_str!("../templates/default.html.j2");

/// One notebook as the template sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub display_name: String,
    pub html_path: String,
    pub kind: Kind,
}

impl From<&Notebook> for IndexEntry {
    fn from(nb: &Notebook) -> Self {
        Self {
            display_name: nb.display_name(),
            html_path: nb.html_href(),
            kind: nb.kind(),
        }
    }
}

fn entries(notebooks: &[Notebook]) -> Vec<IndexEntry> {
    notebooks.iter().map(IndexEntry::from).collect()
}

fn auto_escape(name: &str) -> AutoEscape {
    let base = [".j2", ".jinja2", ".jinja"]
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name);
    if [".html", ".htm", ".xml"].iter().any(|ext| base.ends_with(ext)) {
        AutoEscape::Html
    } else {
        AutoEscape::None
    }
}

/// Render the index HTML without touching the filesystem (beyond loading the template).
pub fn render_html(template: Option<&Path>, sources: &Sources) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(auto_escape);

    let name = match template {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            env.set_loader(path_loader(dir));
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        }
        None => {
            env.add_template(DEFAULT_TEMPLATE_NAME, DEFAULT_TEMPLATE)?;
            DEFAULT_TEMPLATE_NAME.to_string()
        }
    };

    let tmpl = env.get_template(&name)?;
    tmpl.render(context! {
        notebooks => entries(&sources.notebooks),
        apps => entries(&sources.apps),
        notebooks_wasm => entries(&sources.notebooks_wasm),
    })
}

/// Render the index and write it to `output_dir/index.html`.
///
/// Returns the rendered HTML, or an empty string if the template could not
/// be loaded or rendered.
pub fn render_index(
    output_dir: &Path,
    template: Option<&Path>,
    sources: &Sources,
    events: EventSink<'_>,
) -> String {
    let html = match render_html(template, sources) {
        Ok(html) => html,
        Err(e) => {
            let template = template
                .map(|t| t.display().to_string())
                .unwrap_or_else(|| DEFAULT_TEMPLATE_NAME.to_string());
            debug!(%template, error = ?e, "template failed");
            emit(
                events,
                BuildEvent::TemplateFailed {
                    template,
                    error: e.to_string(),
                },
            );
            return String::new();
        }
    };

    let index_path = output_dir.join(INDEX_FILE);
    let written = fs::create_dir_all(output_dir).and_then(|_| fs::write(&index_path, &html));
    match written {
        Ok(()) => {
            info!(path = %index_path.display(), "index written");
            emit(events, BuildEvent::IndexWritten { path: index_path });
        }
        Err(e) => emit(
            events,
            BuildEvent::IndexWriteFailed {
                path: index_path,
                error: e.to_string(),
            },
        ),
    }
    html
}
