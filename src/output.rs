//! CLI output formatting.
//!
//! Each build event becomes one or more display lines. Notebooks lead with
//! their display name; paths are secondary context:
//!
//! ```text
//! Notebooks: 2 found in notebooks/
//! Apps: 1 found in apps/
//!     fibonacci → notebooks/fibonacci.html
//!     charts → apps/charts.html
//!     error: notebooks/penguins.py
//!         Converter exited with status 1: ModuleNotFoundError: No module named 'polars'
//! Index → _site/index.html
//! ```
//!
//! The `check` command lists what would be exported:
//!
//! ```text
//! Notebooks (2)
//!     001 fibonacci
//!         Source: notebooks/fibonacci.py
//! ```
//!
//! Format functions are pure and return `Vec<String>`; `print_*` wrappers
//! write to stdout.

use crate::events::BuildEvent;
use crate::kind::Kind;
use crate::notebook::Sources;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a single build event as display lines.
pub fn format_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::Discovered { kind, root, count } => {
            vec![format!(
                "{}: {} found in {}/",
                kind.label(),
                count,
                root.display()
            )]
        }
        BuildEvent::NothingFound => vec!["warning: No notebooks or apps found!".to_string()],
        BuildEvent::Exported {
            display_name,
            html_path,
            ..
        } => vec![format!("{}{} → {}", indent(1), display_name, html_path)],
        BuildEvent::ExportFailed { source, error, .. } => {
            let mut lines = vec![format!("{}error: {}", indent(1), source.display())];
            lines.extend(
                error
                    .lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(|l| format!("{}{}", indent(2), l)),
            );
            lines
        }
        BuildEvent::IndexWritten { path } => vec![format!("Index → {}", path.display())],
        BuildEvent::IndexWriteFailed { path, error } => {
            vec![format!("error: could not write {}: {}", path.display(), error)]
        }
        BuildEvent::TemplateFailed { template, error } => {
            vec![format!("error: template {}: {}", template, error)]
        }
        BuildEvent::BrokenLinks { links } => {
            let mut lines = vec![format!("warning: {} broken link(s) in index", links.len())];
            lines.extend(links.iter().map(|l| format!("{}{}", indent(1), l)));
            lines
        }
    }
}

/// Running totals of a build, fed one event at a time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub exported: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, event: &BuildEvent) {
        match event {
            BuildEvent::Exported { .. } => self.exported += 1,
            BuildEvent::ExportFailed { .. } => self.failed += 1,
            _ => {}
        }
    }
}

/// One-line build summary.
pub fn format_summary(tally: &Tally) -> String {
    match tally.failed {
        0 => format!("Exported {} notebook(s)", tally.exported),
        n => format!("Exported {} notebook(s), {} failed", tally.exported, n),
    }
}

/// Format discovered sources, grouped by kind.
pub fn format_discovery(sources: &Sources) -> Vec<String> {
    let mut lines = Vec::new();
    for kind in [Kind::Notebook, Kind::NotebookWasm, Kind::App] {
        let notebooks = sources.get(kind);
        if notebooks.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{} ({})", kind.label(), notebooks.len()));
        for (i, nb) in notebooks.iter().enumerate() {
            lines.push(format!(
                "{}{} {}",
                indent(1),
                format_index(i + 1),
                nb.display_name()
            ));
            lines.push(format!("{}Source: {}", indent(2), nb.path().display()));
        }
    }
    if lines.is_empty() {
        lines.push("No notebooks or apps found".to_string());
    }
    lines
}

/// Print discovered sources to stdout.
pub fn print_discovery(sources: &Sources) {
    for line in format_discovery(sources) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::notebook;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
    }

    #[test]
    fn discovered_line() {
        let lines = format_event(&BuildEvent::Discovered {
            kind: Kind::App,
            root: PathBuf::from("apps"),
            count: 3,
        });
        assert_eq!(lines, vec!["Apps: 3 found in apps/"]);
    }

    #[test]
    fn exported_line() {
        let lines = format_event(&BuildEvent::Exported {
            kind: Kind::Notebook,
            display_name: "monte carlo".into(),
            html_path: "notebooks/monte_carlo.html".into(),
        });
        assert_eq!(lines, vec!["    monte carlo → notebooks/monte_carlo.html"]);
    }

    #[test]
    fn failure_shows_each_error_line_indented() {
        let lines = format_event(&BuildEvent::ExportFailed {
            kind: Kind::Notebook,
            source: PathBuf::from("notebooks/penguins.py"),
            error: "Converter exited with status 1: Traceback\n\nValueError: boom".into(),
        });
        assert_eq!(
            lines,
            vec![
                "    error: notebooks/penguins.py",
                "        Converter exited with status 1: Traceback",
                "        ValueError: boom",
            ]
        );
    }

    #[test]
    fn nothing_found_is_warning() {
        let lines = format_event(&BuildEvent::NothingFound);
        assert_eq!(lines, vec!["warning: No notebooks or apps found!"]);
    }

    #[test]
    fn broken_links_listed() {
        let lines = format_event(&BuildEvent::BrokenLinks {
            links: vec!["apps/x.html".into()],
        });
        assert_eq!(lines[0], "warning: 1 broken link(s) in index");
        assert_eq!(lines[1], "    apps/x.html");
    }

    #[test]
    fn tally_counts_outcomes() {
        let mut tally = Tally::default();
        tally.record(&BuildEvent::NothingFound);
        tally.record(&BuildEvent::Exported {
            kind: Kind::App,
            display_name: "a".into(),
            html_path: "apps/a.html".into(),
        });
        tally.record(&BuildEvent::ExportFailed {
            kind: Kind::App,
            source: PathBuf::from("b.py"),
            error: "x".into(),
        });
        assert_eq!(
            tally,
            Tally {
                exported: 1,
                failed: 1
            }
        );
        assert_eq!(format_summary(&tally), "Exported 1 notebook(s), 1 failed");
    }

    #[test]
    fn discovery_groups_by_kind() {
        let tmp = TempDir::new().unwrap();
        let sources = Sources {
            notebooks: vec![notebook(tmp.path(), "nb/fibonacci.py", Kind::Notebook)],
            apps: vec![notebook(tmp.path(), "apps/my_app.py", Kind::App)],
            notebooks_wasm: Vec::new(),
        };

        let lines = format_discovery(&sources);
        assert_eq!(lines[0], "Notebooks (1)");
        assert_eq!(lines[1], "    001 fibonacci");
        assert!(lines[2].starts_with("        Source: "));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Apps (1)");
        assert_eq!(lines[5], "    001 my app");
    }

    #[test]
    fn discovery_empty() {
        assert_eq!(
            format_discovery(&Sources::default()),
            vec!["No notebooks or apps found"]
        );
    }
}
