//! Progress events emitted while a build runs.
//!
//! Components never print. They take an optional [`Sender`] and report what
//! happened; the binary owns the receiver and formats events with
//! [`crate::output::format_event`]. Library callers pass `None` to stay silent.

use crate::kind::Kind;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    /// Discovery finished for one source root.
    Discovered {
        kind: Kind,
        root: PathBuf,
        count: usize,
    },
    /// All roots were empty; the build stops without writing anything.
    NothingFound,
    Exported {
        kind: Kind,
        display_name: String,
        html_path: String,
    },
    ExportFailed {
        kind: Kind,
        source: PathBuf,
        error: String,
    },
    IndexWritten {
        path: PathBuf,
    },
    IndexWriteFailed {
        path: PathBuf,
        error: String,
    },
    TemplateFailed {
        template: String,
        error: String,
    },
    /// Internal links in the written index that do not resolve.
    BrokenLinks {
        links: Vec<String>,
    },
}

pub type EventSink<'a> = Option<&'a Sender<BuildEvent>>;

pub(crate) fn emit(events: EventSink<'_>, event: BuildEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening.
        let _ = tx.send(event);
    }
}
