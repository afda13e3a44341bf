//! # Marimushka
//!
//! Exports a directory of [marimo](https://marimo.io) notebooks and apps to a
//! static site. Each `*.py` source is converted to HTML by the marimo CLI,
//! and a single `index.html` links to everything that exported cleanly.
//!
//! # Architecture: Discover, Export, Index
//!
//! ```text
//! 1. Scan     notebooks/ apps/ notebooks_wasm/  →  Sources     (filesystem → notebooks)
//! 2. Export   Sources                           →  _site/<kind>/*.html
//! 3. Index    exported notebooks                →  _site/index.html
//! ```
//!
//! Each source root maps to one [`kind::Kind`], which decides the marimo
//! export mode and the output subdirectory:
//!
//! | Root | Kind | marimo export | Output |
//! |------|------|---------------|--------|
//! | `notebooks/` | static | `export html --sandbox` | `notebooks/` |
//! | `notebooks_wasm/` | editable WASM | `export html-wasm --sandbox --mode edit` | `notebooks_wasm/` |
//! | `apps/` | run-only WASM | `export html-wasm --sandbox --mode run --no-show-code` | `apps/` |
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | The full build, wiring the stages together |
//! | [`scan`] | Recursive `*.py` discovery under one root |
//! | [`notebook`] | A validated source file plus its kind; derived names and paths |
//! | [`kind`] | The three export kinds and their marimo arguments |
//! | [`converter`] | The [`converter::Converter`] seam and the marimo subprocess backend |
//! | [`export`] | Parallel export of every notebook on a bounded thread pool |
//! | [`index`] | Jinja rendering of `index.html` (bundled or user template) |
//! | [`links`] | Extraction and validation of links in the rendered index |
//! | [`config`] | `marimushka.toml` loading, merging, and validation |
//! | [`events`] | Progress events emitted by the pipeline |
//! | [`output`] | CLI output formatting for events and discovery listings |
//!
//! # Design Decisions
//!
//! ## One Failure Never Stops the Build
//!
//! A notebook that fails to export is reported and left out of the index.
//! The remaining notebooks still export and the index is still written.
//! Only discovery errors and an unwritable output directory abort a build.
//!
//! ## Converter Behind a Trait
//!
//! The pipeline never spawns processes directly. It calls a
//! [`converter::Converter`], so tests run the whole build against a mock
//! that writes stub HTML, and the real backend is exercised with a fake
//! tool script.
//!
//! ## Events Instead of Printing
//!
//! Library code emits [`events::BuildEvent`] values over an optional channel.
//! The binary formats them with [`output`]; tests collect them and assert on
//! them directly. `tracing` carries debug diagnostics only.

pub mod config;
pub mod converter;
pub mod events;
pub mod export;
pub mod index;
pub mod kind;
pub mod links;
pub mod notebook;
pub mod output;
pub mod pipeline;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
