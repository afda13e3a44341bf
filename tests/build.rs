//! End-to-end builds against the real subprocess converter.
//!
//! marimo itself is replaced by a small shell script that writes a stub
//! HTML file to the `-o` target, and fails for any source whose name
//! contains `broken`.

#![cfg(unix)]

use marimushka::config::{BuildConfig, ConverterConfig, ProcessingConfig};
use marimushka::converter::MarimoConverter;
use marimushka::events::BuildEvent;
use marimushka::links::{extract_links, validate_links};
use marimushka::pipeline;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tempfile::TempDir;

const FAKE_MARIMO: &str = r#"#!/bin/sh
for last; do :; done
case "$*" in
  *broken*) echo "marimo: cell 2 raised ValueError" >&2; exit 1 ;;
esac
echo "<html><body>$*</body></html>" > "$last"
"#;

fn fake_tool(dir: &Path) -> PathBuf {
    let path = dir.join("fake-marimo.sh");
    fs::write(&path, FAKE_MARIMO).unwrap();
    path
}

fn write_source(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), "import marimo\napp = marimo.App()\n").unwrap();
}

fn config(root: &Path) -> BuildConfig {
    let tool = fake_tool(root);
    BuildConfig {
        output: root.join("_site"),
        notebooks: root.join("notebooks"),
        apps: root.join("apps"),
        notebooks_wasm: root.join("notebooks_wasm"),
        converter: ConverterConfig {
            command: vec!["sh".into(), tool.to_string_lossy().into_owned()],
            timeout_secs: 30,
        },
        processing: ProcessingConfig {
            max_processes: Some(3),
        },
        ..Default::default()
    }
}

fn build(config: &BuildConfig) -> (String, Vec<BuildEvent>) {
    let converter = MarimoConverter::from_config(&config.converter);
    let (tx, rx) = mpsc::channel();
    let html = pipeline::run(config, &converter, Some(&tx)).unwrap();
    drop(tx);
    (html, rx.iter().collect())
}

#[test]
fn every_index_link_resolves() {
    let tmp = TempDir::new().unwrap();
    write_source(&tmp.path().join("notebooks"), "fibonacci.py");
    write_source(&tmp.path().join("notebooks/stats"), "penguins.py");
    write_source(&tmp.path().join("apps"), "charts.py");
    write_source(&tmp.path().join("notebooks_wasm"), "playground.py");
    let config = config(tmp.path());

    let (html, events) = build(&config);

    let links = extract_links(&html);
    assert_eq!(
        links.internal,
        vec![
            "notebooks/fibonacci.html",
            "notebooks/penguins.html",
            "notebooks_wasm/playground.html",
            "apps/charts.html",
        ]
    );
    assert!(validate_links(&html, &config.output).is_empty());
    assert!(config.output.join("index.html").is_file());
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, BuildEvent::ExportFailed { .. }))
    );
}

#[test]
fn each_kind_gets_its_export_mode() {
    let tmp = TempDir::new().unwrap();
    write_source(&tmp.path().join("notebooks"), "a.py");
    write_source(&tmp.path().join("apps"), "b.py");
    write_source(&tmp.path().join("notebooks_wasm"), "c.py");
    let config = config(tmp.path());

    build(&config);

    // The fake tool echoes its arguments into the output file.
    let static_html = fs::read_to_string(config.output.join("notebooks/a.html")).unwrap();
    assert!(static_html.contains("export html --sandbox"));

    let app = fs::read_to_string(config.output.join("apps/b.html")).unwrap();
    assert!(app.contains("export html-wasm --sandbox --mode run --no-show-code"));

    let wasm = fs::read_to_string(config.output.join("notebooks_wasm/c.html")).unwrap();
    assert!(wasm.contains("export html-wasm --sandbox --mode edit"));
}

#[test]
fn failed_conversion_is_reported_and_left_out() {
    let tmp = TempDir::new().unwrap();
    write_source(&tmp.path().join("notebooks"), "fibonacci.py");
    write_source(&tmp.path().join("notebooks"), "broken.py");
    let config = config(tmp.path());

    let (html, events) = build(&config);

    assert_eq!(
        extract_links(&html).internal,
        vec!["notebooks/fibonacci.html"]
    );
    assert!(!config.output.join("notebooks/broken.html").exists());

    let failure = events
        .iter()
        .find_map(|e| match e {
            BuildEvent::ExportFailed { source, error, .. } => Some((source, error)),
            _ => None,
        })
        .expect("one failure event");
    assert!(failure.0.ends_with("broken.py"));
    assert!(failure.1.contains("cell 2 raised ValueError"));
}

#[test]
fn disabled_root_produces_no_directory() {
    let tmp = TempDir::new().unwrap();
    write_source(&tmp.path().join("notebooks"), "fibonacci.py");
    write_source(&tmp.path().join("apps"), "charts.py");
    let mut config = config(tmp.path());
    config.apps = PathBuf::new();

    let (html, _) = build(&config);

    assert!(!config.output.join("apps").exists());
    assert!(
        !extract_links(&html)
            .internal
            .iter()
            .any(|l| l.starts_with("apps/"))
    );
}

#[test]
fn custom_template_is_used() {
    let tmp = TempDir::new().unwrap();
    write_source(&tmp.path().join("apps"), "charts.py");
    let template = tmp.path().join("index.html.j2");
    fs::write(
        &template,
        "<ul>{% for app in apps %}<li><a href=\"{{ app.html_path }}\">{{ app.display_name }}</a></li>{% endfor %}</ul>",
    )
    .unwrap();
    let mut config = config(tmp.path());
    config.template = template;

    let (html, _) = build(&config);

    assert!(html.starts_with("<ul><li>"));
    assert!(html.contains(">charts</a>"));
    assert_eq!(extract_links(&html).internal, vec!["apps/charts.html"]);
}

#[test]
fn missing_template_writes_no_index() {
    let tmp = TempDir::new().unwrap();
    write_source(&tmp.path().join("notebooks"), "fibonacci.py");
    let mut config = config(tmp.path());
    config.template = tmp.path().join("no-such-template.html.j2");

    let (html, events) = build(&config);

    assert_eq!(html, "");
    assert!(!config.output.join("index.html").exists());
    assert!(
        events
            .iter()
            .any(|e| matches!(e, BuildEvent::TemplateFailed { .. }))
    );
    // The notebook itself still exported.
    assert!(config.output.join("notebooks/fibonacci.html").is_file());
}
