//! Link extraction and validation for a rendered index.
//!
//! Every internal link the index emits must point at a file under the
//! output root once the build finishes. [`validate_links`] checks that and
//! returns the targets that do not resolve.
//!
//! Classification of `<a href>` targets:
//! - `http://`, `https://`, `//`, `mailto:` and `#fragment` → external
//! - anything else → internal, resolved against the output root
//!
//! `<img src>` targets are collected separately and not validated.

use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

static LINK_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<(a|img)\b[^>]*?\s(href|src)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("link pattern is valid")
});

const EXTERNAL_PREFIXES: &[&str] = &["http://", "https://", "//", "mailto:", "#"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Links {
    pub internal: Vec<String>,
    pub external: Vec<String>,
    pub images: Vec<String>,
}

/// Collect link targets from `<a href>` and `<img src>`, in document order.
pub fn extract_links(html: &str) -> Links {
    let mut links = Links::default();
    for caps in LINK_ATTR.captures_iter(html) {
        let tag = caps[1].to_ascii_lowercase();
        let attr = caps[2].to_ascii_lowercase();
        let raw = caps
            .get(3)
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let target = decode_entities(raw);

        match (tag.as_str(), attr.as_str()) {
            ("a", "href") if is_external(&target) => links.external.push(target),
            ("a", "href") => links.internal.push(target),
            ("img", "src") => links.images.push(target),
            _ => {}
        }
    }
    links
}

fn is_external(target: &str) -> bool {
    EXTERNAL_PREFIXES.iter().any(|p| target.starts_with(p))
}

/// Undo the entity escaping template engines apply to attribute values.
fn decode_entities(value: &str) -> String {
    value
        .replace("&#x2f;", "/")
        .replace("&#x2F;", "/")
        .replace("&#47;", "/")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Internal links whose target does not exist under `output_dir`.
///
/// Query strings and fragments are ignored, percent-escapes are decoded,
/// and a leading `/` is treated as relative to `output_dir`.
pub fn validate_internal_links(links: &[String], output_dir: &Path) -> BTreeSet<String> {
    links
        .iter()
        .filter(|link| {
            let path = link
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .trim_start_matches('/');
            let path = percent_decode_str(path).decode_utf8_lossy();
            !path.is_empty() && !output_dir.join(&*path).exists()
        })
        .cloned()
        .collect()
}

/// Broken internal links in `html`, resolved against `output_dir`.
pub fn validate_links(html: &str, output_dir: &Path) -> BTreeSet<String> {
    validate_internal_links(&extract_links(html).internal, output_dir)
}
