//! Embedded document extraction from HTML pages
//!
//! Documentation portals rarely serve the raw description. The extractor
//! searches the markup for places a document is commonly embedded and
//! returns candidate texts in the order they should be tried:
//! 1. `<script type="application/json">` blocks
//! 2. `<pre>` and `<code>` blocks (tags stripped, entities decoded)
//! 3. inline `spec: { ... }` objects passed to documentation widgets

use once_cell::sync::Lazy;
use regex::Regex;

static JSON_SCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/(?:[\w.+-]*\+)?json["'][^>]*>(.*?)</script>"#)
        .expect("static regex")
});

static PRE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<pre[^>]*>(.*?)</pre>").expect("static regex"));

static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<code[^>]*>(.*?)</code>").expect("static regex"));

static INLINE_SPEC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["']?spec["']?\s*:\s*\{"#).expect("static regex"));

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex"));

/// Marker that a candidate looks like an API description at all
const DOCUMENT_HINTS: &[&str] = &["openapi", "swagger"];

/// How a fetched body should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// JSON or YAML served directly
    Structured,
    /// Anything else (HTML, plain text, unknown)
    Markup,
}

impl ContentKind {
    /// Classify a `Content-Type` header value
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(raw) = content_type else {
            return Self::Markup;
        };
        let mime = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let structured = mime == "application/json"
            || mime.ends_with("+json")
            || matches!(
                mime.as_str(),
                "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml"
            )
            || mime.ends_with("+yaml");

        if structured {
            Self::Structured
        } else {
            Self::Markup
        }
    }
}

/// Collect candidate document texts embedded in `markup`
#[must_use]
pub fn embedded_candidates(markup: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    for caps in JSON_SCRIPT.captures_iter(markup) {
        push_candidate(&mut candidates, caps[1].trim().to_string());
    }

    for pattern in [&*PRE_BLOCK, &*CODE_BLOCK] {
        for caps in pattern.captures_iter(markup) {
            let text = decode_entities(&TAG.replace_all(&caps[1], ""));
            push_candidate(&mut candidates, text.trim().to_string());
        }
    }

    for m in INLINE_SPEC.find_iter(markup) {
        // The match ends just past the opening brace
        let open = m.end() - 1;
        if let Some(object) = balanced_object(&markup[open..]) {
            push_candidate(&mut candidates, object.to_string());
        }
    }

    tracing::debug!(count = candidates.len(), "embedded document candidates");
    candidates
}

fn push_candidate(candidates: &mut Vec<String>, text: String) {
    let lowered = text.to_ascii_lowercase();
    if DOCUMENT_HINTS.iter().any(|hint| lowered.contains(hint)) && !candidates.contains(&text) {
        candidates.push(text);
    }
}

/// Slice the `{ ... }` object starting at `text[0]`, honouring string literals
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decode the handful of entities that appear in escaped code listings
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_content_types() {
        assert_eq!(ContentKind::from_content_type(Some("application/json")), ContentKind::Structured);
        assert_eq!(
            ContentKind::from_content_type(Some("application/vnd.oai.openapi+json; charset=utf-8")),
            ContentKind::Structured
        );
        assert_eq!(ContentKind::from_content_type(Some("text/yaml")), ContentKind::Structured);
        assert_eq!(ContentKind::from_content_type(Some("Application/X-YAML")), ContentKind::Structured);
        assert_eq!(ContentKind::from_content_type(Some("text/html; charset=utf-8")), ContentKind::Markup);
        assert_eq!(ContentKind::from_content_type(None), ContentKind::Markup);
    }

    #[test]
    fn extracts_json_script_block() {
        let html = r#"<html><script type="application/json">{"openapi": "3.0.0"}</script></html>"#;
        assert_eq!(embedded_candidates(html), vec![r#"{"openapi": "3.0.0"}"#.to_string()]);
    }

    #[test]
    fn extracts_and_decodes_pre_block() {
        let html = "<pre><code>openapi: 3.0.0\ninfo:\n  title: A &amp; B</code></pre>";
        let candidates = embedded_candidates(html);
        assert_eq!(candidates[0], "openapi: 3.0.0\ninfo:\n  title: A & B");
    }

    #[test]
    fn extracts_inline_spec_object() {
        let html = r#"<script>SwaggerUIBundle({ spec: {"openapi": "3.0.0", "info": {"title": "x}"}}, dom_id: '#ui' })</script>"#;
        let candidates = embedded_candidates(html);
        assert_eq!(candidates, vec![r#"{"openapi": "3.0.0", "info": {"title": "x}"}}"#.to_string()]);
    }

    #[test]
    fn ignores_blocks_without_document_hints() {
        let html = "<pre>cargo build</pre><code>let x = 1;</code>";
        assert!(embedded_candidates(html).is_empty());
    }

    #[test]
    fn unbalanced_inline_object_is_skipped() {
        assert_eq!(balanced_object("{\"a\": {"), None);
        assert_eq!(balanced_object("{}"), Some("{}"));
    }
}
