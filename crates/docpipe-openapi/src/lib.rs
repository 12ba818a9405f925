//! docpipe OpenAPI layer
//!
//! Client-side parsing of API description documents. Everything here is
//! pure: callers hand in text, get back a [`ParsedApiDescription`] or a
//! [`DocumentError`].
//!
//! # Parsing order
//!
//! ```text
//! raw text ─→ JSON ─┬─→ mapping ─→ version check ─→ ParsedApiDescription
//!                   └─→ YAML ──┘
//! HTML page ─→ embedded candidates (script / pre / code / inline spec) ─→ raw text
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use docpipe_openapi::{parse_raw_text, VersionRequirement};
//!
//! let desc = parse_raw_text("openapi: 3.0.1\ninfo:\n  title: Sample API\n", &VersionRequirement::default())?;
//! assert_eq!(desc.title, "Sample API");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod description;
pub mod error;
pub mod extract;
pub mod parsers;
pub mod version;

pub use description::{Endpoint, ModelDescription, ParsedApiDescription};
pub use error::{DocumentError, DocumentResult};
pub use extract::{embedded_candidates, ContentKind};
pub use parsers::{DocumentParser, JsonParser, ParserChain, SourceFormat, YamlParser};
pub use version::{version_marker, VersionRequirement};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse raw document text
///
/// JSON is attempted first, YAML second. The resulting mapping must carry a
/// version marker satisfying `requirement`.
///
/// # Errors
/// - [`DocumentError::Format`] when neither format yields a mapping
/// - [`DocumentError::Version`] when the version marker is unsupported
pub fn parse_raw_text(text: &str, requirement: &VersionRequirement) -> DocumentResult<ParsedApiDescription> {
    let (document, format) = ParserChain::default().parse(text)?;
    tracing::debug!(?format, "raw text parsed");
    ParsedApiDescription::from_document(&document, requirement)
}

/// Parse a document embedded somewhere in an HTML page
///
/// Each embedded candidate is tried in order; if none yields a description
/// the whole body is parsed as raw text. A version mismatch seen on any
/// candidate takes precedence over the body's own format failure, since it
/// shows a document was found.
///
/// # Errors
/// As [`parse_raw_text`].
pub fn parse_markup(markup: &str, requirement: &VersionRequirement) -> DocumentResult<ParsedApiDescription> {
    let mut version_failure = None;

    for candidate in embedded_candidates(markup) {
        match parse_raw_text(&candidate, requirement) {
            Ok(desc) => return Ok(desc),
            Err(e @ DocumentError::Version { .. }) => {
                version_failure.get_or_insert(e);
            }
            Err(e) => tracing::debug!(error = %e, "embedded candidate rejected"),
        }
    }

    match parse_raw_text(markup, requirement) {
        Ok(desc) => Ok(desc),
        Err(e @ DocumentError::Version { .. }) => Err(e),
        Err(e) => Err(version_failure.unwrap_or(e)),
    }
}

/// Parse a fetched response body according to its content type
///
/// # Errors
/// As [`parse_raw_text`].
pub fn parse_fetched(
    body: &str,
    content_type: Option<&str>,
    requirement: &VersionRequirement,
) -> DocumentResult<ParsedApiDescription> {
    match ContentKind::from_content_type(content_type) {
        ContentKind::Structured => parse_raw_text(body, requirement),
        ContentKind::Markup => parse_markup(body, requirement),
    }
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with API descriptions
    pub use crate::{
        parse_fetched, parse_markup, parse_raw_text, DocumentError, Endpoint, ParsedApiDescription,
        VersionRequirement,
    };
}
