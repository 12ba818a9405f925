//! Testing utilities for the docpipe workspace
//!
//! Shared fixtures and an in-process stub backend.

#![allow(missing_docs)]

pub mod fixtures;
pub mod stub;

pub use fixtures::{
    filler_bytes, sample_page_html, third_party_payload, SAMPLE_API_JSON, SAMPLE_API_YAML,
    SWAGGER_V2_JSON,
};
pub use stub::{Failure, RecordedRequest, StubServer};

/// Write `content` to `dir/name` and return the path
pub fn write_file(dir: &std::path::Path, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
