//! Workflow configuration
//!
//! Loaded from TOML, then overridden from the environment and the command
//! line. Every field has a default, so an empty file is a valid config.

use docpipe_client::Url;
use docpipe_openapi::VersionRequirement;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`WorkflowConfig::base_url`]
pub const BASE_URL_ENV: &str = "DOCPIPE_BASE_URL";

/// Default upload limit: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create invalid-value error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Ingestion workflow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Backend base URL; endpoints resolve under `<base>/api/docs/`
    pub base_url: String,
    /// Largest accepted upload
    pub max_upload_bytes: u64,
    /// Accepted file extensions, compared case-insensitively
    pub allowed_extensions: Vec<String>,
    /// Required `major.minor` of the document version marker
    pub required_version: VersionRequirement,
    /// Hosts whose pages go through the backend extraction endpoint;
    /// subdomains match too
    pub third_party_hosts: Vec<String>,
    /// Substitute demo data when the backend fails
    pub demo_mode: bool,
    /// Where the last parsed description is written; `None` disables it
    pub snapshot_path: Option<PathBuf>,
    /// Lifetime of a notification
    pub notification_ttl_ms: u64,
    /// Reject stages whose prerequisite has not been reached
    pub enforce_stage_order: bool,
    /// Per-request timeout; `None` keeps the HTTP client default
    pub request_timeout_secs: Option<u64>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: vec!["json".to_string(), "yaml".to_string(), "yml".to_string()],
            required_version: VersionRequirement::default(),
            third_party_hosts: vec!["feishu.cn".to_string(), "larksuite.com".to_string()],
            demo_mode: false,
            snapshot_path: None,
            notification_ttl_ms: 3000,
            enforce_stage_order: false,
            request_timeout_secs: None,
        }
    }
}

impl WorkflowConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// [`ConfigError::Toml`] on syntax or type errors.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if unreadable, [`ConfigError::Toml`] if malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| ConfigError::invalid(format!("base_url '{}': {e}", self.base_url)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(format!(
                "base_url '{}': scheme must be http or https",
                self.base_url
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::invalid("max_upload_bytes must be positive"));
        }
        if self.allowed_extensions.iter().all(|e| normalize_extension(e).is_empty()) {
            return Err(ConfigError::invalid("allowed_extensions must not be empty"));
        }
        if self.notification_ttl_ms == 0 {
            return Err(ConfigError::invalid("notification_ttl_ms must be positive"));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::invalid("request_timeout_secs must be positive"));
        }
        Ok(())
    }

    /// With backend base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With upload limit
    #[inline]
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// With required version
    #[inline]
    #[must_use]
    pub fn with_required_version(mut self, requirement: VersionRequirement) -> Self {
        self.required_version = requirement;
        self
    }

    /// With third-party documentation hosts
    #[must_use]
    pub fn with_third_party_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.third_party_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// With demo fallback
    #[inline]
    #[must_use]
    pub fn with_demo_mode(mut self, enabled: bool) -> Self {
        self.demo_mode = enabled;
        self
    }

    /// With snapshot file
    #[inline]
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// With strict stage ordering
    #[inline]
    #[must_use]
    pub fn with_enforce_stage_order(mut self, enforce: bool) -> Self {
        self.enforce_stage_order = enforce;
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Notification lifetime
    #[inline]
    #[must_use]
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    /// Request timeout, if configured
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Whether `ext` (with or without leading dot) is accepted
    #[must_use]
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        let ext = normalize_extension(ext);
        !ext.is_empty()
            && self
                .allowed_extensions
                .iter()
                .any(|allowed| normalize_extension(allowed) == ext)
    }

    /// Allowed extensions rendered for messages: `.json, .yaml, .yml`
    #[must_use]
    pub fn allowed_extensions_display(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(|e| format!(".{}", normalize_extension(e)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether `host` is a third-party documentation host or a subdomain of one
    #[must_use]
    pub fn is_third_party_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.third_party_hosts.iter().any(|configured| {
            let configured = configured.trim_end_matches('.').to_ascii_lowercase();
            host == configured
                || host
                    .strip_suffix(&configured)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = WorkflowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.required_version.to_string(), "3.0");
        assert_eq!(config.notification_ttl(), Duration::from_secs(3));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = WorkflowConfig::from_toml_str(
            r#"
            base_url = "https://tests.example.com"
            required_version = "3.1"
            enforce_stage_order = true
            request_timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://tests.example.com");
        assert_eq!(config.required_version, VersionRequirement::new(3, 1));
        assert!(config.enforce_stage_order);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(!config.demo_mode);
    }

    #[test]
    fn malformed_version_requirement_is_a_toml_error() {
        let err = WorkflowConfig::from_toml_str(r#"required_version = "three""#).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = WorkflowConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let path = dir.path().join("docpipe.toml");
        std::fs::write(&path, "demo_mode = true\n").unwrap();
        assert!(WorkflowConfig::load(&path).unwrap().demo_mode);
    }

    #[test]
    fn env_overrides_base_url() {
        let config = WorkflowConfig::default().apply_env_with(|key| {
            (key == BASE_URL_ENV).then(|| " http://backend:9000 ".to_string())
        });
        assert_eq!(config.base_url, "http://backend:9000");

        let untouched = WorkflowConfig::default().apply_env_with(|_| Some(String::new()));
        assert_eq!(untouched.base_url, "http://localhost:8000");
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(WorkflowConfig::default().with_base_url("not a url").validate().is_err());
        assert!(WorkflowConfig::default().with_base_url("ftp://host").validate().is_err());
        assert!(WorkflowConfig::default().with_max_upload_bytes(0).validate().is_err());

        let mut config = WorkflowConfig::default();
        config.allowed_extensions = vec![".".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn extension_checks_are_case_insensitive() {
        let config = WorkflowConfig::default();
        assert!(config.is_allowed_extension("JSON"));
        assert!(config.is_allowed_extension(".Yml"));
        assert!(!config.is_allowed_extension("txt"));
        assert!(!config.is_allowed_extension(""));
        assert_eq!(config.allowed_extensions_display(), ".json, .yaml, .yml");
    }

    #[test]
    fn third_party_hosts_match_subdomains() {
        let config = WorkflowConfig::default();
        assert!(config.is_third_party_host("feishu.cn"));
        assert!(config.is_third_party_host("docs.Feishu.cn"));
        assert!(config.is_third_party_host("open.larksuite.com."));
        assert!(!config.is_third_party_host("notfeishu.cn"));
        assert!(!config.is_third_party_host("example.com"));
    }
}
