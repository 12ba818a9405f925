//! Error types for backend calls
//!
//! A call fails in one of three places:
//! - Transport: the request never produced a response
//! - Status: a non-success HTTP status came back
//! - Rejected: HTTP succeeded but the envelope said `success: false`

/// Errors from talking to the backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Request could not be sent or the response could not be read
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status {
        /// Status code
        status: u16,
        /// Server message, or the canonical reason phrase
        message: String,
    },

    /// Envelope reported `success: false`
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// Envelope succeeded but carried no `data`
    #[error("response carried no data")]
    MissingData,

    /// Body was not the expected envelope
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Endpoint URL could not be built
    #[error("invalid endpoint url: {0}")]
    Url(String),

    /// Local file could not be read for upload
    #[error("io error reading {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    /// Create status error
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP status, when the server answered with one
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message fit for a user-facing notification
    ///
    /// Server-supplied messages are passed through verbatim.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) => message.clone(),
            Self::Status { status, message } => format!("{message} (HTTP {status})"),
            other => other.to_string(),
        }
    }

    /// Whether the failure happened before any response was received
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result type alias for backend calls
pub type BackendResult<T> = Result<T, BackendError>;
