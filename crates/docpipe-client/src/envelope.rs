//! Response envelope shared by every backend endpoint
//!
//! `{ "success": bool, "message"?: string, "data"?: T }`

use crate::error::BackendError;
use serde::{Deserialize, Serialize};

/// Structured response payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the server considers the request successful
    pub success: bool,
    /// Optional human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Optional payload
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope carrying data
    #[inline]
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Failed envelope with a message
    #[inline]
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Interpret the `success` flag
    ///
    /// # Errors
    /// [`BackendError::Rejected`] when `success` is false.
    pub fn into_result(self) -> Result<(Option<String>, Option<T>), BackendError> {
        if self.success {
            Ok((self.message, self.data))
        } else {
            Err(BackendError::Rejected(
                self.message
                    .unwrap_or_else(|| "request rejected by server".to_string()),
            ))
        }
    }
}

/// Best-effort message extraction from an error body
///
/// Falls back to `None` when the body is not an envelope or has no message.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .and_then(|env| env.message)
        .or_else(|| {
            // Some frameworks answer errors with {"detail": "..."}
            serde_json::from_str::<serde_json::Value>(body)
                .ok()?
                .get("detail")?
                .as_str()
                .map(str::to_string)
        })
}
