/// Errors from the cluster REST client.
use serde_json::Value;
use thiserror::Error;

/// Typed errors from the client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The cluster answered with a non-success status.
    #[error("HTTP {status}: {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Reason extracted from the `{error: {reason}}` body.
        reason: String,
    },

    /// The request never completed (connection refused, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The body claimed to be JSON but did not decode.
    #[error("Invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Build a `Status` error from a raw response body.
    #[must_use]
    pub fn from_body(status: u16, body: &str) -> Self {
        let reason = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| error_reason(&json))
            .unwrap_or_else(|| body.trim().to_owned());
        Self::Status { status, reason }
    }

    /// HTTP status, if the cluster answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Decode(_) => None,
        }
    }

    /// Human-readable reason without the status prefix.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Status { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

/// Pull the reason out of an error body.
///
/// Looks at `error.reason`, then `error.root_cause[0].reason`, then a plain
/// string `error`.
#[must_use]
pub fn error_reason(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    if let Some(text) = error.as_str() {
        return Some(text.to_owned());
    }
    error
        .get("reason")
        .and_then(Value::as_str)
        .or_else(|| {
            error
                .get("root_cause")
                .and_then(|causes| causes.get(0))
                .and_then(|cause| cause.get("reason"))
                .and_then(Value::as_str)
        })
        .map(str::to_owned)
}
