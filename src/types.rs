/// Shared output types for all commands.
///
/// A command returns an [`Outcome`]; `main` renders it once, or renders an
/// [`ErrorOutput`] when the command failed.
use serde::{Deserialize, Serialize};

use crate::errors::CliError;
use crate::format::{RecordResult, TableResult};

/// The result of one successful command invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Side effect only, nothing to print.
    Done,
    /// Side effect with a short confirmation.
    Success(String),
    /// Free-form text, printed as-is.
    Text(String),
    Table(TableResult),
    Record(RecordResult),
}

/// A structured error envelope for JSON error output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
    /// Always `false`.
    pub ok: bool,
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail in the JSON error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (snake_case).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional list of candidates (for unknown or incomplete commands).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<String>>,
}

impl ErrorOutput {
    /// Construct from a `CliError`.
    #[must_use]
    pub fn from_cli_error(err: &CliError) -> Self {
        let (code, candidates) = match err {
            CliError::Usage(_) => ("usage_error", None),
            CliError::UnknownCommand { candidates, .. } => {
                ("unknown_command", Some(candidates.clone()))
            }
            CliError::Transport { .. } => ("transport_error", None),
            CliError::NotFound { .. } => ("not_found", None),
            CliError::Format { .. } => ("format_error", None),
            CliError::Config(_) => ("config_error", None),
        };
        Self {
            ok: false,
            error: ErrorDetail {
                code: code.to_owned(),
                message: err.to_string(),
                candidates,
            },
        }
    }
}
