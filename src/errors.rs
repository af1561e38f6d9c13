/// Errors surfaced by command invocations.
use thiserror::Error;

use crate::client::ClientError;

/// Errors that can occur while resolving, parsing or running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Malformed or missing command-line arguments.
    #[error("{0}")]
    Usage(String),

    /// The command tokens did not name a registered command.
    #[error("Unknown command '{input}'")]
    UnknownCommand {
        /// The tokens as typed, space separated.
        input: String,
        /// Registered commands starting with the given tokens.
        candidates: Vec<String>,
    },

    /// The cluster answered with a non-success status or could not be reached.
    #[error("{reason}")]
    Transport {
        /// HTTP status, when the cluster answered at all.
        status: Option<u16>,
        /// Human-readable reason extracted from the response.
        reason: String,
    },

    /// The targeted resource does not exist.
    #[error("{resource} '{name}' does not exist")]
    NotFound {
        /// Resource kind (index, repository, setting, ...).
        resource: String,
        /// Name of the missing resource.
        name: String,
    },

    /// A value expected to be numeric or structured was not.
    #[error("Field '{field}' has unexpected value '{value}'")]
    Format {
        /// Source field name.
        field: String,
        /// Offending value, rendered.
        value: String,
    },

    /// Configuration could not be loaded or resolved.
    #[error("Configuration error: {0:#}")]
    Config(#[from] anyhow::Error),
}

impl CliError {
    /// Build a `NotFound` error.
    #[must_use]
    pub fn not_found(resource: &str, name: &str) -> Self {
        Self::NotFound {
            resource: resource.to_owned(),
            name: name.to_owned(),
        }
    }

    /// Return the CLI exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Transport { .. } | Self::Format { .. } => 1,
            Self::Usage(_) | Self::UnknownCommand { .. } => 2,
            Self::Config(_) => 3,
            Self::NotFound { .. } => 4,
        }
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        Self::Transport {
            status: err.status(),
            reason: capitalize(&err.reason()),
        }
    }
}

/// Map 404 responses to `CliError::NotFound` for a named resource.
pub trait NotFoundExt<T> {
    /// Convert a 404 into `NotFound { resource, name }`, any other error into `Transport`.
    ///
    /// # Errors
    ///
    /// Returns the converted error when `self` is `Err`.
    fn or_not_found(self, resource: &str, name: &str) -> Result<T, CliError>;
}

impl<T> NotFoundExt<T> for Result<T, ClientError> {
    fn or_not_found(self, resource: &str, name: &str) -> Result<T, CliError> {
        self.map_err(|err| match err.status() {
            Some(404) => CliError::not_found(resource, name),
            _ => CliError::from(err),
        })
    }
}

/// Uppercase the first character, leaving the rest untouched.
#[must_use]
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
