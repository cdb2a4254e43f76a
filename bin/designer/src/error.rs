//! Errors surfaced by CLI commands.

use plantops_workflow::DocumentError;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config(config::ConfigError),
    /// The workflow file could not be read.
    Read { path: PathBuf, source: std::io::Error },
    /// The workflow file is not a usable workflow document.
    Document { path: PathBuf, source: DocumentError },
    /// Output could not be encoded.
    Encode(serde_json::Error),
    /// Text output could not be written.
    Format(fmt::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "failed to load configuration: {e}"),
            Self::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::Document { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Encode(e) => write!(f, "failed to encode output: {e}"),
            Self::Format(e) => write!(f, "failed to format output: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Read { source, .. } => Some(source),
            Self::Document { source, .. } => Some(source),
            Self::Encode(e) => Some(e),
            Self::Format(e) => Some(e),
        }
    }
}

impl From<config::ConfigError> for CliError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e)
    }
}
