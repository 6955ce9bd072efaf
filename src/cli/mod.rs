// CLI module for soundtag
//
// Only compiled into the binary. Commands print through `OutputFormatter`; failures are
// collected as `CliError` and reported by `main`.

pub mod commands;
pub mod config;
pub mod output;

pub use commands::run;
pub use config::{Commands, Config};
pub use output::OutputFormat;

// Error type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    FileNotFound(String),
    IoError(std::io::Error),
    ParseError(String),
    Lookup(soundtag::Error),
    Other(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::FileNotFound(path) => write!(f, "File not found: {}", path),
            CliError::IoError(e) => write!(f, "I/O error: {}", e),
            CliError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            CliError::Lookup(e) => write!(f, "{}", e),
            CliError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::IoError(e) => Some(e),
            CliError::Lookup(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::IoError(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::ParseError(e.to_string())
    }
}

impl From<soundtag::Error> for CliError {
    fn from(e: soundtag::Error) -> Self {
        CliError::Lookup(e)
    }
}
