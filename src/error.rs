// Error types for sound lookups
//
// Only loading a file can fail. Missing or malformed tags are never errors; they produce
// an empty or partial `TagRecord` instead.

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Request number is not 1 to 3 decimal digits
    InvalidNumber(String),
    /// The sound file does not exist at the source
    NotFound(String),
    /// Server answered with a non-success status
    Status { url: String, code: u16 },
    /// Connection failure or timeout
    Transport(String),
    IoError(std::io::Error),
    /// Known-metadata table or config could not be parsed
    ParseError(String),
}

impl Error {
    /// `true` for every "could not load file" outcome
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::Status { .. } | Error::Transport(_) | Error::IoError(_)
        )
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidNumber(input) => write!(f, "Invalid sound number: {:?}", input),
            Error::NotFound(path) => write!(f, "Sound file not found: {}", path),
            Error::Status { url, code } => write!(f, "HTTP {} for {}", code, url),
            Error::Transport(msg) => write!(f, "Could not load file: {}", msg),
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ParseError(e.to_string())
    }
}
