// Reader and lookup configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Parser switches for behaviour that differs between taggers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Use `USLT` as the comment when no `COMM` frame exists
    pub consult_uslt: bool,
    /// Re-read a full ID3v1 comment field as a printable-ASCII run
    pub probe_extended_v1_comment: bool,
    /// Enable the byte-swap and manual UTF-16 comment recovery steps
    pub utf16_heuristics: bool,
    /// Read ID3v2.4 frame sizes as synchsafe integers
    pub v24_synchsafe_frames: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            consult_uslt: true,
            probe_extended_v1_comment: true,
            utf16_heuristics: false,
            v24_synchsafe_frames: true,
        }
    }
}

/// Text shown when neither a tag nor the known-metadata table has a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    pub title: String,
    pub comment: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            title: "Unbekannt".to_string(),
            comment: "Kein Kommentar".to_string(),
        }
    }
}

/// Settings for a sound lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Fetch timeout in seconds
    pub timeout_secs: u64,
    pub reader: ReaderOptions,
    pub placeholders: Placeholders,
}

impl LookupConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            reader: ReaderOptions::default(),
            placeholders: Placeholders::default(),
        }
    }
}
