// Sound file sources
//
// A source turns a request number into the raw bytes of `sounds/<NNN>.mp3`. Fetch
// failures surface as `Error`; the bytes themselves are parsed elsewhere.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Soundboard request number, shown and stored zero-padded to three digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundNumber(u16);

impl SoundNumber {
    pub const MAX_DIGITS: usize = 3;

    /// Parse 1 to 3 ASCII digits
    pub fn parse(input: &str) -> Result<Self> {
        let digits = input.trim();
        if digits.is_empty()
            || digits.len() > Self::MAX_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::InvalidNumber(input.to_string()));
        }
        digits
            .parse()
            .map(SoundNumber)
            .map_err(|_| Error::InvalidNumber(input.to_string()))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    /// `"007"`
    pub fn padded(self) -> String {
        format!("{:03}", self.0)
    }

    /// `"007.mp3"`
    pub fn file_name(self) -> String {
        format!("{}.mp3", self.padded())
    }

    /// `"sounds/007.mp3"`
    pub fn path(self) -> String {
        format!("sounds/{}", self.file_name())
    }
}

impl FromStr for SoundNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SoundNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.padded())
    }
}

/// Anything that can produce the bytes of a numbered sound file
pub trait SoundSource {
    fn fetch(&self, number: SoundNumber) -> Result<Vec<u8>>;

    /// Human-readable location of a sound, for messages
    fn locate(&self, number: SoundNumber) -> String;
}

/// Sounds under a local board directory (`<root>/sounds/<NNN>.mp3`)
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, number: SoundNumber) -> PathBuf {
        self.root.join("sounds").join(number.file_name())
    }
}

impl SoundSource for FileSource {
    fn fetch(&self, number: SoundNumber) -> Result<Vec<u8>> {
        let path = self.file_path(number);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            _ => Error::IoError(e),
        })
    }

    fn locate(&self, number: SoundNumber) -> String {
        self.file_path(number).display().to_string()
    }
}

/// Upper bound on a downloaded sound file
const MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Read a whole response body, failing instead of truncating past `limit` bytes
fn read_limited(reader: impl Read, limit: u64, url: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| Error::Transport(format!("{}: {}", url, e)))?;
    if bytes.len() as u64 > limit {
        return Err(Error::Transport(format!(
            "{}: larger than {} bytes",
            url, limit
        )));
    }
    Ok(bytes)
}

/// Create an HTTP agent with a single overall timeout
pub fn create_http_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(concat!("soundtag/", env!("CARGO_PKG_VERSION")))
        .redirects(5)
        .build()
}

/// Sounds served over HTTP (`<base_url>/sounds/<NNN>.mp3`)
pub struct HttpSource {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            agent: create_http_agent(timeout),
        }
    }

    fn url(&self, number: SoundNumber) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), number.path())
    }
}

impl SoundSource for HttpSource {
    fn fetch(&self, number: SoundNumber) -> Result<Vec<u8>> {
        let url = self.url(number);
        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Err(Error::NotFound(url)),
            Err(ureq::Error::Status(code, _)) => return Err(Error::Status { url, code }),
            Err(ureq::Error::Transport(transport)) => {
                return Err(Error::Transport(format!("{}: {}", url, transport)))
            }
        };

        let bytes = read_limited(response.into_reader(), MAX_FILE_SIZE, &url)?;
        log::debug!("fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }

    fn locate(&self, number: SoundNumber) -> String {
        self.url(number)
    }
}
