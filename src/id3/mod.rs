// ID3 metadata handling module
pub mod frames;
pub mod v1;
pub mod v2;

use serde::{Deserialize, Serialize};

pub use v1::{has_id3v1, parse_id3v1, Id3v1Fields, Id3v1Tag};
pub use v2::{has_id3v2, parse_id3v2, Id3Frame, Id3v2Header, Id3v2Tag};

/// Tag container found in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagContainer {
    Id3v2,
    Id3v1,
    None,
}

/// Which containers a buffer carries. ID3v2 and ID3v1 are independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detected {
    pub id3v2: bool,
    pub id3v1: bool,
}

impl Detected {
    pub fn is_empty(&self) -> bool {
        !self.id3v2 && !self.id3v1
    }

    /// The container read first: ID3v2 when present
    pub fn primary(&self) -> TagContainer {
        if self.id3v2 {
            TagContainer::Id3v2
        } else if self.id3v1 {
            TagContainer::Id3v1
        } else {
            TagContainer::None
        }
    }

    /// All detected containers in read order, or `[None]`
    pub fn containers(&self) -> Vec<TagContainer> {
        let mut found = Vec::new();
        if self.id3v2 {
            found.push(TagContainer::Id3v2);
        }
        if self.id3v1 {
            found.push(TagContainer::Id3v1);
        }
        if found.is_empty() {
            found.push(TagContainer::None);
        }
        found
    }
}

/// Inspect buffer boundaries for tag markers
pub fn detect(buffer: &[u8]) -> Detected {
    let detected = Detected {
        id3v2: has_id3v2(buffer),
        id3v1: has_id3v1(buffer),
    };
    log::debug!(
        "detected {:?} in {} byte buffer",
        detected.containers(),
        buffer.len()
    );
    detected
}
