// ID3v2 tag implementation
//
// The whole tag is walked over a borrowed buffer; frames keep slices into it.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::config::ReaderOptions;
use crate::utils::io::{be_u16_at, be_u32_at, has_signature, synchsafe_at};

/// ID3v2 header structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id3v2Header {
    pub version: (u8, u8),
    pub flags: u8,
    pub size: u32,
}

/// ID3v2 tag structure
#[derive(Debug)]
pub struct Id3v2Tag<'a> {
    pub header: Id3v2Header,
    pub frames: Vec<Id3Frame<'a>>,
    /// The walk stopped early on a frame or tag size that overran the available bytes
    pub truncated: bool,
}

/// ID3v2 frame structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3Frame<'a> {
    pub frame_id: String,
    pub size: u32,
    pub flags: u16,
    pub data: &'a [u8],
}

impl Id3v2Header {
    pub const HEADER_SIZE: usize = 10;
    pub const ID: [u8; 3] = [b'I', b'D', b'3'];
    const FLAG_EXTENDED_HEADER: u8 = 0x40;

    /// Parse ID3v2 header from the start of a buffer
    pub fn parse(buffer: &[u8]) -> Option<Self> {
        if !has_id3v2(buffer) {
            return None;
        }

        Some(Id3v2Header {
            version: (buffer[3], buffer[4]),
            flags: buffer[5],
            size: synchsafe_at(buffer, 6)?,
        })
    }

    /// Byte range of the tag body, clamped to the buffer
    pub fn body_range(&self, buffer_len: usize) -> Range<usize> {
        let end = Self::HEADER_SIZE.saturating_add(self.size as usize);
        Self::HEADER_SIZE..end.min(buffer_len)
    }

    /// Offset just past the declared tag, where audio data starts
    pub fn tag_end(&self) -> usize {
        Self::HEADER_SIZE.saturating_add(self.size as usize)
    }

    pub fn has_extended_header(&self) -> bool {
        self.flags & Self::FLAG_EXTENDED_HEADER != 0
    }

    fn frame_layout(&self) -> FrameLayout {
        if self.version.0 <= 2 {
            FrameLayout::V22
        } else {
            FrameLayout::V23
        }
    }
}

/// `true` iff the buffer is long enough for a header and starts with `"ID3"`
pub fn has_id3v2(buffer: &[u8]) -> bool {
    buffer.len() >= Id3v2Header::HEADER_SIZE && has_signature(buffer, 0, &Id3v2Header::ID)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameLayout {
    /// 3-byte id, 3-byte size, no flags
    V22,
    /// 4-byte id, 4-byte size, 2 flag bytes
    V23,
}

impl FrameLayout {
    fn header_size(self) -> usize {
        match self {
            FrameLayout::V22 => 6,
            FrameLayout::V23 => 10,
        }
    }
}

/// ID3v2.2 frame ids mapped onto their ID3v2.3 equivalents
const V22_FRAME_IDS: &[(&str, &str)] = &[
    ("TT1", "TIT1"),
    ("TT2", "TIT2"),
    ("TT3", "TIT3"),
    ("TP1", "TPE1"),
    ("TAL", "TALB"),
    ("TYE", "TYER"),
    ("TCO", "TCON"),
    ("COM", "COMM"),
    ("ULT", "USLT"),
];

fn upgrade_v22_id(id: &str) -> String {
    V22_FRAME_IDS
        .iter()
        .find(|(old, _)| *old == id)
        .map_or_else(|| id.to_string(), |(_, new)| new.to_string())
}

impl<'a> Id3v2Tag<'a> {
    /// Parse an ID3v2 tag from the start of a buffer.
    ///
    /// Returns `None` when no header is present. Size anomalies never fail the parse: the
    /// walk stops and the frames read so far are kept.
    pub fn parse(buffer: &'a [u8], options: &ReaderOptions) -> Option<Self> {
        let header = Id3v2Header::parse(buffer)?;
        let body = header.body_range(buffer.len());
        let mut truncated = header.tag_end() > buffer.len();
        if truncated {
            log::debug!(
                "ID3v2 tag declares {} bytes but buffer holds {}; clamping",
                header.size,
                buffer.len()
            );
        }

        let layout = header.frame_layout();
        let mut pos = body.start + Self::extended_header_len(buffer, &header);
        let mut frames = Vec::new();

        while pos.saturating_add(layout.header_size()) <= body.end {
            // zero padding fills the rest of the tag
            if buffer[pos] == 0 {
                break;
            }

            let (frame_id, size, flags) = match layout {
                FrameLayout::V22 => {
                    let id = String::from_utf8_lossy(&buffer[pos..pos + 3]).into_owned();
                    let size = (buffer[pos + 3] as u32) << 16
                        | (buffer[pos + 4] as u32) << 8
                        | buffer[pos + 5] as u32;
                    (upgrade_v22_id(&id), size, 0)
                }
                FrameLayout::V23 => {
                    let id = String::from_utf8_lossy(&buffer[pos..pos + 4]).into_owned();
                    let size = if header.version.0 >= 4 && options.v24_synchsafe_frames {
                        synchsafe_at(buffer, pos + 4)
                    } else {
                        be_u32_at(buffer, pos + 4)
                    };
                    let Some(size) = size else { break };
                    let flags = be_u16_at(buffer, pos + 8).unwrap_or(0);
                    (id, size, flags)
                }
            };

            let data_start = pos + layout.header_size();
            let data_end = data_start.saturating_add(size as usize);
            if data_end > body.end {
                log::debug!(
                    "frame {} at offset {} declares {} bytes, only {} left in tag",
                    frame_id,
                    pos,
                    size,
                    body.end - data_start
                );
                truncated = true;
                break;
            }

            log::trace!("frame {} ({} bytes) at offset {}", frame_id, size, pos);
            frames.push(Id3Frame {
                frame_id,
                size,
                flags,
                data: &buffer[data_start..data_end],
            });
            pos = data_end;
        }

        Some(Id3v2Tag {
            header,
            frames,
            truncated,
        })
    }

    /// Length of an extended header to skip before the first frame
    fn extended_header_len(buffer: &[u8], header: &Id3v2Header) -> usize {
        if !header.has_extended_header() || header.version.0 < 3 {
            return 0;
        }
        let offset = Id3v2Header::HEADER_SIZE;
        if header.version.0 >= 4 {
            // v2.4 counts the size field itself
            synchsafe_at(buffer, offset).map_or(0, |size| size as usize)
        } else {
            be_u32_at(buffer, offset).map_or(0, |size| size as usize + 4)
        }
    }

    /// First frame with the given id
    pub fn frame(&self, frame_id: &str) -> Option<&Id3Frame<'a>> {
        self.frames.iter().find(|frame| frame.frame_id == frame_id)
    }

    /// Map frame id to raw payload. The first occurrence of an id wins.
    pub fn frame_map(&self) -> BTreeMap<&str, &'a [u8]> {
        let mut map = BTreeMap::new();
        for frame in &self.frames {
            map.entry(frame.frame_id.as_str()).or_insert(frame.data);
        }
        map
    }
}

/// Parse an ID3v2 tag; `None` when the buffer carries none
pub fn parse_id3v2<'a>(buffer: &'a [u8], options: &ReaderOptions) -> Option<Id3v2Tag<'a>> {
    Id3v2Tag::parse(buffer, options)
}
