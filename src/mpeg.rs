// MPEG audio frame headers and duration estimation
//
// Only what is needed to estimate how long a clip plays: the first frame header after
// the ID3v2 tag, and a Xing/Info header when an encoder wrote one.

use std::time::Duration;

use crate::id3::{has_id3v1, v1, Id3v2Header};
use crate::utils::io::{be_u32_at, has_signature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V2_5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    I,
    II,
    III,
}

/// Decoded 4-byte MPEG audio frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub mono: bool,
}

const BITRATES_V1_L1: [u32; 14] = [32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448];
const BITRATES_V1_L2: [u32; 14] = [32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384];
const BITRATES_V1_L3: [u32; 14] = [32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const BITRATES_V2_L1: [u32; 14] = [32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256];
const BITRATES_V2_L23: [u32; 14] = [8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

/// How far past the tag to look for the first frame
const SYNC_SEARCH_LIMIT: usize = 64 * 1024;

impl FrameHeader {
    /// Parse a frame header from 4 bytes. Reserved or free-format values are rejected.
    pub fn parse(bytes: [u8; 4]) -> Option<Self> {
        if bytes[0] != 0xFF || bytes[1] & 0xE0 != 0xE0 {
            return None;
        }

        let version = match (bytes[1] >> 3) & 0x03 {
            0 => MpegVersion::V2_5,
            2 => MpegVersion::V2,
            3 => MpegVersion::V1,
            _ => return None,
        };
        let layer = match (bytes[1] >> 1) & 0x03 {
            1 => Layer::III,
            2 => Layer::II,
            3 => Layer::I,
            _ => return None,
        };

        let bitrate_index = (bytes[2] >> 4) as usize;
        if bitrate_index == 0 || bitrate_index == 15 {
            return None;
        }
        let table = match (version, layer) {
            (MpegVersion::V1, Layer::I) => &BITRATES_V1_L1,
            (MpegVersion::V1, Layer::II) => &BITRATES_V1_L2,
            (MpegVersion::V1, Layer::III) => &BITRATES_V1_L3,
            (_, Layer::I) => &BITRATES_V2_L1,
            (_, _) => &BITRATES_V2_L23,
        };

        let base_rate = match (bytes[2] >> 2) & 0x03 {
            0 => 44100,
            1 => 48000,
            2 => 32000,
            _ => return None,
        };
        let sample_rate = match version {
            MpegVersion::V1 => base_rate,
            MpegVersion::V2 => base_rate / 2,
            MpegVersion::V2_5 => base_rate / 4,
        };

        Some(FrameHeader {
            version,
            layer,
            bitrate_kbps: table[bitrate_index - 1],
            sample_rate,
            mono: (bytes[3] >> 6) == 3,
        })
    }

    pub fn samples_per_frame(&self) -> u32 {
        match (self.layer, self.version) {
            (Layer::I, _) => 384,
            (Layer::II, _) => 1152,
            (Layer::III, MpegVersion::V1) => 1152,
            (Layer::III, _) => 576,
        }
    }

    /// Offset of a Xing/Info header from the frame start (Layer III side info size + 4)
    fn xing_offset(&self) -> usize {
        match (self.version, self.mono) {
            (MpegVersion::V1, false) => 36,
            (MpegVersion::V1, true) => 21,
            (_, false) => 21,
            (_, true) => 13,
        }
    }
}

/// Find the first frame header at or after `start`
fn find_frame(buffer: &[u8], start: usize) -> Option<(usize, FrameHeader)> {
    let limit = start.saturating_add(SYNC_SEARCH_LIMIT).min(buffer.len());
    (start..limit).find_map(|pos| {
        let bytes = buffer.get(pos..pos + 4)?;
        FrameHeader::parse([bytes[0], bytes[1], bytes[2], bytes[3]]).map(|header| (pos, header))
    })
}

/// Frame count from a Xing/Info header, when present and carrying one
fn xing_frames(buffer: &[u8], frame_start: usize, header: &FrameHeader) -> Option<u32> {
    let offset = frame_start + header.xing_offset();
    if !has_signature(buffer, offset, b"Xing") && !has_signature(buffer, offset, b"Info") {
        return None;
    }
    let flags = be_u32_at(buffer, offset + 4)?;
    if flags & 0x01 == 0 {
        return None;
    }
    be_u32_at(buffer, offset + 8).filter(|&frames| frames > 0)
}

/// Estimate the playing time of an MP3 buffer.
///
/// Uses the Xing/Info frame count when available, otherwise assumes a constant bitrate
/// over the audio bytes between the tags.
pub fn estimate_duration(buffer: &[u8]) -> Option<Duration> {
    let audio_start = Id3v2Header::parse(buffer).map_or(0, |header| header.tag_end());
    let audio_end = if has_id3v1(buffer) {
        buffer.len() - v1::TAG_SIZE
    } else {
        buffer.len()
    };
    if audio_start >= audio_end {
        return None;
    }

    let (frame_start, header) = find_frame(&buffer[..audio_end], audio_start)?;

    if let Some(frames) = xing_frames(buffer, frame_start, &header) {
        let samples = frames as f64 * header.samples_per_frame() as f64;
        return Some(Duration::from_secs_f64(samples / header.sample_rate as f64));
    }

    let audio_bytes = (audio_end - frame_start) as f64;
    let seconds = audio_bytes * 8.0 / (header.bitrate_kbps as f64 * 1000.0);
    log::trace!(
        "{:?} {:?} at {} kbps, {} Hz: ~{:.2}s",
        header.version,
        header.layer,
        header.bitrate_kbps,
        header.sample_rate,
        seconds
    );
    Some(Duration::from_secs_f64(seconds))
}
