// ID3v1 tag implementation

use crate::config::ReaderOptions;
use crate::utils::encoding::decode_id3v1_string;
use crate::utils::io::has_signature;

/// Raw field slices of a trailing ID3v1 block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id3v1Fields<'a> {
    pub title: &'a [u8],
    pub artist: &'a [u8],
    pub album: &'a [u8],
    pub year: &'a [u8],
    pub comment: &'a [u8],
    /// Comment window for the extended probe; never covers the track or genre byte
    pub extended_comment: &'a [u8],
    pub track: Option<u8>,
    pub genre: u8,
}

/// Decoded ID3v1 tag
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Id3v1Tag {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub comment: String,
    pub track: Option<u8>,
    pub genre: u8,
}

pub const TAG_SIZE: usize = 128;
const TAG_ID: [u8; 3] = [b'T', b'A', b'G'];

const TITLE: usize = 3;
const ARTIST: usize = 33;
const ALBUM: usize = 63;
const YEAR: usize = 93;
const COMMENT: usize = 97;
const GENRE: usize = 127;
const FIELD_LEN: usize = 30;
/// Offset of the v1.1 zero byte; the track number follows it
const TRACK_MARKER: usize = 125;
/// Minimum length of a probed extended comment
const MIN_EXTENDED_COMMENT: usize = 10;

/// `true` iff the last 128 bytes of the buffer start with `"TAG"`
pub fn has_id3v1(buffer: &[u8]) -> bool {
    buffer.len() >= TAG_SIZE && has_signature(buffer, buffer.len() - TAG_SIZE, &TAG_ID)
}

/// Slice the trailing ID3v1 block into its fields
pub fn parse_id3v1(buffer: &[u8]) -> Option<Id3v1Fields<'_>> {
    if !has_id3v1(buffer) {
        return None;
    }

    let start = buffer.len() - TAG_SIZE;
    let block = &buffer[start..];

    // ID3v1.1: a zero byte before a non-zero last comment byte marks a track number
    let (comment, track) = if block[TRACK_MARKER] == 0 && block[TRACK_MARKER + 1] != 0 {
        (&block[COMMENT..TRACK_MARKER], Some(block[TRACK_MARKER + 1]))
    } else {
        (&block[COMMENT..COMMENT + FIELD_LEN], None)
    };

    Some(Id3v1Fields {
        title: &block[TITLE..TITLE + FIELD_LEN],
        artist: &block[ARTIST..ARTIST + FIELD_LEN],
        album: &block[ALBUM..ALBUM + FIELD_LEN],
        year: &block[YEAR..YEAR + 4],
        comment,
        extended_comment: comment,
        track,
        genre: block[GENRE],
    })
}

/// Leading run of printable ASCII (`0x20..=0x7E`), up to the first null or control byte
fn printable_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| (0x20..=0x7E).contains(&b))
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

impl Id3v1Tag {
    /// Read and decode the trailing ID3v1 block of a buffer
    pub fn read(buffer: &[u8], options: &ReaderOptions) -> Option<Self> {
        let fields = parse_id3v1(buffer)?;
        Some(Self::decode(&fields, options))
    }

    /// Decode sliced fields
    pub fn decode(fields: &Id3v1Fields<'_>, options: &ReaderOptions) -> Self {
        let mut comment = decode_id3v1_string(fields.comment);

        // only a comment that fills its whole field can have been cut short
        if options.probe_extended_v1_comment && !fields.comment.contains(&0) {
            let extended = printable_ascii(fields.extended_comment);
            if extended.len() >= MIN_EXTENDED_COMMENT && extended.len() > comment.len() {
                log::debug!("using extended ID3v1 comment ({} chars)", extended.len());
                comment = extended;
            }
        }

        Id3v1Tag {
            title: decode_id3v1_string(fields.title),
            artist: decode_id3v1_string(fields.artist),
            album: decode_id3v1_string(fields.album),
            year: decode_id3v1_string(fields.year),
            comment,
            track: fields.track,
            genre: fields.genre,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(title: &[u8], comment: &[u8], genre: u8) -> Vec<u8> {
        let mut block = vec![0u8; TAG_SIZE];
        block[..3].copy_from_slice(b"TAG");
        block[TITLE..TITLE + title.len()].copy_from_slice(title);
        block[ARTIST..ARTIST + 7].copy_from_slice(b"Kapelle");
        block[YEAR..YEAR + 4].copy_from_slice(b"1999");
        block[COMMENT..COMMENT + comment.len()].copy_from_slice(comment);
        block[GENRE] = genre;
        block
    }

    #[test]
    fn test_has_id3v1() {
        assert!(!has_id3v1(&[0u8; 127]));
        let mut buffer = vec![0xAAu8; 300];
        assert!(!has_id3v1(&buffer));
        buffer[172..175].copy_from_slice(b"TAG");
        assert!(has_id3v1(&buffer));
    }

    #[test]
    fn test_title_padding_stripped() {
        let buffer = block(b"Track One", b"kurz", 12);
        let tag = Id3v1Tag::read(&buffer, &ReaderOptions::default()).unwrap();
        assert_eq!(tag.title, "Track One");
        assert_eq!(tag.artist, "Kapelle");
        assert_eq!(tag.year, "1999");
        assert_eq!(tag.comment, "kurz");
        assert_eq!(tag.track, None);
        assert_eq!(tag.genre, 12);
    }

    #[test]
    fn test_v11_track() {
        let mut buffer = block(b"Titel", b"Kommentar", 0);
        buffer[126] = 7;
        let fields = parse_id3v1(&buffer).unwrap();
        assert_eq!(fields.comment.len(), 28);
        assert_eq!(fields.track, Some(7));
    }

    #[test]
    fn test_full_comment_stops_before_genre() {
        let text = b"Dieser Kommentar ist genau 30!";
        let buffer = block(b"Titel", text, 37);

        let tag = Id3v1Tag::read(&buffer, &ReaderOptions::default()).unwrap();
        assert_eq!(tag.comment, "Dieser Kommentar ist genau 30!");
        assert_eq!(tag.genre, 37);

        let options = ReaderOptions {
            probe_extended_v1_comment: false,
            ..ReaderOptions::default()
        };
        let tag = Id3v1Tag::read(&buffer, &options).unwrap();
        assert_eq!(tag.comment, "Dieser Kommentar ist genau 30!");
    }

    #[test]
    fn test_printable_genre_not_appended() {
        // '%' as genre byte
        let buffer = block(b"Titel", b"Applaus vom Ba", 37);
        let tag = Id3v1Tag::read(&buffer, &ReaderOptions::default()).unwrap();
        assert_eq!(tag.comment, "Applaus vom Ba");
        assert_eq!(tag.genre, 37);
    }

    #[test]
    fn test_printable_track_not_appended() {
        // '*' as v1.1 track byte
        let mut buffer = block(b"Titel", b"Kurzer Gong!", 37);
        buffer[TRACK_MARKER + 1] = 42;
        let tag = Id3v1Tag::read(&buffer, &ReaderOptions::default()).unwrap();
        assert_eq!(tag.comment, "Kurzer Gong!");
        assert_eq!(tag.track, Some(42));
    }

    #[test]
    fn test_extended_probe_stops_at_control_byte() {
        assert_eq!(printable_ascii(b"Gong\x07Rest"), "Gong");
        assert_eq!(printable_ascii(b"Gong\x00\x00%"), "Gong");
    }

    #[test]
    fn test_short_extended_comment_ignored() {
        let buffer = block(b"Titel", b"ok", 0x01);
        let tag = Id3v1Tag::read(&buffer, &ReaderOptions::default()).unwrap();
        assert_eq!(tag.comment, "ok");
    }
}
