// ID3 frame definitions and payload decoders

use encoding_rs::UTF_16BE;

use crate::config::ReaderOptions;
use crate::utils::encoding::{
    clean_text, decode_text, has_misdecode_marker, is_plausible, Attempt, Confidence,
    DecodedText, TextEncoding,
};

/// ID3v2.3 frame identifiers read by this crate
pub mod frame_ids {
    pub const TITLE: &str = "TIT2"; // Title/songname/content description
    pub const CONTENT_GROUP: &str = "TIT1"; // Content group description
    pub const SUBTITLE: &str = "TIT3"; // Subtitle/description refinement
    pub const ARTIST: &str = "TPE1"; // Lead performer(s)/Soloist(s)
    pub const ALBUM: &str = "TALB"; // Album/Movie/Show title
    pub const YEAR: &str = "TYER"; // Year
    pub const RECORDING_TIME: &str = "TDRC"; // Recording time (v2.4)
    pub const GENRE: &str = "TCON"; // Content type
    pub const COMMENT: &str = "COMM"; // Comments
    pub const LYRICS: &str = "USLT"; // Unsynchronised lyrics/text transcription
}

/// Decode a plain text frame (`T***`)
pub fn decode_text_frame(data: &[u8]) -> Option<DecodedText> {
    crate::utils::encoding::decode_field(data)
}

/// Strict comment layout: encoding, language, null-terminated description, text.
///
/// `Some(None)` means the layout is intact but the text is empty.
fn decode_comment_strict(data: &[u8]) -> Option<Option<DecodedText>> {
    let (&selector, rest) = data.split_first()?;
    let encoding = TextEncoding::from_byte(selector);
    let body = rest.get(3..)?;

    let text_start = match encoding.terminator_width() {
        2 => body
            .chunks_exact(2)
            .position(|pair| pair == [0, 0])
            .map(|index| index * 2 + 2)?,
        _ => body.iter().position(|&b| b == 0).map(|index| index + 1)?,
    };

    let decoded = decode_text(&body[text_start..], encoding);
    match decoded {
        Some(decoded) if !is_plausible(&decoded.text) => None,
        other => Some(other),
    }
}

fn accept(text: Option<String>) -> Option<String> {
    let text = clean_text(&text?);
    if text.is_empty() || has_misdecode_marker(&text) {
        None
    } else {
        Some(text)
    }
}

/// Decode a `COMM` or `USLT` payload.
///
/// Many encoders get this layout wrong, so after the strict read the payload (minus the
/// encoding byte) is retried as BOM-sniffed UTF-16, UTF-16LE, optionally the byte-swap and
/// manual UTF-16 heuristics, Latin-1 and UTF-8. The first clean result wins; if none is
/// clean, the UTF-16 read is returned marked `Garbled`.
pub fn decode_comment_frame(data: &[u8], options: &ReaderOptions) -> Option<DecodedText> {
    if let Some(strict) = decode_comment_strict(data) {
        return strict;
    }

    let payload = data.get(1..)?;
    let mut attempts = vec![Attempt::Utf16Bom, Attempt::Utf16Le];
    if options.utf16_heuristics {
        attempts.extend([Attempt::SwappedUtf16Le, Attempt::Utf16Detected]);
    }
    attempts.extend([Attempt::Latin1, Attempt::Utf8]);

    for attempt in attempts {
        if let Some(text) = accept(attempt.decode(payload)) {
            log::debug!("comment recovered via {:?}", attempt);
            return Some(DecodedText::new(text, Confidence::Heuristic));
        }
    }

    let (last_resort, _, _) = UTF_16BE.decode(payload);
    let text = clean_text(&last_resort);
    log::debug!("comment frame undecodable, keeping garbled UTF-16 read");
    if text.is_empty() {
        None
    } else {
        Some(DecodedText::new(text, Confidence::Garbled))
    }
}

/// ID3v1 genre names, indexed by genre byte
pub const GENRES: [&str; 80] = [
    "Blues", "Classic Rock", "Country", "Dance", "Disco", "Funk", "Grunge", "Hip-Hop",
    "Jazz", "Metal", "New Age", "Oldies", "Other", "Pop", "R&B", "Rap", "Reggae", "Rock",
    "Techno", "Industrial", "Alternative", "Ska", "Death Metal", "Pranks", "Soundtrack",
    "Euro-Techno", "Ambient", "Trip-Hop", "Vocal", "Jazz+Funk", "Fusion", "Trance",
    "Classical", "Instrumental", "Acid", "House", "Game", "Sound Clip", "Gospel", "Noise",
    "AlternRock", "Bass", "Soul", "Punk", "Space", "Meditative", "Instrumental Pop",
    "Instrumental Rock", "Ethnic", "Gothic", "Darkwave", "Techno-Industrial", "Electronic",
    "Pop-Folk", "Eurodance", "Dream", "Southern Rock", "Comedy", "Cult", "Gangsta", "Top 40",
    "Christian Rap", "Pop/Funk", "Jungle", "Native American", "Cabaret", "New Wave",
    "Psychadelic", "Rave", "Showtunes", "Trailer", "Lo-Fi", "Tribal", "Acid Punk",
    "Acid Jazz", "Polka", "Retro", "Musical", "Rock & Roll", "Hard Rock",
];

/// Look up an ID3v1 genre byte
pub fn genre_name(index: u8) -> Option<&'static str> {
    GENRES.get(index as usize).copied()
}

/// Resolve a `TCON` value. `"(17)"` and `"17"` become `"Rock"`; `"(17)Indie"` keeps the
/// refinement `"Indie"`; `(RX)` and `(CR)` are the remix and cover shorthands.
pub fn resolve_genre(value: &str) -> String {
    let value = value.trim();

    if let Some(rest) = value.strip_prefix('(') {
        if let Some((code, refinement)) = rest.split_once(')') {
            let refinement = refinement.trim();
            if !refinement.is_empty() {
                return refinement.to_string();
            }
            let named = match code {
                "RX" => Some("Remix"),
                "CR" => Some("Cover"),
                _ => code.parse::<u8>().ok().and_then(genre_name),
            };
            if let Some(name) = named {
                return name.to_string();
            }
        }
    }

    match value.parse::<u8>().ok().and_then(genre_name) {
        Some(name) => name.to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16be(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_be_bytes).collect()
    }

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn test_comment_strict_utf16be() {
        let mut data = vec![2];
        data.extend(b"eng");
        data.extend([0, 0]);
        data.extend(utf16be("Hi"));

        let decoded = decode_comment_frame(&data, &ReaderOptions::default()).unwrap();
        assert_eq!(decoded.text, "Hi");
        assert_eq!(decoded.confidence, Confidence::Exact);
    }

    #[test]
    fn test_comment_strict_with_description() {
        let mut data = vec![0];
        data.extend(b"deu");
        data.extend(b"Beschreibung\0");
        data.extend(b"Applaus vom Band");

        let decoded = decode_comment_frame(&data, &ReaderOptions::default()).unwrap();
        assert_eq!(decoded.text, "Applaus vom Band");
    }

    #[test]
    fn test_comment_strict_utf16_bom() {
        let mut data = vec![1];
        data.extend(b"eng");
        data.extend([0xFF, 0xFE, 0, 0]);
        data.extend([0xFF, 0xFE]);
        data.extend(utf16le("Tröte"));

        let decoded = decode_comment_frame(&data, &ReaderOptions::default()).unwrap();
        assert_eq!(decoded.text, "Tröte");
    }

    #[test]
    fn test_comment_empty_text_is_absent() {
        let mut data = vec![0];
        data.extend(b"eng");
        data.extend(b"nur Beschreibung\0");
        assert_eq!(decode_comment_frame(&data, &ReaderOptions::default()), None);
    }

    #[test]
    fn test_comment_without_language_falls_back() {
        // no terminator anywhere: the strict layout cannot be applied
        let data = b"\x00Hinweis".to_vec();
        let decoded = decode_comment_frame(&data, &ReaderOptions::default()).unwrap();
        assert_eq!(decoded.confidence, Confidence::Heuristic);
        assert!(!decoded.text.is_empty());
        assert!(!has_misdecode_marker(&decoded.text));
    }

    #[test]
    fn test_comment_latin1_fallback_for_odd_payload() {
        // odd length defeats every UTF-16 read
        let data = b"\x00Piep!".to_vec();
        let decoded = decode_comment_frame(&data, &ReaderOptions::default()).unwrap();
        assert_eq!(decoded.text, "Piep!");
        assert_eq!(decoded.confidence, Confidence::Heuristic);
    }

    #[test]
    fn test_comment_garbled_last_resort() {
        // U+FFFD in every decode: strict UTF-8 fails, Latin-1 yields 'ÿþ'
        let data = vec![3, 0xFF, 0xFE, 0xFF];
        let decoded = decode_comment_frame(&data, &ReaderOptions::default()).unwrap();
        assert_eq!(decoded.confidence, Confidence::Garbled);
    }

    #[test]
    fn test_resolve_genre() {
        assert_eq!(resolve_genre("(17)"), "Rock");
        assert_eq!(resolve_genre("17"), "Rock");
        assert_eq!(resolve_genre("(17)Indie"), "Indie");
        assert_eq!(resolve_genre("(RX)"), "Remix");
        assert_eq!(resolve_genre("Hörspiel"), "Hörspiel");
        assert_eq!(resolve_genre("(200)"), "(200)");
        assert_eq!(genre_name(79), Some("Hard Rock"));
        assert_eq!(genre_name(80), None);
    }
}
