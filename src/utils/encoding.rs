// Encoding utilities
//
// Every decode goes through an `Attempt`: a single named strategy that either produces a
// string or rejects the bytes. Callers chain attempts in priority order and keep the first
// one whose output passes `is_plausible`.

use encoding_rs::{UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};

/// Text encoding types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Iso8859_1 = 0,
    Utf16 = 1,
    Utf16BE = 2,
    Utf8 = 3,
}

impl TextEncoding {
    /// Map an ID3v2 encoding selector byte. Unknown selectors are read as UTF-8.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => TextEncoding::Iso8859_1,
            1 => TextEncoding::Utf16,
            2 => TextEncoding::Utf16BE,
            _ => TextEncoding::Utf8,
        }
    }

    /// Width of the null terminator in this encoding
    pub fn terminator_width(self) -> usize {
        match self {
            TextEncoding::Utf16 | TextEncoding::Utf16BE => 2,
            TextEncoding::Iso8859_1 | TextEncoding::Utf8 => 1,
        }
    }
}

/// How much a decoded string can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Decoded with the declared (or BOM-indicated) encoding
    Exact,
    /// Produced by a fallback or guessing strategy
    Heuristic,
    /// Every attempt failed validation; best effort only
    Garbled,
}

/// A cleaned string together with the confidence of the path that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub confidence: Confidence,
}

impl DecodedText {
    pub fn new(text: String, confidence: Confidence) -> Self {
        Self { text, confidence }
    }
}

/// One decoding strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Strict UTF-16 little-endian
    Utf16Le,
    /// Strict UTF-16 big-endian
    Utf16Be,
    /// UTF-16 honouring a leading BOM, big-endian otherwise
    Utf16Bom,
    /// Swap every byte pair, then lenient little-endian
    SwappedUtf16Le,
    /// Lenient UTF-16 with endianness guessed from zero-byte positions
    Utf16Detected,
    /// ISO-8859-1 read as windows-1252: bytes 0x80-0x9F decode to `€`, `‚`, ... rather
    /// than C1 control code points
    Latin1,
    /// Strict UTF-8
    Utf8,
    /// Every byte taken as a code point; never fails
    CodePoints,
}

impl Attempt {
    /// Run this strategy. `None` means the bytes were rejected.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        let text = match self {
            Attempt::Utf16Le => strict(UTF_16LE, bytes)?,
            Attempt::Utf16Be => strict(UTF_16BE, bytes)?,
            Attempt::Utf16Bom => match bytes {
                [0xFF, 0xFE, rest @ ..] => strict(UTF_16LE, rest)?,
                [0xFE, 0xFF, rest @ ..] => strict(UTF_16BE, rest)?,
                _ => strict(UTF_16BE, bytes)?,
            },
            Attempt::SwappedUtf16Le => {
                let swapped: Vec<u8> = bytes
                    .chunks_exact(2)
                    .flat_map(|pair| [pair[1], pair[0]])
                    .collect();
                UTF_16LE
                    .decode_without_bom_handling(&swapped)
                    .0
                    .into_owned()
            }
            Attempt::Utf16Detected => decode_utf16_detected(bytes),
            Attempt::Latin1 => strict(WINDOWS_1252, bytes)?,
            Attempt::Utf8 => strict(UTF_8, bytes)?,
            Attempt::CodePoints => bytes.iter().map(|&b| b as char).collect(),
        };
        log::trace!("{:?} decoded {} bytes to {:?}", self, bytes.len(), text);
        Some(text)
    }

    /// Confidence attached to a string produced by this strategy
    pub fn confidence(self) -> Confidence {
        match self {
            Attempt::Utf16Le
            | Attempt::Utf16Be
            | Attempt::Utf16Bom
            | Attempt::Latin1
            | Attempt::Utf8 => Confidence::Exact,
            Attempt::SwappedUtf16Le | Attempt::Utf16Detected | Attempt::CodePoints => {
                Confidence::Heuristic
            }
        }
    }
}

fn strict(encoding: &'static encoding_rs::Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

/// Manual UTF-16 decode. A BOM decides the byte order when present; otherwise the side
/// holding more zero bytes is taken as the high byte, which is right for mostly-ASCII text.
fn decode_utf16_detected(bytes: &[u8]) -> String {
    let (big_endian, body) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (false, rest),
        [0xFE, 0xFF, rest @ ..] => (true, rest),
        _ => {
            let even_zeros = bytes.iter().step_by(2).filter(|&&b| b == 0).count();
            let odd_zeros = bytes.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();
            (even_zeros > odd_zeros, bytes)
        }
    };

    let units = body.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });

    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Characters that show up when bytes were read with the wrong encoding
const MISDECODE_MARKERS: &[char] = &['\u{FFFD}', '\u{FFFE}', '\u{0}'];

/// A UTF-16 BOM read as single-byte text
const MISDECODED_BOMS: &[&str] = &["ÿþ", "þÿ"];

/// Minimum share of printable characters for a decode to be believed
const MIN_PRINTABLE_RATIO: f32 = 0.75;

pub fn has_misdecode_marker(text: &str) -> bool {
    text.contains(MISDECODE_MARKERS) || MISDECODED_BOMS.iter().any(|bom| text.contains(bom))
}

fn printable_ratio(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .count();
    printable as f32 / total as f32
}

/// Validation applied to every candidate before it is accepted.
///
/// Trailing terminators are ignored; an embedded null, a mis-decode marker, or too many
/// control characters rejects the candidate.
pub fn is_plausible(text: &str) -> bool {
    let text = text.trim_end_matches('\0');
    !text.trim().is_empty()
        && !has_misdecode_marker(text)
        && printable_ratio(text) >= MIN_PRINTABLE_RATIO
}

/// Ordered attempts for UTF-16 text that carries no byte-order mark.
///
/// The order is a heuristic, not a format guarantee: little-endian is tried first because
/// most taggers in the wild write it, then big-endian, then a lenient byte-swapped read, and
/// finally raw code points, which always succeed.
pub fn candidate_decodings(_bytes: &[u8]) -> Vec<Attempt> {
    vec![
        Attempt::Utf16Le,
        Attempt::Utf16Be,
        Attempt::SwappedUtf16Le,
        Attempt::CodePoints,
    ]
}

/// Strip embedded nulls, a leading BOM and surrounding whitespace. Other control or
/// extended characters are kept.
pub fn clean_text(text: &str) -> String {
    let without_nulls: String = text.chars().filter(|&c| c != '\0').collect();
    without_nulls
        .trim()
        .trim_start_matches('\u{FEFF}')
        .trim()
        .to_string()
}

fn finish(text: String, confidence: Confidence) -> Option<DecodedText> {
    let text = clean_text(&text);
    if text.is_empty() {
        None
    } else {
        Some(DecodedText::new(text, confidence))
    }
}

fn decode_utf16_without_bom(data: &[u8]) -> DecodedText {
    let attempts = candidate_decodings(data);
    for attempt in &attempts {
        if let Some(text) = attempt.decode(data) {
            if *attempt == Attempt::CodePoints || is_plausible(&text) {
                return DecodedText::new(text, attempt.confidence());
            }
        }
    }
    DecodedText::new(
        Attempt::CodePoints.decode(data).unwrap_or_default(),
        Confidence::Heuristic,
    )
}

/// Decode text with specified encoding.
///
/// Falls back to UTF-8, then Latin-1, then raw code points when the declared encoding
/// rejects the bytes. Returns `None` when nothing readable is left after cleaning.
pub fn decode_text(data: &[u8], encoding: TextEncoding) -> Option<DecodedText> {
    let declared = match encoding {
        TextEncoding::Iso8859_1 => Attempt::Latin1.decode(data).map(exact),
        TextEncoding::Utf16 => match data {
            [0xFF, 0xFE, ..] | [0xFE, 0xFF, ..] => Attempt::Utf16Bom.decode(data).map(exact),
            _ => Some(decode_utf16_without_bom(data)),
        },
        TextEncoding::Utf16BE => Attempt::Utf16Be.decode(data).map(exact),
        TextEncoding::Utf8 => Attempt::Utf8.decode(data).map(exact),
    };

    let decoded = declared.or_else(|| {
        log::debug!("{:?} rejected {} bytes, falling back", encoding, data.len());
        [Attempt::Utf8, Attempt::Latin1, Attempt::CodePoints]
            .into_iter()
            .find_map(|attempt| {
                attempt
                    .decode(data)
                    .map(|text| DecodedText::new(text, Confidence::Heuristic))
            })
    })?;

    finish(decoded.text, decoded.confidence)
}

fn exact(text: String) -> DecodedText {
    DecodedText::new(text, Confidence::Exact)
}

/// Decode an encoding-prefixed field: byte 0 selects the encoding, the rest is text.
pub fn decode_field(bytes: &[u8]) -> Option<DecodedText> {
    let (&selector, payload) = bytes.split_first()?;
    decode_text(payload, TextEncoding::from_byte(selector))
}

/// Decode a fixed-width ID3v1 field: always Latin-1, nulls removed, trimmed.
pub fn decode_id3v1_string(bytes: &[u8]) -> String {
    let text = Attempt::Latin1
        .decode(bytes)
        .or_else(|| Attempt::CodePoints.decode(bytes))
        .unwrap_or_default();
    clean_text(&text)
}

/// Encode text with specified encoding, prefixed by its selector byte
pub fn encode_text(text: &str, encoding: TextEncoding) -> Vec<u8> {
    let mut result = vec![encoding as u8];

    match encoding {
        TextEncoding::Iso8859_1 => {
            result.extend_from_slice(&WINDOWS_1252.encode(text).0);
        }
        TextEncoding::Utf16 => {
            result.extend_from_slice(&[0xFF, 0xFE]);
            result.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        }
        TextEncoding::Utf16BE => {
            result.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        }
        TextEncoding::Utf8 => {
            result.extend_from_slice(text.as_bytes());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    fn utf16be(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_be_bytes).collect()
    }

    #[test]
    fn test_unknown_selector_is_utf8() {
        assert_eq!(TextEncoding::from_byte(7), TextEncoding::Utf8);
        assert_eq!(TextEncoding::from_byte(0), TextEncoding::Iso8859_1);
    }

    #[test]
    fn test_decode_field_utf8() {
        let decoded = decode_field(b"\x03Hello").unwrap();
        assert_eq!(decoded.text, "Hello");
        assert_eq!(decoded.confidence, Confidence::Exact);
    }

    #[test]
    fn test_decode_field_latin1() {
        let decoded = decode_field(b"\x00Gr\xfc\xdfe\x00").unwrap();
        assert_eq!(decoded.text, "Grüße");
    }

    #[test]
    fn test_decode_field_utf16_with_bom() {
        let mut data = vec![1, 0xFE, 0xFF];
        data.extend(utf16be("Bühne"));
        assert_eq!(decode_field(&data).unwrap().text, "Bühne");

        let mut data = vec![1, 0xFF, 0xFE];
        data.extend(utf16le("Bühne"));
        data.extend([0, 0]);
        assert_eq!(decode_field(&data).unwrap().text, "Bühne");
    }

    #[test]
    fn test_utf16_without_bom_prefers_little_endian() {
        let mut data = vec![1];
        data.extend(utf16le("Sirene"));
        let decoded = decode_field(&data).unwrap();
        assert_eq!(decoded.text, "Sirene");
        assert_eq!(decoded.confidence, Confidence::Exact);
    }

    #[test]
    fn test_utf16_without_bom_falls_back_to_big_endian() {
        // 'Ø' big-endian is 00 D8, which reads as an unpaired surrogate little-endian
        let bytes = utf16be("Øl");
        assert_eq!(Attempt::Utf16Le.decode(&bytes), None);
        let decoded = decode_text(&bytes, TextEncoding::Utf16).unwrap();
        assert_eq!(decoded.text, "Øl");
        assert_eq!(decoded.confidence, Confidence::Exact);
    }

    #[test]
    fn test_utf16be_declared() {
        let data = utf16be("Hi");
        assert_eq!(
            decode_text(&data, TextEncoding::Utf16BE).unwrap().text,
            "Hi"
        );
    }

    #[test]
    fn test_invalid_utf8_falls_back() {
        let decoded = decode_text(b"caf\xe9", TextEncoding::Utf8).unwrap();
        assert_eq!(decoded.text, "café");
        assert_eq!(decoded.confidence, Confidence::Heuristic);
    }

    #[test]
    fn test_empty_after_cleaning_is_absent() {
        assert_eq!(decode_field(b"\x00\x00\x00  "), None);
        assert_eq!(decode_field(b""), None);
        assert_eq!(decode_field(b"\x03"), None);
    }

    #[test]
    fn test_clean_text_keeps_extended_characters() {
        assert_eq!(clean_text("  A\0B\u{7}  "), "AB\u{7}");
        assert_eq!(clean_text("\u{FEFF}Titel"), "Titel");
    }

    #[test]
    fn test_is_plausible() {
        assert!(is_plausible("Hello\0"));
        assert!(!is_plausible("He\0llo"));
        assert!(!is_plausible("\u{FFFD}abc"));
        assert!(!is_plausible("ÿþH"));
        assert!(!is_plausible("\u{1}\u{2}\u{3}a"));
        assert!(!is_plausible(""));
    }

    #[test]
    fn test_candidate_order() {
        assert_eq!(
            candidate_decodings(&[]),
            vec![
                Attempt::Utf16Le,
                Attempt::Utf16Be,
                Attempt::SwappedUtf16Le,
                Attempt::CodePoints
            ]
        );
    }

    #[test]
    fn test_detected_endianness() {
        assert_eq!(Attempt::Utf16Detected.decode(&utf16be("Ansage")).unwrap(), "Ansage");
        assert_eq!(Attempt::Utf16Detected.decode(&utf16le("Ansage")).unwrap(), "Ansage");
        assert_eq!(Attempt::Utf16Detected.confidence(), Confidence::Heuristic);
    }

    #[test]
    fn test_swapped() {
        assert_eq!(Attempt::SwappedUtf16Le.decode(&utf16be("Hupe")).unwrap(), "Hupe");
    }

    #[test]
    fn test_latin1_uses_windows_1252_for_c1_range() {
        assert_eq!(Attempt::Latin1.decode(b"\x80 5").as_deref(), Some("€ 5"));
        assert_eq!(Attempt::Latin1.decode(b"Caf\xe9").as_deref(), Some("Café"));
    }

    #[test]
    fn test_decode_id3v1_string() {
        let mut field = b"Track One".to_vec();
        field.resize(30, 0);
        assert_eq!(decode_id3v1_string(&field), "Track One");
        assert_eq!(decode_id3v1_string(b"  Gong   "), "Gong");
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("Hi", TextEncoding::Utf8), b"\x03Hi");
        assert_eq!(encode_text("Hi", TextEncoding::Utf16BE), b"\x02\x00H\x00i");
        assert_eq!(
            encode_text("Hi", TextEncoding::Utf16),
            b"\x01\xFF\xFEH\x00i\x00"
        );
        assert_eq!(encode_text("ä", TextEncoding::Iso8859_1), b"\x00\xe4");
    }
}
