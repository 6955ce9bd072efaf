// Metadata field mapping
//
// Maps the fields of a `TagRecord` onto the ID3v2 frames that can supply them, in
// priority order. The first frame id present in a tag wins.

use serde::{Deserialize, Serialize};

use crate::config::ReaderOptions;
use crate::id3::frames::frame_ids;

/// Fields of a decoded tag record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Artist,
    Comment,
    Album,
    Year,
    Genre,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Title,
        Field::Artist,
        Field::Comment,
        Field::Album,
        Field::Year,
        Field::Genre,
    ];

    /// Get field name (lowercase)
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Artist => "artist",
            Field::Comment => "comment",
            Field::Album => "album",
            Field::Year => "year",
            Field::Genre => "genre",
        }
    }

    /// Parse from string
    pub fn from_name(s: &str) -> Option<Self> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
    }

    /// `COMM`/`USLT` payloads need the comment-layout decoder
    pub fn is_comment(&self) -> bool {
        matches!(self, Field::Comment)
    }
}

/// ID3v2 frame ids that can supply a field, highest priority first
pub fn id3v2_candidates(field: Field, options: &ReaderOptions) -> &'static [&'static str] {
    match field {
        Field::Title => &[frame_ids::TITLE, frame_ids::CONTENT_GROUP, frame_ids::SUBTITLE],
        Field::Artist => &[frame_ids::ARTIST],
        Field::Comment if options.consult_uslt => &[frame_ids::COMMENT, frame_ids::LYRICS],
        Field::Comment => &[frame_ids::COMMENT],
        Field::Album => &[frame_ids::ALBUM],
        Field::Year => &[frame_ids::YEAR, frame_ids::RECORDING_TIME],
        Field::Genre => &[frame_ids::GENRE],
    }
}

/// Field a frame id feeds, if any
pub fn field_for_frame(frame_id: &str) -> Option<Field> {
    let options = ReaderOptions::default();
    Field::ALL
        .into_iter()
        .find(|field| {
            id3v2_candidates(*field, &options)
                .iter()
                .any(|id| *id == frame_id)
        })
}

/// Normalize year values such as `"2024-01-15"` to `"2024"`
pub fn normalize_year(year: &str) -> String {
    let year = year.trim();
    match year.get(..4) {
        Some(prefix) if prefix.chars().all(|c| c.is_ascii_digit()) => prefix.to_string(),
        _ => year.to_string(),
    }
}
