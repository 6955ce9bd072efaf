//! soundtag - MP3 tag reading for numbered soundboard files
//!
//! Reads ID3v2 and ID3v1 tags out of an in-memory MP3 buffer without any tagging library,
//! and resolves what a soundboard displays for `sounds/<NNN>.mp3`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

pub mod config;
pub mod error;
pub mod fallback;
pub mod field_mapping;
pub mod id3;
pub mod mpeg;
pub mod source;
pub mod utils;

pub use config::{LookupConfig, Placeholders, ReaderOptions};
pub use error::{Error, Result};
pub use fallback::{resolve, InfoSource, KnownEntry, KnownMetadata, SoundInfo};
pub use field_mapping::Field;
pub use id3::{detect, Detected, TagContainer};
pub use source::{FileSource, HttpSource, SoundNumber, SoundSource};
pub use utils::encoding::{Confidence, DecodedText};

use field_mapping::{id3v2_candidates, normalize_year};
use id3::frames::{decode_comment_frame, decode_text_frame, genre_name, resolve_genre};
use id3::{Id3v1Tag, Id3v2Tag};

/// Decoded tag metadata of one buffer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub comment: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    pub containers: Detected,
    /// Fields that did not come from an exact decode
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub confidence: BTreeMap<Field, Confidence>,
}

impl TagRecord {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => self.title.as_deref(),
            Field::Artist => self.artist.as_deref(),
            Field::Comment => self.comment.as_deref(),
            Field::Album => self.album.as_deref(),
            Field::Year => self.year.as_deref(),
            Field::Genre => self.genre.as_deref(),
        }
    }

    /// Confidence of a present field
    pub fn confidence(&self, field: Field) -> Option<Confidence> {
        self.get(field)?;
        Some(
            self.confidence
                .get(&field)
                .copied()
                .unwrap_or(Confidence::Exact),
        )
    }

    /// `true` when no field carries a value
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|field| self.get(*field).is_none())
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Artist => &mut self.artist,
            Field::Comment => &mut self.comment,
            Field::Album => &mut self.album,
            Field::Year => &mut self.year,
            Field::Genre => &mut self.genre,
        }
    }

    fn set(&mut self, field: Field, decoded: DecodedText) {
        let text = match field {
            Field::Genre => resolve_genre(&decoded.text),
            Field::Year => normalize_year(&decoded.text),
            _ => decoded.text,
        };
        if decoded.confidence != Confidence::Exact {
            self.confidence.insert(field, decoded.confidence);
        }
        *self.slot(field) = Some(text);
    }

    fn merge_id3v2(&mut self, tag: &Id3v2Tag<'_>, options: &ReaderOptions) {
        for field in Field::ALL {
            if self.get(field).is_some() {
                continue;
            }
            let decoded = id3v2_candidates(field, options)
                .iter()
                .filter_map(|id| tag.frame(id))
                .find_map(|frame| {
                    if field.is_comment() {
                        decode_comment_frame(frame.data, options)
                    } else {
                        decode_text_frame(frame.data)
                    }
                });
            if let Some(decoded) = decoded {
                self.set(field, decoded);
            }
        }
    }

    fn merge_id3v1(&mut self, tag: &Id3v1Tag) {
        let values = [
            (Field::Title, &tag.title),
            (Field::Artist, &tag.artist),
            (Field::Comment, &tag.comment),
            (Field::Album, &tag.album),
            (Field::Year, &tag.year),
        ];
        for (field, value) in values {
            if self.get(field).is_none() && !value.is_empty() {
                self.set(field, DecodedText::new(value.clone(), Confidence::Exact));
            }
        }
        if self.genre.is_none() {
            if let Some(name) = genre_name(tag.genre) {
                self.set(Field::Genre, DecodedText::new(name.to_string(), Confidence::Exact));
            }
        }
    }
}

impl fmt::Display for TagRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TagRecord(containers={:?}, title={}, artist={}, comment={})",
            self.containers.containers(),
            self.title.as_deref().unwrap_or("None"),
            self.artist.as_deref().unwrap_or("None"),
            self.comment.as_deref().unwrap_or("None")
        )
    }
}

/// Read every tag container in a buffer into one record.
///
/// ID3v2 values take precedence; ID3v1 fills the gaps. A buffer without tags yields an
/// empty record, never an error.
pub fn read_tags(buffer: &[u8], options: &ReaderOptions) -> TagRecord {
    let containers = detect(buffer);
    let mut record = TagRecord {
        containers,
        ..TagRecord::default()
    };

    if containers.id3v2 {
        if let Some(tag) = id3::parse_id3v2(buffer, options) {
            record.merge_id3v2(&tag, options);
        }
    }
    if containers.id3v1 {
        if let Some(tag) = Id3v1Tag::read(buffer, options) {
            record.merge_id3v1(&tag);
        }
    }

    record
}

/// Looks up display metadata for numbered sounds from a source
pub struct SoundBoard<S> {
    source: S,
    config: LookupConfig,
    known: KnownMetadata,
}

impl<S: SoundSource> SoundBoard<S> {
    pub fn new(source: S, config: LookupConfig, known: KnownMetadata) -> Self {
        Self {
            source,
            config,
            known,
        }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn fetch(&self, number: SoundNumber) -> Result<Vec<u8>> {
        self.source.fetch(number).map_err(|e| {
            log::warn!("could not load {}: {}", self.source.locate(number), e);
            e
        })
    }

    /// Fetch a sound and read its tags
    pub fn read_tags(&self, number: SoundNumber) -> Result<TagRecord> {
        let bytes = self.fetch(number)?;
        Ok(read_tags(&bytes, &self.config.reader))
    }

    /// Fetch a sound and resolve what to display for it
    pub fn lookup(&self, number: SoundNumber) -> Result<SoundInfo> {
        let bytes = self.fetch(number)?;
        let record = read_tags(&bytes, &self.config.reader);
        let duration = mpeg::estimate_duration(&bytes);
        Ok(resolve(
            number,
            record,
            &self.known,
            &self.config.placeholders,
            duration,
        ))
    }
}
