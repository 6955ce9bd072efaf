// Display metadata fallback
//
// Tags win when they carry a value. Otherwise an injected table of known sounds is
// consulted, then (for the comment) a playing-time estimate, then fixed placeholders.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Placeholders;
use crate::error::Result;
use crate::source::SoundNumber;
use crate::TagRecord;

/// One entry of the known-metadata table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownEntry {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl KnownEntry {
    pub fn new(title: &str, description: &str, category: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            category: Some(category.to_string()),
        }
    }
}

/// Read-only table of known sounds keyed by file name (`"001.mp3"`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownMetadata {
    entries: BTreeMap<String, KnownEntry>,
}

impl KnownMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, KnownEntry)>,
        K: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, entry)| (name.into(), entry))
                .collect(),
        }
    }

    /// The sounds shipped with the board
    pub fn builtin() -> Self {
        let standard = |n: &str, category: &str| {
            (
                format!("{}.mp3", n),
                KnownEntry::new(
                    &format!("Sound {}", n),
                    &format!("BRUCHLAST Sound Effect {}", n),
                    category,
                ),
            )
        };

        let mut entries = vec![
            standard("001", "Standard"),
            standard("002", "Standard"),
            standard("003", "Standard"),
            standard("281", "Spezial"),
        ];
        entries.extend(
            ["995", "996", "997", "998", "999"]
                .into_iter()
                .map(|n| standard(n, "High Number")),
        );
        entries.push((
            "BLC_introaudio.mp3".to_string(),
            KnownEntry::new("Intro BOT", "BRUCHLAST Intro Audio", "System"),
        ));

        Self::from_entries(entries)
    }

    /// Parse a JSON object of `file name -> entry`
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON table from disk
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&json)?;
        log::debug!("loaded {} known sounds from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn get(&self, file_name: &str) -> Option<&KnownEntry> {
        self.entries.get(file_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where the displayed title came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoSource {
    Tag,
    Table,
    Placeholder,
}

/// What the board shows for one sound
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundInfo {
    pub file_name: String,
    pub title: String,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub source: InfoSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    pub tags: TagRecord,
}

/// `"Dauer: 1:05"`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs_f64().round() as u64;
    format!("Dauer: {}:{:02}", total / 60, total % 60)
}

/// Merge a tag record with the fallbacks into display metadata
pub fn resolve(
    number: SoundNumber,
    record: TagRecord,
    known: &KnownMetadata,
    placeholders: &Placeholders,
    duration: Option<Duration>,
) -> SoundInfo {
    let file_name = number.file_name();
    let entry = known.get(&file_name);

    let (title, source) = match (&record.title, entry) {
        (Some(title), _) => (title.clone(), InfoSource::Tag),
        (None, Some(entry)) => (entry.title.clone(), InfoSource::Table),
        (None, None) => (placeholders.title.clone(), InfoSource::Placeholder),
    };

    let comment = record
        .comment
        .clone()
        .or_else(|| entry.map(|entry| entry.description.clone()))
        .or_else(|| duration.map(format_duration))
        .unwrap_or_else(|| placeholders.comment.clone());

    log::debug!("{}: title from {:?}", file_name, source);

    SoundInfo {
        file_name,
        title,
        comment,
        category: entry.and_then(|entry| entry.category.clone()),
        source,
        duration_secs: duration.map(|d| d.as_secs_f64()),
        tags: record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(n: &str) -> SoundNumber {
        SoundNumber::parse(n).unwrap()
    }

    #[test]
    fn test_builtin_table() {
        let known = KnownMetadata::builtin();
        assert_eq!(known.len(), 10);
        let entry = known.get("281.mp3").unwrap();
        assert_eq!(entry.title, "Sound 281");
        assert_eq!(entry.category.as_deref(), Some("Spezial"));
        assert!(known.get("004.mp3").is_none());
    }

    #[test]
    fn test_tag_wins() {
        let record = TagRecord {
            title: Some("Fanfare".to_string()),
            comment: Some("laut".to_string()),
            ..TagRecord::default()
        };
        let info = resolve(
            number("1"),
            record,
            &KnownMetadata::builtin(),
            &Placeholders::default(),
            None,
        );
        assert_eq!(info.title, "Fanfare");
        assert_eq!(info.comment, "laut");
        assert_eq!(info.source, InfoSource::Tag);
        assert_eq!(info.category.as_deref(), Some("Standard"));
    }

    #[test]
    fn test_table_fallback() {
        let info = resolve(
            number("995"),
            TagRecord::default(),
            &KnownMetadata::builtin(),
            &Placeholders::default(),
            Some(Duration::from_secs(3)),
        );
        assert_eq!(info.title, "Sound 995");
        assert_eq!(info.comment, "BRUCHLAST Sound Effect 995");
        assert_eq!(info.source, InfoSource::Table);
    }

    #[test]
    fn test_duration_then_placeholder() {
        let placeholders = Placeholders::default();
        let info = resolve(
            number("12"),
            TagRecord::default(),
            &KnownMetadata::new(),
            &placeholders,
            Some(Duration::from_millis(65_400)),
        );
        assert_eq!(info.title, "Unbekannt");
        assert_eq!(info.comment, "Dauer: 1:05");
        assert_eq!(info.source, InfoSource::Placeholder);

        let info = resolve(
            number("12"),
            TagRecord::default(),
            &KnownMetadata::new(),
            &placeholders,
            None,
        );
        assert_eq!(info.comment, "Kein Kommentar");
    }

    #[test]
    fn test_injected_table() {
        let known = KnownMetadata::from_json_str(
            r#"{"012.mp3": {"title": "Glocke", "description": "Pausengong"}}"#,
        )
        .unwrap();
        let info = resolve(
            number("12"),
            TagRecord::default(),
            &known,
            &Placeholders::default(),
            None,
        );
        assert_eq!(info.title, "Glocke");
        assert_eq!(info.comment, "Pausengong");
        assert_eq!(info.category, None);
    }

    #[test]
    fn test_invalid_table_json() {
        assert!(KnownMetadata::from_json_str("[1, 2]").is_err());
    }
}
