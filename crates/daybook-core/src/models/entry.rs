//! Journal entry model

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::timestamp;
use super::{ItemId, Record, TransactionKind};
use crate::error::{Error, Result};
use crate::util::truncate_with_ellipsis;

/// Length of the title derived from content when none is given.
pub const ENTRY_TITLE_PREVIEW_CHARS: usize = 50;

/// Mood tag attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Calm,
    Excited,
    Anxious,
    Tired,
    Grateful,
    /// Tag not in the built-in catalogue
    Other(String),
}

impl Mood {
    /// Built-in moods in display order.
    pub const CATALOGUE: [Self; 8] = [
        Self::Happy,
        Self::Sad,
        Self::Angry,
        Self::Calm,
        Self::Excited,
        Self::Anxious,
        Self::Tired,
        Self::Grateful,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Calm => "calm",
            Self::Excited => "excited",
            Self::Anxious => "anxious",
            Self::Tired => "tired",
            Self::Grateful => "grateful",
            Self::Other(id) => id,
        }
    }

    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Happy | Self::Other(_) => "😊",
            Self::Sad => "😢",
            Self::Angry => "😠",
            Self::Calm => "😌",
            Self::Excited => "🤩",
            Self::Anxious => "😰",
            Self::Tired => "😴",
            Self::Grateful => "🙏",
        }
    }
}

impl From<String> for Mood {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "happy" => Self::Happy,
            "sad" => Self::Sad,
            "angry" => Self::Angry,
            "calm" => Self::Calm,
            "excited" => Self::Excited,
            "anxious" => Self::Anxious,
            "tired" => Self::Tired,
            "grateful" => Self::Grateful,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<Mood> for String {
    fn from(value: Mood) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Income or expense booked alongside an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryAccounting {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(rename = "mood", default, deserialize_with = "deserialize_moods")]
    pub moods: Vec<Mood>,
    /// Image URLs or inline `data:` URIs
    #[serde(default, deserialize_with = "deserialize_images")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounting: Option<EntryAccounting>,
    /// Creation timestamp (Unix ms)
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub updated_at: i64,
}

impl LogEntry {
    /// Title to display: the stored one, or a preview of the content.
    #[must_use]
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            truncate_with_ellipsis(self.content.trim(), ENTRY_TITLE_PREVIEW_CHARS)
        } else {
            self.title.clone()
        }
    }
}

impl Record for LogEntry {
    type Draft = EntryDraft;

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn search_text(&self) -> String {
        let moods = self
            .moods
            .iter()
            .map(Mood::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        format!("{}\n{}\n{}", self.title, self.content, moods)
    }

    fn from_draft(id: ItemId, draft: &EntryDraft, now: i64) -> Self {
        Self {
            id,
            title: draft.resolved_title(),
            content: draft.content.trim().to_string(),
            moods: draft.moods.clone(),
            images: draft.images.clone(),
            accounting: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_draft(&self, draft: &EntryDraft, now: i64) -> Self {
        Self {
            created_at: self.created_at,
            accounting: self.accounting.clone(),
            ..Self::from_draft(self.id.clone(), draft, now)
        }
    }
}

/// Payload for creating or editing an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(rename = "mood", default)]
    pub moods: Vec<Mood>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl EntryDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_moods(mut self, moods: impl IntoIterator<Item = Mood>) -> Self {
        self.moods = moods.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Reject drafts the API would refuse.
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Entry content cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Explicit title, or the first characters of the content.
    #[must_use]
    pub fn resolved_title(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map_or_else(
                || truncate_with_ellipsis(self.content.trim(), ENTRY_TITLE_PREVIEW_CHARS),
                str::to_string,
            )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMoods {
    List(Vec<Mood>),
    Single(String),
}

/// Moods arrive as an array, a JSON-encoded array string, a single id, or null.
fn deserialize_moods<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<Mood>, D::Error> {
    Ok(match Option::<RawMoods>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RawMoods::List(moods)) => moods,
        Some(RawMoods::Single(text)) => parse_mood_text(&text),
    })
}

fn parse_mood_text(text: &str) -> Vec<Mood> {
    if let Ok(moods) = serde_json::from_str::<Vec<Mood>>(text) {
        return moods;
    }
    let text = text.trim();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Mood::from(text.to_string())]
    }
}

#[derive(Deserialize)]
struct ImageObject {
    url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawImage {
    Text(String),
    Object(ImageObject),
}

/// Images are plain strings; legacy rows hold `{url}` objects, sometimes
/// JSON-encoded inside a string.
fn deserialize_images<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    let raw = Option::<Vec<RawImage>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|image| match image {
            RawImage::Object(object) => Some(object.url),
            RawImage::Text(text) => match serde_json::from_str::<ImageObject>(&text) {
                Ok(object) => Some(object.url),
                Err(_) => Some(text),
            },
        })
        .filter(|url| !url.trim().is_empty())
        .collect())
}
