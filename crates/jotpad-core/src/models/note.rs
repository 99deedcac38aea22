//! Note model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque note identifier.
///
/// Remote stores assign their own ids; locally generated ids are UUID v7,
/// which combine a millisecond clock reading with random bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generate a new unique note ID
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, immutable after creation
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Owner identifier
    pub user_id: String,
    /// Last-modified instant, refreshed on every create and update
    pub timestamp: DateTime<Utc>,
}

impl Note {
    /// Build a note owned by `user_id`, stamped with the current time.
    #[must_use]
    pub fn new(user_id: impl Into<String>, data: NewNote) -> Self {
        Self {
            id: NoteId::generate(),
            title: data.title,
            content: data.content,
            user_id: user_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Apply the supplied fields of `patch` and refresh the timestamp.
    pub fn apply(&mut self, patch: NotePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        self.timestamp = Utc::now();
    }

    /// Case-insensitive substring match against title and content
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.content.to_lowercase().contains(&query)
    }

    /// Get first line of the title (or content when untitled), truncated to `max_len` characters
    #[must_use]
    pub fn title_preview(&self, max_len: usize) -> String {
        let source = if self.title.trim().is_empty() {
            &self.content
        } else {
            &self.title
        };
        source
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

/// Fields supplied when creating a note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
}

impl NewNote {
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Both title and content are empty after trimming.
    ///
    /// Stores accept blank notes; callers reject them before saving.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }

    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self::new(self.title.trim(), self.content.trim())
    }
}

/// Partial update; only `Some` fields change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NotePatch {
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }

    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// Sort newest first. Equal timestamps keep their existing relative order.
pub fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashSet;

    fn note_at(title: &str, offset_secs: i64) -> Note {
        let mut note = Note::new("user-1", NewNote::new(title, ""));
        note.timestamp = Utc::now() + Duration::seconds(offset_secs);
        note
    }

    #[test]
    fn test_note_id_unique() {
        let ids = (0..1000).map(|_| NoteId::generate()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_note_new() {
        let before = Utc::now();
        let note = Note::new("user-1", NewNote::new("Groceries", "Milk, eggs"));
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "Milk, eggs");
        assert_eq!(note.user_id, "user-1");
        assert!(note.timestamp >= before);
    }

    #[test]
    fn test_apply_patch_changes_only_supplied_fields() {
        let mut note = Note::new("user-1", NewNote::new("Old", "Body"));
        let previous = note.timestamp;

        note.apply(NotePatch::title("New"));

        assert_eq!(note.title, "New");
        assert_eq!(note.content, "Body");
        assert_eq!(note.user_id, "user-1");
        assert!(note.timestamp >= previous);
    }

    #[test]
    fn test_serialized_shape_uses_camel_case_and_rfc3339() {
        let note = Note::new("user-1", NewNote::new("t", "c"));
        let value = serde_json::to_value(&note).unwrap();

        assert_eq!(value["userId"], "user-1");
        let raw = value["timestamp"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(raw).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), note.timestamp);
    }

    #[test]
    fn test_sort_newest_first_is_stable_for_ties() {
        let a = note_at("a", -10);
        let b = note_at("b", 0);
        let mut c = note_at("c", 0);
        c.timestamp = b.timestamp;

        let mut notes = vec![a, b, c];
        sort_newest_first(&mut notes);

        let titles = notes.iter().map(|n| n.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let note = Note::new("u", NewNote::new("Shopping List", "Milk and EGGS"));
        assert!(note.matches("shopping"));
        assert!(note.matches("eggs"));
        assert!(!note.matches("bread"));
    }

    #[test]
    fn test_blank_detection() {
        assert!(NewNote::new("  ", "\n").is_blank());
        assert!(!NewNote::new("", "body").is_blank());
        assert_eq!(NewNote::new(" a ", " b ").trimmed(), NewNote::new("a", "b"));
    }

    #[test]
    fn test_title_preview_falls_back_to_content() {
        let titled = Note::new("u", NewNote::new("First line\nSecond", ""));
        assert_eq!(titled.title_preview(5), "First");

        let untitled = Note::new("u", NewNote::new("", "Body text"));
        assert_eq!(untitled.title_preview(50), "Body text");
    }
}
