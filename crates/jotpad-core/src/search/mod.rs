//! Search over a note snapshot.
//!
//! Matching is a case-insensitive substring test against title and content,
//! applied to whatever snapshot the caller already holds; order is preserved.

use crate::models::Note;

/// Notes whose title or content contains `query`. An empty or whitespace-only
/// query returns every note.
pub fn filter_notes<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    let query = query.trim();
    if query.is_empty() {
        return notes.iter().collect();
    }
    notes.iter().filter(|note| note.matches(query)).collect()
}
