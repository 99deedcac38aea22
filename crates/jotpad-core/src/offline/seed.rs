//! Welcome notes written into an empty demo store.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Note, NoteId};

const WELCOME_CONTENT: &str = "This is an offline demo of the notes app. You can create, edit, and delete notes even without an internet connection!

All features are available:
• Create new notes
• Edit existing notes
• Search and filter
• Delete notes

Your demo notes are saved on this device and stay until you reset the demo.";

const FEATURES_CONTENT: &str = "📝 Quick note capture
🔍 Real-time search across titles and content
💾 Notes saved locally in demo mode
🔄 Live updates whenever a note changes";

const TRY_IT_CONTENT: &str = "Add a note of your own and watch the list update. Everything works just like the real app!";

/// Three deterministic demo notes, the newest first, stamped relative to `now`.
pub(super) fn demo_notes(owner: &str, now: DateTime<Utc>) -> Vec<Note> {
    [
        ("Welcome to Demo Mode! 🎉", WELCOME_CONTENT, 1),
        ("Features Overview", FEATURES_CONTENT, 2),
        ("Try Creating a Note!", TRY_IT_CONTENT, 3),
    ]
    .into_iter()
    .map(|(title, content, minutes_ago)| Note {
        id: NoteId::generate(),
        title: title.to_string(),
        content: content.to_string(),
        user_id: owner.to_string(),
        timestamp: now - Duration::minutes(minutes_ago),
    })
    .collect()
}
