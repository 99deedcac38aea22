//! Data models for Jotpad

mod identity;
mod note;

pub use identity::Identity;
pub use note::{sort_newest_first, NewNote, Note, NoteId, NotePatch};
