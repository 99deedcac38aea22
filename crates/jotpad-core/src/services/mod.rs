//! Services consumed by Jotpad interfaces.

mod notes;
mod session;

pub use notes::{NoteRepository, NotesView};
pub use session::Session;
