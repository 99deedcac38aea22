//! The note backing-store capability shared by the offline and remote stores.

use async_trait::async_trait;

use crate::models::{NewNote, NoteId, NotePatch};
use crate::subscription::{NotesListener, Subscription};
use crate::Result;

/// CRUD plus live subscription, scoped by owner identity.
///
/// Every snapshot handed to a listener holds only notes owned by the
/// subscribed user, sorted newest first.
#[async_trait]
pub trait NoteBackend: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &'static str;

    /// Create a note owned by `user_id` and return its store-assigned id.
    async fn create_note(&self, user_id: &str, data: NewNote) -> Result<NoteId>;

    /// Apply `patch` and refresh the timestamp. Fails with `NotFound` for an unknown id.
    async fn update_note(&self, id: &NoteId, patch: NotePatch) -> Result<()>;

    /// Hard delete. Fails with `NotFound` for an unknown id.
    async fn delete_note(&self, id: &NoteId) -> Result<()>;

    /// Deliver the current snapshot, then every subsequent change, until the
    /// returned handle is unsubscribed or dropped.
    async fn subscribe(&self, user_id: &str, listener: NotesListener) -> Result<Subscription>;
}
