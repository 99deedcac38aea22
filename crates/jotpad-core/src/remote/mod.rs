//! Remote note store adapter.
//!
//! Wraps a [`DocumentClient`] (the remote document database) with one retry
//! policy for every call and turns its point-in-time queries into a live
//! subscription by polling.

mod http;
mod memory;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::backend::NoteBackend;
use crate::models::{sort_newest_first, NewNote, Note, NoteId, NotePatch};
use crate::retry::RetryPolicy;
use crate::subscription::{NotesListener, Subscription};
use crate::Result;

pub use http::HttpDocumentClient;
pub use memory::MemoryDocumentClient;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The remote document database holding every user's notes.
///
/// The server assigns ids and timestamps. Connectivity failures must be
/// reported as `BackingStoreUnavailable` so the retry policy can act on them.
#[async_trait]
pub trait DocumentClient: Send + Sync + 'static {
    async fn insert(&self, user_id: &str, data: &NewNote) -> Result<NoteId>;

    async fn patch(&self, id: &NoteId, patch: &NotePatch) -> Result<()>;

    async fn remove(&self, id: &NoteId) -> Result<()>;

    /// All notes owned by `user_id`, in any order.
    async fn query(&self, user_id: &str) -> Result<Vec<Note>>;
}

pub struct RemoteNoteStore<C> {
    client: Arc<C>,
    retry: RetryPolicy,
    poll_interval: Duration,
    /// Bumped after every mutation made through this store so live
    /// subscriptions re-poll right away
    revision: Arc<watch::Sender<u64>>,
}

impl<C> Clone for RemoteNoteStore<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            retry: self.retry,
            poll_interval: self.poll_interval,
            revision: Arc::clone(&self.revision),
        }
    }
}

impl<C: DocumentClient> RemoteNoteStore<C> {
    pub fn new(client: C) -> Self {
        Self::from_shared(Arc::new(client))
    }

    pub fn from_shared(client: Arc<C>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            client,
            retry: RetryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            revision: Arc::new(revision),
        }
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn mark_changed(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

/// Query with retries, keep only `user_id`'s notes, sort newest first.
async fn fetch_snapshot<C: DocumentClient>(
    client: &C,
    retry: &RetryPolicy,
    user_id: &str,
) -> Result<Vec<Note>> {
    let mut notes = retry
        .run("query notes", move || client.query(user_id))
        .await?;
    notes.retain(|note| note.user_id == user_id);
    sort_newest_first(&mut notes);
    Ok(notes)
}

#[async_trait]
impl<C: DocumentClient> NoteBackend for RemoteNoteStore<C> {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn create_note(&self, user_id: &str, data: NewNote) -> Result<NoteId> {
        let client = &self.client;
        let data = &data;
        let id = self
            .retry
            .run("create note", move || client.insert(user_id, data))
            .await?;
        self.mark_changed();
        tracing::debug!("Created remote note {id}");
        Ok(id)
    }

    async fn update_note(&self, id: &NoteId, patch: NotePatch) -> Result<()> {
        let client = &self.client;
        let patch = &patch;
        self.retry
            .run("update note", move || client.patch(id, patch))
            .await?;
        self.mark_changed();
        tracing::debug!("Updated remote note {id}");
        Ok(())
    }

    async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let client = &self.client;
        self.retry
            .run("delete note", move || client.remove(id))
            .await?;
        self.mark_changed();
        tracing::debug!("Deleted remote note {id}");
        Ok(())
    }

    /// The initial snapshot is fetched before returning, so an unreachable
    /// store fails the subscribe call itself. Later poll failures are logged
    /// and polling continues.
    async fn subscribe(&self, user_id: &str, listener: NotesListener) -> Result<Subscription> {
        // Taken before the first fetch so a mutation racing the task start
        // still wakes the poller.
        let mut changes = self.revision.subscribe();
        let initial = fetch_snapshot(self.client.as_ref(), &self.retry, user_id).await?;
        listener(initial.clone());

        let active = Arc::new(AtomicBool::new(true));
        let task_active = Arc::clone(&active);
        let client = Arc::clone(&self.client);
        let retry = self.retry;
        let poll_interval = self.poll_interval;
        let user_id = user_id.to_string();

        let task = tokio::spawn(async move {
            let mut last = initial;
            // Cleared once the store is dropped; polling then runs on the timer alone.
            let mut store_alive = true;
            loop {
                tokio::select! {
                    () = tokio::time::sleep(poll_interval) => {}
                    changed = changes.changed(), if store_alive => {
                        store_alive = changed.is_ok();
                    }
                }

                match fetch_snapshot(client.as_ref(), &retry, &user_id).await {
                    Ok(notes) if notes != last => {
                        if !task_active.load(Ordering::Acquire) {
                            break;
                        }
                        listener(notes.clone());
                        last = notes;
                    }
                    Ok(_) => {}
                    Err(error) => {
                        tracing::warn!("Notes subscription poll failed for {user_id}: {error}");
                    }
                }
            }
        });

        tracing::debug!("Opened remote notes subscription");
        Ok(Subscription::new(move || {
            active.store(false, Ordering::Release);
            task.abort();
            tracing::debug!("Closed remote notes subscription");
        }))
    }
}
