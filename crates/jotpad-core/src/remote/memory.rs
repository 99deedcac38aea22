//! In-process document store standing in for the remote database.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::DocumentClient;
use crate::models::{NewNote, Note, NoteId, NotePatch};
use crate::{Error, Result};

/// Multi-user note documents held in memory, with switches to simulate
/// connectivity loss.
#[derive(Debug, Default)]
pub struct MemoryDocumentClient {
    state: Mutex<MemoryState>,
}

#[derive(Debug)]
struct MemoryState {
    documents: Vec<Note>,
    available: bool,
    failures_remaining: u32,
    calls: u64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            available: true,
            failures_remaining: 0,
            calls: 0,
        }
    }
}

impl MemoryDocumentClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// While unavailable every call fails with `BackingStoreUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Fail the next `count` calls as if the network dropped them.
    pub fn fail_next_calls(&self, count: u32) {
        self.lock().failures_remaining = count;
    }

    /// Number of calls received, including failed ones.
    pub fn call_count(&self) -> u64 {
        self.lock().calls
    }

    /// Begin a call, failing when connectivity is simulated as lost.
    fn begin(&self) -> Result<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        state.calls += 1;
        if !state.available {
            return Err(Error::BackingStoreUnavailable(
                "document store is offline".to_string(),
            ));
        }
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(Error::BackingStoreUnavailable(
                "connection reset".to_string(),
            ));
        }
        Ok(state)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentClient for MemoryDocumentClient {
    async fn insert(&self, user_id: &str, data: &NewNote) -> Result<NoteId> {
        let mut state = self.begin()?;
        let note = Note::new(user_id, data.clone());
        let id = note.id.clone();
        state.documents.push(note);
        Ok(id)
    }

    async fn patch(&self, id: &NoteId, patch: &NotePatch) -> Result<()> {
        let mut state = self.begin()?;
        let note = state
            .documents
            .iter_mut()
            .find(|note| &note.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        note.apply(patch.clone());
        Ok(())
    }

    async fn remove(&self, id: &NoteId) -> Result<()> {
        let mut state = self.begin()?;
        let index = state
            .documents
            .iter()
            .position(|note| &note.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        state.documents.remove(index);
        Ok(())
    }

    async fn query(&self, user_id: &str) -> Result<Vec<Note>> {
        let state = self.begin()?;
        Ok(state
            .documents
            .iter()
            .filter(|note| note.user_id == user_id)
            .cloned()
            .collect())
    }
}
