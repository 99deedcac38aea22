//! Note repository facade: routes CRUD and the live note list to the store
//! that backs the current session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::backend::NoteBackend;
use crate::models::{Identity, NewNote, Note, NoteId, NotePatch};
use crate::search::filter_notes;
use crate::state::{SessionState, StoreMode};
use crate::subscription::{listener, Subscription};
use crate::{Error, Result};

/// What a UI renders: the latest snapshot plus load and error flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotesView {
    pub notes: Vec<Note>,
    pub loading: bool,
    pub error: Option<String>,
    pub mode: Option<StoreMode>,
    /// Owner the current subscription is scoped to
    pub user_id: Option<String>,
}

#[derive(Clone, Copy)]
enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    const fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    fn failure_message(self, mode: StoreMode) -> String {
        match mode {
            StoreMode::OfflineDemo => format!("Failed to {} note in demo mode", self.verb()),
            StoreMode::Online => format!(
                "Failed to {} note. Please check your connection.",
                self.verb()
            ),
        }
    }
}

const LOAD_FAILURE_MESSAGE: &str = "Failed to load notes. Please check your connection.";

/// Holds at most one live subscription and republishes its snapshots as a
/// [`NotesView`].
pub struct NoteRepository {
    offline: Arc<dyn NoteBackend>,
    online: Option<Arc<dyn NoteBackend>>,
    view: Arc<watch::Sender<NotesView>>,
    /// Bumped on every (re)subscription; callbacks from older ones are ignored
    generation: Arc<AtomicU64>,
    active: Mutex<Option<Subscription>>,
}

impl std::fmt::Debug for NoteRepository {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("NoteRepository")
            .field("offline", &self.offline.name())
            .field("online", &self.online.as_ref().map(|backend| backend.name()))
            .field("view", &*self.view.borrow())
            .finish_non_exhaustive()
    }
}

impl NoteRepository {
    pub fn new(offline: Arc<dyn NoteBackend>, online: Option<Arc<dyn NoteBackend>>) -> Self {
        let (view, _) = watch::channel(NotesView::default());
        Self {
            offline,
            online,
            view: Arc::new(view),
            generation: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(None),
        }
    }

    pub fn has_online_store(&self) -> bool {
        self.online.is_some()
    }

    /// Latest snapshot delivered by the active subscription.
    pub fn notes(&self) -> Vec<Note> {
        self.view.borrow().notes.clone()
    }

    pub fn view(&self) -> NotesView {
        self.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<NotesView> {
        self.view.subscribe()
    }

    /// Notes from the latest snapshot matching `query`, newest first.
    pub fn search(&self, query: &str) -> Vec<Note> {
        let view = self.view.borrow();
        filter_notes(&view.notes, query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Resolve once the current subscription has delivered its first snapshot
    /// or failed.
    pub async fn wait_until_loaded(&self) -> NotesView {
        let mut receiver = self.view.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let view = match receiver.wait_for(|view| !view.loading).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        };
        view
    }

    /// Tear down any previous subscription, then subscribe to the store for
    /// `mode`. In demo mode `user_id` is replaced by the demo identity.
    pub async fn observe_notes(&self, user_id: &str, mode: StoreMode) -> Result<()> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            previous.unsubscribe();
        }

        let owner = match mode {
            StoreMode::Online => user_id.to_string(),
            StoreMode::OfflineDemo => Identity::offline_demo().uid,
        };
        let generation = self.begin_generation(Some(mode), Some(owner.clone()), true);

        let backend = match self.backend_for(mode) {
            Ok(backend) => backend,
            Err(error) => return Err(self.fail_load(generation, error)),
        };

        let view = Arc::clone(&self.view);
        let current = Arc::clone(&self.generation);
        let on_notes = listener(move |notes: Vec<Note>| {
            view.send_if_modified(|view| {
                if current.load(Ordering::Acquire) != generation {
                    return false;
                }
                view.notes = notes;
                view.loading = false;
                view.error = None;
                true
            });
        });

        match backend.subscribe(&owner, on_notes).await {
            Ok(subscription) => {
                tracing::debug!("Observing {} notes for {owner}", backend.name());
                *active = Some(subscription);
                Ok(())
            }
            Err(error) => Err(self.fail_load(generation, error)),
        }
    }

    /// Drop the live subscription and clear the list.
    pub async fn stop_observing(&self) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            previous.unsubscribe();
        }
        self.begin_generation(None, None, false);
    }

    /// Observe whatever `session` calls for. Does nothing when the target
    /// store and owner are already being observed.
    pub async fn sync_with_session(&self, session: &SessionState) -> Result<()> {
        let (Some(mode), Some(identity)) = (session.store_mode(), session.identity()) else {
            self.stop_observing().await;
            return Ok(());
        };

        let unchanged = {
            let view = self.view.borrow();
            view.mode == Some(mode) && view.user_id.as_deref() == Some(identity.uid.as_str())
        };
        if unchanged && self.active.lock().await.is_some() {
            return Ok(());
        }
        self.observe_notes(&identity.uid, mode).await
    }

    pub async fn create_note(&self, data: NewNote) -> Result<NoteId> {
        let (mode, owner) = self.current_target()?;
        self.clear_error();
        let result = match self.backend_for(mode) {
            Ok(backend) => backend.create_note(&owner, data).await,
            Err(error) => Err(error),
        };
        result.map_err(|error| self.fail(Action::Create, mode, error))
    }

    pub async fn update_note(&self, id: &NoteId, patch: NotePatch) -> Result<()> {
        let (mode, _) = self.current_target()?;
        self.clear_error();
        let result = match self.backend_for(mode) {
            Ok(backend) => backend.update_note(id, patch).await,
            Err(error) => Err(error),
        };
        result.map_err(|error| self.fail(Action::Update, mode, error))
    }

    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let (mode, _) = self.current_target()?;
        self.clear_error();
        let result = match self.backend_for(mode) {
            Ok(backend) => backend.delete_note(id).await,
            Err(error) => Err(error),
        };
        result.map_err(|error| self.fail(Action::Delete, mode, error))
    }

    fn backend_for(&self, mode: StoreMode) -> Result<&Arc<dyn NoteBackend>> {
        match mode {
            StoreMode::OfflineDemo => Ok(&self.offline),
            StoreMode::Online => self.online.as_ref().ok_or_else(|| {
                Error::BackingStoreUnavailable("no remote note store is configured".to_string())
            }),
        }
    }

    fn current_target(&self) -> Result<(StoreMode, String)> {
        let view = self.view.borrow();
        match (view.mode, view.user_id.as_ref()) {
            (Some(mode), Some(owner)) => Ok((mode, owner.clone())),
            _ => Err(Error::ModeMismatch(
                "no note subscription is established".to_string(),
            )),
        }
    }

    /// Start a new generation and reset the view for it.
    fn begin_generation(
        &self,
        mode: Option<StoreMode>,
        user_id: Option<String>,
        loading: bool,
    ) -> u64 {
        let mut generation = 0;
        self.view.send_modify(|view| {
            generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            *view = NotesView {
                notes: Vec::new(),
                loading,
                error: None,
                mode,
                user_id,
            };
        });
        generation
    }

    fn fail_load(&self, generation: u64, error: Error) -> Error {
        tracing::warn!("Notes subscription failed: {error}");
        self.view.send_if_modified(|view| {
            if self.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            view.loading = false;
            view.error = Some(LOAD_FAILURE_MESSAGE.to_string());
            true
        });
        error.with_message(LOAD_FAILURE_MESSAGE)
    }

    fn fail(&self, action: Action, mode: StoreMode, error: Error) -> Error {
        let message = action.failure_message(mode);
        tracing::warn!("{message}: {error}");
        self.view.send_modify(|view| view.error = Some(message.clone()));
        error.with_message(message)
    }

    fn clear_error(&self) {
        self.view.send_if_modified(|view| view.error.take().is_some());
    }
}
