//! Offline demo note store.
//!
//! A device-resident substitute for the remote note store. All notes belong to
//! the synthetic demo identity; the list is mirrored to a durable key-value
//! slot after every mutation. Storage failures are logged and the in-memory
//! list stays authoritative for the rest of the session.

mod seed;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::backend::NoteBackend;
use crate::models::{sort_newest_first, Identity, NewNote, Note, NoteId, NotePatch};
use crate::storage::{KeyValueStore, MemoryKeyValueStore};
use crate::subscription::{ListenerRegistry, NotesListener, Subscription};
use crate::{Error, Result};

/// Slot holding the serialized note list
pub const NOTES_STORAGE_KEY: &str = "offline_demo_notes";
/// Slot reserved for the synthetic identity record
pub const USER_STORAGE_KEY: &str = "offline_demo_user";

/// Shared handle to the offline store; clones see the same notes.
#[derive(Clone)]
pub struct LocalNoteStore {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn KeyValueStore>,
    demo_user: Identity,
    state: Mutex<StoreState>,
    listeners: ListenerRegistry<Vec<Note>>,
}

struct StoreState {
    /// Insertion order
    notes: Vec<Note>,
    /// Bumped on every change; starts at 1 so the first snapshot is deliverable
    version: u64,
}

impl StoreState {
    /// Bump the version and take the snapshot listeners will receive.
    fn publish(&mut self) -> (u64, Vec<Note>) {
        self.version += 1;
        (self.version, sorted(&self.notes))
    }
}

enum Loaded {
    Notes(Vec<Note>),
    Missing,
    Corrupt,
}

impl LocalNoteStore {
    /// Create a store over `storage`. Call [`LocalNoteStore::initialize`] before use.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                demo_user: Identity::offline_demo(),
                state: Mutex::new(StoreState {
                    notes: Vec::new(),
                    version: 1,
                }),
                listeners: ListenerRegistry::new(),
            }),
        }
    }

    /// A store whose durable slot lives only in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    pub fn demo_user(&self) -> &Identity {
        &self.inner.demo_user
    }

    /// Load the persisted note list, seeding welcome notes when it is absent
    /// or unreadable. Safe to call repeatedly: existing data is reused, never
    /// reseeded or duplicated.
    pub fn initialize(&self) {
        self.commit(|notes| match self.load() {
            Loaded::Notes(loaded) => {
                tracing::info!("Loaded {} offline demo notes", loaded.len());
                *notes = loaded;
            }
            Loaded::Missing | Loaded::Corrupt if !notes.is_empty() => {
                tracing::warn!(
                    "Offline demo slot is unavailable; keeping {} in-memory notes",
                    notes.len()
                );
            }
            Loaded::Missing | Loaded::Corrupt => {
                *notes = seed::demo_notes(&self.inner.demo_user.uid, Utc::now());
                tracing::info!("Seeded {} offline demo notes", notes.len());
            }
        });
    }

    /// Snapshot of all notes, newest first.
    pub fn get_notes(&self) -> Vec<Note> {
        sorted(&self.lock_state().notes)
    }

    pub fn create_note(&self, data: NewNote) -> NoteId {
        let note = Note::new(self.inner.demo_user.uid.clone(), data);
        let id = note.id.clone();
        self.commit(|notes| notes.push(note));
        tracing::debug!("Created offline note {id}");
        id
    }

    pub fn update_note(&self, id: &NoteId, patch: NotePatch) -> Result<()> {
        self.try_commit(|notes| {
            let note = notes
                .iter_mut()
                .find(|note| &note.id == id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            note.apply(patch);
            Ok(())
        })?;
        tracing::debug!("Updated offline note {id}");
        Ok(())
    }

    pub fn delete_note(&self, id: &NoteId) -> Result<()> {
        self.try_commit(|notes| {
            let index = notes
                .iter()
                .position(|note| &note.id == id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            notes.remove(index);
            Ok(())
        })?;
        tracing::debug!("Deleted offline note {id}");
        Ok(())
    }

    /// Register `listener`; it receives the current snapshot immediately and
    /// again after every change.
    pub fn subscribe_to_notes(&self, listener: NotesListener) -> Subscription {
        let (id, version, snapshot) = {
            let state = self.lock_state();
            let id = self.inner.listeners.register(listener);
            (id, state.version, sorted(&state.notes))
        };
        self.inner.listeners.notify_one(id, version, &snapshot);
        self.inner.listeners.subscription(id)
    }

    /// Erase both durable slots and empty the in-memory list. Does not reseed.
    pub fn clear_demo_data(&self) {
        let (version, snapshot) = {
            let mut state = self.lock_state();
            for key in [NOTES_STORAGE_KEY, USER_STORAGE_KEY] {
                if let Err(error) = self.inner.storage.remove(key) {
                    tracing::warn!("Failed to remove offline slot {key}: {error}");
                }
            }
            state.notes.clear();
            state.publish()
        };
        self.inner.listeners.notify_all(version, &snapshot);
        tracing::info!("Cleared offline demo data");
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Run `mutate`, persist, then notify listeners once the lock is released.
    /// A failed mutation changes nothing and notifies no one.
    fn try_commit<T>(&self, mutate: impl FnOnce(&mut Vec<Note>) -> Result<T>) -> Result<T> {
        let (value, version, snapshot) = {
            let mut state = self.lock_state();
            let value = mutate(&mut state.notes)?;
            self.persist(&state.notes);
            let (version, snapshot) = state.publish();
            (value, version, snapshot)
        };
        self.inner.listeners.notify_all(version, &snapshot);
        Ok(value)
    }

    fn commit(&self, mutate: impl FnOnce(&mut Vec<Note>)) {
        let (version, snapshot) = {
            let mut state = self.lock_state();
            mutate(&mut state.notes);
            self.persist(&state.notes);
            state.publish()
        };
        self.inner.listeners.notify_all(version, &snapshot);
    }

    fn load(&self) -> Loaded {
        let raw = match self.inner.storage.get(NOTES_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Loaded::Missing,
            Err(error) => {
                tracing::warn!("Failed to read offline demo notes: {error}");
                return Loaded::Corrupt;
            }
        };

        match serde_json::from_str::<Vec<Note>>(&raw) {
            Ok(notes) => {
                let owner = &self.inner.demo_user.uid;
                let total = notes.len();
                let owned = notes
                    .into_iter()
                    .filter(|note| &note.user_id == owner)
                    .collect::<Vec<_>>();
                if owned.len() != total {
                    tracing::warn!(
                        "Dropped {} stored notes owned by other users",
                        total - owned.len()
                    );
                }
                Loaded::Notes(owned)
            }
            Err(error) => {
                tracing::warn!("Stored offline demo notes are corrupt: {error}");
                Loaded::Corrupt
            }
        }
    }

    fn persist(&self, notes: &[Note]) {
        let result = serde_json::to_string(notes)
            .map_err(Error::from)
            .and_then(|payload| self.inner.storage.set(NOTES_STORAGE_KEY, &payload));
        if let Err(error) = result {
            tracing::warn!("Persistence degraded, keeping notes in memory only: {error}");
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn sorted(notes: &[Note]) -> Vec<Note> {
    let mut snapshot = notes.to_vec();
    sort_newest_first(&mut snapshot);
    snapshot
}

#[async_trait]
impl NoteBackend for LocalNoteStore {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn create_note(&self, user_id: &str, data: NewNote) -> Result<NoteId> {
        if user_id != self.inner.demo_user.uid {
            tracing::debug!("Offline store ignores owner {user_id}; using demo user");
        }
        Ok(Self::create_note(self, data))
    }

    async fn update_note(&self, id: &NoteId, patch: NotePatch) -> Result<()> {
        Self::update_note(self, id, patch)
    }

    async fn delete_note(&self, id: &NoteId) -> Result<()> {
        Self::delete_note(self, id)
    }

    async fn subscribe(&self, _user_id: &str, listener: NotesListener) -> Result<Subscription> {
        Ok(self.subscribe_to_notes(listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::listener;
    use crate::storage::FileKeyValueStore;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    /// Storage whose writes always fail.
    struct BrokenStorage;

    impl KeyValueStore for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Storage("disk unavailable".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Storage("disk unavailable".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Err(Error::Storage("disk unavailable".to_string()))
        }
    }

    fn initialized() -> LocalNoteStore {
        let store = LocalNoteStore::in_memory();
        store.initialize();
        store
    }

    fn recorder() -> (NotesListener, Arc<Mutex<Vec<Vec<Note>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (listener(move |notes: Vec<Note>| sink.lock().unwrap().push(notes)), seen)
    }

    fn titles(notes: &[Note]) -> Vec<String> {
        notes.iter().map(|note| note.title.clone()).collect()
    }

    fn assert_newest_first(notes: &[Note]) {
        assert!(notes
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    }

    #[test]
    fn initialize_seeds_empty_slot() {
        let store = initialized();
        let notes = store.get_notes();

        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].title, "Welcome to Demo Mode! 🎉");
        assert!(notes.iter().all(|note| note.user_id == "offline-demo-user"));
    }

    #[test]
    fn initialize_twice_does_not_reseed() {
        let store = initialized();
        let first = store.get_notes();
        store.initialize();

        assert_eq!(store.get_notes(), first);
    }

    #[test]
    fn initialize_reseeds_corrupt_slot_and_persists() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage.set(NOTES_STORAGE_KEY, "{not json").unwrap();

        let store = LocalNoteStore::new(storage.clone());
        store.initialize();

        assert_eq!(store.get_notes().len(), 3);
        let persisted = storage.get(NOTES_STORAGE_KEY).unwrap().unwrap();
        let reloaded: Vec<Note> = serde_json::from_str(&persisted).unwrap();
        assert_eq!(reloaded.len(), 3);
    }

    #[test]
    fn initialize_notifies_subscribers() {
        let store = LocalNoteStore::in_memory();
        let (callback, seen) = recorder();
        let _subscription = store.subscribe_to_notes(callback);

        store.initialize();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_empty());
        assert_eq!(seen[1].len(), 3);
    }

    #[test]
    fn create_ids_are_unique() {
        let store = initialized();
        let ids = (0..200)
            .map(|i| store.create_note(NewNote::new(format!("note {i}"), "")))
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn create_then_get_round_trips() {
        let store = initialized();
        let before = Utc::now();
        let id = store.create_note(NewNote::new("Groceries", "Milk, eggs"));

        let notes = store.get_notes();
        assert_eq!(notes.len(), 4);
        assert_eq!(notes[0].id, id);
        assert_eq!(notes[0].title, "Groceries");
        assert_eq!(notes[0].content, "Milk, eggs");
        assert_eq!(notes[0].user_id, "offline-demo-user");
        assert!(notes[0].timestamp >= before);
        assert_eq!(notes.iter().filter(|note| note.id == id).count(), 1);
    }

    #[test]
    fn update_patches_only_supplied_fields() {
        let store = initialized();
        let id = store.create_note(NewNote::new("Old", "Body"));
        let before = store.get_notes().into_iter().find(|n| n.id == id).unwrap();

        store.update_note(&id, NotePatch::title("X")).unwrap();

        let after = store.get_notes().into_iter().find(|n| n.id == id).unwrap();
        assert_eq!(after.title, "X");
        assert_eq!(after.content, "Body");
        assert_eq!(after.user_id, before.user_id);
        assert!(after.timestamp >= before.timestamp);
    }

    #[test]
    fn update_moves_note_to_front() {
        let store = initialized();
        let oldest = store.get_notes().last().unwrap().id.clone();

        store.update_note(&oldest, NotePatch::content("fresh")).unwrap();

        assert_eq!(store.get_notes()[0].id, oldest);
    }

    #[test]
    fn update_missing_note_fails_without_change() {
        let store = initialized();
        let (callback, seen) = recorder();
        let _subscription = store.subscribe_to_notes(callback);

        let error = store
            .update_note(&NoteId::from("missing"), NotePatch::title("x"))
            .unwrap_err();

        assert!(error.is_not_found());
        assert_eq!(store.get_notes().len(), 3);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn delete_removes_exactly_one() {
        let store = initialized();
        let seeded = store.get_notes();
        let id = store.create_note(NewNote::new("Groceries", "Milk, eggs"));

        store.delete_note(&id).unwrap();

        let notes = store.get_notes();
        assert_eq!(notes, seeded);
        assert!(notes.iter().all(|note| note.id != id));
    }

    #[test]
    fn delete_missing_note_fails_with_not_found() {
        let store = initialized();
        let error = store.delete_note(&NoteId::from("missing")).unwrap_err();

        assert!(matches!(error, Error::NotFound(_)));
        assert_eq!(store.get_notes().len(), 3);
    }

    #[test]
    fn subscribe_delivers_snapshot_then_changes() {
        let store = initialized();
        let (callback, seen) = recorder();
        let subscription = store.subscribe_to_notes(callback);

        store.create_note(NewNote::new("Groceries", ""));
        subscription.unsubscribe();
        store.create_note(NewNote::new("Ignored", ""));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].len(), 3);
        assert_eq!(seen[1][0].title, "Groceries");
        for snapshot in seen.iter() {
            assert_newest_first(snapshot);
        }
    }

    #[test]
    fn unsubscribing_one_listener_keeps_others() {
        let store = initialized();
        let (first, first_seen) = recorder();
        let (second, second_seen) = recorder();
        let first_subscription = store.subscribe_to_notes(first);
        let _second_subscription = store.subscribe_to_notes(second);
        assert_eq!(store.subscriber_count(), 2);

        first_subscription.unsubscribe();
        store.create_note(NewNote::new("After", ""));

        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(first_seen.lock().unwrap().len(), 1);
        assert_eq!(second_seen.lock().unwrap().len(), 2);
        assert_eq!(store.get_notes().len(), 4);
    }

    #[test]
    fn clear_empties_and_initialize_reseeds() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let store = LocalNoteStore::new(storage.clone());
        store.initialize();
        storage.set(USER_STORAGE_KEY, "{}").unwrap();
        let (callback, seen) = recorder();
        let _subscription = store.subscribe_to_notes(callback);

        store.clear_demo_data();

        assert!(store.get_notes().is_empty());
        assert_eq!(storage.get(NOTES_STORAGE_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_STORAGE_KEY).unwrap(), None);
        assert!(seen.lock().unwrap().last().unwrap().is_empty());

        store.initialize();
        assert_eq!(store.get_notes().len(), 3);
    }

    #[test]
    fn storage_failures_degrade_to_memory() {
        let store = LocalNoteStore::new(Arc::new(BrokenStorage));
        store.initialize();
        assert_eq!(store.get_notes().len(), 3);

        let id = store.create_note(NewNote::new("Kept", ""));
        store.initialize();

        let notes = store.get_notes();
        assert_eq!(notes.len(), 4);
        assert!(notes.iter().any(|note| note.id == id));

        store.clear_demo_data();
        assert!(store.get_notes().is_empty());
    }

    #[test]
    fn reload_from_same_slot_preserves_notes() {
        let dir = tempfile::tempdir().unwrap();
        let created = {
            let storage = Arc::new(FileKeyValueStore::open(dir.path()).unwrap());
            let store = LocalNoteStore::new(storage);
            store.initialize();
            store.create_note(NewNote::new("Groceries", "Milk, eggs"));
            store.get_notes()
        };

        let storage = Arc::new(FileKeyValueStore::open(dir.path()).unwrap());
        let restarted = LocalNoteStore::new(storage);
        restarted.initialize();
        let reloaded = restarted.get_notes();

        assert_eq!(titles(&reloaded), titles(&created));
        for (before, after) in created.iter().zip(&reloaded) {
            assert_eq!(after.id, before.id);
            assert_eq!(after.content, before.content);
            assert_eq!(after.user_id, before.user_id);
            assert_eq!(
                after.timestamp.timestamp_millis(),
                before.timestamp.timestamp_millis()
            );
        }
    }

    #[test]
    fn load_drops_notes_of_other_users() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let mut foreign = Note::new("someone-else", NewNote::new("Private", ""));
        foreign.timestamp = Utc::now() - Duration::hours(1);
        let own = Note::new("offline-demo-user", NewNote::new("Mine", ""));
        storage
            .set(
                NOTES_STORAGE_KEY,
                &serde_json::to_string(&vec![foreign, own]).unwrap(),
            )
            .unwrap();

        let store = LocalNoteStore::new(storage);
        store.initialize();

        assert_eq!(titles(&store.get_notes()), vec!["Mine".to_string()]);
    }

    #[test]
    fn demo_scenario() {
        let store = initialized();
        assert_eq!(store.get_notes().len(), 3);

        let id = store.create_note(NewNote::new("Groceries", "Milk, eggs"));
        let notes = store.get_notes();
        assert_eq!(notes.len(), 4);
        assert_eq!(notes[0].title, "Groceries");

        store.delete_note(&id).unwrap();
        assert_eq!(store.get_notes().len(), 3);

        let error = store
            .update_note(&NoteId::from("nonexistent"), NotePatch::title("x"))
            .unwrap_err();
        assert!(error.is_not_found());
        assert_eq!(store.get_notes().len(), 3);
    }

    #[tokio::test]
    async fn backend_trait_routes_to_store() {
        let store = initialized();
        let backend: Arc<dyn NoteBackend> = Arc::new(store.clone());

        let id = backend
            .create_note("ignored-user", NewNote::new("Via trait", ""))
            .await
            .unwrap();
        backend
            .update_note(&id, NotePatch::content("body"))
            .await
            .unwrap();

        let note = store.get_notes().into_iter().find(|n| n.id == id).unwrap();
        assert_eq!(note.user_id, "offline-demo-user");
        assert_eq!(note.content, "body");

        backend.delete_note(&id).await.unwrap();
        assert!(backend.delete_note(&id).await.unwrap_err().is_not_found());
    }
}
