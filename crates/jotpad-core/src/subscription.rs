//! Observer registry and subscription handles.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::models::Note;

/// Callback invoked with each delivered value.
pub type Listener<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Callback receiving a full, newest-first note snapshot.
pub type NotesListener = Listener<Vec<Note>>;

/// Wrap a closure as a [`Listener`].
pub fn listener<T>(callback: impl Fn(T) + Send + Sync + 'static) -> Listener<T> {
    Arc::new(callback)
}

/// Handle for a standing registration.
///
/// Calling [`Subscription::unsubscribe`] or dropping the handle removes exactly
/// this registration; no further snapshots reach its listener afterwards.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Key of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

struct Entry<T> {
    listener: Listener<T>,
    /// Highest snapshot version handed to this listener. Held for the whole
    /// call so concurrent notifiers cannot reorder deliveries.
    delivered: Mutex<u64>,
}

impl<T: Clone> Entry<T> {
    /// Deliver unless a newer value already reached this listener.
    fn deliver(&self, version: u64, value: &T) {
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        if *delivered < version {
            *delivered = version;
            (self.listener)(value.clone());
        }
    }
}

struct RegistryInner<T> {
    next_id: u64,
    entries: BTreeMap<SubscriptionId, Arc<Entry<T>>>,
}

/// Mapping from subscription id to listener.
///
/// Deliveries carry a version; a listener never receives a value older
/// than one it has already seen. Each listener is called by one notifier at a
/// time, so a callback must not synchronously mutate the store it listens to.
pub struct ListenerRegistry<T> {
    inner: Arc<Mutex<RegistryInner<T>>>,
}

impl<T> Clone for ListenerRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: 0,
                entries: BTreeMap::new(),
            })),
        }
    }
}

impl<T: Clone + 'static> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Listener<T>) -> SubscriptionId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.entries.insert(
            id,
            Arc::new(Entry {
                listener,
                delivered: Mutex::new(0),
            }),
        );
        id
    }

    /// Returns whether `id` was registered.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        self.lock().entries.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a value to a single listener.
    pub fn notify_one(&self, id: SubscriptionId, version: u64, value: &T) {
        let entry = self.lock().entries.get(&id).cloned();
        if let Some(entry) = entry {
            entry.deliver(version, value);
        }
    }

    /// Deliver a value to every listener.
    ///
    /// Listeners run outside the registry lock, so they may subscribe or
    /// unsubscribe from within the callback.
    pub fn notify_all(&self, version: u64, value: &T) {
        let entries = self.lock().entries.values().cloned().collect::<Vec<_>>();
        for entry in entries {
            entry.deliver(version, value);
        }
    }

    /// A handle that removes `id` when unsubscribed or dropped.
    pub fn subscription(&self, id: SubscriptionId) -> Subscription {
        let registry: Weak<Mutex<RegistryInner<T>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = registry.upgrade() {
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entries
                    .remove(&id);
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + 'static> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
