// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listener bookkeeping and the bounded channel listener.

use crate::domain::UpdateEvent;
use crate::ports::{ListenerId, UpdateListener};
use std::collections::BTreeMap;
use std::sync::mpsc::{sync_channel, Receiver, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard};

/// A set of registered listeners.
///
/// Dispatch snapshots the set and releases the lock before calling listeners,
/// so a listener may add or remove registrations.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Mutex<BTreeMap<ListenerId, UpdateListener>>,
}

impl ListenerSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ListenerId, UpdateListener>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers `listener` under `id`, replacing an earlier registration.
    pub fn insert(&self, id: ListenerId, listener: UpdateListener) {
        self.lock().insert(id, listener);
    }

    /// Removes the registration under `id`.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Returns every registration.
    pub fn entries(&self) -> Vec<(ListenerId, UpdateListener)> {
        self.lock()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect()
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Delivers `event` to every listener, in registration order.
    pub fn notify(&self, event: &UpdateEvent) {
        if event.is_empty() {
            return;
        }
        for (_, listener) in self.entries() {
            listener(event);
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

/// Creates a listener that forwards events into a bounded channel.
///
/// The listener never blocks the delivery thread: when the channel is full
/// the event is dropped and a warning logged. Events are ignored once the
/// receiver has been dropped.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::UpdateEvent;
/// use layercfg::service::channel_listener;
///
/// let (listener, events) = channel_listener(1);
/// listener(&UpdateEvent::changed("a", "1"));
/// listener(&UpdateEvent::changed("b", "2"));
///
/// assert_eq!(events.try_recv().unwrap(), UpdateEvent::changed("a", "1"));
/// assert!(events.try_recv().is_err());
/// ```
pub fn channel_listener(capacity: usize) -> (UpdateListener, Receiver<UpdateEvent>) {
    let (sender, receiver) = sync_channel(capacity);
    let listener: UpdateListener = Arc::new(move |event: &UpdateEvent| {
        match sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => tracing::warn!(
                "Update channel full; dropped event with {} changed and {} removed keys",
                dropped.changed.len(),
                dropped.removed.len()
            ),
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("Update channel receiver dropped")
            }
        }
    });
    (listener, receiver)
}
