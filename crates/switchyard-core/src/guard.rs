//! Per-card re-entrancy guard for user-triggered async actions.
//!
//! Each card owns one [`ActionLocks`]. A trigger first tries to take the
//! action's key; if the key is already in flight the trigger is dropped.
//! The returned [`ActionPermit`] releases the key when it goes out of
//! scope, so the loading flag settles to `false` whether the action
//! succeeded, failed, or its future was dropped mid-await.

use std::collections::BTreeSet;
use std::future::Future;

use tokio::sync::watch;
use tracing::debug;

/// Actions whose in-flight state is tracked per card.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum ActionKey {
    /// Switching the active profile (`applying`).
    Select,
    /// Refreshing a remote subscription (`refreshing`).
    Update,
    Delete,
}

/// Set of in-flight action keys, observable through a `watch` channel.
#[derive(Debug)]
pub struct ActionLocks {
    in_flight: watch::Sender<BTreeSet<ActionKey>>,
}

impl Default for ActionLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionLocks {
    pub fn new() -> Self {
        let (in_flight, _) = watch::channel(BTreeSet::new());
        Self { in_flight }
    }

    /// Take `key` if nothing holds it. `None` means the trigger must be
    /// dropped.
    pub fn try_acquire(&self, key: ActionKey) -> Option<ActionPermit<'_>> {
        // `send_if_modified` runs the closure under the channel's write lock,
        // so the check-and-insert is atomic.
        let acquired = self.in_flight.send_if_modified(|set| set.insert(key));
        if acquired {
            debug!(action = %key, "action lock acquired");
            Some(ActionPermit { locks: self, key })
        } else {
            debug!(action = %key, "action already in flight, trigger dropped");
            None
        }
    }

    /// Run `action` under `key`'s lock. Returns `None` without calling
    /// `action` when the key is already held.
    pub async fn run<F, Fut, T>(&self, key: ActionKey, action: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self.try_acquire(key)?;
        Some(action().await)
    }

    /// Loading flag for `key`.
    pub fn is_loading(&self, key: ActionKey) -> bool {
        self.in_flight.borrow().contains(&key)
    }

    /// Whether any tracked action is in flight.
    pub fn any_loading(&self) -> bool {
        !self.in_flight.borrow().is_empty()
    }

    /// Observe changes to the in-flight set.
    pub fn subscribe(&self) -> watch::Receiver<BTreeSet<ActionKey>> {
        self.in_flight.subscribe()
    }

    fn release(&self, key: ActionKey) {
        self.in_flight.send_modify(|set| {
            set.remove(&key);
        });
        debug!(action = %key, "action lock released");
    }
}

/// Scoped hold on an [`ActionKey`]. Releases on drop.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the permit is dropped"]
pub struct ActionPermit<'a> {
    locks: &'a ActionLocks,
    key: ActionKey,
}

impl ActionPermit<'_> {
    pub fn key(&self) -> ActionKey {
        self.key
    }
}

impl Drop for ActionPermit<'_> {
    fn drop(&mut self) {
        self.locks.release(self.key);
    }
}
