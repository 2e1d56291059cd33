//! Data bridge: connects the backend's `watch` channels to TUI actions.
//!
//! Runs as a background task, pushing the initial snapshot and then every
//! change to the profile list or the active profile through the action
//! channel until cancelled.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use switchyard_core::MemoryBackend;

use crate::action::Action;

pub async fn spawn_data_bridge(
    backend: Arc<MemoryBackend>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut profiles = backend.subscribe();
    let mut current = backend.subscribe_current();

    // Initial snapshots so the screen has data immediately
    let _ = action_tx.send(Action::ProfilesUpdated(profiles.borrow_and_update().clone()));
    let _ = action_tx.send(Action::CurrentProfileChanged(
        current.borrow_and_update().clone(),
    ));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = profiles.changed() => {
                let snapshot = profiles.borrow_and_update().clone();
                debug!(count = snapshot.len(), "dispatching ProfilesUpdated");
                let _ = action_tx.send(Action::ProfilesUpdated(snapshot));
            }
            Ok(()) = current.changed() => {
                let uid = current.borrow_and_update().clone();
                let _ = action_tx.send(Action::CurrentProfileChanged(uid));
            }
            else => break,
        }
    }

    debug!("data bridge shut down");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use switchyard_core::{ProfileBackend, ProfileRecord};

    #[tokio::test]
    async fn forwards_initial_state_and_changes() {
        let backend = Arc::new(
            MemoryBackend::from_profiles(
                [ProfileRecord::local("L1", "Local"), ProfileRecord::local("L2", "Other")],
                None,
            )
            .unwrap(),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(Arc::clone(&backend), tx, cancel.clone()));

        match rx.recv().await.unwrap() {
            Action::ProfilesUpdated(snapshot) => assert_eq!(snapshot.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            Action::CurrentProfileChanged(None)
        ));

        backend.set_active_profile(&"L2".into()).await.unwrap();
        match rx.recv().await.unwrap() {
            Action::CurrentProfileChanged(Some(uid)) => assert_eq!(uid.as_str(), "L2"),
            other => panic!("unexpected {other:?}"),
        }

        cancel.cancel();
        bridge.await.unwrap();
    }
}
