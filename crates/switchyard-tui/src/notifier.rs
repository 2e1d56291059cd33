//! Bridges card notices into the app's toast overlay.

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use switchyard_core::{Notice, Notifier};

use crate::action::Action;

/// [`Notifier`] that forwards every notice as [`Action::Notify`].
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: UnboundedSender<Action>,
}

impl ChannelNotifier {
    pub fn new(tx: UnboundedSender<Action>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if self.tx.send(Action::Notify(notice)).is_err() {
            debug!("notice dropped, app loop has exited");
        }
    }
}
