// ── Card interaction controller ──
//
// Runs the user-triggered backend actions for one card. Select, update and
// delete are independent tracks, each behind its own action lock; errors
// stop here and are either reported to the user or logged.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::menu::MenuItem;
use crate::backend::ProfileBackend;
use crate::error::BackendError;
use crate::guard::{ActionKey, ActionLocks};
use crate::i18n::Translator;
use crate::model::{ProfileOption, ProfilePatch, ProfileRecord};
use crate::notify::{Notice, Notifier};

/// What happened to a triggered action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ActionOutcome {
    Completed,
    /// The backend reported an error; it has been handled.
    Failed,
    /// Same action already in flight on this card; trigger dropped.
    Busy,
    /// Select on the profile that is already active.
    AlreadyActive,
    /// Action does not apply to this profile or menu entry.
    NotApplicable,
}

/// Fetch options for a refresh.
///
/// Without `via_proxy` the stored options are used as-is. With it,
/// self-proxy wins when already set; otherwise the fetch is forced through
/// the outbound proxy.
pub fn resolve_update_options(stored: Option<ProfileOption>, via_proxy: bool) -> ProfileOption {
    let base = stored.unwrap_or_default();
    if !via_proxy {
        return base;
    }
    if base.self_proxy {
        ProfileOption {
            with_proxy: false,
            self_proxy: true,
        }
    } else {
        ProfileOption {
            with_proxy: true,
            self_proxy: false,
        }
    }
}

struct CardInner<B> {
    backend: Arc<B>,
    notifier: Arc<dyn Notifier>,
    translator: Arc<dyn Translator>,
    locks: ActionLocks,
}

/// Action controller for one mounted card. Cheap to clone; clones share
/// the same locks, so a spawned task and the card observe the same flags.
pub struct CardController<B> {
    inner: Arc<CardInner<B>>,
}

impl<B> Clone for CardController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B> fmt::Debug for CardController<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardController")
            .field("locks", &self.inner.locks)
            .finish_non_exhaustive()
    }
}

impl<B: ProfileBackend> CardController<B> {
    pub fn new(
        backend: Arc<B>,
        notifier: Arc<dyn Notifier>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            inner: Arc::new(CardInner {
                backend,
                notifier,
                translator,
                locks: ActionLocks::new(),
            }),
        }
    }

    // ── Flags ────────────────────────────────────────────────────────

    pub fn is_applying(&self) -> bool {
        self.inner.locks.is_loading(ActionKey::Select)
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.locks.is_loading(ActionKey::Update)
    }

    pub fn is_deleting(&self) -> bool {
        self.inner.locks.is_loading(ActionKey::Delete)
    }

    pub fn is_busy(&self) -> bool {
        self.inner.locks.any_loading()
    }

    pub fn subscribe_flags(&self) -> watch::Receiver<BTreeSet<ActionKey>> {
        self.inner.locks.subscribe()
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Make `profile` the active one, then clear live connections.
    pub async fn select(&self, profile: &ProfileRecord, is_selected: bool) -> ActionOutcome {
        if is_selected {
            debug!(uid = %profile.uid, "select skipped, profile already active");
            return ActionOutcome::AlreadyActive;
        }
        let Some(_permit) = self.inner.locks.try_acquire(ActionKey::Select) else {
            return ActionOutcome::Busy;
        };

        match self.switch_to(profile).await {
            Ok(()) => {
                info!(uid = %profile.uid, name = %profile.name, "profile selected");
                ActionOutcome::Completed
            }
            Err(err) => {
                warn!(uid = %profile.uid, error = %err, "select failed");
                let message = if err.is_subscription_fetch() {
                    self.tr("notice.fetch_failed", &[("name", &profile.name)])
                } else {
                    err.to_string()
                };
                self.report(message);
                ActionOutcome::Failed
            }
        }
    }

    /// Refresh a remote profile. Failures are logged, not reported.
    pub async fn update(&self, profile: &ProfileRecord, via_proxy: bool) -> ActionOutcome {
        if !profile.is_remote() {
            return ActionOutcome::NotApplicable;
        }
        let Some(_permit) = self.inner.locks.try_acquire(ActionKey::Update) else {
            return ActionOutcome::Busy;
        };

        let option = resolve_update_options(profile.option, via_proxy);
        match self.inner.backend.update_profile(&profile.uid, option).await {
            Ok(()) => {
                info!(uid = %profile.uid, via_proxy, "profile updated");
                ActionOutcome::Completed
            }
            Err(err) => {
                warn!(uid = %profile.uid, via_proxy, error = %err, "update failed");
                ActionOutcome::Failed
            }
        }
    }

    pub async fn delete(&self, profile: &ProfileRecord) -> ActionOutcome {
        let Some(_permit) = self.inner.locks.try_acquire(ActionKey::Delete) else {
            return ActionOutcome::Busy;
        };

        match self.inner.backend.delete_profile(&profile.uid).await {
            Ok(()) => {
                info!(uid = %profile.uid, "profile deleted");
                ActionOutcome::Completed
            }
            Err(err) => {
                warn!(uid = %profile.uid, error = %err, "delete failed");
                self.report(err.to_payload());
                ActionOutcome::Failed
            }
        }
    }

    /// Open the backing file. Not guarded; the backend hands off to an
    /// external editor and returns immediately.
    pub async fn open_file(&self, profile: &ProfileRecord) -> ActionOutcome {
        self.report_result(self.inner.backend.open_profile_file(&profile.uid).await)
    }

    /// Save metadata edited in the edit dialog.
    pub async fn save_info(&self, profile: &ProfileRecord, patch: ProfilePatch) -> ActionOutcome {
        if patch.is_empty() {
            return ActionOutcome::NotApplicable;
        }
        self.report_result(self.inner.backend.patch_profile(&profile.uid, patch).await)
    }

    /// Run the backend work bound to a menu entry. Entries handled by the
    /// UI alone (edit dialog, chain navigation) are `NotApplicable` here.
    pub async fn perform(
        &self,
        item: MenuItem,
        profile: &ProfileRecord,
        is_selected: bool,
    ) -> ActionOutcome {
        match item {
            MenuItem::Select => self.select(profile, is_selected).await,
            MenuItem::OpenFile => self.open_file(profile).await,
            MenuItem::Update => self.update(profile, false).await,
            MenuItem::UpdateViaProxy => self.update(profile, true).await,
            MenuItem::Delete => self.delete(profile).await,
            MenuItem::EditInfo | MenuItem::ProxyChains => ActionOutcome::NotApplicable,
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    async fn switch_to(&self, profile: &ProfileRecord) -> Result<(), BackendError> {
        self.inner.backend.set_active_profile(&profile.uid).await?;
        self.inner.backend.clear_active_connections().await
    }

    fn report_result(&self, result: Result<(), BackendError>) -> ActionOutcome {
        match result {
            Ok(()) => ActionOutcome::Completed,
            Err(err) => {
                warn!(error = %err, "card action failed");
                self.report(err.to_string());
                ActionOutcome::Failed
            }
        }
    }

    fn report(&self, message: String) {
        let title = self.tr("notice.error", &[]);
        self.inner.notifier.notify(Notice::error(title, message));
    }

    fn tr(&self, key: &str, params: &[(&str, &str)]) -> String {
        self.inner.translator.translate(key, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DIRECT: ProfileOption = ProfileOption::DIRECT;
    const WITH_PROXY: ProfileOption = ProfileOption {
        with_proxy: true,
        self_proxy: false,
    };
    const SELF_PROXY: ProfileOption = ProfileOption {
        with_proxy: false,
        self_proxy: true,
    };

    #[test]
    fn plain_update_keeps_stored_options() {
        assert_eq!(resolve_update_options(None, false), DIRECT);
        assert_eq!(resolve_update_options(Some(SELF_PROXY), false), SELF_PROXY);
        assert_eq!(resolve_update_options(Some(WITH_PROXY), false), WITH_PROXY);
    }

    #[test]
    fn via_proxy_escalates_direct_to_with_proxy() {
        assert_eq!(resolve_update_options(None, true), WITH_PROXY);
        assert_eq!(resolve_update_options(Some(DIRECT), true), WITH_PROXY);
    }

    #[test]
    fn via_proxy_preserves_self_proxy() {
        assert_eq!(resolve_update_options(Some(SELF_PROXY), true), SELF_PROXY);
        let both = ProfileOption {
            with_proxy: true,
            self_proxy: true,
        };
        assert_eq!(resolve_update_options(Some(both), true), SELF_PROXY);
    }
}
