#![allow(clippy::unwrap_used)]
// Integration tests for `CardController` against a recording backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_test::{assert_pending, task};

use switchyard_core::{
    ActionOutcome, BackendError, CardController, CardUiState, Catalog, MemoryBackend, MenuAnchor,
    MenuItem, Notice, NoticeKind, Notifier, ProfileBackend, ProfileOption, ProfilePatch,
    ProfileRecord, ProfileUid,
};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    SetActive(String),
    ClearConnections,
    Update(String, ProfileOption),
    Delete(String),
    OpenFile(String),
    Patch(String),
}

#[derive(Default)]
struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<&'static str, BackendError>>,
    delay: Duration,
}

impl RecordingBackend {
    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn fail(self, op: &'static str, err: BackendError) -> Self {
        self.failures.lock().unwrap().insert(op, err);
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn call(&self, op: &'static str, call: Call) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.failures.lock().unwrap().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl ProfileBackend for RecordingBackend {
    async fn set_active_profile(&self, uid: &ProfileUid) -> Result<(), BackendError> {
        self.call("set_active", Call::SetActive(uid.to_string())).await
    }

    async fn clear_active_connections(&self) -> Result<(), BackendError> {
        self.call("clear", Call::ClearConnections).await
    }

    async fn update_profile(
        &self,
        uid: &ProfileUid,
        option: ProfileOption,
    ) -> Result<(), BackendError> {
        self.call("update", Call::Update(uid.to_string(), option)).await
    }

    async fn delete_profile(&self, uid: &ProfileUid) -> Result<(), BackendError> {
        self.call("delete", Call::Delete(uid.to_string())).await
    }

    async fn open_profile_file(&self, uid: &ProfileUid) -> Result<(), BackendError> {
        self.call("open", Call::OpenFile(uid.to_string())).await
    }

    async fn patch_profile(&self, uid: &ProfileUid, _patch: ProfilePatch) -> Result<(), BackendError> {
        self.call("patch", Call::Patch(uid.to_string())).await
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

struct Harness<B> {
    backend: Arc<B>,
    notifier: Arc<RecordingNotifier>,
    card: CardController<B>,
}

fn harness<B: ProfileBackend>(backend: B) -> Harness<B> {
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::default());
    let card = CardController::new(
        Arc::clone(&backend),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::new(Catalog::english()),
    );
    Harness {
        backend,
        notifier,
        card,
    }
}

fn remote() -> ProfileRecord {
    ProfileRecord::remote("R1", "Primary", "https://sub.example.com/a")
}

fn set_active(uid: &str) -> Call {
    Call::SetActive(uid.into())
}

// ── Select ──────────────────────────────────────────────────────────

#[tokio::test]
async fn select_on_active_card_makes_no_calls() {
    let h = harness(RecordingBackend::default());
    let outcome = h.card.select(&remote(), true).await;

    assert_eq!(outcome, ActionOutcome::AlreadyActive);
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn select_switches_then_clears_connections() {
    let h = harness(RecordingBackend::default());
    let outcome = h.card.select(&remote(), false).await;

    assert_eq!(outcome, ActionOutcome::Completed);
    assert_eq!(h.backend.calls(), [set_active("R1"), Call::ClearConnections]);
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn failed_switch_skips_clear_and_echoes_error() {
    let backend = RecordingBackend::default().fail(
        "set_active",
        BackendError::Rejected {
            message: "core restarting".into(),
        },
    );
    let h = harness(backend);
    let outcome = h.card.select(&remote(), false).await;

    assert_eq!(outcome, ActionOutcome::Failed);
    assert_eq!(h.backend.calls(), [set_active("R1")]);
    assert_eq!(
        h.notifier.notices(),
        [Notice {
            title: "Error".into(),
            message: "Operation rejected by backend: core restarting".into(),
            kind: NoticeKind::Error,
        }]
    );
    assert!(!h.card.is_applying());
}

#[tokio::test]
async fn subscription_fetch_failure_gets_canned_message() {
    let backend = RecordingBackend::default().fail(
        "set_active",
        BackendError::SubscriptionFetch {
            message: "HTTP 502".into(),
        },
    );
    let h = harness(backend);
    h.card.select(&remote(), false).await;

    let notices = h.notifier.notices();
    assert_eq!(notices.len(), 1);
    assert!(
        notices[0]
            .message
            .starts_with("Failed to fetch the subscription for Primary"),
        "{}",
        notices[0].message
    );
    assert!(!notices[0].message.contains("HTTP 502"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_selects_invoke_backend_once() {
    let h = harness(RecordingBackend::slow(Duration::from_millis(100)));
    let profile = remote();

    let (a, b) = tokio::join!(
        h.card.select(&profile, false),
        h.card.select(&profile, false)
    );

    let mut outcomes = [a, b];
    outcomes.sort_by_key(ToString::to_string);
    assert_eq!(outcomes, [ActionOutcome::Busy, ActionOutcome::Completed]);
    assert_eq!(h.backend.calls(), [set_active("R1"), Call::ClearConnections]);
    assert!(!h.card.is_applying());
}

#[tokio::test(start_paused = true)]
async fn applying_flag_is_set_only_while_in_flight() {
    let h = harness(RecordingBackend::slow(Duration::from_millis(100)));
    assert!(!h.card.is_applying());

    let card = h.card.clone();
    let handle = tokio::spawn(async move { card.select(&remote(), false).await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(h.card.is_applying());
    assert!(h.card.is_busy());

    assert_eq!(handle.await.unwrap(), ActionOutcome::Completed);
    assert!(!h.card.is_applying());
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn update_via_proxy_resolves_options() {
    let h = harness(RecordingBackend::default());
    let mut profile = remote();

    h.card.update(&profile, true).await;
    profile.option = Some(ProfileOption {
        with_proxy: false,
        self_proxy: true,
    });
    h.card.update(&profile, true).await;
    h.card.update(&profile, false).await;

    let with_proxy = ProfileOption {
        with_proxy: true,
        self_proxy: false,
    };
    let self_proxy = ProfileOption {
        with_proxy: false,
        self_proxy: true,
    };
    assert_eq!(
        h.backend.calls(),
        [
            Call::Update("R1".into(), with_proxy),
            Call::Update("R1".into(), self_proxy),
            Call::Update("R1".into(), self_proxy),
        ]
    );
}

#[tokio::test]
async fn update_failure_is_not_reported() {
    let backend = RecordingBackend::default().fail(
        "update",
        BackendError::SubscriptionFetch {
            message: "timeout".into(),
        },
    );
    let h = harness(backend);

    assert_eq!(h.card.update(&remote(), false).await, ActionOutcome::Failed);
    assert!(h.notifier.notices().is_empty());
    assert!(!h.card.is_refreshing());
}

#[tokio::test]
async fn update_skips_local_profiles() {
    let h = harness(RecordingBackend::default());
    let local = ProfileRecord::local("L1", "Local");

    assert_eq!(h.card.update(&local, true).await, ActionOutcome::NotApplicable);
    assert!(h.backend.calls().is_empty());
}

// ── Delete / open / edit ────────────────────────────────────────────

#[tokio::test]
async fn delete_failure_reports_serialized_payload() {
    let backend =
        RecordingBackend::default().fail("delete", BackendError::NotFound { uid: "R1".into() });
    let h = harness(backend);

    assert_eq!(h.card.delete(&remote()).await, ActionOutcome::Failed);
    let notices = h.notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, r#"{"kind":"not_found","uid":"R1"}"#);
    assert!(!h.card.is_deleting());
}

#[tokio::test(start_paused = true)]
async fn tracks_are_independent() {
    let h = harness(RecordingBackend::slow(Duration::from_millis(100)));
    let profile = remote();

    let (select, delete) = tokio::join!(h.card.select(&profile, false), h.card.delete(&profile));

    assert_eq!(select, ActionOutcome::Completed);
    assert_eq!(delete, ActionOutcome::Completed);
    assert_eq!(h.backend.calls().len(), 3);
}

#[tokio::test]
async fn empty_edit_is_not_saved() {
    let h = harness(RecordingBackend::default());
    let outcome = h.card.save_info(&remote(), ProfilePatch::default()).await;

    assert_eq!(outcome, ActionOutcome::NotApplicable);
    assert!(h.backend.calls().is_empty());
}

// ── Menu ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn menu_closes_before_backend_work_starts() {
    let h = harness(RecordingBackend::slow(Duration::from_millis(100)));
    let profile = remote();
    let mut ui = CardUiState::default();
    ui.open_menu(MenuAnchor { x: 10, y: 3 });

    let item = ui.choose(MenuItem::Select);
    assert_eq!(ui.menu_anchor, None);
    assert!(h.backend.calls().is_empty());

    let mut work = task::spawn(h.card.perform(item, &profile, false));
    assert_pending!(work.poll());
    assert_eq!(h.backend.calls(), [set_active("R1")]);
    assert!(h.card.is_applying());

    drop(work);
    assert!(!h.card.is_applying());
}

#[tokio::test]
async fn ui_only_menu_entries_do_not_touch_backend() {
    let h = harness(RecordingBackend::default());
    for item in [MenuItem::EditInfo, MenuItem::ProxyChains] {
        assert_eq!(
            h.card.perform(item, &remote(), false).await,
            ActionOutcome::NotApplicable
        );
    }
    assert!(h.backend.calls().is_empty());
}

// ── Against the in-memory backend ───────────────────────────────────

#[tokio::test]
async fn memory_backend_select_and_delete() {
    let backend = MemoryBackend::from_profiles(
        [remote(), ProfileRecord::local("L1", "Local")],
        Some("L1".into()),
    )
    .unwrap();
    let h = harness(backend);

    assert_eq!(h.card.select(&remote(), false).await, ActionOutcome::Completed);
    assert_eq!(h.backend.current(), Some("R1".into()));
    assert_eq!(h.backend.connections_cleared(), 1);

    assert_eq!(h.card.open_file(&remote()).await, ActionOutcome::Failed);
    assert_eq!(h.notifier.notices().len(), 1);

    assert_eq!(h.card.delete(&remote()).await, ActionOutcome::Completed);
    assert_eq!(h.backend.current(), None);
    assert_eq!(h.backend.len(), 1);
}
