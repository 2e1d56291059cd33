//! Profile card interaction core for the switchyard proxy-profile manager.
//!
//! This crate owns everything a profile card does besides drawing itself:
//!
//! - **[`CardController`]** runs select / update / delete / open-file
//!   against a [`ProfileBackend`], one guarded track per action. Select
//!   switches the active profile and then clears live connections, strictly
//!   in that order.
//!
//! - **[`ActionLocks`]** is the per-card re-entrancy guard. A trigger for an
//!   action that is already in flight is dropped; the loading flag is reset
//!   by an RAII permit whatever the outcome.
//!
//! - **[`RotatingDisplay`]** cycles the card's info snippets on a
//!   cancellable timer that is re-armed on every index change and torn down
//!   on drop.
//!
//! - **[`compute_traffic`]** derives used/total bytes and the quota
//!   percentage from a profile's usage counters.
//!
//! - **[`MemoryBackend`]** is a `DashMap` + `watch` backed store
//!   implementing [`ProfileBackend`], used by the TUI and tests.

pub mod backend;
pub mod card;
pub mod error;
pub mod guard;
pub mod i18n;
pub mod model;
pub mod notify;
pub mod rotation;
pub mod timefmt;
pub mod traffic;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{MemoryBackend, ProfileBackend};
pub use card::{
    ActionOutcome, CardController, CardUiState, InfoSnippet, MenuAnchor, MenuItem,
    resolve_update_options, snippets_for,
};
pub use error::{BackendError, ModelError};
pub use guard::{ActionKey, ActionLocks, ActionPermit};
pub use i18n::{Catalog, Translator};
pub use notify::{Notice, NoticeKind, Notifier, NullNotifier};
pub use rotation::{DEFAULT_INTERVAL, RotatingDisplay, Rotation, RotationTimer, Wake};
pub use traffic::{DerivedTraffic, compute_traffic};

pub use model::{ProfileKind, ProfileOption, ProfilePatch, ProfileRecord, ProfileUid, ProfileUsage};
