//! All possible UI actions. Actions are the sole mechanism for state mutation.

use switchyard_core::backend::memory::ProfileSnapshot;
use switchyard_core::{ActionOutcome, MenuItem, Notice, ProfileUid};

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Data events (from the backend) ────────────────────────────
    ProfilesUpdated(ProfileSnapshot),
    CurrentProfileChanged(Option<ProfileUid>),

    // ── Cards ─────────────────────────────────────────────────────
    /// A card's rotation timer fired.
    RotateInfo { uid: ProfileUid, generation: u64 },
    /// The card's "Proxy Chains" entry was chosen.
    ChainClicked(ProfileUid),
    CloseChains,
    /// A spawned card action settled.
    CardActionFinished {
        uid: ProfileUid,
        item: MenuItem,
        outcome: ActionOutcome,
    },

    // ── Overlays ──────────────────────────────────────────────────
    ToggleHelp,
    Notify(Notice),
    DismissNotification,
}
