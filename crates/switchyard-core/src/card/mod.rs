// ── Profile card ──
//
// Everything a single profile card needs besides drawing: the action
// controller, its context menu, and the rotating info snippets.

pub mod controller;
pub mod menu;
pub mod snippet;

pub use controller::{ActionOutcome, CardController, resolve_update_options};
pub use menu::{CardUiState, MenuAnchor, MenuItem};
pub use snippet::{InfoSnippet, snippets_for};
