//! Components owned by the profiles screen.

pub mod edit_dialog;
pub mod profile_card;
