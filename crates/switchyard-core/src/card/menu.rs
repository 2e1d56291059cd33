//! Card context menu and the card's ephemeral UI state.

use crate::model::ProfileKind;

/// Context-menu entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::AsRefStr)]
pub enum MenuItem {
    Select,
    EditInfo,
    ProxyChains,
    OpenFile,
    Update,
    UpdateViaProxy,
    Delete,
}

impl MenuItem {
    const REMOTE: &'static [Self] = &[
        Self::Select,
        Self::EditInfo,
        Self::ProxyChains,
        Self::OpenFile,
        Self::Update,
        Self::UpdateViaProxy,
        Self::Delete,
    ];

    const LOCAL: &'static [Self] = &[
        Self::Select,
        Self::EditInfo,
        Self::ProxyChains,
        Self::OpenFile,
        Self::Delete,
    ];

    /// Entries offered for a profile of `kind`. Local profiles cannot be
    /// refreshed, so the update entries are omitted.
    pub fn for_kind(kind: ProfileKind) -> &'static [Self] {
        match kind {
            ProfileKind::Remote => Self::REMOTE,
            ProfileKind::Local => Self::LOCAL,
        }
    }

    /// Translation key of the entry label.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Select => "menu.select",
            Self::EditInfo => "menu.edit_info",
            Self::ProxyChains => "menu.proxy_chains",
            Self::OpenFile => "menu.open_file",
            Self::Update => "menu.update",
            Self::UpdateViaProxy => "menu.update_via_proxy",
            Self::Delete => "menu.delete",
        }
    }

    pub fn is_destructive(self) -> bool {
        self == Self::Delete
    }
}

/// Screen position the menu was opened at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuAnchor {
    pub x: u16,
    pub y: u16,
}

/// Per-card ephemeral state. Lives as long as the card is mounted.
///
/// The `applying` and `refreshing` flags are not stored here; they are
/// owned by the controller's action locks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardUiState {
    pub edit_dialog_open: bool,
    pub menu_anchor: Option<MenuAnchor>,
}

impl CardUiState {
    pub fn open_menu(&mut self, anchor: MenuAnchor) {
        self.menu_anchor = Some(anchor);
    }

    pub fn close_menu(&mut self) {
        self.menu_anchor = None;
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_anchor.is_some()
    }

    /// Dismiss the menu, then hand back the entry for the caller to run.
    /// Dismissal happens first and unconditionally.
    pub fn choose(&mut self, item: MenuItem) -> MenuItem {
        self.close_menu();
        if item == MenuItem::EditInfo {
            self.open_edit();
        }
        item
    }

    pub fn open_edit(&mut self) {
        self.edit_dialog_open = true;
    }

    pub fn close_edit(&mut self) {
        self.edit_dialog_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn remote_menu_lists_every_entry_in_order() {
        let all: Vec<MenuItem> = MenuItem::iter().collect();
        assert_eq!(MenuItem::for_kind(ProfileKind::Remote), all.as_slice());
    }

    #[test]
    fn local_menu_omits_updates() {
        let items = MenuItem::for_kind(ProfileKind::Local);
        assert!(!items.contains(&MenuItem::Update));
        assert!(!items.contains(&MenuItem::UpdateViaProxy));
        assert_eq!(items.first(), Some(&MenuItem::Select));
        assert_eq!(items.last(), Some(&MenuItem::Delete));
    }

    #[test]
    fn choosing_any_entry_closes_the_menu() {
        for &item in MenuItem::for_kind(ProfileKind::Remote) {
            let mut ui = CardUiState::default();
            ui.open_menu(MenuAnchor { x: 4, y: 2 });
            assert_eq!(ui.choose(item), item);
            assert_eq!(ui.menu_anchor, None);
            assert_eq!(ui.edit_dialog_open, item == MenuItem::EditInfo);
        }
    }
}
