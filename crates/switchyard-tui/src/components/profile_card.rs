//! One profile card: body, context menu, and edit dialog overlay.
//!
//! The card owns its [`CardController`], so its action locks, rotation
//! timer and menu state live exactly as long as the card is mounted.
//! Backend work is spawned onto the runtime; the result comes back as
//! [`Action::CardActionFinished`].

use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use switchyard_core::rotation::Wake;
use switchyard_core::{
    CardController, CardUiState, InfoSnippet, MemoryBackend, MenuAnchor, MenuItem, Notifier,
    ProfileRecord, RotatingDisplay, Translator, compute_traffic, snippets_for, timefmt,
};

use crate::action::Action;
use crate::component::Component;
use crate::components::edit_dialog::{EditDialog, EditOutcome};
use crate::theme;
use crate::widgets::usage_bar;

/// Rows taken by one card, borders included.
pub const CARD_HEIGHT: u16 = 5;
pub const CARD_MIN_WIDTH: u16 = 34;

/// Collaborators shared by every card on the screen.
#[derive(Clone)]
pub struct CardDeps {
    pub backend: Arc<MemoryBackend>,
    pub notifier: Arc<dyn Notifier>,
    pub translator: Arc<dyn Translator>,
    pub rotation_interval: Duration,
}

pub struct ProfileCard {
    id: String,
    profile: Arc<ProfileRecord>,
    controller: CardController<MemoryBackend>,
    translator: Arc<dyn Translator>,
    ui: CardUiState,
    info: RotatingDisplay<InfoSnippet>,
    menu_index: usize,
    edit: Option<EditDialog>,
    is_selected: bool,
    is_chain_selected: bool,
    focused: bool,
    throbber_state: ThrobberState,
    action_tx: UnboundedSender<Action>,
    // Last rendered regions, for mouse hit-testing
    last_area: Cell<Rect>,
    info_area: Cell<Rect>,
    menu_area: Cell<Rect>,
    menu_rows: Cell<Rect>,
}

impl ProfileCard {
    pub fn new(
        profile: Arc<ProfileRecord>,
        deps: &CardDeps,
        action_tx: UnboundedSender<Action>,
    ) -> Self {
        let uid = profile.uid.clone();
        let wake_tx = action_tx.clone();
        let wake: Wake = Arc::new(move |generation| {
            let _ = wake_tx.send(Action::RotateInfo {
                uid: uid.clone(),
                generation,
            });
        });
        let info = RotatingDisplay::new(deps.rotation_interval, snippets_for(&profile), wake);

        Self {
            id: profile.uid.to_string(),
            controller: CardController::new(
                Arc::clone(&deps.backend),
                Arc::clone(&deps.notifier),
                Arc::clone(&deps.translator),
            ),
            translator: Arc::clone(&deps.translator),
            profile,
            ui: CardUiState::default(),
            info,
            menu_index: 0,
            edit: None,
            is_selected: false,
            is_chain_selected: false,
            focused: false,
            throbber_state: ThrobberState::default(),
            action_tx,
            last_area: Cell::new(Rect::default()),
            info_area: Cell::new(Rect::default()),
            menu_area: Cell::new(Rect::default()),
            menu_rows: Cell::new(Rect::default()),
        }
    }

    pub fn profile(&self) -> &Arc<ProfileRecord> {
        &self.profile
    }

    /// Swap in a fresh record from the backend. Rotation keeps its timer
    /// unless the snippet set changed shape.
    pub fn set_profile(&mut self, profile: Arc<ProfileRecord>) {
        self.info.set_items(snippets_for(&profile));
        self.profile = profile;
    }

    pub fn set_state(&mut self, is_selected: bool, is_chain_selected: bool, focused: bool) {
        self.is_selected = is_selected;
        self.is_chain_selected = is_chain_selected;
        self.focused = focused;
        if !focused {
            self.ui.close_menu();
        }
    }

    #[cfg(test)]
    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    #[cfg(test)]
    pub fn ui(&self) -> &CardUiState {
        &self.ui
    }

    #[cfg(test)]
    pub fn info(&self) -> &RotatingDisplay<InfoSnippet> {
        &self.info
    }

    #[cfg(test)]
    pub fn controller(&self) -> &CardController<MemoryBackend> {
        &self.controller
    }

    /// Whether the last render placed this card at `pos`.
    pub fn hit(&self, pos: Position) -> bool {
        self.last_area.get().contains(pos)
    }

    /// Forget the rendered area (card scrolled out of view).
    pub fn hide(&self) {
        self.last_area.set(Rect::default());
        self.info_area.set(Rect::default());
    }

    // ── Menu ─────────────────────────────────────────────────────────

    fn menu_items(&self) -> &'static [MenuItem] {
        MenuItem::for_kind(self.profile.kind)
    }

    pub fn open_menu_at(&mut self, anchor: MenuAnchor) {
        self.menu_index = 0;
        self.ui.open_menu(anchor);
    }

    fn open_menu_on_card(&mut self) {
        let area = self.last_area.get();
        self.open_menu_at(MenuAnchor {
            x: area.x + 2,
            y: area.y + 1,
        });
    }

    /// Dismiss the menu, then run the entry's work.
    pub fn trigger(&mut self, item: MenuItem) -> Option<Action> {
        let item = self.ui.choose(item);
        self.menu_index = 0;
        match item {
            MenuItem::EditInfo => {
                self.edit = Some(EditDialog::new(&self.profile, Arc::clone(&self.translator)));
                None
            }
            MenuItem::ProxyChains => Some(Action::ChainClicked(self.profile.uid.clone())),
            _ => {
                self.spawn_action(item);
                None
            }
        }
    }

    fn spawn_action(&self, item: MenuItem) {
        let controller = self.controller.clone();
        let profile = Arc::clone(&self.profile);
        let is_selected = self.is_selected;
        let tx = self.action_tx.clone();
        debug!(uid = %profile.uid, item = item.as_ref(), "card action triggered");
        tokio::spawn(async move {
            let outcome = controller.perform(item, &profile, is_selected).await;
            let _ = tx.send(Action::CardActionFinished {
                uid: profile.uid.clone(),
                item,
                outcome,
            });
        });
    }

    fn spawn_save(&self, patch: switchyard_core::ProfilePatch) {
        let controller = self.controller.clone();
        let profile = Arc::clone(&self.profile);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let outcome = controller.save_info(&profile, patch).await;
            let _ = tx.send(Action::CardActionFinished {
                uid: profile.uid.clone(),
                item: MenuItem::EditInfo,
                outcome,
            });
        });
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Option<Action> {
        let items = self.menu_items();
        match key.code {
            KeyCode::Esc | KeyCode::Char('m') => {
                self.ui.close_menu();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu_index = (self.menu_index + 1) % items.len();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_index = (self.menu_index + items.len() - 1) % items.len();
                None
            }
            KeyCode::Enter => {
                let item = items.get(self.menu_index).copied()?;
                self.trigger(item)
            }
            _ => None,
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let Some(dialog) = self.edit.as_mut() else {
            return;
        };
        match dialog.handle_key(key) {
            EditOutcome::Pending => {}
            EditOutcome::Cancelled => {
                self.edit = None;
                self.ui.close_edit();
            }
            EditOutcome::Save(patch) => {
                self.edit = None;
                self.ui.close_edit();
                self.spawn_save(patch);
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn border_style(&self) -> Style {
        if self.focused {
            theme::border_focused()
        } else if self.is_chain_selected {
            theme::border_chain()
        } else if self.is_selected {
            theme::border_active()
        } else {
            theme::border_default()
        }
    }

    fn source_line(&self) -> Line<'static> {
        let tr = &*self.translator;
        let p = &self.profile;
        let text = if !p.description.is_empty() {
            p.description.clone()
        } else if let Some(host) = p.source_host() {
            tr.translate("card.from", &[("host", &host)])
        } else if p.is_remote() {
            String::new()
        } else {
            tr.translate("card.local", &[])
        };
        Line::from(Span::styled(text, theme::text()))
    }

    fn usage_line(&self, width: u16) -> Line<'static> {
        if self.profile.usage.is_some() {
            usage_bar::usage_line(&compute_traffic(&self.profile), width)
        } else if self.profile.is_remote() {
            Line::from(Span::styled(
                self.translator.translate("card.no_usage", &[]),
                theme::text_dim(),
            ))
        } else {
            let file = self.profile.file.clone().unwrap_or_default();
            Line::from(Span::styled(file, theme::text_dim()))
        }
    }

    fn busy_label(&self) -> Option<String> {
        let key = if self.controller.is_applying() {
            "card.applying"
        } else if self.controller.is_refreshing() {
            "card.refreshing"
        } else if self.controller.is_deleting() {
            "card.deleting"
        } else {
            return None;
        };
        Some(self.translator.translate(key, &[]))
    }

    fn render_info(&self, frame: &mut Frame, area: Rect) {
        self.info_area.set(area);
        if let Some(label) = self.busy_label() {
            let throbber = Throbber::default()
                .label(label)
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, area, &mut self.throbber_state.clone());
            return;
        }
        if let Some(snippet) = self.info.current() {
            let text = snippet.render(timefmt::now(), &*self.translator);
            frame.render_widget(Paragraph::new(Span::styled(text, theme::text_dim())), area);
        }
    }

    fn render_menu(&self, frame: &mut Frame, bounds: Rect) {
        let Some(anchor) = self.ui.menu_anchor else {
            self.menu_area.set(Rect::default());
            self.menu_rows.set(Rect::default());
            return;
        };
        let items = self.menu_items();
        let labels: Vec<String> = items
            .iter()
            .map(|item| self.translator.translate(item.label_key(), &[]))
            .collect();
        let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let width = (label_width as u16 + 4).min(bounds.width);
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let height = (items.len() as u16 + 2).min(bounds.height);
        let x = anchor.x.min(bounds.right().saturating_sub(width)).max(bounds.x);
        let y = anchor.y.min(bounds.bottom().saturating_sub(height)).max(bounds.y);
        let menu_area = Rect::new(x, y, width, height);
        self.menu_area.set(menu_area);

        frame.render_widget(Clear, menu_area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(menu_area);
        self.menu_rows.set(inner);
        frame.render_widget(block, menu_area);

        let lines: Vec<Line> = items
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (item, label))| {
                let style = if i == self.menu_index {
                    theme::menu_selected()
                } else if item.is_destructive() {
                    theme::menu_destructive()
                } else {
                    theme::text()
                };
                Line::from(Span::styled(format!(" {label} "), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    /// Menu and edit dialog, drawn over the whole screen after all cards.
    pub fn render_overlays(&self, frame: &mut Frame, bounds: Rect) {
        self.render_menu(frame, bounds);
        if let Some(ref dialog) = self.edit {
            dialog.render(frame, bounds);
        }
    }
}

impl Component for ProfileCard {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.edit.is_some() {
            self.handle_edit_key(key);
            return Ok(None);
        }
        if self.ui.is_menu_open() {
            return Ok(self.handle_menu_key(key));
        }

        let action = match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Enter) => self.trigger(MenuItem::Select),
            (KeyModifiers::NONE, KeyCode::Char('m')) => {
                self.open_menu_on_card();
                None
            }
            (KeyModifiers::NONE, KeyCode::Char('e')) => self.trigger(MenuItem::EditInfo),
            (KeyModifiers::NONE, KeyCode::Char('c')) => self.trigger(MenuItem::ProxyChains),
            (KeyModifiers::NONE, KeyCode::Char('o')) => self.trigger(MenuItem::OpenFile),
            (KeyModifiers::NONE, KeyCode::Char('u')) => self.trigger(MenuItem::Update),
            (KeyModifiers::SHIFT | KeyModifiers::NONE, KeyCode::Char('U')) => {
                self.trigger(MenuItem::UpdateViaProxy)
            }
            (KeyModifiers::NONE, KeyCode::Char('d')) => self.trigger(MenuItem::Delete),
            (KeyModifiers::NONE, KeyCode::Char('i')) => {
                self.info.advance();
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        let pos = Position::new(mouse.column, mouse.row);
        if self.ui.is_menu_open() {
            if let MouseEventKind::Down(_) = mouse.kind {
                if !self.menu_area.get().contains(pos) {
                    self.ui.close_menu();
                    return Ok(None);
                }
                // Clicks on the frame keep the menu open
                let rows = self.menu_rows.get();
                if rows.contains(pos) {
                    let row = usize::from(pos.y - rows.y);
                    if let Some(&item) = self.menu_items().get(row) {
                        return Ok(self.trigger(item));
                    }
                }
            }
            return Ok(None);
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Right) => {
                self.open_menu_at(MenuAnchor {
                    x: mouse.column,
                    y: mouse.row,
                });
                Ok(None)
            }
            MouseEventKind::Down(MouseButton::Left) if self.info_area.get().contains(pos) => {
                self.info.advance();
                Ok(None)
            }
            MouseEventKind::Down(MouseButton::Left) => Ok(self.trigger(MenuItem::Select)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick if self.controller.is_busy() => self.throbber_state.calc_next(),
            Action::RotateInfo { uid, generation } if *uid == self.profile.uid => {
                self.info.on_timer(*generation);
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.last_area.set(area);

        let mut title = vec![Span::styled(
            format!(" {} ", self.profile.name),
            theme::title_style(),
        )];
        if self.is_selected {
            title.insert(0, Span::styled(" ●", Style::default().fg(theme::SUCCESS_GREEN)));
        }
        let badge = Line::from(Span::styled(
            format!(" {} ", self.profile.kind),
            theme::badge().add_modifier(Modifier::BOLD),
        ))
        .right_aligned();

        let block = Block::default()
            .title(Line::from(title))
            .title(badge)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(self.border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

        frame.render_widget(Paragraph::new(self.source_line()), rows[0]);
        frame.render_widget(Paragraph::new(self.usage_line(rows[1].width)), rows[1]);
        self.render_info(frame, rows[2]);
    }

    fn captures_input(&self) -> bool {
        self.edit.is_some() || self.ui.is_menu_open()
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};
    use switchyard_core::{ActionOutcome, Catalog, NullNotifier, ProfileUsage};
    use tokio::sync::mpsc;

    fn deps(backend: MemoryBackend) -> CardDeps {
        CardDeps {
            backend: Arc::new(backend),
            notifier: Arc::new(NullNotifier),
            translator: Arc::new(Catalog::english()),
            rotation_interval: Duration::from_secs(5),
        }
    }

    fn remote_with_usage() -> ProfileRecord {
        let mut p = ProfileRecord::remote("R1", "Primary", "https://sub.example.com/a");
        p.updated_at = Some(timefmt::now() - 2 * 3600);
        p.usage = Some(ProfileUsage {
            download: 30,
            upload: 20,
            total: 100,
            expires_at: Some(4_102_444_800),
        });
        p
    }

    fn buffer_text(buffer: &Buffer) -> String {
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn left_click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Draw the card at the top of a 48x20 screen with its menu open at (2, 2).
    fn draw_with_menu(card: &mut ProfileCard) {
        card.open_menu_at(MenuAnchor { x: 2, y: 2 });
        let mut terminal = Terminal::new(TestBackend::new(48, 20)).unwrap();
        terminal
            .draw(|f| {
                card.render(f, Rect::new(0, 0, 48, CARD_HEIGHT));
                card.render_overlays(f, f.area());
            })
            .unwrap();
    }

    #[tokio::test]
    async fn renders_name_usage_and_info() {
        let record = remote_with_usage();
        let deps = deps(MemoryBackend::from_profiles([record.clone()], None).unwrap());
        let (tx, _rx) = mpsc::unbounded_channel();
        let card = ProfileCard::new(Arc::new(record), &deps, tx);

        let mut terminal = Terminal::new(TestBackend::new(48, CARD_HEIGHT)).unwrap();
        terminal.draw(|f| card.render(f, f.area())).unwrap();
        let text = buffer_text(terminal.backend().buffer());

        assert!(text.contains("Primary"), "{text}");
        assert!(text.contains("remote"), "{text}");
        assert!(text.contains("From sub.example.com"), "{text}");
        assert!(text.contains("50%"), "{text}");
        assert!(text.contains("Updated 2 hours ago"), "{text}");
    }

    #[tokio::test(start_paused = true)]
    async fn rotation_wake_advances_the_info_line() {
        let record = remote_with_usage();
        let deps = deps(MemoryBackend::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut card = ProfileCard::new(Arc::new(record), &deps, tx);
        assert_eq!(card.info().len(), 2);
        assert_eq!(card.info().index(), 0);

        let wake = rx.recv().await.unwrap();
        assert!(matches!(wake, Action::RotateInfo { .. }));
        card.update(&wake).unwrap();
        assert_eq!(card.info().index(), 1);
    }

    #[tokio::test]
    async fn menu_select_switches_profile() {
        let record = remote_with_usage();
        let deps = deps(MemoryBackend::from_profiles([record.clone()], None).unwrap());
        let backend = Arc::clone(&deps.backend);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut card = ProfileCard::new(Arc::new(record), &deps, tx);

        card.handle_key_event(key(KeyCode::Char('m'))).unwrap();
        assert!(card.captures_input());
        card.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(!card.ui().is_menu_open());

        loop {
            if let Action::CardActionFinished { item, outcome, .. } = rx.recv().await.unwrap() {
                assert_eq!(item, MenuItem::Select);
                assert_eq!(outcome, ActionOutcome::Completed);
                break;
            }
        }
        assert_eq!(backend.current().map(|u| u.to_string()), Some("R1".into()));
        assert_eq!(backend.connections_cleared(), 1);
    }

    #[tokio::test]
    async fn click_on_menu_border_keeps_menu_open() {
        let record = remote_with_usage();
        let deps = deps(MemoryBackend::from_profiles([record.clone()], None).unwrap());
        let backend = Arc::clone(&deps.backend);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut card = ProfileCard::new(Arc::new(record), &deps, tx);
        draw_with_menu(&mut card);

        // Top border row, inside the menu's columns
        let action = card.handle_mouse_event(left_click(3, 2)).unwrap();
        assert!(action.is_none());
        assert!(card.ui().is_menu_open());
        assert!(!card.controller().is_busy());
        tokio::task::yield_now().await;
        assert!(
            !matches!(rx.try_recv(), Ok(Action::CardActionFinished { .. })),
            "border click started an action"
        );
        assert_eq!(backend.current(), None);
    }

    #[tokio::test]
    async fn click_on_first_menu_row_selects_profile() {
        let record = remote_with_usage();
        let deps = deps(MemoryBackend::from_profiles([record.clone()], None).unwrap());
        let backend = Arc::clone(&deps.backend);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut card = ProfileCard::new(Arc::new(record), &deps, tx);
        draw_with_menu(&mut card);

        card.handle_mouse_event(left_click(4, 3)).unwrap();
        assert!(!card.ui().is_menu_open());

        loop {
            if let Action::CardActionFinished { item, outcome, .. } = rx.recv().await.unwrap() {
                assert_eq!(item, MenuItem::Select);
                assert_eq!(outcome, ActionOutcome::Completed);
                break;
            }
        }
        assert_eq!(backend.current().map(|u| u.to_string()), Some("R1".into()));
    }

    #[tokio::test]
    async fn chain_entry_emits_chain_click() {
        let deps = deps(MemoryBackend::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut card = ProfileCard::new(Arc::new(remote_with_usage()), &deps, tx);

        let action = card.handle_key_event(key(KeyCode::Char('c'))).unwrap();
        assert!(matches!(action, Some(Action::ChainClicked(uid)) if uid.as_str() == "R1"));
    }

    #[tokio::test]
    async fn edit_dialog_captures_keys_until_closed() {
        let deps = deps(MemoryBackend::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut card = ProfileCard::new(Arc::new(ProfileRecord::local("L1", "Local")), &deps, tx);

        card.handle_key_event(key(KeyCode::Char('e'))).unwrap();
        assert!(card.ui().edit_dialog_open);
        assert!(card.captures_input());

        // 'd' is typed into the name field instead of deleting the profile
        card.handle_key_event(key(KeyCode::Char('d'))).unwrap();
        assert!(!card.controller().is_deleting());

        card.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(!card.captures_input());
        assert!(!card.ui().edit_dialog_open);
    }
}
