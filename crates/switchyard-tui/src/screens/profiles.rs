//! Profiles screen: a grid of profile cards plus the proxy-chain panel.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Position, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use switchyard_core::backend::memory::ProfileSnapshot;
use switchyard_core::{
    ActionOutcome, MenuItem, ProfileRecord, ProfileUid, compute_traffic, timefmt,
};

use crate::action::Action;
use crate::component::Component;
use crate::components::profile_card::{CARD_HEIGHT, CARD_MIN_WIDTH, CardDeps, ProfileCard};
use crate::theme;

const CHAIN_PANEL_WIDTH: u16 = 38;

pub struct ProfilesScreen {
    deps: CardDeps,
    action_tx: Option<UnboundedSender<Action>>,
    cards: Vec<ProfileCard>,
    current: Option<ProfileUid>,
    chain_selected: Option<ProfileUid>,
    focused: usize,
    /// Columns in the last rendered grid, for vertical navigation.
    columns: Cell<usize>,
    loaded: bool,
}

impl ProfilesScreen {
    pub fn new(deps: CardDeps) -> Self {
        Self {
            deps,
            action_tx: None,
            cards: Vec::new(),
            current: None,
            chain_selected: None,
            focused: 0,
            columns: Cell::new(1),
            loaded: false,
        }
    }

    #[cfg(test)]
    pub fn cards(&self) -> &[ProfileCard] {
        &self.cards
    }

    #[cfg(test)]
    pub fn focused_index(&self) -> usize {
        self.focused
    }

    #[cfg(test)]
    pub fn chain_selected(&self) -> Option<&ProfileUid> {
        self.chain_selected.as_ref()
    }

    /// Name of the active profile, when it is in the list.
    pub fn current_profile_name(&self) -> Option<&str> {
        let uid = self.current.as_ref()?;
        self.cards
            .iter()
            .find(|c| &c.profile().uid == uid)
            .map(|c| c.profile().name.as_str())
    }

    /// Rebuild the card list, keeping existing cards (and their timers,
    /// locks and menus) for uids that survive.
    fn apply_snapshot(&mut self, snapshot: &ProfileSnapshot) {
        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        self.loaded = true;

        let focused_uid = self.cards.get(self.focused).map(|c| c.profile().uid.clone());
        let mut previous: HashMap<ProfileUid, ProfileCard> = self
            .cards
            .drain(..)
            .map(|card| (card.profile().uid.clone(), card))
            .collect();

        self.cards = snapshot
            .iter()
            .map(|profile| match previous.remove(&profile.uid) {
                Some(mut card) => {
                    card.set_profile(Arc::clone(profile));
                    card
                }
                None => ProfileCard::new(Arc::clone(profile), &self.deps, tx.clone()),
            })
            .collect();
        debug!(
            cards = self.cards.len(),
            unmounted = previous.len(),
            "profile cards rebuilt"
        );

        self.focused = focused_uid
            .and_then(|uid| self.cards.iter().position(|c| c.profile().uid == uid))
            .unwrap_or(self.focused)
            .min(self.cards.len().saturating_sub(1));

        if let Some(ref uid) = self.chain_selected {
            if !self.cards.iter().any(|c| &c.profile().uid == uid) {
                self.chain_selected = None;
            }
        }
        self.sync_card_state();
    }

    fn sync_card_state(&mut self) {
        for (i, card) in self.cards.iter_mut().enumerate() {
            let uid = &card.profile().uid;
            let is_selected = self.current.as_ref() == Some(uid);
            let is_chain = self.chain_selected.as_ref() == Some(uid);
            card.set_state(is_selected, is_chain, i == self.focused);
        }
    }

    fn focus(&mut self, index: usize) {
        if self.cards.is_empty() {
            return;
        }
        self.focused = index.min(self.cards.len() - 1);
        self.sync_card_state();
    }

    fn move_focus(&mut self, delta: isize) {
        let next = self.focused.saturating_add_signed(delta);
        self.focus(next);
    }

    fn capturing_card(&mut self) -> Option<&mut ProfileCard> {
        self.cards.iter_mut().find(|c| c.captures_input())
    }

    #[allow(clippy::cast_possible_wrap, clippy::as_conversions)]
    fn row_step(&self) -> isize {
        self.columns.get().max(1) as isize
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_empty(frame: &mut Frame, area: Rect) {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("No profiles yet", theme::title_style())),
            Line::from(Span::styled(
                "Add [[profiles]] entries to the config file",
                theme::text_dim(),
            )),
        ];
        frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
    }

    fn render_grid(&self, frame: &mut Frame, area: Rect) {
        let columns = usize::from((area.width / CARD_MIN_WIDTH).max(1));
        self.columns.set(columns);
        let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));

        let focused_row = self.focused / columns;
        let first_row = focused_row.saturating_sub(visible_rows - 1);
        let first = first_row * columns;
        let last = (first + visible_rows * columns).min(self.cards.len());

        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let card_width = area.width / columns as u16;

        for (i, card) in self.cards.iter().enumerate() {
            if i < first || i >= last {
                card.hide();
                continue;
            }
            let offset = i - first;
            #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
            let (col, row) = ((offset % columns) as u16, (offset / columns) as u16);
            let rect = Rect::new(
                area.x + col * card_width,
                area.y + row * CARD_HEIGHT,
                card_width,
                CARD_HEIGHT,
            )
            .intersection(area);
            card.render(frame, rect);
        }
    }

    fn render_chain_panel(&self, frame: &mut Frame, area: Rect, profile: &ProfileRecord) {
        let tr = &*self.deps.translator;
        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(format!(" {} ", tr.translate("chain.title", &[])), theme::title_style()),
                Span::styled(format!("{} ", profile.name), theme::text()),
            ]))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_chain());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let options = profile.options();
        let route_key = if options.self_proxy {
            "chain.self_proxy"
        } else if options.with_proxy {
            "chain.with_proxy"
        } else {
            "chain.direct"
        };

        let label = |text: &str| Span::styled(format!("{text:<12}"), theme::key_hint());
        let mut lines = vec![
            Line::from(vec![label("Kind"), Span::styled(profile.kind.to_string(), theme::text())]),
            Line::from(vec![
                label("Uid"),
                Span::styled(profile.uid.short().to_owned(), theme::text()),
            ]),
        ];
        if profile.is_remote() {
            lines.push(Line::from(vec![
                label(&tr.translate("chain.route", &[])),
                Span::styled(tr.translate(route_key, &[]), Style::default().fg(theme::NEON_CYAN)),
            ]));
        }
        if let Some(ref url) = profile.url {
            lines.push(Line::from(vec![label("Url"), Span::styled(url.clone(), theme::text_dim())]));
        }
        if let Some(ref file) = profile.file {
            lines.push(Line::from(vec![label("File"), Span::styled(file.clone(), theme::text_dim())]));
        }
        if profile.usage.is_some() {
            lines.push(Line::from(vec![
                label("Usage"),
                Span::styled(compute_traffic(profile).label(), theme::text()),
            ]));
        }
        if let Some(expires) = profile.expires_at() {
            lines.push(Line::from(vec![
                label("Expires"),
                Span::styled(timefmt::absolute(expires), theme::text()),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("close", theme::key_hint()),
        ]));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }
}

impl Component for ProfilesScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(card) = self.capturing_card() {
            return card.handle_key_event(key);
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Left | KeyCode::Char('h')) => self.move_focus(-1),
            (KeyModifiers::NONE, KeyCode::Right | KeyCode::Char('l')) => self.move_focus(1),
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => {
                self.move_focus(-self.row_step());
            }
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => {
                self.move_focus(self.row_step());
            }
            (KeyModifiers::NONE, KeyCode::Home | KeyCode::Char('g')) => self.focus(0),
            (_, KeyCode::End | KeyCode::Char('G')) => self.focus(usize::MAX),
            (KeyModifiers::NONE, KeyCode::Esc) if self.chain_selected.is_some() => {
                return Ok(Some(Action::CloseChains));
            }
            _ => {
                if let Some(card) = self.cards.get_mut(self.focused) {
                    return card.handle_key_event(key);
                }
            }
        }
        Ok(None)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if let Some(card) = self.capturing_card() {
            return card.handle_mouse_event(mouse);
        }

        match mouse.kind {
            MouseEventKind::ScrollDown => {
                self.move_focus(self.row_step());
                Ok(None)
            }
            MouseEventKind::ScrollUp => {
                self.move_focus(-self.row_step());
                Ok(None)
            }
            MouseEventKind::Down(_) => {
                let pos = Position::new(mouse.column, mouse.row);
                let Some(index) = self.cards.iter().position(|c| c.hit(pos)) else {
                    return Ok(None);
                };
                self.focus(index);
                self.cards[index].handle_mouse_event(mouse)
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ProfilesUpdated(snapshot) => self.apply_snapshot(snapshot),
            Action::CurrentProfileChanged(uid) => {
                self.current.clone_from(uid);
                self.sync_card_state();
            }
            Action::ChainClicked(uid) => {
                if self.chain_selected.as_ref() == Some(uid) {
                    self.chain_selected = None;
                } else {
                    self.chain_selected = Some(uid.clone());
                }
                self.sync_card_state();
            }
            Action::CloseChains => {
                self.chain_selected = None;
                self.sync_card_state();
            }
            Action::RotateInfo { uid, .. } => {
                if let Some(card) = self.cards.iter_mut().find(|c| &c.profile().uid == uid) {
                    card.update(action)?;
                }
            }
            Action::Tick => {
                for card in &mut self.cards {
                    card.update(action)?;
                }
            }
            Action::CardActionFinished { uid, item, outcome } => {
                debug!(%uid, item = item.as_ref(), %outcome, "card action finished");
                if *item == MenuItem::Delete
                    && *outcome == ActionOutcome::Completed
                    && self.chain_selected.as_ref() == Some(uid)
                {
                    self.chain_selected = None;
                    self.sync_card_state();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if self.cards.is_empty() {
            if self.loaded {
                Self::render_empty(frame, area);
            }
            return;
        }

        let chain = self
            .chain_selected
            .as_ref()
            .and_then(|uid| self.cards.iter().find(|c| &c.profile().uid == uid));

        let grid_area = match chain {
            Some(card) if area.width >= CARD_MIN_WIDTH + CHAIN_PANEL_WIDTH => {
                let [grid, panel] = Layout::horizontal([
                    Constraint::Min(CARD_MIN_WIDTH),
                    Constraint::Length(CHAIN_PANEL_WIDTH),
                ])
                .areas(area);
                self.render_chain_panel(frame, panel, card.profile());
                grid
            }
            _ => area,
        };

        self.render_grid(frame, grid_area);

        for card in &self.cards {
            card.render_overlays(frame, area);
        }
    }

    fn captures_input(&self) -> bool {
        self.cards.iter().any(Component::captures_input)
    }

    fn id(&self) -> &str {
        "profiles"
    }
}
