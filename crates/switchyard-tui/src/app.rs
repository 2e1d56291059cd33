//! Application core: event loop, action dispatch, and overlays.

use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use switchyard_core::{MemoryBackend, Notice, NoticeKind, Translator};

use crate::action::Action;
use crate::component::Component;
use crate::components::profile_card::CardDeps;
use crate::event::{Event, InputPump};
use crate::notifier::ChannelNotifier;
use crate::screens::profiles::ProfilesScreen;
use crate::theme;
use crate::tui::TerminalSession;

const TOAST_TTL: Duration = Duration::from_secs(3);
const RENDER_RATE: Duration = Duration::from_millis(33);

/// Runtime knobs resolved from configuration.
pub struct AppOptions {
    pub backend: Arc<MemoryBackend>,
    pub translator: Arc<dyn Translator>,
    pub rotation_interval: Duration,
    pub tick_rate: Duration,
}

/// Top-level application state and event loop.
pub struct App {
    screen: ProfilesScreen,
    running: bool,
    help_visible: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    backend: Arc<MemoryBackend>,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
    /// Active notice toast with display timestamp.
    notification: Option<(Notice, Instant)>,
    tick_rate: Duration,
}

impl App {
    pub fn new(options: AppOptions) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let deps = CardDeps {
            backend: Arc::clone(&options.backend),
            notifier: Arc::new(ChannelNotifier::new(action_tx.clone())),
            translator: options.translator,
            rotation_interval: options.rotation_interval,
        };

        Self {
            screen: ProfilesScreen::new(deps),
            running: true,
            help_visible: false,
            action_tx,
            action_rx,
            backend: options.backend,
            data_cancel: CancellationToken::new(),
            notification: None,
            tick_rate: options.tick_rate,
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = TerminalSession::enter()?;
        self.screen.init(self.action_tx.clone())?;

        let backend = Arc::clone(&self.backend);
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(backend, tx, cancel).await;
        });

        let mut events = InputPump::start(self.tick_rate, RENDER_RATE);

        info!("TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        tui.leave();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys are handled here unless
    /// a card menu or dialog is capturing input.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.screen.captures_input() {
            return self.screen.handle_key_event(key);
        }

        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Esc) if self.notification.is_some() => {
                return Ok(Some(Action::DismissNotification));
            }
            _ => {}
        }

        self.screen.handle_key_event(key)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok(None);
        }
        self.screen.handle_mouse_event(mouse)
    }

    /// Process a single action: update app state and propagate to the screen.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            Action::Render => {}

            Action::Resize(w, h) => debug!(w, h, "terminal resized"),

            Action::Notify(notice) => {
                debug!(kind = %notice.kind, title = %notice.title, "notice");
                self.notification = Some((notice.clone(), Instant::now()));
            }

            Action::DismissNotification => {
                self.notification = None;
            }

            Action::Tick => {
                if let Some((_, shown)) = &self.notification {
                    if shown.elapsed() > TOAST_TTL {
                        self.notification = None;
                    }
                }
                self.forward(action)?;
            }

            other => self.forward(other)?,
        }

        Ok(())
    }

    fn forward(&mut self, action: &Action) -> Result<()> {
        if let Some(follow_up) = self.screen.update(action)? {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let [content_area, status_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

        self.screen.render(frame, content_area);
        self.render_status_bar(frame, status_area);

        // Overlays on top (last = topmost)
        if let Some((ref notice, _)) = self.notification {
            Self::render_notification(frame, area, notice);
        }
        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    /// Bottom status bar: active profile and key hints.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let active = match self.screen.current_profile_name() {
            Some(name) => Span::styled(
                format!("● {name}"),
                Style::default().fg(theme::SUCCESS_GREEN),
            ),
            None => Span::styled("○ no active profile", theme::text_dim()),
        };
        let hints = Span::styled(
            " │ Enter select  m menu  u update  c chains  ? help  q quit",
            theme::key_hint(),
        );
        frame.render_widget(Paragraph::new(Line::from(vec![Span::raw(" "), active, hints])), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_width = 56u16.min(area.width.saturating_sub(4));
        let help_height = 21u16.min(area.height.saturating_sub(2));

        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(Clear, help_area);
        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let section = |title: &'static str| {
            Line::from(Span::styled(format!("  {title}"), Style::default().fg(theme::NEON_CYAN)))
        };
        let row = |key: &'static str, desc: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(desc, theme::key_hint()),
            ])
        };

        let help_text = vec![
            section("Navigation"),
            row("←↓↑→ hjkl", "Move between cards"),
            row("g/G", "First / last card"),
            row("Esc", "Close menu, dialog or chain panel"),
            Line::from(""),
            section("Card"),
            row("Enter", "Select profile"),
            row("m", "Context menu (or right click)"),
            row("e", "Edit info"),
            row("c", "Proxy chains"),
            row("o", "Open file"),
            row("u / U", "Update / update via proxy"),
            row("d", "Delete"),
            row("i", "Next info line (or click it)"),
            Line::from(""),
            section("Global"),
            row("?", "This help"),
            row("q", "Quit"),
            Line::from(""),
            Line::from(Span::styled("  Esc or ? to close", theme::key_hint())),
        ];
        frame.render_widget(Paragraph::new(help_text), inner);
    }

    /// Notice toast in the bottom-right corner, above the status bar.
    fn render_notification(frame: &mut Frame, area: Rect, notice: &Notice) {
        let color = theme::notice_color(notice.kind);
        let icon = match notice.kind {
            NoticeKind::Success => "✓",
            NoticeKind::Error => "✗",
            NoticeKind::Warning => "!",
            NoticeKind::Info => "·",
        };

        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let msg_len = notice.message.chars().count().min(usize::from(u16::MAX)) as u16;
        let width = msg_len.saturating_add(6).clamp(24, 60).min(area.width);
        let height = if msg_len + 6 > width { 4u16 } else { 3u16 };

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 1);
        let toast_area = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(Clear, toast_area);
        let block = Block::default()
            .title(Span::styled(format!(" {} ", notice.title), Style::default().fg(color)))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!("{icon} "), Style::default().fg(color)),
            Span::styled(notice.message.clone(), Style::default().fg(theme::DIM_WHITE)),
        ]);
        frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), inner);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};
    use switchyard_core::Catalog;

    fn app() -> App {
        App::new(AppOptions {
            backend: Arc::new(MemoryBackend::new()),
            translator: Arc::new(Catalog::english()),
            rotation_interval: Duration::from_secs(5),
            tick_rate: Duration::from_millis(250),
        })
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn notice_toast_renders_and_expires() {
        let mut app = app();
        app.process_action(&Action::Notify(Notice::error("Error", "boom")))
            .unwrap();

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("boom"));

        app.notification = app
            .notification
            .take()
            .map(|(n, _)| (n, Instant::now().checked_sub(TOAST_TTL * 2).unwrap()));
        app.process_action(&Action::Tick).unwrap();
        assert!(app.notification.is_none());
    }

    #[tokio::test]
    async fn help_toggles_and_swallows_keys() {
        let mut app = app();
        let action = app.handle_key_event(key(KeyCode::Char('?'))).unwrap();
        assert!(matches!(action, Some(Action::ToggleHelp)));
        app.process_action(&Action::ToggleHelp).unwrap();

        assert!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap().is_none());
        let action = app.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(matches!(action, Some(Action::ToggleHelp)));
    }

    #[tokio::test]
    async fn quit_keys() {
        let mut app = app();
        assert!(matches!(
            app.handle_key_event(key(KeyCode::Char('q'))).unwrap(),
            Some(Action::Quit)
        ));
        assert!(matches!(
            app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
                .unwrap(),
            Some(Action::Quit)
        ));
        app.process_action(&Action::Quit).unwrap();
        assert!(!app.running);
    }
}
