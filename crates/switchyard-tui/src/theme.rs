//! SilkCircuit Neon palette and semantic styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

use switchyard_core::NoticeKind;

// ── Core Palette ──────────────────────────────────────────────────────

pub const ELECTRIC_PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const CORAL: Color = Color::Rgb(255, 106, 193); // #ff6ac1
pub const ELECTRIC_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29

// ── Semantic Styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ELECTRIC_PURPLE)
}

pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Border of the active profile's card.
pub fn border_active() -> Style {
    Style::default().fg(SUCCESS_GREEN)
}

/// Border of the card whose proxy chain is open.
pub fn border_chain() -> Style {
    Style::default().fg(CORAL)
}

pub fn text() -> Style {
    Style::default().fg(DIM_WHITE)
}

pub fn text_dim() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// "remote" / "local" badge in a card title.
pub fn badge() -> Style {
    Style::default().fg(BG_DARK).bg(NEON_CYAN)
}

pub fn menu_selected() -> Style {
    Style::default()
        .fg(ELECTRIC_PURPLE)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn menu_destructive() -> Style {
    Style::default().fg(ERROR_RED)
}

/// Usage bar color by percent of quota consumed.
pub fn usage_color(pct: f64) -> Color {
    if pct >= 90.0 {
        ERROR_RED
    } else if pct >= 70.0 {
        ELECTRIC_YELLOW
    } else {
        NEON_CYAN
    }
}

pub fn notice_color(kind: NoticeKind) -> Color {
    match kind {
        NoticeKind::Success => SUCCESS_GREEN,
        NoticeKind::Error => ERROR_RED,
        NoticeKind::Warning => ELECTRIC_YELLOW,
        NoticeKind::Info => NEON_CYAN,
    }
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}
