//! Quota usage bar shown on remote profile cards.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use switchyard_core::DerivedTraffic;

use crate::theme;

/// Split a percentage bar into filled and empty portions.
///
/// Returns `(filled, empty)` strings of `█` and `░` characters spanning
/// `width` positions. Over-quota values fill the whole bar.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn fmt_pct_bar(pct: f64, width: u16) -> (String, String) {
    let clamped = if pct.is_finite() {
        pct.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let filled_count = ((clamped / 100.0) * f64::from(width)).round() as u16;
    let empty_count = width.saturating_sub(filled_count);
    (
        "█".repeat(usize::from(filled_count)),
        "░".repeat(usize::from(empty_count)),
    )
}

/// `"50%"`; the exact value is kept, so over-quota shows e.g. `"200%"`.
pub fn fmt_pct(pct: f64) -> String {
    format!("{pct:.0}%")
}

/// Bar, percentage and byte totals on one line, fitted to `width`.
pub fn usage_line(traffic: &DerivedTraffic, width: u16) -> Line<'static> {
    let pct = fmt_pct(traffic.percent_used);
    let label = traffic.label();
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    let reserved = (pct.chars().count() + label.chars().count() + 2) as u16;
    let bar_width = width.saturating_sub(reserved).min(20);

    let color = theme::usage_color(traffic.percent_used);
    let (filled, empty) = fmt_pct_bar(traffic.percent_used, bar_width);
    Line::from(vec![
        Span::styled(filled, Style::default().fg(color)),
        Span::styled(empty, theme::text_dim()),
        Span::styled(format!(" {pct}"), Style::default().fg(color)),
        Span::styled(format!(" {label}"), theme::text()),
    ])
}
