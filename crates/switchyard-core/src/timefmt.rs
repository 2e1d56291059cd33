//! Relative and absolute rendering of unix-seconds timestamps.

use chrono::{Local, TimeZone, Utc};

use crate::i18n::Translator;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 365 * DAY;

/// Current wall-clock time in unix seconds.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Largest whole unit of `secs`, e.g. `"3 hours"`. `None` below a minute.
fn magnitude(secs: i64) -> Option<String> {
    let secs = secs.unsigned_abs();
    let (count, unit) = match secs {
        s if s < MINUTE => return None,
        s if s < HOUR => (s / MINUTE, "minute"),
        s if s < DAY => (s / HOUR, "hour"),
        s if s < MONTH => (s / DAY, "day"),
        s if s < YEAR => (s / MONTH, "month"),
        s => (s / YEAR, "year"),
    };
    let plural = if count == 1 { "" } else { "s" };
    Some(format!("{count} {unit}{plural}"))
}

/// `"5 minutes ago"`, `"in 3 days"` or `"just now"`, relative to `now`.
pub fn relative(ts: i64, now: i64, tr: &dyn Translator) -> String {
    // Saturates for timestamps at the far ends of the i64 range.
    let delta = ts.saturating_sub(now);
    match magnitude(delta) {
        None => tr.translate("time.just_now", &[]),
        Some(amount) if delta < 0 => tr.translate("time.past", &[("amount", &amount)]),
        Some(amount) => tr.translate("time.future", &[("amount", &amount)]),
    }
}

/// Calendar date in the local timezone, `YYYY-MM-DD`. Out-of-range
/// timestamps render as the raw number.
pub fn absolute(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;

    const NOW: i64 = 1_750_000_000;

    #[test]
    fn recent_past_is_just_now() {
        let tr = Catalog::english();
        assert_eq!(relative(NOW - 10, NOW, &tr), "just now");
    }

    #[test]
    fn past_and_future_use_the_largest_unit() {
        let tr = Catalog::english();
        assert_eq!(relative(NOW - 5 * 60, NOW, &tr), "5 minutes ago");
        assert_eq!(relative(NOW - 3600, NOW, &tr), "1 hour ago");
        assert_eq!(relative(NOW + 3 * 86_400 + 5, NOW, &tr), "in 3 days");
        assert_eq!(relative(NOW + 2 * 365 * 86_400, NOW, &tr), "in 2 years");
    }

    #[test]
    fn extreme_timestamps_saturate_instead_of_overflowing() {
        let tr = Catalog::english();
        let past = relative(i64::MIN, i64::MAX, &tr);
        assert!(past.ends_with("years ago"), "{past}");
        let future = relative(i64::MAX, i64::MIN, &tr);
        assert!(future.starts_with("in ") && future.ends_with("years"), "{future}");
    }

    #[test]
    fn absolute_falls_back_to_raw_number_out_of_range() {
        assert_eq!(absolute(i64::MAX), i64::MAX.to_string());
    }
}
