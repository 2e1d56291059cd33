//! Localized string lookup.
//!
//! The card never formats user-facing text itself; it asks a
//! [`Translator`] for a key and substitutes `{name}` placeholders. The
//! built-in [`Catalog`] ships English strings and accepts overrides from
//! configuration.

use std::collections::HashMap;

/// String lookup consumed by the card controller and renderer.
pub trait Translator: Send + Sync {
    /// Resolve `key`, substituting `{name}` placeholders from `params`.
    /// Unknown keys resolve to the key itself.
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String;
}

/// Built-in English strings.
const ENGLISH: &[(&str, &str)] = &[
    // Card
    ("card.updated_at", "Updated {time}"),
    ("card.expires_at", "Expires {date}"),
    ("card.from", "From {host}"),
    ("card.local", "Local file"),
    ("card.active", "Active"),
    ("card.applying", "Applying…"),
    ("card.refreshing", "Updating…"),
    ("card.deleting", "Deleting…"),
    ("card.no_usage", "No usage data"),
    // Menu
    ("menu.select", "Select"),
    ("menu.edit_info", "Edit Info"),
    ("menu.proxy_chains", "Proxy Chains"),
    ("menu.open_file", "Open File"),
    ("menu.update", "Update"),
    ("menu.update_via_proxy", "Update (Proxy)"),
    ("menu.delete", "Delete"),
    // Edit dialog
    ("edit.title", "Edit Info"),
    ("edit.name", "Name"),
    ("edit.description", "Description"),
    ("edit.url", "Subscription URL"),
    ("edit.invalid_url", "Invalid URL: {reason}"),
    ("edit.hint", "Enter save  Tab next field  Esc cancel"),
    // Chain panel
    ("chain.title", "Proxy Chain"),
    ("chain.route", "Fetch route"),
    ("chain.direct", "Direct"),
    ("chain.with_proxy", "Through outbound proxy"),
    ("chain.self_proxy", "Through own chain"),
    // Notices
    ("notice.error", "Error"),
    (
        "notice.fetch_failed",
        "Failed to fetch the subscription for {name}. Check the URL, or update via proxy.",
    ),
    // Time
    ("time.just_now", "just now"),
    ("time.past", "{amount} ago"),
    ("time.future", "in {amount}"),
];

/// Key → template table with English defaults.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::english()
    }
}

impl Catalog {
    pub fn english() -> Self {
        Self {
            entries: ENGLISH
                .iter()
                .map(|&(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        }
    }

    /// English defaults with `overrides` layered on top.
    pub fn with_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut catalog = Self::english();
        catalog
            .entries
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        catalog
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = self.get(key).unwrap_or(key);
        interpolate(template, params)
    }
}

/// Replace each `{name}` in `template` with its value from `params`.
/// Placeholders without a matching param are left as-is.
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = template.to_owned();
    for (name, value) in params {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}
