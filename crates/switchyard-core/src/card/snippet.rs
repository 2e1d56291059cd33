//! Informational snippets shown in a card's rotating info line.

use crate::i18n::Translator;
use crate::model::ProfileRecord;
use crate::timefmt;

/// One rotating line. Each variant carries a unix-seconds timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoSnippet {
    Updated(i64),
    Expires(i64),
}

impl InfoSnippet {
    pub fn render(self, now: i64, tr: &dyn Translator) -> String {
        match self {
            Self::Updated(ts) => {
                let time = timefmt::relative(ts, now, tr);
                tr.translate("card.updated_at", &[("time", &time)])
            }
            Self::Expires(ts) => {
                let date = timefmt::absolute(ts);
                tr.translate("card.expires_at", &[("date", &date)])
            }
        }
    }
}

/// Candidate snippets for a profile, `None` where the backing field is
/// absent. Feed straight into a rotating display.
pub fn snippets_for(profile: &ProfileRecord) -> [Option<InfoSnippet>; 2] {
    [
        profile.updated_at.map(InfoSnippet::Updated),
        profile.expires_at().map(InfoSnippet::Expires),
    ]
}
