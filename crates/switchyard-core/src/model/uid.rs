// ── Profile identity ──
//
// A profile's uid is minted by the backend when the profile is imported
// and never changes afterwards. Everything keyed per card (timers, locks,
// focus) hangs off this value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileUid(String);

impl ProfileUid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix shown in compact layouts and log lines.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for ProfileUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProfileUid {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<String> for ProfileUid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProfileUid {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for ProfileUid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_truncates_long_uids() {
        let uid = ProfileUid::from("R7f3a9c2e41b0");
        assert_eq!(uid.short(), "R7f3a9c2");
    }

    #[test]
    fn short_keeps_short_uids_whole() {
        let uid = ProfileUid::from("L1");
        assert_eq!(uid.short(), "L1");
    }

    #[test]
    fn serializes_as_plain_string() {
        let uid = ProfileUid::from("Rabc");
        let json = serde_json::to_string(&uid).expect("serialize");
        assert_eq!(json, "\"Rabc\"");
    }
}
