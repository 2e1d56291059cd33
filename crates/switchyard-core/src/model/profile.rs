// ── Profile domain types ──

use serde::{Deserialize, Serialize};

use super::uid::ProfileUid;
use crate::error::ModelError;

/// Where a profile's configuration comes from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProfileKind {
    /// Subscription fetched from a URL and refreshable.
    Remote,
    /// Static file on disk.
    #[default]
    Local,
}

/// How a remote profile is fetched on refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileOption {
    /// Fetch through the system-wide outbound proxy.
    #[serde(default)]
    pub with_proxy: bool,
    /// Fetch through the profile's own evaluated proxy chain.
    #[serde(default)]
    pub self_proxy: bool,
}

impl ProfileOption {
    pub const DIRECT: Self = Self {
        with_proxy: false,
        self_proxy: false,
    };
}

/// Subscription usage counters reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileUsage {
    #[serde(default)]
    pub upload: u64,
    #[serde(default)]
    pub download: u64,
    /// Quota in bytes. Zero means the provider reports no quota.
    #[serde(default)]
    pub total: u64,
    /// Unix seconds. Providers send `0` for "never expires".
    pub expires_at: Option<i64>,
}

/// The canonical profile record, owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub uid: ProfileUid,
    #[serde(rename = "type", default)]
    pub kind: ProfileKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Subscription URL, remote profiles only.
    pub url: Option<String>,
    /// Backing file name inside the backend's profile directory.
    pub file: Option<String>,
    /// Unix seconds of the last successful refresh.
    pub updated_at: Option<i64>,
    pub option: Option<ProfileOption>,
    pub usage: Option<ProfileUsage>,
}

impl ProfileRecord {
    pub fn remote(uid: impl Into<ProfileUid>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            kind: ProfileKind::Remote,
            name: name.into(),
            description: String::new(),
            url: Some(url.into()),
            file: None,
            updated_at: None,
            option: None,
            usage: None,
        }
    }

    pub fn local(uid: impl Into<ProfileUid>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            kind: ProfileKind::Local,
            name: name.into(),
            description: String::new(),
            url: None,
            file: None,
            updated_at: None,
            option: None,
            usage: None,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.kind == ProfileKind::Remote
    }

    /// Stored fetch options, or direct fetch when none were saved.
    pub fn options(&self) -> ProfileOption {
        self.option.unwrap_or_default()
    }

    /// Expiry timestamp, ignoring the provider's `0` sentinel.
    pub fn expires_at(&self) -> Option<i64> {
        self.usage
            .and_then(|u| u.expires_at)
            .filter(|&ts| ts > 0)
    }

    /// Host part of the subscription URL, for the "from" label.
    pub fn source_host(&self) -> Option<String> {
        let url: url::Url = self.url.as_deref()?.parse().ok()?;
        url.host_str().map(str::to_owned)
    }

    /// Check the invariants a backend relies on when seeding records.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.uid.as_str().trim().is_empty() {
            return Err(ModelError::EmptyUid);
        }
        match (self.kind, self.url.as_deref()) {
            (ProfileKind::Remote, None) => Err(ModelError::MissingUrl {
                uid: self.uid.to_string(),
            }),
            (ProfileKind::Remote, Some(raw)) => {
                raw.parse::<url::Url>()
                    .map_err(|e| ModelError::InvalidUrl {
                        uid: self.uid.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(())
            }
            (ProfileKind::Local, Some(_)) => Err(ModelError::UnexpectedUrl {
                uid: self.uid.to_string(),
            }),
            (ProfileKind::Local, None) => Ok(()),
        }
    }
}

/// Partial update produced by the edit dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.url.is_none()
    }

    /// Apply onto a record. A URL is only accepted for remote profiles.
    pub fn apply(&self, record: &mut ProfileRecord) {
        if let Some(ref name) = self.name {
            record.name.clone_from(name);
        }
        if let Some(ref description) = self.description {
            record.description.clone_from(description);
        }
        if let Some(ref url) = self.url {
            if record.is_remote() {
                record.url = Some(url.clone());
            }
        }
    }
}
