// ── Core error types ──
//
// `BackendError` is what a `ProfileBackend` hands back. The card controller
// only cares about one distinction: whether a failure came from fetching
// the subscription, which gets a canned localized message, or from
// anything else, which is echoed verbatim.

use serde::Serialize;
use thiserror::Error;

/// Failure reported by the backend collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendError {
    /// Retrieving the remote subscription failed.
    #[error("Failed to fetch subscription: {message}")]
    SubscriptionFetch { message: String },

    #[error("Profile not found: {uid}")]
    NotFound { uid: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Operation rejected by backend: {message}")]
    Rejected { message: String },

    #[error("Backend unavailable: {message}")]
    Unavailable { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BackendError {
    /// Whether this failure belongs to the subscription-fetch category.
    pub fn is_subscription_fetch(&self) -> bool {
        matches!(self, Self::SubscriptionFetch { .. })
    }

    /// JSON rendering of the error payload, used where the raw payload is
    /// shown to the user.
    pub fn to_payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_string())
    }
}

/// Invariant violations in a [`ProfileRecord`](crate::model::ProfileRecord).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("profile uid must not be empty")]
    EmptyUid,

    #[error("remote profile '{uid}' has no url")]
    MissingUrl { uid: String },

    #[error("remote profile '{uid}' has an invalid url: {reason}")]
    InvalidUrl { uid: String, reason: String },

    #[error("local profile '{uid}' must not carry a url")]
    UnexpectedUrl { uid: String },

    #[error("duplicate profile uid '{uid}'")]
    DuplicateUid { uid: String },
}
