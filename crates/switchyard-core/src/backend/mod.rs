// ── Backend collaborator ──
//
// The card controller talks to whatever owns the profile store through
// `ProfileBackend`. Every operation is an opaque async call returning
// success or a `BackendError`; persistence and retry policy live behind it.

pub mod memory;

use std::future::Future;

use crate::error::BackendError;
use crate::model::{ProfileOption, ProfilePatch, ProfileUid};

pub use memory::MemoryBackend;

/// Profile CRUD and the active-profile switch.
pub trait ProfileBackend: Send + Sync + 'static {
    /// Make `uid` the active routing profile.
    fn set_active_profile(
        &self,
        uid: &ProfileUid,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Tear down live proxied connections.
    fn clear_active_connections(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Refresh a remote subscription with the given fetch options.
    fn update_profile(
        &self,
        uid: &ProfileUid,
        option: ProfileOption,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn delete_profile(
        &self,
        uid: &ProfileUid,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Open the profile's backing file in an external editor.
    fn open_profile_file(
        &self,
        uid: &ProfileUid,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Save edited metadata.
    fn patch_profile(
        &self,
        uid: &ProfileUid,
        patch: ProfilePatch,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}
