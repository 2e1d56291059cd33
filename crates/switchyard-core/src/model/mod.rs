// ── Domain model ──

pub mod profile;
pub mod uid;

pub use profile::{ProfileKind, ProfileOption, ProfilePatch, ProfileRecord, ProfileUsage};
pub use uid::ProfileUid;
