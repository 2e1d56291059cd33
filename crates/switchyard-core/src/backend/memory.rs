// ── In-memory profile backend ──
//
// Concurrent storage with push-based change notification via `watch`
// channels. Backs the TUI when no external proxy core is attached, and
// doubles as a realistic backend for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, info};

use super::ProfileBackend;
use crate::error::{BackendError, ModelError};
use crate::model::{ProfileOption, ProfilePatch, ProfileRecord, ProfileUid};

pub type ProfileSnapshot = Arc<Vec<Arc<ProfileRecord>>>;

/// Profiles keyed by uid, published in insertion order.
pub struct MemoryBackend {
    /// uid -> (insertion sequence, record).
    profiles: DashMap<ProfileUid, (u64, Arc<ProfileRecord>)>,
    next_seq: AtomicU64,
    snapshot: watch::Sender<ProfileSnapshot>,
    current: watch::Sender<Option<ProfileUid>>,
    /// Simulated round-trip for every call.
    latency: Duration,
    connections_cleared: AtomicU64,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("profiles", &self.profiles.len())
            .field("current", &*self.current.borrow())
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (current, _) = watch::channel(None);
        Self {
            profiles: DashMap::new(),
            next_seq: AtomicU64::new(0),
            snapshot,
            current,
            latency: Duration::ZERO,
            connections_cleared: AtomicU64::new(0),
        }
    }

    /// Seed from configuration. Every record is validated and uids must be
    /// unique. An unknown `current` uid is ignored.
    pub fn from_profiles(
        profiles: impl IntoIterator<Item = ProfileRecord>,
        current: Option<ProfileUid>,
    ) -> Result<Self, ModelError> {
        let backend = Self::new();
        for record in profiles {
            record.validate()?;
            if backend.profiles.contains_key(&record.uid) {
                return Err(ModelError::DuplicateUid {
                    uid: record.uid.to_string(),
                });
            }
            backend.insert(record);
        }
        if let Some(uid) = current.filter(|uid| backend.profiles.contains_key(uid)) {
            backend.current.send_replace(Some(uid));
        }
        Ok(backend)
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Insert or replace a record. Replacing keeps its position.
    pub fn insert(&self, record: ProfileRecord) {
        let seq = self
            .profiles
            .get(&record.uid)
            .map_or_else(|| self.next_seq.fetch_add(1, Ordering::Relaxed), |e| e.0);
        self.profiles
            .insert(record.uid.clone(), (seq, Arc::new(record)));
        self.rebuild_snapshot();
    }

    pub fn get(&self, uid: &ProfileUid) -> Option<Arc<ProfileRecord>> {
        self.profiles.get(uid).map(|e| Arc::clone(&e.1))
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> ProfileSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn current(&self) -> Option<ProfileUid> {
        self.current.borrow().clone()
    }

    pub fn subscribe_current(&self) -> watch::Receiver<Option<ProfileUid>> {
        self.current.subscribe()
    }

    /// How many times active connections were cleared.
    pub fn connections_cleared(&self) -> u64 {
        self.connections_cleared.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn require(&self, uid: &ProfileUid) -> Result<Arc<ProfileRecord>, BackendError> {
        self.get(uid).ok_or_else(|| BackendError::NotFound {
            uid: uid.to_string(),
        })
    }

    /// Apply `f` to a copy of the record and store it back.
    fn modify(
        &self,
        uid: &ProfileUid,
        f: impl FnOnce(&mut ProfileRecord) -> Result<(), BackendError>,
    ) -> Result<(), BackendError> {
        {
            let mut entry = self
                .profiles
                .get_mut(uid)
                .ok_or_else(|| BackendError::NotFound {
                    uid: uid.to_string(),
                })?;
            let mut record = ProfileRecord::clone(&entry.1);
            f(&mut record)?;
            entry.1 = Arc::new(record);
        }
        self.rebuild_snapshot();
        Ok(())
    }

    /// Republish the ordered snapshot. The map is read under the channel's
    /// write lock, so concurrent rebuilds publish in the order they read.
    fn rebuild_snapshot(&self) {
        self.snapshot.send_modify(|snap| {
            let mut entries: Vec<(u64, Arc<ProfileRecord>)> = self
                .profiles
                .iter()
                .map(|r| (r.value().0, Arc::clone(&r.value().1)))
                .collect();
            entries.sort_by_key(|(seq, _)| *seq);
            *snap = Arc::new(entries.into_iter().map(|(_, p)| p).collect());
        });
    }
}

impl ProfileBackend for MemoryBackend {
    async fn set_active_profile(&self, uid: &ProfileUid) -> Result<(), BackendError> {
        self.round_trip().await;
        // Existence is checked under the `current` lock; delete clears
        // `current` under the same lock after removing the record.
        let mut found = false;
        self.current.send_if_modified(|current| {
            found = self.profiles.contains_key(uid);
            if found && current.as_ref() != Some(uid) {
                *current = Some(uid.clone());
                true
            } else {
                false
            }
        });
        if !found {
            return Err(BackendError::NotFound {
                uid: uid.to_string(),
            });
        }
        info!(%uid, "active profile switched");
        Ok(())
    }

    async fn clear_active_connections(&self) -> Result<(), BackendError> {
        self.round_trip().await;
        self.connections_cleared.fetch_add(1, Ordering::Relaxed);
        debug!("active connections cleared");
        Ok(())
    }

    async fn update_profile(
        &self,
        uid: &ProfileUid,
        option: ProfileOption,
    ) -> Result<(), BackendError> {
        self.round_trip().await;
        self.modify(uid, |record| {
            if !record.is_remote() {
                return Err(BackendError::Unsupported {
                    operation: "update a local profile".into(),
                });
            }
            record.option = Some(option);
            record.updated_at = Some(crate::timefmt::now());
            Ok(())
        })?;
        info!(%uid, with_proxy = option.with_proxy, self_proxy = option.self_proxy, "profile refreshed");
        Ok(())
    }

    async fn delete_profile(&self, uid: &ProfileUid) -> Result<(), BackendError> {
        self.round_trip().await;
        if self.profiles.remove(uid).is_none() {
            return Err(BackendError::NotFound {
                uid: uid.to_string(),
            });
        }
        self.rebuild_snapshot();
        self.current.send_if_modified(|current| {
            if current.as_ref() == Some(uid) {
                *current = None;
                true
            } else {
                false
            }
        });
        info!(%uid, "profile deleted");
        Ok(())
    }

    async fn open_profile_file(&self, uid: &ProfileUid) -> Result<(), BackendError> {
        self.round_trip().await;
        self.require(uid)?;
        Err(BackendError::Unsupported {
            operation: "open profile file".into(),
        })
    }

    async fn patch_profile(&self, uid: &ProfileUid, patch: ProfilePatch) -> Result<(), BackendError> {
        self.round_trip().await;
        self.modify(uid, |record| {
            patch.apply(record);
            record.validate().map_err(|e| BackendError::Validation {
                message: e.to_string(),
            })
        })?;
        debug!(%uid, "profile patched");
        Ok(())
    }
}
