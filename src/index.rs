//! Fingerprint index: an associative store mapping each hash triple to a
//! list of `(track_id, anchor_time)` postings, supporting incremental
//! insertion.
//!
//! Concurrency discipline (§5): a single-writer/many-reader lock.
//! `insert_track` takes the exclusive lock once per ingest, so a concurrent
//! `probe` observes either none or all of that ingest's postings for a
//! given hash key. `probe`/`tracks`/`stats` take the shared lock.

use crate::fingerprint::{Fingerprint, HashKey};
use log::debug;
use std::collections::HashMap;
use std::sync::RwLock;

/// An opaque, stable track identifier, interned at `insert_track` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackId(pub u32);

/// A posting: the track and absolute anchor frame a fingerprint's hash key
/// was observed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub track_id: TrackId,
    pub anchor_frame: u32,
}

/// Track-level metadata, kept in a side table separate from the hot-path
/// hash buckets.
#[derive(Debug, Clone)]
pub struct TrackMeta {
    pub name: String,
    pub fingerprints_count: usize,
    pub duration_seconds: Option<f64>,
}

struct IndexInner {
    buckets: HashMap<HashKey, Vec<Posting>>,
    tracks: Vec<TrackMeta>,
    hash_count: usize,
}

/// The in-memory fingerprint index. Cheap to construct; grows
/// proportionally to cumulative ingested fingerprint count.
pub struct FingerprintIndex {
    inner: RwLock<IndexInner>,
}

impl Default for FingerprintIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintIndex {
    pub fn new() -> Self {
        FingerprintIndex {
            inner: RwLock::new(IndexInner {
                buckets: HashMap::new(),
                tracks: Vec::new(),
                hash_count: 0,
            }),
        }
    }

    /// Register a new track and insert all of its fingerprints as postings,
    /// under a single write-lock acquisition (all-or-nothing visibility per
    /// ingest, per §5). Re-inserting the same name appends a new track_id
    /// and its own postings — the index does not enforce name uniqueness.
    pub fn insert_track(
        &self,
        name: String,
        fingerprints: &[Fingerprint],
        duration_seconds: Option<f64>,
    ) -> (TrackId, usize) {
        let mut inner = self.inner.write().expect("index lock poisoned");
        let track_id = TrackId(inner.tracks.len() as u32);
        inner.tracks.push(TrackMeta {
            name,
            fingerprints_count: fingerprints.len(),
            duration_seconds,
        });
        for fp in fingerprints {
            inner
                .buckets
                .entry(fp.hash_key())
                .or_default()
                .push(Posting {
                    track_id,
                    anchor_frame: fp.anchor_frame,
                });
        }
        inner.hash_count += fingerprints.len();
        debug!(
            "index: inserted track {:?} ({} fingerprints), hash_count now {}",
            track_id,
            fingerprints.len(),
            inner.hash_count
        );
        (track_id, fingerprints.len())
    }

    /// Read-only probe. Posting order is unspecified but stable for a
    /// given index state.
    pub fn probe(&self, key: HashKey) -> Vec<Posting> {
        let inner = self.inner.read().expect("index lock poisoned");
        inner.buckets.get(&key).cloned().unwrap_or_default()
    }

    pub fn tracks(&self) -> Vec<(TrackId, TrackMeta)> {
        let inner = self.inner.read().expect("index lock poisoned");
        inner
            .tracks
            .iter()
            .enumerate()
            .map(|(i, meta)| (TrackId(i as u32), meta.clone()))
            .collect()
    }

    pub fn track_meta(&self, track_id: TrackId) -> Option<TrackMeta> {
        let inner = self.inner.read().expect("index lock poisoned");
        inner.tracks.get(track_id.0 as usize).cloned()
    }

    pub fn stats(&self) -> (usize, usize) {
        let inner = self.inner.read().expect("index lock poisoned");
        (inner.tracks.len(), inner.hash_count)
    }

    /// Remove every posting referencing `track_id`. Not required by the
    /// core contract, but supported: callers needing name-uniqueness
    /// enforcement can use this to implement overwrite semantics
    /// themselves. The track's metadata slot is tombstoned (kept, with an
    /// empty name and zero count) rather than removed, so existing
    /// `TrackId`s never become dangling or get reassigned.
    pub fn remove_track(&self, track_id: TrackId) {
        let mut inner = self.inner.write().expect("index lock poisoned");
        let mut removed = 0usize;
        for postings in inner.buckets.values_mut() {
            let before = postings.len();
            postings.retain(|p| p.track_id != track_id);
            removed += before - postings.len();
        }
        inner.buckets.retain(|_, postings| !postings.is_empty());
        if let Some(meta) = inner.tracks.get_mut(track_id.0 as usize) {
            meta.name = String::new();
            meta.fingerprints_count = 0;
            meta.duration_seconds = None;
        }
        inner.hash_count = inner.hash_count.saturating_sub(removed);
        debug!("index: removed track {:?}, {} postings", track_id, removed);
    }

    /// A point-in-time copy of the entire index state, used by
    /// `persistence.rs` to snapshot/restore. Not part of the engine's
    /// observable contract — the shape of this type may change freely.
    pub(crate) fn snapshot_entries(&self) -> (Vec<TrackMeta>, Vec<(HashKey, Posting)>) {
        let inner = self.inner.read().expect("index lock poisoned");
        let tracks = inner.tracks.clone();
        let mut entries = Vec::with_capacity(inner.hash_count);
        for (key, postings) in inner.buckets.iter() {
            for posting in postings {
                entries.push((*key, *posting));
            }
        }
        (tracks, entries)
    }

    /// Rebuild an index from raw track metadata and posting entries, as
    /// read back by `persistence.rs`. Does not validate invariants — the
    /// caller (persistence layer) is responsible for `CorruptIndex`
    /// detection before handing entries here.
    pub(crate) fn from_entries(tracks: Vec<TrackMeta>, entries: Vec<(HashKey, Posting)>) -> Self {
        let mut buckets: HashMap<HashKey, Vec<Posting>> = HashMap::new();
        for (key, posting) in &entries {
            buckets.entry(*key).or_default().push(*posting);
        }
        FingerprintIndex {
            inner: RwLock::new(IndexInner {
                buckets,
                hash_count: entries.len(),
                tracks,
            }),
        }
    }
}
