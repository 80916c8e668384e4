//! The `Engine`: an explicit, owned value wiring the five components
//! together, replacing the process-wide mutable state / global config
//! singleton the teacher's original form implied (§9).

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fingerprint::{self, Fingerprint};
use crate::index::{FingerprintIndex, TrackId};
use crate::matcher::{self, MatchResult};
use crate::peaks;
use crate::spectrogram;
use log::info;

/// Result of a successful `ingest` call.
#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    pub track_id: TrackId,
    pub fingerprints_count: usize,
}

/// Row returned by `list_tracks`.
#[derive(Debug, Clone)]
pub struct TrackInfo {
    pub track_id: TrackId,
    pub name: String,
    pub fingerprints_count: usize,
    pub duration_seconds: Option<f64>,
}

/// Row returned by `stats`.
#[derive(Debug, Clone, Copy)]
pub struct Stats {
    pub track_count: usize,
    pub hash_count: usize,
}

/// The recognition engine: an immutable [`EngineConfig`] plus a
/// process-lived [`FingerprintIndex`]. Owned by the caller for its whole
/// lifetime; `ingest`/`recognize` take `&self` so it can be shared behind
/// whatever the caller's own concurrency wrapper is (e.g. an `Arc`).
pub struct Engine {
    config: EngineConfig,
    index: FingerprintIndex,
}

impl Engine {
    /// Build a new engine with an empty index. Returns `InvalidInput` if
    /// the configuration is internally inconsistent (e.g. a `dt_max` that
    /// wouldn't fit the hash key's bit budget).
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config
            .validate()
            .map_err(EngineError::InvalidInput)?;
        Ok(Engine {
            config,
            index: FingerprintIndex::new(),
        })
    }

    /// Build an engine around a pre-populated index (e.g. one restored by
    /// `persistence::restore_from_path`).
    pub fn with_index(config: EngineConfig, index: FingerprintIndex) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidInput)?;
        Ok(Engine { config, index })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &FingerprintIndex {
        &self.index
    }

    /// Compute the fingerprints a buffer would produce, without touching
    /// the index. Shared by `ingest` and `recognize`.
    fn fingerprint_buffer(&self, samples: &[f32], sr: u32) -> Result<Vec<Fingerprint>, EngineError> {
        let grid = spectrogram::spectrogram(samples, sr, &self.config)?;
        let picked = peaks::peaks(&grid, &self.config);
        Ok(fingerprint::fingerprints(&picked, &self.config))
    }

    /// `ingest(track_name, samples, sr)`: fingerprint the buffer and insert
    /// it into the index under a new `track_id`.
    ///
    /// The full fingerprint list is built before the index's write lock is
    /// ever taken, so a cancelled or panicking caller never leaves partial
    /// ingest state visible to concurrent `probe`s (§5).
    pub fn ingest(
        &self,
        track_name: &str,
        samples: &[f32],
        sr: u32,
    ) -> Result<IngestOutcome, EngineError> {
        let fingerprints = self.fingerprint_buffer(samples, sr)?;
        let duration_seconds = Some(samples.len() as f64 / sr as f64);
        let (track_id, fingerprints_count) =
            self.index
                .insert_track(track_name.to_string(), &fingerprints, duration_seconds);
        info!(
            "ingest: '{}' -> track {:?}, {} fingerprints",
            track_name, track_id, fingerprints_count
        );
        Ok(IngestOutcome {
            track_id,
            fingerprints_count,
        })
    }

    /// `recognize(samples, sr) -> MatchResult`.
    pub fn recognize(&self, samples: &[f32], sr: u32) -> Result<MatchResult, EngineError> {
        let fingerprints = self.fingerprint_buffer(samples, sr)?;
        Ok(matcher::recognize(&fingerprints, &self.index, &self.config))
    }

    pub fn list_tracks(&self) -> Vec<TrackInfo> {
        self.index
            .tracks()
            .into_iter()
            .map(|(track_id, meta)| TrackInfo {
                track_id,
                name: meta.name,
                fingerprints_count: meta.fingerprints_count,
                duration_seconds: meta.duration_seconds,
            })
            .collect()
    }

    pub fn stats(&self) -> Stats {
        let (track_count, hash_count) = self.index.stats();
        Stats {
            track_count,
            hash_count,
        }
    }
}
