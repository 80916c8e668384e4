//! Time-shift invariant audio fingerprint recognition engine.
//!
//! Identifies a short audio excerpt against a library of previously
//! ingested reference tracks, via a Shazam-style landmark constellation:
//! spectral front-end → banded peak picking → anchor/target hashing →
//! offset-histogram matching.
//!
//! The engine does not survive pitch shift, time stretch, or melody
//! humming, and only ever returns its single best candidate.
//!
//! ```no_run
//! use soundmark::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let samples: Vec<f32> = vec![0.0; 44_100 * 5];
//! engine.ingest("example", &samples, 44_100).unwrap();
//! let result = engine.recognize(&samples[..44_100], 44_100).unwrap();
//! println!("matched: {}", result.matched());
//! ```

pub mod audio_loader;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod matcher;
pub mod peaks;
pub mod persistence;
pub mod spectrogram;

pub use config::EngineConfig;
pub use engine::{Engine, IngestOutcome, Stats, TrackInfo};
pub use error::{EngineError, PersistenceError};
pub use fingerprint::Fingerprint;
pub use index::{FingerprintIndex, Posting, TrackId, TrackMeta};
pub use matcher::{Confidence, MatchResult, format_offset_mmss};
pub use peaks::Peak;
pub use spectrogram::Spectrogram;
