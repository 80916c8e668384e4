//! Error kinds surfaced at the engine boundary.
//!
//! Per the engine's propagation policy: every error is deterministic given
//! its inputs. The engine never retries, never swallows, and never logs
//! from within an error path — callers decide how to translate these into
//! their own transport (HTTP status, CLI exit code, …).

use thiserror::Error;

/// Errors raised by the fingerprinting/recognition engine itself.
///
/// `IoError` is never constructed by the engine — it exists so callers can
/// fold [`PersistenceError`] into a single error type if they choose to.
/// The engine's own pure transforms and `Engine::ingest`/`recognize` only
/// ever return `InvalidInput` or `CorruptIndex`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Sample rate mismatch, too-short audio, wrong channel count, or an
    /// empty query/ingest buffer.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A restored snapshot failed an internal consistency check (e.g. a
    /// fingerprint with `dt` outside the configured window).
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// Reserved for collaborators that fold I/O failures into this type.
    /// Never raised by the engine.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised by the persistence collaborator (`persistence.rs`).
///
/// Kept distinct from [`EngineError`] because persistence is explicitly an
/// external collaborator in the engine's contract, not part of the engine
/// itself — the engine never raises `IoError` or talks to SQLite directly.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
}

impl From<PersistenceError> for EngineError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Corrupt(msg) => EngineError::CorruptIndex(msg),
            other => EngineError::CorruptIndex(other.to_string()),
        }
    }
}
