//! `soundmark-cli` — enroll/recognize/list/stats over a persisted index.
//!
//! Stands in for the HTTP surface named in the engine's contract: each
//! subcommand below mirrors one of the four endpoints (add track,
//! recognize, list, health).

use clap::{Parser, Subcommand};
use log::info;
use soundmark::matcher::format_offset_mmss;
use soundmark::{Engine, EngineConfig, MatchResult};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "soundmark-cli", about = "Audio fingerprint recognition engine")]
struct Cli {
    /// Path to the SQLite-backed index snapshot.
    #[arg(long, default_value = "soundmark-index.sqlite")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enroll a reference track into the index.
    Enroll {
        /// Human-readable track name.
        #[arg(long)]
        name: String,
        /// Audio file to decode and fingerprint.
        file: PathBuf,
    },
    /// Identify an audio clip against the index.
    Recognize {
        /// Audio file to decode and fingerprint.
        file: PathBuf,
    },
    /// List every track currently in the index.
    List,
    /// Report track and fingerprint counts.
    Stats,
}

/// Restores the index through the same [`EngineError`] conversion the
/// library exposes for persistence failures, so a corrupt snapshot and a
/// corrupt in-memory index are reported identically.
fn load_engine(db: &Path, config: EngineConfig) -> Result<Engine, String> {
    if db.exists() {
        let index = soundmark::persistence::restore_from_path(db)
            .map_err(soundmark::EngineError::from)
            .map_err(|e| format!("failed to restore index from {:?}: {}", db, e))?;
        Engine::with_index(config, index).map_err(|e| e.to_string())
    } else {
        Engine::new(config).map_err(|e| e.to_string())
    }
}

fn save_engine(engine: &Engine, db: &Path) -> Result<(), String> {
    soundmark::persistence::snapshot_to_path(engine.index(), db)
        .map_err(soundmark::EngineError::from)
        .map_err(|e| format!("failed to snapshot index to {:?}: {}", db, e))
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let config = EngineConfig::default();
    let engine = load_engine(&cli.db, config.clone())?;

    match cli.command {
        Command::Enroll { name, file } => {
            let samples = soundmark::audio_loader::load_audio_file(&file, config.sample_rate)?;
            let outcome = engine
                .ingest(&name, &samples, config.sample_rate)
                .map_err(|e| e.to_string())?;
            info!(
                "enrolled '{}' as track {:?} ({} fingerprints)",
                name, outcome.track_id, outcome.fingerprints_count
            );
            println!(
                "enrolled '{}' -> track_id={:?}, fingerprints={}",
                name, outcome.track_id, outcome.fingerprints_count
            );
            save_engine(&engine, &cli.db)?;
        }
        Command::Recognize { file } => {
            let samples = soundmark::audio_loader::load_audio_file(&file, config.sample_rate)?;
            let result = engine
                .recognize(&samples, config.sample_rate)
                .map_err(|e| e.to_string())?;
            match result {
                MatchResult::Matched {
                    track_name,
                    offset_seconds,
                    score,
                    confidence,
                    ..
                } => {
                    println!(
                        "matched '{}' at {} (score={}, confidence={})",
                        track_name,
                        format_offset_mmss(offset_seconds),
                        score,
                        confidence.as_str()
                    );
                }
                MatchResult::NoMatch { score, message } => {
                    println!("no match (score={}): {}", score, message);
                }
            }
        }
        Command::List => {
            for track in engine.list_tracks() {
                println!(
                    "{:?}\t{}\t{} fingerprints\t{}",
                    track.track_id,
                    track.name,
                    track.fingerprints_count,
                    track
                        .duration_seconds
                        .map(|d| format!("{:.1}s", d))
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
        Command::Stats => {
            let stats = engine.stats();
            println!(
                "tracks={} hashes={}",
                stats.track_count, stats.hash_count
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
