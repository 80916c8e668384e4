//! Persistence collaborator: serializes a [`FingerprintIndex`] to and from
//! a SQLite file.
//!
//! The engine defines no on-disk format of its own (§6) — this module is
//! an external collaborator the engine never calls itself. It is grounded
//! in the teacher's own choice of `rusqlite`, with the same two tables the
//! teacher's original `database.rs` defined, repurposed as a snapshot
//! target rather than as the live, queried index.

use crate::error::PersistenceError;
use crate::fingerprint::{HASH_DT_BITS, HASH_FREQ_BITS};
use crate::index::{FingerprintIndex, Posting, TrackId, TrackMeta};
use log::{debug, info};
use rusqlite::{Connection, OpenFlags, params};
use std::path::Path;

fn open(path: &Path, create: bool) -> Result<Connection, PersistenceError> {
    let flags = if create {
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE
    };
    let conn = Connection::open_with_flags(path, flags)?;
    conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<(), PersistenceError> {
    conn.execute_batch(
        "BEGIN;
         CREATE TABLE IF NOT EXISTS tracks (
             track_id INTEGER PRIMARY KEY,
             name TEXT NOT NULL,
             fingerprints_count INTEGER NOT NULL,
             duration_seconds REAL
         );
         CREATE TABLE IF NOT EXISTS fingerprints (
             hash INTEGER NOT NULL,
             track_id INTEGER NOT NULL,
             anchor_frame INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_fingerprints_hash ON fingerprints (hash);
         COMMIT;",
    )?;
    Ok(())
}

/// Snapshot `index` into the SQLite file at `path`, creating or replacing
/// its contents.
pub fn snapshot_to_path(index: &FingerprintIndex, path: &Path) -> Result<(), PersistenceError> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let mut conn = open(path, true)?;
    init_schema(&conn)?;

    let (tracks, entries) = index.snapshot_entries();
    let tx = conn.transaction()?;
    {
        let mut track_stmt = tx.prepare(
            "INSERT INTO tracks (track_id, name, fingerprints_count, duration_seconds) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (i, meta) in tracks.iter().enumerate() {
            track_stmt.execute(params![
                i as i64,
                meta.name,
                meta.fingerprints_count as i64,
                meta.duration_seconds
            ])?;
        }

        let mut fp_stmt = tx.prepare(
            "INSERT INTO fingerprints (hash, track_id, anchor_frame) VALUES (?1, ?2, ?3)",
        )?;
        for (key, posting) in &entries {
            fp_stmt.execute(params![
                *key as i64,
                posting.track_id.0 as i64,
                posting.anchor_frame as i64
            ])?;
        }
    }
    tx.commit()?;
    info!(
        "persistence: snapshotted {} tracks, {} fingerprints to {:?}",
        tracks.len(),
        entries.len(),
        path
    );
    Ok(())
}

/// Restore a [`FingerprintIndex`] from a SQLite file written by
/// [`snapshot_to_path`]. Returns [`PersistenceError::Corrupt`] if any
/// stored fingerprint's packed hash key can't have come from a valid
/// `(f1, f2, dt)` triple under this build's bit budget.
pub fn restore_from_path(path: &Path) -> Result<FingerprintIndex, PersistenceError> {
    let conn = open(path, false)?;

    let mut track_stmt =
        conn.prepare("SELECT track_id, name, fingerprints_count, duration_seconds FROM tracks ORDER BY track_id")?;
    let mut tracks: Vec<TrackMeta> = Vec::new();
    let rows = track_stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, Option<f64>>(3)?,
        ))
    })?;
    for (expected_idx, row) in rows.enumerate() {
        let (track_id, name, fingerprints_count, duration_seconds) = row?;
        if track_id != expected_idx as i64 {
            return Err(PersistenceError::Corrupt(format!(
                "non-contiguous track_id {} at position {}",
                track_id, expected_idx
            )));
        }
        tracks.push(TrackMeta {
            name,
            fingerprints_count: fingerprints_count as usize,
            duration_seconds,
        });
    }

    let max_freq = 1u64 << HASH_FREQ_BITS;
    let max_dt = 1u64 << HASH_DT_BITS;
    let max_hash = (max_freq * max_freq * max_dt) as i64;

    let mut fp_stmt = conn.prepare("SELECT hash, track_id, anchor_frame FROM fingerprints")?;
    let mut entries = Vec::new();
    let rows = fp_stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;
    for row in rows {
        let (hash, track_id, anchor_frame) = row?;
        if hash < 0 || hash >= max_hash {
            return Err(PersistenceError::Corrupt(format!(
                "hash {} outside valid packed range",
                hash
            )));
        }
        if track_id < 0 || track_id as usize >= tracks.len() {
            return Err(PersistenceError::Corrupt(format!(
                "posting references unknown track_id {}",
                track_id
            )));
        }
        entries.push((
            hash as u32,
            Posting {
                track_id: TrackId(track_id as u32),
                anchor_frame: anchor_frame as u32,
            },
        ));
    }

    debug!(
        "persistence: restored {} tracks, {} fingerprints from {:?}",
        tracks.len(),
        entries.len(),
        path
    );
    Ok(FingerprintIndex::from_entries(tracks, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use tempfile::tempdir;

    fn fp(f1: u32, f2: u32, dt: u32, anchor: u32) -> Fingerprint {
        Fingerprint {
            f1,
            f2,
            dt,
            anchor_frame: anchor,
        }
    }

    #[test]
    fn round_trip_preserves_postings_and_track_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.sqlite");

        let index = FingerprintIndex::new();
        index.insert_track("first".into(), &[fp(1, 2, 3, 0), fp(4, 5, 6, 10)], Some(5.0));
        index.insert_track("second".into(), &[fp(7, 8, 9, 0)], None);

        snapshot_to_path(&index, &path).unwrap();
        let restored = restore_from_path(&path).unwrap();

        assert_eq!(index.stats(), restored.stats());
        let original_tracks: Vec<_> = index.tracks().into_iter().map(|(_, m)| m.name).collect();
        let restored_tracks: Vec<_> = restored.tracks().into_iter().map(|(_, m)| m.name).collect();
        assert_eq!(original_tracks, restored_tracks);

        let key = fp(1, 2, 3, 0).hash_key();
        assert_eq!(index.probe(key).len(), restored.probe(key).len());
    }

    #[test]
    fn rejects_dangling_track_reference() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.sqlite");
        let conn = open(&path, true).unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO fingerprints (hash, track_id, anchor_frame) VALUES (1, 99, 0)",
            [],
        )
        .unwrap();
        drop(conn);

        let err = restore_from_path(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt(_)));
    }
}
