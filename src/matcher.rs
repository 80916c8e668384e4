//! Matcher: aligns a query's fingerprints against the index via offset
//! histogram voting and returns the best `(track, offset, score)`.

use crate::config::EngineConfig;
use crate::fingerprint::Fingerprint;
use crate::index::{FingerprintIndex, TrackId};
use log::debug;
use std::collections::HashMap;

/// Confidence tier derived from the winning bin's vote count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    NoMatch,
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_score(score: usize) -> Confidence {
        if score >= 3000 {
            Confidence::High
        } else if score >= 1000 {
            Confidence::Medium
        } else if score >= 200 {
            Confidence::Low
        } else {
            Confidence::NoMatch
        }
    }

    /// The four tier strings rendered at the external boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::NoMatch => "NoMatch",
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        }
    }
}

/// The outcome of `recognize`, modeled as a tagged variant rather than a
/// dynamically-typed result payload (§9 re-architecture note).
#[derive(Debug, Clone)]
pub enum MatchResult {
    Matched {
        track_id: TrackId,
        track_name: String,
        /// Signed frame offset of the query's start within the track.
        offset_frames: i64,
        /// `offset_frames * HOP / SR`; may be negative (§4.5 edge case).
        offset_seconds: f64,
        score: usize,
        confidence: Confidence,
    },
    NoMatch {
        score: usize,
        message: String,
    },
}

impl MatchResult {
    pub fn matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    pub fn raw_score(&self) -> usize {
        match self {
            MatchResult::Matched { score, .. } => *score,
            MatchResult::NoMatch { score, .. } => *score,
        }
    }
}

/// `recognize(query_fingerprints, index) -> MatchResult`, per §4.5.
///
/// Never fails on data — "no match" is a successful, structured result.
pub fn recognize(
    query_fingerprints: &[Fingerprint],
    index: &FingerprintIndex,
    config: &EngineConfig,
) -> MatchResult {
    if query_fingerprints.is_empty() {
        debug!("recognize: empty query, NoMatch");
        return MatchResult::NoMatch {
            score: 0,
            message: "query produced no fingerprints".to_string(),
        };
    }

    // votes[(track_id, offset)] += 1
    let mut votes: HashMap<(TrackId, i64), usize> = HashMap::new();

    for query_fp in query_fingerprints {
        for posting in index.probe(query_fp.hash_key()) {
            let offset = posting.anchor_frame as i64 - query_fp.anchor_frame as i64;
            *votes.entry((posting.track_id, offset)).or_insert(0) += 1;
        }
    }

    if votes.is_empty() {
        debug!("recognize: no hash keys matched any posting, NoMatch");
        return MatchResult::NoMatch {
            score: 0,
            message: "no matching fingerprints in index".to_string(),
        };
    }

    // Highest vote count wins; ties broken by lexicographic (track_id, offset).
    let ((track_id, offset), &score) = votes
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .expect("votes is non-empty");
    let (track_id, offset) = (*track_id, *offset);

    if score < 200 {
        debug!("recognize: best score {} below NoMatch threshold", score);
        return MatchResult::NoMatch {
            score,
            message: format!("best candidate scored {}, below match threshold", score),
        };
    }

    let track_name = index
        .track_meta(track_id)
        .map(|meta| meta.name)
        .unwrap_or_default();
    let offset_seconds = config.frames_to_seconds(offset);
    let confidence = Confidence::from_score(score);

    debug!(
        "recognize: matched track {:?} offset={} score={} confidence={:?}",
        track_id, offset, score, confidence
    );

    MatchResult::Matched {
        track_id,
        track_name,
        offset_frames: offset,
        offset_seconds,
        score,
        confidence,
    }
}

/// Render `offset_seconds` as `M:SS` (floor to whole seconds), per §4.5 /
/// §9 — this is a boundary (display) concern, not carried on
/// [`MatchResult`] itself. Negative values are clamped to zero.
pub fn format_offset_mmss(offset_seconds: f64) -> String {
    let clamped = offset_seconds.max(0.0);
    let total_seconds = clamped.floor() as u64;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}
