//! End-to-end recognition scenarios, mirroring the concrete scenarios in
//! the engine's testable-properties contract: self-match, wrong-track,
//! unknown-query, empty-query, multi-track, and cross-index determinism.

use soundmark::{Engine, EngineConfig, MatchResult};
use std::f32::consts::PI;

fn chirp(start_hz: f32, end_hz: f32, sr: u32, duration_s: f32) -> Vec<f32> {
    let n = (sr as f32 * duration_s) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / sr as f32;
            let freq = start_hz + (end_hz - start_hz) * (t / duration_s);
            (2.0 * PI * freq * t).sin()
        })
        .collect()
}

fn tone_mixture(freqs: &[f32], sr: u32, duration_s: f32, seed: u32) -> Vec<f32> {
    // Deterministic pseudo-noise-like mixture: several unrelated tones plus
    // a cheap linear-congruential "noise" term, seeded so distinct calls
    // with distinct seeds are statistically independent of one another.
    let n = (sr as f32 * duration_s) as usize;
    let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
    (0..n)
        .map(|i| {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            let noise = (state >> 8) as f32 / (1u32 << 24) as f32 - 0.5;
            let tones: f32 = freqs
                .iter()
                .map(|f| (2.0 * PI * f * i as f32 / sr as f32).sin())
                .sum();
            (tones / freqs.len() as f32) * 0.7 + noise * 0.3
        })
        .collect()
}

#[test]
fn self_match_on_a_chirp() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let sr = engine.config().sample_rate;
    let track = chirp(200.0, 4000.0, sr, 120.0);
    engine.ingest("chirp", &track, sr).unwrap();

    let slice = &track[(30.0 * sr as f32) as usize..(36.0 * sr as f32) as usize];
    let result = engine.recognize(slice, sr).unwrap();

    let MatchResult::Matched {
        track_name,
        offset_seconds,
        confidence,
        ..
    } = result
    else {
        panic!("expected a match");
    };
    assert_eq!(track_name, "chirp");
    assert!((offset_seconds - 30.0).abs() < 0.2);
    assert!(confidence >= soundmark::Confidence::Medium);
}

#[test]
fn wrong_track_still_resolves_to_correct_track() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let sr = engine.config().sample_rate;

    let a = tone_mixture(&[150.0, 350.0, 900.0], sr, 60.0, 1);
    let b = tone_mixture(&[500.0, 1200.0, 2500.0], sr, 60.0, 2);
    engine.ingest("A", &a, sr).unwrap();
    engine.ingest("B", &b, sr).unwrap();

    let slice = &b[(10.0 * sr as f32) as usize..(16.0 * sr as f32) as usize];
    let result = engine.recognize(slice, sr).unwrap();
    match result {
        MatchResult::Matched { track_name, .. } => assert_eq!(track_name, "B"),
        MatchResult::NoMatch { score, .. } => panic!("expected B to match, got NoMatch({})", score),
    }
}

#[test]
fn unknown_query_against_a_single_ingested_track_is_nomatch() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let sr = engine.config().sample_rate;

    let a = tone_mixture(&[120.0, 330.0, 810.0], sr, 60.0, 10);
    engine.ingest("A", &a, sr).unwrap();

    let independent = tone_mixture(&[4321.0, 1777.0, 999.0], sr, 6.0, 99);
    let result = engine.recognize(&independent, sr).unwrap();
    assert!(!result.matched());
    assert!(result.raw_score() < 200);
}

#[test]
fn empty_query_buffer_is_invalid_input() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let sr = engine.config().sample_rate;
    let err = engine.recognize(&[], sr).unwrap_err();
    assert!(matches!(err, soundmark::EngineError::InvalidInput(_)));
}

#[test]
fn three_distinct_tracks_each_resolve_correctly() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let sr = engine.config().sample_rate;

    let tracks: Vec<(&str, Vec<f32>)> = vec![
        ("alpha", tone_mixture(&[180.0, 420.0], sr, 60.0, 100)),
        ("beta", tone_mixture(&[610.0, 1430.0], sr, 60.0, 200)),
        ("gamma", chirp(150.0, 3500.0, sr, 60.0)),
    ];
    for (name, samples) in &tracks {
        engine.ingest(name, samples, sr).unwrap();
    }

    for (name, samples) in &tracks {
        let slice = &samples[(10.0 * sr as f32) as usize..(16.0 * sr as f32) as usize];
        let result = engine.recognize(slice, sr).unwrap();
        match result {
            MatchResult::Matched {
                track_name, score, ..
            } => {
                assert_eq!(&track_name, name);
                assert!(score >= 1000, "{} scored only {}", name, score);
            }
            MatchResult::NoMatch { score, .. } => {
                panic!("expected {} to match, got NoMatch({})", name, score)
            }
        }
    }
}

#[test]
fn ingesting_the_same_audio_twice_is_deterministic() {
    let sr = EngineConfig::default().sample_rate;
    let samples = chirp(250.0, 1800.0, sr, 12.0);

    let e1 = Engine::new(EngineConfig::default()).unwrap();
    let e2 = Engine::new(EngineConfig::default()).unwrap();
    e1.ingest("t", &samples, sr).unwrap();
    e2.ingest("t", &samples, sr).unwrap();

    assert_eq!(e1.stats().hash_count, e2.stats().hash_count);
    assert_eq!(e1.stats().track_count, e2.stats().track_count);
}
