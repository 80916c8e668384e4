//! Spectral front-end: turns a mono PCM buffer into a dB-scale spectrogram.
//!
//! Uses a Hann-windowed STFT with centered framing (reflection padding at
//! the edges), matching the teacher's FFT plumbing (`rustfft`) but adding
//! the centering, dB conversion and per-grid normalization the recognition
//! engine needs for stable, comparable frame units between ingest and
//! query.

use crate::config::EngineConfig;
use crate::error::EngineError;
use log::{debug, trace};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use std::f32::consts::PI;

const DB_FLOOR_EPS: f32 = 1e-10;

/// A dB-scale spectrogram: `bins[f][t]`, normalized so the grid's maximum
/// cell is 0 dB.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// `grid[f][t]` in dB, `f` in `0..freq_bins`, `t` in `0..frames`.
    pub grid: Vec<Vec<f32>>,
    pub freq_bins: usize,
    pub frames: usize,
}

impl Spectrogram {
    pub fn get(&self, f: usize, t: usize) -> f32 {
        self.grid[f][t]
    }
}

fn hann_window(window_size: usize) -> Vec<f32> {
    let mut window = Vec::with_capacity(window_size);
    if window_size == 0 {
        return window;
    }
    if window_size == 1 {
        window.push(1.0);
        return window;
    }
    for i in 0..window_size {
        window.push(0.5 * (1.0 - (2.0 * PI * i as f32 / (window_size - 1) as f32).cos()));
    }
    window
}

/// Reflect-pad `samples` by `pad` on each side (no edge repeat), so a frame
/// centered on sample 0 and a frame centered on the last sample both have a
/// full window's worth of data.
fn reflect_pad(samples: &[f32], pad: usize) -> Vec<f32> {
    let len = samples.len();
    let mut out = Vec::with_capacity(len + 2 * pad);
    for i in 0..pad {
        let idx = (pad - i).min(len.saturating_sub(1));
        out.push(samples[idx]);
    }
    out.extend_from_slice(samples);
    for i in 0..pad {
        let idx = len.saturating_sub(2).saturating_sub(i);
        out.push(*samples.get(idx).unwrap_or(&0.0));
    }
    out
}

/// `spectrogram(samples, sr) -> grid[F][T]` in dB, per §4.1.
///
/// Fails with [`EngineError::InvalidInput`] if `sr` does not match the
/// configured sample rate or the buffer is shorter than one frame.
pub fn spectrogram(
    samples: &[f32],
    sr: u32,
    config: &EngineConfig,
) -> Result<Spectrogram, EngineError> {
    if sr != config.sample_rate {
        return Err(EngineError::InvalidInput(format!(
            "sample rate {} does not match configured rate {}",
            sr, config.sample_rate
        )));
    }
    if samples.is_empty() {
        return Err(EngineError::InvalidInput(
            "no samples to analyze".to_string(),
        ));
    }

    let n_fft = config.n_fft;
    let hop = config.hop();
    let pad = n_fft / 2;
    let padded = reflect_pad(samples, pad);

    if padded.len() < n_fft {
        return Err(EngineError::InvalidInput(
            "fewer samples than one analysis frame".to_string(),
        ));
    }

    // Frame t is centered on original sample t*hop, i.e. starts at
    // (t*hop + pad) - pad = t*hop in the padded buffer.
    let num_frames = (padded.len() - n_fft) / hop + 1;
    let num_bins = n_fft / 2 + 1;

    debug!(
        "spectrogram: {} samples ({} padded), n_fft={}, hop={}, frames={}",
        samples.len(),
        padded.len(),
        n_fft,
        hop,
        num_frames
    );

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let window_values = hann_window(n_fft);

    let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); n_fft];
    let mut raw: Vec<Vec<f32>> = vec![Vec::with_capacity(num_frames); num_bins];
    let mut global_max_db = f32::NEG_INFINITY;

    for t in 0..num_frames {
        let start = t * hop;
        let chunk = &padded[start..start + n_fft];
        for (j, sample) in chunk.iter().enumerate() {
            buffer[j] = Complex::new(*sample * window_values[j], 0.0);
        }
        fft.process(&mut buffer);

        for f in 0..num_bins {
            let magnitude = buffer[f].norm();
            let db = 20.0 * magnitude.max(DB_FLOOR_EPS).log10();
            if db > global_max_db {
                global_max_db = db;
            }
            raw[f].push(db);
        }
        trace!("spectrogram: frame {} processed", t);
    }

    for row in raw.iter_mut() {
        for cell in row.iter_mut() {
            *cell -= global_max_db;
        }
    }

    Ok(Spectrogram {
        grid: raw,
        freq_bins: num_bins,
        frames: num_frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sr: u32, duration_s: f32) -> Vec<f32> {
        let n = (sr as f32 * duration_s) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn rejects_sample_rate_mismatch() {
        let config = EngineConfig::default();
        let samples = sine(440.0, 22_050, 1.0);
        let err = spectrogram(&samples, 22_050, &config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_input() {
        let config = EngineConfig::default();
        let err = spectrogram(&[], config.sample_rate, &config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn normalizes_max_to_zero_db() {
        let config = EngineConfig::default();
        let samples = sine(440.0, config.sample_rate, 1.0);
        let spec = spectrogram(&samples, config.sample_rate, &config).unwrap();
        let max = spec
            .grid
            .iter()
            .flat_map(|row| row.iter())
            .cloned()
            .fold(f32::NEG_INFINITY, f32::max);
        assert!((max - 0.0).abs() < 1e-4);
    }

    #[test]
    fn deterministic() {
        let config = EngineConfig::default();
        let samples = sine(440.0, config.sample_rate, 0.5);
        let a = spectrogram(&samples, config.sample_rate, &config).unwrap();
        let b = spectrogram(&samples, config.sample_rate, &config).unwrap();
        assert_eq!(a.grid, b.grid);
    }

    #[test]
    fn first_frame_centered_near_sample_zero() {
        // With centered framing and reflection padding, frame 0 should be
        // well-defined (no panics) even though it nominally "starts" before
        // sample 0.
        let config = EngineConfig::default();
        let samples = sine(1000.0, config.sample_rate, 0.1);
        let spec = spectrogram(&samples, config.sample_rate, &config).unwrap();
        assert!(spec.frames > 0);
        assert_eq!(spec.freq_bins, config.freq_bins());
    }
}
