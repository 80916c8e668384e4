//! Immutable engine configuration.
//!
//! Replaces the "global configuration singleton" the teacher's original
//! form would have carried: an [`EngineConfig`] is built once and handed to
//! [`crate::Engine::new`]; changing any field means building a new engine
//! (and in practice a fresh index), since frame units are only comparable
//! across ingests and queries that shared the same window/hop.

/// Tunable parameters fixed at engine construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Audio sample rate in Hz. Every `ingest`/`recognize` call must supply
    /// samples at exactly this rate.
    pub sample_rate: u32,
    /// STFT window length.
    pub n_fft: usize,
    /// Hop = `n_fft / hop_ratio`.
    pub hop_ratio: usize,
    /// Peak picker frequency-bin radius.
    pub freq_neighborhood: usize,
    /// Peak picker time-frame radius.
    pub time_neighborhood: usize,
    /// Peak floor in dB, relative to the spectrogram's own maximum.
    pub amplitude_threshold_db: f32,
    /// Frequency partitions the peak picker distributes peaks across.
    pub num_bands: usize,
    /// Maximum targets paired with a single anchor.
    pub fanout: usize,
    /// Minimum `t2 - t1` in frames.
    pub dt_min: u32,
    /// Maximum anchor-to-target span, in seconds.
    pub dt_max_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: 44_100,
            n_fft: 2048,
            hop_ratio: 4,
            freq_neighborhood: 20,
            time_neighborhood: 20,
            amplitude_threshold_db: -35.0,
            num_bands: 6,
            fanout: 10,
            dt_min: 2,
            dt_max_seconds: 2.0,
        }
    }
}

impl EngineConfig {
    /// `HOP = N_FFT / HOP_RATIO`.
    pub fn hop(&self) -> usize {
        self.n_fft / self.hop_ratio
    }

    /// `F = N_FFT/2 + 1` frequency bins.
    pub fn freq_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// `DT_MAX_FRAMES = floor(dt_max_seconds * SR / HOP)`.
    pub fn dt_max_frames(&self) -> u32 {
        ((self.dt_max_seconds * self.sample_rate as f64) / self.hop() as f64).floor() as u32
    }

    /// Frame-count to seconds, using this config's hop/sample rate.
    pub fn frames_to_seconds(&self, frames: i64) -> f64 {
        (frames as f64 * self.hop() as f64) / self.sample_rate as f64
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.n_fft == 0 || self.n_fft % 2 != 0 {
            return Err("n_fft must be a nonzero even number".into());
        }
        if self.hop_ratio == 0 {
            return Err("hop_ratio must be nonzero".into());
        }
        if self.num_bands == 0 {
            return Err("num_bands must be nonzero".into());
        }
        if self.fanout == 0 {
            return Err("fanout must be nonzero".into());
        }
        // Hash key packing reserves 11 bits per frequency bin (0..2048) and
        // 8 bits for dt (0..256); both bounds must hold for every value the
        // configuration can produce.
        if self.freq_bins() > 2048 {
            return Err("n_fft too large: frequency bins must fit in 11 bits".into());
        }
        if self.dt_max_frames() >= 256 {
            return Err("dt_max_seconds too large: dt must fit in 8 bits".into());
        }
        Ok(())
    }
}
