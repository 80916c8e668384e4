//! Peak picker: selects sparse, locally dominant points in a spectrogram,
//! distributed across frequency bands ("constellation map" points).

use crate::config::EngineConfig;
use crate::spectrogram::Spectrogram;
use log::debug;

/// A constellation point: frequency bin, time frame, and dB amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub freq_bin: usize,
    pub time_frame: usize,
    pub amplitude_db: f32,
}

/// Partition `[0, freq_bins)` into `num_bands` contiguous, roughly
/// equal-width bands.
fn band_ranges(freq_bins: usize, num_bands: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::with_capacity(num_bands);
    let base = freq_bins / num_bands;
    let remainder = freq_bins % num_bands;
    let mut start = 0;
    for band in 0..num_bands {
        let width = base + if band < remainder { 1 } else { 0 };
        let end = (start + width).min(freq_bins);
        if start < end {
            ranges.push((start, end));
        }
        start = end;
    }
    ranges
}

fn is_local_max(
    grid: &Spectrogram,
    f: usize,
    t: usize,
    band: (usize, usize),
    config: &EngineConfig,
) -> bool {
    let value = grid.get(f, t);
    let t_start = t.saturating_sub(config.time_neighborhood);
    let t_end = (t + config.time_neighborhood + 1).min(grid.frames);
    let f_start = f
        .saturating_sub(config.freq_neighborhood)
        .max(band.0);
    let f_end = (f + config.freq_neighborhood + 1).min(band.1);

    for nt in t_start..t_end {
        for nf in f_start..f_end {
            if nt == t && nf == f {
                continue;
            }
            if grid.get(nf, nt) > value {
                return false;
            }
        }
    }
    true
}

/// `peaks(grid) -> set<Peak>`, banded local-max picking per §4.2.
///
/// Peaks are returned sorted by `(time_frame, freq_bin)` ascending — the
/// canonical order the fingerprint generator relies on.
pub fn peaks(grid: &Spectrogram, config: &EngineConfig) -> Vec<Peak> {
    if grid.frames == 0 || grid.freq_bins == 0 {
        debug!("peaks: empty spectrogram, returning no peaks");
        return Vec::new();
    }

    let bands = band_ranges(grid.freq_bins, config.num_bands);
    let mut found = Vec::new();

    for band in bands {
        for f in band.0..band.1 {
            for t in 0..grid.frames {
                let value = grid.get(f, t);
                if value < config.amplitude_threshold_db {
                    continue;
                }
                if is_local_max(grid, f, t, band, config) {
                    found.push(Peak {
                        freq_bin: f,
                        time_frame: t,
                        amplitude_db: value,
                    });
                }
            }
        }
    }

    found.sort_by(|a, b| {
        a.time_frame
            .cmp(&b.time_frame)
            .then(a.freq_bin.cmp(&b.freq_bin))
    });
    debug!("peaks: found {} peaks across {} bands", found.len(), config.num_bands);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn flat_grid(freq_bins: usize, frames: usize, value: f32) -> Spectrogram {
        Spectrogram {
            grid: vec![vec![value; frames]; freq_bins],
            freq_bins,
            frames,
        }
    }

    #[test]
    fn empty_spectrogram_yields_no_peaks() {
        let config = EngineConfig::default();
        let grid = Spectrogram { grid: vec![], freq_bins: 0, frames: 0 };
        assert!(peaks(&grid, &config).is_empty());
    }

    #[test]
    fn below_threshold_cells_are_never_peaks() {
        let config = EngineConfig::default();
        let grid = flat_grid(50, 50, -100.0);
        assert!(peaks(&grid, &config).is_empty());
    }

    #[test]
    fn single_spike_is_a_peak() {
        let config = EngineConfig {
            freq_neighborhood: 2,
            time_neighborhood: 2,
            amplitude_threshold_db: -50.0,
            num_bands: 1,
            ..EngineConfig::default()
        };
        let mut grid = flat_grid(10, 10, -60.0);
        grid.grid[5][5] = 0.0;
        let found = peaks(&grid, &config);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].freq_bin, 5);
        assert_eq!(found[0].time_frame, 5);
    }

    #[test]
    fn peaks_are_canonically_sorted_by_time_then_freq() {
        let config = EngineConfig {
            freq_neighborhood: 1,
            time_neighborhood: 1,
            amplitude_threshold_db: -50.0,
            num_bands: 1,
            ..EngineConfig::default()
        };
        let mut grid = flat_grid(20, 20, -60.0);
        grid.grid[10][3] = 0.0;
        grid.grid[2][3] = 0.0;
        grid.grid[5][1] = 0.0;
        let found = peaks(&grid, &config);
        let times: Vec<_> = found.iter().map(|p| p.time_frame).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }

    #[test]
    fn amplitude_respects_band_boundaries() {
        // Two bands; a peak in band 0 must not be suppressed by a larger
        // value living in band 1's neighborhood bleed-through.
        let config = EngineConfig {
            freq_neighborhood: 50,
            time_neighborhood: 2,
            amplitude_threshold_db: -50.0,
            num_bands: 2,
            ..EngineConfig::default()
        };
        let mut grid = flat_grid(20, 10, -60.0);
        grid.grid[8][5] = -10.0; // band 0 (0..10)
        grid.grid[15][5] = 0.0; // band 1 (10..20), larger
        let found = peaks(&grid, &config);
        assert!(found.iter().any(|p| p.freq_bin == 8));
        assert!(found.iter().any(|p| p.freq_bin == 15));
    }
}
