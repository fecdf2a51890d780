//! Noise Floor Estimation (Minimum Power Averaging)
//!
//! Bins inside a guard band around the carrier are excluded, the rest are
//! sorted by power and only the quietest fraction is averaged. Spurs and
//! adjacent channels sit in the discarded upper part of the distribution.

use crate::analysis::peaks::PeakEstimate;
use crate::analysis::spectrum::PowerSpectralDensity;
use crate::config::EngineConfig;
use crate::quality::{QualityFlag, QualityFlags};
use tracing::trace;

/// Estimated noise floor
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseFloor {
    /// Noise density (power/Hz); zero when degenerate
    pub density: f64,
    /// Bins outside the guard band
    pub candidate_bins: usize,
    /// Quietest bins actually averaged
    pub bins_used: usize,
    pub flags: QualityFlags,
}

impl NoiseFloor {
    pub fn is_degenerate(&self) -> bool {
        self.flags.contains(QualityFlag::DegenerateNoiseFloor)
    }
}

/// MPA noise floor estimator
#[derive(Debug, Clone, Copy)]
pub struct NoiseFloorEstimator {
    guard_half_width_hz: f64,
    keep_fraction: f64,
    min_bins: usize,
}

impl Default for NoiseFloorEstimator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl NoiseFloorEstimator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            guard_half_width_hz: config.guard_half_width_hz,
            keep_fraction: config.noise_keep_fraction,
            min_bins: config.min_noise_bins,
        }
    }

    /// Set the guard half-width around the peak
    pub fn with_guard(mut self, guard_half_width_hz: f64) -> Self {
        self.guard_half_width_hz = guard_half_width_hz;
        self
    }

    /// Set the fraction of quietest bins to average
    pub fn with_keep_fraction(mut self, keep_fraction: f64) -> Self {
        self.keep_fraction = keep_fraction;
        self
    }

    pub fn estimate(&self, psd: &PowerSpectralDensity, peak: &PeakEstimate) -> NoiseFloor {
        let guard = psd.bins_within(self.guard_half_width_hz);

        let mut candidates: Vec<f64> = psd
            .power()
            .iter()
            .enumerate()
            .filter(|(i, _)| i.abs_diff(peak.bin) > guard)
            .map(|(_, &p)| p)
            .collect();
        let candidate_bins = candidates.len();

        let mut flags = QualityFlags::new();
        if candidate_bins < self.min_bins {
            flags.insert(QualityFlag::DegenerateNoiseFloor);
            return NoiseFloor {
                density: 0.0,
                candidate_bins,
                bins_used: 0,
                flags,
            };
        }

        candidates.sort_by(f64::total_cmp);
        let keep = ((candidate_bins as f64 * self.keep_fraction).floor() as usize)
            .clamp(1, candidate_bins);
        let mut density = candidates[..keep].iter().sum::<f64>() / keep as f64;

        if !(density > 0.0) {
            flags.insert(QualityFlag::DegenerateNoiseFloor);
            density = 0.0;
        }

        trace!(guard, candidate_bins, keep, density, "noise floor estimated");

        NoiseFloor {
            density,
            candidate_bins,
            bins_used: keep,
            flags,
        }
    }
}
