//! Engine configuration
//!
//! Every fixed analysis parameter lives here rather than in module-level
//! constants, so tests and batch runs can override any of them per call.
//! Both structs deserialize with `#[serde(default)]`: a JSON file only needs
//! the fields it changes.

use crate::analysis::spectrum::WindowFunction;
use crate::types::{FingerprintError, FingerprintResult};
use serde::{Deserialize, Serialize};

/// Pass/fail limits used to grade a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    /// CNR good-gate (dB); below this the record is `LOW_CONFIDENCE`
    pub cnr_min_db: f64,
    /// CNR at or above which the carrier is graded excellent (dB)
    pub cnr_excellent_db: f64,
    /// Minimum plausible 3 dB bandwidth (Hz)
    pub bandwidth_min_hz: f64,
    /// Maximum plausible 3 dB bandwidth (Hz)
    pub bandwidth_max_hz: f64,
    /// Minimum adjacent-channel rejection (dB)
    pub adjacent_min_db: f64,
    /// Rolloff asymmetry must stay below this ratio
    pub asymmetry_max: f64,
    /// Largest peak deviation from the station median (Hz)
    pub max_drift_hz: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            cnr_min_db: 18.0,
            cnr_excellent_db: 25.0,
            bandwidth_min_hz: 150e3,
            bandwidth_max_hz: 250e3,
            adjacent_min_db: 15.0,
            asymmetry_max: 2.5,
            max_drift_hz: 1000.0,
        }
    }
}

/// Fingerprint engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Welch segment length (FFT size)
    pub segment_len: usize,
    /// Fraction of each segment shared with the next
    pub overlap_fraction: f64,
    /// Taper applied to each segment
    pub window: WindowFunction,
    /// Added to power before taking logs
    pub log_floor: f64,
    /// Bins within this distance of the peak are excluded from the noise floor
    pub guard_half_width_hz: f64,
    /// Fraction of out-of-guard bins averaged for the noise floor
    pub noise_keep_fraction: f64,
    /// Fewer out-of-guard bins than this is a degenerate noise floor
    pub min_noise_bins: usize,
    /// Half-width of the carrier integration window
    pub carrier_half_width_hz: f64,
    /// How far either side of the peak to look for the half-power crossing
    pub bandwidth_search_hz: f64,
    /// Adjacent-channel centre offset from the tuned frequency
    pub adjacent_offset_hz: f64,
    /// Half-width of each adjacent-channel window
    pub adjacent_half_width_hz: f64,
    /// Inner edge of the rolloff regression span
    pub rolloff_inner_hz: f64,
    /// Outer edge of the rolloff regression span
    pub rolloff_outer_hz: f64,
    /// Slopes shallower than this (dB per 100 kHz) count as flat
    pub flat_slope_db_per_100khz: f64,
    /// Grading limits
    pub thresholds: ValidationThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            segment_len: 4096,
            overlap_fraction: 0.5,
            window: WindowFunction::Hann,
            log_floor: 1e-30,
            guard_half_width_hz: 150e3,
            noise_keep_fraction: 0.05,
            min_noise_bins: 8,
            carrier_half_width_hz: 50e3,
            bandwidth_search_hz: 500e3,
            adjacent_offset_hz: 200e3,
            adjacent_half_width_hz: 50e3,
            rolloff_inner_hz: 100e3,
            rolloff_outer_hz: 150e3,
            flat_slope_db_per_100khz: 0.5,
            thresholds: ValidationThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Same configuration with a different segment length
    pub fn with_segment_len(mut self, segment_len: usize) -> Self {
        self.segment_len = segment_len;
        self
    }

    /// Same configuration with a different window
    pub fn with_window(mut self, window: WindowFunction) -> Self {
        self.window = window;
        self
    }

    /// Same configuration with different grading limits
    pub fn with_thresholds(mut self, thresholds: ValidationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Check parameter ranges
    pub fn validate(&self) -> FingerprintResult<()> {
        if self.segment_len < 16 || self.segment_len % 2 != 0 {
            return Err(invalid(format!(
                "segment_len must be even and at least 16, got {}",
                self.segment_len
            )));
        }
        if !(0.0..1.0).contains(&self.overlap_fraction) {
            return Err(invalid(format!(
                "overlap_fraction must be in [0, 1), got {}",
                self.overlap_fraction
            )));
        }
        if !(self.noise_keep_fraction > 0.0 && self.noise_keep_fraction <= 1.0) {
            return Err(invalid(format!(
                "noise_keep_fraction must be in (0, 1], got {}",
                self.noise_keep_fraction
            )));
        }
        if !(self.log_floor > 0.0 && self.log_floor.is_finite()) {
            return Err(invalid(format!("log_floor must be positive, got {}", self.log_floor)));
        }

        let widths = [
            ("guard_half_width_hz", self.guard_half_width_hz),
            ("carrier_half_width_hz", self.carrier_half_width_hz),
            ("bandwidth_search_hz", self.bandwidth_search_hz),
            ("adjacent_offset_hz", self.adjacent_offset_hz),
            ("adjacent_half_width_hz", self.adjacent_half_width_hz),
            ("rolloff_inner_hz", self.rolloff_inner_hz),
            ("rolloff_outer_hz", self.rolloff_outer_hz),
        ];
        for (name, value) in widths {
            if !(value > 0.0 && value.is_finite()) {
                return Err(invalid(format!("{} must be positive, got {}", name, value)));
            }
        }

        if self.rolloff_inner_hz >= self.rolloff_outer_hz {
            return Err(invalid(format!(
                "rolloff span is empty: inner {} Hz >= outer {} Hz",
                self.rolloff_inner_hz, self.rolloff_outer_hz
            )));
        }
        if self.flat_slope_db_per_100khz < 0.0 {
            return Err(invalid("flat_slope_db_per_100khz must not be negative".to_string()));
        }

        let t = &self.thresholds;
        if t.bandwidth_min_hz > t.bandwidth_max_hz {
            return Err(invalid(format!(
                "bandwidth_min_hz {} exceeds bandwidth_max_hz {}",
                t.bandwidth_min_hz, t.bandwidth_max_hz
            )));
        }
        if t.cnr_min_db > t.cnr_excellent_db {
            return Err(invalid(format!(
                "cnr_min_db {} exceeds cnr_excellent_db {}",
                t.cnr_min_db, t.cnr_excellent_db
            )));
        }
        if t.asymmetry_max < 1.0 {
            return Err(invalid(format!(
                "asymmetry_max must be at least 1.0, got {}",
                t.asymmetry_max
            )));
        }
        if t.max_drift_hz < 0.0 {
            return Err(invalid("max_drift_hz must not be negative".to_string()));
        }

        Ok(())
    }
}

fn invalid(message: String) -> FingerprintError {
    FingerprintError::InvalidConfig(message)
}
