//! Rolloff slope and asymmetry
//!
//! A least-squares line is fitted to dB power against distance from the
//! peak over the same offset span on each side. Slopes are reported as
//! positive numbers for a spectrum that decays away from the carrier, in
//! dB per 100 kHz.

use crate::analysis::peaks::PeakEstimate;
use crate::analysis::spectrum::PowerSpectralDensity;
use crate::config::EngineConfig;
use crate::quality::{Metric, QualityFlag, QualityFlags};
use crate::types::power_to_db;
use tracing::trace;

const SLOPE_UNIT_HZ: f64 = 100e3;

#[derive(Debug, Clone, PartialEq)]
pub struct Rolloff {
    /// Decay below the carrier (dB per 100 kHz)
    pub left_slope: f64,
    /// Decay above the carrier (dB per 100 kHz)
    pub right_slope: f64,
    /// Steeper over shallower slope, at least 1.0
    pub asymmetry: f64,
    pub flags: QualityFlags,
}

#[derive(Debug, Clone, Copy)]
pub struct RolloffAnalyzer {
    inner_hz: f64,
    outer_hz: f64,
    flat_slope: f64,
    log_floor: f64,
}

impl Default for RolloffAnalyzer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl RolloffAnalyzer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            inner_hz: config.rolloff_inner_hz,
            outer_hz: config.rolloff_outer_hz,
            flat_slope: config.flat_slope_db_per_100khz,
            log_floor: config.log_floor,
        }
    }

    /// Set the regression span, as distances from the peak
    pub fn with_span(mut self, inner_hz: f64, outer_hz: f64) -> Self {
        self.inner_hz = inner_hz;
        self.outer_hz = outer_hz;
        self
    }

    pub fn analyze(&self, psd: &PowerSpectralDensity, peak: &PeakEstimate) -> Rolloff {
        let inner = psd.bins_covering(self.inner_hz).max(1);
        let outer = psd.bins_within(self.outer_hz);
        let n = psd.len();
        let k = peak.bin;

        let mut flags = QualityFlags::new();
        if outer > k || k + outer >= n {
            flags.insert(QualityFlag::WindowOutOfRange(Metric::Rolloff));
        }

        let side = |toward_lower: bool| -> Option<f64> {
            let points: Vec<(f64, f64)> = (inner..=outer)
                .filter_map(|d| {
                    let bin = if toward_lower {
                        k.checked_sub(d)?
                    } else {
                        Some(k + d).filter(|&b| b < n)?
                    };
                    let x = d as f64 * psd.bin_width_hz() / SLOPE_UNIT_HZ;
                    Some((x, power_to_db(psd.power()[bin], self.log_floor)))
                })
                .collect();
            least_squares_slope(&points).map(|slope| -slope)
        };

        let left = side(true);
        let right = side(false);

        let measured: Vec<f64> = [left, right].into_iter().flatten().collect();
        if measured.iter().any(|s| s.abs() < self.flat_slope) {
            flags.insert(QualityFlag::FlatRolloff);
        }

        let asymmetry = match (left, right) {
            (Some(l), Some(r)) if !flags.contains(QualityFlag::FlatRolloff) => {
                let (l, r) = (l.abs(), r.abs());
                l.max(r) / l.min(r)
            }
            _ => 1.0,
        };

        let left_slope = left.unwrap_or(0.0);
        let right_slope = right.unwrap_or(0.0);
        trace!(inner, outer, left_slope, right_slope, asymmetry, "rolloff measured");

        Rolloff {
            left_slope,
            right_slope,
            asymmetry,
            flags,
        }
    }
}

/// Ordinary least-squares slope of `y` on `x`; `None` with fewer than two points
pub fn least_squares_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    if sxx <= 0.0 {
        return None;
    }
    Some(sxy / sxx)
}
