//! Carrier Peak Location
//!
//! Sub-bin carrier frequency from a 3-point parabola fitted to the
//! natural-log PSD around its maximum.
//!
//! ```text
//!   ln p
//!    |        * p[k]
//!    |   *    :    * p[k+1]
//!    | p[k-1] :
//!    +--------+-+-----> bin
//!             k  k+δ
//!
//!   δ = 0.5 (p[k-1] - p[k+1]) / (p[k-1] - 2 p[k] + p[k+1]),  |δ| <= 0.5
//! ```

use crate::analysis::spectrum::PowerSpectralDensity;
use crate::quality::{QualityFlag, QualityFlags};
use tracing::trace;

/// Curvatures at or above this are not a maximum; the fit is skipped
const MIN_CURVATURE: f64 = 1e-12;

/// Result of locating the carrier peak
#[derive(Debug, Clone, PartialEq)]
pub struct PeakEstimate {
    /// Index of the maximum bin
    pub bin: usize,
    /// Interpolated vertex offset from `bin`, in bins
    pub offset_bins: f64,
    /// Baseband frequency of the vertex (Hz)
    pub baseband_freq_hz: f64,
    /// Power density at `bin` (linear, power/Hz)
    pub peak_density: f64,
    /// Flags raised while locating the peak
    pub flags: QualityFlags,
}

/// Finds the strongest bin and refines it with log-domain interpolation
#[derive(Debug, Clone, Copy)]
pub struct PeakLocator {
    log_floor: f64,
}

impl Default for PeakLocator {
    fn default() -> Self {
        Self { log_floor: 1e-30 }
    }
}

impl PeakLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the floor added to power before taking the log
    pub fn with_log_floor(mut self, log_floor: f64) -> Self {
        self.log_floor = log_floor;
        self
    }

    /// Locate the carrier peak
    ///
    /// Ties resolve to the lowest bin index. A maximum in the first or last
    /// bin cannot be interpolated and is reported at the bin centre with
    /// `PEAK_AT_EDGE`.
    pub fn locate(&self, psd: &PowerSpectralDensity) -> PeakEstimate {
        let power = psd.power();
        let log_power: Vec<f64> = power.iter().map(|&p| (p + self.log_floor).ln()).collect();

        let mut bin = 0;
        for (i, &lp) in log_power.iter().enumerate() {
            if lp > log_power[bin] {
                bin = i;
            }
        }

        let mut flags = QualityFlags::new();
        let offset_bins = if bin == 0 || bin + 1 == log_power.len() {
            flags.insert(QualityFlag::PeakAtEdge);
            0.0
        } else {
            parabolic_offset(log_power[bin - 1], log_power[bin], log_power[bin + 1])
        };

        let baseband_freq_hz = psd.frequencies()[bin] + offset_bins * psd.bin_width_hz();
        trace!(bin, offset_bins, baseband_freq_hz, "peak located");

        PeakEstimate {
            bin,
            offset_bins,
            baseband_freq_hz,
            peak_density: power[bin],
            flags,
        }
    }
}

/// Vertex offset of the parabola through three equally spaced points
///
/// Clamped to half a bin; zero when the points are not concave.
pub fn parabolic_offset(left: f64, center: f64, right: f64) -> f64 {
    let denominator = left - 2.0 * center + right;
    if denominator >= -MIN_CURVATURE {
        return 0.0;
    }
    (0.5 * (left - right) / denominator).clamp(-0.5, 0.5)
}
