//! Adjacent-channel rejection
//!
//! Compares the tuned channel with two windows of the same nominal width
//! centred a fixed offset either side of it. Mean densities are compared
//! rather than integrated powers, so a window clipped at the spectrum edge
//! is still compared on an equal-bandwidth basis.
//!
//! The carrier window sits on the tuned frequency (the DC bin), not on the
//! strongest bin. When a neighbour outshines the wanted station the peak
//! locator follows the neighbour, but the rejection stays anchored to the
//! channel that was asked for and goes negative.

use crate::analysis::spectrum::PowerSpectralDensity;
use crate::config::EngineConfig;
use crate::quality::{Metric, QualityFlag, QualityFlags};
use crate::types::ratio_db;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct AdjacentRejection {
    /// Mean density in the carrier window
    pub carrier_density: f64,
    /// Mean density below the carrier, if any bins exist there
    pub left_density: Option<f64>,
    /// Mean density above the carrier, if any bins exist there
    pub right_density: Option<f64>,
    /// Negative when an adjacent channel is stronger than the carrier
    pub rejection_db: f64,
    pub flags: QualityFlags,
}

#[derive(Debug, Clone, Copy)]
pub struct AdjacentChannelAnalyzer {
    offset_hz: f64,
    half_width_hz: f64,
}

impl Default for AdjacentChannelAnalyzer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl AdjacentChannelAnalyzer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            offset_hz: config.adjacent_offset_hz,
            half_width_hz: config.adjacent_half_width_hz,
        }
    }

    pub fn with_offset(mut self, offset_hz: f64, half_width_hz: f64) -> Self {
        self.offset_hz = offset_hz;
        self.half_width_hz = half_width_hz;
        self
    }

    /// Measure around the tuned frequency
    pub fn analyze(&self, psd: &PowerSpectralDensity) -> AdjacentRejection {
        self.analyze_at(psd, psd.dc_bin())
    }

    /// Measure around an arbitrary bin, e.g. a detected peak
    pub fn analyze_at(&self, psd: &PowerSpectralDensity, center_bin: usize) -> AdjacentRejection {
        let offset = psd.bins_nearest(self.offset_hz) as isize;
        let half = psd.bins_within(self.half_width_hz);
        let center = center_bin as isize;

        let carrier = psd.window(center, half);
        let left = psd.window(center - offset, half);
        let right = psd.window(center + offset, half);

        let mut flags = QualityFlags::new();
        if carrier.clipped || left.clipped || right.clipped {
            flags.insert(QualityFlag::WindowOutOfRange(Metric::Adjacent));
        }

        let carrier_density = psd.mean_density(carrier);
        let left_density = (!left.is_empty()).then(|| psd.mean_density(left));
        let right_density = (!right.is_empty()).then(|| psd.mean_density(right));

        let adjacent_density = match (left_density, right_density) {
            (Some(l), Some(r)) => Some(0.5 * (l + r)),
            (Some(l), None) => Some(l),
            (None, Some(r)) => Some(r),
            (None, None) => None,
        };

        let rejection_db = match adjacent_density {
            Some(adjacent) => ratio_db(carrier_density, adjacent),
            None => f64::NEG_INFINITY,
        };

        trace!(
            carrier_density,
            ?left_density,
            ?right_density,
            rejection_db,
            "adjacent rejection measured"
        );

        AdjacentRejection {
            carrier_density,
            left_density,
            right_density,
            rejection_db,
            flags,
        }
    }
}
