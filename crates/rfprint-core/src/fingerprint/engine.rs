//! Fingerprint aggregation
//!
//! ```text
//!   IqCapture ──► Welch PSD ──► peak ──┬─► noise floor ─► CNR ─┐
//!                                      ├─► bandwidth ──────────┤
//!                                      ├─► adjacent ───────────┼─► record
//!                                      └─► rolloff ────────────┘
//! ```
//!
//! Everything after the peak reads the same immutable PSD, so the four
//! branches run as independent `rayon::join` tasks when the `parallel`
//! feature is on. Each branch is deterministic on its own, so the result is
//! identical with or without the feature. Adjacent rejection is the one
//! branch that ignores the peak: it is anchored to the tuned frequency.

use std::time::Instant;

use tracing::debug;

use super::record::{CnrGrade, FingerprintRecord};
use crate::analysis::{
    AdjacentChannelAnalyzer, AdjacentRejection, Bandwidth, BandwidthMeasurer, CarrierToNoise,
    CnrCalculator, NoiseFloor, NoiseFloorEstimator, PeakEstimate, PeakLocator,
    PowerSpectralDensity, Rolloff, RolloffAnalyzer, WelchEstimator,
};
use crate::capture::IqCapture;
use crate::config::EngineConfig;
use crate::quality::QualityFlags;
use crate::types::FingerprintResult;

/// Every intermediate measurement for one spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralMetrics {
    pub peak: PeakEstimate,
    pub noise: NoiseFloor,
    pub cnr: CarrierToNoise,
    pub bandwidth: Bandwidth,
    pub adjacent: AdjacentRejection,
    pub rolloff: Rolloff,
}

impl SpectralMetrics {
    /// Union of every metric's flags
    pub fn flags(&self) -> QualityFlags {
        let mut flags = QualityFlags::new();
        for set in [
            &self.peak.flags,
            &self.noise.flags,
            &self.cnr.flags,
            &self.bandwidth.flags,
            &self.adjacent.flags,
            &self.rolloff.flags,
        ] {
            flags.union_with(set);
        }
        flags
    }
}

/// Turns captures into fingerprint records
///
/// Holds only configuration, so one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct FingerprintEngine {
    config: EngineConfig,
}

impl FingerprintEngine {
    /// Create an engine, rejecting an invalid configuration
    pub fn new(config: EngineConfig) -> FingerprintResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Welch PSD of a capture with this engine's settings
    pub fn estimate_psd(&self, capture: &IqCapture) -> FingerprintResult<PowerSpectralDensity> {
        let mut welch = WelchEstimator::with_window(
            self.config.segment_len,
            self.config.window,
            self.config.overlap_fraction,
        );
        welch.estimate(capture.samples(), capture.sample_rate_hz())
    }

    /// Run every metric over one spectrum
    pub fn analyze(&self, psd: &PowerSpectralDensity) -> SpectralMetrics {
        let config = &self.config;
        let peak = PeakLocator::new()
            .with_log_floor(config.log_floor)
            .locate(psd);

        let ((noise, cnr), (bandwidth, (adjacent, rolloff))) = join(
            || {
                let noise = NoiseFloorEstimator::from_config(config).estimate(psd, &peak);
                let cnr = CnrCalculator::from_config(config).measure(psd, &peak, &noise);
                (noise, cnr)
            },
            || {
                join(
                    || BandwidthMeasurer::from_config(config).measure(psd, &peak),
                    || {
                        join(
                            || AdjacentChannelAnalyzer::from_config(config).analyze(psd),
                            || RolloffAnalyzer::from_config(config).analyze(psd, &peak),
                        )
                    },
                )
            },
        );

        debug!(
            peak_bin = peak.bin,
            noise_bins = noise.bins_used,
            cnr_db = cnr.cnr_db,
            bandwidth_hz = bandwidth.bandwidth_hz,
            "metrics extracted"
        );

        SpectralMetrics {
            peak,
            noise,
            cnr,
            bandwidth,
            adjacent,
            rolloff,
        }
    }

    /// Fingerprint one capture
    ///
    /// Only a capture shorter than one segment is an error; every other
    /// problem is reported through the record's quality flags.
    pub fn fingerprint(&self, capture: &IqCapture) -> FingerprintResult<FingerprintRecord> {
        let start = Instant::now();

        let psd = self.estimate_psd(capture)?;
        let metrics = self.analyze(&psd);
        let mut record = self.assemble(capture, &metrics);
        record.processing_time_sec = start.elapsed().as_secs_f64();

        debug!(
            capture_id = capture.capture_id(),
            num_segments = psd.num_segments(),
            confidence = record.confidence,
            flags = %record.quality_flags,
            "capture fingerprinted"
        );

        Ok(record)
    }

    fn assemble(&self, capture: &IqCapture, metrics: &SpectralMetrics) -> FingerprintRecord {
        let thresholds = &self.config.thresholds;
        let center = capture.center_freq_hz();
        let peak_freq_hz = center + metrics.peak.baseband_freq_hz;

        let mut record = FingerprintRecord {
            capture_id: capture.capture_id().to_string(),
            center_freq_hz: center,
            peak_freq_hz,
            freq_error_hz: metrics.peak.baseband_freq_hz,
            cnr_db: metrics.cnr.cnr_db,
            cnr_grade: if metrics.noise.is_degenerate() {
                CnrGrade::Poor
            } else {
                CnrGrade::from_cnr(metrics.cnr.cnr_db, thresholds)
            },
            bandwidth_3db_hz: metrics.bandwidth.bandwidth_hz,
            adjacent_rejection_db: metrics.adjacent.rejection_db,
            rolloff_left_slope_db_per_100khz: metrics.rolloff.left_slope,
            rolloff_right_slope_db_per_100khz: metrics.rolloff.right_slope,
            rolloff_asymmetry: metrics.rolloff.asymmetry,
            confidence: 0.0,
            processing_time_sec: 0.0,
            quality_flags: metrics.flags(),
        };
        record.confidence = record.validate(thresholds).confidence();
        record
    }
}

#[cfg(feature = "parallel")]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    rayon::join(a, b)
}

#[cfg(not(feature = "parallel"))]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA,
    B: FnOnce() -> RB,
{
    (a(), b())
}
