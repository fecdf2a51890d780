//! Frequency drift across repeated captures of one station
//!
//! Drift cannot be judged from a single capture, so it is checked here
//! against the median peak of every record seen for the same nominal
//! frequency. The median keeps one bad capture from moving the reference.

use super::record::{Check, FingerprintRecord, ValidationReport};
use crate::config::ValidationThresholds;
use serde::Serialize;

/// Summary of peak-frequency scatter for a station
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftStats {
    pub count: usize,
    pub mean_peak_hz: f64,
    pub median_peak_hz: f64,
    pub std_dev_hz: f64,
    /// Highest minus lowest peak
    pub spread_hz: f64,
    /// Largest distance of any peak from the median
    pub max_deviation_hz: f64,
}

/// Peak history for one nominal station frequency
#[derive(Debug, Clone, PartialEq)]
pub struct StationHistory {
    station_freq_hz: f64,
    peaks_hz: Vec<f64>,
}

impl StationHistory {
    pub fn new(station_freq_hz: f64) -> Self {
        Self {
            station_freq_hz,
            peaks_hz: Vec::new(),
        }
    }

    pub fn station_freq_hz(&self) -> f64 {
        self.station_freq_hz
    }

    /// Record a fingerprint's peak
    pub fn push(&mut self, record: &FingerprintRecord) {
        self.peaks_hz.push(record.peak_freq_hz);
    }

    pub fn len(&self) -> usize {
        self.peaks_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks_hz.is_empty()
    }

    pub fn median_peak_hz(&self) -> Option<f64> {
        if self.peaks_hz.is_empty() {
            return None;
        }
        let mut sorted = self.peaks_hz.clone();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        Some(if sorted.len() % 2 == 0 {
            0.5 * (sorted[mid - 1] + sorted[mid])
        } else {
            sorted[mid]
        })
    }

    /// Distance of a record's peak from the station median
    ///
    /// Zero for an empty history: the first capture defines the reference.
    pub fn drift_hz(&self, record: &FingerprintRecord) -> f64 {
        self.median_peak_hz()
            .map_or(0.0, |median| (record.peak_freq_hz - median).abs())
    }

    pub fn stats(&self) -> Option<DriftStats> {
        let median = self.median_peak_hz()?;
        let count = self.peaks_hz.len();
        let mean = self.peaks_hz.iter().sum::<f64>() / count as f64;
        let variance = self
            .peaks_hz
            .iter()
            .map(|p| (p - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        let (lo, hi) = self
            .peaks_hz
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
                (lo.min(p), hi.max(p))
            });
        let max_deviation_hz = self
            .peaks_hz
            .iter()
            .map(|p| (p - median).abs())
            .fold(0.0, f64::max);

        Some(DriftStats {
            count,
            mean_peak_hz: mean,
            median_peak_hz: median,
            std_dev_hz: variance.sqrt(),
            spread_hz: hi - lo,
            max_deviation_hz,
        })
    }

    /// The four per-capture checks plus frequency drift
    pub fn validate(
        &self,
        record: &FingerprintRecord,
        thresholds: &ValidationThresholds,
    ) -> ValidationReport {
        let mut report = record.validate(thresholds);
        let drift = self.drift_hz(record);
        report.push(Check::FrequencyDrift, drift, drift <= thresholds.max_drift_hz);
        report
    }
}
