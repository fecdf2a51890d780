//! Fingerprint record and grading
//!
//! A [`FingerprintRecord`] is the engine's only output. Field names and
//! units (Hz, dB, seconds) are the persisted column names, so the serde
//! representation can be written straight into a store.

use crate::config::ValidationThresholds;
use crate::quality::{QualityFlag, QualityFlags};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse CNR verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CnrGrade {
    Poor,
    Acceptable,
    Excellent,
}

impl CnrGrade {
    /// Grade a finite CNR; anything non-finite is `Poor`
    pub fn from_cnr(cnr_db: f64, thresholds: &ValidationThresholds) -> Self {
        if !cnr_db.is_finite() || cnr_db < thresholds.cnr_min_db {
            CnrGrade::Poor
        } else if cnr_db < thresholds.cnr_excellent_db {
            CnrGrade::Acceptable
        } else {
            CnrGrade::Excellent
        }
    }
}

impl fmt::Display for CnrGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CnrGrade::Poor => f.write_str("poor"),
            CnrGrade::Acceptable => f.write_str("acceptable"),
            CnrGrade::Excellent => f.write_str("excellent"),
        }
    }
}

/// The metric a validation check grades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Cnr,
    Bandwidth,
    AdjacentRejection,
    RolloffAsymmetry,
    FrequencyDrift,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::Cnr => "cnr",
            Check::Bandwidth => "bandwidth",
            Check::AdjacentRejection => "adjacent_rejection",
            Check::RolloffAsymmetry => "rolloff_asymmetry",
            Check::FrequencyDrift => "frequency_drift",
        };
        f.write_str(name)
    }
}

/// One pass/fail verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CheckResult {
    pub check: Check,
    pub value: f64,
    pub passed: bool,
}

/// All verdicts for one record plus the fraction that passed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn push(&mut self, check: Check, value: f64, passed: bool) {
        self.checks.push(CheckResult {
            check,
            value,
            passed,
        });
    }

    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Fraction of checks passing, in `[0, 1]`
    pub fn confidence(&self) -> f64 {
        if self.checks.is_empty() {
            return 0.0;
        }
        self.passed() as f64 / self.checks.len() as f64
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Spectral fingerprint of one capture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FingerprintRecord {
    pub capture_id: String,
    /// Tuner centre frequency the capture was requested at (Hz)
    pub center_freq_hz: f64,
    /// Absolute RF frequency of the carrier peak (Hz)
    pub peak_freq_hz: f64,
    /// `peak_freq_hz - center_freq_hz`
    pub freq_error_hz: f64,
    pub cnr_db: f64,
    pub cnr_grade: CnrGrade,
    pub bandwidth_3db_hz: f64,
    pub adjacent_rejection_db: f64,
    #[serde(rename = "rolloff_left_slope")]
    pub rolloff_left_slope_db_per_100khz: f64,
    #[serde(rename = "rolloff_right_slope")]
    pub rolloff_right_slope_db_per_100khz: f64,
    pub rolloff_asymmetry: f64,
    /// Fraction of the four per-capture checks passing at aggregation time
    pub confidence: f64,
    pub processing_time_sec: f64,
    pub quality_flags: QualityFlags,
}

impl FingerprintRecord {
    /// Grade the four metrics that can be judged from one capture
    pub fn validate(&self, thresholds: &ValidationThresholds) -> ValidationReport {
        let mut report = ValidationReport { checks: Vec::new() };

        let cnr_ok = !self.quality_flags.contains(QualityFlag::DegenerateNoiseFloor)
            && self.cnr_db.is_finite()
            && self.cnr_db >= thresholds.cnr_min_db;
        report.push(Check::Cnr, self.cnr_db, cnr_ok);

        let bw = self.bandwidth_3db_hz;
        report.push(
            Check::Bandwidth,
            bw,
            bw >= thresholds.bandwidth_min_hz && bw <= thresholds.bandwidth_max_hz,
        );

        report.push(
            Check::AdjacentRejection,
            self.adjacent_rejection_db,
            self.adjacent_rejection_db >= thresholds.adjacent_min_db,
        );

        report.push(
            Check::RolloffAsymmetry,
            self.rolloff_asymmetry,
            self.rolloff_asymmetry < thresholds.asymmetry_max,
        );

        report
    }

    /// Only peak frequency and CNR are trustworthy when this is false
    pub fn is_reliable(&self) -> bool {
        !self.quality_flags.contains(QualityFlag::LowConfidence)
            && !self.quality_flags.contains(QualityFlag::DegenerateNoiseFloor)
    }

    /// Human-readable warnings derived from the flags
    pub fn warnings(&self) -> Vec<String> {
        self.quality_flags
            .iter()
            .map(|flag| match flag {
                QualityFlag::PeakAtEdge => "carrier peak at spectrum edge".to_string(),
                QualityFlag::DegenerateNoiseFloor => "noise floor could not be estimated".to_string(),
                QualityFlag::LowConfidence => format!(
                    "low CNR ({:.1} dB): bandwidth, adjacent and rolloff unreliable",
                    self.cnr_db
                ),
                QualityFlag::BandwidthUnresolved => "no half-power crossing found".to_string(),
                QualityFlag::FlatRolloff => "flat spectral skirt".to_string(),
                QualityFlag::WindowOutOfRange(metric) => {
                    format!("{} window clipped at spectrum edge", metric)
                }
            })
            .collect()
    }

    /// Format as a text table
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Fingerprint: {}\n", self.capture_id));
        output.push_str(&"═".repeat(56));
        output.push('\n');
        output.push_str(&format!(
            "  Peak frequency:      {:>16.1} Hz ({:+.1} Hz)\n",
            self.peak_freq_hz, self.freq_error_hz
        ));
        output.push_str(&format!(
            "  CNR:                 {:>16.2} dB ({})\n",
            self.cnr_db, self.cnr_grade
        ));
        output.push_str(&format!(
            "  3 dB bandwidth:      {:>16.1} Hz\n",
            self.bandwidth_3db_hz
        ));
        output.push_str(&format!(
            "  Adjacent rejection:  {:>16.2} dB\n",
            self.adjacent_rejection_db
        ));
        output.push_str(&format!(
            "  Rolloff L / R:       {:>7.2} / {:<7.2} dB/100kHz\n",
            self.rolloff_left_slope_db_per_100khz, self.rolloff_right_slope_db_per_100khz
        ));
        output.push_str(&format!(
            "  Rolloff asymmetry:   {:>16.3}\n",
            self.rolloff_asymmetry
        ));
        output.push_str(&format!(
            "  Confidence:          {:>15.0}%\n",
            self.confidence * 100.0
        ));
        output.push_str(&format!(
            "  Processing time:     {:>16.3} s\n",
            self.processing_time_sec
        ));
        output.push_str(&format!("  Flags:               {}\n", self.quality_flags));
        output
    }

    pub fn csv_header() -> &'static str {
        "capture_id,peak_freq_hz,freq_error_hz,cnr_db,bandwidth_3db_hz,adjacent_rejection_db,\
         rolloff_left_slope,rolloff_right_slope,rolloff_asymmetry,confidence,processing_time_sec,\
         quality_flags"
    }

    /// One CSV row; flags are `;`-separated inside a single column
    pub fn to_csv_row(&self) -> String {
        let flags: Vec<String> = self.quality_flags.iter().map(|f| f.to_string()).collect();
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            self.capture_id,
            self.peak_freq_hz,
            self.freq_error_hz,
            self.cnr_db,
            self.bandwidth_3db_hz,
            self.adjacent_rejection_db,
            self.rolloff_left_slope_db_per_100khz,
            self.rolloff_right_slope_db_per_100khz,
            self.rolloff_asymmetry,
            self.confidence,
            self.processing_time_sec,
            flags.join(";")
        )
    }
}
