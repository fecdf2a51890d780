//! # rfprint Core
//!
//! Spectral fingerprint extraction for complex baseband captures. Answers
//! one question per capture: is this the signal we believe we tuned to, and
//! is it of acceptable quality?
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐
//! │  IqCapture   │  samples, sample rate, tuner centre
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │  Welch PSD   │  Hann, 4096 bins, 50% overlap, power/Hz
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │ Peak Locator │  log-domain parabolic interpolation
//! └──────┬───────┘
//!        ├────────────┬─────────────┬──────────────┐
//!        ▼            ▼             ▼              ▼
//!  ┌───────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────┐
//!  │noise + CNR│ │bandwidth │ │ adjacent │ │   rolloff    │
//!  └─────┬─────┘ └────┬─────┘ └────┬─────┘ └──────┬───────┘
//!        └────────────┴─────┬──────┴──────────────┘
//!                           ▼
//!                 ┌───────────────────┐
//!                 │ FingerprintRecord │  metrics, flags, confidence
//!                 └───────────────────┘
//! ```
//!
//! The engine does no I/O. Degenerate measurements never fail a capture;
//! they are reported as [`QualityFlag`]s with documented sentinel values.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rfprint_core::{EngineConfig, FingerprintEngine, IqCapture};
//!
//! let engine = FingerprintEngine::new(EngineConfig::default())?;
//! let capture = IqCapture::from_interleaved("cap-1", &[0.0f32; 16_384], 2.4e6, 105.9e6)?;
//! let record = engine.fingerprint(&capture)?;
//! println!("{}", record.to_text());
//! # Ok::<(), rfprint_core::FingerprintError>(())
//! ```

pub mod analysis;
pub mod capture;
pub mod config;
pub mod fft_utils;
pub mod fingerprint;
pub mod quality;
pub mod types;

// Re-exports
pub use analysis::{PowerSpectralDensity, WelchEstimator, WindowFunction};
pub use capture::IqCapture;
pub use config::{EngineConfig, ValidationThresholds};
pub use fingerprint::{
    Check, CnrGrade, DriftStats, FingerprintEngine, FingerprintRecord, SpectralMetrics,
    StationHistory, ValidationReport,
};
pub use quality::{Metric, QualityFlag, QualityFlags};
pub use types::{FingerprintError, FingerprintResult, IQSample};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::*;
    pub use crate::capture::IqCapture;
    pub use crate::config::{EngineConfig, ValidationThresholds};
    pub use crate::fingerprint::*;
    pub use crate::quality::{Metric, QualityFlag, QualityFlags};
    pub use crate::types::*;
}
