//! Fingerprint aggregation, records and cross-capture drift

pub mod drift;
pub mod engine;
pub mod record;

pub use drift::{DriftStats, StationHistory};
pub use engine::{FingerprintEngine, SpectralMetrics};
pub use record::{Check, CheckResult, CnrGrade, FingerprintRecord, ValidationReport};
