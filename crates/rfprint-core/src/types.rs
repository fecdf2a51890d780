//! Core types for spectral fingerprinting
//!
//! Complex baseband samples are carried as `Complex64`: the in-phase
//! component in `re`, the quadrature component in `im`.
//!
//! ```text
//!            Q (Imaginary)
//!            ^
//!            |     * (I=0.7, Q=0.7)
//!            |    /
//!            |   /
//!   ---------+---------> I (Real)
//! ```

use num_complex::Complex64;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// A buffer of I/Q samples
pub type IQBuffer = Vec<IQSample>;

/// Result type for fingerprinting operations
pub type FingerprintResult<T> = Result<T, FingerprintError>;

/// Errors that abort fingerprinting of one capture
///
/// Degenerate measurements (flat noise floor, unresolved bandwidth, ...) are
/// never errors; they are reported through quality flags on the record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FingerprintError {
    #[error("Insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("Invalid sample rate: {0} Hz. Must be finite and positive")]
    InvalidSampleRate(f64),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Interleaved I/Q buffer has odd length {0}")]
    OddInterleavedLength(usize),

    #[error("Invalid spectrum: {0}")]
    InvalidSpectrum(String),
}

/// Convert a power ratio to dB without producing NaN
///
/// A zero denominator with a positive numerator gives `+inf`, a zero
/// numerator over a positive denominator gives `-inf`, and two zero powers
/// compare as equal (0 dB).
pub fn ratio_db(numerator: f64, denominator: f64) -> f64 {
    match (numerator > 0.0, denominator > 0.0) {
        (true, true) => 10.0 * (numerator / denominator).log10(),
        (true, false) => f64::INFINITY,
        (false, true) => f64::NEG_INFINITY,
        (false, false) => 0.0,
    }
}

/// Linear power to dB with a floor, for log-domain fitting
#[inline]
pub fn power_to_db(power: f64, floor: f64) -> f64 {
    10.0 * (power.max(0.0) + floor).log10()
}
