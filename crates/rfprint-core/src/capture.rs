//! IQ capture container
//!
//! An [`IqCapture`] is the engine's only input: complex baseband samples plus
//! the tuner settings they were recorded with. The engine never mutates it.

use crate::types::{FingerprintError, FingerprintResult, IQSample};

/// A recorded complex baseband capture
#[derive(Debug, Clone, PartialEq)]
pub struct IqCapture {
    capture_id: String,
    samples: Vec<IQSample>,
    sample_rate_hz: f64,
    center_freq_hz: f64,
}

impl IqCapture {
    /// Create a capture, validating the sample rate
    pub fn new(
        capture_id: impl Into<String>,
        samples: Vec<IQSample>,
        sample_rate_hz: f64,
        center_freq_hz: f64,
    ) -> FingerprintResult<Self> {
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            return Err(FingerprintError::InvalidSampleRate(sample_rate_hz));
        }

        Ok(Self {
            capture_id: capture_id.into(),
            samples,
            sample_rate_hz,
            center_freq_hz,
        })
    }

    /// Create a capture from interleaved `[i0, q0, i1, q1, ...]` floats
    pub fn from_interleaved(
        capture_id: impl Into<String>,
        interleaved: &[f32],
        sample_rate_hz: f64,
        center_freq_hz: f64,
    ) -> FingerprintResult<Self> {
        if interleaved.len() % 2 != 0 {
            return Err(FingerprintError::OddInterleavedLength(interleaved.len()));
        }

        let samples = interleaved
            .chunks_exact(2)
            .map(|pair| IQSample::new(pair[0] as f64, pair[1] as f64))
            .collect();

        Self::new(capture_id, samples, sample_rate_hz, center_freq_hz)
    }

    /// Identifier used to correlate the output record with its source
    pub fn capture_id(&self) -> &str {
        &self.capture_id
    }

    /// The complex samples
    pub fn samples(&self) -> &[IQSample] {
        &self.samples
    }

    /// Number of complex samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the capture holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample rate in Hz
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Tuner centre frequency in Hz
    pub fn center_freq_hz(&self) -> f64 {
        self.center_freq_hz
    }

    /// Capture duration in seconds
    pub fn duration_sec(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate_hz
    }
}
