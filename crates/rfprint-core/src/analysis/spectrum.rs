//! Welch Power Spectral Density
//!
//! Overlapping windowed segments, magnitude-squared FFTs, averaged and scaled
//! to power per Hz. The result is re-centred so bin `N/2` is DC.
//!
//! ```text
//!   |<--- L --->|
//!   [ segment 0 ]
//!         [ segment 1 ]          hop = L - floor(L * overlap)
//!               [ segment 2 ]
//!                     ...        partial tail is dropped
//! ```
//!
//! Density scaling `1 / (fs * Σw²)` makes `Σ psd * bin_width` equal to the
//! mean signal power regardless of window or segment length, which is what
//! lets every downstream power ratio compare like with like.

use crate::fft_utils::FftProcessor;
use crate::types::{FingerprintError, FingerprintResult, IQSample};
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use tracing::debug;

/// Window functions for spectral analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFunction {
    /// No windowing (rectangular)
    #[serde(alias = "rectangular")]
    None,
    /// Hann window (default)
    #[default]
    Hann,
    /// Hamming window
    Hamming,
    /// Blackman window
    Blackman,
    /// Blackman-Harris window - very low sidelobes
    BlackmanHarris,
    /// Flat-top window - accurate amplitude, wide main lobe
    FlatTop,
}

impl WindowFunction {
    /// Generate periodic window coefficients for the given size
    pub fn generate(&self, size: usize) -> Vec<f64> {
        let phase = |i: usize| 2.0 * PI * i as f64 / size as f64;
        match self {
            WindowFunction::None => vec![1.0; size],
            WindowFunction::Hann => (0..size).map(|i| 0.5 * (1.0 - phase(i).cos())).collect(),
            WindowFunction::Hamming => (0..size).map(|i| 0.54 - 0.46 * phase(i).cos()).collect(),
            WindowFunction::Blackman => (0..size)
                .map(|i| {
                    let x = phase(i);
                    0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
                })
                .collect(),
            WindowFunction::BlackmanHarris => (0..size)
                .map(|i| {
                    let x = phase(i);
                    0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                        - 0.01168 * (3.0 * x).cos()
                })
                .collect(),
            WindowFunction::FlatTop => (0..size)
                .map(|i| {
                    let x = phase(i);
                    0.21557895 - 0.41663158 * x.cos() + 0.277263158 * (2.0 * x).cos()
                        - 0.083578947 * (3.0 * x).cos()
                        + 0.006947368 * (4.0 * x).cos()
                })
                .collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WindowFunction::None => "none",
            WindowFunction::Hann => "hann",
            WindowFunction::Hamming => "hamming",
            WindowFunction::Blackman => "blackman",
            WindowFunction::BlackmanHarris => "blackman-harris",
            WindowFunction::FlatTop => "flat-top",
        }
    }
}

impl fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowFunction {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "rectangular" | "rect" => Ok(WindowFunction::None),
            "hann" | "hanning" => Ok(WindowFunction::Hann),
            "hamming" => Ok(WindowFunction::Hamming),
            "blackman" => Ok(WindowFunction::Blackman),
            "blackman-harris" | "blackmanharris" => Ok(WindowFunction::BlackmanHarris),
            "flat-top" | "flattop" => Ok(WindowFunction::FlatTop),
            other => Err(FingerprintError::InvalidConfig(format!(
                "unknown window function '{}'",
                other
            ))),
        }
    }
}

/// A contiguous run of PSD bins, already clipped to the spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinWindow {
    /// First bin (inclusive)
    pub start: usize,
    /// One past the last bin
    pub end: usize,
    /// True if the requested window reached past either spectrum edge
    pub clipped: bool,
}

impl BinWindow {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Welch-averaged, re-centred power spectral density (power per Hz)
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectralDensity {
    frequencies: Vec<f64>,
    power: Vec<f64>,
    bin_width_hz: f64,
    sample_rate_hz: f64,
    num_segments: usize,
}

impl PowerSpectralDensity {
    /// Build a PSD from already-shifted density values
    ///
    /// Bin `len / 2` is taken as DC. Used for hand-constructed spectra and by
    /// the estimator itself.
    pub fn from_parts(power: Vec<f64>, sample_rate_hz: f64) -> FingerprintResult<Self> {
        Self::with_segments(power, sample_rate_hz, 1)
    }

    fn with_segments(
        power: Vec<f64>,
        sample_rate_hz: f64,
        num_segments: usize,
    ) -> FingerprintResult<Self> {
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            return Err(FingerprintError::InvalidSampleRate(sample_rate_hz));
        }
        if power.is_empty() {
            return Err(FingerprintError::InvalidSpectrum("no bins".to_string()));
        }
        if let Some(bad) = power.iter().position(|p| !p.is_finite() || *p < 0.0) {
            return Err(FingerprintError::InvalidSpectrum(format!(
                "bin {} has density {}",
                bad, power[bad]
            )));
        }

        let n = power.len();
        Ok(Self {
            frequencies: FftProcessor::shifted_frequencies(n, sample_rate_hz),
            power,
            bin_width_hz: sample_rate_hz / n as f64,
            sample_rate_hz,
            num_segments,
        })
    }

    /// Baseband frequency of each bin in Hz, ascending
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Power density of each bin (power/Hz)
    pub fn power(&self) -> &[f64] {
        &self.power
    }

    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    pub fn bin_width_hz(&self) -> f64 {
        self.bin_width_hz
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Number of segments averaged
    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// Index of the DC bin
    pub fn dc_bin(&self) -> usize {
        self.len() / 2
    }

    /// Whole bins that fit inside `hz` (floor)
    pub fn bins_within(&self, hz: f64) -> usize {
        (hz / self.bin_width_hz + 1e-9).floor().max(0.0) as usize
    }

    /// Whole bins needed to cover `hz` (ceil)
    pub fn bins_covering(&self, hz: f64) -> usize {
        (hz / self.bin_width_hz - 1e-9).ceil().max(0.0) as usize
    }

    /// Nearest whole number of bins to `hz`
    pub fn bins_nearest(&self, hz: f64) -> usize {
        (hz / self.bin_width_hz).round().max(0.0) as usize
    }

    /// Bins `center - half_width ..= center + half_width`, clipped to the spectrum
    pub fn window(&self, center: isize, half_width: usize) -> BinWindow {
        let last = self.len() as isize - 1;
        let half = half_width as isize;
        let lo = center - half;
        let hi = center + half;

        if hi < 0 || lo > last {
            return BinWindow {
                start: 0,
                end: 0,
                clipped: true,
            };
        }

        BinWindow {
            start: lo.max(0) as usize,
            end: hi.min(last) as usize + 1,
            clipped: lo < 0 || hi > last,
        }
    }

    /// Absolute power in a window: Σ density × bin width
    pub fn integrate(&self, window: BinWindow) -> f64 {
        self.power[window.range()].iter().sum::<f64>() * self.bin_width_hz
    }

    /// Mean density over a window, zero when the window is empty
    pub fn mean_density(&self, window: BinWindow) -> f64 {
        if window.is_empty() {
            return 0.0;
        }
        self.power[window.range()].iter().sum::<f64>() / window.len() as f64
    }

    /// Total power across the whole spectrum
    pub fn total_power(&self) -> f64 {
        self.power.iter().sum::<f64>() * self.bin_width_hz
    }
}

/// Welch PSD estimator with a fixed segment length and window
pub struct WelchEstimator {
    segment_len: usize,
    overlap_fraction: f64,
    window: WindowFunction,
    window_coeffs: Vec<f64>,
    window_energy: f64,
    processor: FftProcessor,
}

impl fmt::Debug for WelchEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WelchEstimator")
            .field("segment_len", &self.segment_len)
            .field("overlap_fraction", &self.overlap_fraction)
            .field("window", &self.window)
            .finish()
    }
}

impl WelchEstimator {
    /// Hann window, 50% overlap
    pub fn new(segment_len: usize) -> Self {
        Self::with_window(segment_len, WindowFunction::Hann, 0.5)
    }

    /// Custom window and overlap fraction in `[0, 1)`
    pub fn with_window(segment_len: usize, window: WindowFunction, overlap_fraction: f64) -> Self {
        let window_coeffs = window.generate(segment_len);
        let window_energy = window_coeffs.iter().map(|w| w * w).sum();

        Self {
            segment_len,
            overlap_fraction,
            window,
            window_coeffs,
            window_energy,
            processor: FftProcessor::new(segment_len),
        }
    }

    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    pub fn window(&self) -> WindowFunction {
        self.window
    }

    /// Samples between successive segment starts
    pub fn hop(&self) -> usize {
        let overlap = (self.segment_len as f64 * self.overlap_fraction).floor() as usize;
        self.segment_len.saturating_sub(overlap).max(1)
    }

    /// Number of full segments that fit in `num_samples`
    pub fn num_segments(&self, num_samples: usize) -> usize {
        if num_samples < self.segment_len {
            return 0;
        }
        (num_samples - self.segment_len) / self.hop() + 1
    }

    /// Estimate the PSD of `samples`
    ///
    /// Fails with `InsufficientSamples` if fewer than one segment of samples
    /// is available. Segments are accumulated in order, so the result is
    /// bit-identical for identical input.
    pub fn estimate(
        &mut self,
        samples: &[IQSample],
        sample_rate: f64,
    ) -> FingerprintResult<PowerSpectralDensity> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(FingerprintError::InvalidSampleRate(sample_rate));
        }
        if self.segment_len < 2 || self.window_energy <= 0.0 {
            return Err(FingerprintError::InvalidConfig(format!(
                "segment length {} cannot form a spectrum",
                self.segment_len
            )));
        }
        if samples.len() < self.segment_len {
            return Err(FingerprintError::InsufficientSamples {
                required: self.segment_len,
                actual: samples.len(),
            });
        }

        let hop = self.hop();
        let num_segments = self.num_segments(samples.len());
        let mut accumulated = vec![0.0f64; self.segment_len];
        let mut frame = vec![Complex64::new(0.0, 0.0); self.segment_len];

        for segment in 0..num_segments {
            let start = segment * hop;
            let chunk = &samples[start..start + self.segment_len];
            for ((slot, &s), &w) in frame.iter_mut().zip(chunk).zip(&self.window_coeffs) {
                *slot = s * w;
            }

            self.processor.fft_inplace(&mut frame);

            for (acc, bin) in accumulated.iter_mut().zip(&frame) {
                *acc += bin.norm_sqr();
            }
        }

        let scale = 1.0 / (sample_rate * self.window_energy * num_segments as f64);
        let density: Vec<f64> = accumulated.iter().map(|p| p * scale).collect();

        debug!(
            segment_len = self.segment_len,
            hop,
            num_segments,
            window = %self.window,
            "Welch PSD estimated"
        );

        PowerSpectralDensity::with_segments(
            FftProcessor::fft_shift(&density),
            sample_rate,
            num_segments,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(n: usize, freq: f64, sample_rate: f64, amplitude: f64) -> Vec<IQSample> {
        (0..n)
            .map(|i| {
                let phase = 2.0 * PI * freq * i as f64 / sample_rate;
                IQSample::new(amplitude * phase.cos(), amplitude * phase.sin())
            })
            .collect()
    }

    #[test]
    fn test_window_generation() {
        let size = 64;

        let hann = WindowFunction::Hann.generate(size);
        assert!(hann[0].abs() < 1e-12);
        assert!((hann[size / 2] - 1.0).abs() < 1e-12);

        let hamming = WindowFunction::Hamming.generate(size);
        assert!((hamming[0] - 0.08).abs() < 0.01);

        assert!(WindowFunction::None.generate(size).iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_window_from_str() {
        assert_eq!("hann".parse::<WindowFunction>().unwrap(), WindowFunction::Hann);
        assert_eq!(
            "HAMMING".parse::<WindowFunction>().unwrap(),
            WindowFunction::Hamming
        );
        assert_eq!(
            "blackman-harris".parse::<WindowFunction>().unwrap(),
            WindowFunction::BlackmanHarris
        );
        assert!("invalid".parse::<WindowFunction>().is_err());
    }

    #[test]
    fn test_insufficient_samples() {
        let mut welch = WelchEstimator::new(4096);
        let err = welch
            .estimate(&vec![IQSample::new(0.0, 0.0); 4095], 2.4e6)
            .unwrap_err();
        assert_eq!(
            err,
            FingerprintError::InsufficientSamples {
                required: 4096,
                actual: 4095
            }
        );
    }

    #[test]
    fn test_segment_count_drops_tail() {
        let welch = WelchEstimator::new(1024);
        assert_eq!(welch.hop(), 512);
        assert_eq!(welch.num_segments(1024), 1);
        assert_eq!(welch.num_segments(1535), 1);
        assert_eq!(welch.num_segments(1536), 2);
        assert_eq!(welch.num_segments(10 * 1024), 19);
    }

    #[test]
    fn test_bin_layout() {
        let mut welch = WelchEstimator::new(4096);
        let psd = welch.estimate(&tone(8192, 0.0, 2.4e6, 1.0), 2.4e6).unwrap();

        assert_eq!(psd.len(), 4096);
        assert_eq!(psd.dc_bin(), 2048);
        assert_eq!(psd.frequencies()[2048], 0.0);
        assert_eq!(psd.frequencies()[0], -1.2e6);
        assert!((psd.bin_width_hz() - 585.9375).abs() < 1e-12);
        assert_eq!(psd.num_segments(), 3);

        let peak = psd
            .power()
            .iter()
            .enumerate()
            .fold(0, |best, (i, &p)| if p > psd.power()[best] { i } else { best });
        assert_eq!(peak, 2048);
    }

    #[test]
    fn test_density_scaling_preserves_power() {
        // Integrated density equals mean |x|^2 for any window and length
        let sample_rate = 1e6;
        let samples = tone(16_384, 12_345.0, sample_rate, 2.0);

        for (len, window) in [
            (1024, WindowFunction::Hann),
            (2048, WindowFunction::Hann),
            (1024, WindowFunction::BlackmanHarris),
        ] {
            let mut welch = WelchEstimator::with_window(len, window, 0.5);
            let psd = welch.estimate(&samples, sample_rate).unwrap();
            let total = psd.total_power();
            assert!(
                (total - 4.0).abs() / 4.0 < 0.01,
                "{} / {}: total power {} expected 4.0",
                window,
                len,
                total
            );
        }
    }

    #[test]
    fn test_tone_frequency_lands_on_bin() {
        let sample_rate = 48_000.0;
        let mut welch = WelchEstimator::new(1024);
        let psd = welch
            .estimate(&tone(8192, 1500.0, sample_rate, 1.0), sample_rate)
            .unwrap();

        let (peak, _) = psd
            .power()
            .iter()
            .enumerate()
            .fold((0, 0.0), |(bi, bp), (i, &p)| if p > bp { (i, p) } else { (bi, bp) });
        let peak_freq = psd.frequencies()[peak];
        assert!(
            (peak_freq - 1500.0).abs() <= psd.bin_width_hz(),
            "Peak at {} Hz, expected 1500 Hz",
            peak_freq
        );
    }

    #[test]
    fn test_from_parts_rejects_bad_bins() {
        assert!(matches!(
            PowerSpectralDensity::from_parts(vec![], 1e6),
            Err(FingerprintError::InvalidSpectrum(_))
        ));
        assert!(matches!(
            PowerSpectralDensity::from_parts(vec![1.0, -1.0], 1e6),
            Err(FingerprintError::InvalidSpectrum(_))
        ));
        assert!(matches!(
            PowerSpectralDensity::from_parts(vec![1.0, f64::NAN], 1e6),
            Err(FingerprintError::InvalidSpectrum(_))
        ));
        assert!(matches!(
            PowerSpectralDensity::from_parts(vec![1.0; 4], 0.0),
            Err(FingerprintError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn test_window_clipping() {
        let psd = PowerSpectralDensity::from_parts(vec![1.0; 16], 16.0).unwrap();

        let inner = psd.window(8, 2);
        assert_eq!(inner.range(), 6..11);
        assert!(!inner.clipped);

        let left = psd.window(1, 3);
        assert_eq!(left.range(), 0..5);
        assert!(left.clipped);

        let right = psd.window(14, 3);
        assert_eq!(right.range(), 11..16);
        assert!(right.clipped);

        let outside = psd.window(-10, 3);
        assert!(outside.is_empty());
        assert!(outside.clipped);

        let beyond = psd.window(40, 3);
        assert!(beyond.is_empty());
    }

    #[test]
    fn test_integrate_and_mean() {
        let psd = PowerSpectralDensity::from_parts(vec![2.0; 8], 8.0).unwrap();
        let w = psd.window(4, 1);
        assert_eq!(psd.integrate(w), 6.0);
        assert_eq!(psd.mean_density(w), 2.0);
        let empty = BinWindow {
            start: 0,
            end: 0,
            clipped: true,
        };
        assert_eq!(psd.mean_density(empty), 0.0);
    }

    #[test]
    fn test_bin_counts() {
        // 2.4 MHz / 4096 gives an exact binary bin width
        let psd = PowerSpectralDensity::from_parts(vec![1.0; 4096], 2.4e6).unwrap();
        assert_eq!(psd.bins_within(150e3), 256);
        assert_eq!(psd.bins_within(50e3), 85);
        assert_eq!(psd.bins_covering(100e3), 171);
        assert_eq!(psd.bins_nearest(200e3), 341);
    }
}
