//! Signal synthesis
//!
//! Tones and band-limited noise with a prescribed power spectral density.
//! Shaped noise is built directly in the frequency domain: every FFT bin
//! gets an independent complex Gaussian amplitude scaled to the target
//! density, and one inverse FFT turns the whole capture into time samples.
//! The result is circularly stationary, so no block seams leak energy into
//! the skirts being measured.

use rand::Rng;
use rand_distr::StandardNormal;
use rfprint_core::fft_utils::FftProcessor;
use rfprint_core::types::{Complex, IQSample};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Complex exponential at `freq_hz` with the given amplitude and starting phase
pub fn tone(
    num_samples: usize,
    freq_hz: f64,
    sample_rate: f64,
    amplitude: f64,
    phase: f64,
) -> Vec<IQSample> {
    let step = 2.0 * PI * freq_hz / sample_rate;
    (0..num_samples)
        .map(|n| Complex::from_polar(amplitude, phase + step * n as f64))
        .collect()
}

/// Add `source` into `target` sample by sample
pub fn mix_into(target: &mut [IQSample], source: &[IQSample]) {
    for (t, s) in target.iter_mut().zip(source) {
        *t += *s;
    }
}

/// Relative PSD of a flat-topped band with linear-in-dB skirts
///
/// ```text
///   0 dB  ┌───────────┐
///        ╱             ╲   skirt_db_per_100khz
///       ╱               ╲
///  ────┘                 └────
///      |<-- 2 × flat -->|
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandShape {
    /// Centre of the band relative to DC (Hz)
    pub center_hz: f64,
    /// Half-width of the flat top (Hz)
    pub flat_half_width_hz: f64,
    /// Skirt decay outside the flat top (dB per 100 kHz)
    pub skirt_db_per_100khz: f64,
}

impl BandShape {
    pub fn new(center_hz: f64, flat_half_width_hz: f64, skirt_db_per_100khz: f64) -> Self {
        Self {
            center_hz,
            flat_half_width_hz,
            skirt_db_per_100khz,
        }
    }

    /// Level relative to the flat top, in dB (≤ 0)
    pub fn level_db(&self, freq_hz: f64) -> f64 {
        let beyond = (freq_hz - self.center_hz).abs() - self.flat_half_width_hz;
        if beyond <= 0.0 {
            0.0
        } else {
            -self.skirt_db_per_100khz * beyond / 100e3
        }
    }

    /// Frequency offset from the centre at which the level reaches `level_db`
    pub fn half_width_at(&self, level_db: f64) -> f64 {
        self.flat_half_width_hz + 100e3 * level_db.abs() / self.skirt_db_per_100khz
    }
}

/// Bins more than this far below the flat top are left empty
const NEGLIGIBLE_DB: f64 = -150.0;

/// Gaussian noise whose PSD is `density × 10^(shape(f)/10)` power per Hz
///
/// Integrated over frequency this gives the mean sample power, matching the
/// density scaling of the Welch estimator.
pub fn shaped_noise<R: Rng>(
    num_samples: usize,
    sample_rate: f64,
    density: f64,
    shape: &BandShape,
    rng: &mut R,
) -> Vec<IQSample> {
    if num_samples == 0 || density <= 0.0 {
        return vec![Complex::new(0.0, 0.0); num_samples];
    }

    let m = num_samples as f64;
    let resolution = sample_rate / m;
    let mut spectrum = vec![Complex::new(0.0, 0.0); num_samples];
    let mut occupied = 0usize;

    for (j, bin) in spectrum.iter_mut().enumerate() {
        // Unshifted FFT order: upper half holds negative frequencies
        let freq = if j < num_samples / 2 {
            j as f64 * resolution
        } else {
            (j as f64 - m) * resolution
        };
        let level_db = shape.level_db(freq);
        if level_db < NEGLIGIBLE_DB {
            continue;
        }

        let target = density * 10f64.powf(level_db / 10.0);
        // E|X|² = M · fs · S(f) so that (1/M) IFFT has power ∫S df
        let scale = (m * sample_rate * target / 2.0).sqrt();
        let re: f64 = rng.sample(StandardNormal);
        let im: f64 = rng.sample(StandardNormal);
        *bin = Complex::new(re * scale, im * scale);
        occupied += 1;
    }

    let mut fft = FftProcessor::new(num_samples);
    fft.ifft_inplace(&mut spectrum);

    debug!(num_samples, occupied, density, "shaped noise synthesized");
    spectrum
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mean_power(samples: &[IQSample]) -> f64 {
        samples.iter().map(|s| s.norm_sqr()).sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn test_tone_power_and_frequency() {
        let samples = tone(1000, 1000.0, 48_000.0, 0.5, 0.0);
        assert!((mean_power(&samples) - 0.25).abs() < 1e-12);

        let step = (samples[1] * samples[0].conj()).arg();
        assert!((step - 2.0 * PI * 1000.0 / 48_000.0).abs() < 1e-12);
    }

    #[test]
    fn test_band_shape() {
        let shape = BandShape::new(0.0, 87_500.0, 40.0);
        assert_eq!(shape.level_db(0.0), 0.0);
        assert_eq!(shape.level_db(-87_500.0), 0.0);
        assert!((shape.level_db(97_500.0) + 4.0).abs() < 1e-12);
        assert!((shape.half_width_at(-3.0) - 95_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_shaped_noise_power_matches_density() {
        // Flat top 200 kHz wide with steep skirts at 1 MHz sample rate
        let shape = BandShape::new(0.0, 100_000.0, 1_000.0);
        let density = 1e-4;
        let mut rng = StdRng::seed_from_u64(3);
        let noise = shaped_noise(1 << 16, 1e6, density, &shape, &mut rng);

        // ∫S df = density × (flat width + two exponential skirts)
        let skirt = 2.0 * 10.0 / std::f64::consts::LN_10 * 100e3 / 1_000.0;
        let expected = density * (200_000.0 + skirt);
        let measured = mean_power(&noise);
        assert!(
            (measured - expected).abs() / expected < 0.05,
            "measured {} expected {}",
            measured,
            expected
        );
    }

    #[test]
    fn test_zero_density_is_silent() {
        let mut rng = StdRng::seed_from_u64(1);
        let shape = BandShape::new(0.0, 1.0, 1.0);
        let noise = shaped_noise(64, 1e3, 0.0, &shape, &mut rng);
        assert!(noise.iter().all(|s| s.norm() == 0.0));
    }
}
