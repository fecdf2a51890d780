//! Channel Models for Synthetic Captures
//!
//! Receiver-side impairments applied to a clean baseband signal before it is
//! handed to the fingerprint engine.
//!
//! ## SNR reference bandwidth
//!
//! By default `snr_db` compares signal power with the total noise power over
//! the whole sampled band, the usual convention for a channel simulator. A
//! spectral measurement such as CNR integrates noise over a much narrower
//! window, so `noise_bandwidth_hz` lets the SNR be stated against that
//! window instead:
//!
//! ```text
//!   total noise = signal_power / snr × (sample_rate / noise_bandwidth)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use rfprint_sim::channel::{Channel, ChannelConfig};
//! use rfprint_core::types::Complex;
//!
//! let config = ChannelConfig {
//!     seed: Some(7),
//!     ..ChannelConfig::with_snr(10.0)
//! };
//! let clean: Vec<Complex> = vec![Complex::new(1.0, 0.0); 100];
//!
//! let mut channel = Channel::new(config);
//! let noisy = channel.apply(&clean);
//! assert_eq!(noisy.len(), clean.len());
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rfprint_core::types::{Complex, IQSample};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Channel model type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelModel {
    /// Perfect channel (no impairments)
    Ideal,
    /// Additive White Gaussian Noise only
    #[default]
    Awgn,
    /// Frequency offset followed by AWGN
    AwgnWithCfo,
}

/// Channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub model: ChannelModel,
    /// Signal-to-noise ratio in dB
    pub snr_db: f64,
    /// Carrier frequency offset in Hz
    pub cfo_hz: f64,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Attenuation applied to the signal before noise (dB)
    pub path_loss_db: f64,
    /// Bandwidth the SNR is referenced to; `None` means the full sampled band
    pub noise_bandwidth_hz: Option<f64>,
    /// RNG seed; `None` draws from system entropy
    pub seed: Option<u64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            model: ChannelModel::Awgn,
            snr_db: 20.0,
            cfo_hz: 0.0,
            sample_rate: 2_400_000.0,
            path_loss_db: 0.0,
            noise_bandwidth_hz: None,
            seed: None,
        }
    }
}

impl ChannelConfig {
    /// AWGN at the given full-band SNR
    pub fn with_snr(snr_db: f64) -> Self {
        Self {
            snr_db,
            ..Default::default()
        }
    }

    /// Frequency offset plus AWGN
    pub fn with_cfo(snr_db: f64, cfo_hz: f64) -> Self {
        Self {
            model: ChannelModel::AwgnWithCfo,
            snr_db,
            cfo_hz,
            ..Default::default()
        }
    }

    /// AWGN with the SNR stated over `noise_bandwidth_hz` of a capture
    /// sampled at `sample_rate`
    pub fn with_snr_in_bandwidth(snr_db: f64, noise_bandwidth_hz: f64, sample_rate: f64) -> Self {
        Self {
            snr_db,
            sample_rate,
            noise_bandwidth_hz: Some(noise_bandwidth_hz),
            ..Default::default()
        }
    }

    /// Total noise power to add for a signal of the given mean power
    pub fn noise_power_for(&self, signal_power: f64) -> f64 {
        let snr_linear = 10.0_f64.powf(self.snr_db / 10.0);
        let in_band = signal_power / snr_linear;
        match self.noise_bandwidth_hz {
            Some(bw) if bw > 0.0 => in_band * self.sample_rate / bw,
            _ => in_band,
        }
    }
}

/// Channel simulator
#[derive(Debug)]
pub struct Channel {
    config: ChannelConfig,
    rng: StdRng,
    /// Phase accumulator for CFO simulation
    cfo_phase: f64,
}

impl Channel {
    pub fn new(config: ChannelConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            cfo_phase: 0.0,
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Apply channel effects to samples
    pub fn apply(&mut self, samples: &[IQSample]) -> Vec<IQSample> {
        let mut output = samples.to_vec();
        self.apply_in_place(&mut output);
        output
    }

    /// Apply channel effects without allocating
    pub fn apply_in_place(&mut self, samples: &mut [IQSample]) {
        match self.config.model {
            ChannelModel::Ideal => {}
            ChannelModel::Awgn => self.apply_awgn(samples),
            ChannelModel::AwgnWithCfo => {
                self.apply_cfo(samples);
                self.apply_awgn(samples);
            }
        }
    }

    /// Add complex Gaussian noise of the given total power
    pub fn add_noise(&mut self, samples: &mut [IQSample], noise_power: f64) {
        if noise_power <= 0.0 {
            return;
        }
        // Half the power in each of I and Q
        let std_dev = (noise_power / 2.0).sqrt();
        for s in samples.iter_mut() {
            let i: f64 = StandardNormal.sample(&mut self.rng);
            let q: f64 = StandardNormal.sample(&mut self.rng);
            *s += Complex::new(i * std_dev, q * std_dev);
        }
    }

    fn apply_awgn(&mut self, samples: &mut [IQSample]) {
        if samples.is_empty() {
            return;
        }
        let gain = 10.0_f64.powf(-self.config.path_loss_db / 20.0);
        for s in samples.iter_mut() {
            *s *= gain;
        }

        let signal_power = samples.iter().map(|s| s.norm_sqr()).sum::<f64>() / samples.len() as f64;
        let noise_power = self.config.noise_power_for(signal_power);
        self.add_noise(samples, noise_power);
    }

    fn apply_cfo(&mut self, samples: &mut [IQSample]) {
        let step = 2.0 * PI * self.config.cfo_hz / self.config.sample_rate;
        for s in samples.iter_mut() {
            *s *= Complex::from_polar(1.0, self.cfo_phase);
            self.cfo_phase = (self.cfo_phase + step) % (2.0 * PI);
        }
    }
}

/// Measured impairment between a clean and a noisy signal
#[derive(Debug, Clone)]
pub struct ChannelStats {
    pub signal_power: f64,
    pub noise_power: f64,
    pub measured_snr_db: f64,
}

impl ChannelStats {
    pub fn compute(clean: &[IQSample], noisy: &[IQSample]) -> Self {
        let n = clean.len().max(1) as f64;
        let signal_power = clean.iter().map(|s| s.norm_sqr()).sum::<f64>() / n;
        let noise_power = clean
            .iter()
            .zip(noisy)
            .map(|(c, y)| (y - c).norm_sqr())
            .sum::<f64>()
            / n;

        Self {
            signal_power,
            noise_power,
            measured_snr_db: rfprint_core::types::ratio_db(signal_power, noise_power),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_carrier(n: usize) -> Vec<IQSample> {
        vec![Complex::new(1.0, 0.0); n]
    }

    #[test]
    fn test_awgn_full_band_snr() {
        let config = ChannelConfig {
            seed: Some(1),
            ..ChannelConfig::with_snr(10.0)
        };
        let clean = unit_carrier(100_000);
        let noisy = Channel::new(config).apply(&clean);

        let stats = ChannelStats::compute(&clean, &noisy);
        assert!(
            (stats.measured_snr_db - 10.0).abs() < 0.1,
            "measured {} dB",
            stats.measured_snr_db
        );
    }

    #[test]
    fn test_snr_in_bandwidth_scales_noise() {
        let config = ChannelConfig::with_snr_in_bandwidth(20.0, 100e3, 2.4e6);
        // 1/100 of the signal in 100 kHz, 24x that over 2.4 MHz
        assert!((config.noise_power_for(1.0) - 0.24).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let config = ChannelConfig {
            seed: Some(42),
            ..ChannelConfig::with_snr(5.0)
        };
        let clean = unit_carrier(256);
        let a = Channel::new(config).apply(&clean);
        let b = Channel::new(config).apply(&clean);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cfo_channel() {
        let config = ChannelConfig {
            sample_rate: 125_000.0,
            ..ChannelConfig::with_cfo(100.0, 1000.0)
        };
        let output = Channel::new(config).apply(&unit_carrier(1000));

        // 2π × 1000 / 125000 ≈ 0.05 rad per sample
        let phase_diff = (output[1].arg() - output[0].arg()).abs();
        assert!(phase_diff > 0.01, "phase step {}", phase_diff);
        for sample in &output {
            assert!((sample.norm() - 1.0).abs() < 0.01, "magnitude should be preserved");
        }
    }

    #[test]
    fn test_ideal_channel() {
        let config = ChannelConfig {
            model: ChannelModel::Ideal,
            ..Default::default()
        };
        let samples: Vec<IQSample> = (0..100).map(|i| Complex::new(i as f64, 0.0)).collect();
        assert_eq!(Channel::new(config).apply(&samples), samples);
    }
}
