//! FM broadcast scenario
//!
//! A wideband FM station seen through a receiver is, spectrally, a
//! flat-topped pedestal with steep skirts plus a residual carrier line, on
//! top of white receiver noise. This module composes exactly that.
//!
//! ```text
//!            carrier (+offset)
//!                 |
//!          ┌──────┴──────┐        adjacent station (optional)
//!         ╱   pedestal    ╲           ┌────┐
//!  ──────╯                 ╰─────────╯      ╰──── white noise
//!       -95k     0      +95k        +200k
//! ```
//!
//! `snr_db` is the pedestal density over the white-noise density, which is
//! what a carrier window placed inside the flat top measures.

use crate::channel::{Channel, ChannelConfig, ChannelModel};
use crate::synth::{mix_into, shaped_noise, tone, BandShape};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rfprint_core::capture::IqCapture;
use rfprint_core::types::FingerprintResult;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A second station at a fixed offset from the first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjacentInterferer {
    /// Centre offset from the wanted station (Hz)
    pub offset_hz: f64,
    /// Pedestal density relative to the wanted station (dB)
    pub relative_db: f64,
}

/// Parameters of a synthetic FM capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmScenario {
    pub sample_rate_hz: f64,
    pub duration_sec: f64,
    /// Tuner centre frequency stamped on the capture
    pub center_freq_hz: f64,
    /// Where the station actually is, relative to the tuner centre
    pub carrier_offset_hz: f64,
    /// Pedestal density (power/Hz)
    pub pedestal_density: f64,
    /// Residual carrier power relative to the pedestal power in 1 kHz (dB)
    pub carrier_power_ratio_db: f64,
    /// Half-width of the pedestal's flat top (Hz)
    pub flat_half_width_hz: f64,
    /// Skirt decay outside the flat top (dB per 100 kHz)
    pub skirt_db_per_100khz: f64,
    /// Pedestal density over white-noise density (dB)
    pub snr_db: f64,
    pub adjacent: Option<AdjacentInterferer>,
    pub seed: u64,
}

impl Default for FmScenario {
    /// A 190 kHz station 123 Hz above 105.9 MHz at 28 dB SNR
    fn default() -> Self {
        Self {
            sample_rate_hz: 2.4e6,
            duration_sec: 3.0,
            center_freq_hz: 105.9e6,
            carrier_offset_hz: 123.0,
            pedestal_density: 1e-6,
            carrier_power_ratio_db: -2.0,
            flat_half_width_hz: 87_500.0,
            skirt_db_per_100khz: 40.0,
            snr_db: 28.0,
            adjacent: None,
            seed: 0x5eed,
        }
    }
}

impl FmScenario {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_duration(mut self, duration_sec: f64) -> Self {
        self.duration_sec = duration_sec;
        self
    }

    pub fn with_snr(mut self, snr_db: f64) -> Self {
        self.snr_db = snr_db;
        self
    }

    pub fn with_adjacent(mut self, offset_hz: f64, relative_db: f64) -> Self {
        self.adjacent = Some(AdjacentInterferer {
            offset_hz,
            relative_db,
        });
        self
    }

    pub fn num_samples(&self) -> usize {
        (self.duration_sec * self.sample_rate_hz).round().max(0.0) as usize
    }

    /// Pedestal shape centred on the station
    pub fn band_shape(&self) -> BandShape {
        BandShape::new(
            self.carrier_offset_hz,
            self.flat_half_width_hz,
            self.skirt_db_per_100khz,
        )
    }

    /// 3 dB width of the pedestal alone
    pub fn nominal_bandwidth_hz(&self) -> f64 {
        2.0 * self.band_shape().half_width_at(-3.0)
    }

    /// White-noise density implied by `snr_db`
    pub fn noise_density(&self) -> f64 {
        self.pedestal_density * 10f64.powf(-self.snr_db / 10.0)
    }

    /// Residual carrier power
    pub fn carrier_power(&self) -> f64 {
        self.pedestal_density * 1e3 * 10f64.powf(self.carrier_power_ratio_db / 10.0)
    }

    /// Synthesize the capture
    pub fn generate(&self, capture_id: impl Into<String>) -> FingerprintResult<IqCapture> {
        let n = self.num_samples();
        let fs = self.sample_rate_hz;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut samples = shaped_noise(n, fs, self.pedestal_density, &self.band_shape(), &mut rng);
        let carrier = tone(n, self.carrier_offset_hz, fs, self.carrier_power().sqrt(), 0.0);
        mix_into(&mut samples, &carrier);

        if let Some(adjacent) = self.adjacent {
            let offset = self.carrier_offset_hz + adjacent.offset_hz;
            let gain = 10f64.powf(adjacent.relative_db / 10.0);
            let shape = BandShape::new(offset, self.flat_half_width_hz, self.skirt_db_per_100khz);
            let pedestal = shaped_noise(n, fs, self.pedestal_density * gain, &shape, &mut rng);
            mix_into(&mut samples, &pedestal);
            let line = tone(n, offset, fs, (self.carrier_power() * gain).sqrt(), 0.0);
            mix_into(&mut samples, &line);
        }

        let mut receiver = Channel::new(ChannelConfig {
            model: ChannelModel::Awgn,
            sample_rate: fs,
            seed: Some(self.seed.wrapping_add(1)),
            ..Default::default()
        });
        receiver.add_noise(&mut samples, self.noise_density() * fs);

        info!(
            samples = n,
            center_freq_hz = self.center_freq_hz,
            carrier_offset_hz = self.carrier_offset_hz,
            snr_db = self.snr_db,
            adjacent = self.adjacent.is_some(),
            "FM scenario generated"
        );

        IqCapture::new(capture_id, samples, fs, self.center_freq_hz)
    }
}
