//! Carrier-to-Noise Ratio
//!
//! Carrier power is integrated over a fixed window around the peak; the
//! noise density is scaled by exactly the same bandwidth before the two are
//! compared, so the ratio is independent of bin width.

use crate::analysis::noise_floor::NoiseFloor;
use crate::analysis::peaks::PeakEstimate;
use crate::analysis::spectrum::PowerSpectralDensity;
use crate::config::EngineConfig;
use crate::quality::{Metric, QualityFlag, QualityFlags};
use crate::types::ratio_db;
use tracing::trace;

/// Bandwidth-matched carrier and noise powers
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierToNoise {
    /// Integrated carrier power
    pub carrier_power: f64,
    /// Noise density times the carrier window bandwidth
    pub noise_power: f64,
    /// Bandwidth both powers refer to (Hz)
    pub window_hz: f64,
    /// `+inf` when the noise floor is degenerate
    pub cnr_db: f64,
    pub flags: QualityFlags,
}

#[derive(Debug, Clone, Copy)]
pub struct CnrCalculator {
    half_width_hz: f64,
    low_confidence_db: f64,
}

impl Default for CnrCalculator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl CnrCalculator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            half_width_hz: config.carrier_half_width_hz,
            low_confidence_db: config.thresholds.cnr_min_db,
        }
    }

    pub fn with_half_width(mut self, half_width_hz: f64) -> Self {
        self.half_width_hz = half_width_hz;
        self
    }

    pub fn measure(
        &self,
        psd: &PowerSpectralDensity,
        peak: &PeakEstimate,
        noise: &NoiseFloor,
    ) -> CarrierToNoise {
        let mut flags = QualityFlags::new();
        let half = psd.bins_within(self.half_width_hz);
        let window = psd.window(peak.bin as isize, half);
        if window.clipped {
            flags.insert(QualityFlag::WindowOutOfRange(Metric::Carrier));
        }

        let window_hz = window.len() as f64 * psd.bin_width_hz();
        let carrier_power = psd.integrate(window);
        let noise_power = noise.density * window_hz;

        let cnr_db = if noise.is_degenerate() {
            f64::INFINITY
        } else {
            ratio_db(carrier_power, noise_power)
        };

        if cnr_db < self.low_confidence_db {
            flags.insert(QualityFlag::LowConfidence);
        }

        trace!(carrier_power, noise_power, window_hz, cnr_db, "CNR measured");

        CarrierToNoise {
            carrier_power,
            noise_power,
            window_hz,
            cnr_db,
            flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::noise_floor::NoiseFloorEstimator;
    use crate::analysis::peaks::PeakLocator;

    fn psd_with_bin_width(power: Vec<f64>, bin_width: f64) -> PowerSpectralDensity {
        let n = power.len() as f64;
        PowerSpectralDensity::from_parts(power, n * bin_width).unwrap()
    }

    fn run(psd: &PowerSpectralDensity, half_width: f64, guard: f64) -> CarrierToNoise {
        let peak = PeakLocator::new().locate(psd);
        let noise = NoiseFloorEstimator::default()
            .with_guard(guard)
            .estimate(psd, &peak);
        CnrCalculator::default()
            .with_half_width(half_width)
            .measure(psd, &peak, &noise)
    }

    #[test]
    fn test_matched_bandwidth() {
        // Flat noise density 1.0 with a 21-bin carrier plateau at density 101
        let mut power = vec![1.0; 1000];
        for p in &mut power[490..=510] {
            *p = 101.0;
        }
        power[500] = 102.0;
        let psd = psd_with_bin_width(power, 10.0);
        let cnr = run(&psd, 100.0, 150.0);

        // 21 bins × 10 Hz window on both sides of the ratio
        assert_eq!(cnr.window_hz, 210.0);
        assert!((cnr.noise_power - 210.0).abs() < 1e-9);
        let expected = 10.0 * ((20.0 * 101.0 + 102.0) * 10.0 / 210.0f64).log10();
        assert!((cnr.cnr_db - expected).abs() < 1e-9);
        assert!(cnr.flags.is_empty());
    }

    #[test]
    fn test_invariant_to_bin_width() {
        // The same continuous spectrum sampled at two resolutions
        let build = |bins: usize| {
            let bin_width = 100_000.0 / bins as f64;
            let power: Vec<f64> = (0..bins)
                .map(|i| {
                    let f = (i as f64 - (bins / 2) as f64) * bin_width;
                    if f.abs() <= 5_000.0 {
                        50.0
                    } else {
                        1.0
                    }
                })
                .collect();
            psd_with_bin_width(power, bin_width)
        };

        let coarse = run(&build(1000), 10_000.0, 15_000.0);
        let fine = run(&build(4000), 10_000.0, 15_000.0);
        assert!(
            (coarse.cnr_db - fine.cnr_db).abs() < 0.1,
            "coarse {} fine {}",
            coarse.cnr_db,
            fine.cnr_db
        );
    }

    #[test]
    fn test_low_confidence() {
        let mut power = vec![1.0; 400];
        power[200] = 3.0;
        let psd = psd_with_bin_width(power, 1.0);
        let cnr = run(&psd, 5.0, 20.0);
        assert!(cnr.cnr_db < 18.0);
        assert!(cnr.flags.contains(QualityFlag::LowConfidence));
    }

    #[test]
    fn test_degenerate_noise_gives_infinity() {
        let mut power = vec![0.0; 400];
        power[200] = 1.0;
        let psd = psd_with_bin_width(power, 1.0);
        let cnr = run(&psd, 5.0, 20.0);
        assert_eq!(cnr.cnr_db, f64::INFINITY);
        assert!(!cnr.flags.contains(QualityFlag::LowConfidence));
    }

    #[test]
    fn test_clipped_window_is_flagged() {
        let mut power = vec![1.0; 400];
        power[2] = 1e4;
        let psd = psd_with_bin_width(power, 1.0);
        let cnr = run(&psd, 5.0, 20.0);
        assert!(cnr.flags.window_out_of_range(Metric::Carrier));
        // Bins 0..=7 only
        assert_eq!(cnr.window_hz, 8.0);
        assert!(cnr.cnr_db.is_finite());
    }
}
