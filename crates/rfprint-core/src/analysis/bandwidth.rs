//! Half-power (-3 dB) bandwidth
//!
//! Walks outward from the peak bin on each side until the density drops
//! below half the peak density, then interpolates linearly between the last
//! bin above and the first bin below to place the crossing between bins.
//! The walk is a plain ordered loop, so identical spectra always give
//! bit-identical widths.

use crate::analysis::peaks::PeakEstimate;
use crate::analysis::spectrum::PowerSpectralDensity;
use crate::config::EngineConfig;
use crate::quality::{Metric, QualityFlag, QualityFlags};
use tracing::trace;

/// Measured occupied bandwidth
#[derive(Debug, Clone, PartialEq)]
pub struct Bandwidth {
    /// Right minus left crossing; zero when unresolved
    pub bandwidth_hz: f64,
    /// Baseband frequency of the lower crossing, if found
    pub left_crossing_hz: Option<f64>,
    /// Baseband frequency of the upper crossing, if found
    pub right_crossing_hz: Option<f64>,
    pub flags: QualityFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Down,
    Up,
}

/// Outcome of walking one side
enum Walk {
    Crossed(f64),
    /// Search span exhausted
    NotFound,
    /// Spectrum ended first
    HitEdge,
}

#[derive(Debug, Clone, Copy)]
pub struct BandwidthMeasurer {
    search_hz: f64,
}

impl Default for BandwidthMeasurer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl BandwidthMeasurer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            search_hz: config.bandwidth_search_hz,
        }
    }

    /// Set how far either side of the peak to search
    pub fn with_search(mut self, search_hz: f64) -> Self {
        self.search_hz = search_hz;
        self
    }

    pub fn measure(&self, psd: &PowerSpectralDensity, peak: &PeakEstimate) -> Bandwidth {
        let threshold = peak.peak_density / 2.0;
        let max_steps = psd.bins_within(self.search_hz);

        let left = walk(psd, peak.bin, threshold, max_steps, Direction::Down);
        let right = walk(psd, peak.bin, threshold, max_steps, Direction::Up);

        let mut flags = QualityFlags::new();
        if matches!(left, Walk::HitEdge) || matches!(right, Walk::HitEdge) {
            flags.insert(QualityFlag::WindowOutOfRange(Metric::Bandwidth));
        }

        let (left_crossing_hz, right_crossing_hz) = match (left, right) {
            (Walk::Crossed(l), Walk::Crossed(r)) => (Some(l), Some(r)),
            (Walk::Crossed(l), _) => (Some(l), None),
            (_, Walk::Crossed(r)) => (None, Some(r)),
            _ => (None, None),
        };

        let bandwidth_hz = match (left_crossing_hz, right_crossing_hz) {
            (Some(l), Some(r)) => r - l,
            _ => {
                flags.insert(QualityFlag::BandwidthUnresolved);
                0.0
            }
        };

        trace!(
            threshold,
            ?left_crossing_hz,
            ?right_crossing_hz,
            bandwidth_hz,
            "bandwidth measured"
        );

        Bandwidth {
            bandwidth_hz,
            left_crossing_hz,
            right_crossing_hz,
            flags,
        }
    }
}

fn walk(
    psd: &PowerSpectralDensity,
    start: usize,
    threshold: f64,
    max_steps: usize,
    direction: Direction,
) -> Walk {
    let power = psd.power();
    let freqs = psd.frequencies();
    let bin_width = psd.bin_width_hz();

    let mut prev = start;
    for _ in 0..max_steps {
        let next = match direction {
            Direction::Down => match prev.checked_sub(1) {
                Some(i) => i,
                None => return Walk::HitEdge,
            },
            Direction::Up if prev + 1 < power.len() => prev + 1,
            Direction::Up => return Walk::HitEdge,
        };

        if power[next] < threshold {
            let drop = power[prev] - power[next];
            let frac = if drop > 0.0 {
                ((power[prev] - threshold) / drop).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let step = frac * bin_width;
            return Walk::Crossed(match direction {
                Direction::Down => freqs[prev] - step,
                Direction::Up => freqs[prev] + step,
            });
        }
        prev = next;
    }

    Walk::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::peaks::PeakLocator;

    /// 1 Hz bins, DC at len/2
    fn psd_from(power: Vec<f64>) -> PowerSpectralDensity {
        let n = power.len() as f64;
        PowerSpectralDensity::from_parts(power, n).unwrap()
    }

    fn measure(power: Vec<f64>, search: f64) -> Bandwidth {
        let psd = psd_from(power);
        let peak = PeakLocator::new().locate(&psd);
        BandwidthMeasurer::default()
            .with_search(search)
            .measure(&psd, &peak)
    }

    #[test]
    fn test_triangle_interpolates_exactly() {
        // Linear slopes: density 1 - |f|/20, so half power sits at ±10 Hz
        let power: Vec<f64> = (0..128)
            .map(|i| {
                let f = i as f64 - 64.0;
                (1.0 - f.abs() / 20.0).max(0.0)
            })
            .collect();
        let bw = measure(power, 50.0);

        assert!((bw.left_crossing_hz.unwrap() + 10.0).abs() < 1e-9);
        assert!((bw.right_crossing_hz.unwrap() - 10.0).abs() < 1e-9);
        assert!((bw.bandwidth_hz - 20.0).abs() < 1e-9);
        assert!(bw.flags.is_empty());
    }

    #[test]
    fn test_sub_bin_crossing() {
        let mut power = vec![0.0; 64];
        power[31] = 0.8;
        power[32] = 1.0;
        power[33] = 0.6;
        // Left: 0.8 -> 0.0 crosses 0.5 at 3/8 bin past bin 31
        // Right: 0.6 -> 0.0 crosses 0.5 at 1/6 bin past bin 33
        let bw = measure(power, 20.0);
        assert!((bw.left_crossing_hz.unwrap() - (-1.0 - 0.375)).abs() < 1e-12);
        assert!((bw.right_crossing_hz.unwrap() - (1.0 + 1.0 / 6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_unresolved_within_search() {
        // Plateau wider than the search span
        let mut power = vec![0.1; 256];
        for p in &mut power[28..228] {
            *p = 1.0;
        }
        power[128] = 1.2;
        let bw = measure(power, 20.0);
        assert_eq!(bw.bandwidth_hz, 0.0);
        assert!(bw.flags.contains(QualityFlag::BandwidthUnresolved));
        assert!(!bw.flags.window_out_of_range(Metric::Bandwidth));
    }

    #[test]
    fn test_unresolved_at_edge() {
        let mut power = vec![1.0; 64];
        power[60] = 1.5;
        for p in &mut power[..40] {
            *p = 0.1;
        }
        let bw = measure(power, 100.0);
        assert_eq!(bw.bandwidth_hz, 0.0);
        assert!(bw.left_crossing_hz.is_some());
        assert!(bw.right_crossing_hz.is_none());
        assert!(bw.flags.contains(QualityFlag::BandwidthUnresolved));
        assert!(bw.flags.window_out_of_range(Metric::Bandwidth));
    }

    #[test]
    fn test_all_zero_is_unresolved() {
        let bw = measure(vec![0.0; 64], 10.0);
        assert_eq!(bw.bandwidth_hz, 0.0);
        assert!(bw.flags.contains(QualityFlag::BandwidthUnresolved));
    }

    #[test]
    fn test_repeatable() {
        let power: Vec<f64> = (0..512)
            .map(|i| 1.0 / (1.0 + ((i as f64 - 250.3) / 17.0).powi(4)))
            .collect();
        let a = measure(power.clone(), 200.0);
        let b = measure(power, 200.0);
        assert_eq!(a.bandwidth_hz.to_bits(), b.bandwidth_hz.to_bits());
    }
}
