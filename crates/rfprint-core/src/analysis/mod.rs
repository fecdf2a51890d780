//! Spectral Analysis Module
//!
//! The metric extractors behind a fingerprint. Each one is a small
//! parameter struct with a pure method over one shared
//! [`PowerSpectralDensity`](spectrum::PowerSpectralDensity):
//!
//! - **Spectrum**: Welch PSD with windowing, overlap and density scaling
//! - **Peaks**: log-domain parabolic carrier location
//! - **Noise floor**: minimum power averaging outside a guard band
//! - **Carrier**: bandwidth-matched carrier-to-noise ratio
//! - **Bandwidth**: interpolated half-power width
//! - **Adjacent**: tuned channel vs. fixed-offset neighbour channels
//! - **Rolloff**: left/right skirt slopes and their asymmetry
//!
//! ## Example
//!
//! ```rust,no_run
//! use rfprint_core::analysis::{PeakLocator, WelchEstimator};
//! use rfprint_core::types::IQSample;
//!
//! let samples: Vec<IQSample> = vec![]; // Your I/Q samples
//! let mut welch = WelchEstimator::new(4096);
//! let psd = welch.estimate(&samples, 2.4e6).unwrap();
//! let peak = PeakLocator::new().locate(&psd);
//! println!("Carrier at {:+.1} Hz", peak.baseband_freq_hz);
//! ```

pub mod adjacent;
pub mod bandwidth;
pub mod carrier;
pub mod noise_floor;
pub mod peaks;
pub mod rolloff;
pub mod spectrum;

pub use adjacent::{AdjacentChannelAnalyzer, AdjacentRejection};
pub use bandwidth::{Bandwidth, BandwidthMeasurer};
pub use carrier::{CarrierToNoise, CnrCalculator};
pub use noise_floor::{NoiseFloor, NoiseFloorEstimator};
pub use peaks::{PeakEstimate, PeakLocator};
pub use rolloff::{Rolloff, RolloffAnalyzer};
pub use spectrum::{BinWindow, PowerSpectralDensity, WelchEstimator, WindowFunction};
