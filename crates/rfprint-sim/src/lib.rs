//! # rfprint Simulation
//!
//! Synthetic baseband captures with known ground truth, for exercising the
//! fingerprint engine without a receiver.
//!
//! - **channel**: AWGN and frequency-offset impairments, seeded or entropic
//! - **synth**: tones and spectrally shaped Gaussian noise
//! - **scenario**: a complete FM broadcast capture with optional neighbour
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rfprint_core::{EngineConfig, FingerprintEngine};
//! use rfprint_sim::FmScenario;
//!
//! let capture = FmScenario::default().generate("synthetic-105.9")?;
//! let engine = FingerprintEngine::new(EngineConfig::default())?;
//! let record = engine.fingerprint(&capture)?;
//! assert!(record.is_reliable());
//! # Ok::<(), rfprint_core::FingerprintError>(())
//! ```

pub mod channel;
pub mod scenario;
pub mod synth;

// Re-exports
pub use channel::{Channel, ChannelConfig, ChannelModel, ChannelStats};
pub use scenario::{AdjacentInterferer, FmScenario};
pub use synth::{mix_into, shaped_noise, tone, BandShape};
