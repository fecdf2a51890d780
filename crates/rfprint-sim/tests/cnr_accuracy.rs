//! CNR against injected SNR, and its independence from PSD resolution
//!
//! The injected SNR is stated over the engine's 100 kHz carrier window, the
//! bandwidth CNR itself is measured in.

use rfprint_core::{EngineConfig, FingerprintEngine, IqCapture, QualityFlag};
use rfprint_sim::{tone, Channel, ChannelConfig};

const SAMPLE_RATE: f64 = 2.4e6;
const CARRIER_WINDOW_HZ: f64 = 100e3;

fn capture_at(snr_db: f64, seed: u64) -> IqCapture {
    let clean = tone(1_200_000, 0.0, SAMPLE_RATE, 1.0, 0.0);
    let mut channel = Channel::new(ChannelConfig {
        seed: Some(seed),
        ..ChannelConfig::with_snr_in_bandwidth(snr_db, CARRIER_WINDOW_HZ, SAMPLE_RATE)
    });
    let noisy = channel.apply(&clean);
    IqCapture::new(format!("snr{}", snr_db), noisy, SAMPLE_RATE, 96.1e6).unwrap()
}

#[test]
fn test_cnr_tracks_injected_snr() {
    let engine = FingerprintEngine::new(EngineConfig::default()).unwrap();

    for (i, snr_db) in [10.0, 20.0, 30.0, 40.0].into_iter().enumerate() {
        let record = engine.fingerprint(&capture_at(snr_db, 11 + i as u64)).unwrap();
        assert!(
            (record.cnr_db - snr_db).abs() <= 2.0,
            "injected {} dB, measured {:.2} dB",
            snr_db,
            record.cnr_db
        );
        assert!(!record.quality_flags.contains(QualityFlag::DegenerateNoiseFloor));
    }
}

#[test]
fn test_low_snr_is_flagged() {
    let engine = FingerprintEngine::new(EngineConfig::default()).unwrap();
    let record = engine.fingerprint(&capture_at(10.0, 5)).unwrap();
    assert!(record.quality_flags.contains(QualityFlag::LowConfidence));
    assert!(!record.is_reliable());
}

#[test]
fn test_cnr_invariant_to_segment_length() {
    let short = FingerprintEngine::new(EngineConfig::default().with_segment_len(2048)).unwrap();
    let long = FingerprintEngine::new(EngineConfig::default().with_segment_len(4096)).unwrap();

    for (i, snr_db) in [20.0, 30.0].into_iter().enumerate() {
        let capture = capture_at(snr_db, 40 + i as u64);
        let a = short.fingerprint(&capture).unwrap().cnr_db;
        let b = long.fingerprint(&capture).unwrap().cnr_db;
        assert!(
            (a - b).abs() <= 0.5,
            "{} dB capture: 2048 gives {:.2} dB, 4096 gives {:.2} dB",
            snr_db,
            a,
            b
        );
    }
}
