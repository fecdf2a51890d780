//! Determinism, adjacent-channel sign, rolloff symmetry and degenerate input

use rfprint_core::{EngineConfig, FingerprintEngine, IqCapture, QualityFlag};
use rfprint_sim::{mix_into, tone, Channel, ChannelConfig, FmScenario};

const SAMPLE_RATE: f64 = 2.4e6;

fn engine() -> FingerprintEngine {
    FingerprintEngine::new(EngineConfig::default()).unwrap()
}

#[test]
fn test_bandwidth_is_bit_identical_across_runs() {
    let capture = FmScenario::default()
        .with_duration(0.5)
        .with_seed(21)
        .generate("repeat")
        .unwrap();
    let engine = engine();

    let first = engine.fingerprint(&capture).unwrap();
    for _ in 0..3 {
        let again = engine.fingerprint(&capture).unwrap();
        assert_eq!(first.bandwidth_3db_hz.to_bits(), again.bandwidth_3db_hz.to_bits());
        assert_eq!(first.cnr_db.to_bits(), again.cnr_db.to_bits());
        assert_eq!(first.quality_flags, again.quality_flags);
    }
    assert!(first.bandwidth_3db_hz > 0.0);
}

#[test]
fn test_stronger_tone_at_offset_gives_negative_rejection() {
    let n = 600_000;
    let mut samples = tone(n, 0.0, SAMPLE_RATE, 0.3, 0.0);
    mix_into(&mut samples, &tone(n, 200e3, SAMPLE_RATE, 1.0, 1.0));
    let mut channel = Channel::new(ChannelConfig {
        seed: Some(9),
        ..ChannelConfig::with_snr(30.0)
    });
    let capture = IqCapture::new("two-tones", channel.apply(&samples), SAMPLE_RATE, 100e6).unwrap();

    let record = engine().fingerprint(&capture).unwrap();
    // The locator follows the stronger tone; the rejection stays on the tuned channel
    assert!(
        (record.freq_error_hz - 200e3).abs() < 1e3,
        "peak error {:.1} Hz",
        record.freq_error_hz
    );
    assert!(
        record.adjacent_rejection_db < 0.0,
        "rejection {:.2} dB should be negative",
        record.adjacent_rejection_db
    );
}

#[test]
fn test_stronger_neighbour_station_gives_negative_rejection() {
    let capture = FmScenario::default()
        .with_duration(0.5)
        .with_adjacent(200e3, 6.0)
        .generate("neighbour")
        .unwrap();

    let record = engine().fingerprint(&capture).unwrap();
    assert!(
        record.adjacent_rejection_db < 0.0,
        "rejection {:.2} dB",
        record.adjacent_rejection_db
    );
}

#[test]
fn test_symmetric_passband_has_unit_asymmetry() {
    let scenario = FmScenario {
        flat_half_width_hz: 60e3,
        snr_db: 60.0,
        ..FmScenario::default().with_duration(1.0).with_seed(4)
    };
    let record = engine().fingerprint(&scenario.generate("symmetric").unwrap()).unwrap();

    assert!(
        (0.9..=1.1).contains(&record.rolloff_asymmetry),
        "asymmetry {:.3} (L {:.2}, R {:.2})",
        record.rolloff_asymmetry,
        record.rolloff_left_slope_db_per_100khz,
        record.rolloff_right_slope_db_per_100khz
    );
    assert!(record.rolloff_left_slope_db_per_100khz > 30.0);
    assert!(!record.quality_flags.contains(QualityFlag::FlatRolloff));
}

#[test]
fn test_all_zero_buffer_is_degenerate_not_an_error() {
    let capture = IqCapture::from_interleaved("silence", &vec![0.0f32; 2 * 50_000], SAMPLE_RATE, 88.5e6).unwrap();
    let record = engine().fingerprint(&capture).unwrap();

    assert!(record.quality_flags.contains(QualityFlag::DegenerateNoiseFloor));
    assert_eq!(record.cnr_db, f64::INFINITY);
    for (name, value) in [
        ("peak_freq_hz", record.peak_freq_hz),
        ("cnr_db", record.cnr_db),
        ("bandwidth_3db_hz", record.bandwidth_3db_hz),
        ("adjacent_rejection_db", record.adjacent_rejection_db),
        ("rolloff_left_slope", record.rolloff_left_slope_db_per_100khz),
        ("rolloff_right_slope", record.rolloff_right_slope_db_per_100khz),
        ("rolloff_asymmetry", record.rolloff_asymmetry),
        ("confidence", record.confidence),
    ] {
        assert!(!value.is_nan(), "{} is NaN", name);
    }
}

#[test]
fn test_short_capture_is_the_only_error() {
    let capture = IqCapture::from_interleaved("tiny", &[0.0f32; 2 * 4095], SAMPLE_RATE, 88.5e6).unwrap();
    assert!(engine().fingerprint(&capture).is_err());
}
