//! rfprint Command-Line Interface
//!
//! Batch driver around the fingerprint engine:
//! - Fingerprinting raw IQ captures in parallel
//! - Reporting frequency drift across captures of the same station
//! - Writing synthetic FM captures for testing receivers and tooling

mod iq_file;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use iq_file::IqFormat;
use rayon::prelude::*;
use rfprint_core::{
    EngineConfig, FingerprintEngine, FingerprintRecord, IqCapture, StationHistory, WindowFunction,
};
use rfprint_sim::FmScenario;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "rfprint")]
#[command(author, version, about = "Spectral fingerprinting for broadcast IQ captures", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fingerprint one or more raw IQ captures
    Fingerprint {
        /// Capture files (interleaved I/Q)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Sample rate in Hz
        #[arg(short = 'r', long, default_value = "2400000")]
        sample_rate: f64,

        /// Tuner centre frequency the captures were recorded at (Hz)
        #[arg(short = 'f', long)]
        center_freq: f64,

        /// Sample encoding (default: from file extension, else cf32)
        #[arg(long, value_enum)]
        format: Option<IqFormat>,

        /// Engine configuration (JSON); missing fields take defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Welch segment length, overrides the config file
        #[arg(long)]
        segment_len: Option<usize>,

        /// Window function: none, hann, hamming, blackman, blackman-harris, flat-top
        #[arg(long)]
        window: Option<WindowFunction>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output_format: OutputFormat,

        /// Write records here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads (default: one per CPU)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Write a synthetic FM broadcast capture
    #[command(allow_negative_numbers = true)]
    Simulate {
        /// Output file
        #[arg(short, long, default_value = "fm_capture.cf32")]
        output: PathBuf,

        /// Sample encoding
        #[arg(long, value_enum, default_value_t = IqFormat::Cf32)]
        format: IqFormat,

        /// Sample rate in Hz
        #[arg(short = 'r', long, default_value = "2400000")]
        sample_rate: f64,

        /// Capture length in seconds
        #[arg(short, long, default_value = "1.0")]
        duration: f64,

        /// Tuner centre frequency (Hz)
        #[arg(short = 'f', long, default_value = "105900000")]
        center_freq: f64,

        /// Station offset from the tuner centre (Hz)
        #[arg(long, default_value = "123")]
        offset: f64,

        /// Pedestal over receiver noise density (dB)
        #[arg(long, default_value = "28")]
        snr: f64,

        /// Add a second station at this offset (Hz)
        #[arg(long)]
        adjacent_offset: Option<f64>,

        /// Level of the second station relative to the first (dB)
        #[arg(long, default_value = "-10")]
        adjacent_db: f64,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Arguments for the fingerprint command
struct FingerprintArgs {
    inputs: Vec<PathBuf>,
    sample_rate: f64,
    center_freq: f64,
    format: Option<IqFormat>,
    config: Option<PathBuf>,
    segment_len: Option<usize>,
    window: Option<WindowFunction>,
    output_format: OutputFormat,
    output: Option<PathBuf>,
    jobs: Option<usize>,
}

/// Load the engine configuration, then apply command-line overrides
fn load_config(
    path: Option<&Path>,
    segment_len: Option<usize>,
    window: Option<WindowFunction>,
) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str::<EngineConfig>(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if let Some(segment_len) = segment_len {
        config = config.with_segment_len(segment_len);
    }
    if let Some(window) = window {
        config = config.with_window(window);
    }
    Ok(config)
}

fn capture_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

fn fingerprint_file(
    engine: &FingerprintEngine,
    path: &Path,
    args: &FingerprintArgs,
) -> Result<FingerprintRecord> {
    let format = args.format.unwrap_or_else(|| IqFormat::from_extension(path));
    let values = iq_file::read_interleaved(path, format)?;
    let capture = IqCapture::from_interleaved(
        capture_id(path),
        &values,
        args.sample_rate,
        args.center_freq,
    )
    .with_context(|| format!("Invalid capture {}", path.display()))?;

    info!(
        file = %path.display(),
        samples = capture.len(),
        duration_sec = capture.duration_sec(),
        "Fingerprinting"
    );

    engine
        .fingerprint(&capture)
        .with_context(|| format!("Failed to fingerprint {}", path.display()))
}

fn write_records(
    sink: &mut dyn Write,
    records: &[FingerprintRecord],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for record in records {
                writeln!(sink, "{}", record.to_text())?;
                for warning in record.warnings() {
                    writeln!(sink, "  warning: {}", warning)?;
                }
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *sink, records)?;
            writeln!(sink)?;
        }
        OutputFormat::Csv => {
            writeln!(sink, "{}", FingerprintRecord::csv_header())?;
            for record in records {
                writeln!(sink, "{}", record.to_csv_row())?;
            }
        }
    }
    Ok(())
}

/// Group records by tuner frequency, one history per station
fn station_histories(records: &[FingerprintRecord]) -> BTreeMap<i64, StationHistory> {
    let mut stations: BTreeMap<i64, StationHistory> = BTreeMap::new();
    for record in records {
        stations
            .entry(record.center_freq_hz.round() as i64)
            .or_insert_with(|| StationHistory::new(record.center_freq_hz))
            .push(record);
    }
    stations
}

fn print_drift_report(records: &[FingerprintRecord], engine: &FingerprintEngine) {
    let thresholds = &engine.config().thresholds;

    for history in station_histories(records).values() {
        let Some(stats) = history.stats() else {
            continue;
        };

        eprintln!();
        eprintln!("=== Drift: {:.1} MHz ===", history.station_freq_hz() / 1e6);
        eprintln!("  Captures:          {}", stats.count);
        eprintln!("  Median peak:       {:.1} Hz", stats.median_peak_hz);
        eprintln!("  Std deviation:     {:.1} Hz", stats.std_dev_hz);
        eprintln!("  Spread:            {:.1} Hz", stats.spread_hz);
        eprintln!("  Max deviation:     {:.1} Hz", stats.max_deviation_hz);

        for record in records
            .iter()
            .filter(|r| (r.center_freq_hz - history.station_freq_hz()).abs() < 0.5)
        {
            let report = history.validate(record, thresholds);
            eprintln!(
                "  {:<24} drift {:>8.1} Hz  confidence {:>3.0}%",
                record.capture_id,
                history.drift_hz(record),
                report.confidence() * 100.0
            );
            for failed in report.failed() {
                warn!(
                    capture = %record.capture_id,
                    check = %failed.check,
                    value = failed.value,
                    "Check failed"
                );
            }
        }
    }
}

fn cmd_fingerprint(args: FingerprintArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.segment_len, args.window)?;
    let engine = FingerprintEngine::new(config).context("Invalid engine configuration")?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.unwrap_or(0))
        .build()
        .context("Failed to build worker pool")?;

    let start = Instant::now();
    let results: Vec<(&PathBuf, Result<FingerprintRecord>)> = pool.install(|| {
        args.inputs
            .par_iter()
            .map(|path| (path, fingerprint_file(&engine, path, &args)))
            .collect()
    });

    let mut records = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(record) => records.push(record),
            Err(e) => warn!(file = %path.display(), "Skipping capture: {:#}", e),
        }
    }
    let skipped = args.inputs.len() - records.len();

    let mut sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    write_records(sink.as_mut(), &records, args.output_format)?;
    sink.flush()?;

    eprintln!(
        "Fingerprinted {} of {} captures in {:.2} s ({} skipped)",
        records.len(),
        args.inputs.len(),
        start.elapsed().as_secs_f64(),
        skipped
    );
    print_drift_report(&records, &engine);

    Ok(())
}

/// Arguments for the simulate command
struct SimulateArgs {
    output: PathBuf,
    format: IqFormat,
    sample_rate: f64,
    duration: f64,
    center_freq: f64,
    offset: f64,
    snr: f64,
    adjacent_offset: Option<f64>,
    adjacent_db: f64,
    seed: Option<u64>,
}

fn cmd_simulate(args: SimulateArgs) -> Result<()> {
    let mut scenario = FmScenario {
        sample_rate_hz: args.sample_rate,
        duration_sec: args.duration,
        center_freq_hz: args.center_freq,
        carrier_offset_hz: args.offset,
        snr_db: args.snr,
        ..Default::default()
    };
    if let Some(seed) = args.seed {
        scenario = scenario.with_seed(seed);
    }
    if let Some(offset) = args.adjacent_offset {
        scenario = scenario.with_adjacent(offset, args.adjacent_db);
    }

    let capture = scenario
        .generate(capture_id(&args.output))
        .context("Failed to generate capture")?;
    iq_file::write_samples(&args.output, capture.samples(), args.format)?;

    println!("=== Synthetic FM Capture ===");
    println!("Output:            {:?}", args.output);
    println!("Format:            {:?}", args.format);
    println!("Samples:           {}", capture.len());
    println!("Sample rate:       {} Hz", scenario.sample_rate_hz);
    println!("Duration:          {:.3} s", capture.duration_sec());
    println!(
        "Station:           {:.1} Hz",
        scenario.center_freq_hz + scenario.carrier_offset_hz
    );
    println!("3 dB bandwidth:    {:.1} Hz (nominal)", scenario.nominal_bandwidth_hz());
    println!("SNR:               {} dB", scenario.snr_db);
    if let Some(adjacent) = scenario.adjacent {
        println!(
            "Adjacent station:  {:+.0} Hz at {:+.1} dB",
            adjacent.offset_hz, adjacent.relative_db
        );
    }
    println!("Seed:              {:#x}", scenario.seed);

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fingerprint {
            inputs,
            sample_rate,
            center_freq,
            format,
            config,
            segment_len,
            window,
            output_format,
            output,
            jobs,
        } => cmd_fingerprint(FingerprintArgs {
            inputs,
            sample_rate,
            center_freq,
            format,
            config,
            segment_len,
            window,
            output_format,
            output,
            jobs,
        }),

        Commands::Simulate {
            output,
            format,
            sample_rate,
            duration,
            center_freq,
            offset,
            snr,
            adjacent_offset,
            adjacent_db,
            seed,
        } => cmd_simulate(SimulateArgs {
            output,
            format,
            sample_rate,
            duration,
            center_freq,
            offset,
            snr,
            adjacent_offset,
            adjacent_db,
            seed,
        }),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    fn fingerprint_args(inputs: Vec<PathBuf>) -> FingerprintArgs {
        FingerprintArgs {
            inputs,
            sample_rate: 2.4e6,
            center_freq: 105.9e6,
            format: None,
            config: None,
            segment_len: None,
            window: None,
            output_format: OutputFormat::Json,
            output: None,
            jobs: Some(2),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fingerprint_args() {
        let cli = Cli::try_parse_from([
            "rfprint", "-vv", "fingerprint", "a.cu8", "b.cf32", "-f", "105.9e6", "--window",
            "blackman-harris", "--output-format", "csv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Fingerprint {
                inputs,
                window,
                output_format,
                sample_rate,
                ..
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(window, Some(WindowFunction::BlackmanHarris));
                assert_eq!(output_format, OutputFormat::Csv);
                assert_eq!(sample_rate, 2.4e6);
            }
            _ => panic!("expected fingerprint command"),
        }
    }

    #[test]
    fn test_config_file_with_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "segment_len": 2048, "thresholds": {{ "cnr_min_db": 12.0 }} }}"#)
            .unwrap();

        let config = load_config(Some(file.path()), None, None).unwrap();
        assert_eq!(config.segment_len, 2048);
        assert_eq!(config.thresholds.cnr_min_db, 12.0);
        assert_eq!(config.thresholds.cnr_excellent_db, 25.0);

        let config = load_config(Some(file.path()), Some(8192), Some(WindowFunction::Hamming))
            .unwrap();
        assert_eq!(config.segment_len, 8192);
        assert_eq!(config.window, WindowFunction::Hamming);
    }

    #[test]
    fn test_bad_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_config(Some(file.path()), None, None).is_err());
    }

    #[test]
    fn test_capture_id_is_file_stem() {
        assert_eq!(capture_id(Path::new("/data/2026-10-19_105.9.cu8")), "2026-10-19_105.9");
    }

    #[test]
    fn test_short_capture_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.cf32");
        let short = dir.path().join("short.cf32");

        let capture = FmScenario::default().with_duration(0.5).generate("good").unwrap();
        iq_file::write_samples(&good, capture.samples(), IqFormat::Cf32).unwrap();
        iq_file::write_samples(&short, &capture.samples()[..1000], IqFormat::Cf32).unwrap();

        let args = fingerprint_args(vec![good.clone(), short.clone()]);
        let engine = FingerprintEngine::new(EngineConfig::default()).unwrap();

        let record = fingerprint_file(&engine, &good, &args).unwrap();
        assert_eq!(record.capture_id, "good");
        assert!((record.peak_freq_hz - 105_900_123.0).abs() < 300.0);

        let err = fingerprint_file(&engine, &short, &args).unwrap_err();
        assert!(format!("{:#}", err).contains("Insufficient samples"));
    }

    #[test]
    fn test_csv_output_has_header_and_rows() {
        let capture = FmScenario::default().with_duration(0.05).generate("csv").unwrap();
        let engine = FingerprintEngine::new(EngineConfig::default()).unwrap();
        let records = vec![engine.fingerprint(&capture).unwrap()];

        let mut out = Vec::new();
        write_records(&mut out, &records, OutputFormat::Csv).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], FingerprintRecord::csv_header());
        assert!(lines[1].starts_with("csv,"));
    }

    #[test]
    fn test_json_output_is_array() {
        let capture = FmScenario::default().with_duration(0.05).generate("j").unwrap();
        let engine = FingerprintEngine::new(EngineConfig::default()).unwrap();
        let records = vec![engine.fingerprint(&capture).unwrap()];

        let mut out = Vec::new();
        write_records(&mut out, &records, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(1));
        assert_eq!(value[0]["capture_id"], "j");
    }

    #[test]
    fn test_station_histories_group_by_center() {
        let engine = FingerprintEngine::new(EngineConfig::default()).unwrap();
        let base = FmScenario::default().with_duration(0.05);
        let mut records = Vec::new();
        for (seed, center) in [(1, 105.9e6), (2, 105.9e6), (3, 98.1e6)] {
            let scenario = FmScenario {
                center_freq_hz: center,
                ..base.clone().with_seed(seed)
            };
            records.push(engine.fingerprint(&scenario.generate("s").unwrap()).unwrap());
        }

        let stations = station_histories(&records);
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[&105_900_000].len(), 2);
        assert_eq!(stations[&98_100_000].len(), 1);
    }
}
