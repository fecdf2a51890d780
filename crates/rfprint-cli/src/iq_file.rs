//! Raw interleaved IQ files
//!
//! Captures arrive as headerless little-endian `[i0, q0, i1, q1, ...]`
//! streams. Three sample encodings are common:
//!
//! | Format | Element | Scale to ±1.0 |
//! |--------|---------|---------------|
//! | `cf32` | `f32`   | none |
//! | `ci16` | `i16`   | `/ 32768` |
//! | `cu8`  | `u8`    | `(x - 127.5) / 127.5` (RTL-SDR) |

use anyhow::{bail, Context, Result};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use clap::ValueEnum;
use rfprint_core::IQSample;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

const CU8_OFFSET: f32 = 127.5;
const CI16_SCALE: f32 = 32768.0;

/// Sample encoding of a raw IQ file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum IqFormat {
    /// 32-bit float I and Q
    #[default]
    #[value(aliases = ["iq", "fc32"])]
    Cf32,
    /// Signed 16-bit I and Q
    #[value(alias = "cs16")]
    Ci16,
    /// Unsigned 8-bit I and Q, as written by rtl_sdr
    #[value(alias = "u8")]
    Cu8,
}

impl IqFormat {
    /// Bytes per scalar (half a complex sample)
    pub fn bytes_per_value(self) -> usize {
        match self {
            IqFormat::Cf32 => 4,
            IqFormat::Ci16 => 2,
            IqFormat::Cu8 => 1,
        }
    }

    /// Guess the format from a file extension, falling back to `cf32`
    pub fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ci16") | Some("cs16") => IqFormat::Ci16,
            Some("cu8") => IqFormat::Cu8,
            _ => IqFormat::Cf32,
        }
    }
}

/// Read a file as interleaved floats scaled to roughly ±1.0
///
/// Trailing bytes that do not make up a whole value are dropped with a
/// warning. An odd number of values is left for the caller to reject.
pub fn read_interleaved(path: &Path, format: IqFormat) -> Result<Vec<f32>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read IQ file {}", path.display()))?;

    let width = format.bytes_per_value();
    let usable = bytes.len() - bytes.len() % width;
    if usable != bytes.len() {
        warn!(
            file = %path.display(),
            dropped = bytes.len() - usable,
            "Ignoring trailing partial value"
        );
    }
    let bytes = &bytes[..usable];
    let count = usable / width;

    let values = match format {
        IqFormat::Cf32 => {
            let mut values = vec![0.0f32; count];
            LittleEndian::read_f32_into(bytes, &mut values);
            values
        }
        IqFormat::Ci16 => {
            let mut raw = vec![0i16; count];
            LittleEndian::read_i16_into(bytes, &mut raw);
            raw.into_iter().map(|v| v as f32 / CI16_SCALE).collect()
        }
        IqFormat::Cu8 => bytes
            .iter()
            .map(|&b| (b as f32 - CU8_OFFSET) / CU8_OFFSET)
            .collect(),
    };

    debug!(file = %path.display(), ?format, values = values.len(), "IQ file read");
    Ok(values)
}

/// Write complex samples in the given encoding
///
/// Integer formats clip values outside ±1.0.
pub fn write_samples(path: &Path, samples: &[IQSample], format: IqFormat) -> Result<()> {
    if !samples.iter().all(|s| s.re.is_finite() && s.im.is_finite()) {
        bail!("Refusing to write non-finite samples to {}", path.display());
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for sample in samples {
        for value in [sample.re, sample.im] {
            match format {
                IqFormat::Cf32 => writer.write_f32::<LittleEndian>(value as f32)?,
                IqFormat::Ci16 => {
                    let scaled = (value * CI16_SCALE as f64).round();
                    writer.write_i16::<LittleEndian>(scaled.clamp(-32768.0, 32767.0) as i16)?
                }
                IqFormat::Cu8 => {
                    let scaled = (value * CU8_OFFSET as f64 + CU8_OFFSET as f64).round();
                    writer.write_u8(scaled.clamp(0.0, 255.0) as u8)?
                }
            }
        }
    }

    writer.flush()?;
    Ok(())
}
