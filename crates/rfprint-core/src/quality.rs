//! Quality flags
//!
//! Every degenerate-but-recoverable condition a metric can hit is reported
//! as a [`QualityFlag`] instead of an error, so a capture with enough samples
//! always yields a complete record.
//!
//! Flags serialize as their display names, so JSON, CSV and text all spell
//! them the same way:
//!
//! ```text
//! ["LOW_CONFIDENCE", "WINDOW_OUT_OF_RANGE(rolloff)"]
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Which measurement a window-range problem affected
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Carrier integration window used for CNR
    Carrier,
    /// Half-power crossing search
    Bandwidth,
    /// Adjacent-channel windows
    Adjacent,
    /// Rolloff regression span
    Rolloff,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Carrier,
        Metric::Bandwidth,
        Metric::Adjacent,
        Metric::Rolloff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Carrier => "carrier",
            Metric::Bandwidth => "bandwidth",
            Metric::Adjacent => "adjacent",
            Metric::Rolloff => "rolloff",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enumerated warnings attached to a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityFlag {
    /// Maximum PSD bin is the first or last bin; no sub-bin interpolation
    PeakAtEdge,
    /// Too few out-of-guard bins, or a non-positive noise density
    DegenerateNoiseFloor,
    /// CNR below the good-gate; only peak frequency and CNR are trustworthy
    LowConfidence,
    /// No half-power crossing inside the search window
    BandwidthUnresolved,
    /// One rolloff slope is approximately zero
    FlatRolloff,
    /// A fixed analysis window reached past the spectrum edge
    WindowOutOfRange(Metric),
}

impl fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityFlag::PeakAtEdge => f.write_str("PEAK_AT_EDGE"),
            QualityFlag::DegenerateNoiseFloor => f.write_str("DEGENERATE_NOISE_FLOOR"),
            QualityFlag::LowConfidence => f.write_str("LOW_CONFIDENCE"),
            QualityFlag::BandwidthUnresolved => f.write_str("BANDWIDTH_UNRESOLVED"),
            QualityFlag::FlatRolloff => f.write_str("FLAT_ROLLOFF"),
            QualityFlag::WindowOutOfRange(metric) => write!(f, "WINDOW_OUT_OF_RANGE({})", metric),
        }
    }
}

impl FromStr for QualityFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PEAK_AT_EDGE" => return Ok(QualityFlag::PeakAtEdge),
            "DEGENERATE_NOISE_FLOOR" => return Ok(QualityFlag::DegenerateNoiseFloor),
            "LOW_CONFIDENCE" => return Ok(QualityFlag::LowConfidence),
            "BANDWIDTH_UNRESOLVED" => return Ok(QualityFlag::BandwidthUnresolved),
            "FLAT_ROLLOFF" => return Ok(QualityFlag::FlatRolloff),
            _ => {}
        }

        s.strip_prefix("WINDOW_OUT_OF_RANGE(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|name| Metric::ALL.into_iter().find(|m| m.as_str() == name))
            .map(QualityFlag::WindowOutOfRange)
            .ok_or_else(|| format!("unknown quality flag '{}'", s))
    }
}

impl Serialize for QualityFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QualityFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered set of quality flags
///
/// Backed by a `BTreeSet` so iteration and serialization order never depend
/// on the order in which metrics finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityFlags(BTreeSet<QualityFlag>);

impl QualityFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, flag: QualityFlag) {
        self.0.insert(flag);
    }

    pub fn contains(&self, flag: QualityFlag) -> bool {
        self.0.contains(&flag)
    }

    /// True if any `WindowOutOfRange` flag names `metric`
    pub fn window_out_of_range(&self, metric: Metric) -> bool {
        self.contains(QualityFlag::WindowOutOfRange(metric))
    }

    /// Merge another set into this one
    pub fn union_with(&mut self, other: &QualityFlags) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QualityFlag> {
        self.0.iter()
    }
}

impl FromIterator<QualityFlag> for QualityFlags {
    fn from_iter<I: IntoIterator<Item = QualityFlag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for QualityFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<String> = self.0.iter().map(|flag| flag.to_string()).collect();
        f.write_str(&names.join(","))
    }
}
