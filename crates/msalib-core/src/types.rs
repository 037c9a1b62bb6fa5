//! Shared record types produced by the reply decoders.

use serde::{Deserialize, Serialize};

/// One reconstructed point of a sweep: absolute frequency and level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Bin frequency in hertz.
    pub freq_hz: u64,
    /// Measured level in dBm.
    pub level_dbm: f64,
}

/// Decoded result of a sweep query (`SRSF`).
///
/// `amplitudes` holds every sample in the order the instrument sent it.
/// When frequency reconstruction was requested, `points` pairs each sample
/// with its bin frequency and always has the same length as `amplitudes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumRecord {
    /// Center frequency in hertz.
    pub center_freq_hz: u64,
    /// Sweep span in hertz.
    pub span_hz: u64,
    /// Reference level in dBm.
    pub ref_level_dbm: f64,
    /// Sweep time magnitude as reported (seconds on the instruments seen so far).
    pub sweep_time_s: f64,
    /// Resolution bandwidth in hertz.
    pub rbw_hz: u64,
    /// Video bandwidth in hertz.
    pub vbw_hz: u64,
    /// Vertical scale in dB per division.
    pub scale_db_per_div: u32,
    /// Amplitude samples in dBm.
    pub amplitudes: Vec<f64>,
    /// Samples paired with reconstructed bin frequencies, if requested.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub points: Option<Vec<SweepPoint>>,
}

impl SpectrumRecord {
    /// Number of amplitude samples in the sweep.
    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    /// Whether the sweep carried no samples at all.
    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    /// Highest sample and its index, if any.
    pub fn peak(&self) -> Option<(usize, f64)> {
        self.amplitudes
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, level)| match best {
                Some((_, b)) if b >= level => best,
                _ => Some((i, level)),
            })
    }
}
