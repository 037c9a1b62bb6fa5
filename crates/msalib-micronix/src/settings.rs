//! MSA400 settings schema.
//!
//! Every instrument setting is a row in a static table: the query command
//! that reads it, the prefix that writes it, and the validator every written
//! value must pass. The session's `get`/`set` accessors are driven entirely
//! by this table.
//!
//! | Setting  | Query       | Write      | Accepted values |
//! |----------|-------------|------------|-----------------|
//! | freq     | `FREQ?`     | `FREQ`     | any |
//! | span     | `SPAN?`     | `SPAN`     | `ZERO` `200K` … `2G` `FULL` |
//! | ref      | `REF?`      | `REF`      | −60 … 10 |
//! | rbw      | `RBW?`      | `RBW`      | `3K` … `3M` `AUTO` `ALL` |
//! | vbw      | `VBW?`      | `VBW`      | `100` … `1M` `AUTO` `ALL` |
//! | meas     | `MEAS?`     | `MEAS`     | `CP` `ACP` `OBW` `EF` `MF` `FC` `OFF` |
//! | cpmode   | `CPMODE?`   | `CPMODE`   | `TOTAL` `BAND` |
//! | cpcntr   | `CPCNTR?`   | `CPCNTR`   | any |
//! | cpwidth  | `CPWIDTH?`  | `CPWIDTH`  | any |
//! | acpmode  | `ACPMODE?`  | `ACPMODE`  | `TOTAL` `BAND` `PEAK` |
//! | calc     | `CALC?`     | `CALC`     | `OFF` `MAX` `MIN` `AVE` `OVR` |
//! | maxno    | `MAXNO?`    | `MAXNO`    | 0, 2, 4 … 1024 |
//! | minno    | `MINNO?`    | `MINNO`    | 0, 2, 4 … 1024 |
//! | aveno    | `AVENO?`    | `AVENO`    | 0, 2, 4 … 1024 |
//! | ovrno    | `OVRNO?`    | `OVRNO`    | 0, 2, 4 … 1024 |
//! | scale    | `SCALE?`    | `SCALE`    | `2` `5` `10` |
//! | sweep    | `SWEEP?`    | `SWEEP`    | `10M` `30M` `0,1S` … `30S` `AUTO` `ALL` |
//! | det      | `DET?`      | `DET`      | `POS` `NEG` `SMP` |
//! | trg      | `TRG?`      | `TRG`      | `INT` `EXT` |
//! | mkr      | `MKR?`      | `MKR`      | `NORM` `DELTA` |
//! | normkr   | `NORMMKR?`  | `NORMKR`   | 0 … 500 |
//! | peak     | `PEAK?`     | `PEAK`     | `NORM` `PEAK` |
//! | pksearch | `PKSEARCH?` | `PKSEARCH` | `01` … `11` |
//!
//! The measurement mode is written in two steps: `MEASOFF` first, then the
//! requested mode. The instrument does not switch modes correctly otherwise.

use std::fmt;
use std::str::FromStr;

use msalib_core::{Error, Result};

/// Predicate a setting value must satisfy before it is written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validator {
    /// Any non-empty value without line breaks, sent as trimmed.
    Any,
    /// Case-insensitive membership in a fixed set; sent upper-cased.
    OneOf(&'static [&'static str]),
    /// Like [`OneOf`](Validator::OneOf), but `.` is first translated to the
    /// instrument's `,` decimal separator.
    OneOfDecimalComma(&'static [&'static str]),
    /// A number within inclusive bounds; sent as trimmed.
    Range { min: f64, max: f64 },
    /// An integer within inclusive bounds; sent in canonical form.
    IntRange { min: i64, max: i64 },
    /// One of 0, 2, 4, 8 … 1024; sent in canonical form.
    PowerOfTwo,
}

/// Largest averaging / hold count the instrument accepts.
pub const MAX_SWEEP_COUNT: u32 = 1024;

impl Validator {
    /// Check `value` and return the normalized form that goes on the wire.
    ///
    /// Validation is idempotent: feeding the returned value back in yields
    /// the same value.
    pub fn validate(&self, value: &str) -> Result<String> {
        let trimmed = value.trim();
        let reject = || Error::Validation {
            value: value.to_string(),
            expected: self.describe(),
        };

        match *self {
            Validator::Any => {
                if trimmed.is_empty() || trimmed.contains(['\r', '\n']) {
                    return Err(reject());
                }
                Ok(trimmed.to_string())
            }
            Validator::OneOf(allowed) => {
                let normalized = trimmed.to_ascii_uppercase();
                if allowed.contains(&normalized.as_str()) {
                    Ok(normalized)
                } else {
                    Err(reject())
                }
            }
            Validator::OneOfDecimalComma(allowed) => {
                let normalized = trimmed.to_ascii_uppercase().replace('.', ",");
                if allowed.contains(&normalized.as_str()) {
                    Ok(normalized)
                } else {
                    Err(reject())
                }
            }
            Validator::Range { min, max } => match trimmed.parse::<f64>() {
                // Plain decimal, no exponent or sign noise; -0 is sent as 0.
                Ok(v) if v.is_finite() && (min..=max).contains(&v) => {
                    Ok(if v == 0.0 { 0.0 } else { v }.to_string())
                }
                _ => Err(reject()),
            },
            Validator::IntRange { min, max } => match trimmed.parse::<i64>() {
                Ok(v) if (min..=max).contains(&v) => Ok(v.to_string()),
                _ => Err(reject()),
            },
            Validator::PowerOfTwo => match trimmed.parse::<u32>() {
                Ok(0) => Ok("0".to_string()),
                Ok(v) if v >= 2 && v <= MAX_SWEEP_COUNT && v.is_power_of_two() => {
                    Ok(v.to_string())
                }
                _ => Err(reject()),
            },
        }
    }

    /// Human-readable description of the accepted domain.
    pub fn describe(&self) -> String {
        match *self {
            Validator::Any => "any non-empty single-line value".to_string(),
            Validator::OneOf(allowed) | Validator::OneOfDecimalComma(allowed) => {
                format!("one of {}", allowed.join(", "))
            }
            Validator::Range { min, max } => format!("a number in [{min}, {max}]"),
            Validator::IntRange { min, max } => format!("an integer in [{min}, {max}]"),
            Validator::PowerOfTwo => format!("0 or a power of two from 2 to {MAX_SWEEP_COUNT}"),
        }
    }
}

/// An instrument setting that can be read and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Setting {
    /// Center frequency.
    Freq,
    /// Sweep span.
    Span,
    /// Reference level.
    Ref,
    /// Resolution bandwidth.
    Rbw,
    /// Video bandwidth.
    Vbw,
    /// Measurement mode.
    Meas,
    /// Channel power mode.
    CpMode,
    /// Channel power center.
    CpCenter,
    /// Channel power width.
    CpWidth,
    /// Adjacent channel power mode.
    AcpMode,
    /// Trace calculation (max/min hold, averaging, overwrite).
    Calc,
    /// Max-hold sweep count.
    MaxCount,
    /// Min-hold sweep count.
    MinCount,
    /// Averaging sweep count.
    AveCount,
    /// Overwrite sweep count.
    OvrCount,
    /// Vertical scale in dB/div.
    Scale,
    /// Sweep time.
    Sweep,
    /// Detector.
    Det,
    /// Trigger source.
    Trg,
    /// Marker mode.
    Mkr,
    /// Normal marker position.
    NormalMarker,
    /// Peak mode.
    Peak,
    /// Peak search index.
    PeakSearch,
}

/// Static description of one setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingDescriptor {
    pub setting: Setting,
    /// Short name used in presets and on the command line.
    pub name: &'static str,
    /// Command that reads the current value.
    pub query: &'static str,
    /// Prefix the normalized value is appended to when writing.
    pub write_prefix: &'static str,
    /// Command that must be sent before every write, if any.
    pub pre_write: Option<&'static str>,
    pub validator: Validator,
}

impl SettingDescriptor {
    /// Validate `value` and build the write command for it.
    pub fn write_command(&self, value: &str) -> Result<String> {
        let normalized = self.validator.validate(value)?;
        Ok(format!("{}{}", self.write_prefix, normalized))
    }
}

const SPAN_VALUES: &[&str] = &[
    "ZERO", "200K", "500K", "1M", "2M", "5M", "20M", "50M", "100M", "200M", "500M", "1G", "2G",
    "FULL",
];
const RBW_VALUES: &[&str] = &["3K", "10K", "30K", "100K", "1M", "3M", "AUTO", "ALL"];
const VBW_VALUES: &[&str] = &[
    "100", "300", "1K", "3K", "10K", "30K", "100K", "300K", "1M", "AUTO", "ALL",
];
const MEAS_VALUES: &[&str] = &["CP", "ACP", "OBW", "EF", "MF", "FC", "OFF"];
const SWEEP_VALUES: &[&str] = &[
    "10M", "30M", "0,1S", "0,3S", "1S", "3S", "10S", "30S", "AUTO", "ALL",
];
const PKSEARCH_VALUES: &[&str] = &[
    "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11",
];

const fn entry(
    setting: Setting,
    name: &'static str,
    query: &'static str,
    write_prefix: &'static str,
    validator: Validator,
) -> SettingDescriptor {
    SettingDescriptor {
        setting,
        name,
        query,
        write_prefix,
        pre_write: None,
        validator,
    }
}

/// The settings schema, in [`Setting`] declaration order.
pub static SETTINGS: [SettingDescriptor; 23] = [
    entry(Setting::Freq, "freq", "FREQ?", "FREQ", Validator::Any),
    entry(Setting::Span, "span", "SPAN?", "SPAN", Validator::OneOf(SPAN_VALUES)),
    entry(
        Setting::Ref,
        "ref",
        "REF?",
        "REF",
        Validator::Range {
            min: -60.0,
            max: 10.0,
        },
    ),
    entry(Setting::Rbw, "rbw", "RBW?", "RBW", Validator::OneOf(RBW_VALUES)),
    entry(Setting::Vbw, "vbw", "VBW?", "VBW", Validator::OneOf(VBW_VALUES)),
    SettingDescriptor {
        setting: Setting::Meas,
        name: "meas",
        query: "MEAS?",
        write_prefix: "MEAS",
        pre_write: Some("MEASOFF"),
        validator: Validator::OneOf(MEAS_VALUES),
    },
    entry(
        Setting::CpMode,
        "cpmode",
        "CPMODE?",
        "CPMODE",
        Validator::OneOf(&["TOTAL", "BAND"]),
    ),
    entry(Setting::CpCenter, "cpcntr", "CPCNTR?", "CPCNTR", Validator::Any),
    entry(Setting::CpWidth, "cpwidth", "CPWIDTH?", "CPWIDTH", Validator::Any),
    entry(
        Setting::AcpMode,
        "acpmode",
        "ACPMODE?",
        "ACPMODE",
        Validator::OneOf(&["TOTAL", "BAND", "PEAK"]),
    ),
    entry(
        Setting::Calc,
        "calc",
        "CALC?",
        "CALC",
        Validator::OneOf(&["OFF", "MAX", "MIN", "AVE", "OVR"]),
    ),
    entry(Setting::MaxCount, "maxno", "MAXNO?", "MAXNO", Validator::PowerOfTwo),
    entry(Setting::MinCount, "minno", "MINNO?", "MINNO", Validator::PowerOfTwo),
    entry(Setting::AveCount, "aveno", "AVENO?", "AVENO", Validator::PowerOfTwo),
    entry(Setting::OvrCount, "ovrno", "OVRNO?", "OVRNO", Validator::PowerOfTwo),
    entry(
        Setting::Scale,
        "scale",
        "SCALE?",
        "SCALE",
        Validator::OneOf(&["2", "5", "10"]),
    ),
    entry(
        Setting::Sweep,
        "sweep",
        "SWEEP?",
        "SWEEP",
        Validator::OneOfDecimalComma(SWEEP_VALUES),
    ),
    entry(
        Setting::Det,
        "det",
        "DET?",
        "DET",
        Validator::OneOf(&["POS", "NEG", "SMP"]),
    ),
    entry(
        Setting::Trg,
        "trg",
        "TRG?",
        "TRG",
        Validator::OneOf(&["INT", "EXT"]),
    ),
    entry(
        Setting::Mkr,
        "mkr",
        "MKR?",
        "MKR",
        Validator::OneOf(&["NORM", "DELTA"]),
    ),
    // The query and write spellings differ on the instrument.
    entry(
        Setting::NormalMarker,
        "normkr",
        "NORMMKR?",
        "NORMKR",
        Validator::IntRange { min: 0, max: 500 },
    ),
    entry(
        Setting::Peak,
        "peak",
        "PEAK?",
        "PEAK",
        Validator::OneOf(&["NORM", "PEAK"]),
    ),
    entry(
        Setting::PeakSearch,
        "pksearch",
        "PKSEARCH?",
        "PKSEARCH",
        Validator::OneOf(PKSEARCH_VALUES),
    ),
];

impl Setting {
    /// Every setting, in schema order.
    pub const ALL: [Setting; 23] = [
        Setting::Freq,
        Setting::Span,
        Setting::Ref,
        Setting::Rbw,
        Setting::Vbw,
        Setting::Meas,
        Setting::CpMode,
        Setting::CpCenter,
        Setting::CpWidth,
        Setting::AcpMode,
        Setting::Calc,
        Setting::MaxCount,
        Setting::MinCount,
        Setting::AveCount,
        Setting::OvrCount,
        Setting::Scale,
        Setting::Sweep,
        Setting::Det,
        Setting::Trg,
        Setting::Mkr,
        Setting::NormalMarker,
        Setting::Peak,
        Setting::PeakSearch,
    ];

    /// The schema row for this setting.
    pub fn descriptor(self) -> &'static SettingDescriptor {
        &SETTINGS[self as usize]
    }

    /// Short name used in presets and on the command line.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Setting {
    type Err = Error;

    /// Look a setting up by its short name, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        SETTINGS
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(wanted))
            .map(|d| d.setting)
            .ok_or_else(|| Error::UnknownSetting(s.to_string()))
    }
}
