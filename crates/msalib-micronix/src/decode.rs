//! MSA400 reply decoders.
//!
//! All functions are pure -- they consume the stripped text of a reply and
//! produce typed values without performing any I/O.
//!
//! # Value notation
//!
//! Frequencies carry a unit suffix directly after the number: `2.4G`,
//! `100M`, `500K`, `1200Hz` (the long forms `GHz`, `MHz`, `kHz` are accepted
//! too). Levels are plain signed decimals, possibly followed by a unit.
//!
//! # Sweep dump
//!
//! `SRSF` returns a one-line parameter header followed by the sample block:
//!
//! ```text
//! CF 1.0G SP 2M RF -20 ST 0.1S RB 100K VB 100K SC 10
//! -45.20 -46.10 -44.90 ...
//! ```
//!
//! Header fields appear in this fixed order. Samples are negative decimals
//! in dBm.

use once_cell::sync::Lazy;
use regex::Regex;

use msalib_core::{Error, Result, SpectrumRecord, SweepPoint};

/// Number of frequency steps across one span.
pub const SWEEP_STEPS: u64 = 1000;

static FREQUENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9.]+)(GHz|MHz|kHz|KHz|Hz|G|M|K)").expect("valid regex"));

static LEVEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?[0-9]+(?:\.[0-9]*)?|[-+]?\.[0-9]+").expect("valid regex"));

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"CF\s+(\S+)\s+SP\s+(\S+)\s+RF\s+(\S+)\s+ST\s+(\S+)(?:\s+([A-Za-z]+))?\s+RB\s+(\S+)\s+VB\s+(\S+)\s+SC\s+(\S+)",
    )
    .expect("valid regex")
});

static SAMPLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-[0-9]+\.[0-9]+").expect("valid regex"));

fn suffix_multiplier(suffix: &str) -> u64 {
    match suffix {
        "GHz" | "G" => 1_000_000_000,
        "MHz" | "M" => 1_000_000,
        "kHz" | "KHz" | "K" => 1_000,
        _ => 1,
    }
}

/// Scale a decimal literal by `mult`, rounding down to a whole number.
///
/// Works on the digits directly so that `2.4` × 10^9 is exactly
/// 2 400 000 000 rather than whatever the nearest binary float gives.
fn scale_decimal(literal: &str, mult: u64) -> Option<u64> {
    let (int_part, frac_part) = match literal.split_once('.') {
        Some((i, f)) => (i, f),
        None => (literal, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.contains('.') {
        return None;
    }

    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let mut hz = whole.checked_mul(mult as u128)?;

    // Digits beyond the multiplier's precision only ever contribute a
    // fraction of a hertz, which is floored away.
    let frac_digits = &frac_part[..frac_part.len().min(18)];
    if !frac_digits.is_empty() {
        let frac: u128 = frac_digits.parse().ok()?;
        let denom = 10u128.pow(frac_digits.len() as u32);
        hz = hz.checked_add(frac * mult as u128 / denom)?;
    }

    u64::try_from(hz).ok()
}

/// Parse the first suffixed frequency in `text` into whole hertz.
///
/// Only the first match is used; callers pass the token they care about.
///
/// # Example
///
/// ```
/// use msalib_micronix::decode::parse_frequency;
///
/// assert_eq!(parse_frequency("2.4G").unwrap(), 2_400_000_000);
/// assert_eq!(parse_frequency("500K").unwrap(), 500_000);
/// assert_eq!(parse_frequency("100MHz").unwrap(), 100_000_000);
/// assert!(parse_frequency("1234").is_err());
/// ```
pub fn parse_frequency(text: &str) -> Result<u64> {
    let caps = FREQUENCY_RE
        .captures(text)
        .ok_or_else(|| Error::Parse(format!("no suffixed frequency in {text:?}")))?;

    let literal = &caps[1];
    let mult = suffix_multiplier(&caps[2]);
    scale_decimal(literal, mult)
        .ok_or_else(|| Error::Parse(format!("invalid frequency literal {literal:?} in {text:?}")))
}

/// Parse the first signed decimal in `text`, skipping any leading
/// non-numeric characters (`RF-20dBm` → `-20.0`).
///
/// A comma is accepted as the decimal separator.
pub fn parse_level(text: &str) -> Result<f64> {
    let normalized = text.replace(',', ".");
    let m = LEVEL_RE
        .find(&normalized)
        .ok_or_else(|| Error::Parse(format!("no numeric value in {text:?}")))?;
    m.as_str()
        .parse()
        .map_err(|_| Error::Parse(format!("invalid numeric value {:?}", m.as_str())))
}

fn parse_scale(text: &str) -> Result<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse()
        .map_err(|_| Error::Parse(format!("invalid scale {text:?}")))
}

/// Decode an `SRSF` sweep dump into a [`SpectrumRecord`].
///
/// The header must appear exactly once. Every negative decimal after the
/// header is an amplitude sample, kept in order of appearance.
///
/// With `with_frequencies`, each sample is paired with its bin frequency
/// (see [`reconstruct_frequencies`]).
pub fn parse_sweep_reply(text: &str, with_frequencies: bool) -> Result<SpectrumRecord> {
    let mut headers = HEADER_RE.captures_iter(text);
    let caps = headers
        .next()
        .ok_or_else(|| Error::Parse("sweep header not found".into()))?;
    if headers.next().is_some() {
        return Err(Error::Parse("sweep reply contains more than one header".into()));
    }

    let header_end = caps.get(0).map_or(0, |m| m.end());

    let center_freq_hz = parse_frequency(&caps[1])?;
    let span_hz = parse_frequency(&caps[2])?;
    let ref_level_dbm = parse_level(&caps[3])?;
    let sweep_time_s = parse_level(&caps[4])?;
    let rbw_hz = parse_frequency(&caps[6])?;
    let vbw_hz = parse_frequency(&caps[7])?;
    let scale_db_per_div = parse_scale(&caps[8])?;

    let amplitudes = SAMPLE_RE
        .find_iter(&text[header_end..])
        .map(|m| {
            m.as_str()
                .parse::<f64>()
                .map_err(|_| Error::Parse(format!("invalid sample {:?}", m.as_str())))
        })
        .collect::<Result<Vec<f64>>>()?;

    let points = if with_frequencies {
        Some(reconstruct_frequencies(center_freq_hz, span_hz, &amplitudes)?)
    } else {
        None
    };

    tracing::debug!(
        center_freq_hz,
        span_hz,
        samples = amplitudes.len(),
        "Decoded sweep"
    );

    Ok(SpectrumRecord {
        center_freq_hz,
        span_hz,
        ref_level_dbm,
        sweep_time_s,
        rbw_hz,
        vbw_hz,
        scale_db_per_div,
        amplitudes,
        points,
    })
}

/// Frequency step between adjacent sweep bins for `span_hz`.
pub fn bin_step(span_hz: u64) -> u64 {
    span_hz / SWEEP_STEPS
}

/// Pair each amplitude with its bin frequency.
///
/// Bins start at `left = center - span/2` and advance by `step = span / 1000`
/// while below `left + span + step`, which gives 1001 bins for spans that
/// are a multiple of 1000 Hz. A sweep with more samples than bins is
/// rejected with [`Error::InconsistentData`], as is a span too narrow to
/// step or one reaching below 0 Hz or above `u64::MAX` Hz.
pub fn reconstruct_frequencies(
    center_freq_hz: u64,
    span_hz: u64,
    amplitudes: &[f64],
) -> Result<Vec<SweepPoint>> {
    let step = bin_step(span_hz);
    if step == 0 {
        return Err(Error::InconsistentData(format!(
            "span of {span_hz} Hz is too narrow to place {} samples",
            amplitudes.len()
        )));
    }
    let left = center_freq_hz.checked_sub(span_hz / 2).ok_or_else(|| {
        Error::InconsistentData(format!(
            "span of {span_hz} Hz around {center_freq_hz} Hz starts below 0 Hz"
        ))
    })?;
    // Bins below `left + span + step`, counted without forming the bound.
    let bins = span_hz.div_ceil(step) + 1;

    if (amplitudes.len() as u64) > bins {
        return Err(Error::InconsistentData(format!(
            "{} samples but only {bins} frequency bins",
            amplitudes.len()
        )));
    }

    amplitudes
        .iter()
        .enumerate()
        .map(|(i, &level_dbm)| {
            let freq_hz = (i as u64)
                .checked_mul(step)
                .and_then(|offset| left.checked_add(offset))
                .ok_or_else(|| {
                    Error::InconsistentData(format!(
                        "bin {i} of a {span_hz} Hz span around {center_freq_hz} Hz \
                         exceeds the frequency range"
                    ))
                })?;
            Ok(SweepPoint { freq_hz, level_dbm })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "CF 1.0G SP 2M RF -20 ST 0.1S RB 100K VB 100K SC 10";

    // ---------------------------------------------------------------
    // parse_frequency
    // ---------------------------------------------------------------

    #[test]
    fn frequency_short_suffixes() {
        assert_eq!(parse_frequency("2.4G").unwrap(), 2_400_000_000);
        assert_eq!(parse_frequency("100M").unwrap(), 100_000_000);
        assert_eq!(parse_frequency("500K").unwrap(), 500_000);
    }

    #[test]
    fn frequency_long_suffixes() {
        assert_eq!(parse_frequency("100MHz").unwrap(), 100_000_000);
        assert_eq!(parse_frequency("1.5GHz").unwrap(), 1_500_000_000);
        assert_eq!(parse_frequency("30kHz").unwrap(), 30_000);
        assert_eq!(parse_frequency("1200Hz").unwrap(), 1_200);
    }

    #[test]
    fn frequency_floors_sub_hertz_fraction() {
        assert_eq!(parse_frequency("1.5Hz").unwrap(), 1);
        assert_eq!(parse_frequency("0.0001K").unwrap(), 0);
        assert_eq!(parse_frequency("1.2345678M").unwrap(), 1_234_567);
    }

    #[test]
    fn frequency_uses_first_match() {
        assert_eq!(parse_frequency("FREQ 433.92M SPAN 2M").unwrap(), 433_920_000);
    }

    #[test]
    fn frequency_without_suffix_is_parse_error() {
        assert!(matches!(parse_frequency("1234"), Err(Error::Parse(_))));
        assert!(matches!(parse_frequency(""), Err(Error::Parse(_))));
        assert!(matches!(parse_frequency("FULL"), Err(Error::Parse(_))));
    }

    #[test]
    fn frequency_malformed_literal_is_parse_error() {
        assert!(matches!(parse_frequency("1.2.3M"), Err(Error::Parse(_))));
        assert!(matches!(parse_frequency(".M"), Err(Error::Parse(_))));
    }

    // ---------------------------------------------------------------
    // parse_level
    // ---------------------------------------------------------------

    #[test]
    fn level_skips_leading_text() {
        assert_eq!(parse_level("-20").unwrap(), -20.0);
        assert_eq!(parse_level("RF-35.5dBm").unwrap(), -35.5);
        assert_eq!(parse_level("0.1S").unwrap(), 0.1);
        assert_eq!(parse_level("0,3S").unwrap(), 0.3);
    }

    #[test]
    fn level_without_number_is_parse_error() {
        assert!(matches!(parse_level("AUTO"), Err(Error::Parse(_))));
    }

    // ---------------------------------------------------------------
    // parse_sweep_reply
    // ---------------------------------------------------------------

    #[test]
    fn sweep_header_and_samples() {
        let text = format!("{HEADER}\r\n-45.2 -46.1 -44.9");
        let rec = parse_sweep_reply(&text, false).unwrap();

        assert_eq!(rec.center_freq_hz, 1_000_000_000);
        assert_eq!(rec.span_hz, 2_000_000);
        assert_eq!(rec.ref_level_dbm, -20.0);
        assert_eq!(rec.sweep_time_s, 0.1);
        assert_eq!(rec.rbw_hz, 100_000);
        assert_eq!(rec.vbw_hz, 100_000);
        assert_eq!(rec.scale_db_per_div, 10);
        assert_eq!(rec.amplitudes, vec![-45.2, -46.1, -44.9]);
        assert!(rec.points.is_none());
    }

    #[test]
    fn sweep_header_with_separate_time_unit_and_extra_whitespace() {
        let text = "CF  433.92M\tSP 200K  RF -30.5 ST 30 M RB 3K VB 1K SC 5\n-60.25\n-61.00";
        let rec = parse_sweep_reply(text, false).unwrap();

        assert_eq!(rec.center_freq_hz, 433_920_000);
        assert_eq!(rec.span_hz, 200_000);
        assert_eq!(rec.ref_level_dbm, -30.5);
        assert_eq!(rec.sweep_time_s, 30.0);
        assert_eq!(rec.rbw_hz, 3_000);
        assert_eq!(rec.vbw_hz, 1_000);
        assert_eq!(rec.scale_db_per_div, 5);
        assert_eq!(rec.amplitudes, vec![-60.25, -61.0]);
    }

    #[test]
    fn sweep_decimal_reference_level_is_not_a_sample() {
        let text = "CF 1G SP 2M RF -20.0 ST 1S RB 1M VB 1M SC 10 -50.5";
        let rec = parse_sweep_reply(text, false).unwrap();
        assert_eq!(rec.ref_level_dbm, -20.0);
        assert_eq!(rec.amplitudes, vec![-50.5]);
    }

    #[test]
    fn sweep_ignores_non_negative_and_integer_tokens() {
        let text = format!("{HEADER}\n-45.2 3.5 -46 -44.9");
        let rec = parse_sweep_reply(&text, false).unwrap();
        assert_eq!(rec.amplitudes, vec![-45.2, -44.9]);
    }

    #[test]
    fn sweep_without_header_is_parse_error() {
        assert!(matches!(
            parse_sweep_reply("-45.2 -46.1", false),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn sweep_with_two_headers_is_parse_error() {
        let text = format!("{HEADER}\n-45.2\n{HEADER}\n-46.1");
        assert!(matches!(parse_sweep_reply(&text, false), Err(Error::Parse(_))));
    }

    #[test]
    fn sweep_with_bad_header_field_is_parse_error() {
        let text = "CF FULL SP 2M RF -20 ST 0.1S RB 100K VB 100K SC 10 -45.2";
        assert!(matches!(parse_sweep_reply(text, false), Err(Error::Parse(_))));
    }

    #[test]
    fn sweep_with_frequencies_pairs_samples() {
        let text = format!("{HEADER}\n-45.2 -46.1 -44.9");
        let rec = parse_sweep_reply(&text, true).unwrap();
        let points = rec.points.unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].freq_hz, 999_000_000);
        assert_eq!(points[1].freq_hz, 999_002_000);
        assert_eq!(points[2].freq_hz, 999_004_000);
        assert_eq!(points[1].level_dbm, -46.1);
    }

    // ---------------------------------------------------------------
    // reconstruct_frequencies
    // ---------------------------------------------------------------

    #[test]
    fn step_for_two_megahertz_span() {
        assert_eq!(bin_step(2_000_000), 2_000);
    }

    #[test]
    fn full_sweep_of_1001_samples_fits() {
        let amps = vec![-50.0; 1001];
        let points = reconstruct_frequencies(1_000_000_000, 2_000_000, &amps).unwrap();

        assert_eq!(points.len(), 1001);
        assert_eq!(points[0].freq_hz, 999_000_000);
        assert_eq!(points[1000].freq_hz, 1_001_000_000);
        assert!(points.windows(2).all(|w| w[1].freq_hz == w[0].freq_hz + 2_000));
    }

    #[test]
    fn too_many_samples_is_inconsistent() {
        let amps = vec![-50.0; 1002];
        let result = reconstruct_frequencies(1_000_000_000, 2_000_000, &amps);
        assert!(matches!(result, Err(Error::InconsistentData(_))));
    }

    #[test]
    fn zero_span_is_inconsistent() {
        let result = reconstruct_frequencies(100_000_000, 0, &[-50.0]);
        assert!(matches!(result, Err(Error::InconsistentData(_))));
    }

    #[test]
    fn span_below_zero_hertz_is_inconsistent() {
        let result = reconstruct_frequencies(500_000, 2_000_000, &[-50.0]);
        assert!(matches!(result, Err(Error::InconsistentData(_))));
    }

    #[test]
    fn span_above_frequency_range_is_inconsistent() {
        let center = u64::MAX - 500_000;
        let result = reconstruct_frequencies(center, 2_000_000, &[-50.0; 1001]);
        assert!(matches!(result, Err(Error::InconsistentData(_))));

        // The bins that do fit are still accepted.
        let points = reconstruct_frequencies(center, 2_000_000, &[-50.0; 3]).unwrap();
        assert_eq!(points[2].freq_hz, center - 1_000_000 + 4_000);
    }

    #[test]
    fn huge_center_frequency_in_header_is_inconsistent() {
        let text = "CF 18446744073709M SP 2M RF -20 ST 0.1S RB 100K VB 100K SC 10\n\
                    -45.2 -46.1";
        let amps = vec!["-50.0"; 998].join(" ");
        let full = format!("{text} {amps}");

        assert!(parse_sweep_reply(text, true).is_ok());
        assert!(matches!(
            parse_sweep_reply(&full, true),
            Err(Error::InconsistentData(_))
        ));
    }

    #[test]
    fn empty_sweep_reconstructs_to_nothing() {
        let points = reconstruct_frequencies(1_000_000_000, 2_000_000, &[]).unwrap();
        assert!(points.is_empty());
    }
}
