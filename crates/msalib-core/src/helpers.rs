//! Formatting helpers for spectrum analyzer applications.

/// Format a frequency in hertz as a human-readable MHz string.
///
/// Returns a string like `"2400.000000 MHz"` with six decimal places.
///
/// # Example
///
/// ```
/// use msalib_core::format_freq_mhz;
///
/// assert_eq!(format_freq_mhz(2_400_000_000), "2400.000000 MHz");
/// assert_eq!(format_freq_mhz(433_920_000), "433.920000 MHz");
/// ```
pub fn format_freq_mhz(freq_hz: u64) -> String {
    let mhz = freq_hz as f64 / 1_000_000.0;
    format!("{mhz:.6} MHz")
}

/// Format a frequency in hertz using the instrument's suffix notation.
///
/// Picks the largest of `G`, `M`, `K` that divides the value exactly and
/// falls back to `Hz`, so the output always parses back to the same value.
///
/// # Example
///
/// ```
/// use msalib_core::format_freq_suffix;
///
/// assert_eq!(format_freq_suffix(2_000_000_000), "2G");
/// assert_eq!(format_freq_suffix(500_000), "500K");
/// assert_eq!(format_freq_suffix(1_200), "1200Hz");
/// ```
pub fn format_freq_suffix(freq_hz: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "G"), (1_000_000, "M"), (1_000, "K")];

    for (mult, suffix) in UNITS {
        if freq_hz != 0 && freq_hz % mult == 0 {
            return format!("{}{suffix}", freq_hz / mult);
        }
    }
    format!("{freq_hz}Hz")
}
