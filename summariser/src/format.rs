//! Number formatting for the printed dashboard. Non-finite values render as `-`.

use itertools::Itertools;

/// Milliseconds with two decimals, or whole microseconds below one millisecond.
pub fn fmt_ms(ms: f64) -> String {
    if !ms.is_finite() {
        return "-".to_string();
    }
    if ms < 1.0 {
        return format!("{:.0}µs", ms * 1000.0);
    }
    format!("{ms:.2}ms")
}

/// A `0.0..=1.0` rate as a percentage with two decimals.
pub fn fmt_pct(rate: f64) -> String {
    if !rate.is_finite() {
        return "-".to_string();
    }
    format!("{:.2}%", rate * 100.0)
}

/// Rounded to a whole number with comma thousands separators.
pub fn fmt_num(n: f64) -> String {
    if !n.is_finite() {
        return "-".to_string();
    }

    let rounded = n.round();
    let digits = format!("{:.0}", rounded.abs());
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .join(",");

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// [fmt_ms] for an optional figure.
pub fn fmt_opt_ms(ms: Option<f64>) -> String {
    ms.map(fmt_ms).unwrap_or_else(|| "-".to_string())
}

/// [fmt_pct] for an optional figure.
pub fn fmt_opt_pct(rate: Option<f64>) -> String {
    rate.map(fmt_pct).unwrap_or_else(|| "-".to_string())
}
