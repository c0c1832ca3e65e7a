// Utility helpers for parsing and formatting.
//
// All of the forgiving cell handling lives here so the loader and the
// aggregators can work with typed values only.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a string-like value into `f64`, tolerating the usual export noise.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Non-negative metric value; invalid or negative input coerces to zero.
pub fn parse_metric(s: Option<&str>) -> f64 {
    match parse_f64_safe(s) {
        Some(v) if v > 0.0 => v,
        _ => 0.0,
    }
}

/// Largest facility count a single row may carry. Anything above it is
/// treated as a corrupt cell.
pub const MAX_FACILITY_COUNT: u64 = 1_000_000_000;

/// Facility count. Spreadsheet exports often write `12.0`, so a float with
/// no fractional part is accepted; fractional, negative, non-numeric or
/// out-of-range values coerce to zero.
pub fn parse_count(s: Option<&str>) -> u64 {
    match parse_f64_safe(s) {
        Some(v) if v > 0.0 && v.fract() == 0.0 && v <= MAX_FACILITY_COUNT as f64 => v as u64,
        Some(v) if v != 0.0 => {
            tracing::debug!(value = v, "facility count out of range, using 0");
            0
        }
        _ => 0,
    }
}

/// Signed difference `current - previous`, clamped to the `i64` range.
pub fn count_delta(previous: u64, current: u64) -> i64 {
    let delta = i128::from(current) - i128::from(previous);
    i64::try_from(delta).unwrap_or(if delta > 0 { i64::MAX } else { i64::MIN })
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

pub fn iso_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Human label used when listing snapshots, e.g. `01 February 2024`.
pub fn friendly_date(d: NaiveDate) -> String {
    d.format("%d %B %Y").to_string()
}

/// Uppercase the first letter of every alphabetic run and lowercase the rest,
/// so `"vaccine cold-chain"` becomes `"Vaccine Cold-Chain"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

pub fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Signed integer with an explicit `+` for positive deltas.
pub fn format_delta(n: i64) -> String {
    if n > 0 {
        format!("+{}", format_int(n))
    } else {
        format_int(n)
    }
}
