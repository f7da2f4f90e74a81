//! Numeric helpers shared by every layout: zero-safe ratios, series extrema,
//! percentage rounding, tick generation, and cell parsing.

use color_eyre::eyre::eyre;
use color_eyre::Result;

/// `value / denom`, or `None` when the denominator is zero or not finite.
///
/// Every scaling step in the layouts goes through this so that an all-zero
/// series yields zero-size geometry instead of NaN or infinity.
pub fn ratio(value: f64, denom: f64) -> Option<f64> {
    if denom == 0.0 || !denom.is_finite() || !value.is_finite() {
        None
    } else {
        Some(value / denom)
    }
}

/// Largest value in the series, 0 for an empty series.
pub fn series_max(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0_f64, f64::max)
}

/// Largest absolute value in the series, 0 for an empty series.
pub fn series_max_abs(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().map(f64::abs).fold(0.0_f64, f64::max)
}

pub fn series_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().sum()
}

/// `value / denom * 100`, 0 when the denominator is degenerate.
pub fn percent_of(value: f64, denom: f64) -> f64 {
    ratio(value, denom).map(|r| r * 100.0).unwrap_or(0.0)
}

/// Rounded whole percentage used for legends and segment labels.
pub fn rounded_percent(value: f64, denom: f64) -> u32 {
    let pct = percent_of(value, denom).round();
    if pct <= 0.0 {
        0
    } else {
        pct as u32
    }
}

/// Parse a table cell as a number. Accepts thousands separators, a leading
/// `+` or currency sign, and a trailing `%`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed);
    let cleaned: String = trimmed
        .chars()
        .filter(|c| *c != ',' && *c != '_' && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric cell at `col` of `row`, with an error naming the position on failure.
pub fn cell_number(row: &[String], row_idx: usize, col: usize) -> Result<f64> {
    let cell = row
        .get(col)
        .ok_or_else(|| eyre!("row {} has no column {}", row_idx + 1, col + 1))?;
    parse_number(cell).ok_or_else(|| {
        eyre!(
            "row {} column {}: '{}' is not a number",
            row_idx + 1,
            col + 1,
            cell
        )
    })
}

/// Text cell at `col` of `row`; missing cells read as empty.
pub fn cell_text(row: &[String], col: usize) -> String {
    row.get(col).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Generate "nice" tick values in [min, max] with roughly max_ticks steps.
pub fn nice_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    let range = if max > min { max - min } else { 1.0 };
    if max_ticks == 0 {
        return vec![min];
    }
    let raw_step = range / (max_ticks as f64).max(1.0);
    let mag = 10.0_f64.powf(raw_step.log10().floor());
    let norm = if mag > 0.0 { raw_step / mag } else { raw_step };
    let step = if norm <= 1.0 {
        mag
    } else if norm <= 2.0 {
        2.0 * mag
    } else if norm <= 5.0 {
        5.0 * mag
    } else {
        10.0 * mag
    };
    let step = step.max(f64::EPSILON);
    let start = (min / step).floor() * step;
    let mut ticks = Vec::new();
    let mut v = start;
    while v <= max + step * 0.001 {
        if v >= min - step * 0.001 {
            ticks.push(v);
        }
        v += step;
        if ticks.len() > max_ticks + 2 {
            break;
        }
    }
    if ticks.is_empty() {
        ticks.push(min);
    }
    ticks
}

/// Format a value for a label: integer when whole, otherwise one decimal,
/// with thousands separators on the integer part.
pub fn format_value(v: f64) -> String {
    if !v.is_finite() {
        return "-".to_string();
    }
    let negative = v < 0.0;
    let abs = v.abs();
    let body = if (abs - abs.round()).abs() < 1e-9 {
        group_thousands(abs.round() as u64)
    } else {
        let whole = abs.trunc() as u64;
        let frac = ((abs - abs.trunc()) * 10.0).round() as u64;
        if frac >= 10 {
            group_thousands(whole + 1)
        } else {
            format!("{}.{}", group_thousands(whole), frac)
        }
    };
    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

/// Like [`format_value`] but always carries a sign, for deltas.
pub fn format_signed(v: f64) -> String {
    if v > 0.0 {
        format!("+{}", format_value(v))
    } else {
        format_value(v)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio(5.0, 10.0), Some(0.5));
        assert_eq!(ratio(5.0, 0.0), None);
        assert_eq!(ratio(5.0, f64::NAN), None);
        assert_eq!(percent_of(1.0, 0.0), 0.0);
    }

    #[test]
    fn extrema_of_empty_series_are_zero() {
        assert_eq!(series_max(Vec::<f64>::new()), 0.0);
        assert_eq!(series_max_abs(vec![-40.0, 10.0, -100.0]), 100.0);
        assert_eq!(series_sum(vec![1.0, 2.5]), 3.5);
    }

    #[test]
    fn rounded_percent_rounds_half_up() {
        assert_eq!(rounded_percent(25.0, 100.0), 25);
        assert_eq!(rounded_percent(1.0, 3.0), 33);
        assert_eq!(rounded_percent(2.0, 3.0), 67);
        assert_eq!(rounded_percent(0.2, 100.0), 0);
        assert_eq!(rounded_percent(3.0, 0.0), 0);
    }

    #[test]
    fn parse_number_accepts_common_formats() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number(" -40 "), Some(-40.0));
        assert_eq!(parse_number("+12"), Some(12.0));
        assert_eq!(parse_number("1,250"), Some(1250.0));
        assert_eq!(parse_number("$3,400.50"), Some(3400.5));
        assert_eq!(parse_number("85%"), Some(85.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn cell_number_reports_position() {
        let row = vec!["Eng".to_string(), "abc".to_string()];
        let err = cell_number(&row, 2, 1).unwrap_err().to_string();
        assert!(err.contains("row 3 column 2"), "{}", err);
        let err = cell_number(&row, 0, 5).unwrap_err().to_string();
        assert!(err.contains("no column 6"), "{}", err);
    }

    #[test]
    fn nice_ticks_cover_range() {
        let ticks = nice_ticks(0.0, 100.0, 4);
        assert_eq!(ticks.first().copied(), Some(0.0));
        assert!(ticks.last().copied().unwrap_or(0.0) >= 100.0 - 1e-9);
        assert!(ticks.len() <= 7);
    }

    #[test]
    fn format_value_is_compact() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(1250.0), "1,250");
        assert_eq!(format_value(3.25), "3.3");
        assert_eq!(format_value(-40.0), "-40");
        assert_eq!(format_value(999.96), "1,000");
        assert_eq!(format_signed(12.0), "+12");
        assert_eq!(format_signed(-3.0), "-3");
    }
}
