// Utility helpers for parsing and formatting.
//
// Works exports arrive with European number formatting ("1 000,00") and a
// mix of date renderings, so all of that handling lives here and the rest
// of the code only sees `Option<f64>` and `Option<NaiveDate>`.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a locale-formatted decimal such as `"1 000,50"`.
///
/// - Strips every whitespace character (thousands separators).
/// - Treats a comma as the decimal point.
/// - Returns `None` for empty, non-numeric or non-finite values so callers
///   can treat them as a zero contribution.
pub fn parse_locale_decimal(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let v = cleaned.parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

// Slashed dates are month-first; day-first is only tried when that fails.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse a date or timestamp and normalize it to the calendar day.
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
            return Some(normalize_date(dt));
        }
    }
    // Timestamps with an offset or unusual precision: keep the day part.
    let day = s.split(|c| c == ' ' || c == 'T').next()?;
    if day.len() < s.len() {
        return NaiveDate::parse_from_str(day, "%Y-%m-%d").ok();
    }
    None
}

/// Drop the time of day. Applying it to a date that is already at
/// midnight returns the same date.
pub fn normalize_date(dt: NaiveDateTime) -> NaiveDate {
    dt.date()
}

pub fn average(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with `num-format` grouping on the integer part,
    // e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = match int_part.parse::<i64>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        // Beyond i64: keep the digits ungrouped rather than lose them.
        Err(_) => int_part.to_string(),
    };
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

/// Money in the dashboard's house style: space thousands separator and a
/// comma decimal point (`1 234,50`).
pub fn format_money(n: f64) -> String {
    format_number(n, 2)
        .chars()
        .map(|c| match c {
            ',' => ' ',
            '.' => ',',
            other => other,
        })
        .collect()
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Trim and lower-case, used wherever free text is joined across datasets.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_space_grouped_comma_decimals() {
        assert_eq!(parse_locale_decimal(Some("1 000,00")), Some(1000.0));
        assert_eq!(parse_locale_decimal(Some("900,00")), Some(900.0));
        assert_eq!(parse_locale_decimal(Some("2,5")), Some(2.5));
        assert_eq!(parse_locale_decimal(Some("-12,75")), Some(-12.75));
        assert_eq!(parse_locale_decimal(Some("42")), Some(42.0));
    }

    #[test]
    fn unparseable_decimals_are_missing() {
        assert_eq!(parse_locale_decimal(None), None);
        assert_eq!(parse_locale_decimal(Some("")), None);
        assert_eq!(parse_locale_decimal(Some("   ")), None);
        assert_eq!(parse_locale_decimal(Some("n/a")), None);
        assert_eq!(parse_locale_decimal(Some("NaN")), None);
        assert_eq!(parse_locale_decimal(Some("inf")), None);
    }

    #[test]
    fn dates_parse_from_common_renderings() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(parse_date_safe(Some("2025-03-14")), Some(d));
        assert_eq!(parse_date_safe(Some("14/03/2025")), Some(d));
        assert_eq!(parse_date_safe(Some("03/14/2025")), Some(d));
        assert_eq!(
            parse_date_safe(Some("03/04/2025")),
            NaiveDate::from_ymd_opt(2025, 3, 4)
        );
        assert_eq!(parse_date_safe(Some("2025-03-14 17:45:00")), Some(d));
        assert_eq!(parse_date_safe(Some("2025-03-14 17:45:00.000000")), Some(d));
        assert_eq!(parse_date_safe(Some("2025-03-14T08:00:00")), Some(d));
        assert_eq!(parse_date_safe(Some("not a date")), None);
        assert_eq!(parse_date_safe(Some("")), None);
    }

    #[test]
    fn date_normalization_is_idempotent() {
        let dt = NaiveDate::from_ymd_opt(2024, 11, 2)
            .unwrap()
            .and_hms_opt(13, 5, 0)
            .unwrap();
        let once = normalize_date(dt);
        let twice = normalize_date(once.and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(once, twice);
        let rendered = once.format("%Y-%m-%d").to_string();
        assert_eq!(parse_date_safe(Some(&rendered)), Some(once));
    }

    #[test]
    fn money_uses_space_and_comma() {
        assert_eq!(format_money(1234567.891), "1 234 567,89");
        assert_eq!(format_money(-100.0), "-100,00");
        assert_eq!(format_money(0.0), "0,00");
    }

    #[test]
    fn numbers_beyond_i64_keep_their_digits() {
        assert_eq!(format_number(1234.5, 2), "1,234.50");
        assert_eq!(format_number(1e20, 0), "100000000000000000000");
        assert_eq!(format_number(-1e20, 1), "-100000000000000000000.0");
    }

    #[test]
    fn average_of_empty_is_none() {
        assert_eq!(average(&[]), None);
        assert_eq!(average(&[10.0, 20.0]), Some(15.0));
    }
}
