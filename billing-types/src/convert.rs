//! Conversions for user-entered amounts and dates.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

use crate::error::DomainError;

/// Storage date format.
pub const SQL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a user-entered amount into cents.
///
/// Everything except digits, `.` and `-` is dropped first, so grouping
/// separators and currency symbols are tolerated (`"$1,234.50"` → `123450`).
/// The longest leading number is then read and the rest ignored
/// (`"1.2.3"` → `120`, `"10-"` → `1000`). No leading number yields `0`.
/// The result may be negative; callers decide whether that is acceptable.
pub fn parse_amount(input: &str) -> i64 {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    leading_number(&cleaned)
        .and_then(|n| Decimal::from_str(&n).ok())
        .and_then(|d| (d * Decimal::ONE_HUNDRED).round().to_i64())
        .unwrap_or(0)
}

/// Reads `-?digits(.digits)?` from the start of `s`, normalized so the
/// integer part is never empty.
fn leading_number(s: &str) -> Option<String> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let (int, tail) = rest.split_at(int_len);
    let frac = tail
        .strip_prefix('.')
        .map(|t| &t[..t.bytes().take_while(u8::is_ascii_digit).count()])
        .unwrap_or_default();

    if int.is_empty() && frac.is_empty() {
        return None;
    }

    let sign = if negative { "-" } else { "" };
    let int = if int.is_empty() { "0" } else { int };
    Some(if frac.is_empty() {
        format!("{sign}{int}")
    } else {
        format!("{sign}{int}.{frac}")
    })
}

/// Converts a date in the account's format to a calendar date.
///
/// Blank input means "no date". Dates already in storage format are accepted
/// as well.
pub fn to_sql_date(input: &str, format: &str) -> Result<Option<NaiveDate>, DomainError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(input, format)
        .or_else(|_| NaiveDate::parse_from_str(input, SQL_DATE_FORMAT))
        .map(Some)
        .map_err(|_| DomainError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::DEFAULT_DATE_FORMAT;

    #[test]
    fn test_parse_plain_amount() {
        assert_eq!(parse_amount("12"), 1200);
        assert_eq!(parse_amount("12.5"), 1250);
        assert_eq!(parse_amount("0.07"), 7);
    }

    #[test]
    fn test_parse_amount_strips_grouping_and_symbols() {
        assert_eq!(parse_amount("$1,234.50"), 123450);
        assert_eq!(parse_amount(" 1 000 "), 100000);
    }

    #[test]
    fn test_parse_amount_rounds_to_cents() {
        assert_eq!(parse_amount("10.005"), 1000);
        assert_eq!(parse_amount("10.015"), 1002);
    }

    #[test]
    fn test_parse_amount_negative_and_garbage() {
        assert_eq!(parse_amount("-5"), -500);
        assert_eq!(parse_amount("abc"), 0);
        assert_eq!(parse_amount(""), 0);
        assert_eq!(parse_amount("-"), 0);
    }

    #[test]
    fn test_parse_amount_reads_leading_number() {
        assert_eq!(parse_amount("1.2.3"), 120);
        assert_eq!(parse_amount("10-"), 1000);
        assert_eq!(parse_amount("5."), 500);
        assert_eq!(parse_amount(".5"), 50);
        assert_eq!(parse_amount("-.25"), -25);
        assert_eq!(parse_amount("--5"), 0);
    }

    #[test]
    fn test_to_sql_date_account_format() {
        let date = to_sql_date("Dec 1, 2013", DEFAULT_DATE_FORMAT).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2013, 12, 1));
    }

    #[test]
    fn test_to_sql_date_accepts_storage_format() {
        let date = to_sql_date("2024-02-29", DEFAULT_DATE_FORMAT).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn test_to_sql_date_blank_and_invalid() {
        assert_eq!(to_sql_date("  ", DEFAULT_DATE_FORMAT).unwrap(), None);
        assert!(matches!(
            to_sql_date("someday", DEFAULT_DATE_FORMAT),
            Err(DomainError::InvalidDate(_))
        ));
    }
}
