use std::str::FromStr;

use rust_decimal::Decimal;
use taxlator_core::CompanySize;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
pub enum ParseAmountError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("amount '{0}' must not be negative")]
    Negative(String),
}

/// Trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a non-negative amount such as `"1,200,000"` or `"5000.50"`.
pub fn parse_amount(s: &str) -> Result<Decimal, ParseAmountError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Err(ParseAmountError::Empty);
    }
    let amount = Decimal::from_str(&normalized).map_err(|source| ParseAmountError::Invalid {
        input: s.to_string(),
        source,
    })?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ParseAmountError::Negative(s.to_string()));
    }
    Ok(amount)
}

/// Parses a rate. A trailing `%` divides by 100, so `"7.5%"` and `"0.075"`
/// are the same rate. Range checks are left to the calculators.
pub fn parse_rate(s: &str) -> Result<Decimal, ParseAmountError> {
    let trimmed = s.trim();
    match trimmed.strip_suffix('%') {
        Some(percent) => Ok(parse_signed(percent)? / Decimal::ONE_HUNDRED),
        None => parse_signed(trimmed),
    }
}

fn parse_signed(s: &str) -> Result<Decimal, ParseAmountError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Err(ParseAmountError::Empty);
    }
    Decimal::from_str(&normalized).map_err(|source| ParseAmountError::Invalid {
        input: s.to_string(),
        source,
    })
}

/// Case-insensitive company size for command-line input.
pub fn parse_company_size(s: &str) -> Result<CompanySize, taxlator_core::CalculationError> {
    s.trim().to_ascii_uppercase().parse()
}

/// Formats a rounded amount with thousands separators, e.g. `1,234,567.89`.
pub fn format_amount(value: Decimal) -> String {
    let rounded = taxlator_core::calculations::common::round_half_up(value);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

/// Formats a fractional rate as a percentage, e.g. `0.075` as `7.5%`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}
