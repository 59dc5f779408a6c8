use thiserror::Error;

/// Money is represented as integer cents to avoid floating-point drift in sums.
/// R$45.50 = 4550 cents.
pub type Cents = i64;

/// Largest amount a single record may carry: one billion currency units.
/// Sums of millions of such records still fit in a `Cents`.
pub const MAX_RECORD_CENTS: Cents = 100_000_000_000;

/// Format cents as a plain decimal string.
/// Example: 4550 -> "45.50", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    #[error("invalid money format: {0:?}")]
    InvalidFormat(String),

    #[error("amount out of range: {0}")]
    OutOfRange(String),
}

/// Parse a decimal string into cents.
/// Accepts "45.50", "45.5", "45", ".50" and a comma as decimal separator ("45,50").
/// Digits past the second decimal place are truncated.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let trimmed = input.trim();
    let invalid = || ParseCentsError::InvalidFormat(input.to_string());

    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let normalized = unsigned.replace(',', ".");

    let (units_str, decimals_str) = match normalized.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (normalized.as_str(), ""),
    };

    if units_str.is_empty() && decimals_str.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(units_str) || !all_digits(decimals_str) {
        return Err(invalid());
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::OutOfRange(input.to_string()))?
    };

    let mut fraction: String = decimals_str.chars().take(2).collect();
    while fraction.len() < 2 {
        fraction.push('0');
    }
    let fraction: i64 = fraction.parse().map_err(|_| invalid())?;

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or_else(|| ParseCentsError::OutOfRange(input.to_string()))?;

    Ok(if negative { -cents } else { cents })
}

/// Convert a floating point amount (as found in JSON payloads) into cents,
/// rounding to the nearest cent.
pub fn cents_from_f64(amount: f64) -> Result<Cents, ParseCentsError> {
    if !amount.is_finite() {
        return Err(ParseCentsError::InvalidFormat(amount.to_string()));
    }
    let cents = (amount * 100.0).round();
    if cents.abs() > i64::MAX as f64 {
        return Err(ParseCentsError::OutOfRange(amount.to_string()));
    }
    Ok(cents as Cents)
}

/// Percentage of `part` over `whole`, 0.0 when `whole` is zero.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
