use std::fmt;

/// Money is represented as integer minor units (paise/cents) so that repeated
/// additions never drift. ₹50.00 = 5000.
pub type Cents = i64;

/// Largest single amount a ledger accepts (one hundred billion in major
/// units). Summing a million of these still fits in an `i64`.
pub const MAX_AMOUNT_CENTS: Cents = 10_000_000_000_000;

/// Format minor units as a human-readable amount.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse a user-entered amount into minor units.
///
/// Amounts recorded in a ledger are always strictly positive, so signs are
/// rejected, as is anything with more than two fractional digits.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_amount(input: &str) -> Result<Cents, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }
    if input.starts_with('-') || input.starts_with('+') {
        return Err(ParseAmountError::Signed);
    }

    let (units_str, fraction_str) = match input.split_once('.') {
        Some((units, fraction)) => (units, fraction),
        None => (input, ""),
    };

    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !fraction_str.chars().all(|c| c.is_ascii_digit())
        || (units_str.is_empty() && fraction_str.is_empty())
    {
        return Err(ParseAmountError::InvalidFormat);
    }
    if fraction_str.len() > 2 {
        return Err(ParseAmountError::TooPrecise);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseAmountError::InvalidFormat)?
    };
    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        // "12.5" means fifty minor units, not five
        1 => fraction_str.parse::<i64>().map_err(|_| ParseAmountError::InvalidFormat)? * 10,
        _ => fraction_str
            .parse()
            .map_err(|_| ParseAmountError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or(ParseAmountError::Overflow)?;

    if cents == 0 {
        return Err(ParseAmountError::Zero);
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ParseAmountError::Overflow);
    }
    Ok(cents)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    Signed,
    InvalidFormat,
    TooPrecise,
    Overflow,
    Zero,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "amount is required"),
            ParseAmountError::Signed => write!(f, "amount must not carry a sign"),
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
            ParseAmountError::TooPrecise => write!(f, "at most two decimal places are allowed"),
            ParseAmountError::Overflow => write!(f, "amount is too large"),
            ParseAmountError::Zero => write!(f, "amount must be greater than zero"),
        }
    }
}

impl std::error::Error for ParseAmountError {}
