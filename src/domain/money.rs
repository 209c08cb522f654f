use std::fmt;

/// Money is represented as whole currency units. Chilean pesos have no
/// minor unit, so $18.000 = 18000.
pub type Amount = i64;

/// Format an amount with `.` thousands separators.
/// Example: 18000 -> "$18.000", -1500 -> "-$1.500"
pub fn format_amount(amount: Amount) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}${}", sign, grouped)
}

/// Parse a user-entered amount.
/// Accepts "18000", "18.000" and "$18.000". Dots must group digits by three.
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-').trim_start_matches('$');

    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let groups: Vec<&str> = input.split('.').collect();
    if groups.len() > 1 {
        // Thousands separators: first group 1-3 digits, the rest exactly 3
        let first_ok = (1..=3).contains(&groups[0].len());
        let rest_ok = groups[1..].iter().all(|g| g.len() == 3);
        if !first_ok || !rest_ok {
            return Err(ParseAmountError::InvalidFormat);
        }
    }

    let joined: String = groups.concat();
    if !joined.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseAmountError::InvalidFormat);
    }

    let value: Amount = joined
        .parse()
        .map_err(|_| ParseAmountError::InvalidFormat)?;
    Ok(if negative { -value } else { value })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "empty amount"),
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseAmountError {}
