//! Parsing of user-entered amounts.

use crate::error::ValidationError;

/// Smallest amount accepted for a shift or a payout request.
pub const MIN_AMOUNT: f64 = 1.0;

/// Parse a free-text amount.
///
/// Accepts a plain decimal number with optional surrounding whitespace. A
/// decimal comma is accepted as well as a decimal point. The result must be
/// finite and at least [`MIN_AMOUNT`].
pub fn parse_amount(text: &str) -> Result<f64, ValidationError> {
    let text = text.trim();
    let normalized = text.replace(',', ".");

    let amount: f64 = normalized
        .parse()
        .map_err(|_| ValidationError::NotANumber(text.to_string()))?;

    if !amount.is_finite() {
        return Err(ValidationError::NotFinite);
    }

    if amount < MIN_AMOUNT {
        return Err(ValidationError::BelowMinimum { min: MIN_AMOUNT });
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_valid() {
        assert_eq!(parse_amount("150"), Ok(150.0));
        assert_eq!(parse_amount(" 99.5 "), Ok(99.5));
        assert_eq!(parse_amount("12,25"), Ok(12.25));
        assert_eq!(parse_amount("1"), Ok(1.0));
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert!(matches!(
            parse_amount("abc"),
            Err(ValidationError::NotANumber(_))
        ));
        assert!(matches!(parse_amount(""), Err(ValidationError::NotANumber(_))));
        assert_eq!(parse_amount("inf"), Err(ValidationError::NotFinite));
        assert_eq!(parse_amount("NaN"), Err(ValidationError::NotFinite));
    }

    #[test]
    fn test_parse_amount_below_minimum() {
        assert_eq!(
            parse_amount("0.5"),
            Err(ValidationError::BelowMinimum { min: MIN_AMOUNT })
        );
        assert_eq!(
            parse_amount("-10"),
            Err(ValidationError::BelowMinimum { min: MIN_AMOUNT })
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::BelowMinimum { min: 1.0 };
        assert_eq!(err.to_string(), "amount must be at least 1");

        let err = ValidationError::NotANumber("x".to_string());
        assert_eq!(err.to_string(), "not a number: \"x\"");
    }
}
