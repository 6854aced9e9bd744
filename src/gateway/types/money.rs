//! Money input type for API boundary enforcement

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Largest number of fractional digits accepted for a currency amount
pub const MAX_SCALE: u32 = 2;

/// Amount as sent by clients: a JSON string in plain decimal notation.
///
/// - Rejects JSON numbers (precision would be lost before we see them)
/// - Rejects `.5`, `5.`, `+5`, scientific notation and empty strings
/// - Rejects more than [`MAX_SCALE`] fractional digits
///
/// The sign is kept; services decide whether negatives are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[schema(value_type = String, example = "40.00")]
pub struct MoneyAmount(Decimal);

impl MoneyAmount {
    pub fn inner(self) -> Decimal {
        self.0
    }

    /// Validate the textual form of an amount
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.is_empty() {
            return Err("Amount cannot be empty".to_string());
        }
        let digits = s.strip_prefix('-').unwrap_or(s);
        if digits.starts_with('+') || s.starts_with('+') {
            return Err("Invalid format: + prefix not allowed".to_string());
        }
        if digits.starts_with('.') {
            return Err("Invalid format: use 0.5 not .5".to_string());
        }
        if digits.ends_with('.') {
            return Err("Invalid format: use 5.0 not 5.".to_string());
        }
        if digits.contains(['e', 'E']) {
            return Err("Invalid format: scientific notation not allowed".to_string());
        }

        let d = Decimal::from_str(s).map_err(|e| format!("Invalid decimal: {}", e))?;
        if d.scale() > MAX_SCALE {
            return Err(format!(
                "Amount supports at most {} decimal places",
                MAX_SCALE
            ));
        }
        Ok(Self(d))
    }
}

impl std::ops::Deref for MoneyAmount {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MoneyAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let s = String::deserialize(deserializer)?;
        MoneyAmount::parse(&s).map_err(D::Error::custom)
    }
}

impl Serialize for MoneyAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_strings() {
        let a: MoneyAmount = serde_json::from_str(r#""40.50""#).unwrap();
        assert_eq!(*a, Decimal::new(4050, 2));
        let a: MoneyAmount = serde_json::from_str(r#""-5""#).unwrap();
        assert_eq!(a.inner(), Decimal::from(-5));
    }

    #[test]
    fn test_rejects_json_number() {
        let result: Result<MoneyAmount, _> = serde_json::from_str("1.5");
        assert!(result.unwrap_err().to_string().contains("expected a string"));
    }

    #[test]
    fn test_rejects_loose_formats() {
        for (input, needle) in [
            (r#""""#, "cannot be empty"),
            (r#"".5""#, "use 0.5 not .5"),
            (r#""-.5""#, "use 0.5 not .5"),
            (r#""5.""#, "use 5.0 not 5."),
            (r#""+5""#, "+ prefix"),
            (r#""1.5e8""#, "scientific notation"),
            (r#""1.005""#, "decimal places"),
        ] {
            let err = serde_json::from_str::<MoneyAmount>(input).unwrap_err();
            assert!(err.to_string().contains(needle), "{input}: {err}");
        }
    }

    #[test]
    fn test_serializes_as_string() {
        let a = MoneyAmount::parse("12.30").unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), r#""12.30""#);
    }
}
