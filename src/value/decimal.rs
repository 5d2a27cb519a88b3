use std::fmt;
use std::str::FromStr;

use crate::error::ConversionError;

/// Largest number of significant digits (and largest scale) a [`Decimal`] holds.
pub const MAX_DECIMAL_DIGITS: u8 = 38;

/// Arbitrary-precision decimal kept as an integer mantissa and a base-10 scale.
///
/// The textual form is preserved exactly: `"11.50"` parses to mantissa `1150`,
/// scale `2`, and prints back as `"11.50"`. No binary floating point is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u8,
}

impl Decimal {
    /// # Errors
    /// Returns [`ConversionError::EncodingOverflow`] when `scale` exceeds
    /// [`MAX_DECIMAL_DIGITS`].
    pub fn new(mantissa: i128, scale: u8) -> Result<Self, ConversionError> {
        if scale > MAX_DECIMAL_DIGITS {
            return Err(ConversionError::EncodingOverflow(format!(
                "decimal scale {scale} exceeds {MAX_DECIMAL_DIGITS}"
            )));
        }
        Ok(Self { mantissa, scale })
    }

    #[must_use]
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    #[must_use]
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Lossy conversion for display or arithmetic outside this crate.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    /// Same number with trailing fractional zeros removed.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut mantissa = self.mantissa;
        let mut scale = self.scale;
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        Self { mantissa, scale }
    }

    /// Numeric equality, ignoring representation (`1.50 == 1.5`).
    #[must_use]
    pub fn numeric_eq(&self, other: &Decimal) -> bool {
        self.normalized() == other.normalized()
    }
}

impl FromStr for Decimal {
    type Err = ConversionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || ConversionError::Wire(format!("invalid decimal literal `{value}`"));
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let (negative, unsigned) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let mut parts = unsigned.splitn(2, '.');
        let integer_part = parts.next().unwrap_or_default();
        let fractional_part = parts.next().unwrap_or_default();
        if integer_part.is_empty() && fractional_part.is_empty() {
            return Err(invalid());
        }
        if !integer_part.bytes().all(|b| b.is_ascii_digit())
            || !fractional_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let significant = integer_part.trim_start_matches('0').len() + fractional_part.len();
        if significant > usize::from(MAX_DECIMAL_DIGITS)
            || fractional_part.len() > usize::from(MAX_DECIMAL_DIGITS)
        {
            return Err(ConversionError::EncodingOverflow(format!(
                "decimal `{value}` exceeds {MAX_DECIMAL_DIGITS} digits"
            )));
        }

        let joined = format!("{integer_part}{fractional_part}");
        let digits = if joined.is_empty() { "0" } else { joined.as_str() };
        let mut mantissa = digits.parse::<i128>().map_err(|err| {
            ConversionError::EncodingOverflow(format!("decimal `{value}`: {err}"))
        })?;
        if negative {
            mantissa = -mantissa;
        }
        let scale = u8::try_from(fractional_part.len()).map_err(|_| invalid())?;
        Decimal::new(mantissa, scale)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let magnitude = self.mantissa.unsigned_abs();
        if self.scale == 0 {
            return write!(f, "{sign}{magnitude}");
        }
        let divisor = 10_u128.pow(u32::from(self.scale));
        let integer = magnitude / divisor;
        let fraction = magnitude % divisor;
        write!(
            f,
            "{sign}{integer}.{fraction:0width$}",
            width = usize::from(self.scale)
        )
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self {
            mantissa: i128::from(value),
            scale: 0,
        }
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self {
            mantissa: i128::from(value),
            scale: 0,
        }
    }
}

impl TryFrom<f64> for Decimal {
    type Error = ConversionError;

    /// Uses the shortest decimal text that round-trips the float.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(ConversionError::EncodingOverflow(format!(
                "non-finite float {value} has no decimal form"
            )));
        }
        value.to_string().parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_textual_precision() {
        let d: Decimal = "11.50".parse().unwrap();
        assert_eq!(d.mantissa(), 1150);
        assert_eq!(d.scale(), 2);
        assert_eq!(d.to_string(), "11.50");
    }

    #[test]
    fn negative_fraction_keeps_sign() {
        let d: Decimal = "-0.05".parse().unwrap();
        assert_eq!(d.mantissa(), -5);
        assert_eq!(d.to_string(), "-0.05");
    }

    #[test]
    fn leading_dot_and_plus() {
        assert_eq!(".5".parse::<Decimal>().unwrap().to_string(), "0.5");
        assert_eq!("+7".parse::<Decimal>().unwrap().to_string(), "7");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "1.2.3".parse::<Decimal>(),
            Err(ConversionError::Wire(_))
        ));
        assert!(matches!("abc".parse::<Decimal>(), Err(ConversionError::Wire(_))));
        assert!(matches!("-".parse::<Decimal>(), Err(ConversionError::Wire(_))));
    }

    #[test]
    fn too_many_digits_overflow() {
        let text = format!("1{}", "0".repeat(40));
        assert!(matches!(
            text.parse::<Decimal>(),
            Err(ConversionError::EncodingOverflow(_))
        ));
    }

    #[test]
    fn from_float_uses_shortest_text() {
        let d = Decimal::try_from(11.5_f64).unwrap();
        assert_eq!(d.to_string(), "11.5");
        assert!(Decimal::try_from(f64::INFINITY).is_err());
    }

    #[test]
    fn numeric_equality_ignores_trailing_zeros() {
        let a: Decimal = "1.50".parse().unwrap();
        let b: Decimal = "1.5".parse().unwrap();
        assert_ne!(a, b);
        assert!(a.numeric_eq(&b));
    }
}
