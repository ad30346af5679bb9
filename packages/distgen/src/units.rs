use std::fmt;

use crate::{Error, Result};

const KIB: u64 = 1024;

/// Parses a byte size such as `4096`, `32K`, `1MiB` or `2g`.
///
/// The suffixes `K`, `M`, `G` and `T` are binary multipliers and are case-insensitive. They
/// may be followed by `B` or `iB`.
///
/// # Errors
///
/// Returns an error if the number is missing or malformed, the suffix is unknown or the
/// result does not fit in a `u64`.
///
/// # Examples
///
/// ```
/// assert_eq!(distgen::parse_size("4096").unwrap(), 4096);
/// assert_eq!(distgen::parse_size("32K").unwrap(), 32 * 1024);
/// assert_eq!(distgen::parse_size("1MiB").unwrap(), 1024 * 1024);
/// assert!(distgen::parse_size("12X").is_err());
/// ```
pub fn parse_size(value: &str) -> Result<u64> {
    let invalid = |problem: String| Error::InvalidSize {
        value: value.to_string(),
        problem,
    };

    let trimmed = value.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(digits_end);

    if digits.is_empty() {
        return Err(invalid("expected a number of bytes".to_string()));
    }

    let number: u64 = digits
        .parse()
        .map_err(|e| invalid(format!("not a valid number: {e}")))?;

    let multiplier = match suffix.to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => KIB,
        "m" | "mb" | "mib" => KIB.pow(2),
        "g" | "gb" | "gib" => KIB.pow(3),
        "t" | "tb" | "tib" => KIB.pow(4),
        _ => return Err(invalid(format!("unknown suffix '{suffix}'"))),
    };

    number
        .checked_mul(multiplier)
        .ok_or_else(|| invalid("does not fit in 64 bits".to_string()))
}

/// Displays a count in a compact, human-readable form such as `32.0 K` or `1.5 G`.
///
/// Values above a decimal threshold (one thousand, one million, ...) are scaled by the
/// matching power of 1024 and printed with one decimal. Smaller values are printed as is.
///
/// # Examples
///
/// ```
/// use distgen::PrettySize;
///
/// assert_eq!(PrettySize(512).to_string(), "512");
/// assert_eq!(PrettySize(32 * 1024).to_string(), "32.0 K");
/// assert_eq!(PrettySize(3 * 1024 * 1024 / 2).to_string(), "1.5 M");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "a display wrapper around a single count"
)]
pub struct PrettySize(pub u64);

impl fmt::Display for PrettySize {
    #[expect(
        clippy::cast_precision_loss,
        reason = "one decimal of precision is all that is printed"
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SCALES: [(u64, u64, &str); 4] = [
            (1_000_000_000_000, KIB * KIB * KIB * KIB, "T"),
            (1_000_000_000, KIB * KIB * KIB, "G"),
            (1_000_000, KIB * KIB, "M"),
            (1_000, KIB, "K"),
        ];

        let value = self.0;

        for (threshold, divisor, suffix) in SCALES {
            if value > threshold {
                return write!(f, "{:.1} {suffix}", value as f64 / divisor as f64);
            }
        }

        write!(f, "{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_suffixed_sizes() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("64").unwrap(), 64);
        assert_eq!(parse_size("64B").unwrap(), 64);
        assert_eq!(parse_size("32k").unwrap(), 32 * 1024);
        assert_eq!(parse_size("32KB").unwrap(), 32 * 1024);
        assert_eq!(parse_size("2M").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1GiB").unwrap(), 1 << 30);
        assert_eq!(parse_size("1t").unwrap(), 1 << 40);
        assert_eq!(parse_size(" 8K ").unwrap(), 8192);
    }

    #[test]
    fn malformed_sizes() {
        for value in ["", "K", "-1", "1.5M", "12X", "4 K", "99999999999999999999"] {
            assert!(
                matches!(parse_size(value), Err(Error::InvalidSize { .. })),
                "'{value}' should be rejected"
            );
        }
    }

    #[test]
    fn overflowing_size() {
        let result = parse_size("20000000T");

        assert!(matches!(result, Err(Error::InvalidSize { .. })));
    }

    #[test]
    fn pretty_thresholds() {
        assert_eq!(PrettySize(0).to_string(), "0");
        assert_eq!(PrettySize(1000).to_string(), "1000");
        assert_eq!(PrettySize(1024).to_string(), "1.0 K");
        assert_eq!(PrettySize(1_000_001).to_string(), "1.0 M");
        assert_eq!(PrettySize(1 << 30).to_string(), "1.0 G");
        assert_eq!(PrettySize(5 << 40).to_string(), "5.0 T");
    }
}
