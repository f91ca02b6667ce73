use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration {0:?} is out of range")]
    Overflow(String),
}

/// A duration written the way operators write them: `1h`, `15m`, `500ms`,
/// `1h30m`, `1.5s`. A bare `0` is the zero duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationString(pub Duration);

impl DurationString {
    /// The duration, or `None` when it was left unset.
    pub fn non_zero(self) -> Option<Duration> {
        (!self.0.is_zero()).then_some(self.0)
    }
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 60 * 60 * 1_000_000_000,
        _ => return None,
    })
}

impl FromStr for DurationString {
    type Err = DurationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || DurationError::Invalid(input.to_string());

        let s = input.strip_prefix('+').unwrap_or(input);
        if s == "0" {
            return Ok(Self::default());
        }
        if s.is_empty() || s.starts_with('-') {
            return Err(invalid());
        }

        let mut total: u128 = 0;
        let mut rest = s;
        while !rest.is_empty() {
            let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            let (int_part, after_int) = rest.split_at(int_len);

            let (frac_part, after_number) = match after_int.strip_prefix('.') {
                Some(frac) => {
                    let frac_len = frac.find(|c: char| !c.is_ascii_digit()).unwrap_or(frac.len());
                    frac.split_at(frac_len)
                }
                None => ("", after_int),
            };
            if int_part.is_empty() && frac_part.is_empty() {
                return Err(invalid());
            }

            let unit_len = after_number
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(after_number.len());
            let (unit, remainder) = after_number.split_at(unit_len);
            if unit.is_empty() {
                return Err(DurationError::MissingUnit(input.to_string()));
            }
            let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
                unit: unit.to_string(),
                input: input.to_string(),
            })?;

            let overflow = || DurationError::Overflow(input.to_string());
            let whole: u128 = if int_part.is_empty() {
                0
            } else {
                int_part.parse().map_err(|_| overflow())?
            };
            let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;

            // Digits past nanosecond precision cannot change the result.
            let frac_digits = &frac_part[..frac_part.len().min(18)];
            if !frac_digits.is_empty() {
                let numerator: u128 = frac_digits.parse().map_err(|_| invalid())?;
                let denominator = 10u128.pow(u32::try_from(frac_digits.len()).map_err(|_| invalid())?);
                value = value
                    .checked_add(numerator * scale / denominator)
                    .ok_or_else(overflow)?;
            }

            total = total.checked_add(value).ok_or_else(overflow)?;
            rest = remainder;
        }

        let secs = u64::try_from(total / 1_000_000_000)
            .map_err(|_| DurationError::Overflow(input.to_string()))?;
        let nanos = u32::try_from(total % 1_000_000_000).map_err(|_| invalid())?;
        Ok(Self(Duration::new(secs, nanos)))
    }
}

// YAML reads a bare `0` as an integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Text(String),
    Number(u64),
}

impl<'de> Deserialize<'de> for DurationString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match RawDuration::deserialize(deserializer)? {
            RawDuration::Text(text) => text,
            RawDuration::Number(number) => number.to_string(),
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}
