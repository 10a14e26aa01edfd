use std::{
    fmt,
    iter::Sum,
    ops::{Add, Mul},
    str::FromStr,
};

use alloy_primitives::U256;
use malachite::{
    num::{
        arithmetic::traits::Pow,
        basic::traits::Zero,
        conversion::{
            string::options::ToSciOptions,
            traits::{FromSciString, ToSci},
        },
    },
    rounding_modes::RoundingMode,
    Natural, Rational,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::utils::u256_to_natural;

/// fractional digits rendered by [`fmt::Display`]
pub const DISPLAY_SCALE: u32 = 18;

/// largest accepted `|exponent|` in scientific notation
pub const MAX_EXPONENT: u64 = 10_000;

/// `10^decimals`, the factor between a token's smallest unit and one whole token.
pub fn scale_factor(decimals: u8) -> Natural {
    Natural::from(10u8).pow(decimals as u64)
}

/// An exact decimal quantity.
///
/// Backed by an arbitrary precision rational so that sums, products and
/// quotients never lose precision. Rounding only happens when the value is
/// rendered with [`DecimalValue::to_fixed`] or [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecimalValue(Rational);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid decimal `{0}`")]
pub struct ParseDecimalError(pub String);

impl DecimalValue {
    pub const ZERO: Self = Self(Rational::ZERO);

    /// Converts a raw on-chain integer amount into whole token units by
    /// dividing by `10^decimals`.
    pub fn from_raw(raw: U256, decimals: u8) -> Self {
        Self(Rational::from_naturals(
            u256_to_natural(raw),
            scale_factor(decimals),
        ))
    }

    pub fn from_rational(value: Rational) -> Self {
        Self(value)
    }

    pub fn as_rational(&self) -> &Rational {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Rational::ZERO
    }

    /// `None` when `rhs` is zero.
    pub fn checked_div(&self, rhs: &Self) -> Option<Self> {
        if rhs.is_zero() {
            return None
        }
        Some(Self(&self.0 / &rhs.0))
    }

    /// Renders the value with exactly `scale` fractional digits, rounding
    /// half to even.
    pub fn to_fixed(&self, scale: u32) -> String {
        let mut options = plain_options();
        options.set_scale(scale as u64);
        options.set_include_trailing_zeros(true);
        self.render(options)
    }

    fn render(&self, options: ToSciOptions) -> String {
        let rendered = self.0.to_sci_with_options(options).to_string();

        // a negative value that rounds to zero keeps no sign
        match rendered.strip_prefix('-') {
            Some(rest) if rest.bytes().all(|c| c == b'0' || c == b'.') => rest.to_string(),
            _ => rendered,
        }
    }
}

/// Positional notation, never an exponent.
fn plain_options() -> ToSciOptions {
    let mut options = ToSciOptions::default();
    options.set_rounding_mode(RoundingMode::Nearest);
    options.set_neg_exp_threshold(i64::MIN);
    options
}

impl fmt::Display for DecimalValue {
    /// Up to [`DISPLAY_SCALE`] fractional digits with trailing zeros trimmed.
    /// Non-zero values smaller than that keep their leading significant digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut options = plain_options();
        options.set_scale(DISPLAY_SCALE as u64);

        let rendered = self.render(options);
        if rendered != "0" || self.is_zero() {
            return f.write_str(&rendered)
        }

        options.set_precision(DISPLAY_SCALE as u64);
        f.write_str(&self.render(options))
    }
}

impl FromStr for DecimalValue {
    type Err = ParseDecimalError;

    /// Accepts plain decimals (`"12"`, `"-0.25"`, `".5"`) and scientific
    /// notation (`"1.5e-3"`) with an exponent of at most [`MAX_EXPONENT`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(err())
        }

        if let Some((_, exponent)) = trimmed.split_once(['e', 'E']) {
            let exponent = exponent.parse::<i64>().map_err(|_| err())?;
            if exponent.unsigned_abs() > MAX_EXPONENT {
                return Err(err())
            }
        }

        Rational::from_sci_string(trimmed).map(Self).ok_or_else(err)
    }
}

impl From<u64> for DecimalValue {
    fn from(value: u64) -> Self {
        Self(Rational::from(value))
    }
}

impl Add for DecimalValue {
    type Output = DecimalValue;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a DecimalValue> for &'a DecimalValue {
    type Output = DecimalValue;

    fn add(self, rhs: &'a DecimalValue) -> Self::Output {
        DecimalValue(&self.0 + &rhs.0)
    }
}

impl Mul for DecimalValue {
    type Output = DecimalValue;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl<'a> Mul<&'a DecimalValue> for &'a DecimalValue {
    type Output = DecimalValue;

    fn mul(self, rhs: &'a DecimalValue) -> Self::Output {
        DecimalValue(&self.0 * &rhs.0)
    }
}

impl Sum for DecimalValue {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, v| acc + v)
    }
}

impl Serialize for DecimalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DecimalValue {
    /// Accepts JSON strings and JSON numbers. Numbers are read from their
    /// literal text, never through a float.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let text = raw.get();

        let literal = if text.starts_with('"') {
            serde_json::from_str::<String>(text).map_err(serde::de::Error::custom)?
        } else {
            text.to_string()
        };

        literal.parse().map_err(serde::de::Error::custom)
    }
}
