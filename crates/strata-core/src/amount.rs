// crates/strata-core/src/amount.rs
//
// Fixed-point token amounts.
//
// Every balance, transfer quantity, emission and price in Strata is an
// `Amount`: a signed count of 10^-8 token units held in an i128. Arithmetic is
// checked and exact; division truncates toward zero. Binary floating point is
// never used for value.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of fractional decimal digits carried by an `Amount`.
pub const DECIMALS: u32 = 8;

/// Number of base units in one whole token (10^8).
pub const UNITS_PER_TOKEN: i128 = 100_000_000;

/// Errors produced when parsing a decimal string into an `Amount`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount {0} has more than 8 decimal places")]
    TooPrecise(String),
    #[error("amount {0} is out of range")]
    Overflow(String),
}

/// A signed fixed-point token amount with 8 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i128);

impl Amount {
    /// Zero tokens.
    pub const ZERO: Amount = Amount(0);

    /// Build an amount from raw base units (10^-8 tokens).
    pub const fn from_units(units: i128) -> Self {
        Self(units)
    }

    /// Raw base units.
    pub const fn units(self) -> i128 {
        self.0
    }

    /// Build an amount from a whole number of tokens.
    pub const fn from_tokens(tokens: i64) -> Self {
        Self(tokens as i128 * UNITS_PER_TOKEN)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    pub fn checked_neg(self) -> Option<Amount> {
        self.0.checked_neg().map(Amount)
    }

    /// Multiply by a whole number (e.g. a block count).
    pub fn checked_mul_int(self, n: u64) -> Option<Amount> {
        self.0.checked_mul(n as i128).map(Amount)
    }

    /// Divide by a whole number, truncating toward zero. `None` on division by zero.
    pub fn checked_div_int(self, n: u64) -> Option<Amount> {
        if n == 0 {
            return None;
        }
        Some(Amount(self.0 / n as i128))
    }

    /// Compute `self * num / den`, truncating toward zero.
    ///
    /// Used for percentage factors such as 7/10 so that the intermediate
    /// product is exact.
    pub fn mul_ratio(self, num: u64, den: u64) -> Option<Amount> {
        if den == 0 {
            return None;
        }
        self.0
            .checked_mul(num as i128)
            .map(|p| Amount(p / den as i128))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = UNITS_PER_TOKEN as u128;
        let whole = abs / scale;
        let frac = abs % scale;
        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else {
            // Up to 8 decimal places, trailing zeros trimmed.
            let frac_str = format!("{:08}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}{}.{}", sign, whole, trimmed)
        }
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountParseError::Invalid(s.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AmountParseError::Invalid(s.to_string()));
        }
        if frac.len() > DECIMALS as usize {
            return Err(AmountParseError::TooPrecise(s.to_string()));
        }

        let overflow = || AmountParseError::Overflow(s.to_string());
        let whole_units: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse::<i128>().map_err(|_| overflow())?
        };
        let mut frac_units: i128 = 0;
        if !frac.is_empty() {
            let padded = format!("{:0<8}", frac);
            frac_units = padded.parse::<i128>().map_err(|_| overflow())?;
        }
        let units = whole_units
            .checked_mul(UNITS_PER_TOKEN)
            .and_then(|w| w.checked_add(frac_units))
            .ok_or_else(overflow)?;
        Ok(Amount(if negative { -units } else { units }))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount::from_tokens(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        (v as i128)
            .checked_mul(UNITS_PER_TOKEN)
            .map(Amount)
            .ok_or_else(|| E::custom(format!("amount {} is out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        // Rust prints the shortest representation that round-trips, which is
        // identical on every node; parse that text rather than the float bits.
        if !v.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        format!("{}", v).parse().map_err(E::custom)
    }
}
