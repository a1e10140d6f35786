use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{Num, One, ToPrimitive, Zero};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Non-negative integer of unbounded size.
///
/// Serializes as a decimal string so that values above 2^53 survive JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigNum(BigUint);

/// Block heights share the big-number representation.
pub type BlockNumber = BigNum;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid numeric quantity {input:?}")]
pub struct ParseBigNumError {
    input: String,
}

impl BigNum {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    /// Lossy conversion for display-scale values.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::INFINITY)
    }

    /// `self - rhs`, clamped at zero.
    pub fn saturating_sub(&self, rhs: u64) -> Self {
        let rhs = BigUint::from(rhs);
        if self.0 <= rhs {
            Self::zero()
        } else {
            Self(&self.0 - &rhs)
        }
    }

    pub fn successor(&self) -> Self {
        Self(&self.0 + &BigUint::one())
    }
}

impl From<u64> for BigNum {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for BigNum {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl FromStr for BigNum {
    type Err = ParseBigNumError;

    /// Accepts decimal digits or a `0x`-prefixed hex quantity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ParseBigNumError {
            input: s.to_string(),
        };
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) if !hex.is_empty() => BigUint::from_str_radix(hex, 16),
            Some(_) => return Err(err()),
            None if !trimmed.is_empty() => BigUint::from_str_radix(trimmed, 10),
            None => return Err(err()),
        };
        parsed.map(Self).map_err(|_| err())
    }
}

impl fmt::Display for BigNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Add for BigNum {
    type Output = BigNum;

    fn add(self, rhs: BigNum) -> BigNum {
        BigNum(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a BigNum> for BigNum {
    type Output = BigNum;

    fn add(self, rhs: &'a BigNum) -> BigNum {
        BigNum(self.0 + &rhs.0)
    }
}

impl Sum for BigNum {
    fn sum<I: Iterator<Item = BigNum>>(iter: I) -> Self {
        iter.fold(BigNum::zero(), |acc, n| acc + n)
    }
}

impl<'a> Sum<&'a BigNum> for BigNum {
    fn sum<I: Iterator<Item = &'a BigNum>>(iter: I) -> Self {
        iter.fold(BigNum::zero(), |acc, n| acc + n)
    }
}

impl Serialize for BigNum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BigNum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Exact mean of `count` values summing to `total`.
///
/// An average over zero values is zero. Equality compares the rational
/// values, so `40 / 2 == 20 / 1`.
#[derive(Debug, Clone, Default)]
pub struct Average {
    total: BigNum,
    count: u64,
}

impl Average {
    pub fn new(total: BigNum, count: u64) -> Self {
        Self { total, count }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn total(&self) -> &BigNum {
        &self.total
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_zero(&self) -> bool {
        self.count == 0 || self.total.is_zero()
    }

    /// Integer part of the mean.
    pub fn quotient(&self) -> BigNum {
        if self.count == 0 {
            return BigNum::zero();
        }
        BigNum(self.total.0.div_floor(&BigUint::from(self.count)))
    }

    /// Mean as a display value. The integer part is computed exactly first.
    pub fn to_f64(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let (quotient, remainder) = self.total.0.div_rem(&BigUint::from(self.count));
        let whole = quotient.to_f64().unwrap_or(f64::INFINITY);
        let frac = remainder.to_f64().unwrap_or(0.0) / self.count as f64;
        whole + frac
    }
}

impl PartialEq for Average {
    fn eq(&self, other: &Self) -> bool {
        match (self.count, other.count) {
            (0, 0) => true,
            (0, _) => other.total.is_zero(),
            (_, 0) => self.total.is_zero(),
            (lhs, rhs) => &self.total.0 * BigUint::from(rhs) == &other.total.0 * BigUint::from(lhs),
        }
    }
}

impl Eq for Average {}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl Serialize for Average {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Average", 3)?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("count", &self.count)?;
        state.serialize_field("value", &self.to_f64())?;
        state.end()
    }
}
