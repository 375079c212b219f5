// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-point money amounts.
//!
//! Amounts are stored as integer minor units (hundredths) so that no float
//! rounding ever touches a financial value. The textual form is a plain
//! decimal with at most two fractional digits (`"12"`, `"12.5"`, `"-3.10"`),
//! and that is also how amounts travel in JSON.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Number of minor units in one major unit.
const SCALE: i64 = 100;

/// A decimal money amount with two fractional digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    minor: i64,
}

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount { minor: 0 };

    /// Creates an amount from minor units (e.g. cents).
    pub fn from_minor(minor: i64) -> Self {
        Amount { minor }
    }

    /// Returns the amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.minor
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.minor.checked_add(other.minor).map(Amount::from_minor)
    }

    /// Parses an amount from its decimal representation.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        let scale = SCALE.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / scale, abs % scale)
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidAmount(s.to_string());
        let trimmed = s.trim();

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, frac) = match unsigned.split_once('.') {
            Some((whole, frac)) => (whole, Some(frac)),
            None => (unsigned, None),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let frac_minor = match frac {
            None => 0,
            Some(frac) if frac.is_empty() || frac.len() > 2 => return Err(invalid()),
            Some(frac) if !frac.bytes().all(|b| b.is_ascii_digit()) => return Err(invalid()),
            Some(frac) => {
                let value: i64 = frac.parse().map_err(|_| invalid())?;
                if frac.len() == 1 {
                    value * 10
                } else {
                    value
                }
            }
        };

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let minor = whole
            .checked_mul(SCALE)
            .and_then(|m| m.checked_add(frac_minor))
            .ok_or_else(invalid)?;

        Ok(Amount::from_minor(if negative { -minor } else { minor }))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
#[path = "amount_tests.rs"]
mod tests;
