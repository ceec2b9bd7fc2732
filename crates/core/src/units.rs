//! Time and frequency quantities with SI prefixes.
//!
//! Accepts `<number>[ ][prefix][unit]`, e.g. `1.5ms`, `16MHz`, `2 min`,
//! `8M`. Values stay in exact decimal form (integer mantissa and power of
//! ten) so the cycle count `floor(seconds * hertz)` is computed without
//! floating point rounding.
//!
//! The unit suffix is matched before the prefix, so `1min` is one minute
//! and `1ms` one millisecond.

use crate::error::{Error, Result};

/// Physical unit of a parsed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Hertz,
}

impl Unit {
    /// Seconds per unit (1 for hertz).
    fn scale(self) -> u128 {
        match self {
            Unit::Second | Unit::Hertz => 1,
            Unit::Minute => 60,
            Unit::Hour => 60 * 60,
            Unit::Day => 60 * 60 * 24,
        }
    }

    fn is_time(self) -> bool {
        !matches!(self, Unit::Hertz)
    }
}

/// Unit suffixes, longest first where one could shadow another.
const UNITS: &[(&str, Unit)] = &[
    ("min", Unit::Minute),
    ("Hz", Unit::Hertz),
    ("s", Unit::Second),
    ("h", Unit::Hour),
    ("d", Unit::Day),
];

/// SI magnitude prefixes and their decimal exponents.
const PREFIXES: &[(char, i32)] = &[
    ('P', 15),
    ('T', 12),
    ('G', 9),
    ('M', 6),
    ('k', 3),
    ('m', -3),
    ('u', -6),
    ('µ', -6),
    ('n', -9),
    ('p', -12),
    ('f', -15),
];

/// A parsed quantity: `mantissa * 10^exponent` in `unit` (if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity {
    pub mantissa: u128,
    /// Decimal exponent, including fractional digits and the SI prefix.
    pub exponent: i32,
    pub unit: Option<Unit>,
}

impl Quantity {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidQuantity { input: input.to_string(), reason };
        let text = input.trim();

        let number_len = text
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_digit() || c == '.'))
            .map_or(text.len(), |(i, _)| i);
        let (number, suffix) = text.split_at(number_len);

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if int_part.is_empty() {
            return Err(invalid("expected a number"));
        }
        if frac_part.contains('.') {
            return Err(invalid("more than one decimal point"));
        }

        let mut mantissa: u128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = c.to_digit(10).ok_or_else(|| invalid("expected a number"))? as u128;
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(digit))
                .ok_or_else(|| invalid("too many digits"))?;
        }
        let mut exponent = -(frac_part.len() as i32);

        let mut rest = suffix.trim_start();
        let mut unit = None;
        for &(symbol, u) in UNITS {
            if let Some(stripped) = rest.strip_suffix(symbol) {
                unit = Some(u);
                rest = stripped;
                break;
            }
        }

        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {}
            (Some(p), None) => match PREFIXES.iter().find(|&&(sym, _)| sym == p) {
                Some(&(_, e)) => exponent += e,
                None => return Err(invalid("unknown unit or prefix")),
            },
            _ => return Err(invalid("unknown unit or prefix")),
        }

        Ok(Quantity { mantissa, exponent, unit })
    }

    /// Parse a duration; a time unit (`s`, `min`, `h`, `d`) is required.
    pub fn parse_time(input: &str) -> Result<Self> {
        let q = Quantity::parse(input)?;
        match q.unit {
            Some(u) if u.is_time() => Ok(q),
            _ => Err(Error::WrongUnit { input: input.to_string(), expected: "time (s, min, h, d)" }),
        }
    }

    /// Parse a clock frequency; `Hz` may be omitted.
    pub fn parse_frequency(input: &str) -> Result<Self> {
        let q = Quantity::parse(input)?;
        match q.unit {
            None | Some(Unit::Hertz) => Ok(Quantity { unit: Some(Unit::Hertz), ..q }),
            Some(_) => Err(Error::WrongUnit { input: input.to_string(), expected: "frequency (Hz)" }),
        }
    }
}

/// Clock cycles elapsed in `time` at `frequency`, rounded down.
pub fn cycles_for(time: &Quantity, frequency: &Quantity) -> Result<u64> {
    let scale = time.unit.map_or(1, Unit::scale);
    let product = time
        .mantissa
        .checked_mul(frequency.mantissa)
        .and_then(|p| p.checked_mul(scale))
        .ok_or(Error::CycleOverflow)?;
    let exponent = time.exponent + frequency.exponent;

    let cycles = if exponent >= 0 {
        10u128
            .checked_pow(exponent as u32)
            .and_then(|f| product.checked_mul(f))
            .ok_or(Error::CycleOverflow)?
    } else {
        match 10u128.checked_pow(exponent.unsigned_abs()) {
            Some(divisor) => product / divisor,
            // Divisor beyond u128: the product is smaller still.
            None => 0,
        }
    };
    u64::try_from(cycles).map_err(|_| Error::CycleOverflow)
}
