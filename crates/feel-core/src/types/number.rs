//! FEEL numbers
//!
//! A FEEL number has several machine representations. Native arithmetic keeps the
//! narrowest representation that holds the result and widens on overflow; decimal
//! arithmetic is exact, except division which rounds to a fixed number of significant
//! digits.

use crate::ast::InfixOp;
use crate::types::NumberKind;
use bigdecimal::{BigDecimal, FromPrimitive, One, RoundingMode, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

/// Significant digits kept by decimal division (IEEE 754 decimal128)
pub const DECIMAL_PRECISION: u64 = 34;

/// Largest exponent computed exactly; larger ones go through doubles
const MAX_EXACT_EXPONENT: u64 = 9_999;

/// Numeric value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Number {
    Integer(i32),
    Long(i64),
    Double(f64),
    Decimal(BigDecimal),
}

impl Number {
    /// Parse a FEEL number literal.
    ///
    /// Integral text becomes the narrowest integer that holds it; any fraction or
    /// exponent makes it a decimal.
    pub fn parse_literal(text: &str) -> Option<Number> {
        if text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = text.parse::<i32>() {
                return Some(Number::Integer(i));
            }
            if let Ok(l) = text.parse::<i64>() {
                return Some(Number::Long(l));
            }
        }
        BigDecimal::from_str(text).ok().map(Number::Decimal)
    }

    /// Representation of this number
    pub fn kind(&self) -> NumberKind {
        match self {
            Number::Integer(_) => NumberKind::Integer,
            Number::Long(_) => NumberKind::Long,
            Number::Double(_) => NumberKind::Double,
            Number::Decimal(_) => NumberKind::BigDecimal,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Long(l) => *l as f64,
            Number::Double(d) => *d,
            Number::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// Exact decimal view. Doubles go through their shortest text form.
    pub fn to_decimal(&self) -> BigDecimal {
        match self {
            Number::Integer(i) => BigDecimal::from(*i),
            Number::Long(l) => BigDecimal::from(*l),
            Number::Double(d) => BigDecimal::from_str(&d.to_string())
                .ok()
                .or_else(|| BigDecimal::from_f64(*d))
                .unwrap_or_else(BigDecimal::zero),
            Number::Decimal(d) => d.clone(),
        }
    }

    /// Integral value, if this number has no fractional part and fits in i64
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i as i64),
            Number::Long(l) => Some(*l),
            Number::Double(d) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
            Number::Double(_) => None,
            Number::Decimal(d) if d.is_integer() => d.to_i64(),
            Number::Decimal(_) => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(i) => *i == 0,
            Number::Long(l) => *l == 0,
            Number::Double(d) => *d == 0.0,
            Number::Decimal(d) => d.is_zero(),
        }
    }

    /// Convert to the given representation. `Number` keeps the current one.
    pub fn convert(&self, kind: NumberKind) -> Option<Number> {
        let converted = match kind {
            NumberKind::Number => self.clone(),
            NumberKind::Integer => Number::Integer(self.to_i64()?.try_into().ok()?),
            NumberKind::Long => Number::Long(match self {
                Number::Double(d) => d.trunc() as i64,
                Number::Decimal(d) => d.with_scale(0).to_i64()?,
                other => other.to_i64()?,
            }),
            NumberKind::Double => Number::Double(self.to_f64()),
            NumberKind::BigDecimal => Number::Decimal(self.to_decimal()),
        };
        Some(converted)
    }

    /// Apply an arithmetic operator.
    ///
    /// `exact` forces decimal arithmetic. Returns `None` on division by zero or for
    /// non-arithmetic operators.
    pub fn arith(&self, op: InfixOp, rhs: &Number, exact: bool) -> Option<Number> {
        match op {
            InfixOp::Div => self.div(rhs),
            InfixOp::Pow => self.pow(rhs),
            InfixOp::Add | InfixOp::Sub | InfixOp::Mul => {
                if exact {
                    Some(decimal_op(op, &self.to_decimal(), &rhs.to_decimal()))
                } else {
                    native_op(op, self, rhs)
                }
            }
            _ => None,
        }
    }

    /// Decimal division rounded half-even to `DECIMAL_PRECISION` digits
    pub fn div(&self, rhs: &Number) -> Option<Number> {
        self.div_with_precision(rhs, DECIMAL_PRECISION)
    }

    /// Decimal division rounded half-even to `precision` significant digits
    pub fn div_with_precision(&self, rhs: &Number, precision: u64) -> Option<Number> {
        if rhs.is_zero() {
            return None;
        }
        let quotient = self.to_decimal() / rhs.to_decimal();
        Some(Number::Decimal(round_to(quotient, precision)))
    }

    /// Exponentiation. An integral exponent up to `MAX_EXACT_EXPONENT` is
    /// computed exactly by squaring; results that overflow a double are null.
    pub fn pow(&self, rhs: &Number) -> Option<Number> {
        match (self, rhs.to_i64()) {
            (Number::Double(base), Some(exp)) => {
                let exp = i32::try_from(exp).ok()?;
                finite(base.powi(exp))
            }
            (_, Some(exp)) if exp.unsigned_abs() <= MAX_EXACT_EXPONENT => {
                let base = self.to_decimal();
                if exp < 0 && base.is_zero() {
                    return None;
                }
                let mut result = BigDecimal::one();
                let mut square = base;
                let mut remaining = exp.unsigned_abs();
                while remaining > 0 {
                    if remaining & 1 == 1 {
                        result = round(&result * &square);
                    }
                    square = round(&square * &square);
                    remaining >>= 1;
                }
                if exp < 0 {
                    result = round(BigDecimal::one() / result);
                }
                Some(Number::Decimal(result.normalized()).narrowed(self))
            }
            _ => finite(self.to_f64().powf(rhs.to_f64())),
        }
    }

    /// Arithmetic negation
    pub fn neg(&self) -> Number {
        match self {
            Number::Integer(i) => i
                .checked_neg()
                .map(Number::Integer)
                .unwrap_or(Number::Long(-(*i as i64))),
            Number::Long(l) => l
                .checked_neg()
                .map(Number::Long)
                .unwrap_or_else(|| Number::Decimal(-BigDecimal::from(*l))),
            Number::Double(d) => Number::Double(-d),
            Number::Decimal(d) => Number::Decimal(-d),
        }
    }

    /// Numeric ordering. Decimals compare exactly, everything else as doubles.
    pub fn compare(&self, other: &Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(b)),
            (Number::Integer(_) | Number::Long(_), Number::Integer(_) | Number::Long(_)) => {
                Some(self.to_i64()?.cmp(&other.to_i64()?))
            }
            (Number::Decimal(_), _) | (_, Number::Decimal(_)) => {
                Some(self.to_decimal().cmp(&other.to_decimal()))
            }
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Keep an integral decimal result in the native representation of `origin`
    fn narrowed(self, origin: &Number) -> Number {
        match (&self, origin) {
            (Number::Decimal(d), Number::Integer(_) | Number::Long(_)) if d.is_integer() => {
                match d.to_i64() {
                    Some(l) => i32::try_from(l)
                        .map(Number::Integer)
                        .unwrap_or(Number::Long(l)),
                    None => self,
                }
            }
            _ => self,
        }
    }
}

fn finite(value: f64) -> Option<Number> {
    value.is_finite().then_some(Number::Double(value))
}

fn round(value: BigDecimal) -> BigDecimal {
    round_to(value, DECIMAL_PRECISION)
}

fn round_to(value: BigDecimal, precision: u64) -> BigDecimal {
    match NonZeroU64::new(precision) {
        Some(precision) => value
            .with_precision_round(precision, RoundingMode::HalfEven)
            .normalized(),
        None => value,
    }
}

fn decimal_op(op: InfixOp, l: &BigDecimal, r: &BigDecimal) -> Number {
    let result = match op {
        InfixOp::Add => l + r,
        InfixOp::Sub => l - r,
        _ => l * r,
    };
    Number::Decimal(result)
}

fn native_op(op: InfixOp, l: &Number, r: &Number) -> Option<Number> {
    match (l, r) {
        (Number::Integer(a), Number::Integer(b)) => {
            let narrow = match op {
                InfixOp::Add => a.checked_add(*b),
                InfixOp::Sub => a.checked_sub(*b),
                _ => a.checked_mul(*b),
            };
            match narrow {
                Some(v) => Some(Number::Integer(v)),
                None => native_op(op, &Number::Long(*a as i64), &Number::Long(*b as i64)),
            }
        }
        (Number::Integer(_) | Number::Long(_), Number::Integer(_) | Number::Long(_)) => {
            let (a, b) = (l.to_i64()?, r.to_i64()?);
            let wide = match op {
                InfixOp::Add => a.checked_add(b),
                InfixOp::Sub => a.checked_sub(b),
                _ => a.checked_mul(b),
            };
            Some(match wide {
                Some(v) => Number::Long(v),
                None => decimal_op(op, &BigDecimal::from(a), &BigDecimal::from(b)),
            })
        }
        (Number::Decimal(_), _) | (_, Number::Decimal(_)) => {
            Some(decimal_op(op, &l.to_decimal(), &r.to_decimal()))
        }
        _ => {
            let (a, b) = (l.to_f64(), r.to_f64());
            let result = match op {
                InfixOp::Add => a + b,
                InfixOp::Sub => a - b,
                _ => a * b,
            };
            finite(result)
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Long(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Double(value)
    }
}

impl From<BigDecimal> for Number {
    fn from(value: BigDecimal) -> Self {
        Number::Decimal(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Long(l) => write!(f, "{}", l),
            Number::Double(d) => write!(f, "{:?}", d),
            Number::Decimal(d) => write!(f, "{}", d.normalized()),
        }
    }
}
