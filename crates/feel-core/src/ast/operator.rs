//! Operators for FEEL expressions

use crate::types::{FType, NumberKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfixOp {
    // Arithmetic operators
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Exponentiation (**)
    Pow,

    // Comparison operators
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,

    // Logical operators
    /// Three-valued conjunction
    And,
    /// Three-valued disjunction
    Or,
}

impl InfixOp {
    /// Source symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Pow => "**",
            InfixOp::Lt => "<",
            InfixOp::Le => "<=",
            InfixOp::Gt => ">",
            InfixOp::Ge => ">=",
            InfixOp::Eq => "=",
            InfixOp::Ne => "!=",
            InfixOp::And => "and",
            InfixOp::Or => "or",
        }
    }

    /// Returns true for `+ - * / **`
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            InfixOp::Add | InfixOp::Sub | InfixOp::Mul | InfixOp::Div | InfixOp::Pow
        )
    }

    /// Returns true for operators producing a boolean
    pub fn is_boolean(&self) -> bool {
        !self.is_arithmetic()
    }

    /// Returns true for `< <= > >=`
    pub fn is_ordering(&self) -> bool {
        matches!(self, InfixOp::Lt | InfixOp::Le | InfixOp::Gt | InfixOp::Ge)
    }

    /// Returns true for `=` and `!=`
    pub fn is_eq_ne(&self) -> bool {
        matches!(self, InfixOp::Eq | InfixOp::Ne)
    }

    /// Returns true for `and` and `or`
    pub fn is_and_or(&self) -> bool {
        matches!(self, InfixOp::And | InfixOp::Or)
    }

    /// Operators accepting operands of different type families
    pub fn supports_mixed_types(&self) -> bool {
        self.is_eq_ne() || self.is_and_or()
    }

    /// Static result type of applying this operator.
    ///
    /// `Null` means the combination can only ever produce null.
    pub fn result_type(&self, left: &FType, right: &FType) -> FType {
        if self.supports_mixed_types() {
            return FType::Boolean;
        }
        if self.is_ordering() {
            return if comparable(left, right) {
                FType::Boolean
            } else {
                FType::Null
            };
        }
        if left.is_any() || right.is_any() {
            return FType::Any;
        }
        if *self == InfixOp::Add && (left.is_string() || right.is_string()) {
            return FType::String;
        }
        if let Some(temporal) = temporal_result(*self, left, right) {
            return temporal;
        }
        match (left, right) {
            (FType::Number(a), FType::Number(b)) => match self {
                InfixOp::Pow => FType::NUMBER,
                InfixOp::Div if *a == NumberKind::Number || *b == NumberKind::Number => {
                    FType::NUMBER
                }
                InfixOp::Div => FType::BIG_DECIMAL,
                _ => FType::Number((*a).max(*b)),
            },
            _ => FType::Null,
        }
    }
}

/// Whether two types can be ordered against each other
pub fn comparable(left: &FType, right: &FType) -> bool {
    match (left, right) {
        (FType::Any | FType::Null, _) | (_, FType::Any | FType::Null) => true,
        (FType::Date | FType::DateTime, FType::Date | FType::DateTime) => true,
        (FType::List(_) | FType::Context(_) | FType::Function { .. }, _) => false,
        (l, r) => l.is_same_type(r),
    }
}

fn temporal_result(op: InfixOp, left: &FType, right: &FType) -> Option<FType> {
    use FType::*;
    let result = match (op, left, right) {
        (InfixOp::Sub, Date | DateTime, Date | DateTime) | (InfixOp::Sub, Time, Time) => {
            DayTimeDuration
        }
        (InfixOp::Add | InfixOp::Sub, Date | DateTime | Time, DayTimeDuration)
        | (InfixOp::Add | InfixOp::Sub, Date | DateTime, YearMonthDuration) => left.clone(),
        (InfixOp::Add, DayTimeDuration, Date | DateTime | Time)
        | (InfixOp::Add, YearMonthDuration, Date | DateTime) => right.clone(),
        (InfixOp::Add | InfixOp::Sub, DayTimeDuration, DayTimeDuration)
        | (InfixOp::Add | InfixOp::Sub, YearMonthDuration, YearMonthDuration) => left.clone(),
        (InfixOp::Mul | InfixOp::Div, DayTimeDuration | YearMonthDuration, Number(_)) => {
            left.clone()
        }
        (InfixOp::Mul, Number(_), DayTimeDuration | YearMonthDuration) => right.clone(),
        (InfixOp::Div, DayTimeDuration, DayTimeDuration)
        | (InfixOp::Div, YearMonthDuration, YearMonthDuration) => FType::NUMBER,
        _ => return None,
    };
    Some(result)
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_classes() {
        assert!(InfixOp::Add.is_arithmetic());
        assert!(InfixOp::Pow.is_arithmetic());
        assert!(!InfixOp::Eq.is_arithmetic());
        assert!(InfixOp::Lt.is_ordering());
        assert!(InfixOp::Ne.is_eq_ne());
        assert!(InfixOp::Or.is_and_or());
        assert!(InfixOp::And.supports_mixed_types());
        assert!(!InfixOp::Ge.supports_mixed_types());
    }

    #[test]
    fn test_arithmetic_result_types() {
        assert_eq!(InfixOp::Add.result_type(&FType::INTEGER, &FType::INTEGER), FType::INTEGER);
        assert_eq!(InfixOp::Add.result_type(&FType::INTEGER, &FType::DOUBLE), FType::DOUBLE);
        assert_eq!(
            InfixOp::Mul.result_type(&FType::BIG_DECIMAL, &FType::LONG),
            FType::BIG_DECIMAL
        );
        assert_eq!(InfixOp::Div.result_type(&FType::INTEGER, &FType::INTEGER), FType::BIG_DECIMAL);
        assert_eq!(InfixOp::Add.result_type(&FType::String, &FType::INTEGER), FType::String);
        assert_eq!(InfixOp::Sub.result_type(&FType::String, &FType::INTEGER), FType::Null);
        assert_eq!(InfixOp::Add.result_type(&FType::Null, &FType::INTEGER), FType::Null);
        assert_eq!(InfixOp::Add.result_type(&FType::Any, &FType::INTEGER), FType::Any);
    }

    #[test]
    fn test_boolean_result_types() {
        assert_eq!(InfixOp::Eq.result_type(&FType::String, &FType::INTEGER), FType::Boolean);
        assert_eq!(InfixOp::Lt.result_type(&FType::INTEGER, &FType::DOUBLE), FType::Boolean);
        assert_eq!(InfixOp::Lt.result_type(&FType::Date, &FType::DateTime), FType::Boolean);
        assert_eq!(InfixOp::Lt.result_type(&FType::String, &FType::INTEGER), FType::Null);
    }

    #[test]
    fn test_temporal_result_types() {
        assert_eq!(
            InfixOp::Sub.result_type(&FType::Date, &FType::Date),
            FType::DayTimeDuration
        );
        assert_eq!(
            InfixOp::Add.result_type(&FType::DateTime, &FType::YearMonthDuration),
            FType::DateTime
        );
        assert_eq!(
            InfixOp::Mul.result_type(&FType::INTEGER, &FType::DayTimeDuration),
            FType::DayTimeDuration
        );
    }
}
