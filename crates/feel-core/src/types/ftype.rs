//! FEEL semantic types
//!
//! `FType` is the closed lattice of FEEL types. Every resolved AST node carries
//! exactly one of these. The lattice defines a directed compatibility distance
//! (`can_be`) used for overload resolution and implicit conversions, and the
//! meet/join operations (`max_sub` / `min_super`) used to unify branch and
//! element types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directed compatibility distance between two types, closest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompatRank {
    /// Same type
    Equal,
    /// Source is a subtype of the target
    Conforms,
    /// Source converts to the target without loss
    Convertible,
    /// Source converts to the target, possibly losing information
    LossyConvertible,
    /// Only a runtime check can tell
    RuntimeConvertible,
    /// No conversion exists
    Incompatible,
}

impl CompatRank {
    /// Returns true for `Equal` and `Conforms`
    pub fn is_conforming(self) -> bool {
        matches!(self, CompatRank::Equal | CompatRank::Conforms)
    }

    /// Returns true for every rank except `Incompatible`
    pub fn is_convertible(self) -> bool {
        self != CompatRank::Incompatible
    }
}

/// Machine representation of a FEEL number, narrowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NumberKind {
    Integer,
    Long,
    Double,
    BigDecimal,
    /// Representation decided at runtime
    Number,
}

/// A FEEL semantic type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FType {
    Any,
    Null,
    Number(NumberKind),
    String,
    Boolean,
    Date,
    Time,
    DateTime,
    DayTimeDuration,
    YearMonthDuration,
    List(Box<FType>),
    /// Ordered context fields
    Context(Vec<(String, FType)>),
    Range {
        element: Box<FType>,
        /// `None` leaves the bound kind unconstrained
        start_inclusive: Option<bool>,
        end_inclusive: Option<bool>,
    },
    Function {
        params: Vec<FType>,
        names: Option<Vec<String>>,
        ret: Box<FType>,
    },
}

/// Members every string exposes
const STRING_MEMBERS: &[&str] = &[
    "length", "trim", "strip", "upperCase", "lowerCase", "isBlank", "isEmpty",
];

impl FType {
    pub const NUMBER: FType = FType::Number(NumberKind::Number);
    pub const INTEGER: FType = FType::Number(NumberKind::Integer);
    pub const LONG: FType = FType::Number(NumberKind::Long);
    pub const DOUBLE: FType = FType::Number(NumberKind::Double);
    pub const BIG_DECIMAL: FType = FType::Number(NumberKind::BigDecimal);

    /// Create a list type
    pub fn list(element: FType) -> Self {
        FType::List(Box::new(element))
    }

    /// Create a context type from name/type pairs
    pub fn context<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FType)>,
        S: Into<String>,
    {
        FType::Context(fields.into_iter().map(|(n, t)| (n.into(), t)).collect())
    }

    /// Create a range type with unconstrained bounds
    pub fn range(element: FType) -> Self {
        FType::Range {
            element: Box::new(element),
            start_inclusive: None,
            end_inclusive: None,
        }
    }

    /// Create a function type with named parameters
    pub fn function<S: Into<String>>(params: Vec<(S, FType)>, ret: FType) -> Self {
        let (names, params): (Vec<String>, Vec<FType>) =
            params.into_iter().map(|(n, t)| (n.into(), t)).unzip();
        FType::Function {
            params,
            names: Some(names),
            ret: Box::new(ret),
        }
    }

    /// Create a function type without parameter names
    pub fn anonymous_function(params: Vec<FType>, ret: FType) -> Self {
        FType::Function {
            params,
            names: None,
            ret: Box::new(ret),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, FType::Any)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FType::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, FType::Number(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, FType::Boolean)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, FType::String)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FType::List(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            FType::Date
                | FType::Time
                | FType::DateTime
                | FType::DayTimeDuration
                | FType::YearMonthDuration
        )
    }

    /// Number representation, if this is a number type
    pub fn number_kind(&self) -> Option<NumberKind> {
        match self {
            FType::Number(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Directed compatibility distance from `self` to `target`
    pub fn can_be(&self, target: &FType) -> CompatRank {
        use CompatRank::*;

        match (self, target) {
            (FType::Context(a), FType::Context(b)) => return context_rank(a, b),
            _ if self == target => return Equal,
            _ => {}
        }

        match (self, target) {
            (_, FType::Any) => Conforms,
            (FType::Any, _) => RuntimeConvertible,
            (FType::Null, _) => Conforms,
            (_, FType::Null) => Incompatible,
            (FType::Number(a), FType::Number(b)) => number_rank(*a, *b),
            (FType::Date, FType::DateTime) => LossyConvertible,
            (FType::DateTime, FType::Date | FType::Time) => Convertible,
            (FType::List(a), FType::List(b)) => match a.can_be(b) {
                Equal => Equal,
                Conforms => Convertible,
                rank => rank,
            },
            (
                FType::Range {
                    element: a,
                    start_inclusive: sa,
                    end_inclusive: ea,
                },
                FType::Range {
                    element: b,
                    start_inclusive: sb,
                    end_inclusive: eb,
                },
            ) => {
                if (sb.is_some() && sa != sb) || (eb.is_some() && ea != eb) {
                    return Incompatible;
                }
                match a.can_be(b) {
                    Equal if sa != sb || ea != eb => Conforms,
                    rank => rank,
                }
            }
            (
                FType::Function {
                    params: pa, ret: ra, ..
                },
                FType::Function {
                    params: pb, ret: rb, ..
                },
            ) => {
                if pa.len() != pb.len() {
                    return Incompatible;
                }
                pa.iter()
                    .zip(pb)
                    .map(|(a, b)| a.can_be(b))
                    .fold(ra.can_be(rb), Ord::max)
            }
            _ => Incompatible,
        }
    }

    /// `can_be` is `Equal` or `Conforms`
    pub fn conforms_to(&self, target: &FType) -> bool {
        self.can_be(target).is_conforming()
    }

    /// `can_be` is anything but `Incompatible`
    pub fn can_convert_to(&self, target: &FType) -> bool {
        self.can_be(target).is_convertible()
    }

    /// Most specific type both sides can be converted into, `Null` if none
    pub fn max_sub(&self, other: &FType) -> FType {
        if self == other {
            return self.clone();
        }
        if !self.can_convert_to(other) || !other.can_convert_to(self) {
            return FType::Null;
        }
        match (self, other) {
            (FType::Any, t) | (t, FType::Any) => t.clone(),
            (FType::Number(a), FType::Number(b)) => FType::Number(match (a, b) {
                (NumberKind::Number, k) | (k, NumberKind::Number) => *k,
                (a, b) => (*a).max(*b),
            }),
            (FType::Date | FType::Time, FType::DateTime)
            | (FType::DateTime, FType::Date | FType::Time) => FType::DateTime,
            (FType::List(a), FType::List(b)) => FType::list(a.max_sub(b)),
            (FType::Context(a), FType::Context(b)) => FType::Context(
                a.iter()
                    .filter_map(|(name, t)| {
                        field(b, name).map(|other| (name.clone(), t.max_sub(other)))
                    })
                    .collect(),
            ),
            (
                FType::Range {
                    element: a,
                    start_inclusive,
                    end_inclusive,
                },
                FType::Range {
                    element: b,
                    start_inclusive: sb,
                    end_inclusive: eb,
                },
            ) => FType::Range {
                element: Box::new(a.max_sub(b)),
                start_inclusive: start_inclusive.or(*sb),
                end_inclusive: end_inclusive.or(*eb),
            },
            (
                FType::Function {
                    params: pa,
                    names,
                    ret: ra,
                },
                FType::Function {
                    params: pb, ret: rb, ..
                },
            ) => FType::Function {
                params: pa.iter().zip(pb).map(|(a, b)| a.max_sub(b)).collect(),
                names: names.clone(),
                ret: Box::new(ra.max_sub(rb)),
            },
            _ => FType::Null,
        }
    }

    /// Least common supertype, `Any` when nothing narrower unifies
    pub fn min_super(&self, other: &FType) -> FType {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (FType::Null, t) | (t, FType::Null) => t.clone(),
            (FType::Any, _) | (_, FType::Any) => FType::Any,
            (FType::Number(_), FType::Number(_)) => FType::NUMBER,
            (FType::Date, FType::DateTime) | (FType::DateTime, FType::Date) => FType::Date,
            (FType::Time, FType::DateTime) | (FType::DateTime, FType::Time) => FType::Time,
            (FType::List(a), FType::List(b)) => FType::list(a.min_super(b)),
            (FType::Context(a), FType::Context(b)) => {
                let mut fields: Vec<(String, FType)> = a
                    .iter()
                    .filter_map(|(name, t)| {
                        field(b, name).map(|other| (name.clone(), t.min_super(other)))
                    })
                    .collect();
                fields.sort_by(|l, r| l.0.cmp(&r.0));
                FType::Context(fields)
            }
            (
                FType::Range {
                    element: a,
                    start_inclusive: sa,
                    end_inclusive: ea,
                },
                FType::Range {
                    element: b,
                    start_inclusive: sb,
                    end_inclusive: eb,
                },
            ) => FType::Range {
                element: Box::new(a.min_super(b)),
                start_inclusive: if sa == sb { *sa } else { None },
                end_inclusive: if ea == eb { *ea } else { None },
            },
            (
                FType::Function {
                    params: pa,
                    names: na,
                    ret: ra,
                },
                FType::Function {
                    params: pb,
                    names: nb,
                    ret: rb,
                },
            ) if pa.len() == pb.len() => FType::Function {
                params: pa.iter().zip(pb).map(|(a, b)| a.min_super(b)).collect(),
                names: if na == nb { na.clone() } else { None },
                ret: Box::new(ra.min_super(rb)),
            },
            _ => FType::Any,
        }
    }

    /// Both types belong to the same family, ignoring parameters
    pub fn is_same_type(&self, other: &FType) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Element type used when iterating or filtering. Scalars act as singletons.
    pub fn element_type(&self) -> FType {
        match self {
            FType::List(element) => (**element).clone(),
            FType::Range { element, .. } => (**element).clone(),
            other => other.clone(),
        }
    }

    /// Type of a context field, if present
    pub fn field_type(&self, name: &str) -> Option<&FType> {
        match self {
            FType::Context(fields) => field(fields, name),
            _ => None,
        }
    }

    /// Type of a member access, including the built-in members of each type.
    ///
    /// A member on a list of contexts maps over its elements.
    pub fn member_type(&self, name: &str) -> Option<FType> {
        let found = match (self, name) {
            (FType::Any, _) => FType::Any,
            (FType::Null, _) => FType::Null,
            (FType::Context(fields), _) => return field(fields, name).cloned(),
            (FType::String, "length") => FType::INTEGER,
            (FType::String, "isBlank" | "isEmpty") => FType::Boolean,
            (FType::String, n) if STRING_MEMBERS.contains(&n) => FType::String,
            (
                FType::Date,
                "year" | "month" | "day" | "dayOfMonth" | "dayOfYear" | "weekday"
                | "lengthOfYear",
            ) => FType::INTEGER,
            (FType::Date, "isLeapYear") => FType::Boolean,
            (FType::Date, "epochDay" | "value") => FType::LONG,
            (FType::Time, "hour" | "minute" | "second") => FType::INTEGER,
            (FType::Time, "value") => FType::LONG,
            (FType::DateTime, "date") => FType::Date,
            (FType::DateTime, "time") => FType::Time,
            (
                FType::DateTime,
                "year" | "month" | "day" | "weekday" | "hour" | "minute" | "second",
            ) => FType::INTEGER,
            (FType::DateTime, "epochSecond" | "value") => FType::LONG,
            (FType::DayTimeDuration, "days" | "hours" | "minutes" | "seconds" | "value") => {
                FType::LONG
            }
            (FType::YearMonthDuration, "years" | "months" | "value") => FType::LONG,
            (FType::Range { element, .. }, "start" | "end") => (**element).clone(),
            (FType::Range { .. }, "start included" | "end included") => FType::Boolean,
            (FType::List(_), "size") => FType::INTEGER,
            (FType::List(_), "isEmpty" | "isNotEmpty") => FType::Boolean,
            (FType::List(element), _) => return element.member_type(name).map(FType::list),
            (FType::Function { .. }, "returnType") => FType::String,
            (FType::Function { .. }, "parameterTypes" | "parameterNames") => {
                FType::list(FType::String)
            }
            _ => return None,
        };
        Some(found)
    }

    /// Resolve a built-in type name as written in type references
    pub fn by_name(name: &str) -> Option<FType> {
        let found = match name {
            "number" => FType::NUMBER,
            "string" => FType::String,
            "boolean" => FType::Boolean,
            "date" => FType::Date,
            "time" => FType::Time,
            "date and time" => FType::DateTime,
            "days and time duration" | "day and time duration" | "dayTimeDuration" => {
                FType::DayTimeDuration
            }
            "years and months duration" | "year and month duration" | "yearMonthDuration" => {
                FType::YearMonthDuration
            }
            "list" => FType::list(FType::Any),
            "context" => FType::Context(Vec::new()),
            "range" => FType::range(FType::Any),
            n if n.eq_ignore_ascii_case("any") => FType::Any,
            n if n.eq_ignore_ascii_case("null") => FType::Null,
            _ => return None,
        };
        Some(found)
    }
}

fn field<'a>(fields: &'a [(String, FType)], name: &str) -> Option<&'a FType> {
    fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
}

fn number_rank(source: NumberKind, target: NumberKind) -> CompatRank {
    if source == target {
        CompatRank::Equal
    } else if target == NumberKind::Number {
        CompatRank::Conforms
    } else if target == NumberKind::BigDecimal {
        CompatRank::Convertible
    } else if source < target {
        CompatRank::Conforms
    } else {
        CompatRank::LossyConvertible
    }
}

fn context_rank(source: &[(String, FType)], target: &[(String, FType)]) -> CompatRank {
    let mut rank = CompatRank::Equal;
    for (name, expected) in target {
        match field(source, name) {
            Some(actual) => rank = rank.max(actual.can_be(expected)),
            None => return CompatRank::Incompatible,
        }
    }
    if rank == CompatRank::Equal && source.len() > target.len() {
        CompatRank::Conforms
    } else {
        rank
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumberKind::Integer => "integer",
            NumberKind::Long => "long",
            NumberKind::Double => "double",
            NumberKind::BigDecimal => "decimal",
            NumberKind::Number => "number",
        };
        f.write_str(name)
    }
}

impl fmt::Display for FType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FType::Any => write!(f, "Any"),
            FType::Null => write!(f, "Null"),
            FType::Number(kind) => write!(f, "{}", kind),
            FType::String => write!(f, "string"),
            FType::Boolean => write!(f, "boolean"),
            FType::Date => write!(f, "date"),
            FType::Time => write!(f, "time"),
            FType::DateTime => write!(f, "date and time"),
            FType::DayTimeDuration => write!(f, "days and time duration"),
            FType::YearMonthDuration => write!(f, "years and months duration"),
            FType::List(element) => write!(f, "list<{}>", element),
            FType::Context(fields) => {
                write!(f, "context<")?;
                for (i, (name, t)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, t)?;
                }
                write!(f, ">")
            }
            FType::Range {
                element,
                start_inclusive,
                end_inclusive,
            } => {
                write!(f, "range")?;
                match start_inclusive {
                    Some(true) => write!(f, "[")?,
                    Some(false) => write!(f, "(")?,
                    None => {}
                }
                match end_inclusive {
                    Some(true) => write!(f, "]")?,
                    Some(false) => write!(f, ")")?,
                    None => {}
                }
                write!(f, "<{}>", element)
            }
            FType::Function { params, ret, .. } => {
                write!(f, "function<")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ">->{}", ret)
            }
        }
    }
}
