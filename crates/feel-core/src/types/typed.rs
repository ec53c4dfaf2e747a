//! Static FEEL types for host types
//!
//! Host structs describe themselves by implementing `FeelTyped`, usually as a
//! context of their serialized fields.

use crate::types::FType;
use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{BTreeMap, HashMap};

/// A host type with a known FEEL type
pub trait FeelTyped {
    fn feel_type() -> FType;
}

macro_rules! feel_typed {
    ($($host:ty => $ftype:expr),* $(,)?) => {
        $(
            impl FeelTyped for $host {
                fn feel_type() -> FType {
                    $ftype
                }
            }
        )*
    };
}

feel_typed! {
    i32 => FType::INTEGER,
    i16 => FType::INTEGER,
    u16 => FType::INTEGER,
    i64 => FType::LONG,
    u32 => FType::LONG,
    f64 => FType::DOUBLE,
    f32 => FType::DOUBLE,
    BigDecimal => FType::BIG_DECIMAL,
    String => FType::String,
    &str => FType::String,
    bool => FType::Boolean,
    NaiveDate => FType::Date,
    NaiveTime => FType::Time,
    NaiveDateTime => FType::DateTime,
    Duration => FType::DayTimeDuration,
    crate::Value => FType::Any,
    serde_json::Value => FType::Any,
}

impl<T: FeelTyped> FeelTyped for Vec<T> {
    fn feel_type() -> FType {
        FType::list(T::feel_type())
    }
}

impl<T: FeelTyped> FeelTyped for Option<T> {
    fn feel_type() -> FType {
        T::feel_type()
    }
}

// Maps have no static field names, so their members resolve at runtime.
impl<T: FeelTyped> FeelTyped for HashMap<String, T> {
    fn feel_type() -> FType {
        FType::Any
    }
}

impl<T: FeelTyped> FeelTyped for BTreeMap<String, T> {
    fn feel_type() -> FType {
        FType::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order {
        _amount: f64,
        _items: Vec<String>,
    }

    impl FeelTyped for Order {
        fn feel_type() -> FType {
            FType::context([("amount", f64::feel_type()), ("items", Vec::<String>::feel_type())])
        }
    }

    #[test]
    fn test_host_types() {
        assert_eq!(i32::feel_type(), FType::INTEGER);
        assert_eq!(Option::<NaiveDate>::feel_type(), FType::Date);
        assert_eq!(Vec::<Vec<bool>>::feel_type(), FType::list(FType::list(FType::Boolean)));
        assert_eq!(
            Order::feel_type().field_type("items"),
            Some(&FType::list(FType::String))
        );
    }
}
