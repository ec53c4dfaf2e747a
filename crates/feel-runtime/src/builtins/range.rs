//! Range relation functions
//!
//! Points are treated as closed degenerate ranges, so a single formula covers
//! the point and range forms of each relation. Unbounded ends compare below
//! or above every value. Incomparable endpoints give null.

use super::arg;
use feel_core::Value;
use std::cmp::Ordering;

pub(super) fn call(name: &str, args: &[Value]) -> Option<Value> {
    let (a, b) = (arg(args, 0), arg(args, 1));
    let result = match name {
        "before" => spans(a, b).and_then(|(a, b)| before(&a, &b)),
        "after" => spans(a, b).and_then(|(a, b)| before(&b, &a)),
        "meets" => ranges(a, b).and_then(|(a, b)| meets(&a, &b)),
        "met by" => ranges(a, b).and_then(|(a, b)| meets(&b, &a)),
        "overlaps" => ranges(a, b).and_then(|(a, b)| overlaps(&a, &b)),
        "finishes" => spans(a, b).and_then(|(a, b)| finishes(&a, &b)),
        "finished by" => spans(a, b).and_then(|(a, b)| finishes(&b, &a)),
        "starts" => spans(a, b).and_then(|(a, b)| starts(&a, &b)),
        "started by" => spans(a, b).and_then(|(a, b)| starts(&b, &a)),
        "coincides" => spans(a, b).and_then(|(a, b)| coincides(&a, &b)),
        _ => return None,
    };
    Some(result.map(Value::Boolean).unwrap_or_default())
}

#[derive(Debug, Clone, Copy)]
enum Edge<'a> {
    Below,
    At(&'a Value),
    Above,
}

impl Edge<'_> {
    fn order(&self, other: &Edge<'_>) -> Option<Ordering> {
        match (self, other) {
            (Edge::At(a), Edge::At(b)) => a.compare(b),
            (Edge::Below, Edge::Below) | (Edge::Above, Edge::Above) => Some(Ordering::Equal),
            (Edge::Below, _) | (_, Edge::Above) => Some(Ordering::Less),
            (Edge::Above, _) | (_, Edge::Below) => Some(Ordering::Greater),
        }
    }

    fn below(&self, other: &Edge<'_>) -> Option<bool> {
        Some(self.order(other)? == Ordering::Less)
    }

    fn same(&self, other: &Edge<'_>) -> Option<bool> {
        Some(self.order(other)? == Ordering::Equal)
    }
}

#[derive(Debug)]
struct Span<'a> {
    start: Edge<'a>,
    start_included: bool,
    end: Edge<'a>,
    end_included: bool,
}

impl<'a> Span<'a> {
    fn of(value: &'a Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Range(range) => Some(Span {
                start: range.start.as_ref().map(Edge::At).unwrap_or(Edge::Below),
                start_included: range.start_inclusive,
                end: range.end.as_ref().map(Edge::At).unwrap_or(Edge::Above),
                end_included: range.end_inclusive,
            }),
            point => Some(Span {
                start: Edge::At(point),
                start_included: true,
                end: Edge::At(point),
                end_included: true,
            }),
        }
    }
}

fn spans<'a>(a: &'a Value, b: &'a Value) -> Option<(Span<'a>, Span<'a>)> {
    Some((Span::of(a)?, Span::of(b)?))
}

fn ranges<'a>(a: &'a Value, b: &'a Value) -> Option<(Span<'a>, Span<'a>)> {
    match (a, b) {
        (Value::Range(_), Value::Range(_)) => spans(a, b),
        _ => None,
    }
}

fn before(a: &Span<'_>, b: &Span<'_>) -> Option<bool> {
    Some(
        a.end.below(&b.start)?
            || (a.end.same(&b.start)? && !(a.end_included && b.start_included)),
    )
}

fn meets(a: &Span<'_>, b: &Span<'_>) -> Option<bool> {
    Some(a.end_included && b.start_included && a.end.same(&b.start)?)
}

fn overlaps(a: &Span<'_>, b: &Span<'_>) -> Option<bool> {
    let reaches = b.start.below(&a.end)?
        || (a.end.same(&b.start)? && a.end_included && b.start_included);
    let begins = a.start.below(&b.end)?
        || (a.start.same(&b.end)? && a.start_included && b.end_included);
    Some(reaches && begins)
}

fn finishes(a: &Span<'_>, b: &Span<'_>) -> Option<bool> {
    Some(
        a.end_included == b.end_included
            && a.end.same(&b.end)?
            && (b.start.below(&a.start)?
                || (a.start.same(&b.start)? && (!a.start_included || b.start_included))),
    )
}

fn starts(a: &Span<'_>, b: &Span<'_>) -> Option<bool> {
    Some(
        a.start_included == b.start_included
            && a.start.same(&b.start)?
            && (a.end.below(&b.end)?
                || (a.end.same(&b.end)? && (!a.end_included || b.end_included))),
    )
}

fn coincides(a: &Span<'_>, b: &Span<'_>) -> Option<bool> {
    Some(
        a.start_included == b.start_included
            && a.end_included == b.end_included
            && a.start.same(&b.start)?
            && a.end.same(&b.end)?,
    )
}

#[cfg(test)]
mod tests {
    use super::super::test_support::call_plain;
    use super::*;
    use feel_core::types::RangeValue;

    fn range(start: i32, end: i32, start_inclusive: bool, end_inclusive: bool) -> Value {
        Value::Range(Box::new(RangeValue::new(
            Some(Value::from(start)),
            Some(Value::from(end)),
            start_inclusive,
            end_inclusive,
        )))
    }

    fn check(name: &str, a: Value, b: Value) -> Value {
        call_plain(name, vec![a, b])
    }

    const T: Value = Value::Boolean(true);
    const F: Value = Value::Boolean(false);

    #[test]
    fn test_before_and_after() {
        assert_eq!(check("before", Value::from(1), Value::from(10)), T);
        assert_eq!(check("before", Value::from(1), range(1, 10, false, true)), T);
        assert_eq!(check("before", Value::from(1), range(1, 10, true, true)), F);
        assert_eq!(check("before", range(1, 10, true, false), Value::from(10)), T);
        assert_eq!(check("before", range(1, 5, true, true), range(5, 10, true, true)), F);
        assert_eq!(check("before", range(1, 5, true, false), range(5, 10, true, true)), T);
        assert_eq!(check("after", Value::from(10), range(1, 10, true, false)), T);
        assert_eq!(check("before", Value::from(1), Value::from("a")), Value::Null);
    }

    #[test]
    fn test_meets_and_overlaps() {
        assert_eq!(check("meets", range(1, 5, true, true), range(5, 10, true, true)), T);
        assert_eq!(check("meets", range(1, 5, true, false), range(5, 10, true, true)), F);
        assert_eq!(check("met by", range(5, 10, true, true), range(1, 5, true, true)), T);
        assert_eq!(check("overlaps", range(1, 5, true, true), range(3, 8, true, true)), T);
        assert_eq!(check("overlaps", range(1, 5, true, true), range(5, 8, true, true)), T);
        assert_eq!(check("overlaps", range(1, 5, true, false), range(5, 8, true, true)), F);
        assert_eq!(check("overlaps", Value::from(1), range(1, 5, true, true)), Value::Null);
    }

    #[test]
    fn test_starts_finishes_coincides() {
        assert_eq!(check("finishes", Value::from(10), range(1, 10, true, true)), T);
        assert_eq!(check("finishes", Value::from(10), range(1, 10, true, false)), F);
        assert_eq!(check("finishes", range(5, 10, true, true), range(1, 10, true, true)), T);
        assert_eq!(check("finished by", range(1, 10, true, true), Value::from(10)), T);
        assert_eq!(check("starts", Value::from(1), range(1, 10, true, true)), T);
        assert_eq!(check("starts", range(1, 5, true, true), range(1, 10, true, true)), T);
        assert_eq!(check("started by", range(1, 10, true, true), range(1, 5, true, true)), T);
        assert_eq!(check("coincides", Value::from(5), Value::from(5)), T);
        assert_eq!(check("coincides", range(1, 5, true, true), range(1, 5, true, false)), F);
    }

    #[test]
    fn test_unbounded_ranges() {
        let below_ten = Value::Range(Box::new(RangeValue::new(
            None,
            Some(Value::from(10)),
            false,
            false,
        )));
        assert_eq!(check("before", below_ten.clone(), Value::from(10)), T);
        assert_eq!(check("before", Value::from(1), below_ten), F);
    }
}
