//! Tree-walking IR interpreter

use crate::builtins::{self, CallContext};
use crate::engine::{convert, decision};
use crate::error::{Result, RuntimeError};
use feel_core::ast::{FilterKind, InfixOp};
use feel_core::ir::{Binding, CallTarget, Domain, Ir, NumericMode};
use feel_core::ops;
use feel_core::types::number::DECIMAL_PRECISION;
use feel_core::types::{Closure, FunctionValue, RangeValue};
use feel_core::Value;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Upper bound on the elements a stepped domain may produce
const MAX_STEPS: usize = 1_000_000;

/// Evaluation state of one call
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    /// The root input
    pub input: &'a Value,
    /// Current value of `?`
    pub test_input: Option<Value>,
    /// Locals, innermost last
    pub locals: Vec<(String, Value)>,
}

impl<'a> Frame<'a> {
    pub fn new(input: &'a Value) -> Self {
        Self {
            input,
            test_input: None,
            locals: Vec::new(),
        }
    }

    pub fn with_test_input(mut self, test_input: Value) -> Self {
        self.test_input = Some(test_input);
        self
    }

    fn local(&self, name: &str) -> Value {
        self.locals
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    fn replace_test_input(&mut self, value: Option<Value>) -> Option<Value> {
        std::mem::replace(&mut self.test_input, value)
    }
}

/// Evaluates IR against a constant pool
#[derive(Debug, Clone)]
pub struct Interpreter {
    constants: Arc<[Value]>,
    precision: u64,
}

impl Interpreter {
    pub fn new(constants: Arc<[Value]>) -> Self {
        Self {
            constants,
            precision: DECIMAL_PRECISION,
        }
    }

    /// Significant digits of decimal division
    pub fn with_precision(mut self, precision: u64) -> Self {
        self.precision = precision;
        self
    }

    pub fn precision(&self) -> u64 {
        self.precision
    }

    /// Evaluate one node
    pub fn eval(&self, ir: &Ir, frame: &mut Frame<'_>) -> Result<Value> {
        let value = match ir {
            Ir::Const(value) => value.clone(),
            Ir::ConstRef(index) => self
                .constants
                .get(*index)
                .cloned()
                .ok_or(RuntimeError::ConstantOutOfRange(*index))?,
            Ir::Input => frame.input.clone(),
            Ir::TestInput => frame.test_input.clone().unwrap_or_default(),
            Ir::Local(name) => frame.local(name),
            Ir::InputField(name) => frame.input.get(name).cloned().unwrap_or_default(),
            Ir::Member { source, name } => {
                let source = self.eval(source, frame)?;
                convert::member(&source, name)
            }

            Ir::Arith {
                op,
                mode,
                left,
                right,
                null_check,
            } => {
                let left = self.eval(left, frame)?;
                if *null_check && left.is_null() {
                    return Ok(Value::Null);
                }
                let right = self.eval(right, frame)?;
                ops::arith_with_precision(*op, &left, &right, *mode, self.precision)
            }
            Ir::Concat { left, right } => {
                let (left, right) = self.operands(left, right, frame)?;
                ops::concat(&left, &right)
            }
            Ir::Temporal { op, left, right } => {
                let (left, right) = self.operands(left, right, frame)?;
                ops::temporal(*op, &left, &right)
            }
            Ir::Compare {
                op,
                mode,
                left,
                right,
            } => {
                let (left, right) = self.operands(left, right, frame)?;
                ops::compare_with_mode(*op, *mode, &left, &right)
            }
            Ir::Equal {
                negated,
                left,
                right,
                ..
            } => {
                let (left, right) = self.operands(left, right, frame)?;
                ops::equality(&left, &right, *negated)
            }
            Ir::Logic {
                op,
                short_circuit,
                left,
                right,
            } => self.logic(*op, *short_circuit, left, right, frame)?,
            Ir::Not(inner) => ops::not(&self.eval(inner, frame)?),
            Ir::Negate(inner) => ops::negate(&self.eval(inner, frame)?),
            Ir::Dynamic { op, left, right } => {
                let (left, right) = self.operands(left, right, frame)?;
                match (op, &left, &right) {
                    (InfixOp::Div, Value::Number(_), Value::Number(_)) => {
                        ops::arith_with_precision(
                            *op,
                            &left,
                            &right,
                            NumericMode::Decimal,
                            self.precision,
                        )
                    }
                    _ => ops::dynamic(*op, &left, &right),
                }
            }

            Ir::If {
                condition,
                then,
                otherwise,
            } => match self.eval(condition, frame)? {
                Value::Boolean(true) => self.eval(then, frame)?,
                _ => self.eval(otherwise, frame)?,
            },
            Ir::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.eval(item, frame))
                    .collect::<Result<_>>()?,
            ),
            Ir::Context(entries) => self.context(entries, frame)?,
            Ir::Range {
                start,
                end,
                start_inclusive,
                end_inclusive,
            } => {
                let start = match start {
                    Some(start) => Some(self.eval(start, frame)?),
                    None => None,
                };
                let end = match end {
                    Some(end) => Some(self.eval(end, frame)?),
                    None => None,
                };
                Value::Range(Box::new(RangeValue::new(
                    start,
                    end,
                    *start_inclusive,
                    *end_inclusive,
                )))
            }
            Ir::Between { value, low, high } => {
                let value = self.eval(value, frame)?;
                let low = self.eval(low, frame)?;
                let high = self.eval(high, frame)?;
                ops::and(
                    &ops::compare(InfixOp::Ge, &value, &low),
                    &ops::compare(InfixOp::Le, &value, &high),
                )
            }
            Ir::InstanceOf { value, target } => {
                Value::Boolean(target.is_instance(&self.eval(value, frame)?))
            }
            Ir::Filter {
                source,
                filter,
                kind,
            } => self.filter(source, filter, *kind, frame)?,
            Ir::For { iterators, body } => {
                let mut results = Vec::new();
                self.iterate(iterators, frame, &mut |interp, frame| {
                    results.push(interp.eval(body, frame)?);
                    Ok(true)
                })?;
                Value::List(results)
            }
            Ir::Quantified {
                every,
                iterators,
                condition,
            } => {
                let every = *every;
                let mut outcome = every;
                self.iterate(iterators, frame, &mut |interp, frame| {
                    let satisfied = interp.eval(condition, frame)? == Value::Boolean(true);
                    if satisfied != every {
                        outcome = !every;
                        return Ok(false);
                    }
                    Ok(true)
                })?;
                Value::Boolean(outcome)
            }
            Ir::Function {
                params,
                body,
                ftype,
            } => Value::Function(FunctionValue::Closure(Arc::new(Closure {
                params: params.clone(),
                body: Arc::clone(body),
                captured: frame.locals.clone(),
                constants: Arc::clone(&self.constants),
                ftype: ftype.clone(),
            }))),
            Ir::Call {
                target,
                args,
                names,
            } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, frame))
                    .collect::<Result<Vec<_>>>()?;
                match target {
                    CallTarget::Builtin(name) => self.call_builtin(name, args, frame)?,
                    CallTarget::Value(callee) => match self.eval(callee, frame)? {
                        Value::Function(function) => {
                            self.invoke(&function, args, names.as_deref(), frame.input)?
                        }
                        other => {
                            debug!(callee = other.type_name(), "call on a non-function value");
                            Value::Null
                        }
                    },
                }
            }
            Ir::Convert { value, target } => convert::convert(self.eval(value, frame)?, target),

            Ir::UnaryMatch { test } => {
                let test = self.eval(test, frame)?;
                let input = frame.test_input.clone().unwrap_or_default();
                unary_match(&test, &input)
            }
            Ir::ListContains { list, value } => {
                let (list, value) = self.operands(list, value, frame)?;
                match list {
                    Value::List(items) => {
                        Value::Boolean(items.iter().any(|item| ops::equal(item, &value)))
                    }
                    _ => Value::Null,
                }
            }
            Ir::RangeContains { range, value } => {
                let (range, value) = self.operands(range, value, frame)?;
                match range {
                    Value::Range(range) => range.contains(&value).into(),
                    _ => Value::Null,
                }
            }
            Ir::WithTestInput { subject, body } => {
                let subject = self.eval(subject, frame)?;
                let previous = frame.replace_test_input(Some(subject));
                let result = self.eval(body, frame);
                frame.replace_test_input(previous);
                result?
            }
            Ir::DecisionTable(table) => decision::evaluate(self, table, frame)?,
        };
        Ok(value)
    }

    /// Call a function value with positional or named arguments
    pub fn invoke(
        &self,
        function: &FunctionValue,
        args: Vec<Value>,
        names: Option<&[String]>,
        input: &Value,
    ) -> Result<Value> {
        let args = match names {
            Some(names) => {
                let params = function.param_names();
                params
                    .iter()
                    .map(|param| {
                        names
                            .iter()
                            .position(|n| n == param)
                            .and_then(|i| args.get(i).cloned())
                            .unwrap_or_default()
                    })
                    .collect()
            }
            None => args,
        };
        match function {
            FunctionValue::Closure(closure) => {
                let mut frame = Frame::new(input);
                frame.locals = closure.captured.clone();
                for (i, param) in closure.params.iter().enumerate() {
                    frame
                        .locals
                        .push((param.clone(), args.get(i).cloned().unwrap_or_default()));
                }
                let interp = Interpreter {
                    constants: Arc::clone(&closure.constants),
                    precision: self.precision,
                };
                interp.eval(&closure.body, &mut frame)
            }
            FunctionValue::Native(native) => Ok(native.call(&args)),
            FunctionValue::Builtin { name, .. } => {
                let mut frame = Frame::new(input);
                self.call_builtin(name, args, &mut frame)
            }
        }
    }

    fn call_builtin(&self, name: &str, args: Vec<Value>, frame: &mut Frame<'_>) -> Result<Value> {
        let input = frame.input;
        let invoke = |function: &FunctionValue, args: Vec<Value>| {
            self.invoke(function, args, None, input)
        };
        let ctx = CallContext {
            precision: self.precision,
            invoke: &invoke,
        };
        builtins::call(name, args, &ctx)
    }

    fn operands(&self, left: &Ir, right: &Ir, frame: &mut Frame<'_>) -> Result<(Value, Value)> {
        Ok((self.eval(left, frame)?, self.eval(right, frame)?))
    }

    fn logic(
        &self,
        op: InfixOp,
        short_circuit: bool,
        left: &Ir,
        right: &Ir,
        frame: &mut Frame<'_>,
    ) -> Result<Value> {
        let left = self.eval(left, frame)?;
        // false and x, true or x
        let dominant = op == InfixOp::Or;
        if left == Value::Boolean(dominant) {
            return Ok(left);
        }
        let right = self.eval(right, frame)?;
        if short_circuit {
            return Ok(right);
        }
        Ok(ops::logic(op, &left, &right))
    }

    fn context(&self, entries: &[(String, Ir)], frame: &mut Frame<'_>) -> Result<Value> {
        let depth = frame.locals.len();
        let mut map = IndexMap::with_capacity(entries.len());
        let mut failure = None;
        for (name, ir) in entries {
            match self.eval(ir, frame) {
                Ok(value) => {
                    frame.locals.push((name.clone(), value.clone()));
                    map.insert(name.clone(), value);
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        frame.locals.truncate(depth);
        match failure {
            Some(err) => Err(err),
            None => Ok(Value::Context(map)),
        }
    }

    fn filter(
        &self,
        source: &Ir,
        filter: &Ir,
        kind: FilterKind,
        frame: &mut Frame<'_>,
    ) -> Result<Value> {
        let items = match self.eval(source, frame)? {
            Value::Null => return Ok(Value::Null),
            Value::List(items) => items,
            other => vec![other],
        };
        match kind {
            FilterKind::Index => Ok(index(&items, &self.eval(filter, frame)?)),
            FilterKind::Predicate => self.select(items, filter, frame),
            FilterKind::Dynamic => {
                let sample = items.first().cloned().unwrap_or_default();
                match self.with_item(&sample, filter, frame)? {
                    position @ Value::Number(_) => Ok(index(&items, &position)),
                    _ => self.select(items, filter, frame),
                }
            }
        }
    }

    fn select(&self, items: Vec<Value>, filter: &Ir, frame: &mut Frame<'_>) -> Result<Value> {
        let mut selected = Vec::new();
        for item in items {
            if self.with_item(&item, filter, frame)? == Value::Boolean(true) {
                selected.push(item);
            }
        }
        Ok(Value::List(selected))
    }

    /// Evaluate a predicate with `item` and the item's fields bound
    fn with_item(&self, item: &Value, filter: &Ir, frame: &mut Frame<'_>) -> Result<Value> {
        let depth = frame.locals.len();
        if let Value::Context(fields) = item {
            frame
                .locals
                .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        frame.locals.push(("item".to_string(), item.clone()));
        let result = self.eval(filter, frame);
        frame.locals.truncate(depth);
        result
    }

    /// Run `visit` over the cartesian product of the bindings.
    ///
    /// `visit` returns false to stop early.
    fn iterate(
        &self,
        bindings: &[Binding],
        frame: &mut Frame<'_>,
        visit: &mut dyn FnMut(&Interpreter, &mut Frame<'_>) -> Result<bool>,
    ) -> Result<bool> {
        let Some((binding, rest)) = bindings.split_first() else {
            return visit(self, frame);
        };
        let values = self.domain(&binding.domain, frame)?;
        for value in values {
            frame.locals.push((binding.name.clone(), value));
            let result = self.iterate(rest, frame, visit);
            frame.locals.pop();
            if !result? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn domain(&self, domain: &Domain, frame: &mut Frame<'_>) -> Result<Vec<Value>> {
        match domain {
            Domain::Values(ir) => Ok(match self.eval(ir, frame)? {
                Value::Null => Vec::new(),
                Value::List(items) => items,
                Value::Range(range) => expand_range(&range)?,
                other => vec![other],
            }),
            Domain::Steps {
                first,
                last,
                cursor,
                successor,
                predecessor,
            } => {
                let first = self.eval(first, frame)?;
                let last = self.eval(last, frame)?;
                let direction = match first.compare(&last) {
                    None => return Ok(Vec::new()),
                    Some(Ordering::Equal) => return Ok(vec![first]),
                    Some(direction) => direction,
                };
                let step = if direction == Ordering::Greater {
                    predecessor
                } else {
                    successor
                };

                let mut values = Vec::new();
                let mut current = first;
                loop {
                    if values.len() == MAX_STEPS {
                        return Err(RuntimeError::DomainTooLarge(MAX_STEPS));
                    }
                    values.push(current.clone());
                    if current.compare(&last) != Some(direction) {
                        break;
                    }
                    frame.locals.push((cursor.clone(), current));
                    let next = self.eval(step, frame);
                    frame.locals.pop();
                    current = next?;
                    if current.compare(&last) == Some(direction.reverse()) || current.is_null() {
                        break;
                    }
                }
                Ok(values)
            }
        }
    }
}

/// Unary test whose kind follows the runtime value of the test
fn unary_match(test: &Value, input: &Value) -> Value {
    match test {
        Value::List(items) => Value::Boolean(items.iter().any(|item| ops::equal(item, input))),
        Value::Range(range) => range.contains(input).into(),
        Value::Boolean(_) if !matches!(input, Value::Boolean(_)) => test.clone(),
        _ => ops::equality(input, test, false),
    }
}

/// 1-based index, negative from the end; out of bounds is null
fn index(items: &[Value], position: &Value) -> Value {
    let Some(position) = position.as_number().and_then(|n| n.to_i64()) else {
        return Value::Null;
    };
    let len = items.len() as i64;
    let offset = match position {
        p if p > 0 => p - 1,
        p if p < 0 => len + p,
        _ => return Value::Null,
    };
    if (0..len).contains(&offset) {
        items[offset as usize].clone()
    } else {
        Value::Null
    }
}

/// Elements of a range with integral or date bounds
fn expand_range(range: &RangeValue) -> Result<Vec<Value>> {
    let (Some(start), Some(end)) = (&range.start, &range.end) else {
        return Ok(Vec::new());
    };
    match (start, end) {
        (Value::Number(s), Value::Number(e)) => {
            let (Some(s), Some(e)) = (s.to_i64(), e.to_i64()) else {
                return Ok(Vec::new());
            };
            let (mut s, mut e) = (i128::from(s), i128::from(e));
            let step: i128 = if s <= e { 1 } else { -1 };
            if !range.start_inclusive {
                s += step;
            }
            if !range.end_inclusive {
                e -= step;
            }
            let count = (e - s) * step + 1;
            if count <= 0 {
                return Ok(Vec::new());
            }
            if count > MAX_STEPS as i128 {
                return Err(RuntimeError::DomainTooLarge(MAX_STEPS));
            }
            Ok((0..count)
                .map(|i| s + i * step)
                .map(|i| match i32::try_from(i) {
                    Ok(small) => Value::from(small),
                    Err(_) => Value::from(i as i64),
                })
                .collect())
        }
        (Value::Date(s), Value::Date(e)) => {
            let days = (*e - *s).num_days();
            if days.unsigned_abs() >= MAX_STEPS as u64 {
                return Err(RuntimeError::DomainTooLarge(MAX_STEPS));
            }
            let step = if days < 0 { -1 } else { 1 };
            Ok((0..=days.abs())
                .map(|i| *s + chrono::Duration::days(i * step))
                .filter(|d| {
                    (range.start_inclusive || d != s) && (range.end_inclusive || d != e)
                })
                .map(Value::Date)
                .collect())
        }
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feel_core::ir::CompareMode;

    fn eval(ir: &Ir) -> Value {
        let input = Value::Null;
        Interpreter::new(Arc::from(Vec::new()))
            .eval(ir, &mut Frame::new(&input))
            .unwrap()
    }

    fn constant(value: impl Into<Value>) -> Box<Ir> {
        Ir::Const(value.into()).boxed()
    }

    #[test]
    fn test_input_fields() {
        let input = Value::context([("a", Value::from(1))]);
        let interp = Interpreter::new(Arc::from(Vec::new()));
        let mut frame = Frame::new(&input);
        assert_eq!(
            interp.eval(&Ir::InputField("a".into()), &mut frame).unwrap(),
            Value::from(1)
        );
        assert_eq!(
            interp.eval(&Ir::InputField("b".into()), &mut frame).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_constant_pool() {
        let interp = Interpreter::new(Arc::from(vec![Value::from("pooled")]));
        let input = Value::Null;
        let mut frame = Frame::new(&input);
        assert_eq!(
            interp.eval(&Ir::ConstRef(0), &mut frame).unwrap(),
            Value::from("pooled")
        );
        assert_eq!(
            interp.eval(&Ir::ConstRef(3), &mut frame),
            Err(RuntimeError::ConstantOutOfRange(3))
        );
    }

    #[test]
    fn test_logic_skips_dominated_operand() {
        // the right side would fail if evaluated
        let ir = Ir::Logic {
            op: InfixOp::And,
            short_circuit: false,
            left: constant(false),
            right: Ir::ConstRef(99).boxed(),
        };
        assert_eq!(eval(&ir), Value::Boolean(false));
    }

    #[test]
    fn test_context_entries_see_earlier_entries() {
        let ir = Ir::Context(vec![
            ("a".to_string(), Ir::Const(Value::from(1))),
            (
                "b".to_string(),
                Ir::Arith {
                    op: InfixOp::Add,
                    mode: NumericMode::Native,
                    left: Ir::Local("a".into()).boxed(),
                    right: constant(1),
                    null_check: true,
                },
            ),
        ]);
        assert_eq!(
            eval(&ir),
            Value::context([("a", Value::from(1)), ("b", Value::from(2))])
        );
    }

    #[test]
    fn test_index_filter() {
        let items = vec![Value::from(1), Value::from(2), Value::from(3)];
        assert_eq!(index(&items, &Value::from(1)), Value::from(1));
        assert_eq!(index(&items, &Value::from(-1)), Value::from(3));
        assert_eq!(index(&items, &Value::from(0)), Value::Null);
        assert_eq!(index(&items, &Value::from(4)), Value::Null);
    }

    #[test]
    fn test_predicate_filter_binds_item() {
        let ir = Ir::Filter {
            source: Ir::List(vec![Ir::Const(Value::from(1)), Ir::Const(Value::from(5))]).boxed(),
            filter: Ir::Compare {
                op: InfixOp::Gt,
                mode: CompareMode::Natural,
                left: Ir::Local("item".into()).boxed(),
                right: constant(2),
            }
            .boxed(),
            kind: FilterKind::Predicate,
        };
        assert_eq!(eval(&ir), Value::List(vec![Value::from(5)]));
    }

    #[test]
    fn test_expand_ranges() {
        let range = RangeValue::new(Some(Value::from(1)), Some(Value::from(3)), true, false);
        assert_eq!(expand_range(&range).unwrap(), vec![Value::from(1), Value::from(2)]);
        let descending = RangeValue::new(Some(Value::from(3)), Some(Value::from(1)), true, true);
        assert_eq!(
            expand_range(&descending).unwrap(),
            vec![Value::from(3), Value::from(2), Value::from(1)]
        );
        let empty = RangeValue::new(Some(Value::from(1)), Some(Value::from(1)), false, false);
        assert!(expand_range(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_range_is_an_error() {
        let huge = RangeValue::new(
            Some(Value::from(1)),
            Some(Value::from(9_999_999_999_999_i64)),
            true,
            true,
        );
        assert_eq!(
            expand_range(&huge),
            Err(RuntimeError::DomainTooLarge(MAX_STEPS))
        );
    }

    #[test]
    fn test_unary_match() {
        let input = Value::from(2);
        assert_eq!(
            unary_match(&Value::from(vec![1, 2]), &input),
            Value::Boolean(true)
        );
        assert_eq!(unary_match(&Value::Boolean(false), &input), Value::Boolean(false));
        assert_eq!(unary_match(&Value::from(3), &input), Value::Boolean(false));
        assert_eq!(
            unary_match(&Value::Boolean(true), &Value::Boolean(true)),
            Value::Boolean(true)
        );
    }
}
