//! Decision table evaluation
//!
//! Evaluates every rule against the input values and applies the table's hit
//! policy to the matches.

use crate::engine::interpreter::{Frame, Interpreter};
use crate::error::{Result, RuntimeError};
use feel_core::ast::InfixOp;
use feel_core::dmn::{Aggregation, HitPolicy};
use feel_core::ir::{DecisionIr, Ir, NumericMode, OutputIr};
use feel_core::ops;
use feel_core::Value;
use indexmap::IndexMap;
use std::cmp::Ordering;
use tracing::debug;

/// Output values of one rule, in clause order
type Row = Vec<Value>;

/// Evaluate a decision table
pub fn evaluate(interp: &Interpreter, table: &DecisionIr, frame: &mut Frame<'_>) -> Result<Value> {
    let inputs = table
        .inputs
        .iter()
        .map(|input| interp.eval(input, frame))
        .collect::<Result<Vec<_>>>()?;

    let mut matched = Vec::new();
    for (index, rule) in table.rules.iter().enumerate() {
        if matches(interp, &rule.conditions, &inputs, frame)? {
            matched.push(index);
        }
        if table.hit_policy == HitPolicy::First && !matched.is_empty() {
            break;
        }
    }
    debug!(decision = %table.name, matched = ?matched, "evaluated rules");

    if matched.is_empty() {
        return no_match(interp, table, frame);
    }

    let mut rows = Vec::with_capacity(matched.len());
    for &index in &matched {
        rows.push(row(interp, table, index, frame)?);
    }

    match table.hit_policy {
        HitPolicy::Unique => {
            if matched.len() > 1 {
                return Err(violation(
                    table,
                    format!("rules {} all match", rule_numbers(&matched)),
                ));
            }
            Ok(shape(table, first_row(rows)))
        }
        HitPolicy::First => Ok(shape(table, first_row(rows))),
        HitPolicy::Any => {
            if rows.windows(2).any(|pair| !same_row(&pair[0], &pair[1])) {
                return Err(violation(
                    table,
                    format!(
                        "rules {} match with different outputs",
                        rule_numbers(&matched)
                    ),
                ));
            }
            Ok(shape(table, first_row(rows)))
        }
        HitPolicy::Priority => {
            let ranks = ranks(interp, &table.outputs, &rows, frame)?;
            let winner = (0..rows.len())
                .min_by(|a, b| ranks[*a].cmp(&ranks[*b]))
                .unwrap_or(0);
            Ok(shape(table, rows.swap_remove(winner)))
        }
        HitPolicy::Collect => match table.aggregation {
            Some(aggregation) => Ok(aggregate(
                aggregation,
                rows.into_iter().map(first).collect(),
            )),
            None => Ok(Value::List(
                rows.into_iter().map(|row| shape(table, row)).collect(),
            )),
        },
        HitPolicy::RuleOrder => Ok(Value::List(
            rows.into_iter().map(|row| shape(table, row)).collect(),
        )),
        HitPolicy::OutputOrder => {
            let ranks = ranks(interp, &table.outputs, &rows, frame)?;
            let mut ranked: Vec<(Vec<usize>, Row)> = ranks.into_iter().zip(rows).collect();
            ranked.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(Value::List(
                ranked.into_iter().map(|(_, row)| shape(table, row)).collect(),
            ))
        }
    }
}

/// All cells of a rule accept their column's input value
fn matches(
    interp: &Interpreter,
    conditions: &[Ir],
    inputs: &[Value],
    frame: &mut Frame<'_>,
) -> Result<bool> {
    for (condition, input) in conditions.iter().zip(inputs) {
        if !test(interp, condition, input.clone(), frame)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Evaluate a unary test with `?` bound to `subject`
fn test(interp: &Interpreter, ir: &Ir, subject: Value, frame: &mut Frame<'_>) -> Result<bool> {
    let previous = std::mem::replace(&mut frame.test_input, Some(subject));
    let result = interp.eval(ir, frame);
    frame.test_input = previous;
    Ok(result? == Value::Boolean(true))
}

/// Output values of a matched rule, checked against their allowed values
fn row(interp: &Interpreter, table: &DecisionIr, index: usize, frame: &mut Frame<'_>) -> Result<Row> {
    let rule = &table.rules[index];
    let mut row = Vec::with_capacity(rule.outputs.len());
    for (j, (output, clause)) in rule.outputs.iter().zip(&table.outputs).enumerate() {
        let value = interp.eval(output, frame)?;
        if !allowed(interp, clause, &value, frame)? {
            return Err(RuntimeError::OutputCheck(format!(
                "rule {} output {} values check failed",
                index + 1,
                j + 1
            )));
        }
        row.push(value);
    }
    Ok(row)
}

/// Result when no rule matched: the default outputs if any are declared
fn no_match(interp: &Interpreter, table: &DecisionIr, frame: &mut Frame<'_>) -> Result<Value> {
    let has_default = table.outputs.iter().any(|o| o.default.is_some());
    if !has_default {
        return Ok(match (table.hit_policy.is_multi_hit(), table.aggregation) {
            (true, Some(Aggregation::Count)) => Value::from(0),
            (true, None) => Value::List(Vec::new()),
            _ => Value::Null,
        });
    }

    let mut defaults = Vec::with_capacity(table.outputs.len());
    for (j, clause) in table.outputs.iter().enumerate() {
        let value = match &clause.default {
            Some(default) => interp.eval(default, frame)?,
            None => Value::Null,
        };
        if !allowed(interp, clause, &value, frame)? {
            return Err(RuntimeError::OutputCheck(format!(
                "default output {} values check failed",
                j + 1
            )));
        }
        defaults.push(value);
    }
    Ok(match (table.hit_policy.is_multi_hit(), table.aggregation) {
        (true, Some(aggregation)) => aggregate(aggregation, vec![first(defaults)]),
        (true, None) => Value::List(vec![shape(table, defaults)]),
        (false, _) => shape(table, defaults),
    })
}

/// Null outputs pass the check
fn allowed(
    interp: &Interpreter,
    clause: &OutputIr,
    value: &Value,
    frame: &mut Frame<'_>,
) -> Result<bool> {
    match &clause.check {
        Some(check) if !value.is_null() => test(interp, check, value.clone(), frame),
        _ => Ok(true),
    }
}

/// Priority of each row: per output, the index of the first allowed value
/// that accepts it. Unranked outputs sort last.
fn ranks(
    interp: &Interpreter,
    outputs: &[OutputIr],
    rows: &[Row],
    frame: &mut Frame<'_>,
) -> Result<Vec<Vec<usize>>> {
    let mut ranks = Vec::with_capacity(rows.len());
    for row in rows {
        let mut rank = Vec::with_capacity(outputs.len());
        for (clause, value) in outputs.iter().zip(row) {
            let mut position = clause.priorities.len();
            for (i, priority) in clause.priorities.iter().enumerate() {
                if test(interp, priority, value.clone(), frame)? {
                    position = i;
                    break;
                }
            }
            rank.push(position);
        }
        ranks.push(rank);
    }
    Ok(ranks)
}

fn aggregate(aggregation: Aggregation, values: Vec<Value>) -> Value {
    match aggregation {
        Aggregation::Count => {
            let mut distinct: Vec<Value> = Vec::new();
            for value in values {
                if !distinct.iter().any(|seen| ops::equal(seen, &value)) {
                    distinct.push(value);
                }
            }
            Value::from(distinct.len() as i64)
        }
        Aggregation::Sum => values
            .into_iter()
            .reduce(|sum, value| ops::arith(InfixOp::Add, &sum, &value, NumericMode::Native))
            .unwrap_or_default(),
        Aggregation::Min => extreme(values, Ordering::Less),
        Aggregation::Max => extreme(values, Ordering::Greater),
    }
}

fn extreme(values: Vec<Value>, wanted: Ordering) -> Value {
    let mut best: Option<Value> = None;
    for value in values {
        best = match best {
            None => Some(value),
            Some(current) => match value.compare(&current) {
                Some(ordering) if ordering == wanted => Some(value),
                Some(_) => Some(current),
                None => return Value::Null,
            },
        };
    }
    best.unwrap_or_default()
}

/// Bare value for a single unnamed output, else a context
fn shape(table: &DecisionIr, row: Row) -> Value {
    if table.single_output {
        return first(row);
    }
    let fields: IndexMap<String, Value> = table
        .outputs
        .iter()
        .zip(row)
        .map(|(clause, value)| (clause.name.clone().unwrap_or_default(), value))
        .collect();
    Value::Context(fields)
}

fn first(row: Row) -> Value {
    row.into_iter().next().unwrap_or_default()
}

fn first_row(rows: Vec<Row>) -> Row {
    rows.into_iter().next().unwrap_or_default()
}

fn same_row(a: &Row, b: &Row) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| ops::equal(x, y))
}

fn rule_numbers(indexes: &[usize]) -> String {
    indexes
        .iter()
        .map(|i| (i + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn violation(table: &DecisionIr, message: String) -> RuntimeError {
    RuntimeError::HitPolicy {
        decision: table.name.clone(),
        hit_policy: table.hit_policy.to_string(),
        message,
    }
}
