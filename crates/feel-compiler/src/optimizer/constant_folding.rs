//! Constant folding optimizer
//!
//! Evaluates constant subtrees of the generated IR with the same kernels the
//! runtime uses, so folding never changes a result.

use feel_core::ast::InfixOp;
use feel_core::ir::{Binding, CallTarget, DecisionIr, Domain, Ir, OutputIr, RuleIr};
use feel_core::types::number::DECIMAL_PRECISION;
use feel_core::{ops, Value};
use std::sync::Arc;

/// Constant folding optimizer
pub struct ConstantFolder {
    precision: u64,
}

impl ConstantFolder {
    /// Create a new constant folder
    pub fn new() -> Self {
        Self::with_precision(DECIMAL_PRECISION)
    }

    /// Folder rounding division to `precision` significant digits
    pub fn with_precision(precision: u64) -> Self {
        Self { precision }
    }

    /// Fold a tree. `constants` is the pool `ConstRef` indexes into.
    pub fn fold(&self, ir: &Ir, constants: &[Value]) -> Ir {
        match ir {
            Ir::Arith {
                op,
                mode,
                left,
                right,
                null_check,
            } => {
                let left = self.fold(left, constants);
                let right = self.fold(right, constants);
                if let (Some(l), Some(r)) = (value(&left, constants), value(&right, constants)) {
                    return Ir::Const(ops::arith_with_precision(*op, l, r, *mode, self.precision));
                }
                Ir::Arith {
                    op: *op,
                    mode: *mode,
                    left: left.boxed(),
                    right: right.boxed(),
                    null_check: *null_check,
                }
            }
            Ir::Concat { left, right } => {
                let left = self.fold(left, constants);
                let right = self.fold(right, constants);
                if let (Some(l), Some(r)) = (value(&left, constants), value(&right, constants)) {
                    return Ir::Const(ops::concat(l, r));
                }
                Ir::Concat {
                    left: left.boxed(),
                    right: right.boxed(),
                }
            }
            Ir::Temporal { op, left, right } => {
                let left = self.fold(left, constants);
                let right = self.fold(right, constants);
                if let (Some(l), Some(r)) = (value(&left, constants), value(&right, constants)) {
                    return Ir::Const(ops::temporal(*op, l, r));
                }
                Ir::Temporal {
                    op: *op,
                    left: left.boxed(),
                    right: right.boxed(),
                }
            }
            Ir::Compare {
                op,
                mode,
                left,
                right,
            } => {
                let left = self.fold(left, constants);
                let right = self.fold(right, constants);
                if let (Some(l), Some(r)) = (value(&left, constants), value(&right, constants)) {
                    return Ir::Const(ops::compare_with_mode(*op, *mode, l, r));
                }
                Ir::Compare {
                    op: *op,
                    mode: *mode,
                    left: left.boxed(),
                    right: right.boxed(),
                }
            }
            Ir::Equal {
                mode,
                negated,
                left,
                right,
            } => {
                let left = self.fold(left, constants);
                let right = self.fold(right, constants);
                if let (Some(l), Some(r)) = (value(&left, constants), value(&right, constants)) {
                    return Ir::Const(ops::equality(l, r, *negated));
                }
                Ir::Equal {
                    mode: *mode,
                    negated: *negated,
                    left: left.boxed(),
                    right: right.boxed(),
                }
            }
            Ir::Logic {
                op,
                short_circuit,
                left,
                right,
            } => {
                let left = self.fold(left, constants);
                let right = self.fold(right, constants);
                let (l, r) = (value(&left, constants), value(&right, constants));
                if let (Some(l), Some(r)) = (l, r) {
                    return Ir::Const(ops::logic(*op, l, r));
                }
                // `false and x` is false and `true or x` is true whatever x is
                let dominant = Value::Boolean(*op == InfixOp::Or);
                if l == Some(&dominant) || r == Some(&dominant) {
                    return Ir::Const(dominant);
                }
                Ir::Logic {
                    op: *op,
                    short_circuit: *short_circuit,
                    left: left.boxed(),
                    right: right.boxed(),
                }
            }
            Ir::Not(inner) => {
                let inner = self.fold(inner, constants);
                match value(&inner, constants) {
                    Some(v) => Ir::Const(ops::not(v)),
                    None => Ir::Not(inner.boxed()),
                }
            }
            Ir::Negate(inner) => {
                let inner = self.fold(inner, constants);
                match value(&inner, constants) {
                    Some(v) => Ir::Const(ops::negate(v)),
                    None => Ir::Negate(inner.boxed()),
                }
            }
            Ir::Dynamic { op, left, right } => {
                let left = self.fold(left, constants);
                let right = self.fold(right, constants);
                if let (Some(l), Some(r)) = (value(&left, constants), value(&right, constants)) {
                    return Ir::Const(ops::dynamic(*op, l, r));
                }
                Ir::Dynamic {
                    op: *op,
                    left: left.boxed(),
                    right: right.boxed(),
                }
            }
            Ir::If {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.fold(condition, constants);
                // Eliminate the branch when the condition is known
                if let Some(v) = value(&condition, constants) {
                    return if *v == Value::Boolean(true) {
                        self.fold(then, constants)
                    } else {
                        self.fold(otherwise, constants)
                    };
                }
                Ir::If {
                    condition: condition.boxed(),
                    then: self.fold(then, constants).boxed(),
                    otherwise: self.fold(otherwise, constants).boxed(),
                }
            }
            Ir::Between { value: v, low, high } => {
                let v = self.fold(v, constants);
                let low = self.fold(low, constants);
                let high = self.fold(high, constants);
                if let (Some(x), Some(lo), Some(hi)) = (
                    value(&v, constants),
                    value(&low, constants),
                    value(&high, constants),
                ) {
                    let above = ops::compare(InfixOp::Ge, x, lo);
                    let below = ops::compare(InfixOp::Le, x, hi);
                    return Ir::Const(ops::and(&above, &below));
                }
                Ir::Between {
                    value: v.boxed(),
                    low: low.boxed(),
                    high: high.boxed(),
                }
            }

            // Leaves
            Ir::Const(_)
            | Ir::ConstRef(_)
            | Ir::Input
            | Ir::TestInput
            | Ir::Local(_)
            | Ir::InputField(_) => ir.clone(),

            // Structure only: fold the children
            Ir::Member { source, name } => Ir::Member {
                source: self.fold(source, constants).boxed(),
                name: name.clone(),
            },
            Ir::List(items) => Ir::List(items.iter().map(|i| self.fold(i, constants)).collect()),
            Ir::Context(entries) => Ir::Context(
                entries
                    .iter()
                    .map(|(name, v)| (name.clone(), self.fold(v, constants)))
                    .collect(),
            ),
            Ir::Range {
                start,
                end,
                start_inclusive,
                end_inclusive,
            } => Ir::Range {
                start: start.as_ref().map(|s| self.fold(s, constants).boxed()),
                end: end.as_ref().map(|e| self.fold(e, constants).boxed()),
                start_inclusive: *start_inclusive,
                end_inclusive: *end_inclusive,
            },
            Ir::InstanceOf { value: v, target } => Ir::InstanceOf {
                value: self.fold(v, constants).boxed(),
                target: target.clone(),
            },
            Ir::Filter {
                source,
                filter,
                kind,
            } => Ir::Filter {
                source: self.fold(source, constants).boxed(),
                filter: self.fold(filter, constants).boxed(),
                kind: *kind,
            },
            Ir::For { iterators, body } => Ir::For {
                iterators: self.fold_bindings(iterators, constants),
                body: self.fold(body, constants).boxed(),
            },
            Ir::Quantified {
                every,
                iterators,
                condition,
            } => Ir::Quantified {
                every: *every,
                iterators: self.fold_bindings(iterators, constants),
                condition: self.fold(condition, constants).boxed(),
            },
            Ir::Function {
                params,
                body,
                ftype,
            } => Ir::Function {
                params: params.clone(),
                body: Arc::new(self.fold(body, constants)),
                ftype: ftype.clone(),
            },
            Ir::Call {
                target,
                args,
                names,
            } => Ir::Call {
                target: match target {
                    CallTarget::Builtin(name) => CallTarget::Builtin(name.clone()),
                    CallTarget::Value(callee) => {
                        CallTarget::Value(self.fold(callee, constants).boxed())
                    }
                },
                args: args.iter().map(|a| self.fold(a, constants)).collect(),
                names: names.clone(),
            },
            Ir::Convert { value: v, target } => Ir::Convert {
                value: self.fold(v, constants).boxed(),
                target: target.clone(),
            },
            Ir::UnaryMatch { test } => Ir::UnaryMatch {
                test: self.fold(test, constants).boxed(),
            },
            Ir::ListContains { list, value: v } => Ir::ListContains {
                list: self.fold(list, constants).boxed(),
                value: self.fold(v, constants).boxed(),
            },
            Ir::RangeContains { range, value: v } => Ir::RangeContains {
                range: self.fold(range, constants).boxed(),
                value: self.fold(v, constants).boxed(),
            },
            Ir::WithTestInput { subject, body } => Ir::WithTestInput {
                subject: self.fold(subject, constants).boxed(),
                body: self.fold(body, constants).boxed(),
            },
            Ir::DecisionTable(table) => Ir::DecisionTable(Box::new(self.fold_table(table, constants))),
        }
    }

    fn fold_bindings(&self, bindings: &[Binding], constants: &[Value]) -> Vec<Binding> {
        bindings
            .iter()
            .map(|binding| Binding {
                name: binding.name.clone(),
                domain: match &binding.domain {
                    Domain::Values(values) => Domain::Values(self.fold(values, constants)),
                    Domain::Steps {
                        first,
                        last,
                        cursor,
                        successor,
                        predecessor,
                    } => Domain::Steps {
                        first: self.fold(first, constants),
                        last: self.fold(last, constants),
                        cursor: cursor.clone(),
                        successor: self.fold(successor, constants),
                        predecessor: self.fold(predecessor, constants),
                    },
                },
            })
            .collect()
    }

    fn fold_table(&self, table: &DecisionIr, constants: &[Value]) -> DecisionIr {
        let fold_all =
            |irs: &[Ir]| -> Vec<Ir> { irs.iter().map(|ir| self.fold(ir, constants)).collect() };
        DecisionIr {
            name: table.name.clone(),
            inputs: fold_all(&table.inputs),
            rules: table
                .rules
                .iter()
                .map(|rule| RuleIr {
                    conditions: fold_all(&rule.conditions),
                    outputs: fold_all(&rule.outputs),
                })
                .collect(),
            outputs: table
                .outputs
                .iter()
                .map(|output| OutputIr {
                    name: output.name.clone(),
                    check: output.check.as_ref().map(|c| self.fold(c, constants)),
                    priorities: fold_all(&output.priorities),
                    default: output.default.as_ref().map(|d| self.fold(d, constants)),
                })
                .collect(),
            hit_policy: table.hit_policy,
            aggregation: table.aggregation,
            single_output: table.single_output,
        }
    }
}

impl Default for ConstantFolder {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of a constant node
fn value<'a>(ir: &'a Ir, constants: &'a [Value]) -> Option<&'a Value> {
    match ir {
        Ir::Const(v) => Some(v),
        Ir::ConstRef(index) => constants.get(*index),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feel_core::ir::{CompareMode, NumericMode};
    use feel_core::Number;

    fn int(i: i32) -> Box<Ir> {
        Ir::Const(Value::from(i)).boxed()
    }

    #[test]
    fn test_fold_arithmetic() {
        let folder = ConstantFolder::new();
        let ir = Ir::Arith {
            op: InfixOp::Add,
            mode: NumericMode::Native,
            left: int(1),
            right: int(1),
            null_check: false,
        };
        assert_eq!(folder.fold(&ir, &[]), Ir::Const(Value::from(2)));
    }

    #[test]
    fn test_fold_resolves_pool_entries() {
        let folder = ConstantFolder::new();
        let pool = vec![Value::from("a")];
        let ir = Ir::Concat {
            left: Ir::ConstRef(0).boxed(),
            right: int(1),
        };
        assert_eq!(folder.fold(&ir, &pool), Ir::Const(Value::from("a1")));
    }

    #[test]
    fn test_division_precision() {
        let folder = ConstantFolder::with_precision(4);
        let ir = Ir::Arith {
            op: InfixOp::Div,
            mode: NumericMode::Decimal,
            left: int(2),
            right: int(3),
            null_check: false,
        };
        let expected = Value::Number(Number::parse_literal("0.6667").unwrap());
        assert_eq!(folder.fold(&ir, &[]), Ir::Const(expected));
    }

    #[test]
    fn test_dominating_logic_operand() {
        let folder = ConstantFolder::new();
        let ir = Ir::Logic {
            op: InfixOp::And,
            short_circuit: false,
            left: Ir::InputField("a".into()).boxed(),
            right: Ir::Const(Value::Boolean(false)).boxed(),
        };
        assert_eq!(folder.fold(&ir, &[]), Ir::Const(Value::Boolean(false)));
    }

    #[test]
    fn test_branch_elimination_and_partial_folding() {
        let folder = ConstantFolder::new();
        let compare = Ir::Compare {
            op: InfixOp::Lt,
            mode: CompareMode::Double,
            left: int(1),
            right: int(2),
        };
        let ir = Ir::If {
            condition: compare.boxed(),
            then: Ir::InputField("x".into()).boxed(),
            otherwise: int(0),
        };
        assert_eq!(folder.fold(&ir, &[]), Ir::InputField("x".into()));

        let partial = Ir::List(vec![
            Ir::Negate(int(3)),
            Ir::Negate(Ir::Local("y".into()).boxed()),
        ]);
        match folder.fold(&partial, &[]) {
            Ir::List(items) => {
                assert_eq!(items[0], Ir::Const(Value::from(-3)));
                assert!(matches!(items[1], Ir::Negate(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
