//! IR nodes

use crate::ast::{FilterKind, InfixOp};
use crate::ir::DecisionIr;
use crate::types::{FType, Value};
use serde::Serialize;
use std::sync::Arc;

/// How arithmetic is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumericMode {
    /// Narrowest machine representation, widening on overflow
    Native,
    /// Exact decimal arithmetic
    Decimal,
}

/// How ordering comparisons are carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareMode {
    /// Exact decimal comparison
    Decimal,
    /// Comparison as doubles
    Double,
    /// The natural ordering of the operand family
    Natural,
}

/// How equality is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EqualMode {
    /// Both operands are non-null primitives of the same representation
    Primitive,
    /// Numeric comparison, so `1 = 1.0`
    Numeric,
    /// Null-safe structural equality
    Structural,
}

/// Target of a call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CallTarget {
    /// Built-in function, dispatched on its runtime arguments
    Builtin(String),
    /// Any expression producing a function value
    Value(Box<Ir>),
}

/// Iteration domain of a `for`, `some` or `every` binding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Domain {
    /// Iterate the elements of a list; ranges and scalars are expanded at runtime
    Values(Ir),
    /// Step from `first` to `last`, both inclusive
    Steps {
        first: Ir,
        last: Ir,
        /// Local holding the current element while stepping
        cursor: String,
        /// Next element when ascending, in terms of `cursor`
        successor: Ir,
        /// Next element when descending, in terms of `cursor`
        predecessor: Ir,
    },
}

/// A `name in domain` binding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub name: String,
    pub domain: Domain,
}

/// IR node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Ir {
    /// Inline constant
    Const(Value),
    /// Entry of the program constant pool
    ConstRef(usize),
    /// The root input
    Input,
    /// The unary test input `?`
    TestInput,
    /// Local variable
    Local(String),
    /// Field of the root input; missing fields are null
    InputField(String),
    /// Context field or built-in member; maps over lists
    Member { source: Box<Ir>, name: String },

    Arith {
        op: InfixOp,
        mode: NumericMode,
        left: Box<Ir>,
        right: Box<Ir>,
        /// False only when both operands are proven non-null
        null_check: bool,
    },
    /// String concatenation, rendering a non-string operand
    Concat { left: Box<Ir>, right: Box<Ir> },
    /// Date, time and duration arithmetic
    Temporal {
        op: InfixOp,
        left: Box<Ir>,
        right: Box<Ir>,
    },
    Compare {
        op: InfixOp,
        mode: CompareMode,
        left: Box<Ir>,
        right: Box<Ir>,
    },
    Equal {
        mode: EqualMode,
        negated: bool,
        left: Box<Ir>,
        right: Box<Ir>,
    },
    /// `and` / `or`. Short-circuit is only valid for non-null booleans.
    Logic {
        op: InfixOp,
        short_circuit: bool,
        left: Box<Ir>,
        right: Box<Ir>,
    },
    /// Three-valued negation
    Not(Box<Ir>),
    /// Arithmetic negation
    Negate(Box<Ir>),
    /// Operator dispatched on the runtime operand types
    Dynamic {
        op: InfixOp,
        left: Box<Ir>,
        right: Box<Ir>,
    },

    If {
        condition: Box<Ir>,
        then: Box<Ir>,
        /// Taken when the condition is false, null or not a boolean
        otherwise: Box<Ir>,
    },
    List(Vec<Ir>),
    /// Entries are evaluated in order; later entries see earlier ones as locals
    Context(Vec<(String, Ir)>),
    Range {
        start: Option<Box<Ir>>,
        end: Option<Box<Ir>>,
        start_inclusive: bool,
        end_inclusive: bool,
    },
    Between {
        value: Box<Ir>,
        low: Box<Ir>,
        high: Box<Ir>,
    },
    InstanceOf { value: Box<Ir>, target: FType },
    /// Filter or index a list; `item` and the element's fields are locals in a predicate
    Filter {
        source: Box<Ir>,
        filter: Box<Ir>,
        kind: FilterKind,
    },
    For {
        iterators: Vec<Binding>,
        body: Box<Ir>,
    },
    Quantified {
        every: bool,
        iterators: Vec<Binding>,
        condition: Box<Ir>,
    },
    /// Function definition, capturing the current locals
    Function {
        params: Vec<String>,
        body: Arc<Ir>,
        ftype: FType,
    },
    Call {
        target: CallTarget,
        args: Vec<Ir>,
        /// Argument names matched against the callee's parameters at runtime
        names: Option<Vec<String>>,
    },
    /// Conversion to another type of the lattice
    Convert { value: Box<Ir>, target: FType },

    /// Unary test whose kind is decided by the runtime value of `test`
    UnaryMatch { test: Box<Ir> },
    ListContains { list: Box<Ir>, value: Box<Ir> },
    RangeContains { range: Box<Ir>, value: Box<Ir> },
    /// Evaluate `body` with `?` bound to `subject`
    WithTestInput { subject: Box<Ir>, body: Box<Ir> },
    DecisionTable(Box<DecisionIr>),
}

impl Ir {
    /// Boxed helper for building trees
    pub fn boxed(self) -> Box<Ir> {
        Box::new(self)
    }

    /// Null constant
    pub fn null() -> Ir {
        Ir::Const(Value::Null)
    }

    /// Returns true for inline or pooled constants
    pub fn is_constant(&self) -> bool {
        matches!(self, Ir::Const(_) | Ir::ConstRef(_))
    }

    /// Whether this tree reads `?` outside of a nested `WithTestInput`
    pub fn reads_test_input(&self) -> bool {
        match self {
            Ir::TestInput => true,
            Ir::WithTestInput { subject, .. } => subject.reads_test_input(),
            other => other.children().into_iter().any(Ir::reads_test_input),
        }
    }

    /// Direct children
    pub fn children(&self) -> Vec<&Ir> {
        match self {
            Ir::Const(_)
            | Ir::ConstRef(_)
            | Ir::Input
            | Ir::TestInput
            | Ir::Local(_)
            | Ir::InputField(_) => Vec::new(),
            Ir::Member { source, .. } => vec![&**source],
            Ir::Arith { left, right, .. }
            | Ir::Concat { left, right }
            | Ir::Temporal { left, right, .. }
            | Ir::Compare { left, right, .. }
            | Ir::Equal { left, right, .. }
            | Ir::Logic { left, right, .. }
            | Ir::Dynamic { left, right, .. } => vec![&**left, &**right],
            Ir::Not(inner) | Ir::Negate(inner) => vec![&**inner],
            Ir::If {
                condition,
                then,
                otherwise,
            } => vec![&**condition, &**then, &**otherwise],
            Ir::List(items) => items.iter().collect(),
            Ir::Context(entries) => entries.iter().map(|(_, v)| v).collect(),
            Ir::Range { start, end, .. } => {
                start.iter().chain(end.iter()).map(|b| &**b).collect()
            }
            Ir::Between { value, low, high } => vec![&**value, &**low, &**high],
            Ir::InstanceOf { value, .. } | Ir::Convert { value, .. } => vec![&**value],
            Ir::Filter { source, filter, .. } => vec![&**source, &**filter],
            Ir::For { iterators, body } => iterator_children(iterators, body),
            Ir::Quantified {
                iterators,
                condition,
                ..
            } => iterator_children(iterators, condition),
            Ir::Function { body, .. } => vec![&**body],
            Ir::Call { target, args, .. } => {
                let mut children: Vec<&Ir> = match target {
                    CallTarget::Value(callee) => vec![&**callee],
                    CallTarget::Builtin(_) => Vec::new(),
                };
                children.extend(args.iter());
                children
            }
            Ir::UnaryMatch { test } => vec![&**test],
            Ir::ListContains { list, value } => vec![&**list, &**value],
            Ir::RangeContains { range, value } => vec![&**range, &**value],
            Ir::WithTestInput { subject, body } => vec![&**subject, &**body],
            Ir::DecisionTable(table) => table.children(),
        }
    }
}

fn iterator_children<'a>(iterators: &'a [Binding], body: &'a Ir) -> Vec<&'a Ir> {
    let mut children = Vec::new();
    for iterator in iterators {
        match &iterator.domain {
            Domain::Values(values) => children.push(values),
            Domain::Steps {
                first,
                last,
                successor,
                predecessor,
                ..
            } => children.extend([first, last, successor, predecessor]),
        }
    }
    children.push(body);
    children
}
