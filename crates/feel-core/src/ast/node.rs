//! AST node model

use crate::ast::InfixOp;
use crate::span::SourceSpan;
use crate::types::{FType, Number, Value};
use serde::Serialize;

/// A type-resolved AST node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstNode {
    pub kind: NodeKind,
    pub ftype: FType,
    pub span: SourceSpan,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Node kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    // Literals
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    /// `@"..."` date, time or duration literal
    Temporal(Value),

    // Structural
    List(Vec<AstNode>),
    Context(Vec<ContextEntry>),
    Range {
        start: Option<Box<AstNode>>,
        end: Option<Box<AstNode>>,
        start_inclusive: bool,
        end_inclusive: bool,
    },

    // Operators
    Infix {
        op: InfixOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Negation(Box<AstNode>),
    Between {
        value: Box<AstNode>,
        low: Box<AstNode>,
        high: Box<AstNode>,
    },
    /// `value in tests`, where `tests` is a `UnaryTests` node tested against `value`
    In {
        value: Box<AstNode>,
        tests: Box<AstNode>,
    },
    InstanceOf {
        value: Box<AstNode>,
        target: FType,
    },

    // Control
    If {
        condition: Box<AstNode>,
        then: Box<AstNode>,
        otherwise: Box<AstNode>,
    },
    For {
        iterators: Vec<Iteration>,
        body: Box<AstNode>,
    },
    Quantified {
        every: bool,
        iterators: Vec<Iteration>,
        condition: Box<AstNode>,
    },
    Filter {
        source: Box<AstNode>,
        filter: Box<AstNode>,
        kind: FilterKind,
    },
    FunctionDefinition {
        params: Vec<(String, FType)>,
        body: Box<AstNode>,
    },
    Invocation {
        callee: Callee,
        args: Vec<AstNode>,
        /// Argument names, kept only when they must be matched at runtime
        names: Option<Vec<String>>,
    },
    Path {
        source: Box<AstNode>,
        member: String,
    },

    // References
    Name {
        name: String,
        origin: NameOrigin,
    },
    /// The unary test input `?`
    TestInput,
    UnaryTests {
        negated: bool,
        tests: Vec<AstNode>,
    },
    /// `-`, matches anything
    Dash,
    /// `< e`, `= e` and friends, compared against the test input
    UnaryComparison {
        op: InfixOp,
        value: Box<AstNode>,
    },
}

/// One entry of a context literal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    pub name: String,
    pub value: AstNode,
}

/// One `name in domain` binding of a `for`, `some` or `every`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Iteration {
    pub name: String,
    pub domain: AstNode,
}

/// How a filter expression selects elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilterKind {
    /// 1-based index, negative counts from the end
    Index,
    /// Boolean predicate over each element
    Predicate,
    /// Decided by the filter value at runtime
    Dynamic,
}

/// Target of an invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Callee {
    /// A function supplied by a function factory
    Named { name: String, signature: FType },
    /// Any expression evaluating to a function value
    Value(Box<AstNode>),
}

/// Where a name was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameOrigin {
    /// Iteration variable, parameter, context entry or filter item
    Local,
    /// Field of the root input
    Input,
    /// Unknown statically, looked up on the root input at runtime
    Dynamic,
    /// A factory function used as a value
    Function,
}

impl AstNode {
    pub fn new(kind: NodeKind, ftype: FType, span: SourceSpan) -> Self {
        Self {
            kind,
            ftype,
            span,
            comments: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Attach comments
    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments.extend(comments);
        self
    }

    /// Attach a warning
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Returns true for literal nodes
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Null
                | NodeKind::Boolean(_)
                | NodeKind::Number(_)
                | NodeKind::String(_)
                | NodeKind::Temporal(_)
        )
    }

    /// Whether `?` appears anywhere below this node
    pub fn uses_test_input(&self) -> bool {
        let mut found = false;
        self.walk(&mut |node| found |= matches!(node.kind, NodeKind::TestInput));
        found
    }

    /// All warnings in this subtree, in visit order
    pub fn collect_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        self.walk(&mut |node| warnings.extend(node.warnings.iter().cloned()));
        warnings
    }

    /// Depth-first pre-order traversal
    pub fn walk(&self, visit: &mut dyn FnMut(&AstNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<&AstNode> {
        match &self.kind {
            NodeKind::Null
            | NodeKind::Boolean(_)
            | NodeKind::Number(_)
            | NodeKind::String(_)
            | NodeKind::Temporal(_)
            | NodeKind::Name { .. }
            | NodeKind::TestInput
            | NodeKind::Dash => Vec::new(),
            NodeKind::List(items) => items.iter().collect(),
            NodeKind::Context(entries) => entries.iter().map(|e| &e.value).collect(),
            NodeKind::Range { start, end, .. } => {
                start.iter().chain(end.iter()).map(|b| b.as_ref()).collect()
            }
            NodeKind::Infix { left, right, .. } => vec![&**left, &**right],
            NodeKind::Negation(inner) => vec![&**inner],
            NodeKind::Between { value, low, high } => vec![&**value, &**low, &**high],
            NodeKind::In { value, tests } => vec![&**value, &**tests],
            NodeKind::InstanceOf { value, .. } => vec![&**value],
            NodeKind::If {
                condition,
                then,
                otherwise,
            } => vec![&**condition, &**then, &**otherwise],
            NodeKind::For { iterators, body } => iterators
                .iter()
                .map(|i| &i.domain)
                .chain(std::iter::once(body.as_ref()))
                .collect(),
            NodeKind::Quantified {
                iterators,
                condition,
                ..
            } => iterators
                .iter()
                .map(|i| &i.domain)
                .chain(std::iter::once(condition.as_ref()))
                .collect(),
            NodeKind::Filter { source, filter, .. } => vec![&**source, &**filter],
            NodeKind::FunctionDefinition { body, .. } => vec![&**body],
            NodeKind::Invocation { callee, args, .. } => {
                let mut children: Vec<&AstNode> = match callee {
                    Callee::Value(target) => vec![&**target],
                    Callee::Named { .. } => Vec::new(),
                };
                children.extend(args.iter());
                children
            }
            NodeKind::Path { source, .. } => vec![&**source],
            NodeKind::UnaryTests { tests, .. } => tests.iter().collect(),
            NodeKind::UnaryComparison { value, .. } => vec![&**value],
        }
    }
}
