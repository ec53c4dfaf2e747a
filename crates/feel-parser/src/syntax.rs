//! Parse tree produced by the FEEL parser
//!
//! The parse tree is untyped: names are plain strings and type references are
//! left unresolved. The compiler's AST builder turns it into typed AST nodes.

use feel_core::ast::InfixOp;
use feel_core::SourceSpan;
use serde::Serialize;

/// A parse tree node with its source location and leading comments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Syntax {
    pub kind: SyntaxKind,
    pub span: SourceSpan,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

impl Syntax {
    pub fn new(kind: SyntaxKind, span: SourceSpan) -> Self {
        Self {
            kind,
            span,
            comments: Vec::new(),
        }
    }

    /// Boxed copy, for building parent nodes
    pub(crate) fn boxed(self) -> Box<Syntax> {
        Box::new(self)
    }
}

/// Parse tree node kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SyntaxKind {
    // Literals
    Null,
    Boolean(bool),
    /// Number literal as written
    Number(String),
    String(String),
    /// `@"..."` temporal literal, unparsed
    Temporal(String),

    // References
    Name(String),
    /// The unary-test input `?`
    TestInput,
    /// The `-` unary test
    Dash,

    // Structural
    List(Vec<Syntax>),
    Context(Vec<(String, Syntax)>),
    Interval {
        start: Box<Syntax>,
        end: Box<Syntax>,
        start_inclusive: bool,
        end_inclusive: bool,
    },

    // Operators
    Binary {
        op: InfixOp,
        left: Box<Syntax>,
        right: Box<Syntax>,
    },
    Negation(Box<Syntax>),
    Between {
        value: Box<Syntax>,
        low: Box<Syntax>,
        high: Box<Syntax>,
    },
    In {
        value: Box<Syntax>,
        tests: Vec<Syntax>,
    },
    InstanceOf {
        value: Box<Syntax>,
        target: TypeRef,
    },

    // Control
    If {
        condition: Box<Syntax>,
        then: Box<Syntax>,
        otherwise: Box<Syntax>,
    },
    For {
        iterators: Vec<IterationSyntax>,
        body: Box<Syntax>,
    },
    Quantified {
        every: bool,
        iterators: Vec<IterationSyntax>,
        condition: Box<Syntax>,
    },
    Filter {
        source: Box<Syntax>,
        filter: Box<Syntax>,
    },
    FunctionDefinition {
        params: Vec<(String, Option<TypeRef>)>,
        body: Box<Syntax>,
    },
    Invocation {
        callee: Box<Syntax>,
        args: Arguments,
    },
    Path {
        source: Box<Syntax>,
        member: String,
    },

    // Unary tests
    UnaryComparison {
        op: InfixOp,
        value: Box<Syntax>,
    },
    UnaryTests {
        negated: bool,
        tests: Vec<Syntax>,
    },
}

/// One `name in domain` clause of `for`, `some` or `every`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationSyntax {
    pub name: String,
    pub domain: Syntax,
    /// Upper bound of a `domain..end` range domain
    pub end: Option<Syntax>,
}

/// Invocation arguments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Arguments {
    Positional(Vec<Syntax>),
    Named(Vec<(String, Syntax)>),
}

impl Arguments {
    pub fn len(&self) -> usize {
        match self {
            Arguments::Positional(args) => args.len(),
            Arguments::Named(args) => args.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unresolved type reference, as written after `instance of` or in a parameter annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    Context(Vec<(String, TypeRef)>),
    Range {
        element: Box<TypeRef>,
        start_inclusive: Option<bool>,
        end_inclusive: Option<bool>,
    },
    Function {
        params: Vec<TypeRef>,
        ret: Box<TypeRef>,
    },
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::List(element) => write!(f, "list<{}>", element),
            TypeRef::Context(fields) => {
                write!(f, "context<")?;
                for (i, (name, t)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, t)?;
                }
                write!(f, ">")
            }
            TypeRef::Range {
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
            TypeRef::Function { params, ret } => {
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
