//! Built-in function catalog
//!
//! Declares the overload sets of the standard FEEL functions and lowers call
//! sites to `Ir::Call` on a builtin target. The runtime dispatches on the
//! builtin name and the actual argument values.

use crate::codegen::CodeFragment;
use crate::context::TranslationContext;
use crate::error::Result;
use crate::factory::{resolve_overload, FeelFunctionFactory};
use feel_core::ast::AstNode;
use feel_core::ir::{CallTarget, Ir};
use feel_core::types::FunctionValue;
use feel_core::FType;
use indexmap::IndexMap;

/// Functions taking either one list or any number of loose arguments
const VARIADIC: &[&str] = &[
    "min",
    "max",
    "sum",
    "mean",
    "all",
    "any",
    "product",
    "median",
    "stddev",
    "mode",
    "concatenate",
    "union",
    "append",
];

/// The standard FEEL function library
pub struct BuiltinFunctionFactory {
    catalog: IndexMap<String, Vec<FType>>,
}

impl BuiltinFunctionFactory {
    pub fn new() -> Self {
        Self {
            catalog: catalog(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.catalog.contains_key(name)
    }

    fn variadic_signature(&self, name: &str, args: &[FType]) -> Option<FType> {
        if name == "append" {
            let (list, items) = args.split_first()?;
            if !list.is_list() && !list.is_any() {
                return None;
            }
            let element = items
                .iter()
                .fold(list.element_type(), |acc, item| acc.min_super(item));
            return Some(FType::anonymous_function(args.to_vec(), FType::list(element)));
        }
        if let [single] = args {
            if single.is_list() {
                let declared = resolve_overload(self.catalog.get(name)?, args)?;
                return Some(match (name, declared) {
                    ("min" | "max", FType::Function { params, names, .. }) => FType::Function {
                        params,
                        names,
                        ret: Box::new(single.element_type()),
                    },
                    (_, declared) => declared,
                });
            }
        }
        if args.is_empty() {
            return None;
        }
        let element = args
            .iter()
            .skip(1)
            .fold(args[0].clone(), |acc, arg| acc.min_super(arg));
        let ret = match name {
            "min" | "max" => element,
            "all" | "any" => FType::Boolean,
            "mode" => FType::list(FType::NUMBER),
            "concatenate" | "union" => FType::list(element.element_type()),
            _ => FType::NUMBER,
        };
        Some(FType::anonymous_function(args.to_vec(), ret))
    }
}

impl Default for BuiltinFunctionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl FeelFunctionFactory for BuiltinFunctionFactory {
    fn functions(&self) -> IndexMap<String, Vec<FType>> {
        self.catalog.clone()
    }

    fn signature(&self, name: &str, args: &[FType]) -> Option<FType> {
        if VARIADIC.contains(&name) {
            return self.variadic_signature(name, args);
        }
        resolve_overload(self.catalog.get(name)?, args)
    }

    fn function(
        &self,
        _node: &AstNode,
        name: &str,
        args: Vec<CodeFragment>,
        _ctx: &mut TranslationContext,
    ) -> Result<Option<CodeFragment>> {
        if !self.contains(name) {
            return Ok(None);
        }
        let arg_types: Vec<FType> = args.iter().map(|a| a.ftype.clone()).collect();
        let ret = self.return_type(name, &arg_types).unwrap_or(FType::Any);

        if name == "not" {
            if let [negand] = args.as_slice() {
                let ir = Ir::Not(negand.ir.clone().boxed());
                return Ok(Some(CodeFragment::new(ir, FType::Boolean)));
            }
        }
        let ir = Ir::Call {
            target: CallTarget::Builtin(name.to_string()),
            args: args.into_iter().map(|a| a.ir).collect(),
            names: None,
        };
        Ok(Some(CodeFragment::new(ir, ret)))
    }

    fn value(&self, name: &str) -> Option<FunctionValue> {
        let ftype = self.catalog.get(name)?.first()?.clone();
        Some(FunctionValue::Builtin {
            name: name.to_string(),
            ftype,
        })
    }
}

fn f(params: &[(&str, FType)], ret: FType) -> FType {
    FType::function(params.to_vec(), ret)
}

fn catalog() -> IndexMap<String, Vec<FType>> {
    use FType::{Any, Boolean, Date, DateTime, String as Str, Time};
    let number = FType::NUMBER;
    let integer = FType::INTEGER;
    let list = FType::list(Any);
    let context = FType::Context(Vec::new());

    let mut c: IndexMap<String, Vec<FType>> = IndexMap::new();
    let mut add = |name: &str, overloads: Vec<FType>| {
        c.insert(name.to_string(), overloads);
    };

    // Conversion
    add(
        "date",
        vec![
            f(&[("from", Str)], Date),
            f(&[("from", DateTime)], Date),
            f(
                &[("year", number.clone()), ("month", number.clone()), ("day", number.clone())],
                Date,
            ),
        ],
    );
    add(
        "time",
        vec![
            f(&[("from", Str)], Time),
            f(&[("from", DateTime)], Time),
            f(
                &[
                    ("hour", number.clone()),
                    ("minute", number.clone()),
                    ("second", number.clone()),
                ],
                Time,
            ),
        ],
    );
    add(
        "date and time",
        vec![
            f(&[("from", Str)], DateTime),
            f(&[("date", Date), ("time", Time)], DateTime),
        ],
    );
    add(
        "number",
        vec![
            f(&[("from", Str)], number.clone()),
            f(
                &[
                    ("from", Str),
                    ("grouping separator", Str),
                    ("decimal separator", Str),
                ],
                number.clone(),
            ),
        ],
    );
    add("string", vec![f(&[("from", Any)], Str)]);
    add("duration", vec![f(&[("from", Str)], Any)]);
    add(
        "years and months duration",
        vec![
            f(&[("from", Date), ("to", Date)], FType::YearMonthDuration),
            f(&[("from", DateTime), ("to", DateTime)], FType::YearMonthDuration),
        ],
    );

    // Boolean
    add("not", vec![f(&[("negand", Any)], Boolean)]);
    add("is", vec![f(&[("value1", Any), ("value2", Any)], Boolean)]);

    // String
    add(
        "substring",
        vec![
            f(&[("string", Str), ("start position", number.clone())], Str),
            f(
                &[
                    ("string", Str),
                    ("start position", number.clone()),
                    ("length", number.clone()),
                ],
                Str,
            ),
        ],
    );
    add("string length", vec![f(&[("string", Str)], integer.clone())]);
    add("upper case", vec![f(&[("string", Str)], Str)]);
    add("lower case", vec![f(&[("string", Str)], Str)]);
    for name in ["substring before", "substring after"] {
        add(name, vec![f(&[("string", Str), ("match", Str)], Str)]);
    }
    for name in ["contains", "starts with", "ends with"] {
        add(name, vec![f(&[("string", Str), ("match", Str)], Boolean)]);
    }
    add(
        "replace",
        vec![
            f(&[("input", Str), ("pattern", Str), ("replacement", Str)], Str),
            f(
                &[("input", Str), ("pattern", Str), ("replacement", Str), ("flags", Str)],
                Str,
            ),
        ],
    );
    add(
        "matches",
        vec![
            f(&[("input", Str), ("pattern", Str)], Boolean),
            f(&[("input", Str), ("pattern", Str), ("flags", Str)], Boolean),
        ],
    );
    add(
        "split",
        vec![f(&[("string", Str), ("delimiter", Str)], FType::list(Str))],
    );

    // List
    add(
        "list contains",
        vec![f(&[("list", list.clone()), ("element", Any)], Boolean)],
    );
    add("count", vec![f(&[("list", list.clone())], integer.clone())]);
    for name in ["min", "max"] {
        add(name, vec![f(&[("list", list.clone())], Any)]);
    }
    for name in ["sum", "mean", "product", "median", "stddev"] {
        add(name, vec![f(&[("list", list.clone())], number.clone())]);
    }
    add("mode", vec![f(&[("list", list.clone())], FType::list(number.clone()))]);
    for name in ["all", "any"] {
        add(name, vec![f(&[("list", list.clone())], Boolean)]);
    }
    add(
        "sublist",
        vec![
            f(&[("list", list.clone()), ("start position", number.clone())], list.clone()),
            f(
                &[
                    ("list", list.clone()),
                    ("start position", number.clone()),
                    ("length", number.clone()),
                ],
                list.clone(),
            ),
        ],
    );
    add("append", vec![f(&[("list", list.clone()), ("item", Any)], list.clone())]);
    for name in ["concatenate", "union"] {
        add(name, vec![f(&[("list", list.clone())], list.clone())]);
    }
    add(
        "insert before",
        vec![f(
            &[("list", list.clone()), ("position", number.clone()), ("newItem", Any)],
            list.clone(),
        )],
    );
    add(
        "remove",
        vec![f(&[("list", list.clone()), ("position", number.clone())], list.clone())],
    );
    for name in ["reverse", "distinct values", "flatten"] {
        add(name, vec![f(&[("list", list.clone())], list.clone())]);
    }
    add(
        "index of",
        vec![f(&[("list", list.clone()), ("match", Any)], FType::list(number.clone()))],
    );
    add(
        "sort",
        vec![
            f(&[("list", list.clone())], list.clone()),
            f(&[("list", list.clone()), ("precedes", Any)], list.clone()),
        ],
    );

    // Numeric
    add(
        "decimal",
        vec![f(&[("n", number.clone()), ("scale", number.clone())], number.clone())],
    );
    for name in ["floor", "ceiling", "abs", "sqrt", "log", "exp"] {
        add(name, vec![f(&[("n", number.clone())], number.clone())]);
    }
    add(
        "modulo",
        vec![f(
            &[("dividend", number.clone()), ("divisor", number.clone())],
            number.clone(),
        )],
    );
    for name in ["odd", "even"] {
        add(name, vec![f(&[("number", number.clone())], Boolean)]);
    }

    // Range
    for name in [
        "before",
        "after",
        "meets",
        "met by",
        "overlaps",
        "finishes",
        "finished by",
        "starts",
        "started by",
        "coincides",
    ] {
        add(name, vec![f(&[("range1", Any), ("range2", Any)], Boolean)]);
    }

    // Temporal
    for (name, ret) in [
        ("day of year", integer.clone()),
        ("day of week", Str),
        ("month of year", Str),
        ("week of year", integer.clone()),
    ] {
        add(
            name,
            vec![f(&[("date", Date)], ret.clone()), f(&[("date", DateTime)], ret)],
        );
    }

    // Context
    add("get value", vec![f(&[("m", context.clone()), ("key", Str)], Any)]);
    add(
        "get entries",
        vec![f(
            &[("m", context)],
            FType::list(FType::context(vec![("key", Str), ("value", Any)])),
        )],
    );

    c
}
