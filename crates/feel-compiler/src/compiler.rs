//! Main compiler
//!
//! Provides a unified interface for compiling expressions, unary tests and
//! decision tables into IR programs.

use crate::builder::AstBuilder;
use crate::codegen::{AstCompiler, CodeFragment};
use crate::context::TranslationContext;
use crate::dmn::DecisionTableGenerator;
use crate::error::Result;
use crate::factory::{self, FunctionFactories, TypeFactories};
use crate::optimizer::ConstantFolder;
use crate::task::CompilerTask;
use feel_core::dmn::DecisionTableDefinition;
use feel_core::ir::program::DECIMAL_PRECISION_KEY;
use feel_core::ir::{Program, ProgramMetadata};
use feel_core::FType;
use feel_parser::Syntax;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Compiler options
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Enable constant folding
    pub enable_constant_folding: bool,
    /// Allow machine arithmetic when both operands have narrow representations
    pub native_arithmetic: bool,
    /// Significant digits of decimal division
    pub decimal_precision: u64,
    /// Unknown names are errors rather than dynamic lookups
    pub strict_names: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            enable_constant_folding: true,
            native_arithmetic: true,
            decimal_precision: feel_core::types::number::DECIMAL_PRECISION,
            strict_names: true,
        }
    }
}

/// The FEEL compiler
pub struct Compiler {
    /// Compiler options
    options: CompilerOptions,
    /// Type factories, defaults last
    types: TypeFactories,
    /// Function factories, defaults last
    functions: FunctionFactories,
    /// Constant folder
    constant_folder: ConstantFolder,
}

impl Compiler {
    /// Create a new compiler instance with default options
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    /// Create a new compiler instance with custom options
    pub fn with_options(options: CompilerOptions) -> Self {
        Self::with_factories(
            options,
            factory::default_type_factories(),
            factory::default_function_factories(),
        )
    }

    /// Create a compiler over explicit provider lists.
    ///
    /// The lists are used as given; callers append the defaults themselves.
    pub fn with_factories(
        options: CompilerOptions,
        types: TypeFactories,
        functions: FunctionFactories,
    ) -> Self {
        let constant_folder = ConstantFolder::with_precision(options.decimal_precision);
        Self {
            options,
            types,
            functions,
            constant_folder,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Fresh translation context for a task
    pub fn context(&self, task: &CompilerTask) -> TranslationContext {
        task.context(&self.options, self.types.clone(), self.functions.clone())
    }

    /// Compile a FEEL expression
    pub fn compile_expression(&self, task: &CompilerTask) -> Result<Program> {
        let mut ctx = self.context(task);
        let fragment = self.lower_expression(&mut ctx, &task.source)?;
        let metadata = ProgramMetadata::for_expression(&task.unit_name);
        Ok(self.finish(task, ctx, fragment, metadata))
    }

    /// Compile a unary-test list; `?` has the task's test input type, or Any
    pub fn compile_unary_tests(&self, task: &CompilerTask) -> Result<Program> {
        let mut ctx = self.context(task);
        if ctx.test_input_type().is_none() {
            ctx.replace_test_input_type(Some(FType::Any));
        }
        let syntax = self.parse_unary_tests(&ctx, &task.source)?;
        let fragment = self.lower_unary_tests(&mut ctx, &task.source, &syntax)?;
        let metadata = ProgramMetadata::for_unary_test(&task.unit_name);
        Ok(self.finish(task, ctx, fragment, metadata))
    }

    /// Compile a decision table. The task's source is ignored.
    pub fn compile_decision_table(
        &self,
        definition: &DecisionTableDefinition,
        task: &CompilerTask,
    ) -> Result<Program> {
        definition.validate()?;
        let mut ctx = self.context(task);
        let fragment = DecisionTableGenerator::new(self).generate(&mut ctx, definition)?;
        let source = serde_json::to_string(definition).unwrap_or_default();
        let metadata = ProgramMetadata::for_decision_table(&task.unit_name)
            .with_custom("decision".to_string(), definition.name.clone());
        Ok(self.finish(&task.with_source(source), ctx, fragment, metadata))
    }

    // === Passes ===

    /// Parse, build and lower one expression in an existing context
    pub(crate) fn lower_expression(
        &self,
        ctx: &mut TranslationContext,
        source: &str,
    ) -> Result<CodeFragment> {
        let syntax = feel_parser::parse_expression(source, &ctx.known_names())?;
        let ast = AstBuilder::new(ctx, source).build_expression(&syntax)?;
        for warning in ast.collect_warnings() {
            ctx.warn(warning);
        }
        AstCompiler::new(ctx).compile(&ast)
    }

    pub(crate) fn parse_unary_tests(
        &self,
        ctx: &TranslationContext,
        source: &str,
    ) -> Result<Syntax> {
        Ok(feel_parser::parse_unary_tests(source, &ctx.known_names())?)
    }

    /// Build and lower parsed unary tests against the context's test input type
    pub(crate) fn lower_unary_tests(
        &self,
        ctx: &mut TranslationContext,
        source: &str,
        syntax: &Syntax,
    ) -> Result<CodeFragment> {
        let ast = AstBuilder::new(ctx, source).build_unary_tests(syntax)?;
        for warning in ast.collect_warnings() {
            ctx.warn(warning);
        }
        AstCompiler::new(ctx).compile(&ast)
    }

    fn finish(
        &self,
        task: &CompilerTask,
        mut ctx: TranslationContext,
        fragment: CodeFragment,
        metadata: ProgramMetadata,
    ) -> Program {
        let warnings = ctx.take_warnings();
        let constants = ctx.into_constants();
        let root = if self.options.enable_constant_folding {
            self.constant_folder.fold(&fragment.ir, &constants)
        } else {
            fragment.ir
        };

        let metadata = metadata
            .with_source(task.source.clone())
            .with_warnings(warnings)
            .with_custom(
                DECIMAL_PRECISION_KEY.to_string(),
                self.options.decimal_precision.to_string(),
            );
        let program = Program::new(&task.method_name, root, metadata)
            .with_constants(constants)
            .with_result_type(fragment.ftype);

        debug!(
            unit = %program.qualified_name(),
            kind = %program.metadata.source_type,
            result_type = %program.result_type,
            constants = program.constants.len(),
            "generated program"
        );
        program
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use feel_core::ir::Ir;
    use feel_core::Value;

    fn expression(source: &str) -> CompilerTask {
        CompilerTask::builder().source(source).build()
    }

    #[test]
    fn test_options_default() {
        let options = CompilerOptions::default();
        assert!(options.enable_constant_folding);
        assert!(options.strict_names);
        assert_eq!(options.decimal_precision, 34);
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: CompilerOptions =
            serde_json::from_str(r#"{"enable_constant_folding": false}"#).unwrap();
        assert!(!options.enable_constant_folding);
        assert!(options.native_arithmetic);
    }

    #[test]
    fn test_compile_folds_constants() {
        let program = Compiler::new().compile_expression(&expression("1 + 1")).unwrap();
        assert_eq!(program.root, Ir::Const(Value::from(2)));
        assert_eq!(program.result_type, FType::INTEGER);
        assert_eq!(program.metadata.source.as_deref(), Some("1 + 1"));
    }

    #[test]
    fn test_compile_without_folding() {
        let compiler = Compiler::with_options(CompilerOptions {
            enable_constant_folding: false,
            ..CompilerOptions::default()
        });
        let program = compiler.compile_expression(&expression("1 + 1")).unwrap();
        assert!(matches!(program.root, Ir::Arith { .. }));
    }

    #[test]
    fn test_syntax_error() {
        let err = Compiler::new().compile_expression(&expression("1 +")).unwrap_err();
        assert!(matches!(err, CompileError::Syntax(_)));
    }

    #[test]
    fn test_unresolved_symbol_with_typed_input() {
        let task = CompilerTask::builder()
            .source("b + 1")
            .input_type(FType::context([("a", FType::INTEGER)]))
            .build();
        let err = Compiler::new().compile_expression(&task).unwrap_err();
        match err {
            CompileError::UnresolvedSymbol { name, span } => {
                assert_eq!(name, "b");
                assert_eq!(span.start, 0);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unary_tests_default_to_any_input() {
        let task = CompilerTask::builder().source("> 1").build();
        let program = Compiler::new().compile_unary_tests(&task).unwrap();
        assert_eq!(program.result_type, FType::Boolean);
        assert_eq!(program.metadata.source_type, "unary test");
    }
}
