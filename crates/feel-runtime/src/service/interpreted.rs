//! Interpreter-backed compilation service

use super::{CompilationService, Executable, ExecutableUnit};
use crate::builtins;
use crate::engine::{Frame, Interpreter};
use crate::error::{CompilationError, Result};
use feel_core::ir::{CallTarget, Ir, Program};
use feel_core::Value;
use std::sync::Arc;
use tracing::debug;

/// Loads programs for direct interpretation
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpreterService;

impl InterpreterService {
    pub fn new() -> Self {
        Self
    }
}

impl CompilationService for InterpreterService {
    fn compile(
        &self,
        unit_name: &str,
        program: Program,
    ) -> std::result::Result<ExecutableUnit, CompilationError> {
        if let Err(message) = validate(&program.root, program.constants.len()) {
            return Err(CompilationError {
                unit: unit_name.to_string(),
                message,
                program: program.render(),
            });
        }

        let qualified_name = format!("{}.{}", unit_name, program.method_name);
        debug!(unit = unit_name, entry = %qualified_name, "Loaded interpreted program");
        let executable = InterpretedProgram::new(program);
        Ok(ExecutableUnit::new(unit_name).with(qualified_name, Arc::new(executable)))
    }
}

/// Checks what the interpreter would otherwise only find at evaluation time
fn validate(ir: &Ir, constants: usize) -> std::result::Result<(), String> {
    match ir {
        Ir::ConstRef(index) if *index >= constants => {
            return Err(format!(
                "constant #{} is outside a pool of {}",
                index, constants
            ));
        }
        Ir::Call {
            target: CallTarget::Builtin(name),
            ..
        } if !builtins::is_builtin(name) => {
            return Err(format!("no built-in function named '{}'", name));
        }
        _ => {}
    }
    ir.children()
        .into_iter()
        .try_for_each(|child| validate(child, constants))
}

/// A program bound to an interpreter
#[derive(Debug)]
pub struct InterpretedProgram {
    program: Program,
    interpreter: Interpreter,
}

impl InterpretedProgram {
    pub fn new(program: Program) -> Self {
        let constants: Arc<[Value]> = program.constants.clone().into();
        let interpreter =
            Interpreter::new(constants).with_precision(program.metadata.decimal_precision());
        Self {
            program,
            interpreter,
        }
    }
}

impl Executable for InterpretedProgram {
    fn execute(&self, input: &Value, test_input: Option<&Value>) -> Result<Value> {
        let mut frame = Frame::new(input);
        if let Some(test_input) = test_input {
            frame = frame.with_test_input(test_input.clone());
        }
        self.interpreter.eval(&self.program.root, &mut frame)
    }

    fn program(&self) -> &Program {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feel_core::ast::InfixOp;
    use feel_core::ir::{NumericMode, ProgramMetadata};

    fn program(root: Ir, constants: Vec<Value>) -> Program {
        Program::new("eval", root, ProgramMetadata::for_expression("Unit")).with_constants(constants)
    }

    #[test]
    fn test_compile_and_load() {
        let root = Ir::Arith {
            op: InfixOp::Add,
            mode: NumericMode::Decimal,
            left: Ir::ConstRef(0).boxed(),
            right: Ir::InputField("a".to_string()).boxed(),
            null_check: false,
        };
        let unit = InterpreterService::new()
            .compile("Unit", program(root, vec![Value::from(1)]))
            .unwrap();

        assert_eq!(unit.len(), 1);
        assert!(unit.load("Unit.eval").is_some());
        assert!(unit.load("Unit.other").is_none());

        let executable = unit.load_single().unwrap();
        let input = Value::context([("a", Value::from(41))]);
        assert_eq!(executable.execute(&input, None).unwrap(), Value::from(42));
        assert_eq!(executable.program().qualified_name(), "Unit.eval");
    }

    #[test]
    fn test_test_input() {
        let unit = InterpreterService::new()
            .compile("Unit", program(Ir::TestInput, Vec::new()))
            .unwrap();
        let executable = unit.load_single().unwrap();
        assert_eq!(
            executable.execute(&Value::Null, Some(&Value::from("x"))).unwrap(),
            Value::from("x")
        );
        assert_eq!(executable.execute(&Value::Null, None).unwrap(), Value::Null);
    }

    #[test]
    fn test_rejects_bad_constant() {
        let err = InterpreterService::new()
            .compile("Broken", program(Ir::List(vec![Ir::ConstRef(3)]), vec![Value::Null]))
            .unwrap_err();
        assert_eq!(err.unit, "Broken");
        assert!(err.message.contains("constant #3"));
        assert!(err.program.contains("ConstRef"));
        assert!(err.to_string().starts_with("Failed to compile unit 'Broken'"));
    }

    #[test]
    fn test_rejects_unknown_builtin() {
        let call = Ir::Call {
            target: CallTarget::Builtin("frobnicate".to_string()),
            args: Vec::new(),
            names: None,
        };
        let err = InterpreterService::new()
            .compile("Unit", program(call, Vec::new()))
            .unwrap_err();
        assert!(err.message.contains("frobnicate"));
    }
}
