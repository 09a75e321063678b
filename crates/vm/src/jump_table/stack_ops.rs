//! Stack manipulation handlers.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::value::Value;

/// Registers the stack handlers.
pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::DUP, dup);
    table.register(OpCode::POP, pop);
    table.register(OpCode::ROLL, roll);
    table.register(OpCode::PUSHB, push_bool);
    table.register(OpCode::PUSHN, push_number);
    table.register(OpCode::PUSHS, push_string);
}

/// Implements the DUP operation.
fn dup(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    engine.stack.dup(instruction.count()?)
}

/// Implements the POP operation.
fn pop(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    engine.stack.pop_discard(instruction.count()?)
}

/// Implements the ROLL operation.
fn roll(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    engine.stack.roll(instruction.count()?)
}

/// Implements the PUSHB operation.
fn push_bool(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    match instruction.value()? {
        value @ Value::Bool(_) => engine.stack.arg_push(value),
        _ => Err(VmError::invalid_literal("PUSHB literal must be a Boolean")),
    }
}

/// Implements the PUSHN operation.
fn push_number(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    match instruction.value()? {
        value @ Value::Number(_) => engine.stack.arg_push(value),
        _ => Err(VmError::invalid_literal("PUSHN literal must be a Number")),
    }
}

/// Implements the PUSHS operation.
fn push_string(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    match instruction.value()? {
        value @ Value::StringRef(index) => {
            // Resolve now so a dangling reference faults at the push, not
            // at some later OUTPUT.
            engine.strings.get(index)?;
            engine.stack.arg_push(value)
        }
        _ => Err(VmError::invalid_literal(
            "PUSHS literal must be a StringRef",
        )),
    }
}
