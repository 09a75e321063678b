//! Arithmetic operation handlers.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::value::Value;

/// Registers the arithmetic handlers.
pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::ADD, add);
    table.register(OpCode::SUB, sub);
}

/// Implements the ADD operation.
fn add(engine: &mut ExecutionEngine<'_>, _instruction: &Instruction) -> VmResult<()> {
    let y = engine.stack.pop_number()?;
    let x = engine.stack.pop_number()?;
    let sum = x
        .checked_add(y)
        .ok_or(VmError::out_of_bounds("ADD overflows a 32-bit number"))?;
    engine.stack.arg_push(Value::Number(sum))
}

/// Implements the SUB operation.
fn sub(engine: &mut ExecutionEngine<'_>, _instruction: &Instruction) -> VmResult<()> {
    let y = engine.stack.pop_number()?;
    let x = engine.stack.pop_number()?;
    let difference = x
        .checked_sub(y)
        .ok_or(VmError::out_of_bounds("SUB underflows below zero"))?;
    engine.stack.arg_push(Value::Number(difference))
}
