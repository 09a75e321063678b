//! Logic and comparison handlers.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::value::Value;

/// Registers the logic handlers.
pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::AND, and);
    table.register(OpCode::OR, or);
    table.register(OpCode::EQ, eq);
    table.register(OpCode::LT, lt);
    table.register(OpCode::GT, gt);
    table.register(OpCode::NOT, not);
}

/// Implements the AND operation.
fn and(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    let count = instruction.count()?;
    if count < 2 {
        return Err(VmError::invalid_literal("AND repetition below 2"));
    }
    // All operands are popped even once the result is known.
    let mut conjunction = true;
    for _ in 0..count {
        conjunction &= engine.stack.pop_bool()?;
    }
    engine.stack.arg_push(Value::Bool(conjunction))
}

/// Implements the OR operation.
fn or(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    let count = instruction.count()?;
    if count < 2 {
        return Err(VmError::invalid_literal("OR repetition below 2"));
    }
    let mut disjunction = false;
    for _ in 0..count {
        disjunction |= engine.stack.pop_bool()?;
    }
    engine.stack.arg_push(Value::Bool(disjunction))
}

/// Implements the EQ operation.
fn eq(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    let count = instruction.count()?;
    if count < 2 {
        return Err(VmError::invalid_literal("EQ repetition below 2"));
    }
    let first = engine.stack.pop_number()?;
    let mut all_equal = true;
    for _ in 1..count {
        all_equal &= engine.stack.pop_number()? == first;
    }
    engine.stack.arg_push(Value::Bool(all_equal))
}

/// Implements the LT operation.
fn lt(engine: &mut ExecutionEngine<'_>, _instruction: &Instruction) -> VmResult<()> {
    let y = engine.stack.pop_number()?;
    let x = engine.stack.pop_number()?;
    engine.stack.arg_push(Value::Bool(x < y))
}

/// Implements the GT operation.
fn gt(engine: &mut ExecutionEngine<'_>, _instruction: &Instruction) -> VmResult<()> {
    let y = engine.stack.pop_number()?;
    let x = engine.stack.pop_number()?;
    engine.stack.arg_push(Value::Bool(x > y))
}

/// Implements the NOT operation.
fn not(engine: &mut ExecutionEngine<'_>, _instruction: &Instruction) -> VmResult<()> {
    let value = engine.stack.pop_bool()?;
    engine.stack.arg_push(Value::Bool(!value))
}
