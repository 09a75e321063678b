//! Input and output queue handlers.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::value::Value;

/// Registers the I/O handlers.
pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::INPUT, input);
    table.register(OpCode::REWIND, rewind);
    table.register(OpCode::OUTPUT, output);
    table.register(OpCode::FLUSH, flush);
}

/// Implements the INPUT operation.
fn input(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    let value = engine.input.read(instruction.count()?)?;
    engine.stack.arg_push(Value::Number(value))
}

/// Implements the REWIND operation.
fn rewind(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    engine.input.rewind(instruction.count()?)
}

/// Implements the OUTPUT operation.
fn output(engine: &mut ExecutionEngine<'_>, _instruction: &Instruction) -> VmResult<()> {
    match engine.stack.arg_pop()? {
        Value::Bool(value) => engine.output.append_bool(value),
        Value::Number(value) => engine.output.append_number(value),
        Value::StringRef(index) => {
            let strings = engine.strings;
            let text = strings.get(index)?;
            engine.output.append_text(text.as_bytes())
        }
        value @ Value::ReturnAddress(_) => Err(VmError::invalid_argument(
            "Bool, Number, or StringRef",
            value.kind(),
        )),
    }
}

/// Implements the FLUSH operation.
fn flush(engine: &mut ExecutionEngine<'_>, _instruction: &Instruction) -> VmResult<()> {
    let event_id = engine.stack.pop_number()?;
    let event_type = engine.stack.pop_number()?;
    let message = engine.output.take();
    log::trace!(
        "flush: type {event_type} id {event_id:#06x} ({} bytes)",
        message.len()
    );
    engine.sink.emit(event_type, event_id, &message);
    Ok(())
}
