//! Control-flow handlers.
//!
//! Termination is guaranteed by construction: CALL must transfer strictly
//! forward of its own address and a taken JMPIF must advance by at least
//! 2, so the program counter never revisits an instruction except through
//! RETURN, and every return address is the successor of a CALL whose own
//! target was strictly forward.

use crate::error::{VmError, VmResult};
use crate::execution_engine::{ExecutionEngine, Termination};
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::value::Value;

/// Registers the control handlers.
pub fn register_handlers(table: &mut JumpTable) {
    table.register(OpCode::CALL, call);
    table.register(OpCode::JMPIF, jmp_if);
    table.register(OpCode::RETURN, ret);
    table.register(OpCode::HALT, halt);
}

/// Implements the CALL operation. The immediate is an absolute
/// instruction index.
fn call(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    let target = instruction.target()?;
    // The dispatcher pre-incremented; the CALL itself sits one behind.
    let at = engine.pc() - 1;
    if target <= at {
        return Err(VmError::no_loops(u32::from(at), u32::from(target)));
    }
    engine.stack.ctl_push(Value::ReturnAddress(engine.pc()))?;
    engine.set_pc(target);
    Ok(())
}

/// Implements the JMPIF operation. The immediate is a forward offset
/// relative to the jump's own address, and an offset of 2 advances
/// execution by exactly one instruction beyond the jump.
fn jmp_if(engine: &mut ExecutionEngine<'_>, instruction: &Instruction) -> VmResult<()> {
    let taken = engine.stack.pop_bool()?;
    if !taken {
        return Ok(());
    }
    let offset = instruction.target()?;
    let at = engine.pc() - 1;
    if offset < 2 {
        return Err(VmError::no_loops(
            u32::from(at),
            u32::from(at) + u32::from(offset),
        ));
    }
    let destination = u32::from(at) + u32::from(offset);
    if destination > u32::from(engine.program_len()) {
        return Err(VmError::no_program(
            destination,
            u32::from(engine.program_len()),
        ));
    }
    engine.set_pc(destination as u16);
    Ok(())
}

/// Implements the RETURN operation.
fn ret(engine: &mut ExecutionEngine<'_>, _instruction: &Instruction) -> VmResult<()> {
    let return_address = engine.stack.ctl_pop()?;
    engine.set_pc(return_address);
    Ok(())
}

/// Implements the HALT operation.
fn halt(engine: &mut ExecutionEngine<'_>, _instruction: &Instruction) -> VmResult<()> {
    let result = engine.stack.pop_bool()?;
    engine.halt(if result {
        Termination::HaltTrue
    } else {
        Termination::HaltFalse
    });
    Ok(())
}
