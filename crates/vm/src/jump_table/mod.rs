//! Opcode dispatch.
//!
//! A jump table maps each opcode byte to its handler. Targets of CALL and
//! JMPIF are immediates inside the program; nothing here lets a hosted
//! program reach a handler by value.

pub mod arithmetic;
pub mod control;
pub mod io;
pub mod logic;
pub mod stack_ops;

use once_cell::sync::Lazy;

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::op_code::OpCode;

/// A handler for one VM instruction.
pub type InstructionHandler = fn(&mut ExecutionEngine<'_>, &Instruction) -> VmResult<()>;

/// Dispatch table for the instruction set.
///
/// One slot per opcode byte; unassigned slots report `InvalidOpcode`.
#[derive(Clone, Copy)]
pub struct JumpTable {
    handlers: [Option<InstructionHandler>; 256],
}

impl JumpTable {
    /// Creates a table with every opcode's default handler registered.
    pub fn new() -> Self {
        let mut table = Self::empty();
        arithmetic::register_handlers(&mut table);
        control::register_handlers(&mut table);
        io::register_handlers(&mut table);
        logic::register_handlers(&mut table);
        stack_ops::register_handlers(&mut table);
        table
    }

    /// Creates a table with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: [None; 256],
        }
    }

    /// The process-wide default table.
    pub fn shared() -> &'static JumpTable {
        static DEFAULT: Lazy<JumpTable> = Lazy::new(JumpTable::new);
        &DEFAULT
    }

    /// Registers a handler for an opcode.
    pub fn register(&mut self, opcode: OpCode, handler: InstructionHandler) {
        self.handlers[opcode as usize] = Some(handler);
    }

    /// Returns the handler for an opcode, if any.
    pub fn get(&self, opcode: OpCode) -> Option<InstructionHandler> {
        self.handlers[opcode as usize]
    }

    /// Runs the handler for one instruction.
    pub fn dispatch(
        &self,
        engine: &mut ExecutionEngine<'_>,
        instruction: &Instruction,
    ) -> VmResult<()> {
        match self.handlers[instruction.opcode as usize] {
            Some(handler) => handler(engine, instruction),
            None => Err(VmError::invalid_opcode(instruction.opcode as u8)),
        }
    }
}

impl Default for JumpTable {
    fn default() -> Self {
        Self::new()
    }
}
