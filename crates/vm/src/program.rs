//! Hosted-program container.
//!
//! A program is a finite, read-only sequence of instructions whose length
//! fits the u16 program counter. Execution always begins at index 0.

use crate::error::{VmError, VmResult};
use crate::instruction::Instruction;

/// A read-only instruction sequence.
#[derive(Debug, Clone)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Wraps an instruction sequence, rejecting programs too long for the
    /// u16 program counter.
    pub fn new(instructions: Vec<Instruction>) -> VmResult<Self> {
        if instructions.len() > usize::from(u16::MAX) {
            return Err(VmError::invalid_literal(
                "program longer than the u16 program counter",
            ));
        }
        Ok(Self { instructions })
    }

    /// Number of instructions.
    pub fn len(&self) -> u16 {
        self.instructions.len() as u16
    }

    /// Returns `true` for a program with no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Fetches the instruction at `pc`, if any.
    pub fn fetch(&self, pc: u16) -> Option<&Instruction> {
        self.instructions.get(usize::from(pc))
    }

    /// The full instruction sequence.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}
