//! Programmatic construction of hosted programs.
//!
//! The builder emits instructions forward and resolves labels in a final
//! pass: CALL sites receive the absolute target index, JMPIF sites the
//! forward offset relative to their own address. Finalization rejects
//! anything the VM would refuse at runtime (backward calls, jumps of
//! offset below 2, unplaced labels), so a program that builds cleanly
//! cannot fault on its control-flow literals.

use thiserror::Error;

use crate::instruction::{Immediate, Instruction};
use crate::op_code::OpCode;
use crate::program::Program;
use crate::value::Value;

/// Faults detected while assembling a program.
///
/// These are authoring errors, distinct from the run-status taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A label was referenced but never placed.
    #[error("label {0} was never placed")]
    UnplacedLabel(usize),

    /// A label was placed more than once.
    #[error("label {0} placed twice")]
    ReplacedLabel(usize),

    /// A CALL resolved to a target at or before its own address.
    #[error("CALL at {site} resolves to {target}, which is not strictly forward")]
    BackwardCall {
        /// Address of the CALL instruction.
        site: u16,
        /// The resolved absolute target.
        target: u16,
    },

    /// A JMPIF resolved to an offset below the minimum of 2.
    #[error("JMPIF at {site} resolves to {target}; the forward offset must be at least 2")]
    ShortJump {
        /// Address of the JMPIF instruction.
        site: u16,
        /// The resolved absolute target.
        target: u16,
    },

    /// The program outgrew the u16 program counter.
    #[error("program exceeds the u16 program counter")]
    TooLong,
}

#[derive(Debug, Clone, Copy)]
enum PatchKind {
    Call,
    Jump,
}

#[derive(Debug, Clone, Copy)]
struct Patch {
    site: usize,
    label: usize,
    kind: PatchKind,
}

/// A forward-reference label handed out by [`ProgramBuilder::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

/// Assembles a [`Program`] instruction by instruction.
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    labels: Vec<Option<u16>>,
    patches: Vec<Patch>,
    deferred: Option<BuildError>,
}

impl ProgramBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            labels: Vec::new(),
            patches: Vec::new(),
            deferred: None,
        }
    }

    /// Address the next emitted instruction will occupy.
    pub fn here(&self) -> u16 {
        self.instructions.len() as u16
    }

    /// Allocates a label to be placed later.
    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Places a label at the current address.
    pub fn place(&mut self, label: Label) -> &mut Self {
        if self.labels[label.0].is_some() {
            self.defer(BuildError::ReplacedLabel(label.0));
        } else {
            self.labels[label.0] = Some(self.here());
        }
        self
    }

    fn defer(&mut self, error: BuildError) {
        if self.deferred.is_none() {
            self.deferred = Some(error);
        }
    }

    fn push_instruction(&mut self, instruction: Instruction) -> &mut Self {
        if self.instructions.len() >= usize::from(u16::MAX) {
            self.defer(BuildError::TooLong);
            return self;
        }
        self.instructions.push(instruction);
        self
    }

    /// Emits an instruction with no immediate.
    pub fn emit(&mut self, opcode: OpCode) -> &mut Self {
        self.push_instruction(Instruction::plain(opcode))
    }

    /// Emits an instruction with a repetition count.
    pub fn emit_count(&mut self, opcode: OpCode, count: u16) -> &mut Self {
        self.push_instruction(Instruction::with_count(opcode, count))
    }

    /// Emits `PUSHB` with a boolean literal.
    pub fn emit_push_bool(&mut self, value: bool) -> &mut Self {
        self.push_instruction(Instruction::with_value(OpCode::PUSHB, Value::Bool(value)))
    }

    /// Emits `PUSHN` with a number literal.
    pub fn emit_push_number(&mut self, value: u32) -> &mut Self {
        self.push_instruction(Instruction::with_value(OpCode::PUSHN, Value::Number(value)))
    }

    /// Emits `PUSHS` with a string-table reference.
    pub fn emit_push_string(&mut self, index: u16) -> &mut Self {
        self.push_instruction(Instruction::with_value(
            OpCode::PUSHS,
            Value::StringRef(index),
        ))
    }

    /// Emits `CALL` to a label resolved at finalization.
    pub fn emit_call(&mut self, label: Label) -> &mut Self {
        let site = self.instructions.len();
        self.push_instruction(Instruction::with_target(OpCode::CALL, 0));
        if self.instructions.len() > site {
            self.patches.push(Patch {
                site,
                label: label.0,
                kind: PatchKind::Call,
            });
        }
        self
    }

    /// Emits `JMPIF` to a label resolved at finalization.
    pub fn emit_jump_if(&mut self, label: Label) -> &mut Self {
        let site = self.instructions.len();
        self.push_instruction(Instruction::with_target(OpCode::JMPIF, 0));
        if self.instructions.len() > site {
            self.patches.push(Patch {
                site,
                label: label.0,
                kind: PatchKind::Jump,
            });
        }
        self
    }

    /// Emits an unconditional forward jump. The VM has no plain JMP; the
    /// idiom is a pushed `true` consumed by JMPIF.
    pub fn emit_jump(&mut self, label: Label) -> &mut Self {
        self.emit_push_bool(true).emit_jump_if(label)
    }

    /// Resolves every label and returns the finished program.
    pub fn finalize(self) -> Result<Program, BuildError> {
        if let Some(error) = self.deferred {
            return Err(error);
        }

        let mut instructions = self.instructions;
        for patch in &self.patches {
            let target = self.labels[patch.label].ok_or(BuildError::UnplacedLabel(patch.label))?;
            let site = patch.site as u16;
            let immediate = match patch.kind {
                PatchKind::Call => {
                    if target <= site {
                        return Err(BuildError::BackwardCall { site, target });
                    }
                    // Absolute instruction index.
                    target
                }
                PatchKind::Jump => {
                    if target < site + 2 {
                        return Err(BuildError::ShortJump { site, target });
                    }
                    // Forward offset relative to the jump's own address.
                    target - site
                }
            };
            instructions[patch.site].immediate = Immediate::Target(immediate);
        }

        Program::new(instructions).map_err(|_| BuildError::TooLong)
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_resolves_to_absolute_target() {
        let mut builder = ProgramBuilder::new();
        let sub = builder.label();
        builder.emit_call(sub);
        builder.emit_push_bool(true);
        builder.emit(OpCode::HALT);
        builder.place(sub);
        builder.emit(OpCode::RETURN);

        let program = builder.finalize().unwrap();
        assert_eq!(
            program.fetch(0).unwrap().immediate,
            Immediate::Target(3)
        );
    }

    #[test]
    fn test_jump_resolves_to_forward_offset() {
        let mut builder = ProgramBuilder::new();
        let skip = builder.label();
        builder.emit_push_bool(true);
        builder.emit_jump_if(skip); // site 1
        builder.emit_push_bool(false); // skipped
        builder.place(skip); // target 3
        builder.emit_push_bool(true);
        builder.emit(OpCode::HALT);

        let program = builder.finalize().unwrap();
        // Offset, not absolute index: 3 - 1 = 2.
        assert_eq!(
            program.fetch(1).unwrap().immediate,
            Immediate::Target(2)
        );
    }

    #[test]
    fn test_backward_call_rejected() {
        let mut builder = ProgramBuilder::new();
        let back = builder.label();
        builder.place(back);
        builder.emit_push_bool(true);
        builder.emit_call(back);

        assert!(matches!(
            builder.finalize(),
            Err(BuildError::BackwardCall { site: 1, target: 0 })
        ));
    }

    #[test]
    fn test_short_jump_rejected() {
        let mut builder = ProgramBuilder::new();
        let next = builder.label();
        builder.emit_push_bool(true);
        builder.emit_jump_if(next);
        // Placing the label immediately after the jump is an offset of 1.
        builder.place(next);
        builder.emit(OpCode::HALT);

        assert!(matches!(
            builder.finalize(),
            Err(BuildError::ShortJump { site: 1, target: 2 })
        ));
    }

    #[test]
    fn test_unplaced_label_rejected() {
        let mut builder = ProgramBuilder::new();
        let nowhere = builder.label();
        builder.emit_call(nowhere);
        assert!(matches!(
            builder.finalize(),
            Err(BuildError::UnplacedLabel(0))
        ));
    }

    #[test]
    fn test_replaced_label_rejected() {
        let mut builder = ProgramBuilder::new();
        let label = builder.label();
        builder.place(label);
        builder.emit(OpCode::RETURN);
        builder.place(label);
        assert!(matches!(
            builder.finalize(),
            Err(BuildError::ReplacedLabel(0))
        ));
    }
}
