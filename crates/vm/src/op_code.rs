//! Opcode definitions.
//!
//! The instruction set is fixed at twenty-two opcodes; there is no
//! mechanism for a hosted program to extend it at runtime.

use crate::error::VmError;

/// The instructions supported by the VM.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Pops two numbers, pushes their sum.
    ADD = 0x01,
    /// Pops `n` booleans, pushes their conjunction.
    AND = 0x02,
    /// Pushes the return address and transfers to an absolute forward target.
    CALL = 0x03,
    /// Copies the top `n` arguments above themselves.
    DUP = 0x04,
    /// Pops `n` numbers, pushes whether all are equal.
    EQ = 0x05,
    /// Pops event id and type, emits the queued message as an event.
    FLUSH = 0x06,
    /// Pops two numbers, pushes whether the lower is greater.
    GT = 0x07,
    /// Pops a boolean and ends the run with it.
    HALT = 0x08,
    /// Pops a boolean; if true, advances by a forward offset.
    JMPIF = 0x09,
    /// Pops two numbers, pushes whether the lower is less.
    LT = 0x0A,
    /// Pops a boolean, pushes its negation.
    NOT = 0x0B,
    /// Pops `n` booleans, pushes their disjunction.
    OR = 0x0C,
    /// Pops a value and appends its text to the output queue.
    OUTPUT = 0x0D,
    /// Discards the top `n` arguments.
    POP = 0x0E,
    /// Pushes a boolean literal.
    PUSHB = 0x0F,
    /// Pushes a number literal.
    PUSHN = 0x10,
    /// Pushes a string-table reference literal.
    PUSHS = 0x11,
    /// Dequeues 1, 2, or 4 input bytes as a number.
    INPUT = 0x12,
    /// Pops a return address and transfers back to it.
    RETURN = 0x13,
    /// Moves the input head backward; 0 seeks to the start.
    REWIND = 0x14,
    /// Rotates the top `n` arguments, topmost to the bottom of the window.
    ROLL = 0x15,
    /// Pops two numbers, pushes their difference.
    SUB = 0x16,
}

/// What kind of immediate an opcode carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmediateKind {
    /// No immediate.
    None,
    /// A small repetition count.
    Count,
    /// A literal value.
    Value,
    /// A jump or call target.
    Target,
}

const ALL_OPCODES: [OpCode; 22] = [
    OpCode::ADD,
    OpCode::AND,
    OpCode::CALL,
    OpCode::DUP,
    OpCode::EQ,
    OpCode::FLUSH,
    OpCode::GT,
    OpCode::HALT,
    OpCode::JMPIF,
    OpCode::LT,
    OpCode::NOT,
    OpCode::OR,
    OpCode::OUTPUT,
    OpCode::POP,
    OpCode::PUSHB,
    OpCode::PUSHN,
    OpCode::PUSHS,
    OpCode::INPUT,
    OpCode::RETURN,
    OpCode::REWIND,
    OpCode::ROLL,
    OpCode::SUB,
];

impl OpCode {
    /// The immediate kind this opcode expects.
    pub const fn immediate_kind(self) -> ImmediateKind {
        match self {
            OpCode::ADD
            | OpCode::FLUSH
            | OpCode::GT
            | OpCode::HALT
            | OpCode::LT
            | OpCode::NOT
            | OpCode::OUTPUT
            | OpCode::RETURN
            | OpCode::SUB => ImmediateKind::None,
            OpCode::AND
            | OpCode::DUP
            | OpCode::EQ
            | OpCode::OR
            | OpCode::POP
            | OpCode::INPUT
            | OpCode::REWIND
            | OpCode::ROLL => ImmediateKind::Count,
            OpCode::PUSHB | OpCode::PUSHN | OpCode::PUSHS => ImmediateKind::Value,
            OpCode::CALL | OpCode::JMPIF => ImmediateKind::Target,
        }
    }

    /// Iterates over every opcode in numeric order.
    pub fn iter() -> impl Iterator<Item = OpCode> {
        ALL_OPCODES.iter().copied()
    }
}

impl TryFrom<u8> for OpCode {
    type Error = VmError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(OpCode::ADD),
            0x02 => Ok(OpCode::AND),
            0x03 => Ok(OpCode::CALL),
            0x04 => Ok(OpCode::DUP),
            0x05 => Ok(OpCode::EQ),
            0x06 => Ok(OpCode::FLUSH),
            0x07 => Ok(OpCode::GT),
            0x08 => Ok(OpCode::HALT),
            0x09 => Ok(OpCode::JMPIF),
            0x0A => Ok(OpCode::LT),
            0x0B => Ok(OpCode::NOT),
            0x0C => Ok(OpCode::OR),
            0x0D => Ok(OpCode::OUTPUT),
            0x0E => Ok(OpCode::POP),
            0x0F => Ok(OpCode::PUSHB),
            0x10 => Ok(OpCode::PUSHN),
            0x11 => Ok(OpCode::PUSHS),
            0x12 => Ok(OpCode::INPUT),
            0x13 => Ok(OpCode::RETURN),
            0x14 => Ok(OpCode::REWIND),
            0x15 => Ok(OpCode::ROLL),
            0x16 => Ok(OpCode::SUB),
            other => Err(VmError::invalid_opcode(other)),
        }
    }
}
