//! Instruction representation.
//!
//! An instruction is an opcode plus one optional immediate. The typed
//! accessors fail with `InvalidLiteral` when a handler asks for an
//! immediate the instruction does not carry.

use std::fmt;

use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use crate::value::Value;

/// The optional immediate of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immediate {
    /// No immediate.
    None,
    /// A repetition count (DUP, POP, ROLL, AND, OR, EQ, INPUT, REWIND).
    Count(u16),
    /// A literal value (PUSHB, PUSHN, PUSHS).
    Value(Value),
    /// A call target or jump offset (CALL, JMPIF).
    Target(u16),
}

/// A decoded instruction in a hosted program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The opcode.
    pub opcode: OpCode,

    /// The immediate, if any.
    pub immediate: Immediate,
}

impl Instruction {
    /// Creates an instruction with the given immediate.
    pub const fn new(opcode: OpCode, immediate: Immediate) -> Self {
        Self { opcode, immediate }
    }

    /// Creates an instruction with no immediate.
    pub const fn plain(opcode: OpCode) -> Self {
        Self::new(opcode, Immediate::None)
    }

    /// Creates an instruction with a repetition count.
    pub const fn with_count(opcode: OpCode, count: u16) -> Self {
        Self::new(opcode, Immediate::Count(count))
    }

    /// Creates an instruction with a literal value.
    pub const fn with_value(opcode: OpCode, value: Value) -> Self {
        Self::new(opcode, Immediate::Value(value))
    }

    /// Creates an instruction with a control-transfer target.
    pub const fn with_target(opcode: OpCode, target: u16) -> Self {
        Self::new(opcode, Immediate::Target(target))
    }

    /// The repetition count, or `InvalidLiteral` for any other immediate.
    pub fn count(&self) -> VmResult<u16> {
        match self.immediate {
            Immediate::Count(count) => Ok(count),
            _ => Err(VmError::invalid_literal(
                "instruction requires a repetition count",
            )),
        }
    }

    /// The literal value, or `InvalidLiteral` for any other immediate.
    pub fn value(&self) -> VmResult<Value> {
        match self.immediate {
            Immediate::Value(value) => Ok(value),
            _ => Err(VmError::invalid_literal(
                "instruction requires a literal value",
            )),
        }
    }

    /// The transfer target, or `InvalidLiteral` for any other immediate.
    ///
    /// For CALL this is an absolute instruction index; for JMPIF it is a
    /// forward offset. The asymmetry is deliberate and preserved.
    pub fn target(&self) -> VmResult<u16> {
        match self.immediate {
            Immediate::Target(target) => Ok(target),
            _ => Err(VmError::invalid_literal(
                "instruction requires a transfer target",
            )),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.immediate {
            Immediate::None => write!(f, "{:?}", self.opcode),
            Immediate::Count(count) => write!(f, "{:?} {count}", self.opcode),
            Immediate::Value(Value::Bool(b)) => write!(f, "{:?} {b}", self.opcode),
            Immediate::Value(Value::Number(n)) => write!(f, "{:?} {n}", self.opcode),
            Immediate::Value(Value::StringRef(i)) => write!(f, "{:?} s{i}", self.opcode),
            Immediate::Value(Value::ReturnAddress(pc)) => write!(f, "{:?} @{pc}", self.opcode),
            Immediate::Target(target) => write!(f, "{:?} {target}", self.opcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let dup = Instruction::with_count(OpCode::DUP, 3);
        assert_eq!(dup.count().unwrap(), 3);
        assert!(matches!(
            dup.value(),
            Err(VmError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            dup.target(),
            Err(VmError::InvalidLiteral { .. })
        ));

        let push = Instruction::with_value(OpCode::PUSHN, Value::Number(42));
        assert_eq!(push.value().unwrap(), Value::Number(42));

        let call = Instruction::with_target(OpCode::CALL, 17);
        assert_eq!(call.target().unwrap(), 17);

        let add = Instruction::plain(OpCode::ADD);
        assert!(matches!(
            add.count(),
            Err(VmError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::plain(OpCode::ADD).to_string(), "ADD");
        assert_eq!(
            Instruction::with_count(OpCode::DUP, 2).to_string(),
            "DUP 2"
        );
        assert_eq!(
            Instruction::with_value(OpCode::PUSHS, Value::StringRef(4)).to_string(),
            "PUSHS s4"
        );
        assert_eq!(
            Instruction::with_target(OpCode::CALL, 9).to_string(),
            "CALL 9"
        );
    }
}
