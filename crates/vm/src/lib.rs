//! # tablevm
//!
//! A minimal, sub-Turing stack virtual machine for hosting configuration
//! table validators.
//!
//! The VM provides three guarantees for any hosted program, by
//! construction rather than by review:
//!
//! - **Control-flow safety**: CALL and JMPIF targets are literals inside
//!   the program; only the paths written in the source are reachable.
//! - **Memory safety**: every read and write lands in the declared input
//!   buffer, output queue, or stack region, or the run aborts.
//! - **Termination**: control only moves forward (RETURN excepted, and a
//!   return address is always the successor of an executed forward CALL),
//!   so every program halts in bounded steps regardless of its input.
//!
//! ## Architecture
//!
//! - **ExecutionEngine**: per-run state and the fetch/dispatch loop
//! - **DualStack**: argument and control stacks sharing one bounded region
//! - **InputQueue / OutputQueue**: the only windows onto host memory
//! - **JumpTable**: opcode dispatch and the per-category handlers
//! - **Program / StringTable**: the borrowed, read-only hosted program
//! - **ProgramBuilder**: label-resolving assembler for hosted programs
//! - **EventSink**: the capability through which FLUSH reaches the host
//!
//! ## Example
//!
//! ```
//! use tablevm::{run, OpCode, ProgramBuilder, RecordingSink, StringTable, Termination};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Read one input byte and halt with "was it 0x10?".
//! let mut builder = ProgramBuilder::new();
//! builder.emit_count(OpCode::INPUT, 1);
//! builder.emit_push_number(0x10);
//! builder.emit_count(OpCode::EQ, 2);
//! builder.emit(OpCode::HALT);
//! let program = builder.finalize()?;
//!
//! let strings = StringTable::empty();
//! let mut sink = RecordingSink::new();
//! assert_eq!(
//!     run(&program, &strings, &[0x10], &mut sink)?,
//!     Termination::HaltTrue
//! );
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// The argument and control stacks.
pub mod dual_stack;
/// VM error types and status words.
pub mod error;
/// Host event capability.
pub mod events;
/// Per-run state and the execution loop.
pub mod execution_engine;
/// Read-only cursor over the input bytes.
pub mod input_queue;
/// Instruction and immediate representation.
pub mod instruction;
/// Opcode dispatch and handlers.
pub mod jump_table;
/// Per-run resource limits.
pub mod limits;
/// Opcode definitions.
pub mod op_code;
/// Bounded event-message accumulator.
pub mod output_queue;
/// Hosted-program container.
pub mod program;
/// Label-resolving program assembler.
pub mod program_builder;
/// Constant string pool.
pub mod string_table;
/// Typed VM values.
pub mod value;

pub use dual_stack::DualStack;
pub use error::{VmError, VmResult, STATUS_HALT_FALSE, STATUS_HALT_TRUE};
pub use events::{
    EventRecord, EventSink, NullSink, RecordingSink, EVENT_TYPE_CRITICAL, EVENT_TYPE_DEBUG,
    EVENT_TYPE_ERROR, EVENT_TYPE_INFORMATION,
};
pub use execution_engine::{run, status_word, ExecutionEngine, RunStats, Termination};
pub use input_queue::InputQueue;
pub use instruction::{Immediate, Instruction};
pub use jump_table::{InstructionHandler, JumpTable};
pub use limits::{ExecutionLimits, DEFAULT_MAX_MESSAGE_LENGTH, DEFAULT_STACK_CAPACITY};
pub use op_code::{ImmediateKind, OpCode};
pub use output_queue::OutputQueue;
pub use program::Program;
pub use program_builder::{BuildError, Label, ProgramBuilder};
pub use string_table::StringTable;
pub use value::{Value, ValueKind};
