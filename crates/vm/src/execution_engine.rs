//! The execution engine.
//!
//! A run owns its stacks, queues, and program counter exclusively and
//! borrows the program and string table from the caller. The loop fetches
//! one instruction, pre-increments the program counter, and dispatches to
//! the opcode handler; the pre-increment is what makes CALL's captured
//! return address "the instruction after the CALL" and JMPIF's offset
//! relative to the instruction after the jump.

use crate::dual_stack::DualStack;
use crate::error::{VmError, VmResult, STATUS_HALT_FALSE, STATUS_HALT_TRUE};
use crate::events::EventSink;
use crate::input_queue::InputQueue;
use crate::jump_table::JumpTable;
use crate::limits::ExecutionLimits;
use crate::output_queue::OutputQueue;
use crate::program::Program;
use crate::string_table::StringTable;

/// How a program ended on its own terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// HALT consumed `true`.
    HaltTrue,

    /// HALT consumed `false`.
    HaltFalse,
}

impl Termination {
    /// The status word reported to the host.
    pub const fn code(self) -> u8 {
        match self {
            Termination::HaltTrue => STATUS_HALT_TRUE,
            Termination::HaltFalse => STATUS_HALT_FALSE,
        }
    }
}

/// Collapses a run outcome into the single status word the host sees.
pub fn status_word(outcome: &VmResult<Termination>) -> u8 {
    match outcome {
        Ok(termination) => termination.code(),
        Err(error) => error.code(),
    }
}

/// Counters observed over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Instructions executed.
    pub steps: u64,

    /// High-water mark of the combined stack depth.
    pub max_stack_depth: usize,
}

/// One run of a hosted program.
pub struct ExecutionEngine<'a> {
    program: &'a Program,
    pub(crate) strings: &'a StringTable,
    pub(crate) stack: DualStack,
    pub(crate) input: InputQueue<'a>,
    pub(crate) output: OutputQueue,
    pub(crate) sink: &'a mut dyn EventSink,
    jump_table: &'a JumpTable,
    pc: u16,
    halted: Option<Termination>,
    stats: RunStats,
}

impl<'a> ExecutionEngine<'a> {
    /// Creates an engine with the default limits and jump table.
    pub fn new(
        program: &'a Program,
        strings: &'a StringTable,
        input: &'a [u8],
        sink: &'a mut dyn EventSink,
    ) -> Self {
        Self::with_limits(program, strings, input, sink, ExecutionLimits::default())
    }

    /// Creates an engine with explicit limits.
    pub fn with_limits(
        program: &'a Program,
        strings: &'a StringTable,
        input: &'a [u8],
        sink: &'a mut dyn EventSink,
        limits: ExecutionLimits,
    ) -> Self {
        Self::with_jump_table(program, strings, input, sink, limits, JumpTable::shared())
    }

    /// Creates an engine dispatching through a caller-supplied jump table.
    pub fn with_jump_table(
        program: &'a Program,
        strings: &'a StringTable,
        input: &'a [u8],
        sink: &'a mut dyn EventSink,
        limits: ExecutionLimits,
        jump_table: &'a JumpTable,
    ) -> Self {
        Self {
            program,
            strings,
            stack: DualStack::new(limits.stack_capacity),
            input: InputQueue::new(input),
            output: OutputQueue::new(limits.max_message_length),
            sink,
            jump_table,
            pc: 0,
            halted: None,
            stats: RunStats::default(),
        }
    }

    /// Current program counter.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub(crate) fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Length of the borrowed program.
    pub fn program_len(&self) -> u16 {
        self.program.len()
    }

    /// The stacks, for inspection after a run.
    pub fn stack(&self) -> &DualStack {
        &self.stack
    }

    /// Counters observed so far.
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub(crate) fn halt(&mut self, termination: Termination) {
        self.halted = Some(termination);
    }

    /// Executes one instruction. Returns the termination once HALT ran.
    fn step(&mut self) -> VmResult<Option<Termination>> {
        let at = self.pc;
        let program = self.program;
        let instruction = program
            .fetch(at)
            .ok_or_else(|| VmError::no_program(u32::from(at), u32::from(program.len())))?;

        // Pre-increment: handlers observe the address of the next instruction.
        self.pc = at + 1;

        let jump_table = self.jump_table;
        jump_table.dispatch(self, instruction)?;

        self.stats.steps += 1;
        let depth = self.stack.combined_depth();
        if depth > self.stats.max_stack_depth {
            self.stats.max_stack_depth = depth;
        }
        Ok(self.halted)
    }

    /// Runs to HALT or to the first fault.
    ///
    /// A faulting run leaves one diagnostic line on the debug log stream;
    /// the host sees only the returned status.
    pub fn run(&mut self) -> VmResult<Termination> {
        loop {
            let at = self.pc;
            match self.step() {
                Ok(Some(termination)) => return Ok(termination),
                Ok(None) => {}
                Err(error) => {
                    log::debug!("program counter {at}: {}", error.kind());
                    return Err(error);
                }
            }
        }
    }
}

/// Runs `program` over `input` with the default limits.
///
/// This is the whole entry point the surrounding framework uses: bytes in,
/// events out through `sink`, one status back.
pub fn run(
    program: &Program,
    strings: &StringTable,
    input: &[u8],
    sink: &mut dyn EventSink,
) -> VmResult<Termination> {
    ExecutionEngine::new(program, strings, input, sink).run()
}
