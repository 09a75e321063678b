//! End-to-end execution tests.
//!
//! The control-flow cases pin the CALL/JMPIF asymmetry with literal
//! target values: CALL's immediate is an absolute instruction index,
//! JMPIF's a forward offset applied to the pre-incremented counter.

use tablevm::{
    run, status_word, EventRecord, ExecutionEngine, ExecutionLimits, Instruction, NullSink,
    OpCode, Program, ProgramBuilder, RecordingSink, StringTable, Termination, Value, VmError,
    VmResult, EVENT_TYPE_ERROR,
};

fn plain(opcode: OpCode) -> Instruction {
    Instruction::plain(opcode)
}

fn cnt(opcode: OpCode, count: u16) -> Instruction {
    Instruction::with_count(opcode, count)
}

fn pushb(value: bool) -> Instruction {
    Instruction::with_value(OpCode::PUSHB, Value::Bool(value))
}

fn pushn(value: u32) -> Instruction {
    Instruction::with_value(OpCode::PUSHN, Value::Number(value))
}

fn pushs(index: u16) -> Instruction {
    Instruction::with_value(OpCode::PUSHS, Value::StringRef(index))
}

fn call(target: u16) -> Instruction {
    Instruction::with_target(OpCode::CALL, target)
}

fn jmpif(offset: u16) -> Instruction {
    Instruction::with_target(OpCode::JMPIF, offset)
}

fn exec(instructions: Vec<Instruction>) -> VmResult<Termination> {
    exec_input(instructions, &[])
}

fn exec_input(instructions: Vec<Instruction>, input: &[u8]) -> VmResult<Termination> {
    let program = Program::new(instructions).expect("test program fits the counter");
    let strings = StringTable::empty();
    let mut sink = NullSink;
    run(&program, &strings, input, &mut sink)
}

fn exec_events(
    instructions: Vec<Instruction>,
    strings: &StringTable,
) -> (VmResult<Termination>, Vec<EventRecord>) {
    let program = Program::new(instructions).expect("test program fits the counter");
    let mut sink = RecordingSink::new();
    let outcome = run(&program, strings, &[], &mut sink);
    (outcome, sink.events)
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

#[test]
fn test_call_captures_the_instruction_after_itself() {
    // 0: CALL 3   pushes return address 1
    // 1: PUSHB true
    // 2: HALT
    // 3: RETURN   transfers back to 1
    let outcome = exec(vec![
        call(3),
        pushb(true),
        plain(OpCode::HALT),
        plain(OpCode::RETURN),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

#[test]
fn test_call_target_is_absolute() {
    // CALL sits at index 1 with target literal 5. Absolute addressing lands
    // on the RETURN at 5; offset addressing would leave the program.
    let outcome = exec(vec![
        pushb(true),
        call(5),
        pushb(true),
        plain(OpCode::HALT),
        pushb(false),
        plain(OpCode::RETURN),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

#[test]
fn test_call_to_next_instruction_is_allowed() {
    // Forward by one is still strictly forward.
    let outcome = exec(vec![call(1), pushb(true), plain(OpCode::HALT)]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

#[test]
fn test_call_backward_or_self_is_no_loops() {
    let outcome = exec(vec![pushb(true), call(1)]);
    assert!(matches!(outcome, Err(VmError::NoLoops { pc: 1, target: 1 })));

    let outcome = exec(vec![pushb(true), call(0)]);
    assert!(matches!(outcome, Err(VmError::NoLoops { pc: 1, target: 0 })));
}

#[test]
fn test_nested_calls_unwind_in_order() {
    // 0: CALL 3 / 3: CALL 5 / both RETURNs land where their callers left off.
    let outcome = exec(vec![
        call(3),
        pushb(true),
        plain(OpCode::HALT),
        call(5),
        plain(OpCode::RETURN),
        plain(OpCode::RETURN),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

#[test]
fn test_jmpif_offset_is_relative_to_its_own_address() {
    // JMPIF at index 1 with offset literal 3 lands on index 4 (1 + 3).
    // Were the literal absolute, execution would hit the HALT at 3 with an
    // empty stack instead.
    let outcome = exec(vec![
        pushb(true),
        jmpif(3),
        pushb(true),
        plain(OpCode::HALT),
        pushb(false),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltFalse));
}

#[test]
fn test_jmpif_offset_two_skips_exactly_one_instruction() {
    // 2 is the minimum taken offset: one instruction beyond the jump.
    // Executing the skipped HALT would underflow the stack.
    let outcome = exec(vec![
        pushb(true),
        jmpif(2),
        plain(OpCode::HALT),
        pushb(false),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltFalse));
}

#[test]
fn test_jmpif_false_falls_through() {
    let outcome = exec(vec![
        pushb(false),
        jmpif(3),
        pushb(true),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

#[test]
fn test_jmpif_offset_below_two_is_no_loops() {
    for offset in [0, 1] {
        let outcome = exec(vec![
            pushb(true),
            jmpif(offset),
            pushb(true),
            plain(OpCode::HALT),
        ]);
        assert!(
            matches!(outcome, Err(VmError::NoLoops { pc: 1, .. })),
            "offset {offset} must be rejected"
        );
    }
}

#[test]
fn test_jmpif_past_the_end_is_no_program() {
    let outcome = exec(vec![pushb(true), jmpif(600)]);
    assert!(matches!(outcome, Err(VmError::NoProgram { pc: 601, .. })));

    // Landing exactly on the end is allowed at jump time; the next fetch
    // then reports the counter outside the program.
    let outcome = exec(vec![pushb(true), jmpif(2), pushb(false)]);
    assert!(matches!(outcome, Err(VmError::NoProgram { pc: 3, len: 3 })));
}

#[test]
fn test_jmpif_untaken_ignores_a_bad_offset() {
    // The offset check only applies to a taken jump.
    let outcome = exec(vec![
        pushb(false),
        jmpif(0),
        pushb(true),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

#[test]
fn test_return_with_empty_control_stack_is_out_of_bounds() {
    let outcome = exec(vec![plain(OpCode::RETURN)]);
    assert!(matches!(outcome, Err(VmError::OutOfBounds { .. })));
}

#[test]
fn test_halt_requires_a_boolean() {
    let outcome = exec(vec![pushn(1), plain(OpCode::HALT)]);
    assert!(matches!(outcome, Err(VmError::InvalidArgument { .. })));
    assert_eq!(status_word(&outcome), 0x12);
}

// ---------------------------------------------------------------------------
// Arithmetic and logic
// ---------------------------------------------------------------------------

#[test]
fn test_add_and_sub() {
    let outcome = exec(vec![
        pushn(2),
        pushn(3),
        plain(OpCode::ADD),
        pushn(5),
        cnt(OpCode::EQ, 2),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));

    let outcome = exec(vec![
        pushn(7),
        pushn(3),
        plain(OpCode::SUB),
        pushn(4),
        cnt(OpCode::EQ, 2),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

#[test]
fn test_add_overflow_and_sub_underflow() {
    let outcome = exec(vec![pushn(u32::MAX), pushn(1), plain(OpCode::ADD)]);
    assert!(matches!(outcome, Err(VmError::OutOfBounds { .. })));

    let outcome = exec(vec![pushn(3), pushn(7), plain(OpCode::SUB)]);
    assert!(matches!(outcome, Err(VmError::OutOfBounds { .. })));
}

#[test]
fn test_lt_gt_operand_order() {
    // The second-popped operand is the left-hand side.
    let outcome = exec(vec![pushn(3), pushn(7), plain(OpCode::LT), plain(OpCode::HALT)]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));

    let outcome = exec(vec![pushn(3), pushn(7), plain(OpCode::GT), plain(OpCode::HALT)]);
    assert_eq!(outcome, Ok(Termination::HaltFalse));
}

#[test]
fn test_eq_over_several_operands() {
    let outcome = exec(vec![
        pushn(5),
        pushn(5),
        pushn(5),
        cnt(OpCode::EQ, 3),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));

    let outcome = exec(vec![
        pushn(5),
        pushn(6),
        pushn(5),
        cnt(OpCode::EQ, 3),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltFalse));
}

#[test]
fn test_logic_pops_every_operand() {
    let program = Program::new(vec![
        pushb(false),
        pushb(true),
        pushb(true),
        cnt(OpCode::AND, 3),
        plain(OpCode::HALT),
    ])
    .unwrap();
    let strings = StringTable::empty();
    let mut sink = NullSink;
    let mut engine = ExecutionEngine::new(&program, &strings, &[], &mut sink);

    assert_eq!(engine.run(), Ok(Termination::HaltFalse));
    assert_eq!(engine.stack().arg_depth(), 0);
}

#[test]
fn test_repetition_floors_are_exact() {
    // AND/OR/EQ reject 0 and 1; ROLL rejects 0 and 1; DUP/POP reject 0.
    for instruction in [
        cnt(OpCode::AND, 0),
        cnt(OpCode::AND, 1),
        cnt(OpCode::OR, 0),
        cnt(OpCode::OR, 1),
        cnt(OpCode::EQ, 0),
        cnt(OpCode::EQ, 1),
        cnt(OpCode::ROLL, 0),
        cnt(OpCode::ROLL, 1),
        cnt(OpCode::DUP, 0),
        cnt(OpCode::POP, 0),
    ] {
        let outcome = exec(vec![pushb(true), pushb(true), instruction]);
        assert!(
            matches!(outcome, Err(VmError::InvalidLiteral { .. })),
            "{instruction} must be rejected"
        );
    }

    // DUP 1 and POP 1 are accepted.
    let outcome = exec(vec![
        pushb(true),
        cnt(OpCode::DUP, 1),
        cnt(OpCode::AND, 2),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));

    let outcome = exec(vec![
        pushb(false),
        pushb(true),
        cnt(OpCode::POP, 1),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltFalse));
}

#[test]
fn test_roll_moves_top_to_bottom_of_window() {
    // [1 2 3] ROLL 3 -> [3 1 2]; the top is then 2.
    let outcome = exec(vec![
        pushn(1),
        pushn(2),
        pushn(3),
        cnt(OpCode::ROLL, 3),
        pushn(2),
        cnt(OpCode::EQ, 2),
        plain(OpCode::HALT),
    ]);
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

// ---------------------------------------------------------------------------
// Input and output
// ---------------------------------------------------------------------------

#[test]
fn test_input_reads_little_endian() {
    let outcome = exec_input(
        vec![
            cnt(OpCode::INPUT, 2),
            pushn(0x1234),
            cnt(OpCode::EQ, 2),
            plain(OpCode::HALT),
        ],
        &[0x34, 0x12],
    );
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

#[test]
fn test_input_width_must_be_1_2_or_4() {
    let outcome = exec_input(vec![cnt(OpCode::INPUT, 3)], &[0; 8]);
    assert!(matches!(outcome, Err(VmError::InvalidLiteral { .. })));
}

#[test]
fn test_input_past_end_is_out_of_bounds() {
    let outcome = exec_input(vec![cnt(OpCode::INPUT, 4)], &[0; 3]);
    assert!(matches!(outcome, Err(VmError::OutOfBounds { .. })));
}

#[test]
fn test_rewind_replays_input() {
    let outcome = exec_input(
        vec![
            cnt(OpCode::INPUT, 2),
            cnt(OpCode::POP, 1),
            cnt(OpCode::REWIND, 2),
            cnt(OpCode::INPUT, 2),
            pushn(0x0201),
            cnt(OpCode::EQ, 2),
            plain(OpCode::HALT),
        ],
        &[0x01, 0x02],
    );
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

#[test]
fn test_rewind_zero_seeks_to_start() {
    let outcome = exec_input(
        vec![
            cnt(OpCode::INPUT, 4),
            cnt(OpCode::POP, 1),
            cnt(OpCode::REWIND, 0),
            cnt(OpCode::INPUT, 1),
            pushn(0xAA),
            cnt(OpCode::EQ, 2),
            plain(OpCode::HALT),
        ],
        &[0xAA, 0xBB, 0xCC, 0xDD],
    );
    assert_eq!(outcome, Ok(Termination::HaltTrue));
}

#[test]
fn test_rewind_underflow_is_out_of_bounds() {
    let outcome = exec_input(
        vec![cnt(OpCode::INPUT, 1), cnt(OpCode::POP, 1), cnt(OpCode::REWIND, 5)],
        &[0; 4],
    );
    assert!(matches!(outcome, Err(VmError::OutOfBounds { .. })));
}

#[test]
fn test_output_and_flush_deliver_one_event() {
    let strings = StringTable::from_slices(&["value="], 122).unwrap();
    let (outcome, events) = exec_events(
        vec![
            pushs(0),
            plain(OpCode::OUTPUT),
            pushn(42),
            plain(OpCode::OUTPUT),
            pushb(false),
            plain(OpCode::OUTPUT),
            pushn(EVENT_TYPE_ERROR),
            pushn(0x2001),
            plain(OpCode::FLUSH),
            pushb(true),
            plain(OpCode::HALT),
        ],
        &strings,
    );

    assert_eq!(outcome, Ok(Termination::HaltTrue));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EVENT_TYPE_ERROR);
    assert_eq!(events[0].event_id, 0x2001);
    assert_eq!(events[0].message, "value=42false");
}

#[test]
fn test_flush_resets_the_queue() {
    let strings = StringTable::from_slices(&["a", "b"], 122).unwrap();
    let (outcome, events) = exec_events(
        vec![
            pushs(0),
            plain(OpCode::OUTPUT),
            pushn(2),
            pushn(1),
            plain(OpCode::FLUSH),
            pushs(1),
            plain(OpCode::OUTPUT),
            pushn(2),
            pushn(2),
            plain(OpCode::FLUSH),
            pushb(true),
            plain(OpCode::HALT),
        ],
        &strings,
    );

    assert_eq!(outcome, Ok(Termination::HaltTrue));
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].message, "a");
    assert_eq!(events[1].message, "b");
}

#[test]
fn test_events_flushed_before_a_fault_survive() {
    let strings = StringTable::empty();
    let (outcome, events) = exec_events(
        vec![pushn(2), pushn(8), plain(OpCode::FLUSH), plain(OpCode::RETURN)],
        &strings,
    );
    assert!(matches!(outcome, Err(VmError::OutOfBounds { .. })));
    assert_eq!(events.len(), 1);
}

#[test]
fn test_unflushed_output_is_discarded_on_fault() {
    let strings = StringTable::from_slices(&["pending"], 122).unwrap();
    let (outcome, events) = exec_events(
        vec![pushs(0), plain(OpCode::OUTPUT), plain(OpCode::RETURN)],
        &strings,
    );
    assert!(matches!(outcome, Err(VmError::OutOfBounds { .. })));
    assert!(events.is_empty());
}

#[test]
fn test_pushs_rejects_a_dangling_reference() {
    let outcome = exec(vec![pushs(0)]);
    assert!(matches!(outcome, Err(VmError::InvalidLiteral { .. })));
}

#[test]
fn test_output_overflow_is_out_of_bounds() {
    let program = Program::new(vec![pushn(u32::MAX), plain(OpCode::OUTPUT)]).unwrap();
    let strings = StringTable::empty();
    let mut sink = NullSink;
    let limits = ExecutionLimits {
        max_message_length: 8,
        ..ExecutionLimits::default()
    };
    let mut engine = ExecutionEngine::with_limits(&program, &strings, &[], &mut sink, limits);
    assert!(matches!(
        engine.run(),
        Err(VmError::OutOfBounds { .. })
    ));
}

// ---------------------------------------------------------------------------
// Limits and literals
// ---------------------------------------------------------------------------

#[test]
fn test_stack_capacity_bounds_both_stacks() {
    let program = Program::new(vec![
        pushn(1),
        pushn(2),
        pushn(3),
        pushn(4),
        pushn(5),
    ])
    .unwrap();
    let strings = StringTable::empty();
    let mut sink = NullSink;
    let limits = ExecutionLimits {
        stack_capacity: 4,
        ..ExecutionLimits::default()
    };
    let mut engine = ExecutionEngine::with_limits(&program, &strings, &[], &mut sink, limits);
    assert!(matches!(engine.run(), Err(VmError::OutOfBounds { .. })));
}

#[test]
fn test_dup_respects_the_shared_capacity() {
    let program = Program::new(vec![pushn(1), pushn(2), pushn(3), cnt(OpCode::DUP, 2)]).unwrap();
    let strings = StringTable::empty();
    let mut sink = NullSink;
    let limits = ExecutionLimits {
        stack_capacity: 4,
        ..ExecutionLimits::default()
    };
    let mut engine = ExecutionEngine::with_limits(&program, &strings, &[], &mut sink, limits);
    assert!(matches!(engine.run(), Err(VmError::OutOfBounds { .. })));
}

#[test]
fn test_wrong_immediate_kind_is_invalid_literal() {
    let outcome = exec(vec![Instruction::with_count(OpCode::PUSHN, 3)]);
    assert!(matches!(outcome, Err(VmError::InvalidLiteral { .. })));

    let outcome = exec(vec![Instruction::with_value(OpCode::DUP, Value::Number(1))]);
    assert!(matches!(outcome, Err(VmError::InvalidLiteral { .. })));

    let outcome = exec(vec![Instruction::with_value(
        OpCode::PUSHB,
        Value::Number(1),
    )]);
    assert!(matches!(outcome, Err(VmError::InvalidLiteral { .. })));
}

// ---------------------------------------------------------------------------
// Builder round trip
// ---------------------------------------------------------------------------

#[test]
fn test_builder_programs_execute() {
    // A subroutine that doubles the top of the stack, called twice.
    let mut builder = ProgramBuilder::new();
    let double = builder.label();

    builder.emit_push_number(3);
    builder.emit_call(double);
    builder.emit_call(double);
    builder.emit_push_number(12);
    builder.emit_count(OpCode::EQ, 2);
    builder.emit(OpCode::HALT);
    builder.place(double);
    builder.emit_count(OpCode::DUP, 1);
    builder.emit(OpCode::ADD);
    builder.emit(OpCode::RETURN);

    let program = builder.finalize().unwrap();
    let strings = StringTable::empty();
    let mut sink = NullSink;
    assert_eq!(
        run(&program, &strings, &[], &mut sink),
        Ok(Termination::HaltTrue)
    );
}
