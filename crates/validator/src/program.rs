//! The hosted validator program.
//!
//! This module assembles, once, the VM program that reproduces the native
//! decision procedure. The VM has no variables, so the running state (the
//! follows-unused flag, the three counters, and one id slot per processed
//! entry) lives at the bottom of the argument stack and is reached with
//! ROLL/DUP shuffles of statically known depth. Control only moves
//! forward: the four entry blocks are unrolled in sequence and share four
//! subroutines placed after the summary emitter.
//!
//! Stack layout between entry blocks, bottom to top:
//!
//! ```text
//! id_1 .. id_k  follows_unused  valid  invalid  unused
//! ```
//!
//! where `id_j` is the exact id byte entry `j` claimed (zero when it
//! claimed none). Inside a block the five locals `parm padsum low high
//! fault` sit above the state.

use once_cell::sync::Lazy;

use tablevm::{
    BuildError, Label, OpCode, Program, ProgramBuilder, StringTable, DEFAULT_MAX_MESSAGE_LENGTH,
    EVENT_TYPE_ERROR, EVENT_TYPE_INFORMATION,
};

use crate::events::{
    EXTRA_ERR, FRAG_FOLLOWS_UNUSED, FRAG_INVALID_BOUND_ORDER, FRAG_INVALID_HIGH_BOUND,
    FRAG_INVALID_LOW_BOUND, FRAG_INVALID_PARM_ID, FRAG_NOT_ZEROED, FRAG_PADDING_NOT_ZEROED,
    FRAG_PARM, FRAG_REDEFINES, FRAG_SUMMARY_HEAD, FRAG_SUMMARY_INVALID, FRAG_SUMMARY_UNUSED,
    FRAG_SUMMARY_VALID, FRAG_TABLE_ENTRY, HBND_ERR, LBND_ERR, ORDER_ERR, PAD_ERR, PARM_ERR,
    REDEF_ERR, VALIDATION_INF, ZERO_ERR,
};
use crate::parm_id::{ANIMAL_RANGE, DIRECTION_RANGE};
use crate::table::TABLE_ENTRY_COUNT;

// String-table indices. The order must match `string_table` below.
const S_TABLE_ENTRY: u16 = 0;
const S_PARM: u16 = 1;
const S_UNUSED: u16 = 2;
const S_APE: u16 = 3;
const S_BAT: u16 = 4;
const S_CAT: u16 = 5;
const S_DOG: u16 = 6;
const S_NORTH: u16 = 7;
const S_SOUTH: u16 = 8;
const S_EAST: u16 = 9;
const S_WEST: u16 = 10;
const S_INVALID_PARM_ID: u16 = 11;
const S_NOT_ZEROED: u16 = 12;
const S_PADDING_NOT_ZEROED: u16 = 13;
const S_INVALID_LOW_BOUND: u16 = 14;
const S_INVALID_HIGH_BOUND: u16 = 15;
const S_INVALID_BOUND_ORDER: u16 = 16;
const S_FOLLOWS_UNUSED: u16 = 17;
const S_REDEFINES: u16 = 18;
const S_SUMMARY_HEAD: u16 = 19;
const S_SUMMARY_VALID: u16 = 20;
const S_SUMMARY_INVALID: u16 = 21;
const S_SUMMARY_UNUSED: u16 = 22;

/// The assembled program together with its string table.
pub struct HostedProgram {
    /// The instruction sequence.
    pub program: Program,

    /// The constant strings the program's PUSHS literals index.
    pub strings: StringTable,
}

static HOSTED: Lazy<HostedProgram> = Lazy::new(|| HostedProgram {
    program: build_program().expect("the hosted validator assembles"),
    strings: string_table(),
});

/// The process-wide hosted validator.
pub fn hosted_program() -> &'static HostedProgram {
    &HOSTED
}

fn string_table() -> StringTable {
    StringTable::from_slices(
        &[
            FRAG_TABLE_ENTRY,
            FRAG_PARM,
            "Unused",
            "Ape",
            "Bat",
            "Cat",
            "Dog",
            "North",
            "South",
            "East",
            "West",
            FRAG_INVALID_PARM_ID,
            FRAG_NOT_ZEROED,
            FRAG_PADDING_NOT_ZEROED,
            FRAG_INVALID_LOW_BOUND,
            FRAG_INVALID_HIGH_BOUND,
            FRAG_INVALID_BOUND_ORDER,
            FRAG_FOLLOWS_UNUSED,
            FRAG_REDEFINES,
            FRAG_SUMMARY_HEAD,
            FRAG_SUMMARY_VALID,
            FRAG_SUMMARY_INVALID,
            FRAG_SUMMARY_UNUSED,
        ],
        DEFAULT_MAX_MESSAGE_LENGTH,
    )
    .expect("the fragment set fits the message limit")
}

/// Labels of the shared subroutines.
struct Subroutines {
    /// `[id] -> [bool]`: is the id a single known flag?
    is_flag: Label,
    /// `[id] -> [range_low, range_high]`: the class range for a flag id.
    bounds: Label,
    /// `[range_low, range_high, x] -> [bool]`: inclusive containment.
    in_range: Label,
    /// `[number, id] -> []`: appends `Table entry N parm Name`.
    prefix: Label,
}

/// Copies the argument at `depth` (1 is the top) to the top of the stack,
/// leaving everything else in place.
fn emit_pick(b: &mut ProgramBuilder, depth: u16) {
    if depth == 1 {
        b.emit_count(OpCode::DUP, 1);
        return;
    }
    // Rotate the target to the top, duplicate it, rotate the wider window
    // once to slide the original back home.
    for _ in 1..depth {
        b.emit_count(OpCode::ROLL, depth);
    }
    b.emit_count(OpCode::DUP, 1);
    b.emit_count(OpCode::ROLL, depth + 1);
}

/// Adds one to the number at `depth`, leaving everything else in place.
fn emit_bump(b: &mut ProgramBuilder, depth: u16) {
    if depth == 1 {
        b.emit_push_number(1);
        b.emit(OpCode::ADD);
        return;
    }
    for _ in 1..depth {
        b.emit_count(OpCode::ROLL, depth);
    }
    b.emit_push_number(1);
    b.emit(OpCode::ADD);
    b.emit_count(OpCode::ROLL, depth);
}

/// Overwrites the boolean at `depth` with `true`, leaving everything else
/// in place.
fn emit_set_true(b: &mut ProgramBuilder, depth: u16) {
    if depth == 1 {
        b.emit_count(OpCode::POP, 1);
        b.emit_push_bool(true);
        return;
    }
    for _ in 1..depth {
        b.emit_count(OpCode::ROLL, depth);
    }
    b.emit_count(OpCode::POP, 1);
    b.emit_push_bool(true);
    b.emit_count(OpCode::ROLL, depth);
}

/// Consumes a condition from the stack; when it holds, emits the entry's
/// error event and raises the block-local fault flag.
///
/// Expects the flag-path locals `parm padsum low high fault` on top of the
/// state, with the condition above them.
fn emit_check_fault(
    b: &mut ProgramBuilder,
    subs: &Subroutines,
    number: u16,
    suffix: u16,
    event_id: u32,
) {
    b.emit(OpCode::NOT);
    let skip = b.label();
    b.emit_jump_if(skip);

    b.emit_push_number(u32::from(number));
    emit_pick(b, 6); // parm, beneath the four other locals and the number
    b.emit_call(subs.prefix);
    b.emit_push_string(suffix);
    b.emit(OpCode::OUTPUT);
    b.emit_push_number(EVENT_TYPE_ERROR);
    b.emit_push_number(event_id);
    b.emit(OpCode::FLUSH);
    emit_set_true(b, 1); // fault = true

    b.place(skip);
}

/// Emits the classification block for one entry.
fn emit_entry_block(b: &mut ProgramBuilder, subs: &Subroutines, number: u16) {
    let earlier = number - 1;
    let l_unused = b.label();
    let l_flag = b.label();
    let l_end = b.label();

    // Dequeue the entry: id byte, summed pad bytes, both bounds.
    b.emit_count(OpCode::INPUT, 1);
    b.emit_count(OpCode::INPUT, 1);
    b.emit_count(OpCode::INPUT, 1);
    b.emit(OpCode::ADD);
    b.emit_count(OpCode::INPUT, 1);
    b.emit(OpCode::ADD);
    b.emit_count(OpCode::INPUT, 4);
    b.emit_count(OpCode::INPUT, 4);

    // Unused marker?
    emit_pick(b, 4);
    b.emit_push_number(0);
    b.emit_count(OpCode::EQ, 2);
    b.emit_jump_if(l_unused);

    // Single known flag?
    emit_pick(b, 4);
    b.emit_call(subs.is_flag);
    b.emit_jump_if(l_flag);

    // Neither: a composite or unknown id, reported alone. The entry
    // claims no parameter, so its id slot is zero.
    b.emit_push_string(S_TABLE_ENTRY);
    b.emit(OpCode::OUTPUT);
    b.emit_push_number(u32::from(number));
    b.emit(OpCode::OUTPUT);
    b.emit_push_string(S_INVALID_PARM_ID);
    b.emit(OpCode::OUTPUT);
    b.emit_push_number(EVENT_TYPE_ERROR);
    b.emit_push_number(PARM_ERR);
    b.emit(OpCode::FLUSH);
    b.emit_count(OpCode::POP, 4);
    emit_bump(b, 2); // invalid += 1
    b.emit_push_number(0);
    b.emit_count(OpCode::ROLL, 5);
    b.emit_jump(l_end);

    // In-use entry: apply the six checks in tabular order, each
    // independently of the others.
    b.place(l_flag);
    b.emit_push_bool(false); // fault flag

    // Padding.
    emit_pick(b, 4);
    b.emit_push_number(0);
    b.emit(OpCode::GT);
    emit_check_fault(b, subs, number, S_PADDING_NOT_ZEROED, PAD_ERR);

    // Low bound against the class range.
    emit_pick(b, 5);
    b.emit_call(subs.bounds);
    emit_pick(b, 5);
    b.emit_call(subs.in_range);
    b.emit(OpCode::NOT);
    emit_check_fault(b, subs, number, S_INVALID_LOW_BOUND, LBND_ERR);

    // High bound against the class range.
    emit_pick(b, 5);
    b.emit_call(subs.bounds);
    emit_pick(b, 4);
    b.emit_call(subs.in_range);
    b.emit(OpCode::NOT);
    emit_check_fault(b, subs, number, S_INVALID_HIGH_BOUND, HBND_ERR);

    // Bound order.
    emit_pick(b, 3);
    emit_pick(b, 3);
    b.emit(OpCode::GT);
    emit_check_fault(b, subs, number, S_INVALID_BOUND_ORDER, ORDER_ERR);

    // Follows a valid unused entry.
    emit_pick(b, 9);
    emit_check_fault(b, subs, number, S_FOLLOWS_UNUSED, EXTRA_ERR);

    // Redefinition: compare against every earlier entry's id slot. The
    // slots hold exact id bytes, so a composite never collides here.
    if earlier > 0 {
        for bit in 0..earlier {
            emit_pick(b, 5 + bit);
            emit_pick(b, 10 + earlier);
            b.emit_count(OpCode::EQ, 2);
        }
        if earlier > 1 {
            b.emit_count(OpCode::OR, earlier);
        }
        emit_check_fault(b, subs, number, S_REDEFINES, REDEF_ERR);
    }

    // Resolve the entry. Keep the id, drop the other locals, count it,
    // and slot the id beneath the follows-unused flag.
    b.emit_count(OpCode::ROLL, 5); // fault beneath the fields
    b.emit_count(OpCode::POP, 3); // drop padsum/low/high
    b.emit_count(OpCode::ROLL, 2); // [.. parm fault]
    let l_invalid = b.label();
    let l_slot = b.label();
    b.emit_jump_if(l_invalid);
    emit_bump(b, 4); // valid += 1
    b.emit_jump(l_slot);
    b.place(l_invalid);
    emit_bump(b, 3); // invalid += 1
    b.place(l_slot);
    b.emit_count(OpCode::ROLL, 5);
    b.emit_jump(l_end);

    // Unused marker: well-formed only when pad and bounds are all zero.
    b.place(l_unused);
    b.emit_count(OpCode::DUP, 3);
    b.emit_push_number(0);
    b.emit_count(OpCode::EQ, 4);
    let l_unused_ok = b.label();
    b.emit_jump_if(l_unused_ok);

    b.emit_push_number(u32::from(number));
    emit_pick(b, 5); // the zero id; its display name is Unused
    b.emit_call(subs.prefix);
    b.emit_push_string(S_NOT_ZEROED);
    b.emit(OpCode::OUTPUT);
    b.emit_push_number(EVENT_TYPE_ERROR);
    b.emit_push_number(ZERO_ERR);
    b.emit(OpCode::FLUSH);
    b.emit_count(OpCode::POP, 3);
    emit_bump(b, 3); // invalid += 1
    b.emit_count(OpCode::ROLL, 5);
    b.emit_jump(l_end);

    b.place(l_unused_ok);
    b.emit_count(OpCode::POP, 3);
    emit_bump(b, 2); // unused += 1
    emit_set_true(b, 5); // arm the follows-unused check
    b.emit_count(OpCode::ROLL, 5);

    b.place(l_end);
}

/// Emits the summary event and the final verdict.
fn emit_summary(b: &mut ProgramBuilder) {
    b.emit_push_string(S_SUMMARY_HEAD);
    b.emit(OpCode::OUTPUT);
    emit_pick(b, 3); // valid
    b.emit(OpCode::OUTPUT);
    b.emit_push_string(S_SUMMARY_VALID);
    b.emit(OpCode::OUTPUT);
    emit_pick(b, 2); // invalid
    b.emit(OpCode::OUTPUT);
    b.emit_push_string(S_SUMMARY_INVALID);
    b.emit(OpCode::OUTPUT);
    emit_pick(b, 1); // unused
    b.emit(OpCode::OUTPUT);
    b.emit_push_string(S_SUMMARY_UNUSED);
    b.emit(OpCode::OUTPUT);
    b.emit_push_number(EVENT_TYPE_INFORMATION);
    b.emit_push_number(VALIDATION_INF);
    b.emit(OpCode::FLUSH);

    // The image activates only when nothing was invalid.
    emit_pick(b, 2);
    b.emit_push_number(0);
    b.emit_count(OpCode::EQ, 2);
    b.emit(OpCode::HALT);
}

fn emit_is_flag(b: &mut ProgramBuilder, label: Label) {
    b.place(label);
    for (bit, value) in [1u32, 2, 4, 8, 16, 32, 64, 128].iter().enumerate() {
        emit_pick(b, bit as u16 + 1);
        b.emit_push_number(*value);
        b.emit_count(OpCode::EQ, 2);
    }
    b.emit_count(OpCode::OR, 8);
    b.emit_count(OpCode::ROLL, 2); // drop the id copy beneath the answer
    b.emit_count(OpCode::POP, 1);
    b.emit(OpCode::RETURN);
}

fn emit_bounds(b: &mut ProgramBuilder, label: Label) {
    b.place(label);
    // Animal flags occupy the low nibble.
    b.emit_push_number(0x10);
    b.emit(OpCode::LT);
    let animal = b.label();
    b.emit_jump_if(animal);
    b.emit_push_number(*DIRECTION_RANGE.start());
    b.emit_push_number(*DIRECTION_RANGE.end());
    b.emit(OpCode::RETURN);
    b.place(animal);
    b.emit_push_number(*ANIMAL_RANGE.start());
    b.emit_push_number(*ANIMAL_RANGE.end());
    b.emit(OpCode::RETURN);
}

fn emit_in_range(b: &mut ProgramBuilder, label: Label) {
    // [range_low, range_high, x] -> [range_low <= x <= range_high]
    b.place(label);
    b.emit_count(OpCode::DUP, 1);
    b.emit_count(OpCode::ROLL, 4);
    b.emit_count(OpCode::ROLL, 4); // [x, x, range_low, range_high]
    b.emit_count(OpCode::ROLL, 3); // [x, range_high, x, range_low]
    b.emit(OpCode::LT);
    b.emit(OpCode::NOT); // [x, range_high, low_ok]
    b.emit_count(OpCode::ROLL, 3); // [low_ok, x, range_high]
    b.emit(OpCode::GT);
    b.emit(OpCode::NOT); // [low_ok, high_ok]
    b.emit_count(OpCode::AND, 2);
    b.emit(OpCode::RETURN);
}

fn emit_prefix(b: &mut ProgramBuilder, label: Label) {
    // [number, id] -> appends "Table entry N parm Name"
    b.place(label);
    b.emit_push_string(S_TABLE_ENTRY);
    b.emit(OpCode::OUTPUT);
    b.emit_count(OpCode::ROLL, 2);
    b.emit(OpCode::OUTPUT); // the entry number
    b.emit_push_string(S_PARM);
    b.emit(OpCode::OUTPUT);

    // Name dispatch: one forward test per id, West as the remainder.
    let names = [
        (0u32, S_UNUSED),
        (1, S_APE),
        (2, S_BAT),
        (4, S_CAT),
        (8, S_DOG),
        (16, S_NORTH),
        (32, S_SOUTH),
        (64, S_EAST),
    ];
    let mut cases: Vec<(Label, u16)> = Vec::new();
    for (value, string) in names {
        let case = b.label();
        b.emit_count(OpCode::DUP, 1);
        b.emit_push_number(value);
        b.emit_count(OpCode::EQ, 2);
        b.emit_jump_if(case);
        cases.push((case, string));
    }
    b.emit_count(OpCode::POP, 1);
    b.emit_push_string(S_WEST);
    b.emit(OpCode::OUTPUT);
    b.emit(OpCode::RETURN);
    for (case, string) in cases {
        b.place(case);
        b.emit_count(OpCode::POP, 1);
        b.emit_push_string(string);
        b.emit(OpCode::OUTPUT);
        b.emit(OpCode::RETURN);
    }
}

fn build_program() -> Result<Program, BuildError> {
    let mut b = ProgramBuilder::new();
    let subs = Subroutines {
        is_flag: b.label(),
        bounds: b.label(),
        in_range: b.label(),
        prefix: b.label(),
    };

    // Seed the running state.
    b.emit_push_bool(false); // follows-unused flag
    b.emit_push_number(0); // valid
    b.emit_push_number(0); // invalid
    b.emit_push_number(0); // unused

    for number in 1..=TABLE_ENTRY_COUNT as u16 {
        emit_entry_block(&mut b, &subs, number);
    }
    emit_summary(&mut b);

    emit_is_flag(&mut b, subs.is_flag);
    emit_bounds(&mut b, subs.bounds);
    emit_in_range(&mut b, subs.in_range);
    emit_prefix(&mut b, subs.prefix);

    b.finalize()
}
