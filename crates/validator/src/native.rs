//! The native reference decision procedure.
//!
//! This is the validator the hosted program reproduces: same events in the
//! same order, same status word, for every table image.

use tablevm::{EventSink, EVENT_TYPE_ERROR, EVENT_TYPE_INFORMATION};

use crate::events::{
    EXTRA_ERR, FRAG_FOLLOWS_UNUSED, FRAG_INVALID_BOUND_ORDER, FRAG_INVALID_HIGH_BOUND,
    FRAG_INVALID_LOW_BOUND, FRAG_INVALID_PARM_ID, FRAG_NOT_ZEROED, FRAG_PADDING_NOT_ZEROED,
    FRAG_PARM, FRAG_REDEFINES, FRAG_SUMMARY_HEAD, FRAG_SUMMARY_INVALID, FRAG_SUMMARY_UNUSED,
    FRAG_SUMMARY_VALID, FRAG_TABLE_ENTRY, HBND_ERR, LBND_ERR, ORDER_ERR, PAD_ERR, PARM_ERR,
    REDEF_ERR, VALIDATION_INF, ZERO_ERR,
};
use crate::parm_id::ParmId;
use crate::table::{parse_table, TABLE_ENTRY_COUNT};
use crate::{STATUS_SUCCESS, STATUS_TABLE_INVALID};

fn emit_entry_error(sink: &mut dyn EventSink, event_id: u32, number: usize, text: String) {
    let message = format!("{FRAG_TABLE_ENTRY}{number}{text}");
    sink.emit(EVENT_TYPE_ERROR, event_id, message.as_bytes());
}

/// Validates a table image.
///
/// Emits zero or more error events and exactly one summary event, then
/// returns the single status word the framework uses to decide whether to
/// activate the image. A buffer shorter than the table yields the
/// non-success word with no events.
pub fn validate(table: &[u8], sink: &mut dyn EventSink) -> i32 {
    let Some(entries) = parse_table(table) else {
        log::debug!("table image shorter than {} bytes", crate::table::TABLE_SIZE);
        return STATUS_TABLE_INVALID;
    };

    let mut valid = 0u32;
    let mut invalid = 0u32;
    let mut unused = 0u32;
    let mut unused_valid_seen = false;
    // Exact id bytes of earlier flag-classified entries; zero marks an
    // entry that contributes nothing.
    let mut earlier_ids = [0u8; TABLE_ENTRY_COUNT];

    for (index, entry) in entries.iter().enumerate() {
        let number = index + 1;

        if entry.parm_id == 0 {
            if entry.is_zeroed() {
                unused += 1;
                unused_valid_seen = true;
            } else {
                emit_entry_error(
                    sink,
                    ZERO_ERR,
                    number,
                    format!("{FRAG_PARM}Unused{FRAG_NOT_ZEROED}"),
                );
                invalid += 1;
            }
            continue;
        }

        let Some(parm) = ParmId::single(entry.parm_id) else {
            // A composite or unknown id is reported alone; it neither
            // receives the per-field checks nor claims any parameter bit.
            emit_entry_error(sink, PARM_ERR, number, FRAG_INVALID_PARM_ID.to_owned());
            invalid += 1;
            continue;
        };

        let name = parm.name();
        let bounds = parm.bounds();
        let mut faulted = false;

        if entry.pad != [0, 0, 0] {
            emit_entry_error(
                sink,
                PAD_ERR,
                number,
                format!("{FRAG_PARM}{name}{FRAG_PADDING_NOT_ZEROED}"),
            );
            faulted = true;
        }
        if !bounds.contains(&entry.bound_low) {
            emit_entry_error(
                sink,
                LBND_ERR,
                number,
                format!("{FRAG_PARM}{name}{FRAG_INVALID_LOW_BOUND}"),
            );
            faulted = true;
        }
        if !bounds.contains(&entry.bound_high) {
            emit_entry_error(
                sink,
                HBND_ERR,
                number,
                format!("{FRAG_PARM}{name}{FRAG_INVALID_HIGH_BOUND}"),
            );
            faulted = true;
        }
        if entry.bound_low > entry.bound_high {
            emit_entry_error(
                sink,
                ORDER_ERR,
                number,
                format!("{FRAG_PARM}{name}{FRAG_INVALID_BOUND_ORDER}"),
            );
            faulted = true;
        }
        if unused_valid_seen {
            emit_entry_error(
                sink,
                EXTRA_ERR,
                number,
                format!("{FRAG_PARM}{name}{FRAG_FOLLOWS_UNUSED}"),
            );
            faulted = true;
        }
        if earlier_ids[..index].contains(&entry.parm_id) {
            emit_entry_error(
                sink,
                REDEF_ERR,
                number,
                format!("{FRAG_PARM}{name}{FRAG_REDEFINES}"),
            );
            faulted = true;
        }

        // Even a faulted flag entry claims its parameter for the REDEF
        // check on later entries.
        earlier_ids[index] = entry.parm_id;

        if faulted {
            invalid += 1;
        } else {
            valid += 1;
        }
    }

    let summary = format!(
        "{FRAG_SUMMARY_HEAD}{valid}{FRAG_SUMMARY_VALID}{invalid}{FRAG_SUMMARY_INVALID}{unused}{FRAG_SUMMARY_UNUSED}"
    );
    sink.emit(EVENT_TYPE_INFORMATION, VALIDATION_INF, summary.as_bytes());

    if invalid == 0 {
        STATUS_SUCCESS
    } else {
        STATUS_TABLE_INVALID
    }
}
