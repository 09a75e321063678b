//! # tablevm-validator
//!
//! The reference configuration-table validator, twice over:
//!
//! - [`validate`] is the native decision procedure, ordinary Rust.
//! - [`validate_hosted`] runs the same validator as a program hosted on
//!   the [`tablevm`] virtual machine.
//!
//! Both take the framework's view of the world (a byte buffer in, events
//! through a sink, a single status word back) and produce identical events
//! and verdicts for every table image. The conformance suite under
//! `tests/` holds them to that.
//!
//! A table image is four 12-byte entries: an id byte naming one of eight
//! parameters (or zero for unused), three pad bytes, and two inclusive
//! 32-bit bounds, little-endian. Animal parameters accept bounds in
//! [0x10, 0x1000], direction parameters in [0x10000, 0x1000000].

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// Event-id catalog and message fragments.
pub mod events;
/// The native decision procedure.
pub mod native;
/// Parameter identifiers and bound ranges.
pub mod parm_id;
/// The hosted VM program.
pub mod program;
/// Table-image layout.
pub mod table;

use tablevm::{EventSink, Termination};

pub use native::validate;
pub use parm_id::{parm_name, ParmId, ANIMAL_RANGE, DIRECTION_RANGE};
pub use program::{hosted_program, HostedProgram};
pub use table::{parse_table, TableEntry, TABLE_ENTRY_COUNT, TABLE_ENTRY_SIZE, TABLE_SIZE};

/// Status word for a table the framework may activate.
pub const STATUS_SUCCESS: i32 = 0;

/// Application-specific status word for a table that must not activate.
/// A validator fault maps to the same word: the framework cannot tell an
/// invalid table from a crashed validator, by design.
pub const STATUS_TABLE_INVALID: i32 = -1;

/// Validates a table image by running the hosted program on the VM.
///
/// Event-for-event and status-for-status equivalent to [`validate`].
pub fn validate_hosted(table: &[u8], sink: &mut dyn EventSink) -> i32 {
    let hosted = hosted_program();
    match tablevm::run(&hosted.program, &hosted.strings, table, sink) {
        Ok(Termination::HaltTrue) => STATUS_SUCCESS,
        Ok(Termination::HaltFalse) => STATUS_TABLE_INVALID,
        Err(error) => {
            log::debug!("hosted validator fault: {error}");
            STATUS_TABLE_INVALID
        }
    }
}
