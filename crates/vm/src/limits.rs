//! Per-run resource limits.

/// Default number of combined argument/control stack slots.
///
/// The reference validator program needs well under this; anything at or
/// above 32 satisfies its documented requirement.
pub const DEFAULT_STACK_CAPACITY: usize = 32;

/// Default maximum event-message length, including the reserved terminator
/// byte. Matches the framework constant used by the conformance suite.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 122;

/// Restrictions applied to a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Combined capacity shared by the argument and control stacks.
    pub stack_capacity: usize,

    /// Size of the output queue; the final byte is reserved.
    pub max_message_length: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }
}
