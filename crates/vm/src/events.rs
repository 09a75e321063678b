//! Host event capability.
//!
//! FLUSH is the only instruction that externalizes state; it hands the
//! queued message to a sink the caller supplies. The VM never owns the
//! transport.

/// Event-type code for debug events.
pub const EVENT_TYPE_DEBUG: u32 = 1;

/// Event-type code for informational events.
pub const EVENT_TYPE_INFORMATION: u32 = 2;

/// Event-type code for error events.
pub const EVENT_TYPE_ERROR: u32 = 3;

/// Event-type code for critical events.
pub const EVENT_TYPE_CRITICAL: u32 = 4;

/// Receives the events a run emits.
pub trait EventSink {
    /// Delivers one event. `message` is the queued UTF-8 text without the
    /// reserved terminator byte.
    fn emit(&mut self, event_type: u32, event_id: u32, message: &[u8]);
}

/// One delivered event, as captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// The event-type code popped by FLUSH.
    pub event_type: u32,

    /// The event id popped by FLUSH.
    pub event_id: u32,

    /// The message text.
    pub message: String,
}

/// A sink that records every event, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// The events delivered so far.
    pub events: Vec<EventRecord>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event_type: u32, event_id: u32, message: &[u8]) {
        self.events.push(EventRecord {
            event_type,
            event_id,
            message: String::from_utf8_lossy(message).into_owned(),
        });
    }
}

/// A sink that discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event_type: u32, _event_id: u32, _message: &[u8]) {}
}
