//! The program's constant string table.
//!
//! Strings are validated once at construction: no interior NUL (the C
//! transport terminates with one), and each entry plus its terminator must
//! fit an event message. A `StringRef` value indexes this table.

use crate::error::{VmError, VmResult};

/// A read-only ordered sequence of immutable text strings.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    entries: Vec<String>,
}

impl StringTable {
    /// Builds a table, validating every entry against `max_message_length`.
    pub fn new(entries: Vec<String>, max_message_length: usize) -> VmResult<Self> {
        if entries.len() > usize::from(u16::MAX) + 1 {
            return Err(VmError::invalid_literal(
                "string table exceeds the u16 index space",
            ));
        }
        for entry in &entries {
            if entry.as_bytes().contains(&0) {
                return Err(VmError::invalid_literal(
                    "string table entry contains a NUL byte",
                ));
            }
            if entry.len() + 1 > max_message_length {
                return Err(VmError::invalid_literal(
                    "string table entry longer than an event message",
                ));
            }
        }
        Ok(Self { entries })
    }

    /// Builds a table from string slices.
    pub fn from_slices(entries: &[&str], max_message_length: usize) -> VmResult<Self> {
        Self::new(
            entries.iter().map(|s| (*s).to_owned()).collect(),
            max_message_length,
        )
    }

    /// An empty table, for programs that never PUSHS.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for a table with no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry; out-of-range indices are `InvalidLiteral`.
    pub fn get(&self, index: u16) -> VmResult<&str> {
        self.entries
            .get(usize::from(index))
            .map(String::as_str)
            .ok_or(VmError::invalid_literal(
                "string reference outside the table",
            ))
    }
}
