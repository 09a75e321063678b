//! Event catalog and message fragments.
//!
//! Both validators, the native procedure and the hosted program, build
//! their messages from the same fragment set, so the conformance suite can
//! compare them byte for byte.

/// Summary event emitted once per validation.
pub const VALIDATION_INF: u32 = 0x0008;

/// An unused entry whose pad or bounds are not zero.
pub const ZERO_ERR: u32 = 0x2001;

/// An entry whose id byte is not a single known flag.
pub const PARM_ERR: u32 = 0x2002;

/// An in-use entry with nonzero padding.
pub const PAD_ERR: u32 = 0x2004;

/// An in-use entry whose low bound is outside its class range.
pub const LBND_ERR: u32 = 0x2008;

/// An in-use entry whose high bound is outside its class range.
pub const HBND_ERR: u32 = 0x2010;

/// An in-use entry whose low bound exceeds its high bound.
pub const ORDER_ERR: u32 = 0x2020;

/// An in-use entry that follows a valid unused entry.
pub const EXTRA_ERR: u32 = 0x2040;

/// An in-use entry redefining an earlier entry's parameter.
pub const REDEF_ERR: u32 = 0x2080;

/// Leading fragment of every per-entry message.
pub const FRAG_TABLE_ENTRY: &str = "Table entry ";

/// Fragment between the entry number and the parameter name.
pub const FRAG_PARM: &str = " parm ";

/// Suffix for [`PARM_ERR`]; this message carries no parameter name.
pub const FRAG_INVALID_PARM_ID: &str = " invalid Parm ID";

/// Suffix for [`ZERO_ERR`].
pub const FRAG_NOT_ZEROED: &str = " not zeroed";

/// Suffix for [`PAD_ERR`].
pub const FRAG_PADDING_NOT_ZEROED: &str = " padding not zeroed";

/// Suffix for [`LBND_ERR`].
pub const FRAG_INVALID_LOW_BOUND: &str = " invalid low bound";

/// Suffix for [`HBND_ERR`].
pub const FRAG_INVALID_HIGH_BOUND: &str = " invalid high bound";

/// Suffix for [`ORDER_ERR`].
pub const FRAG_INVALID_BOUND_ORDER: &str = " invalid bound order";

/// Suffix for [`EXTRA_ERR`].
pub const FRAG_FOLLOWS_UNUSED: &str = " follows an unused entry";

/// Suffix for [`REDEF_ERR`].
pub const FRAG_REDEFINES: &str = " redefines earlier entry";

/// Leading fragment of the summary message.
pub const FRAG_SUMMARY_HEAD: &str = "Table image entries: ";

/// Summary fragment after the valid count.
pub const FRAG_SUMMARY_VALID: &str = " valid, ";

/// Summary fragment after the invalid count.
pub const FRAG_SUMMARY_INVALID: &str = " invalid, ";

/// Summary fragment after the unused count.
pub const FRAG_SUMMARY_UNUSED: &str = " unused";
