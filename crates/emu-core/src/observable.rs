//! Inspection interface for chip state.
//!
//! Debuggers and tests look inside a chip through [`Observable`]. A query
//! must never change emulation state.

use std::fmt;

/// A dynamically-typed register or flag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// A single flag.
    Bool(bool),
    /// A byte-wide register or counter.
    U8(u8),
    /// A long-word register or pointer.
    U32(u32),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U32(v) => write!(f, "{v:#010X}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

/// A component whose state can be inspected.
pub trait Observable {
    /// Query a property by path.
    ///
    /// Paths are hierarchical, separated by dots, for example
    /// `scsi.next` or `en_rx.csr.complete`.
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// Every path `query()` understands.
    fn query_paths(&self) -> &'static [&'static str];
}
