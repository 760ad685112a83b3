//! Error taxonomy of the codec.
//!
//! Every decode error carries the byte offset (relative to the start of
//! the buffer handed to the codec) at which decoding gave up.
//!
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a codec call failed.
#[derive(Debug, Error)]
pub enum Error {
    /// The buffer ended before a declared size or a required fixed field.
    #[error("truncated at offset {offset}: {what}")]
    Truncated { offset: u64, what: String },

    /// The data cannot be a valid instance of the wire format.
    #[error("malformed at offset {offset}: {what}")]
    Malformed { offset: u64, what: String },

    /// A value is outside its allowed domain.
    #[error("out of range: {what}")]
    OutOfRange { what: String },

    /// A recognisable but unsupported construct where a known one was required.
    #[error("unknown construct at offset {offset}: {what}")]
    Unknown { offset: u64, what: String },

    /// Structurally complete but semantically incomplete.
    #[error("invariant violation: {what}")]
    InvariantViolation { what: String },
}

impl Error {
    /// Offset at which decoding failed, if the error has one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::Truncated { offset, .. } => Some(*offset),
            Error::Malformed { offset, .. } => Some(*offset),
            Error::Unknown { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// A non-fatal oddity met during decoding.
///
/// Unknown boxes and unknown LOC header extensions do not abort a walk;
/// they are preserved for re-encoding and recorded as warnings on the
/// decoded object.
#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
    pub offset: u64,
    pub what: String,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "at offset {}: {}", self.offset, self.what)
    }
}

/// Construct an [`Error`](crate::Error), with optional format arguments.
///
/// The variants that carry an offset take it as the second argument:
///
/// ```text
/// decerr!(Truncated, stream.pos(), "need {} bytes", n)
/// decerr!(OutOfRange, "temporal id {} > 7", tid)
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! decerr {
    (Truncated, $pos:expr, $($arg:tt)+) => {
        $crate::error::Error::Truncated { offset: $pos, what: format!($($arg)+) }
    };
    (Malformed, $pos:expr, $($arg:tt)+) => {
        $crate::error::Error::Malformed { offset: $pos, what: format!($($arg)+) }
    };
    (Unknown, $pos:expr, $($arg:tt)+) => {
        $crate::error::Error::Unknown { offset: $pos, what: format!($($arg)+) }
    };
    (OutOfRange, $($arg:tt)+) => {
        $crate::error::Error::OutOfRange { what: format!($($arg)+) }
    };
    (InvariantViolation, $($arg:tt)+) => {
        $crate::error::Error::InvariantViolation { what: format!($($arg)+) }
    };
}
