//! Runtime error taxonomy for the metaclass core.

use strum::{Display, EnumDiscriminants, EnumIter};
use thiserror::Error;

/// Top-level error type returned by every fallible operation in this crate.
///
/// Mirrors the error kinds named in the VM's error-handling design: argument
/// validation, numeric limits, sequence limits, unsupported operations,
/// registry errors and resource exhaustion all get a distinct variant so a
/// host VM can map each one to the right thrown error token without
/// re-parsing a message string.
#[derive(Debug, Error, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(VmErrorKind), derive(Display, EnumIter))]
pub enum VmError {
    /// A built-in method was called with the wrong number of arguments.
    #[error("wrong number of arguments (expected {expected}, got {got})")]
    WrongNumOfArgs {
        /// Number of arguments the method requires.
        expected: u8,
        /// Number of arguments actually supplied.
        got: u8,
    },

    /// An argument had a type the operation cannot accept.
    #[error("bad type for built-in function argument")]
    BadTypeBif,

    /// An argument had an acceptable type but an unacceptable value.
    #[error("bad value for built-in function argument: {0}")]
    BadValBif(String),

    /// An arithmetic result does not fit in its destination representation.
    #[error("numeric overflow")]
    NumOverflow,

    /// Division (or modulo) by zero.
    #[error("divide by zero")]
    DivideByZero,

    /// A value fell outside the domain an operation accepts.
    #[error("out of range")]
    OutOfRange,

    /// A sequence operation would exceed its maximum length.
    #[error("string or buffer too long")]
    StrTooLong,

    /// An index fell outside a sequence's valid bounds.
    #[error("index out of range")]
    IndexOutOfRange,

    /// A property set was attempted on a value that does not support it.
    #[error("invalid property assignment")]
    InvalidSetProp,

    /// Two values were compared in a way the comparison protocol forbids.
    #[error("invalid comparison")]
    InvalidComparison,

    /// An image's dependency table named a metaclass with no registered
    /// descriptor.
    #[error("unknown metaclass `{name}`")]
    UnknownMetaclass {
        /// The `name_with_version` string as it appeared in the image.
        name: String,
        /// Always true: callers use this to decide whether to suggest an
        /// upgrade of the host program.
        version_error: bool,
    },

    /// An image's dependency table requested a metaclass version newer than
    /// the host descriptor implements.
    #[error("metaclass `{name}` is too old (image requires a newer version)")]
    MetaclassTooOld {
        /// The `name_with_version` string as it appeared in the image.
        name: String,
        /// Always true: callers use this to decide whether to suggest an
        /// upgrade of the host program.
        version_error: bool,
    },

    /// A dependency-table index referenced during image load or restore did
    /// not name a valid entry.
    #[error("bad metaclass index {0}")]
    BadMetaclassIndex(u32),

    /// A saved `func_xlat` table exceeded the bounds the format allows.
    #[error("saved metaclass translation table too long")]
    SavedMetaTooLong,

    /// The `BigNumber` temp-register pool had no free registers to lease.
    #[error("no free BigNumber registers")]
    BignumNoRegs,

    /// A host allocation failed.
    #[error("out of memory")]
    OutOfMemory,

    /// A date-format string ended in the middle of a `%` directive.
    #[error("unterminated format directive")]
    UnterminatedFormatTemplate,

    /// A `%`-format code or parser template code is not recognized.
    #[error("unknown format code `{0}`")]
    UnknownFormatCode(char),

    /// A `Dictionary` comparator object did not implement the required
    /// capability set.
    #[error("comparator object does not implement calcHash/matchValues")]
    ComparatorMismatch,

    /// A date/time or timezone string could not be parsed.
    #[error("could not parse date/time value: {0}")]
    DateParseFailure(String),

    /// A named time zone was not present in the zone database and no
    /// fallback offset was available to synthesize one.
    #[error("unknown time zone `{0}`")]
    UnknownZone(String),
}

impl VmError {
    /// The fieldless kind token for this error, stable across variant-data
    /// changes — what a host VM maps to its own thrown-error token instead
    /// of re-parsing the display message.
    pub fn kind(&self) -> VmErrorKind {
        self.into()
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VmError>;

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_kind_has_a_distinct_display_token() {
        let tokens: Vec<String> = VmErrorKind::iter().map(|k| k.to_string()).collect();
        let mut sorted = tokens.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), tokens.len());
    }
}
