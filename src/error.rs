use crate::Version;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that this crate can produce.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed bytes or string, or a field combination that RFC 4122 does not permit.
    #[error("invalid UUID: {0}")]
    Validation(#[from] ValidationError),

    /// A time-based field was requested from a value that is not time-based.
    #[error("`{operation}` is not supported on a {version:?} UUID")]
    UnsupportedOperation {
        /// Name of the rejected accessor.
        operation: &'static str,
        /// Version of the value the accessor was called on.
        version: Version,
    },

    /// The generator was asked to do something its configuration does not allow.
    #[error("invalid generator configuration: {0}")]
    Configuration(#[from] ConfigError),
}

/// Reasons a byte array or string is not a valid UUID.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The input has a length that no accepted representation has.
    #[error("unexpected length {0}")]
    InvalidLength(usize),

    /// A character other than a hexadecimal digit was found at the given offset.
    #[error("non-hexadecimal character at offset {0}")]
    InvalidCharacter(usize),

    /// A hyphen is missing from or misplaced in the canonical form.
    #[error("hyphen expected at offsets 8, 13, 18 and 23 only")]
    InvalidHyphen,

    /// Byte 8 carries the `111` pattern reserved for future definition.
    #[error("reserved variant bits {0:#04x} in byte 8")]
    InvalidVariant(u8),

    /// An RFC 4122 variant value carries a version nibble outside `1..=5`.
    #[error("version nibble {0} is not valid for the RFC 4122 variant")]
    InvalidVersion(u8),

    /// A field value does not fit its bit width.
    #[error("{field} {value:#x} exceeds {bits} bits")]
    OutOfRange {
        /// Name of the field.
        field: &'static str,
        /// Rejected value.
        value: u64,
        /// Width of the field in bits.
        bits: u32,
    },
}

/// Reasons a generator configuration or call is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A name-based mode was invoked without a name.
    #[error("name-based generation requires a name")]
    MissingName,

    /// A name was supplied to a mode that does not use names.
    #[error("names are only used by name-based modes, not {0:?}")]
    NameNotApplicable(crate::Mode),

    /// The configured version has no generation algorithm.
    #[error("no generation algorithm for version `{0}`")]
    UnsupportedVersion(String),

    /// A configuration value could not be parsed.
    #[error("`{key}`: {reason}")]
    InvalidValue {
        /// Lookup key of the value.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Two settings contradict each other.
    #[error("{0}")]
    Conflict(&'static str),
}
