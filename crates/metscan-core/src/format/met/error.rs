use thiserror::Error;

/// Errors returned by MET decoding.
///
/// Every variant is fatal to the decode that produced it; no partial record
/// is ever returned alongside an error.
///
/// # Examples
/// ```
/// use metscan_core::DecodeError;
///
/// let err = DecodeError::FieldMismatch {
///     expected: "FREQUENCY",
///     found: "FREQ 55.0".to_string(),
/// };
/// assert!(err.to_string().contains("expected header field FREQUENCY"));
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEndOfInput { context: &'static str },
    #[error("expected header field {expected}, got line {found:?}")]
    FieldMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("invalid value for {field}: {value:?} ({reason})")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        #[source]
        reason: ValueError,
    },
    #[error("expected section line {expected:?}, got {found:?}")]
    UnexpectedSection {
        expected: &'static str,
        found: String,
    },
    #[error("record line too short: need {needed} tokens, got {got}")]
    InsufficientTokens { needed: usize, got: usize },
    #[error("truncated {section} block: need {expected_bytes} bytes, got {got_bytes}")]
    TruncatedBinarySection {
        section: &'static str,
        expected_bytes: usize,
        got_bytes: usize,
    },
    #[error("invalid separator before {position}: expected \"{expected}\", found \"{found}\"")]
    InvalidSeparator {
        position: &'static str,
        expected: String,
        found: String,
    },
    #[error("header field {field} missing after header block")]
    MissingHeaderField { field: &'static str },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single typed value parser.
///
/// Surfaced only as the source of [`DecodeError::InvalidFieldValue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("not an integer: {0:?}")]
    NotInteger(String),
    #[error("not a number: {0:?}")]
    NotNumber(String),
    #[error("expected {expected} values, got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("expected exactly one '{separator}' separator")]
    Separator { separator: char },
    #[error("invalid date/time: {0}")]
    DateTime(String),
    #[error("value out of range: {0}")]
    OutOfRange(String),
}
