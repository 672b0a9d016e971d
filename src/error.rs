#![allow(non_local_definitions)] // false positive for displaydoc::Display, see yaahc/displaydoc#46

use alloc::boxed::Box;
use displaydoc::Display;
use thiserror::Error;

use crate::tag::Tag;

/// Diagnostic attached to an error as it unwinds: which function raised it,
/// and (when known) which named template type / field it was decoding.
///
/// This is the Rust stand-in for spec §6's external "error sink" collaborator
/// `(function-id, error-code, optional type-name, optional field-name)` —
/// instead of a callback, the information rides along on the error itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostic {
    pub function: &'static str,
    pub type_name: Option<&'static str>,
    pub field_name: Option<&'static str>,
}

impl Diagnostic {
    pub const fn new(function: &'static str) -> Self {
        Diagnostic {
            function,
            type_name: None,
            field_name: None,
        }
    }

    pub const fn with_type(mut self, type_name: &'static str) -> Self {
        self.type_name = Some(type_name);
        self
    }

    pub const fn with_field(mut self, field_name: &'static str) -> Self {
        self.field_name = Some(field_name);
        self
    }
}

/// Error kinds raised by the decoder, one variant per condition named in
/// spec §7. Each is raised at most once per decode call; nesting happens via
/// [`Error::Nested`], never by merging kinds.
#[derive(Clone, Debug, Display, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// malformed tag/length octets
    BadObjectHeader,
    /// mandatory tag did not match (expected {expected:?}, got {actual:?})
    WrongTag { expected: Option<Tag>, actual: Tag },
    /// no CHOICE alternative matched the input
    NoMatchingChoice,
    /// MSTRING header was not of universal class
    MStringNotUniversal,
    /// MSTRING tag is not among the accepted tags for this template
    MStringWrongTag,
    /// SEQUENCE/SET header was not constructed
    SequenceNotConstructed,
    /// EXPLICIT tag header was not constructed
    ExplicitTagNotConstructed,
    /// type requiring a constructed encoding was primitive
    TypeNotConstructed,
    /// SEQUENCE had trailing bytes after all fields were decoded
    SequenceLengthMismatch,
    /// EXPLICIT wrapper content did not consume exactly its declared length
    ExplicitLengthMismatch,
    /// a mandatory field was absent
    FieldMissing,
    /// indefinite-length body was not terminated by an EOC marker
    MissingEOC,
    /// EOC marker encountered where it was not expected
    UnexpectedEOC,
    /// NULL content was not empty
    NullIsWrongLength,
    /// BOOLEAN content was not exactly one octet
    BooleanIsWrongLength,
    /// NULL used where it is not a legal alternative
    IllegalNull,
    /// ANY used under an EXPLICIT/IMPLICIT tag override, which is not legal
    IllegalTaggedAny,
    /// ANY used as an OPTIONAL field, which is not legal
    IllegalOptionalAny,
    /// a pre/post decode auxiliary hook rejected the value
    AuxError,
    /// input ended before a value could be fully decoded
    UnexpectedEndOfInput,
    /// recursion depth limit exceeded (adversarial or malformed input)
    MaxDepthExceeded,
    /// INTEGER/ENUMERATED content too large for the requested representation
    IntegerTooLarge,
    /// OBJECT IDENTIFIER content was malformed
    InvalidObjectIdentifier,
    /// string content was not valid for its declared charset
    StringInvalidCharset,
    /// UTCTime/GeneralizedTime content was not a valid timestamp
    InvalidDateTime,
    /// allocation failure while building the value tree
    MallocFailure,
    /// indefinite length encountered where a definite length is required
    IndefiniteLengthUnexpected,
}

/// The error type returned by every decode operation in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A leaf error with no further nesting.
    Simple(ErrorKind),
    /// An error that occurred while decoding a named type/field, wrapping
    /// the error that caused it — spec §7's "wrapped in outer 'nested' codes
    /// as they propagate".
    Nested {
        diagnostic: Diagnostic,
        #[source]
        source: Box<Error>,
    },
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Simple(kind) => write!(f, "{kind}"),
            Error::Nested { diagnostic, source } => {
                write!(f, "{}", diagnostic.function)?;
                if let Some(t) = diagnostic.type_name {
                    write!(f, " (type {t})")?;
                }
                if let Some(n) = diagnostic.field_name {
                    write!(f, " (field {n})")?;
                }
                write!(f, ": {source}")
            }
        }
    }
}

impl Error {
    #[inline]
    pub fn simple(kind: ErrorKind) -> Self {
        Error::Simple(kind)
    }

    /// Wrap `self` as having happened while decoding `diagnostic`.
    pub fn nest(self, diagnostic: Diagnostic) -> Self {
        Error::Nested {
            diagnostic,
            source: Box::new(self),
        }
    }

    /// Innermost [`ErrorKind`], looking through any nesting.
    pub fn kind(&self) -> &ErrorKind {
        match self {
            Error::Simple(k) => k,
            Error::Nested { source, .. } => source.kind(),
        }
    }

    pub const fn unexpected_tag(expected: Option<Tag>, actual: Tag) -> Self {
        Error::Simple(ErrorKind::WrongTag { expected, actual })
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::Simple(kind)
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

/// A specialized `Result` type for all operations in this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_preserves_innermost_kind() {
        let e = Error::simple(ErrorKind::FieldMissing)
            .nest(Diagnostic::new("decode_sequence").with_type("Seq"));
        assert_eq!(e.kind(), &ErrorKind::FieldMissing);
        assert!(format!("{e}").contains("decode_sequence"));
    }
}
