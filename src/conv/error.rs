//! Errors raised by the schema-directed codecs
//!
//! Every failure of [`encode_data`](crate::conv::cell::encode_data),
//! [`parse_data`](crate::conv::cell::parse_data) and their tuple
//! counterparts is a [`CodecError`]. Failures that occur while processing a
//! particular field are wrapped in [`CodecError::Field`], naming the field and
//! its type; as the error propagates out of nested structs, each level adds
//! its own wrapper, so that the chain of wrappers spells out the path to the
//! field at fault.
//!
//! [`CodecError::kind`] classifies the root cause into one of a small, stable
//! set of [`ErrorKind`]s, and [`CodecError::field_path`] recovers the path.

use thiserror::Error;

use crate::address::AddressError;
use crate::error::{BoundsError, CellError};
use crate::tuple::TupleError;

/// Coarse classification of a [`CodecError`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Field declared in the schema was absent from the input
    MissingField,
    /// Value or item of the wrong shape for the declared type
    TypeMismatch,
    /// Value not representable in the declared width, or a cell overflowed
    OutOfRange,
    /// Struct name not defined in the ABI
    UnknownStruct,
    /// Declared opcode did not match the input
    OpcodeMismatch,
    /// Input ran out before the schema was satisfied
    Truncated,
    /// Type that cannot be encoded or decoded in this position
    UnsupportedType,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MissingField => "missing field",
            Self::TypeMismatch => "type mismatch",
            Self::OutOfRange => "out of range",
            Self::UnknownStruct => "unknown struct",
            Self::OpcodeMismatch => "opcode mismatch",
            Self::Truncated => "truncated input",
            Self::UnsupportedType => "unsupported type",
        };
        f.write_str(name)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error("missing field '{0}' in data")]
    MissingField(String),
    #[error("expected {expected} for type '{ty}', got {found}")]
    TypeMismatch {
        ty: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    #[error("expected exactly {width} bits for bits{width}, got {bits} bits and {refs} references")]
    BitsSpan {
        width: usize,
        bits: usize,
        refs: usize,
    },
    #[error("struct type '{0}' not found in ABI")]
    UnknownStruct(String),
    #[error("opcode mismatch for '{ty}': expected {expected:#x}, got {actual:#x}")]
    OpcodeMismatch {
        ty: String,
        expected: u64,
        actual: u64,
    },
    #[error("no message matches body prefix {prefix:#x}")]
    UnknownMessage { prefix: u64 },
    #[error("cell capacity exceeded: {0}")]
    Capacity(#[source] CellError),
    #[error("unexpected end of cell: {0}")]
    Truncated(#[source] CellError),
    #[error("no more tuple items")]
    TupleExhausted,
    #[error("expected {expected} tuple item, got {found}")]
    UnexpectedItem {
        expected: &'static str,
        found: &'static str,
    },
    #[error("cannot process values of type '{0}'")]
    Unsupported(String),
    #[error("field '{0}' consumes the remainder of the cell and must be the last field")]
    MisplacedSlice(String),
    #[error("struct nesting deeper than {0} levels")]
    RecursionLimit(usize),
    #[error("invalid address: {0}")]
    Address(#[source] AddressError),
    #[error("{bits} bits and {refs} references left over after the last field")]
    TrailingData { bits: usize, refs: usize },
    #[error("invalid tuple: {0}")]
    Tuple(#[source] TupleError),
    #[error("field '{name}' of type '{ty}': {source}")]
    Field {
        name: String,
        ty: String,
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Wraps `self` with the name and type of the field being processed
    #[must_use]
    pub fn in_field(self, name: &str, ty: &crate::schema::TypeInfo) -> Self {
        Self::Field {
            name: name.to_owned(),
            ty: ty.human_readable(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, beneath all field wrappers
    #[must_use]
    pub fn root_cause(&self) -> &CodecError {
        match self {
            Self::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Names of the fields enclosing the failure, outermost first
    #[must_use]
    pub fn field_path(&self) -> Vec<&str> {
        let mut ret = Vec::new();
        let mut cur = self;
        while let Self::Field { name, source, .. } = cur {
            ret.push(name.as_str());
            cur = source;
        }
        ret
    }

    /// Classifies the root cause of the error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Field { source, .. } => source.kind(),
            Self::MissingField(_) => ErrorKind::MissingField,
            Self::TypeMismatch { .. }
            | Self::BitsSpan { .. }
            | Self::UnexpectedItem { .. }
            | Self::TrailingData { .. } => ErrorKind::TypeMismatch,
            Self::Bounds(_) | Self::Capacity(_) => ErrorKind::OutOfRange,
            Self::UnknownStruct(_) => ErrorKind::UnknownStruct,
            Self::OpcodeMismatch { .. } | Self::UnknownMessage { .. } => ErrorKind::OpcodeMismatch,
            Self::Truncated(_) | Self::TupleExhausted => ErrorKind::Truncated,
            Self::Unsupported(_) | Self::MisplacedSlice(_) | Self::RecursionLimit(_) => {
                ErrorKind::UnsupportedType
            }
            Self::Address(err) => match err {
                AddressError::Anycast => ErrorKind::UnsupportedType,
                AddressError::ExternalTooLong(_) => ErrorKind::OutOfRange,
                _ => ErrorKind::TypeMismatch,
            },
            Self::Tuple(err) => match err {
                TupleError::TooLong(_) => ErrorKind::OutOfRange,
                TupleError::UnsupportedTag(_) => ErrorKind::UnsupportedType,
                _ => ErrorKind::TypeMismatch,
            },
        }
    }
}

impl From<CellError> for CodecError {
    fn from(err: CellError) -> Self {
        match err {
            CellError::Bounds(b) => Self::Bounds(b),
            CellError::Exotic => Self::Unsupported("exotic cell".into()),
            e if e.is_overflow() => Self::Capacity(e),
            e => Self::Truncated(e),
        }
    }
}

impl From<everscale_types::error::Error> for CodecError {
    fn from(err: everscale_types::error::Error) -> Self {
        CellError::from(err).into()
    }
}

impl From<AddressError> for CodecError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::Cell(e) => e.into(),
            e => Self::Address(e),
        }
    }
}

impl From<TupleError> for CodecError {
    fn from(err: TupleError) -> Self {
        match err {
            TupleError::Exhausted => Self::TupleExhausted,
            TupleError::UnexpectedItem { expected, found } => {
                Self::UnexpectedItem { expected, found }
            }
            TupleError::Cell(e) => e.into(),
            TupleError::Address(e) => e.into(),
            e => Self::Tuple(e),
        }
    }
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::TypeInfo;

    fn dummy<T: Send + Sync>() {}

    #[test]
    fn codec_error_threadsafe() {
        dummy::<CodecError>()
    }

    #[test]
    fn breadcrumbs() {
        let err = CodecError::MissingField("y".into())
            .in_field("to", &TypeInfo::struct_ref("Point"))
            .in_field("body", &TypeInfo::cell_of(TypeInfo::struct_ref("Move")));
        assert_eq!(err.field_path(), ["body", "to"]);
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(
            err.to_string(),
            "field 'body' of type 'Cell<Move>': field 'to' of type 'Point': missing field 'y' in data"
        );
    }

    #[test]
    fn cell_errors_classified() {
        let overflow = CodecError::from(CellError::Overflow);
        assert_eq!(overflow.kind(), ErrorKind::OutOfRange);
        let underflow = CodecError::from(CellError::Underflow);
        assert_eq!(underflow.kind(), ErrorKind::Truncated);
        let addr = CodecError::from(AddressError::Cell(CellError::Underflow));
        assert_eq!(addr, underflow);
        assert_eq!(
            CodecError::from(everscale_types::error::Error::CellOverflow),
            overflow
        );
        assert_eq!(
            CodecError::from(CellError::Exotic).kind(),
            ErrorKind::UnsupportedType
        );
        assert_eq!(
            CodecError::from(AddressError::InvalidTag(3)).kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            CodecError::from(TupleError::Exhausted).kind(),
            ErrorKind::Truncated
        );
    }
}
