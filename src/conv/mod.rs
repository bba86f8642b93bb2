//! Schema-directed conversion between values and their wire forms
//!
//! This module is the core of the crate. Given a [`ContractAbi`] and one of
//! its struct definitions, it converts a [`ParsedObject`] to and from the two
//! encodings the VM understands:
//!
//! * [`cell`]: the bit-packed tree-of-cells form used for storage, message
//!   bodies, and typed cell references, via [`encode_data`] and
//!   [`parse_data`];
//! * [`tuple`]: the flat list of stack items used for get-method parameters
//!   and results, via [`encode_tuple`] and [`parse_tuple`].
//!
//! Both walk the same [`TypeInfo`](crate::schema::TypeInfo) grammar in
//! declaration order and share struct resolution, nesting limits, and value
//! extraction through the helpers in this module. The sub-module
//! [`contract`] builds the message, storage, and get-method conveniences of
//! [`ContractAbi`] on top of both.
//!
//! # Errors
//!
//! All operations return [`CodecResult`]. Any failure within a field is
//! wrapped with that field's name and type before being propagated, so that
//! the error of a deeply nested field still identifies its full path; see
//! [`error`] for details.

use num_bigint::{BigInt, BigUint};

use crate::schema::{ContractAbi, TypeAbi, TypeInfo};
use crate::value::{NestedObject, ParsedObject, ParsedValue};

pub mod cell;
pub mod contract;
pub mod error;
pub mod tuple;

pub use self::cell::{encode_data, encode_typed_cell, parse_cell, parse_data, parse_typed_cell};
pub use self::error::{CodecError, CodecResult, ErrorKind};
pub use self::tuple::{encode_tuple, parse_tuple};

/// Maximum depth of nested struct references followed by either codec.
///
/// The ABI may describe recursive structs; any value satisfying such a
/// schema is finite, but a malformed input or a schema without a base case
/// would otherwise recurse without bound.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Struct resolution context carried through a single codec call
#[derive(Clone, Copy, Debug)]
pub(crate) struct Scope<'a> {
    abi: &'a ContractAbi,
    depth: usize,
}

impl<'a> Scope<'a> {
    pub(crate) const fn new(abi: &'a ContractAbi) -> Self {
        Self { abi, depth: 0 }
    }

    /// Resolves a struct definition by name
    pub(crate) fn lookup(&self, name: &str) -> CodecResult<&'a TypeAbi> {
        self.abi
            .find_type(name)
            .ok_or_else(|| CodecError::UnknownStruct(name.to_owned()))
    }

    /// Returns the scope for one further level of struct nesting
    pub(crate) fn descend(self) -> CodecResult<Self> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(CodecError::RecursionLimit(MAX_NESTING_DEPTH));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }
}

/// Returns the defined value of `name` in `obj`, or [`CodecError::MissingField`]
pub(crate) fn field_value<'o>(obj: &'o ParsedObject, name: &str) -> CodecResult<&'o ParsedValue> {
    obj.get(name)
        .ok_or_else(|| CodecError::MissingField(name.to_owned()))
}

/// Checks that every declared field is present and defined
pub(crate) fn check_present(ty: &TypeAbi, obj: &ParsedObject) -> CodecResult<()> {
    ty.fields
        .iter()
        .try_for_each(|f| field_value(obj, &f.name).map(|_| ()))
}

/// Rejects struct layouts in which a remainder-consuming field is followed
/// by further fields
pub(crate) fn check_layout(ty: &TypeAbi) -> CodecResult<()> {
    match ty.fields.split_last() {
        None => Ok(()),
        Some((_, init)) => match init.iter().find(|f| f.ty.is_slice_like()) {
            Some(f) => Err(CodecError::MisplacedSlice(f.name.clone())),
            None => Ok(()),
        },
    }
}

pub(crate) fn mismatch(ty: &TypeInfo, expected: &'static str, found: &ParsedValue) -> CodecError {
    CodecError::TypeMismatch {
        ty: ty.human_readable(),
        expected,
        found: found.kind_name(),
    }
}

pub(crate) fn expect_int<'v>(ty: &TypeInfo, value: &'v ParsedValue) -> CodecResult<&'v BigInt> {
    match value {
        ParsedValue::Int(i) => Ok(i),
        other => Err(mismatch(ty, "integer", other)),
    }
}

/// Extracts a non-negative integer for the unsigned kinds
pub(crate) fn expect_nat(ty: &TypeInfo, value: &ParsedValue) -> CodecResult<BigUint> {
    let i = expect_int(ty, value)?;
    i.to_biguint().ok_or_else(|| {
        CodecError::Bounds(crate::error::BoundsError::IllegalNegative { val: i.clone() })
    })
}

pub(crate) fn expect_bool(ty: &TypeInfo, value: &ParsedValue) -> CodecResult<bool> {
    match value {
        ParsedValue::Bool(b) => Ok(*b),
        other => Err(mismatch(ty, "boolean", other)),
    }
}

/// Extracts the body of a nested object
pub(crate) fn expect_nested<'v>(
    ty: &TypeInfo,
    value: &'v ParsedValue,
) -> CodecResult<&'v ParsedObject> {
    match value {
        ParsedValue::Nested(NestedObject {
            value: Some(body), ..
        }) => Ok(body),
        other => Err(mismatch(ty, "nested object", other)),
    }
}

/// Name given to the synthetic field of an anonymous typed-cell body
pub const ANON_FIELD: &str = "value";

/// Returns the single field type of an anonymous body
pub(crate) fn anon_field(ty: &TypeInfo, fields: &[TypeInfo]) -> CodecResult<TypeInfo> {
    match fields {
        [only] => Ok(only.clone()),
        _ => Err(CodecError::Unsupported(ty.human_readable())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Field;

    #[test]
    fn nesting_is_bounded() {
        let abi = ContractAbi::default();
        let mut scope = Scope::new(&abi);
        for _ in 0..MAX_NESTING_DEPTH {
            scope = scope.descend().unwrap();
        }
        assert_eq!(
            scope.descend().unwrap_err(),
            CodecError::RecursionLimit(MAX_NESTING_DEPTH)
        );
    }

    #[test]
    fn slice_must_be_last() {
        let ok = TypeAbi::new(
            "Tail",
            vec![
                Field::new("a", TypeInfo::uint(8)),
                Field::new("rest", TypeInfo::optional(TypeInfo::Slice)),
            ],
        );
        assert!(check_layout(&ok).is_ok());
        let bad = TypeAbi::new(
            "Bad",
            vec![
                Field::new("rest", TypeInfo::alias("Rest", TypeInfo::Slice)),
                Field::new("a", TypeInfo::uint(8)),
            ],
        );
        assert_eq!(
            check_layout(&bad).unwrap_err(),
            CodecError::MisplacedSlice("rest".into())
        );
    }

    #[test]
    fn missing_versus_null() {
        let ty = TypeAbi::new("P", vec![Field::new("x", TypeInfo::optional(TypeInfo::Bool))]);
        let mut obj = ParsedObject::new();
        obj.set("x", None);
        assert_eq!(
            check_present(&ty, &obj).unwrap_err().kind(),
            ErrorKind::MissingField
        );
        obj.insert("x", ParsedValue::Null);
        assert!(check_present(&ty, &obj).is_ok());
    }
}
