//! Stack-item encoding of ABI values
//!
//! Each field becomes exactly one [`TupleItem`] (none for `void`), and a
//! nested struct becomes a nested tuple. Unlike the cell codec there is no
//! bit packing and no size limit: integers of every width travel as one
//! integer item, and `bits`/`slice` values as slice items.
//!
//! Typed cell references are still produced by the cell codec, so a
//! `Cell<Point>` field is the same cell in both encodings.

use num_bigint::BigInt;
use tracing::{debug, trace};

use super::cell::{read_typed_cell, write_typed_cell};
use super::{
    check_present, expect_bool, expect_int, expect_nat, expect_nested, field_value, mismatch,
    CodecError, CodecResult, Scope,
};
use crate::error::BoundsError;
use crate::schema::{ContractAbi, TypeAbi, TypeInfo};
use crate::tuple::{TupleBuilder, TupleItem, TupleReader};
use crate::value::{NestedObject, ParsedObject, ParsedValue};

/// Encodes `obj` as an instance of `ty` into a flat list of stack items.
///
/// The struct's own fields are the top-level items; the opcode, if any, is
/// not part of the tuple form.
pub fn encode_tuple(
    abi: &ContractAbi,
    ty: &TypeAbi,
    obj: &ParsedObject,
) -> CodecResult<Vec<TupleItem>> {
    debug!(r#type = %ty.name, fields = ty.fields.len(), "encoding tuple");
    let mut b = TupleBuilder::new();
    write_struct(Scope::new(abi), &mut b, ty, obj)?;
    Ok(b.build())
}

/// Decodes an instance of `ty` from the front of `reader`
pub fn parse_tuple(
    abi: &ContractAbi,
    ty: &TypeAbi,
    reader: &mut TupleReader,
) -> CodecResult<ParsedObject> {
    debug!(r#type = %ty.name, fields = ty.fields.len(), "decoding tuple");
    read_struct(Scope::new(abi), reader, ty)
}

fn write_struct(
    scope: Scope<'_>,
    b: &mut TupleBuilder,
    ty: &TypeAbi,
    obj: &ParsedObject,
) -> CodecResult<()> {
    check_present(ty, obj)?;
    for field in &ty.fields {
        trace!(field = %field.name, r#type = %field.ty, "encoding item");
        let value = field_value(obj, &field.name)?;
        write_value(scope, b, &field.ty, value)
            .map_err(|e| e.in_field(&field.name, &field.ty))?;
    }
    Ok(())
}

pub(crate) fn write_value(
    scope: Scope<'_>,
    b: &mut TupleBuilder,
    ty: &TypeInfo,
    value: &ParsedValue,
) -> CodecResult<()> {
    match ty {
        TypeInfo::Optional { inner } => match value {
            ParsedValue::Null => b.write_null(),
            _ => write_value(scope, b, inner, value)?,
        },
        TypeInfo::TypeAlias { inner, .. } => write_value(scope, b, inner, value)?,
        TypeInfo::Int { .. } | TypeInfo::Varint16 | TypeInfo::Varint32 => {
            b.write_int(expect_int(ty, value)?.clone());
        }
        TypeInfo::Uint { .. } | TypeInfo::Coins | TypeInfo::Varuint16 | TypeInfo::Varuint32 => {
            b.write_int(BigInt::from(expect_nat(ty, value)?));
        }
        TypeInfo::Bool => b.write_bool(expect_bool(ty, value)?),
        // an explicit `none` address is a `00` slice, only a missing one is null
        TypeInfo::Address => match value {
            ParsedValue::Null => b.write_null(),
            other => {
                let addr = other
                    .as_address()
                    .ok_or_else(|| mismatch(ty, "address", other))?;
                b.write_address(&addr)?;
            }
        },
        TypeInfo::Bits { .. } | TypeInfo::Slice => match value {
            ParsedValue::Slice(span) => b.write_slice(span.clone()),
            other => return Err(mismatch(ty, "slice", other)),
        },
        TypeInfo::Cell { inner } => match (value, inner) {
            (ParsedValue::Cell(c), _) => b.write_cell(c.clone()),
            (ParsedValue::Nested(_), Some(inner)) => {
                let body = expect_nested(ty, value)?;
                b.write_cell(write_typed_cell(scope, inner, body)?);
            }
            (other, _) => return Err(mismatch(ty, "cell", other)),
        },
        TypeInfo::Struct { name } => {
            let body = expect_nested(ty, value)?;
            let def = scope.lookup(name)?;
            let mut inner = TupleBuilder::new();
            write_struct(scope.descend()?, &mut inner, def, body)?;
            b.write_tuple(inner.build())?;
        }
        TypeInfo::AnonStruct { .. } => return Err(CodecError::Unsupported(ty.human_readable())),
        TypeInfo::Void => {}
    }
    Ok(())
}

fn read_struct(scope: Scope<'_>, r: &mut TupleReader, ty: &TypeAbi) -> CodecResult<ParsedObject> {
    let mut ret = ParsedObject::new();
    for field in &ty.fields {
        trace!(field = %field.name, r#type = %field.ty, "decoding item");
        let value = read_value(scope, r, &field.ty)
            .map_err(|e| e.in_field(&field.name, &field.ty))?;
        ret.insert(field.name.as_str(), value);
    }
    Ok(ret)
}

pub(crate) fn read_value(
    scope: Scope<'_>,
    r: &mut TupleReader,
    ty: &TypeInfo,
) -> CodecResult<ParsedValue> {
    Ok(match ty {
        TypeInfo::Optional { inner } => match r.peek() {
            Some(TupleItem::Null) => {
                r.pop()?;
                ParsedValue::Null
            }
            _ => read_value(scope, r, inner)?,
        },
        TypeInfo::TypeAlias { inner, .. } => read_value(scope, r, inner)?,
        TypeInfo::Int { .. } | TypeInfo::Varint16 | TypeInfo::Varint32 => {
            ParsedValue::Int(r.read_int()?)
        }
        TypeInfo::Uint { .. } | TypeInfo::Coins | TypeInfo::Varuint16 | TypeInfo::Varuint32 => {
            let val = r.read_int()?;
            if val.sign() == num_bigint::Sign::Minus {
                return Err(BoundsError::IllegalNegative { val }.into());
            }
            ParsedValue::Int(val)
        }
        TypeInfo::Bool => ParsedValue::Bool(r.read_bool()?),
        TypeInfo::Address => r.read_address()?.into(),
        TypeInfo::Bits { .. } | TypeInfo::Slice => ParsedValue::Slice(r.read_cell()?),
        TypeInfo::Cell { inner: None } => ParsedValue::Cell(r.read_cell()?),
        TypeInfo::Cell { inner: Some(inner) } => {
            let cell = r.read_cell()?;
            let body = read_typed_cell(scope, inner, &cell)?;
            ParsedValue::Nested(NestedObject::new(ty.human_readable(), body))
        }
        TypeInfo::Struct { name } => {
            let def = scope.lookup(name)?;
            let mut inner = r.read_tuple()?;
            let body = read_struct(scope.descend()?, &mut inner, def)?;
            ParsedValue::Nested(NestedObject::new(name.as_str(), body))
        }
        TypeInfo::AnonStruct { .. } | TypeInfo::Void => {
            return Err(CodecError::Unsupported(ty.human_readable()))
        }
    })
}
