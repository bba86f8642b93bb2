//! Bit-packed cell encoding of ABI values
//!
//! Fields are written into a single [`CellBuilder`] in declaration order,
//! after the struct's opcode if it declares one. Nested structs are inlined
//! into the same builder, opcode included; only typed and untyped cell
//! references start a new cell. The reader mirrors the writer exactly.
//!
//! A typed cell reference decodes to a [`NestedObject`] named after the
//! reference type (`"Cell<Point>"`), whose body is either the fields of the
//! referenced struct or, for any other inner type, a single field named
//! [`value`](super::ANON_FIELD).

use num_bigint::BigUint;
use tracing::{debug, trace};

use super::{
    anon_field, check_layout, check_present, expect_bool, expect_int, expect_nat,
    expect_nested, field_value, mismatch, CodecError, CodecResult, Scope, ANON_FIELD,
};

use crate::address::AnyAddress;
use crate::cell::{ops, Cell, CellBuilder, CellSlice};
use crate::schema::{ContractAbi, TypeAbi, TypeInfo};
use crate::value::{NestedObject, ParsedObject, ParsedValue};
use crate::varint::{LEN_BITS_16, LEN_BITS_32};

/// Encodes `obj` as an instance of `ty` into a new cell.
///
/// # Errors
///
/// Fails with [`MissingField`](CodecError::MissingField) before anything is
/// written if any declared field is absent or undefined, and otherwise with
/// the first field-level failure, wrapped with the field's name and type.
pub fn encode_data(abi: &ContractAbi, ty: &TypeAbi, obj: &ParsedObject) -> CodecResult<Cell> {
    debug!(r#type = %ty.name, fields = ty.fields.len(), "encoding cell");
    let mut b = CellBuilder::new();
    write_struct(Scope::new(abi), &mut b, ty, obj)?;
    Ok(ops::finish(b)?)
}

/// Decodes an instance of `ty` from the current position of `s`.
///
/// The declared opcode, if any, is checked and omitted from the result.
pub fn parse_data(
    abi: &ContractAbi,
    ty: &TypeAbi,
    s: &mut CellSlice<'_>,
) -> CodecResult<ParsedObject> {
    debug!(r#type = %ty.name, fields = ty.fields.len(), "decoding cell");
    let ret = read_struct(Scope::new(abi), s, ty)?;
    finish(s)?;
    Ok(ret)
}

/// Decodes an instance of `ty` from the whole of `cell`
pub fn parse_cell(abi: &ContractAbi, ty: &TypeAbi, cell: &Cell) -> CodecResult<ParsedObject> {
    parse_data(abi, ty, &mut ops::open(cell.as_ref())?)
}

/// Encodes the body of a typed cell reference whose inner type is `inner`
pub fn encode_typed_cell(
    abi: &ContractAbi,
    inner: &TypeInfo,
    body: &ParsedObject,
) -> CodecResult<Cell> {
    write_typed_cell(Scope::new(abi), inner, body)
}

/// Decodes the body of a typed cell reference whose inner type is `inner`
pub fn parse_typed_cell(
    abi: &ContractAbi,
    inner: &TypeInfo,
    cell: &Cell,
) -> CodecResult<ParsedObject> {
    read_typed_cell(Scope::new(abi), inner, cell)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "check_complete_parse")] {
        fn finish(s: &CellSlice<'_>) -> CodecResult<()> {
            if ops::is_exhausted(s) {
                Ok(())
            } else {
                Err(CodecError::TrailingData {
                    bits: usize::from(s.size_bits()),
                    refs: usize::from(s.size_refs()),
                })
            }
        }
    } else {
        #[inline(always)]
        fn finish(_: &CellSlice<'_>) -> CodecResult<()> {
            Ok(())
        }
    }
}

pub(crate) fn write_struct(
    scope: Scope<'_>,
    b: &mut CellBuilder,
    ty: &TypeAbi,
    obj: &ParsedObject,
) -> CodecResult<()> {
    check_layout(ty)?;
    check_present(ty, obj)?;
    if let Some((opcode, width)) = ty.opcode() {
        ops::store_big_uint(b, &BigUint::from(opcode), width)?;
    }
    for field in &ty.fields {
        trace!(field = %field.name, r#type = %field.ty, "encoding field");
        let value = field_value(obj, &field.name)?;
        write_value(scope, b, &field.ty, value)
            .map_err(|e| e.in_field(&field.name, &field.ty))?;
    }
    Ok(())
}

fn write_value(
    scope: Scope<'_>,
    b: &mut CellBuilder,
    ty: &TypeInfo,
    value: &ParsedValue,
) -> CodecResult<()> {
    match ty {
        TypeInfo::Optional { inner } => {
            ops::ensure_capacity(b, 1, 0)?;
            if let ParsedValue::Null = value {
                b.store_bit_zero()?;
            } else {
                b.store_bit_one()?;
                write_value(scope, b, inner, value)?;
            }
        }
        TypeInfo::TypeAlias { inner, .. } => write_value(scope, b, inner, value)?,
        TypeInfo::Int { width } => {
            ops::store_big_int(b, expect_int(ty, value)?, *width)?;
        }
        TypeInfo::Uint { width } => {
            ops::store_big_uint(b, &expect_nat(ty, value)?, *width)?;
        }
        TypeInfo::Coins | TypeInfo::Varuint16 => {
            ops::store_var_uint(b, &expect_nat(ty, value)?, LEN_BITS_16)?;
        }
        TypeInfo::Varuint32 => {
            ops::store_var_uint(b, &expect_nat(ty, value)?, LEN_BITS_32)?;
        }
        TypeInfo::Varint16 => {
            ops::store_var_int(b, expect_int(ty, value)?, LEN_BITS_16)?;
        }
        TypeInfo::Varint32 => {
            ops::store_var_int(b, expect_int(ty, value)?, LEN_BITS_32)?;
        }
        TypeInfo::Bool => {
            ops::ensure_capacity(b, 1, 0)?;
            b.store_bit(expect_bool(ty, value)?)?;
        }
        TypeInfo::Address => {
            let addr = match value {
                ParsedValue::Null => AnyAddress::None,
                other => other
                    .as_address()
                    .ok_or_else(|| mismatch(ty, "address", other))?,
            };
            addr.store_into(b)?;
        }
        TypeInfo::Bits { width } => match value {
            ParsedValue::Slice(span)
                if usize::from(span.bit_len()) == *width && span.reference_count() == 0 =>
            {
                ops::store_contents(b, span.as_ref())?;
            }
            ParsedValue::Slice(span) => {
                return Err(CodecError::BitsSpan {
                    width: *width,
                    bits: usize::from(span.bit_len()),
                    refs: usize::from(span.reference_count()),
                })
            }
            other => return Err(mismatch(ty, "slice", other)),
        },
        TypeInfo::Cell { inner } => match (value, inner) {
            (ParsedValue::Cell(c), _) => {
                ops::ensure_capacity(b, 0, 1)?;
                b.store_reference(c.clone())?;
            }
            (ParsedValue::Nested(_), Some(inner)) => {
                let body = expect_nested(ty, value)?;
                let child = write_typed_cell(scope, inner, body)?;
                ops::ensure_capacity(b, 0, 1)?;
                b.store_reference(child)?;
            }
            (other, _) => return Err(mismatch(ty, "cell", other)),
        },
        TypeInfo::Slice => match value {
            ParsedValue::Slice(span) => {
                ops::store_contents(b, span.as_ref())?;
            }
            other => return Err(mismatch(ty, "slice", other)),
        },
        TypeInfo::Struct { name } => {
            let body = expect_nested(ty, value)?;
            let def = scope.lookup(name)?;
            write_struct(scope.descend()?, b, def, body)?;
        }
        TypeInfo::AnonStruct { .. } => return Err(CodecError::Unsupported(ty.human_readable())),
        TypeInfo::Void => {}
    }
    Ok(())
}

pub(crate) fn write_typed_cell(
    scope: Scope<'_>,
    inner: &TypeInfo,
    body: &ParsedObject,
) -> CodecResult<Cell> {
    let mut b = CellBuilder::new();
    match inner {
        TypeInfo::Struct { name } => {
            let def = scope.lookup(name)?;
            write_struct(scope.descend()?, &mut b, def, body)?;
        }
        TypeInfo::TypeAlias { inner, .. } => return write_typed_cell(scope, inner, body),
        TypeInfo::AnonStruct { fields } => {
            let field_ty = anon_field(inner, fields)?;
            write_anon(scope, &mut b, &field_ty, body)?;
        }
        other => write_anon(scope, &mut b, other, body)?,
    }
    Ok(ops::finish(b)?)
}

fn write_anon(
    scope: Scope<'_>,
    b: &mut CellBuilder,
    ty: &TypeInfo,
    body: &ParsedObject,
) -> CodecResult<()> {
    let value = field_value(body, ANON_FIELD)?;
    write_value(scope, b, ty, value).map_err(|e| e.in_field(ANON_FIELD, ty))
}

pub(crate) fn read_struct(
    scope: Scope<'_>,
    s: &mut CellSlice<'_>,
    ty: &TypeAbi,
) -> CodecResult<ParsedObject> {
    check_layout(ty)?;
    if let Some((expected, width)) = ty.opcode() {
        let actual = ops::preload_uint(s, width)?;
        if actual != expected {
            return Err(CodecError::OpcodeMismatch {
                ty: ty.name.clone(),
                expected,
                actual,
            });
        }
        ops::skip_bits(s, width)?;
    }
    let mut ret = ParsedObject::new();
    for field in &ty.fields {
        trace!(field = %field.name, r#type = %field.ty, "decoding field");
        let value = read_value(scope, s, &field.ty)
            .map_err(|e| e.in_field(&field.name, &field.ty))?;
        ret.insert(field.name.as_str(), value);
    }
    Ok(ret)
}

fn read_value(scope: Scope<'_>, s: &mut CellSlice<'_>, ty: &TypeInfo) -> CodecResult<ParsedValue> {
    Ok(match ty {
        TypeInfo::Optional { inner } => {
            if s.load_bit()? {
                read_value(scope, s, inner)?
            } else {
                ParsedValue::Null
            }
        }
        TypeInfo::TypeAlias { inner, .. } => read_value(scope, s, inner)?,
        TypeInfo::Int { width } => ParsedValue::Int(ops::load_big_int(s, *width)?),
        TypeInfo::Uint { width } => ParsedValue::Int(ops::load_big_uint(s, *width)?.into()),
        TypeInfo::Coins | TypeInfo::Varuint16 => {
            ParsedValue::Int(ops::load_var_uint(s, LEN_BITS_16)?.into())
        }
        TypeInfo::Varuint32 => ParsedValue::Int(ops::load_var_uint(s, LEN_BITS_32)?.into()),
        TypeInfo::Varint16 => ParsedValue::Int(ops::load_var_int(s, LEN_BITS_16)?),
        TypeInfo::Varint32 => ParsedValue::Int(ops::load_var_int(s, LEN_BITS_32)?),
        TypeInfo::Bool => ParsedValue::Bool(s.load_bit()?),
        TypeInfo::Address => AnyAddress::load_from(s)?.into(),
        TypeInfo::Bits { width } => ParsedValue::Slice(ops::load_span(s, *width)?),
        TypeInfo::Cell { inner: None } => ParsedValue::Cell(ops::load_reference(s)?),
        TypeInfo::Cell { inner: Some(inner) } => {
            let child = ops::load_reference(s)?;
            let body = read_typed_cell(scope, inner, &child)?;
            ParsedValue::Nested(NestedObject::new(ty.human_readable(), body))
        }
        TypeInfo::Slice => ParsedValue::Slice(ops::load_rest(s)?),
        TypeInfo::Struct { name } => {
            let def = scope.lookup(name)?;
            let body = read_struct(scope.descend()?, s, def)?;
            ParsedValue::Nested(NestedObject::new(name.as_str(), body))
        }
        TypeInfo::AnonStruct { .. } | TypeInfo::Void => {
            return Err(CodecError::Unsupported(ty.human_readable()))
        }
    })
}

pub(crate) fn read_typed_cell(
    scope: Scope<'_>,
    inner: &TypeInfo,
    cell: &Cell,
) -> CodecResult<ParsedObject> {
    let mut s = ops::open(cell.as_ref())?;
    let ret = match inner {
        TypeInfo::Struct { name } => {
            let def = scope.lookup(name)?;
            read_struct(scope.descend()?, &mut s, def)?
        }
        TypeInfo::TypeAlias { inner, .. } => return read_typed_cell(scope, inner, cell),
        TypeInfo::AnonStruct { fields } => {
            let field_ty = anon_field(inner, fields)?;
            read_anon(scope, &mut s, &field_ty)?
        }
        other => read_anon(scope, &mut s, other)?,
    };
    finish(&s)?;
    Ok(ret)
}

fn read_anon(scope: Scope<'_>, s: &mut CellSlice<'_>, ty: &TypeInfo) -> CodecResult<ParsedObject> {
    let value = read_value(scope, s, ty).map_err(|e| e.in_field(ANON_FIELD, ty))?;
    Ok(ParsedObject::new().with(ANON_FIELD, value))
}
