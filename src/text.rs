//! Human-facing text forms of values
//!
//! Front-ends collect field values as strings keyed by dotted path, and show
//! decoded objects back to the user. [`parse_field_value`] reads one such
//! string according to the field's declared type, [`parse_raw_object`]
//! assembles a whole nested object from dotted entries, and the
//! [`Display`](std::fmt::Display) impls of [`ParsedValue`] and
//! [`ParsedObject`] render values in a form those parsers accept. Coin
//! amounts are entered in whole coins, so rendering one for re-entry goes
//! through [`format_field_value`], which knows the field's type.

use std::fmt::{Display, Formatter, Write as _};
use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::{Num, Zero};
use thiserror::Error;

use crate::address::{AddressError, ExternalAddress, StdAddress};
use crate::boc::{self, BocError};
use crate::cell::{ops, parse_literal, to_literal, Cell, CellBuilder, LiteralError};
use crate::error::CellError;
use crate::path::{self, PathError};
use crate::schema::TypeInfo;
use crate::value::{ParsedObject, ParsedValue};

/// Number of decimal places in a whole coin
pub const COIN_DECIMALS: usize = 9;

const INDENT: &str = "    ";

#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[non_exhaustive]
pub enum TextError {
    #[error("invalid integer literal {0:?}")]
    Int(String),
    #[error("invalid coin amount {0:?}")]
    Coins(String),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error("invalid '{ty}' literal {raw:?}")]
    Literal { ty: String, raw: String },
    #[error(transparent)]
    Bits(#[from] LiteralError),
    #[error(transparent)]
    Boc(#[from] BocError),
    #[error(transparent)]
    Cell(#[from] CellError),
    #[error("values of type '{0}' cannot be entered as text")]
    Unsupported(String),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("field '{path}': {source}")]
    Field {
        path: String,
        source: Box<TextError>,
    },
}

pub type TextResult<T> = std::result::Result<T, TextError>;

/// Parses a decimal, `0x` hexadecimal, or `0b` binary integer, optionally
/// negative
pub fn parse_int(raw: &str) -> TextResult<BigInt> {
    let err = || TextError::Int(raw.to_owned());
    let (neg, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let prefixed = |lower: &str, upper: &str| {
        digits
            .strip_prefix(lower)
            .or_else(|| digits.strip_prefix(upper))
    };
    let (radix, digits) = if let Some(hex) = prefixed("0x", "0X") {
        (16, hex)
    } else if let Some(bin) = prefixed("0b", "0B") {
        (2, bin)
    } else {
        (10, digits)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(err());
    }
    let magnitude = BigInt::from_str_radix(digits, radix).map_err(|_| err())?;
    Ok(if neg { -magnitude } else { magnitude })
}

/// Converts a decimal amount of whole coins into its smallest unit.
///
/// `"1.5"` is `1_500_000_000`; at most [`COIN_DECIMALS`] fractional digits
/// are accepted.
pub fn parse_coins(raw: &str) -> TextResult<BigInt> {
    let err = || TextError::Coins(raw.to_owned());
    let (neg, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty())
        || !all_digits(whole)
        || !all_digits(frac)
        || frac.len() > COIN_DECIMALS
    {
        return Err(err());
    }
    let padded = format!("{whole}{frac:0<width$}", width = COIN_DECIMALS);
    let nano = BigInt::from_str(&padded).map_err(|_| err())?;
    Ok(if neg { -nano } else { nano })
}

/// Reads a bit-span literal into a reference-free or BoC-backed cell
fn parse_span(raw: &str, ty: &TypeInfo) -> TextResult<Cell> {
    if raw.starts_with("te6") {
        return Ok(boc::from_base64(raw)?);
    }
    if raw.starts_with("b5e") {
        return Ok(boc::from_hex(raw)?);
    }
    if (raw.starts_with("x{") || raw.starts_with("b{")) && raw.ends_with('}') {
        return Ok(parse_literal(raw)?);
    }
    if let Some(text) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        let bits = text.len() * 8;
        let mut b = CellBuilder::new();
        ops::ensure_capacity(&b, bits, 0)?;
        b.store_raw(text.as_bytes(), bits as u16)
            .map_err(CellError::from)?;
        return Ok(ops::finish(b)?);
    }
    Err(TextError::Literal {
        ty: ty.human_readable(),
        raw: raw.to_owned(),
    })
}

/// Parses user input for a field of type `ty`.
///
/// Surrounding whitespace is ignored, and blank input is
/// [`Null`](ParsedValue::Null) for every type.
pub fn parse_field_value(raw: &str, ty: &TypeInfo) -> TextResult<ParsedValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(ParsedValue::Null);
    }
    Ok(match ty {
        TypeInfo::Int { .. }
        | TypeInfo::Uint { .. }
        | TypeInfo::Varint16
        | TypeInfo::Varint32
        | TypeInfo::Varuint16
        | TypeInfo::Varuint32 => ParsedValue::Int(parse_int(raw)?),
        TypeInfo::Coins => ParsedValue::Int(parse_coins(raw)?),
        TypeInfo::Bool => ParsedValue::Bool(raw.eq_ignore_ascii_case("true")),
        TypeInfo::Address => match raw {
            "null" | "none" | "addr_none" => ParsedValue::AddressNone,
            _ if raw.starts_with("External<") => {
                ParsedValue::ExternalAddress(ExternalAddress::from_str(raw)?)
            }
            _ => ParsedValue::Address(StdAddress::from_str(raw)?),
        },
        TypeInfo::Bits { .. } | TypeInfo::Slice => ParsedValue::Slice(parse_span(raw, ty)?),
        TypeInfo::Cell { .. } => ParsedValue::Cell(parse_span(raw, ty)?),
        TypeInfo::Optional { inner } => match raw {
            "null" => ParsedValue::Null,
            _ => parse_field_value(raw, inner)?,
        },
        TypeInfo::TypeAlias { inner, .. } => parse_field_value(raw, inner)?,
        TypeInfo::Struct { .. } | TypeInfo::AnonStruct { .. } | TypeInfo::Void => {
            return Err(TextError::Unsupported(ty.human_readable()))
        }
    })
}

/// Parses `(dotted path, type, raw text)` entries into a nested object
pub fn parse_raw_object<'a, I>(entries: I) -> TextResult<ParsedObject>
where
    I: IntoIterator<Item = (&'a str, &'a TypeInfo, &'a str)>,
{
    let mut flat = ParsedObject::new();
    for (key, ty, raw) in entries {
        let value = parse_field_value(raw, ty).map_err(|e| TextError::Field {
            path: key.to_owned(),
            source: Box::new(e),
        })?;
        flat.insert(key, value);
    }
    Ok(path::unflatten(&flat)?)
}

/// Renders a single value; [`Null`](ParsedValue::Null) renders as nothing
#[must_use]
pub fn format_value(value: &ParsedValue) -> String {
    value.to_string()
}

/// Renders a value of a field of type `ty` in the form
/// [`parse_field_value`] reads back.
///
/// Differs from [`format_value`] only for `coins`, which are shown as
/// whole coins rather than in the smallest unit.
#[must_use]
pub fn format_field_value(value: &ParsedValue, ty: &TypeInfo) -> String {
    match (ty, value) {
        (TypeInfo::Coins, ParsedValue::Int(nano)) => format_coins(nano),
        (TypeInfo::Optional { inner } | TypeInfo::TypeAlias { inner, .. }, _) => {
            format_field_value(value, inner)
        }
        _ => value.to_string(),
    }
}

/// Renders an object as an indented `{ key: value }` block
#[must_use]
pub fn format_object(obj: &ParsedObject) -> String {
    obj.to_string()
}

fn write_object(f: &mut Formatter<'_>, obj: &ParsedObject, depth: usize) -> std::fmt::Result {
    if obj.is_empty() {
        return f.write_str("{}");
    }
    f.write_str("{\n")?;
    let last = obj.len() - 1;
    for (ix, (key, value)) in obj.iter().enumerate() {
        write!(f, "{}{key}: ", INDENT.repeat(depth + 1))?;
        if let Some(value) = value {
            write_value(f, value, depth + 1)?;
        }
        f.write_str(if ix == last { "\n" } else { ",\n" })?;
    }
    write!(f, "{}}}", INDENT.repeat(depth))
}

fn write_value(f: &mut Formatter<'_>, value: &ParsedValue, depth: usize) -> std::fmt::Result {
    match value {
        ParsedValue::Int(i) => write!(f, "{i}"),
        ParsedValue::Bool(b) => write!(f, "{b}"),
        ParsedValue::Address(a) => write!(f, "{a}"),
        ParsedValue::ExternalAddress(e) => write!(f, "{e}"),
        ParsedValue::AddressNone => f.write_str("addr_none"),
        ParsedValue::Slice(c) => {
            // a reference-free span renders on one line
            if c.reference_count() == 0 {
                f.write_str(&to_literal(c.as_ref()))
            } else {
                f.write_str(&boc::to_base64(c))
            }
        }
        ParsedValue::Cell(c) => f.write_str(&boc::to_base64(c)),
        ParsedValue::Nested(n) => match &n.value {
            Some(body) => write_object(f, body, depth),
            None => f.write_str("{}"),
        },
        ParsedValue::Null => Ok(()),
    }
}

impl Display for ParsedValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_value(f, self, 0)
    }
}

impl Display for ParsedObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_object(f, self, 0)
    }
}

/// Renders an amount in the smallest unit as whole coins, trimming trailing
/// zeros from the fraction
#[must_use]
pub fn format_coins(nano: &BigInt) -> String {
    let neg = nano.sign() == num_bigint::Sign::Minus;
    let digits = nano.magnitude().to_string();
    let padded = format!("{digits:0>width$}", width = COIN_DECIMALS + 1);
    let (whole, frac) = padded.split_at(padded.len() - COIN_DECIMALS);
    let frac = frac.trim_end_matches('0');
    let mut out = String::with_capacity(padded.len() + 2);
    if neg && !nano.is_zero() {
        out.push('-');
    }
    out.push_str(whole);
    if !frac.is_empty() {
        let _ = write!(out, ".{frac}");
    }
    out
}
