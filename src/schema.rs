//! Contract ABI schema types
//!
//! A contract's ABI is produced by the compiler and describes, by name, every
//! struct that may appear in its storage, its incoming messages, and the
//! parameters and results of its get-methods. Each struct is a [`TypeAbi`]:
//! an optional opcode prefix followed by an ordered list of [`Field`]s,
//! whose types are given by the recursive [`TypeInfo`] grammar.
//!
//! Schemas are loaded once and never mutated; all codec operations in
//! [`conv`](crate::conv) borrow them immutably.
//!
//! # Struct references
//!
//! [`TypeInfo::Struct`] refers to another definition *by name*, to be looked
//! up in the owning [`ContractAbi`] at the time of encoding or decoding. The
//! schema types themselves perform no resolution, and an ABI may therefore
//! contain dangling or cyclic references; the codecs report the former as an
//! unknown struct, and bound the latter by a nesting limit.
//!
//! # Serialization
//!
//! With the `serde_impls` feature enabled, all types in this module implement
//! `serde::{Serialize, Deserialize}` in the JSON layout emitted by the
//! compiler, in which each type node is an object tagged by its `"name"`:
//!
//! ```json
//! { "name": "cell", "innerType": { "name": "struct", "structName": "Point" } }
//! ```
//!
//! Additional keys such as `"humanReadable"` are ignored on input; the same
//! rendering is available from [`TypeInfo::human_readable`].

use std::fmt::Display;
use std::str::FromStr;

#[cfg(feature = "serde_impls")]
use serde::{Deserialize, Serialize};

use crate::address::crc16;

/// Error produced when parsing a type from its human-readable form
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[error("cannot parse type expression {0:?}")]
pub struct TypeParseError(pub String);

/// Recursive description of the type of a single field
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde_impls",
    serde(tag = "name", rename_all = "kebab-case")
)]
pub enum TypeInfo {
    /// Signed two's complement integer of `width` bits
    Int { width: usize },
    /// Unsigned integer of `width` bits
    Uint { width: usize },
    /// Currency amount, stored as `varuint16`
    Coins,
    Bool,
    /// Standard, external, or absent address
    Address,
    /// Raw span of exactly `width` bits
    Bits { width: usize },
    /// Reference to a child cell, optionally typed by `inner`
    Cell {
        #[cfg_attr(
            feature = "serde_impls",
            serde(rename = "innerType", default, skip_serializing_if = "Option::is_none")
        )]
        inner: Option<Box<TypeInfo>>,
    },
    /// All remaining bits and references
    Slice,
    Varint16,
    Varint32,
    Varuint16,
    Varuint32,
    /// Presence bit, followed by `inner` when present
    #[cfg_attr(feature = "serde_impls", serde(rename = "option"))]
    Optional {
        #[cfg_attr(feature = "serde_impls", serde(rename = "innerType"))]
        inner: Box<TypeInfo>,
    },
    /// By-name reference to a struct definition
    Struct {
        #[cfg_attr(feature = "serde_impls", serde(rename = "structName"))]
        name: String,
    },
    /// Named alias, transparent to both codecs
    TypeAlias {
        #[cfg_attr(feature = "serde_impls", serde(rename = "aliasName"))]
        alias: String,
        #[cfg_attr(feature = "serde_impls", serde(rename = "innerType"))]
        inner: Box<TypeInfo>,
    },
    /// Single-field body synthesized for a typed cell whose inner type is not
    /// a named struct
    AnonStruct { fields: Vec<TypeInfo> },
    /// Zero-width type
    Void,
}

impl TypeInfo {
    #[must_use]
    pub const fn int(width: usize) -> Self {
        Self::Int { width }
    }

    #[must_use]
    pub const fn uint(width: usize) -> Self {
        Self::Uint { width }
    }

    #[must_use]
    pub const fn bits(width: usize) -> Self {
        Self::Bits { width }
    }

    /// Untyped cell reference
    #[must_use]
    pub const fn cell() -> Self {
        Self::Cell { inner: None }
    }

    /// Typed cell reference.
    ///
    /// Struct and alias-of-struct inner types are kept as-is; any other inner
    /// type is wrapped in a single-field [`AnonStruct`](Self::AnonStruct), as
    /// the compiler does.
    #[must_use]
    pub fn cell_of(inner: TypeInfo) -> Self {
        let inner = match inner {
            Self::Struct { .. } => inner,
            other => Self::AnonStruct {
                fields: vec![other],
            },
        };
        Self::Cell {
            inner: Some(Box::new(inner)),
        }
    }

    #[must_use]
    pub fn optional(inner: TypeInfo) -> Self {
        Self::Optional {
            inner: Box::new(inner),
        }
    }

    #[must_use]
    pub fn struct_ref(name: impl Into<String>) -> Self {
        Self::Struct { name: name.into() }
    }

    #[must_use]
    pub fn alias(alias: impl Into<String>, inner: TypeInfo) -> Self {
        Self::TypeAlias {
            alias: alias.into(),
            inner: Box::new(inner),
        }
    }

    /// Strips any number of [`TypeAlias`](Self::TypeAlias) layers
    #[must_use]
    pub fn resolve_alias(&self) -> &TypeInfo {
        let mut ty = self;
        while let Self::TypeAlias { inner, .. } = ty {
            ty = inner;
        }
        ty
    }

    /// Returns `true` if values of this type consume the remainder of a cell,
    /// looking through aliases and options.
    #[must_use]
    pub fn is_slice_like(&self) -> bool {
        match self.resolve_alias() {
            Self::Slice => true,
            Self::Optional { inner } => inner.is_slice_like(),
            _ => false,
        }
    }

    /// Returns `true` for the integer kinds that reject negative values
    #[must_use]
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::Uint { .. } | Self::Coins | Self::Varuint16 | Self::Varuint32
        )
    }

    /// Renders the type as it would be written in source
    #[must_use]
    pub fn human_readable(&self) -> String {
        match self {
            Self::Int { width } => format!("int{width}"),
            Self::Uint { width } => format!("uint{width}"),
            Self::Coins => "coins".into(),
            Self::Bool => "bool".into(),
            Self::Address => "address".into(),
            Self::Bits { width } => format!("bits{width}"),
            Self::Cell { inner: None } => "cell".into(),
            Self::Cell { inner: Some(inner) } => format!("Cell<{}>", inner.human_readable()),
            Self::Slice => "slice".into(),
            Self::Varint16 => "varint16".into(),
            Self::Varint32 => "varint32".into(),
            Self::Varuint16 => "varuint16".into(),
            Self::Varuint32 => "varuint32".into(),
            Self::Optional { inner } => format!("{}?", inner.human_readable()),
            Self::Struct { name } => name.clone(),
            Self::TypeAlias { alias, .. } => alias.clone(),
            Self::AnonStruct { fields } => match fields.first() {
                Some(ty) => ty.human_readable(),
                None => "void".into(),
            },
            Self::Void => "void".into(),
        }
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.human_readable())
    }
}

/// Parses the human-readable rendering back into a type.
///
/// Aliases cannot be recovered from their name alone, so any identifier
/// that is not a builtin is taken as a struct reference. `bytesN` is
/// accepted as a synonym for `bits(8N)`.
impl FromStr for TypeInfo {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || TypeParseError(s.to_owned());

        if let Some(inner) = s.strip_suffix('?') {
            return Ok(Self::optional(inner.parse()?));
        }
        if let Some(inner) = s.strip_prefix("Cell<").and_then(|r| r.strip_suffix('>')) {
            return Ok(Self::cell_of(inner.parse()?));
        }

        let width = |prefix: &str| -> Option<Result<usize, TypeParseError>> {
            let digits = s.strip_prefix(prefix)?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some(digits.parse::<usize>().map_err(|_| err()))
        };
        if let Some(w) = width("uint") {
            return Ok(Self::uint(w?));
        }
        if let Some(w) = width("int") {
            return Ok(Self::int(w?));
        }
        if let Some(w) = width("bits") {
            return Ok(Self::bits(w?));
        }
        if let Some(w) = width("bytes") {
            return Ok(Self::bits(w? * 8));
        }

        Ok(match s {
            "coins" => Self::Coins,
            "bool" => Self::Bool,
            "address" => Self::Address,
            "cell" => Self::cell(),
            "slice" => Self::Slice,
            "varint16" => Self::Varint16,
            "varint32" => Self::Varint32,
            "varuint16" => Self::Varuint16,
            "varuint32" => Self::Varuint32,
            "void" => Self::Void,
            ident
                if !ident.is_empty()
                    && ident
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
                    && !ident.starts_with(|c: char| c.is_ascii_digit()) =>
            {
                Self::struct_ref(ident)
            }
            _ => return Err(err()),
        })
    }
}

/// Named, typed member of a struct
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct Field {
    pub name: String,
    #[cfg_attr(feature = "serde_impls", serde(rename = "type"))]
    pub ty: TypeInfo,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeInfo) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Struct definition: an optional opcode prefix and ordered fields
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_impls", serde(rename_all = "camelCase"))]
pub struct TypeAbi {
    pub name: String,
    #[cfg_attr(feature = "serde_impls", serde(default))]
    pub opcode: Option<u64>,
    #[cfg_attr(feature = "serde_impls", serde(default))]
    pub opcode_width: Option<usize>,
    #[cfg_attr(feature = "serde_impls", serde(default))]
    pub fields: Vec<Field>,
}

impl TypeAbi {
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            opcode: None,
            opcode_width: None,
            fields,
        }
    }

    /// Attaches an opcode of `width` bits
    #[must_use]
    pub fn with_opcode(mut self, opcode: u64, width: usize) -> Self {
        self.opcode = Some(opcode);
        self.opcode_width = Some(width);
        self
    }

    /// Returns the opcode and its width, if both are declared
    #[must_use]
    pub fn opcode(&self) -> Option<(u64, usize)> {
        self.opcode.zip(self.opcode_width)
    }
}

/// Read-only method callable through the tuple encoding
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_impls", serde(rename_all = "camelCase"))]
pub struct GetMethod {
    pub name: String,
    pub id: u32,
    #[cfg_attr(feature = "serde_impls", serde(default))]
    pub parameters: Vec<Field>,
    pub return_type: TypeInfo,
}

impl GetMethod {
    /// Constructs a get-method, deriving its id from its name
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: Vec<Field>, return_type: TypeInfo) -> Self {
        let name = name.into();
        Self {
            id: Self::method_id(&name),
            name,
            parameters,
            return_type,
        }
    }

    /// Numeric id under which the VM dispatches a get-method named `name`
    #[must_use]
    pub fn method_id(name: &str) -> u32 {
        (u32::from(crc16(name.as_bytes())) & 0xffff) | 0x10000
    }
}

/// Complete ABI of a single contract
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_impls", serde(rename_all = "camelCase"))]
pub struct ContractAbi {
    pub name: String,
    #[cfg_attr(feature = "serde_impls", serde(default))]
    pub types: Vec<TypeAbi>,
    #[cfg_attr(feature = "serde_impls", serde(default))]
    pub storage: Option<TypeAbi>,
    #[cfg_attr(feature = "serde_impls", serde(default))]
    pub messages: Vec<TypeAbi>,
    #[cfg_attr(feature = "serde_impls", serde(default))]
    pub get_methods: Vec<GetMethod>,
}

impl ContractAbi {
    #[must_use]
    pub fn new(name: impl Into<String>, types: Vec<TypeAbi>) -> Self {
        Self {
            name: name.into(),
            types,
            ..Self::default()
        }
    }

    /// Looks up a struct definition by name
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<&TypeAbi> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Looks up a get-method by name
    #[must_use]
    pub fn get_method(&self, name: &str) -> Option<&GetMethod> {
        self.get_methods.iter().find(|m| m.name == name)
    }

    /// Looks up a get-method by numeric id
    #[must_use]
    pub fn get_method_by_id(&self, id: u32) -> Option<&GetMethod> {
        self.get_methods.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn human_readable_forms() {
        let cases = [
            (TypeInfo::int(32), "int32"),
            (TypeInfo::uint(64), "uint64"),
            (TypeInfo::Coins, "coins"),
            (TypeInfo::bits(128), "bits128"),
            (TypeInfo::cell(), "cell"),
            (TypeInfo::cell_of(TypeInfo::struct_ref("Point")), "Cell<Point>"),
            (TypeInfo::cell_of(TypeInfo::uint(8)), "Cell<uint8>"),
            (TypeInfo::optional(TypeInfo::uint(8)), "uint8?"),
            (TypeInfo::alias("Amount", TypeInfo::Coins), "Amount"),
            (TypeInfo::Void, "void"),
        ];
        for (ty, expected) in cases {
            assert_eq!(ty.to_string(), expected);
        }
    }

    #[test]
    fn parse_type_expressions() {
        assert_eq!("int257".parse(), Ok(TypeInfo::int(257)));
        assert_eq!("bytes4".parse(), Ok(TypeInfo::bits(32)));
        assert_eq!(
            "Cell<Point>?".parse(),
            Ok(TypeInfo::optional(TypeInfo::cell_of(TypeInfo::struct_ref(
                "Point"
            ))))
        );
        assert_eq!(
            "Cell<int8>".parse(),
            Ok(TypeInfo::Cell {
                inner: Some(Box::new(TypeInfo::AnonStruct {
                    fields: vec![TypeInfo::int(8)]
                }))
            })
        );
        assert_eq!("interest".parse(), Ok(TypeInfo::struct_ref("interest")));
        assert!("9lives".parse::<TypeInfo>().is_err());
        assert!("".parse::<TypeInfo>().is_err());
    }

    #[test]
    fn alias_resolution() {
        let ty = TypeInfo::alias("A", TypeInfo::alias("B", TypeInfo::Slice));
        assert_eq!(ty.resolve_alias(), &TypeInfo::Slice);
        assert!(ty.is_slice_like());
        assert!(TypeInfo::optional(ty).is_slice_like());
        assert!(!TypeInfo::cell().is_slice_like());
    }

    #[test]
    fn method_ids() {
        // (crc16("seqno") & 0xffff) | 0x10000
        assert_eq!(GetMethod::method_id("seqno"), 85143);
        let m = GetMethod::new("seqno", vec![], TypeInfo::int(32));
        assert_eq!(m.id, 85143);
    }

    #[test]
    fn opcode_pairing() {
        let t = TypeAbi::new("Inc", vec![]).with_opcode(0x7e8764ef, 32);
        assert_eq!(t.opcode(), Some((0x7e8764ef, 32)));
        assert_eq!(TypeAbi::new("Plain", vec![]).opcode(), None);
    }

    #[cfg(feature = "serde_impls")]
    #[test]
    fn load_compiler_json() {
        let json = r#"{
            "name": "Counter",
            "types": [
                { "name": "Point", "fields": [
                    { "name": "x", "type": { "name": "int", "width": 32, "humanReadable": "int32" } },
                    { "name": "y", "type": { "name": "option", "innerType": { "name": "coins" } } }
                ] }
            ],
            "messages": [
                { "name": "Move", "opcode": 1, "opcodeWidth": 32, "fields": [
                    { "name": "to", "type": { "name": "cell", "innerType": { "name": "struct", "structName": "Point" } } },
                    { "name": "id", "type": { "name": "type-alias", "aliasName": "Id", "innerType": { "name": "uint", "width": 64 } } }
                ] }
            ],
            "getMethods": [
                { "name": "seqno", "id": 85143, "returnType": { "name": "int", "width": 32 } }
            ]
        }"#;
        let abi: ContractAbi = serde_json::from_str(json).unwrap();
        let point = abi.find_type("Point").unwrap();
        assert_eq!(point.fields[1].ty, TypeInfo::optional(TypeInfo::Coins));
        let msg = &abi.messages[0];
        assert_eq!(msg.opcode(), Some((1, 32)));
        assert_eq!(
            msg.fields[0].ty,
            TypeInfo::cell_of(TypeInfo::struct_ref("Point"))
        );
        assert_eq!(msg.fields[1].ty.to_string(), "Id");
        assert_eq!(abi.get_method_by_id(85143).unwrap().name, "seqno");
    }
}
