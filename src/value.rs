//! Dynamic values exchanged with the codecs
//!
//! Both codecs consume and produce a [`ParsedObject`]: an ordered mapping
//! from field name to [`ParsedValue`]. Nested structs and typed cells appear
//! as [`NestedObject`] values, which pair a display name with the mapping of
//! their own fields.
//!
//! A key may be present in a `ParsedObject` without a value. Such an
//! *undefined* entry is distinct from a present [`ParsedValue::Null`]: the
//! latter is the decoded form of an absent optional, while the former marks a
//! field whose value has not been supplied at all, and is reported by the
//! encoders as a missing field.

use num_bigint::BigInt;

use crate::address::{AnyAddress, ExternalAddress, StdAddress};
use crate::cell::Cell;

/// Single decoded or to-be-encoded field value
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ParsedValue {
    /// Any integer kind, at arbitrary precision
    Int(BigInt),
    Bool(bool),
    /// Standard internal address
    Address(StdAddress),
    ExternalAddress(ExternalAddress),
    /// Explicitly absent address (`addr_none`)
    AddressNone,
    /// Opaque cell reference
    Cell(Cell),
    /// Raw bit span together with any references it carries, held as the
    /// cell it would occupy on its own
    Slice(Cell),
    /// Struct or typed-cell body
    Nested(NestedObject),
    /// Absent optional
    Null,
}

impl ParsedValue {
    /// Short description of the variant, used in type-mismatch diagnostics
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::Address(_) => "address",
            Self::ExternalAddress(_) => "external address",
            Self::AddressNone => "addr_none",
            Self::Cell(_) => "cell",
            Self::Slice(_) => "slice",
            Self::Nested(_) => "nested object",
            Self::Null => "null",
        }
    }

    /// Constructs a [`Nested`](Self::Nested) value
    #[must_use]
    pub fn nested(name: impl Into<String>, value: ParsedObject) -> Self {
        Self::Nested(NestedObject::new(name, value))
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Self::Int(i) => Some(i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_nested(&self) -> Option<&NestedObject> {
        match self {
            Self::Nested(n) => Some(n),
            _ => None,
        }
    }

    /// Interprets the value as an address, if it is one of the address
    /// variants
    #[must_use]
    pub fn as_address(&self) -> Option<AnyAddress> {
        match self {
            Self::Address(a) => Some(AnyAddress::Std(*a)),
            Self::ExternalAddress(e) => Some(AnyAddress::External(e.clone())),
            Self::AddressNone => Some(AnyAddress::None),
            _ => None,
        }
    }
}

impl From<AnyAddress> for ParsedValue {
    fn from(addr: AnyAddress) -> Self {
        match addr {
            AnyAddress::None => Self::AddressNone,
            AnyAddress::External(e) => Self::ExternalAddress(e),
            AnyAddress::Std(a) => Self::Address(a),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParsedValue {
                fn from(i: $t) -> Self {
                    Self::Int(BigInt::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128);

impl From<BigInt> for ParsedValue {
    fn from(i: BigInt) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for ParsedValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<StdAddress> for ParsedValue {
    fn from(a: StdAddress) -> Self {
        Self::Address(a)
    }
}

impl From<Cell> for ParsedValue {
    fn from(c: Cell) -> Self {
        Self::Cell(c)
    }
}

impl From<NestedObject> for ParsedValue {
    fn from(n: NestedObject) -> Self {
        Self::Nested(n)
    }
}

/// Named wrapper around the fields of a struct or typed cell
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NestedObject {
    pub name: String,
    pub value: Option<ParsedObject>,
}

impl NestedObject {
    #[must_use]
    pub fn new(name: impl Into<String>, value: ParsedObject) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
        }
    }
}

/// Insertion-ordered mapping from field name to (possibly undefined) value.
///
/// Equality ignores order: two objects are equal when they hold the same
/// keys, each mapped to equal entries.
#[derive(Clone, Default, Debug)]
pub struct ParsedObject {
    entries: Vec<(String, Option<ParsedValue>)>,
}

impl ParsedObject {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Sets the entry for `key`, replacing any previous entry in place.
    ///
    /// `None` records the key as present but undefined.
    pub fn set(&mut self, key: impl Into<String>, value: Option<ParsedValue>) {
        let key = key.into();
        match self.position(&key) {
            Some(ix) => self.entries[ix].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Sets `key` to a defined value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParsedValue>) {
        self.set(key, Some(value.into()))
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParsedValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the entry for `key`: `None` if absent, `Some(None)` if
    /// present but undefined.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<Option<&ParsedValue>> {
        self.position(key).map(|ix| self.entries[ix].1.as_ref())
    }

    /// Returns the defined value for `key`, if any
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParsedValue> {
        self.entry(key).flatten()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Iterates over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ParsedValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl PartialEq for ParsedObject {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.entry(k).map_or(false, |w| w == v))
    }
}

impl Eq for ParsedObject {}

impl<K: Into<String>> FromIterator<(K, Option<ParsedValue>)> for ParsedObject {
    fn from_iter<I: IntoIterator<Item = (K, Option<ParsedValue>)>>(iter: I) -> Self {
        let mut ret = Self::new();
        for (k, v) in iter {
            ret.set(k, v);
        }
        ret
    }
}

impl IntoIterator for ParsedObject {
    type Item = (String, Option<ParsedValue>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn undefined_is_not_null() {
        let mut obj = ParsedObject::new().with("a", ParsedValue::Null);
        obj.set("b", None);
        assert_eq!(obj.entry("a"), Some(Some(&ParsedValue::Null)));
        assert_eq!(obj.entry("b"), Some(None));
        assert_eq!(obj.entry("c"), None);
        assert_eq!(obj.get("b"), None);
        assert!(obj.contains_key("b"));
    }

    #[test]
    fn replace_keeps_position() {
        let mut obj = ParsedObject::new().with("x", 1).with("y", 2);
        obj.insert("x", 3);
        assert_eq!(obj.keys().collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(obj.get("x"), Some(&ParsedValue::from(3)));
    }

    #[test]
    fn equality_ignores_order() {
        let a = ParsedObject::new().with("x", 1).with("y", true);
        let b = ParsedObject::new().with("y", true).with("x", 1);
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with("z", ParsedValue::Null));
        let mut c = b;
        c.set("x", None);
        assert_ne!(a, c);
    }

    #[test]
    fn address_views() {
        let std = StdAddress::new(0, [1; 32]);
        assert_eq!(
            ParsedValue::from(std).as_address(),
            Some(AnyAddress::Std(std))
        );
        assert_eq!(ParsedValue::from(AnyAddress::None), ParsedValue::AddressNone);
        assert_eq!(ParsedValue::Null.as_address(), None);
    }
}
