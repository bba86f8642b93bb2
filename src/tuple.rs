//! VM stack items and their cell serialization
//!
//! Get-method parameters and results travel as a flat list of stack items
//! rather than as bit-packed cells. A [`TupleItem`] is one such entry; there
//! is no notion of a boolean or an address at this level, so booleans are
//! carried as the integers `-1` (true) and `0` (false), and addresses as
//! slices holding their tagged cell layout.
//!
//! [`TupleBuilder`] and [`TupleReader`] provide typed access to a list of
//! items, and [`serialize`] and [`deserialize`] convert a whole list to and
//! from the single-cell form in which the VM exchanges stacks:
//!
//! ```text
//! stack      := depth:uint24 entries(depth)
//! entries(0) := (empty)
//! entries(n) := ^entries(n - 1) item
//! ```
//!
//! where each item begins with a type tag:
//!
//! | Tag         | Item    | Payload                                        |
//! |-------------|---------|------------------------------------------------|
//! | `0x00`      | null    |                                                |
//! | `0x01`      | int     | int64                                          |
//! | `0x0201_`   | int     | int257                                         |
//! | `0x02ff`    | NaN     |                                                |
//! | `0x03`      | cell    | ^cell                                          |
//! | `0x04`      | slice   | bit window (2 x uint10), ref window (2 x uint3), ^cell |
//! | `0x05`      | builder | ^cell                                          |
//! | `0x07`      | tuple   | length:uint16, head/tail reference tree        |

use std::collections::VecDeque;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::address::{AddressError, AnyAddress};
use crate::cell::{ops, Cell, CellBuilder, CellSlice};
use crate::error::CellError;

const TAG_NULL: u64 = 0x00;
const TAG_INT64: u64 = 0x01;
const TAG_INT257: u64 = 0x02;
const TAG_CELL: u64 = 0x03;
const TAG_SLICE: u64 = 0x04;
const TAG_BUILDER: u64 = 0x05;
const TAG_TUPLE: u64 = 0x07;

/// Maximum number of elements in a single tuple item
pub const MAX_TUPLE_LEN: usize = 255;

/// Errors raised while building, reading, or (de)serializing stack items
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TupleError {
    /// Read past the last item
    #[error("no more tuple items")]
    Exhausted,
    /// Item of a different type than requested
    #[error("expected {expected} tuple item, found {found}")]
    UnexpectedItem {
        expected: &'static str,
        found: &'static str,
    },
    /// Serialized item with a type tag this crate does not know
    #[error("unsupported stack item tag {0:#04x}")]
    UnsupportedTag(u64),
    /// Tuple with more elements than the VM permits
    #[error("tuple of {0} items exceeds the maximum of 255")]
    TooLong(usize),
    #[error(transparent)]
    Cell(#[from] CellError),
    #[error(transparent)]
    Address(#[from] AddressError),
}

impl From<everscale_types::error::Error> for TupleError {
    fn from(err: everscale_types::error::Error) -> Self {
        Self::Cell(err.into())
    }
}

/// Single VM stack entry
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TupleItem {
    Null,
    Int(BigInt),
    NaN,
    Cell(Cell),
    /// Slice over the entirety of the held cell
    Slice(Cell),
    Builder(Cell),
    Tuple(Vec<TupleItem>),
}

impl TupleItem {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "int",
            Self::NaN => "NaN",
            Self::Cell(_) => "cell",
            Self::Slice(_) => "slice",
            Self::Builder(_) => "builder",
            Self::Tuple(_) => "tuple",
        }
    }
}

fn address_cell(addr: &AnyAddress) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    addr.store_into(&mut b)?;
    ops::finish(b)
}

/// Accumulator for an ordered list of stack items
#[derive(Clone, Debug, Default)]
pub struct TupleBuilder {
    items: Vec<TupleItem>,
}

impl TupleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: TupleItem) {
        self.items.push(item)
    }

    pub fn write_int(&mut self, value: impl Into<BigInt>) {
        self.push(TupleItem::Int(value.into()))
    }

    /// Writes `-1` for `true` and `0` for `false`
    pub fn write_bool(&mut self, value: bool) {
        self.write_int(if value { -1 } else { 0 })
    }

    /// Writes a slice holding the tagged layout of `addr`; for
    /// [`AnyAddress::None`] that is the two bits `00`
    pub fn write_address(&mut self, addr: &AnyAddress) -> Result<(), TupleError> {
        self.push(TupleItem::Slice(address_cell(addr)?));
        Ok(())
    }

    pub fn write_cell(&mut self, cell: Cell) {
        self.push(TupleItem::Cell(cell))
    }

    pub fn write_slice(&mut self, cell: Cell) {
        self.push(TupleItem::Slice(cell))
    }

    pub fn write_builder(&mut self, cell: Cell) {
        self.push(TupleItem::Builder(cell))
    }

    /// Writes a nested tuple item
    pub fn write_tuple(&mut self, items: Vec<TupleItem>) -> Result<(), TupleError> {
        if items.len() > MAX_TUPLE_LEN {
            return Err(TupleError::TooLong(items.len()));
        }
        self.push(TupleItem::Tuple(items));
        Ok(())
    }

    pub fn write_null(&mut self) {
        self.push(TupleItem::Null)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn build(self) -> Vec<TupleItem> {
        self.items
    }
}

/// Front-to-back reader over a list of stack items
#[derive(Clone, Debug, Default)]
pub struct TupleReader {
    items: VecDeque<TupleItem>,
}

impl TupleReader {
    #[must_use]
    pub fn new(items: Vec<TupleItem>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Number of items not yet read
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&TupleItem> {
        self.items.front()
    }

    pub fn pop(&mut self) -> Result<TupleItem, TupleError> {
        self.items.pop_front().ok_or(TupleError::Exhausted)
    }

    fn mismatch(expected: &'static str, found: &TupleItem) -> TupleError {
        TupleError::UnexpectedItem {
            expected,
            found: found.kind_name(),
        }
    }

    pub fn read_int(&mut self) -> Result<BigInt, TupleError> {
        match self.pop()? {
            TupleItem::Int(i) => Ok(i),
            other => Err(Self::mismatch("int", &other)),
        }
    }

    /// Reads an integer as a boolean; any nonzero value is `true`
    pub fn read_bool(&mut self) -> Result<bool, TupleError> {
        Ok(!self.read_int()?.is_zero())
    }

    /// Reads a cell or slice holding a tagged address; a null item is also
    /// taken as [`AnyAddress::None`]
    pub fn read_address(&mut self) -> Result<AnyAddress, TupleError> {
        match self.pop()? {
            TupleItem::Null => Ok(AnyAddress::None),
            TupleItem::Slice(c) | TupleItem::Cell(c) => {
                let mut s = ops::open(c.as_ref())?;
                Ok(AnyAddress::load_from(&mut s)?)
            }
            other => Err(Self::mismatch("address", &other)),
        }
    }

    /// Reads the cell underlying a cell, slice, or builder item
    pub fn read_cell(&mut self) -> Result<Cell, TupleError> {
        match self.pop()? {
            TupleItem::Cell(c) | TupleItem::Slice(c) | TupleItem::Builder(c) => Ok(c),
            other => Err(Self::mismatch("cell", &other)),
        }
    }

    /// Reads a nested tuple, returning a reader over its items
    pub fn read_tuple(&mut self) -> Result<TupleReader, TupleError> {
        match self.pop()? {
            TupleItem::Tuple(items) => Ok(Self::new(items)),
            other => Err(Self::mismatch("tuple", &other)),
        }
    }
}

fn store_item(b: &mut CellBuilder, item: &TupleItem) -> Result<(), TupleError> {
    match item {
        TupleItem::Null => {
            b.store_u8(TAG_NULL as u8)?;
        }
        TupleItem::Int(i) => match i.to_i64() {
            Some(small) => {
                b.store_u8(TAG_INT64 as u8)?;
                b.store_u64(small as u64)?;
            }
            None => {
                b.store_uint(0x0100, 15)?;
                ops::store_big_int(b, i, 257)?;
            }
        },
        TupleItem::NaN => {
            b.store_u16(0x02ff)?;
        }
        TupleItem::Cell(c) => {
            b.store_u8(TAG_CELL as u8)?;
            b.store_reference(c.clone())?;
        }
        TupleItem::Slice(c) => {
            b.store_u8(TAG_SLICE as u8)?;
            b.store_uint(0, 10)?;
            b.store_uint(u64::from(c.bit_len()), 10)?;
            b.store_uint(0, 3)?;
            b.store_uint(u64::from(c.reference_count()), 3)?;
            b.store_reference(c.clone())?;
        }
        TupleItem::Builder(c) => {
            b.store_u8(TAG_BUILDER as u8)?;
            b.store_reference(c.clone())?;
        }
        TupleItem::Tuple(items) => {
            if items.len() > MAX_TUPLE_LEN {
                return Err(TupleError::TooLong(items.len()));
            }
            let mut head: Option<Cell> = None;
            let mut tail: Option<Cell> = None;
            for (ix, item) in items.iter().enumerate() {
                std::mem::swap(&mut head, &mut tail);
                if ix > 1 {
                    let mut node = CellBuilder::new();
                    if let Some(t) = tail.take() {
                        node.store_reference(t)?;
                    }
                    if let Some(h) = head.take() {
                        node.store_reference(h)?;
                    }
                    head = Some(node.build()?);
                }
                let mut leaf = CellBuilder::new();
                store_item(&mut leaf, item)?;
                tail = Some(leaf.build()?);
            }
            b.store_u8(TAG_TUPLE as u8)?;
            b.store_u16(items.len() as u16)?;
            for c in [head, tail].into_iter().flatten() {
                b.store_reference(c)?;
            }
        }
    }
    Ok(())
}

fn load_item(s: &mut CellSlice<'_>) -> Result<TupleItem, TupleError> {
    let tag = ops::load_uint(s, 8)?;
    Ok(match tag {
        TAG_NULL => TupleItem::Null,
        TAG_INT64 => TupleItem::Int(ops::load_int(s, 64)?.into()),
        TAG_INT257 => {
            if ops::load_uint(s, 7)? == 0 {
                TupleItem::Int(ops::load_big_int(s, 257)?)
            } else {
                ops::skip_bits(s, 1)?;
                TupleItem::NaN
            }
        }
        TAG_CELL => TupleItem::Cell(ops::load_reference(s)?),
        TAG_SLICE => {
            let start_bits = ops::load_uint(s, 10)? as usize;
            let end_bits = ops::load_uint(s, 10)? as usize;
            let start_refs = ops::load_uint(s, 3)? as usize;
            let end_refs = ops::load_uint(s, 3)? as usize;
            let target = ops::load_reference(s)?;
            let mut rs = ops::open(target.as_ref())?;
            ops::skip_bits(&mut rs, start_bits)?;
            let span = ops::load_span(&mut rs, end_bits.saturating_sub(start_bits))?;
            let mut b = CellBuilder::new();
            ops::store_contents(&mut b, span.as_ref())?;
            for _ in 0..start_refs {
                ops::load_reference(&mut rs)?;
            }
            for _ in start_refs..end_refs {
                b.store_reference(ops::load_reference(&mut rs)?)?;
            }
            TupleItem::Slice(b.build()?)
        }
        TAG_BUILDER => TupleItem::Builder(ops::load_reference(s)?),
        TAG_TUPLE => {
            let len = ops::load_uint(s, 16)? as usize;
            let mut items = VecDeque::with_capacity(len);
            match len {
                0 => {}
                1 => {
                    let only = ops::load_reference(s)?;
                    items.push_back(load_item(&mut ops::open(only.as_ref())?)?);
                }
                _ => {
                    let mut head = ops::load_reference(s)?;
                    let tail = ops::load_reference(s)?;
                    items.push_front(load_item(&mut ops::open(tail.as_ref())?)?);
                    for _ in 0..len - 2 {
                        let mut node = ops::open(head.as_ref())?;
                        let next = ops::load_reference(&mut node)?;
                        let tail = ops::load_reference(&mut node)?;
                        items.push_front(load_item(&mut ops::open(tail.as_ref())?)?);
                        head = next;
                    }
                    items.push_front(load_item(&mut ops::open(head.as_ref())?)?);
                }
            }
            TupleItem::Tuple(items.into())
        }
        other => return Err(TupleError::UnsupportedTag(other)),
    })
}

/// Serializes a stack, top of stack last, into its single-cell form
pub fn serialize(items: &[TupleItem]) -> Result<Cell, TupleError> {
    let mut rest = crate::cell::empty();
    let mut top = CellBuilder::new();
    top.store_uint(items.len() as u64, 24)?;
    for (ix, item) in items.iter().enumerate() {
        let mut b = if ix + 1 == items.len() {
            std::mem::take(&mut top)
        } else {
            CellBuilder::new()
        };
        b.store_reference(rest)?;
        store_item(&mut b, item)?;
        rest = b.build()?;
    }
    Ok(if items.is_empty() { top.build()? } else { rest })
}

/// Parses a stack from its single-cell form
pub fn deserialize(cell: &Cell) -> Result<Vec<TupleItem>, TupleError> {
    let mut s = ops::open(cell.as_ref())?;
    let depth = ops::load_uint(&mut s, 24)? as usize;
    let mut items = VecDeque::with_capacity(depth.min(1024));
    if depth == 0 {
        return Ok(Vec::new());
    }
    let mut rest = ops::load_reference(&mut s)?;
    items.push_front(load_item(&mut s)?);
    for _ in 1..depth {
        let mut s = ops::open(rest.as_ref())?;
        let next = ops::load_reference(&mut s)?;
        items.push_front(load_item(&mut s)?);
        rest = next;
    }
    Ok(items.into())
}
