//! Integer and span operations over [`CellBuilder`] and [`CellSlice`]
//!
//! The builder and slice of `everscale-types` handle primitive widths; the
//! codecs also need integers of any width up to a full cell, the
//! length-prefixed forms described in [`varint`](crate::varint), and
//! sub-spans materialized as cells of their own. Every operation here checks
//! representability and capacity before touching its cursor, so a failed
//! store or load leaves the builder or slice as it was.

use num_bigint::{BigInt, BigUint};

use super::{Cell, CellBuilder, CellSlice, DynCell, MAX_BITS};
use crate::error::{BoundsError, CellError, CellResult};
use crate::varint;

fn bit_width(width: usize) -> CellResult<u16> {
    if width > MAX_BITS {
        return Err(BoundsError::WidthTooLarge {
            width,
            max: MAX_BITS,
        }
        .into());
    }
    Ok(width as u16)
}

fn small_width(width: usize) -> CellResult<u16> {
    if width > 64 {
        return Err(BoundsError::WidthTooLarge { width, max: 64 }.into());
    }
    Ok(width as u16)
}

/// Opens a read cursor over an ordinary cell
pub fn open(cell: &DynCell) -> CellResult<CellSlice<'_>> {
    Ok(cell.as_slice()?)
}

/// Builds the contents written so far into a cell
pub fn finish(b: CellBuilder) -> CellResult<Cell> {
    Ok(b.build()?)
}

/// Fails with [`CellError::Overflow`] unless `b` has room for `bits` more
/// data bits and `refs` more references
pub fn ensure_capacity(b: &CellBuilder, bits: usize, refs: usize) -> CellResult<()> {
    if bits > usize::from(b.spare_capacity_bits()) || refs > usize::from(b.spare_capacity_refs())
    {
        return Err(CellError::Overflow);
    }
    Ok(())
}

/// Writes `value` as an unsigned integer of `width` bits
pub fn store_big_uint(b: &mut CellBuilder, value: &BigUint, width: usize) -> CellResult<()> {
    if value.bits() as usize > width {
        return Err(BoundsError::Overflow {
            val: value.clone().into(),
            width,
        }
        .into());
    }
    let bits = bit_width(width)?;
    ensure_capacity(b, width, 0)?;
    if width == 0 {
        return Ok(());
    }
    let nbytes = width.div_ceil(8);
    // left-align so that store_raw picks up the leading `width` bits
    let aligned = (value << (nbytes * 8 - width)).to_bytes_be();
    let mut buf = vec![0u8; nbytes];
    buf[nbytes - aligned.len()..].copy_from_slice(&aligned);
    b.store_raw(&buf, bits)?;
    Ok(())
}

/// Writes `value` as a two's complement integer of `width` bits
pub fn store_big_int(b: &mut CellBuilder, value: &BigInt, width: usize) -> CellResult<()> {
    let raw = varint::to_twos_complement(value, width)?;
    store_big_uint(b, &raw, width)
}

/// Writes `value` as a two's complement integer of `width <= 64` bits
pub fn store_int(b: &mut CellBuilder, value: i64, width: usize) -> CellResult<()> {
    small_width(width)?;
    store_big_int(b, &BigInt::from(value), width)
}

/// Writes `value` behind a `len_bits`-bit byte-count prefix
pub fn store_var_uint(b: &mut CellBuilder, value: &BigUint, len_bits: usize) -> CellResult<()> {
    let nbytes = varint::check_var_uint(value, len_bits)?;
    ensure_capacity(b, len_bits + nbytes * 8, 0)?;
    b.store_uint(nbytes as u64, len_bits as u16)?;
    store_big_uint(b, value, nbytes * 8)
}

/// Writes `value` in two's complement behind a `len_bits`-bit byte-count
/// prefix
pub fn store_var_int(b: &mut CellBuilder, value: &BigInt, len_bits: usize) -> CellResult<()> {
    let nbytes = varint::check_var_int(value, len_bits)?;
    let raw = varint::to_twos_complement(value, nbytes * 8)?;
    ensure_capacity(b, len_bits + nbytes * 8, 0)?;
    b.store_uint(nbytes as u64, len_bits as u16)?;
    store_big_uint(b, &raw, nbytes * 8)
}

/// Writes a currency amount (`varuint16`)
pub fn store_coins(b: &mut CellBuilder, value: &BigUint) -> CellResult<()> {
    store_var_uint(b, value, varint::LEN_BITS_16)
}

/// Appends the data bits and references of `cell`
pub fn store_contents(b: &mut CellBuilder, cell: &DynCell) -> CellResult<()> {
    let refs = cell.reference_count();
    ensure_capacity(b, usize::from(cell.bit_len()), usize::from(refs))?;
    b.store_raw(cell.data(), cell.bit_len())?;
    for ix in 0..refs {
        let child = cell.reference_cloned(ix).ok_or(CellError::Underflow)?;
        b.store_reference(child)?;
    }
    Ok(())
}

/// Reads an unsigned integer of `width <= 64` bits without advancing
pub fn preload_uint(s: &CellSlice<'_>, width: usize) -> CellResult<u64> {
    let bits = small_width(width)?;
    let mut peek = s.clone();
    Ok(peek.load_uint(bits)?)
}

/// Reads an unsigned integer of `width <= 64` bits
pub fn load_uint(s: &mut CellSlice<'_>, width: usize) -> CellResult<u64> {
    let bits = small_width(width)?;
    Ok(s.load_uint(bits)?)
}

/// Reads a two's complement integer of `width <= 64` bits
pub fn load_int(s: &mut CellSlice<'_>, width: usize) -> CellResult<i64> {
    let raw = load_uint(s, width)?;
    if width == 0 {
        return Ok(0);
    }
    let shift = 64 - width;
    Ok(((raw << shift) as i64) >> shift)
}

/// Advances past `n` data bits without reading them
pub fn skip_bits(s: &mut CellSlice<'_>, n: usize) -> CellResult<()> {
    let bits = bit_width(n)?;
    s.skip_first(bits, 0)?;
    Ok(())
}

/// Reads an unsigned integer of arbitrary `width`
pub fn load_big_uint(s: &mut CellSlice<'_>, width: usize) -> CellResult<BigUint> {
    let bits = bit_width(width)?;
    if width == 0 {
        return Ok(BigUint::default());
    }
    let mut buf = [0u8; 128];
    let data = s.load_raw(&mut buf, bits)?;
    let padding = data.len() * 8 - width;
    Ok(BigUint::from_bytes_be(data) >> padding)
}

/// Reads a two's complement integer of arbitrary `width`
pub fn load_big_int(s: &mut CellSlice<'_>, width: usize) -> CellResult<BigInt> {
    let raw = load_big_uint(s, width)?;
    Ok(varint::from_twos_complement(raw, width))
}

fn load_var_len(s: &mut CellSlice<'_>, len_bits: usize) -> CellResult<usize> {
    let nbytes = preload_uint(s, len_bits)? as usize;
    if usize::from(s.size_bits()) < len_bits + nbytes * 8 {
        return Err(CellError::Underflow);
    }
    skip_bits(s, len_bits)?;
    Ok(nbytes)
}

/// Reads an unsigned integer behind a `len_bits`-bit byte-count prefix
pub fn load_var_uint(s: &mut CellSlice<'_>, len_bits: usize) -> CellResult<BigUint> {
    let nbytes = load_var_len(s, len_bits)?;
    load_big_uint(s, nbytes * 8)
}

/// Reads a two's complement integer behind a `len_bits`-bit byte-count
/// prefix
pub fn load_var_int(s: &mut CellSlice<'_>, len_bits: usize) -> CellResult<BigInt> {
    let nbytes = load_var_len(s, len_bits)?;
    load_big_int(s, nbytes * 8)
}

/// Reads a currency amount (`varuint16`)
pub fn load_coins(s: &mut CellSlice<'_>) -> CellResult<BigUint> {
    load_var_uint(s, varint::LEN_BITS_16)
}

/// Reads the next reference
pub fn load_reference(s: &mut CellSlice<'_>) -> CellResult<Cell> {
    Ok(s.load_reference_cloned()?)
}

/// Reads `n` data bits into a reference-free cell of their own
pub fn load_span(s: &mut CellSlice<'_>, n: usize) -> CellResult<Cell> {
    let bits = bit_width(n)?;
    let mut buf = [0u8; 128];
    let data = s.load_raw(&mut buf, bits)?;
    let mut b = CellBuilder::new();
    b.store_raw(data, bits)?;
    finish(b)
}

/// Consumes the unread remainder, both bits and references, as a new cell
pub fn load_rest(s: &mut CellSlice<'_>) -> CellResult<Cell> {
    let bits = s.size_bits();
    let refs = s.size_refs();
    let mut buf = [0u8; 128];
    let mut b = CellBuilder::new();
    let data = s.load_raw(&mut buf, bits)?;
    b.store_raw(data, bits)?;
    for _ in 0..refs {
        b.store_reference(s.load_reference_cloned()?)?;
    }
    finish(b)
}

/// Returns `true` once every bit and reference has been read
#[must_use]
pub fn is_exhausted(s: &CellSlice<'_>) -> bool {
    s.size_bits() == 0 && s.size_refs() == 0
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::{empty, to_literal};
    use pretty_assertions::assert_eq;

    fn sample() -> Cell {
        let mut b = CellBuilder::new();
        b.store_uint(0xab, 8).unwrap();
        store_int(&mut b, -3, 5).unwrap();
        store_coins(&mut b, &BigUint::from(1_000_000_000u64)).unwrap();
        b.store_reference(empty()).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn loads_mirror_stores() {
        let cell = sample();
        let mut s = open(cell.as_ref()).unwrap();
        assert_eq!(preload_uint(&s, 4).unwrap(), 0xa);
        assert_eq!(load_uint(&mut s, 8).unwrap(), 0xab);
        assert_eq!(load_int(&mut s, 5).unwrap(), -3);
        assert_eq!(load_coins(&mut s).unwrap(), BigUint::from(1_000_000_000u64));
        assert_eq!(load_reference(&mut s).unwrap(), empty());
        assert!(is_exhausted(&s));
    }

    #[test]
    fn failed_load_does_not_advance() {
        let cell = sample();
        let mut s = open(cell.as_ref()).unwrap();
        skip_bits(&mut s, 8).unwrap();
        let rem = usize::from(s.size_bits());
        assert!(load_span(&mut s, rem + 1).unwrap_err().is_underflow());
        assert_eq!(usize::from(s.size_bits()), rem);

        let mut b = CellBuilder::new();
        b.store_uint(0b1111, 4).unwrap();
        let short = b.build().unwrap();
        let mut s = open(short.as_ref()).unwrap();
        assert!(load_var_uint(&mut s, 4).unwrap_err().is_underflow());
        assert_eq!(s.size_bits(), 4);
    }

    #[test]
    fn failed_store_leaves_builder_intact() {
        let mut b = CellBuilder::new();
        store_big_uint(&mut b, &BigUint::default(), 1020).unwrap();
        assert!(store_big_uint(&mut b, &BigUint::from(15u8), 4)
            .unwrap_err()
            .is_overflow());
        assert_eq!(b.spare_capacity_bits(), 3);
        assert!(matches!(
            store_big_uint(&mut b, &BigUint::from(8u8), 3),
            Err(CellError::Bounds(BoundsError::Overflow { width: 3, .. }))
        ));
        store_big_uint(&mut b, &BigUint::from(7u8), 3).unwrap();
        assert_eq!(b.spare_capacity_bits(), 0);
    }

    #[test]
    fn signed_layout() {
        let mut b = CellBuilder::new();
        store_int(&mut b, -1, 8).unwrap();
        store_big_int(&mut b, &BigInt::from(-2), 4).unwrap();
        assert_eq!(to_literal(b.build().unwrap().as_ref()), "x{FFE}");
    }

    #[test]
    fn var_layout() {
        let mut b = CellBuilder::new();
        store_coins(&mut b, &BigUint::default()).unwrap();
        // 0000 | 00001 | 11111111
        store_var_int(&mut b, &BigInt::from(-1), 5).unwrap();
        assert_eq!(to_literal(b.build().unwrap().as_ref()), "x{00FFC_}");
    }

    #[test]
    fn wide_integers() {
        let max = (BigUint::from(1u8) << 257) - 1u8;
        let min: BigInt = -(BigInt::from(1) << 256usize);
        let mut b = CellBuilder::new();
        store_big_uint(&mut b, &max, 257).unwrap();
        store_big_int(&mut b, &min, 257).unwrap();
        let cell = b.build().unwrap();
        let mut s = open(cell.as_ref()).unwrap();
        assert_eq!(load_big_uint(&mut s, 257).unwrap(), max);
        assert_eq!(load_big_int(&mut s, 257).unwrap(), min);
    }

    #[test]
    fn spans_and_rest() {
        let mut b = CellBuilder::new();
        b.store_uint(0b1011_0110, 8).unwrap();
        b.store_reference(empty()).unwrap();
        let cell = b.build().unwrap();

        let mut s = open(cell.as_ref()).unwrap();
        let head = load_span(&mut s, 3).unwrap();
        assert_eq!(to_literal(head.as_ref()), "x{B_}");
        let rest = load_rest(&mut s).unwrap();
        assert_eq!(to_literal(rest.as_ref()), "x{B4_}");
        assert_eq!(rest.reference_count(), 1);
        assert!(is_exhausted(&s));

        let mut b = CellBuilder::new();
        store_contents(&mut b, cell.as_ref()).unwrap();
        assert_eq!(b.build().unwrap(), cell);
    }
}
