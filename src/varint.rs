//! Width arithmetic for fixed- and variable-length integers
//!
//! Integers in a cell are stored big-endian, either in a fixed number of bits
//! declared by the schema (`int32`, `uint256`, ...) or in a variable-length
//! form consisting of a short *length prefix* holding a byte count, followed
//! by that many bytes of payload.
//!
//! | Kind                    | Prefix | Max bytes | Payload            |
//! |-------------------------|--------|-----------|--------------------|
//! | `coins`, `varuint16`    | 4 bits | 15        | unsigned           |
//! | `varuint32`             | 5 bits | 31        | unsigned           |
//! | `varint16`              | 4 bits | 15        | two's complement   |
//! | `varint32`              | 5 bits | 31        | two's complement   |
//!
//! The value zero is always encoded with a byte count of zero and no
//! payload. Signed payloads are sized from the magnitude plus a sign bit,
//! `ceil((bits(|v|) + 1) / 8)`, so that `-1` is a single `0xff` byte while
//! both `128` and `-128` take two bytes.
//!
//! This module holds only the arithmetic; the bit-level writes and reads
//! live in [`cell::ops`](crate::cell::ops).

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::error::BoundsError;

/// Length-prefix width of `coins`, `varuint16` and `varint16`
pub const LEN_BITS_16: usize = 4;

/// Length-prefix width of `varuint32` and `varint32`
pub const LEN_BITS_32: usize = 5;

/// Returns the largest byte count expressible in a `len_bits`-bit prefix.
#[inline]
#[must_use]
pub const fn max_bytes(len_bits: usize) -> usize {
    (1usize << len_bits) - 1
}

/// Number of payload bytes needed to store `val` as an unsigned
/// variable-length integer.
#[must_use]
pub fn uint_byte_len(val: &BigUint) -> usize {
    Integer::div_ceil(&(val.bits() as usize), &8)
}

/// Number of payload bytes needed to store `val` as a signed
/// variable-length integer.
#[must_use]
pub fn int_byte_len(val: &BigInt) -> usize {
    if val.is_zero() {
        0
    } else {
        Integer::div_ceil(&(val.magnitude().bits() as usize + 1), &8)
    }
}

/// Minimum number of bits required to hold `val` in two's complement.
#[must_use]
pub fn signed_bits(val: &BigInt) -> usize {
    let magnitude_bits = if val.is_negative() {
        // -2^(n-1) fits in n bits, so measure |val| - 1
        (val.magnitude() - BigUint::one()).bits()
    } else {
        val.bits()
    };
    magnitude_bits as usize + 1
}

/// Checks that `val` is non-negative and fits into `width` bits.
pub fn check_uint(val: &BigInt, width: usize) -> Result<BigUint, BoundsError> {
    match val.to_biguint() {
        None => Err(BoundsError::IllegalNegative { val: val.clone() }),
        Some(nat) if nat.bits() as usize > width => Err(BoundsError::Overflow {
            val: val.clone(),
            width,
        }),
        Some(nat) => Ok(nat),
    }
}

/// Checks that `val` fits in `width` bits of two's complement, and returns the
/// bit-pattern as an unsigned integer of at most `width` bits.
pub fn to_twos_complement(val: &BigInt, width: usize) -> Result<BigUint, BoundsError> {
    let fits = if width == 0 {
        val.is_zero()
    } else {
        signed_bits(val) <= width
    };
    if !fits {
        return Err(BoundsError::Overflow {
            val: val.clone(),
            width,
        });
    }
    Ok(match val.sign() {
        Sign::Minus => (BigUint::one() << width) - val.magnitude(),
        _ => val.magnitude().clone(),
    })
}

/// Interprets the low `width` bits of `raw` as a two's complement integer.
#[must_use]
pub fn from_twos_complement(raw: BigUint, width: usize) -> BigInt {
    if width == 0 {
        return BigInt::zero();
    }
    if raw.bit(width as u64 - 1) {
        BigInt::from(raw) - (BigInt::one() << width)
    } else {
        BigInt::from(raw)
    }
}

/// Checks that an unsigned variable-length payload fits under a
/// `len_bits`-bit prefix, returning its byte count.
pub fn check_var_uint(val: &BigUint, len_bits: usize) -> Result<usize, BoundsError> {
    let needed = uint_byte_len(val);
    let max = max_bytes(len_bits);
    if needed > max {
        return Err(BoundsError::LengthPrefix {
            val: BigInt::from(val.clone()),
            needed,
            len_bits,
            max,
        });
    }
    Ok(needed)
}

/// Checks that a signed variable-length payload fits under a `len_bits`-bit
/// prefix, returning its byte count.
pub fn check_var_int(val: &BigInt, len_bits: usize) -> Result<usize, BoundsError> {
    let needed = int_byte_len(val);
    let max = max_bytes(len_bits);
    if needed > max {
        return Err(BoundsError::LengthPrefix {
            val: val.clone(),
            needed,
            len_bits,
            max,
        });
    }
    Ok(needed)
}
