//! Bit-string literals
//!
//! The VM tooling renders cell data as upper-case hex inside `x{...}`. When
//! the length is not a multiple of four, the rendering appends a
//! *completion tag*: a single `1` bit followed by zero-padding, and marks
//! the literal with a trailing `_`. Thus the three bits `101` are written
//! as `x{B_}`, and the six bits `101010` as `x{AA_}`.
//!
//! [`parse_literal`] accepts the same forms, as well as binary literals of
//! the form `b{0101}`, and yields a reference-free cell.

use std::fmt::Write as _;

use super::{Cell, CellBuilder, DynCell, MAX_BITS};

/// Errors encountered when parsing `x{...}` or `b{...}` literals
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LiteralError {
    /// Literal is not delimited as `x{...}` or `b{...}`
    #[error("bit-string literal must be of the form x{{...}} or b{{...}}")]
    Delimiters,
    /// Literal contained a character that is not a digit of its radix
    #[error("invalid digit {0:?} in bit-string literal")]
    Digit(char),
    /// Completion-tagged literal had no terminating `1` bit
    #[error("completion tag missing from bit-string literal")]
    CompletionTag,
    /// Literal holds more bits than fit in one cell
    #[error("bit-string literal of {0} bits does not fit in a cell")]
    TooLong(usize),
}

/// Accumulates bits most-significant first
#[derive(Default)]
struct Bits {
    data: Vec<u8>,
    len: usize,
}

impl Bits {
    fn push(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            if let Some(last) = self.data.last_mut() {
                *last |= 0x80 >> (self.len % 8);
            }
        }
        self.len += 1;
    }

    fn get(&self, ix: usize) -> bool {
        self.data[ix / 8] & (0x80 >> (ix % 8)) != 0
    }

    fn into_cell(self) -> Result<Cell, LiteralError> {
        if self.len > MAX_BITS {
            return Err(LiteralError::TooLong(self.len));
        }
        let mut b = CellBuilder::new();
        b.store_raw(&self.data, self.len as u16)
            .map_err(|_| LiteralError::TooLong(self.len))?;
        b.build().map_err(|_| LiteralError::TooLong(self.len))
    }
}

/// Parses an `x{...}` hex literal or `b{...}` binary literal into a cell
/// with no references
pub fn parse_literal(src: &str) -> Result<Cell, LiteralError> {
    let src = src.trim();
    let body = |prefix: &str| {
        src.strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix('}'))
    };
    let mut bits = Bits::default();
    if let Some(bin) = body("b{") {
        for c in bin.chars() {
            match c {
                '0' => bits.push(false),
                '1' => bits.push(true),
                other => return Err(LiteralError::Digit(other)),
            }
        }
    } else if let Some(hex) = body("x{") {
        let (digits, tagged) = match hex.strip_suffix('_') {
            Some(digits) => (digits, true),
            None => (hex, false),
        };
        for c in digits.chars() {
            let nibble = c.to_digit(16).ok_or(LiteralError::Digit(c))?;
            for shift in (0..4).rev() {
                bits.push((nibble >> shift) & 1 == 1);
            }
        }
        if tagged {
            // strip trailing zeros, then the tag bit itself
            while bits.len > 0 && !bits.get(bits.len - 1) {
                bits.len -= 1;
            }
            if bits.len == 0 {
                return Err(LiteralError::CompletionTag);
            }
            bits.len -= 1;
            let keep = bits.len.div_ceil(8);
            bits.data.truncate(keep);
            let rem = bits.len % 8;
            if let Some(last) = bits.data.last_mut().filter(|_| rem != 0) {
                *last &= !(0xff >> rem);
            }
        }
    } else {
        return Err(LiteralError::Delimiters);
    }
    bits.into_cell()
}

/// Renders the data bits of `cell` as an `x{...}` literal; references are
/// not shown
#[must_use]
pub fn to_literal(cell: &DynCell) -> String {
    let len = usize::from(cell.bit_len());
    let raw = cell.data();
    let mut data = raw.get(..len.div_ceil(8)).unwrap_or(raw).to_vec();
    let rem = len % 8;
    if let Some(last) = data.last_mut() {
        if rem != 0 {
            *last &= !(0xff >> rem);
            if len % 4 != 0 {
                *last |= 0x80 >> rem;
            }
        }
    }
    let mut s = String::with_capacity(data.len() * 2 + 3);
    s.push_str("x{");
    for byte in &data {
        let _ = write!(s, "{byte:02X}");
    }
    // drop the trailing nibble when it holds no data
    if rem != 0 && rem <= 4 {
        s.pop();
    }
    if len % 4 != 0 {
        s.push('_');
    }
    s.push('}');
    s
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bits(pattern: &str) -> Cell {
        let mut b = CellBuilder::new();
        for c in pattern.chars() {
            b.store_bit(c == '1').unwrap();
        }
        b.build().unwrap()
    }

    #[test]
    fn hex_rendering() {
        assert_eq!(to_literal(bits("101").as_ref()), "x{B_}");
        assert_eq!(to_literal(bits("101010").as_ref()), "x{AA_}");
        assert_eq!(to_literal(bits("1010").as_ref()), "x{A}");
        assert_eq!(to_literal(bits("1111111").as_ref()), "x{FF_}");
        assert_eq!(to_literal(bits("1101111010101101").as_ref()), "x{DEAD}");
        assert_eq!(to_literal(super::super::empty().as_ref()), "x{}");
    }

    #[test]
    fn literal_parsing() {
        assert_eq!(parse_literal("x{B_}"), Ok(bits("101")));
        assert_eq!(parse_literal("x{AA_}"), Ok(bits("101010")));
        assert_eq!(parse_literal("x{A}"), Ok(bits("1010")));
        assert_eq!(parse_literal("b{011}"), Ok(bits("011")));
        assert_eq!(parse_literal("x{8_}"), Ok(bits("")));
        assert_eq!(parse_literal("x{0_}"), Err(LiteralError::CompletionTag));
        assert_eq!(parse_literal("x{G}"), Err(LiteralError::Digit('G')));
        assert_eq!(parse_literal("{00}"), Err(LiteralError::Delimiters));
        let long = format!("b{{{}}}", "1".repeat(1024));
        assert_eq!(parse_literal(&long), Err(LiteralError::TooLong(1024)));
    }

    #[test]
    fn literal_matches_rendering() {
        for pattern in ["1", "10", "110", "0001", "10110", "1111111", "100000001"] {
            let cell = bits(pattern);
            assert_eq!(parse_literal(&to_literal(cell.as_ref())), Ok(cell));
        }
    }
}
