//! Bag-of-cells serialization
//!
//! A bag of cells is the standard flat byte encoding of a cell tree, used
//! wherever cells are exchanged as text or files. The layout itself is
//! produced and parsed by `everscale_types::boc::Boc`; this module picks the
//! options used when cells cross the text boundary and wraps the base64 and
//! hex forms.
//!
//! Serialized roots carry a trailing CRC32C by default, marked by bit 6 of
//! the flags byte that follows the `b5ee9c72` magic. Checksummed input is
//! verified on decode.

use base64::{engine::general_purpose, Engine as _};
use everscale_types::boc::Boc;
use thiserror::Error;
use tracing::trace;

use crate::cell::Cell;
use crate::error::CellError;

/// Generic bag-of-cells magic
pub const BOC_MAGIC: u32 = 0xb5ee_9c72;

const FLAG_CRC32C: u8 = 0x40;

const CRC32C: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISCSI);

#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[non_exhaustive]
pub enum BocError {
    #[error("invalid bag of cells: {0}")]
    Decode(String),
    #[error(transparent)]
    Cell(#[from] CellError),
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error("invalid hex: {0}")]
    Hex(String),
}

impl From<base64::DecodeError> for BocError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64(err.to_string())
    }
}

impl From<hex::FromHexError> for BocError {
    fn from(err: hex::FromHexError) -> Self {
        Self::Hex(err.to_string())
    }
}

impl From<everscale_types::boc::de::Error> for BocError {
    fn from(err: everscale_types::boc::de::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type BocResult<T> = std::result::Result<T, BocError>;

/// Optional sections of the serialized form
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BocOptions {
    /// Append a CRC32C of everything before it
    pub crc32c: bool,
}

impl Default for BocOptions {
    fn default() -> Self {
        Self { crc32c: true }
    }
}

/// Serializes the tree rooted at `root`
#[must_use]
pub fn serialize(root: &Cell, opts: BocOptions) -> Vec<u8> {
    let mut bytes = Boc::encode(root);
    if opts.crc32c {
        if let Some(flags) = bytes.get_mut(4) {
            *flags |= FLAG_CRC32C;
        }
        let crc = CRC32C.checksum(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
    }
    trace!(len = bytes.len(), crc32c = opts.crc32c, "serialized bag of cells");
    bytes
}

/// Parses a single-root bag of cells
pub fn deserialize(bytes: &[u8]) -> BocResult<Cell> {
    Ok(Boc::decode(bytes)?)
}

/// Serializes `root` with default options and encodes it as standard base64
#[must_use]
pub fn to_base64(root: &Cell) -> String {
    general_purpose::STANDARD.encode(serialize(root, BocOptions::default()))
}

pub fn from_base64(src: &str) -> BocResult<Cell> {
    deserialize(&general_purpose::STANDARD.decode(src.trim())?)
}

#[must_use]
pub fn to_hex(root: &Cell) -> String {
    hex::encode(serialize(root, BocOptions::default()))
}

pub fn from_hex(src: &str) -> BocResult<Cell> {
    deserialize(&hex::decode(src.trim())?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::{empty, parse_literal, CellBuilder};
    use pretty_assertions::assert_eq;

    fn dummy<T: Send + Sync>() {}

    #[test]
    fn boc_error_threadsafe() {
        dummy::<BocError>()
    }

    fn two_level() -> Cell {
        let mut b = CellBuilder::new();
        b.store_u8(0xab).unwrap();
        b.store_reference(parse_literal("x{B_}").unwrap()).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn empty_cell_vector() {
        assert_eq!(to_base64(&empty()), "te6cckEBAQEAAgAAAEysuc0=");
        assert_eq!(from_base64("te6cckEBAQEAAgAAAEysuc0=").unwrap(), empty());
    }

    #[test]
    fn layout_without_crc() {
        let bytes = serialize(&two_level(), BocOptions { crc32c: false });
        assert_eq!(hex::encode(&bytes), "b5ee9c72010102010007000102ab010001b8");
        assert_eq!(deserialize(&bytes).unwrap(), two_level());
        assert_eq!(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), BOC_MAGIC);
    }

    #[test]
    fn checksummed_layout() {
        let bytes = serialize(&two_level(), BocOptions::default());
        assert_eq!(bytes[4] & FLAG_CRC32C, FLAG_CRC32C);
        assert_eq!(from_hex(&hex::encode(&bytes)).unwrap(), two_level());
    }

    #[test]
    fn shared_cells_stored_once() {
        let leaf = parse_literal("x{010203}").unwrap();
        let mut b = CellBuilder::new();
        b.store_reference(leaf.clone()).unwrap();
        b.store_reference(leaf).unwrap();
        let root = b.build().unwrap();
        let bytes = serialize(&root, BocOptions::default());
        // cell count in the header
        assert_eq!(bytes[6], 2);
        let back = deserialize(&bytes).unwrap();
        assert_eq!(back, root);
        assert_eq!(back.reference_cloned(0), back.reference_cloned(1));
    }

    #[test]
    fn corruption_detected() {
        let mut bytes = serialize(&two_level(), BocOptions::default());
        let n = bytes.len();
        bytes[n - 6] ^= 0x01;
        assert!(matches!(deserialize(&bytes), Err(BocError::Decode(_))));

        let bytes = serialize(&two_level(), BocOptions { crc32c: false });
        assert!(matches!(
            deserialize(&bytes[..bytes.len() - 1]),
            Err(BocError::Decode(_))
        ));
        assert!(matches!(deserialize(&[0, 1, 2, 3]), Err(BocError::Decode(_))));
        assert!(matches!(from_base64("not base64!"), Err(BocError::Base64(_))));
        assert!(matches!(from_hex("b5ee9c7"), Err(BocError::Hex(_))));
    }

    #[test]
    fn deep_chain() {
        let mut cell = empty();
        for i in 0..300u16 {
            let mut b = CellBuilder::new();
            b.store_u16(i).unwrap();
            b.store_reference(cell).unwrap();
            cell = b.build().unwrap();
        }
        let back = from_base64(&to_base64(&cell)).unwrap();
        assert_eq!(back.repr_depth(), 300);
        assert_eq!(back, cell);
    }
}
