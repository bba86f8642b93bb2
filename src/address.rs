//! Account addresses and their cell and text encodings
//!
//! Three address shapes can occur in a cell, distinguished by a two-bit tag:
//!
//! | Tag  | Shape                  | Layout after tag                                  |
//! |------|------------------------|---------------------------------------------------|
//! | `00` | none                   | (nothing)                                         |
//! | `01` | external               | 9-bit length `n`, then `n` bits                   |
//! | `10` | standard (internal)    | anycast bit (`0`), 8-bit signed workchain, 256-bit account |
//!
//! The fourth tag `11` (variable-length internal address) is not supported,
//! and neither is a standard address with anycast information; both are
//! rejected on read.
//!
//! Standard addresses additionally have two textual forms: the *raw* form
//! `workchain:hex`, and the *user-friendly* form, a 48-character base64
//! string over 36 bytes consisting of a flags byte, the workchain, the
//! account id, and a CRC-16 checksum.

use std::fmt::Display;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use num_bigint::BigUint;

use crate::cell::{ops, CellBuilder, CellSlice};
use crate::error::{CellError, CellResult};

/// Width of the length field of an external address
pub const EXTERNAL_LEN_BITS: usize = 9;

/// Maximum number of bits an external address may carry
pub const EXTERNAL_MAX_BITS: u16 = (1 << EXTERNAL_LEN_BITS) - 1;

const TAG_NONE: u64 = 0b00;
const TAG_EXTERNAL: u64 = 0b01;
const TAG_STD: u64 = 0b10;

const STD_BITS: usize = 2 + 1 + 8 + 256;

const CRC16: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_XMODEM);

const FLAG_BOUNCEABLE: u8 = 0x11;
const FLAG_NON_BOUNCEABLE: u8 = 0x51;
const FLAG_TESTNET: u8 = 0x80;

/// Errors raised when reading or parsing an address
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AddressError {
    /// Two-bit address tag was not one of the supported shapes
    #[error("unsupported address tag {0:#04b}")]
    InvalidTag(u8),
    /// Standard address carried anycast information
    #[error("anycast addresses are not supported")]
    Anycast,
    /// External address longer than its 9-bit length field allows
    #[error("external address of {0} bits exceeds the maximum of 511")]
    ExternalTooLong(usize),
    /// Text was neither a raw nor a user-friendly address
    #[error("invalid address string {0:?}")]
    Format(String),
    /// User-friendly address failed its CRC-16 check
    #[error("checksum mismatch in address {0:?}")]
    Checksum(String),
    /// Underlying cell read failed
    #[error(transparent)]
    Cell(#[from] CellError),
}

/// CRC-16/XMODEM, as used by user-friendly addresses and get-method ids
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Standard internal address: a workchain and a 256-bit account id
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct StdAddress {
    pub workchain: i8,
    pub account: [u8; 32],
}

/// Flags carried by the user-friendly form of a [`StdAddress`]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FriendlyFlags {
    pub bounceable: bool,
    pub testnet: bool,
    pub url_safe: bool,
}

impl Default for FriendlyFlags {
    fn default() -> Self {
        Self {
            bounceable: true,
            testnet: false,
            url_safe: true,
        }
    }
}

impl StdAddress {
    #[must_use]
    pub const fn new(workchain: i8, account: [u8; 32]) -> Self {
        Self { workchain, account }
    }

    /// Renders the raw `workchain:hex` form
    #[must_use]
    pub fn to_raw_string(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.account))
    }

    /// Renders the 48-character user-friendly form
    #[must_use]
    pub fn to_friendly(&self, flags: FriendlyFlags) -> String {
        let mut buf = [0u8; 36];
        buf[0] = if flags.bounceable {
            FLAG_BOUNCEABLE
        } else {
            FLAG_NON_BOUNCEABLE
        };
        if flags.testnet {
            buf[0] |= FLAG_TESTNET;
        }
        buf[1] = self.workchain as u8;
        buf[2..34].copy_from_slice(&self.account);
        let crc = crc16(&buf[..34]);
        buf[34..].copy_from_slice(&crc.to_be_bytes());
        if flags.url_safe {
            general_purpose::URL_SAFE.encode(buf)
        } else {
            general_purpose::STANDARD.encode(buf)
        }
    }

    /// Parses the raw `workchain:hex` form
    pub fn parse_raw(src: &str) -> Result<Self, AddressError> {
        let err = || AddressError::Format(src.to_owned());
        let (wc, account) = src.split_once(':').ok_or_else(err)?;
        let workchain = wc.parse::<i8>().map_err(|_| err())?;
        let mut buf = [0u8; 32];
        hex::decode_to_slice(account, &mut buf).map_err(|_| err())?;
        Ok(Self::new(workchain, buf))
    }

    /// Parses the user-friendly form, returning the flags it carried
    pub fn parse_friendly(src: &str) -> Result<(Self, FriendlyFlags), AddressError> {
        let err = || AddressError::Format(src.to_owned());
        if src.len() != 48 {
            return Err(err());
        }
        let url_safe = src.contains(['-', '_']);
        let engine = if url_safe {
            &general_purpose::URL_SAFE
        } else {
            &general_purpose::STANDARD
        };
        let bytes = engine.decode(src).map_err(|_| err())?;
        let buf: [u8; 36] = bytes.try_into().map_err(|_| err())?;

        let crc = u16::from_be_bytes([buf[34], buf[35]]);
        if crc16(&buf[..34]) != crc {
            return Err(AddressError::Checksum(src.to_owned()));
        }
        let testnet = buf[0] & FLAG_TESTNET != 0;
        let bounceable = match buf[0] & !FLAG_TESTNET {
            FLAG_BOUNCEABLE => true,
            FLAG_NON_BOUNCEABLE => false,
            _ => return Err(err()),
        };
        let mut account = [0u8; 32];
        account.copy_from_slice(&buf[2..34]);
        Ok((
            Self::new(buf[1] as i8, account),
            FriendlyFlags {
                bounceable,
                testnet,
                url_safe,
            },
        ))
    }
}

/// Formats as the bounceable, mainnet, url-safe user-friendly form.
impl Display for StdAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_friendly(FriendlyFlags::default()))
    }
}

/// Accepts either the raw or the user-friendly form.
impl FromStr for StdAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(':') {
            Self::parse_raw(s)
        } else {
            Self::parse_friendly(s).map(|(addr, _)| addr)
        }
    }
}

/// External address: up to [`EXTERNAL_MAX_BITS`] bits of opaque data,
/// held as an unsigned integer of known bit-length
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ExternalAddress {
    value: BigUint,
    bits: u16,
}

impl ExternalAddress {
    /// Constructs an external address of `bits` bits holding `value`
    pub fn new(value: BigUint, bits: usize) -> Result<Self, AddressError> {
        if bits > EXTERNAL_MAX_BITS as usize || value.bits() as usize > bits {
            return Err(AddressError::ExternalTooLong(
                bits.max(value.bits() as usize),
            ));
        }
        Ok(Self {
            value,
            bits: bits as u16,
        })
    }

    #[must_use]
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    #[must_use]
    pub fn bits(&self) -> usize {
        self.bits as usize
    }
}

impl Display for ExternalAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "External<{}:{}>", self.bits, self.value)
    }
}

/// Accepts the `External<bits:value>` form produced by [`Display`].
impl FromStr for ExternalAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AddressError::Format(s.to_owned());
        let (bits, value) = s
            .strip_prefix("External<")
            .and_then(|rest| rest.strip_suffix('>'))
            .and_then(|body| body.split_once(':'))
            .ok_or_else(err)?;
        let bits = bits.parse::<usize>().map_err(|_| err())?;
        let value = value.parse::<BigUint>().map_err(|_| err())?;
        Self::new(value, bits)
    }
}

/// Any address that may appear in a cell
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum AnyAddress {
    None,
    External(ExternalAddress),
    Std(StdAddress),
}

impl From<StdAddress> for AnyAddress {
    fn from(addr: StdAddress) -> Self {
        Self::Std(addr)
    }
}

impl From<ExternalAddress> for AnyAddress {
    fn from(addr: ExternalAddress) -> Self {
        Self::External(addr)
    }
}

impl AnyAddress {
    /// Writes the address in its tagged cell layout
    pub fn store_into(&self, b: &mut CellBuilder) -> CellResult<()> {
        match self {
            Self::None => {
                ops::ensure_capacity(b, 2, 0)?;
                b.store_uint(TAG_NONE, 2)?;
            }
            Self::External(ext) => {
                ops::ensure_capacity(b, 2 + EXTERNAL_LEN_BITS + ext.bits(), 0)?;
                b.store_uint(TAG_EXTERNAL, 2)?;
                b.store_uint(u64::from(ext.bits), EXTERNAL_LEN_BITS as u16)?;
                ops::store_big_uint(b, &ext.value, ext.bits())?;
            }
            Self::Std(std) => {
                ops::ensure_capacity(b, STD_BITS, 0)?;
                b.store_uint(TAG_STD, 2)?;
                b.store_bit_zero()?;
                b.store_u8(std.workchain as u8)?;
                b.store_raw(&std.account, 256)?;
            }
        }
        Ok(())
    }

    /// Reads an address in its tagged cell layout.
    ///
    /// On failure the slice is left where it was.
    pub fn load_from(s: &mut CellSlice<'_>) -> Result<Self, AddressError> {
        let mut cursor = s.clone();
        let tag = ops::load_uint(&mut cursor, 2)?;
        let addr = match tag {
            TAG_NONE => Self::None,
            TAG_EXTERNAL => {
                let bits = ops::load_uint(&mut cursor, EXTERNAL_LEN_BITS)? as usize;
                let value = ops::load_big_uint(&mut cursor, bits)?;
                Self::External(ExternalAddress::new(value, bits)?)
            }
            TAG_STD => {
                if cursor.load_bit().map_err(CellError::from)? {
                    return Err(AddressError::Anycast);
                }
                let workchain = ops::load_int(&mut cursor, 8)? as i8;
                let mut account = [0u8; 32];
                let mut buf = [0u8; 128];
                let raw = cursor.load_raw(&mut buf, 256).map_err(CellError::from)?;
                account.copy_from_slice(raw);
                Self::Std(StdAddress::new(workchain, account))
            }
            tag => return Err(AddressError::InvalidTag(tag as u8)),
        };
        *s = cursor;
        Ok(addr)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::Cell;
    use pretty_assertions::assert_eq;

    const ZERO_FRIENDLY: &str = "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c";

    fn roundtrip(addr: &AnyAddress) -> AnyAddress {
        let mut b = CellBuilder::new();
        addr.store_into(&mut b).unwrap();
        let cell = b.build().unwrap();
        let mut s = ops::open(cell.as_ref()).unwrap();
        let ret = AnyAddress::load_from(&mut s).unwrap();
        assert!(ops::is_exhausted(&s));
        ret
    }

    #[test]
    fn checksum() {
        assert_eq!(crc16(b"123456789"), 0x31c3);
        assert_eq!(crc16(b""), 0);
    }

    #[test]
    fn friendly_forms() {
        let zero = StdAddress::new(0, [0; 32]);
        assert_eq!(zero.to_string(), ZERO_FRIENDLY);
        let non_bounce = FriendlyFlags {
            bounceable: false,
            ..FriendlyFlags::default()
        };
        assert_eq!(
            zero.to_friendly(non_bounce),
            "UQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAJKZ"
        );
        let master = StdAddress::new(-1, [0x55; 32]);
        assert_eq!(
            master.to_string(),
            "Ef9VVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVbxn"
        );
        let (parsed, flags) =
            StdAddress::parse_friendly("kf9VVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVVQft").unwrap();
        assert_eq!(parsed, master);
        assert!(flags.testnet && flags.bounceable);
    }

    #[test]
    fn text_errors() {
        assert!(matches!(
            "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9d".parse::<StdAddress>(),
            Err(AddressError::Checksum(_))
        ));
        assert!(matches!(
            "0:abc".parse::<StdAddress>(),
            Err(AddressError::Format(_))
        ));
        let raw = format!("-1:{}", "55".repeat(32));
        assert_eq!(
            raw.parse::<StdAddress>().unwrap(),
            StdAddress::new(-1, [0x55; 32])
        );
        assert_eq!(StdAddress::new(-1, [0x55; 32]).to_raw_string(), raw);
    }

    #[test]
    fn cell_layouts() {
        let none = AnyAddress::None;
        assert_eq!(roundtrip(&none), none);

        let ext = AnyAddress::External(ExternalAddress::new(BigUint::from(5u8), 3).unwrap());
        assert_eq!(roundtrip(&ext), ext);

        let std = AnyAddress::Std(StdAddress::new(-1, [0xab; 32]));
        let mut b = CellBuilder::new();
        std.store_into(&mut b).unwrap();
        assert_eq!(usize::from(b.build().unwrap().bit_len()), 267);
        assert_eq!(roundtrip(&std), std);
    }

    #[test]
    fn external_text_form() {
        let ext = ExternalAddress::new(BigUint::from(4660u32), 20).unwrap();
        assert_eq!(ext.to_string(), "External<20:4660>");
        assert_eq!("External<20:4660>".parse::<ExternalAddress>().unwrap(), ext);
        assert!(matches!(
            "External<2:4660>".parse::<ExternalAddress>(),
            Err(AddressError::ExternalTooLong(_))
        ));
        for bad in ["External<20>", "External<x:1>", "Ext<3:1>"] {
            assert!(
                matches!(bad.parse::<ExternalAddress>(), Err(AddressError::Format(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn rejects_unsupported_shapes() {
        let mut b = CellBuilder::new();
        b.store_uint(0b11, 2).unwrap();
        let cell = b.build().unwrap();
        let mut s = ops::open(cell.as_ref()).unwrap();
        assert_eq!(
            AnyAddress::load_from(&mut s),
            Err(AddressError::InvalidTag(0b11))
        );

        let mut b = CellBuilder::new();
        b.store_uint(0b101, 3).unwrap();
        b.store_uint(0, 64).unwrap();
        let cell: Cell = b.build().unwrap();
        let mut s = ops::open(cell.as_ref()).unwrap();
        assert_eq!(AnyAddress::load_from(&mut s), Err(AddressError::Anycast));
        assert_eq!(s.size_bits(), 67);

        let mut b = CellBuilder::new();
        b.store_uint(0b1, 2).unwrap();
        b.store_reference(crate::cell::empty()).unwrap();
        b.store_uint(4, 9).unwrap();
        let cell = b.build().unwrap();
        let mut s = ops::open(cell.as_ref()).unwrap();
        assert!(matches!(
            AnyAddress::load_from(&mut s),
            Err(AddressError::Cell(CellError::Underflow))
        ));
        assert_eq!(s.size_bits(), 11);

        assert!(ExternalAddress::new(BigUint::from(1u8), 512).is_err());
        assert!(ExternalAddress::new(BigUint::from(8u8), 3).is_err());
    }
}
