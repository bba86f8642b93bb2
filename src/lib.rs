//! Schema-directed transcoding of Tolk contract data
//!
//! # Overview
//!
//! Contracts written in Tolk exchange data with the outside world in two
//! shapes: bit-packed trees of *cells*, used for persistent storage and
//! message bodies, and flat lists of VM *stack items*, used for the
//! parameters and results of read-only get-methods. The compiler describes
//! the layout of every struct, message, and storage type in an ABI; this
//! crate reads that ABI and converts between those wire forms and a generic,
//! dynamically-typed [`ParsedObject`].
//!
//! The library is layered bottom-up:
//!
//! * [`cell`] provides the cell substrate: immutable hashed [`Cell`]s and
//!   the [`CellBuilder`] and [`CellSlice`] used to write and read them come
//!   from `everscale-types`, with wide-integer accessors and `x{...}`
//!   literals added here. [`varint`] and [`address`] add the
//!   variable-length integer and address layouts on top;
//! * [`boc`] serializes whole cell trees to the standard bag-of-cells byte
//!   form, and [`tuple`] models stack items and their cell serialization;
//! * [`schema`] holds the ABI model ([`TypeInfo`], [`TypeAbi`],
//!   [`ContractAbi`]) and [`value`] the value model;
//! * [`conv`] is the schema-directed codec proper, with one module per wire
//!   form and the message, storage, and get-method conveniences;
//! * [`path`] and [`text`] sit at the user-facing boundary, converting
//!   between nested objects and dotted-key forms, and between values and
//!   their text renderings.
//!
//! # Example
//!
//! ```
//! use tolk_abi::prelude::*;
//!
//! let abi = ContractAbi::new(
//!     "Geometry",
//!     vec![TypeAbi::new(
//!         "Point",
//!         vec![Field::new("x", TypeInfo::int(32)), Field::new("y", TypeInfo::int(32))],
//!     )],
//! );
//! let point = abi.find_type("Point").unwrap();
//! let obj = ParsedObject::new().with("x", 10).with("y", -20);
//!
//! let cell = encode_data(&abi, point, &obj).unwrap();
//! assert_eq!(cell.bit_len(), 64);
//! assert_eq!(parse_cell(&abi, point, &cell).unwrap(), obj);
//! ```
//!
//! # Features
//!
//! * `serde_impls`: derives `serde` support for the ABI model, so that the
//!   compiler's JSON output can be loaded directly;
//! * `check_complete_parse`: makes cell decoding reject input with bits or
//!   references left over after the last field.

pub mod address;
pub mod boc;
pub mod cell;
pub mod conv;
pub mod error;
pub mod path;
pub mod prelude;
pub mod schema;
pub mod text;
pub mod tuple;
pub mod value;
pub mod varint;

#[doc(inline)]
pub use crate::cell::{Cell, CellBuilder, CellSlice};
#[doc(inline)]
pub use crate::schema::{ContractAbi, TypeAbi, TypeInfo};
#[doc(inline)]
pub use crate::value::{NestedObject, ParsedObject, ParsedValue};
