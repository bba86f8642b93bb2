//! Assorted imports for working with ABIs and encoded values

pub use crate::address::{AnyAddress, ExternalAddress, FriendlyFlags, StdAddress};
pub use crate::boc::{BocError, BocOptions};
pub use crate::cell::{Cell, CellBuilder, CellSlice};
pub use crate::conv::{
    encode_data, encode_tuple, encode_typed_cell, parse_cell, parse_data, parse_tuple,
    parse_typed_cell, CodecError, CodecResult, ErrorKind,
};
pub use crate::error::{BoundsError, CellError, CellResult};
pub use crate::path::{flatten, unflatten};
pub use crate::schema::{ContractAbi, Field, GetMethod, TypeAbi, TypeInfo};
pub use crate::text::{format_field_value, parse_field_value, parse_raw_object, TextError};
pub use crate::tuple::{TupleBuilder, TupleItem, TupleReader};
pub use crate::value::{NestedObject, ParsedObject, ParsedValue};
