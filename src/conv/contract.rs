//! Message, storage, and get-method conveniences on [`ContractAbi`]

use std::borrow::Cow;

use tracing::debug;

use super::{cell, tuple, CodecError, CodecResult};
use crate::cell::{ops, Cell, CellSlice};
use crate::schema::{ContractAbi, Field, GetMethod, TypeAbi, TypeInfo};
use crate::tuple::{TupleItem, TupleReader};
use crate::value::ParsedObject;

/// Name of the synthetic struct wrapping a non-struct get-method result
pub const RESULT_TYPE: &str = "getMethodResult";

impl ContractAbi {
    /// Finds the message whose opcode prefixes the unread part of `body`.
    ///
    /// Messages without an opcode never match. If several opcodes match, the
    /// first declared message wins.
    #[must_use]
    pub fn message_by_opcode(&self, body: &CellSlice<'_>) -> Option<&TypeAbi> {
        self.messages.iter().find(|m| match m.opcode() {
            Some((opcode, width)) => matches!(ops::preload_uint(body, width), Ok(v) if v == opcode),
            None => false,
        })
    }

    /// Decodes a message body, selecting its type by opcode.
    ///
    /// Returns the matched definition along with the decoded fields.
    pub fn parse_message(&self, body: &Cell) -> CodecResult<(&TypeAbi, ParsedObject)> {
        let s = ops::open(body.as_ref())?;
        let ty = self.message_by_opcode(&s).ok_or_else(|| {
            // leading 32 bits, or whatever is there
            let width = usize::from(s.size_bits().min(32));
            CodecError::UnknownMessage {
                prefix: ops::preload_uint(&s, width).unwrap_or_default(),
            }
        })?;
        debug!(message = %ty.name, "matched message opcode");
        Ok((ty, cell::parse_cell(self, ty, body)?))
    }

    /// Returns the declared storage layout, or [`CodecError::Unsupported`]
    pub fn storage_type(&self) -> CodecResult<&TypeAbi> {
        self.storage
            .as_ref()
            .ok_or_else(|| CodecError::Unsupported("contract storage".into()))
    }

    /// Selects `name`, one of [`types`](Self::types), as the storage layout
    /// when the ABI does not declare one.
    ///
    /// Returns `false` if no such type exists; an existing storage layout is
    /// never replaced.
    pub fn select_storage(&mut self, name: &str) -> bool {
        if self.storage.is_some() {
            return self.find_type(name).is_some();
        }
        match self.find_type(name).cloned() {
            Some(ty) => {
                self.storage = Some(ty);
                true
            }
            None => false,
        }
    }

    pub fn parse_storage(&self, data: &Cell) -> CodecResult<ParsedObject> {
        cell::parse_cell(self, self.storage_type()?, data)
    }

    pub fn encode_storage(&self, obj: &ParsedObject) -> CodecResult<Cell> {
        cell::encode_data(self, self.storage_type()?, obj)
    }

    /// Builds the parameter tuple for a call to the get-method `name`
    pub fn encode_get_method_args(
        &self,
        name: &str,
        args: &ParsedObject,
    ) -> CodecResult<Vec<TupleItem>> {
        let method = self
            .get_method(name)
            .ok_or_else(|| CodecError::Unsupported(format!("get-method '{name}'")))?;
        let params = TypeAbi::new(method.name.as_str(), method.parameters.clone());
        tuple::encode_tuple(self, &params, args)
    }

    /// Decodes the result of the get-method with numeric id `id`.
    ///
    /// A struct return type is decoded as that struct; any other type is
    /// decoded as a single field named `value`.
    pub fn parse_get_method_result(
        &self,
        id: u32,
        reader: &mut TupleReader,
    ) -> CodecResult<ParsedObject> {
        let method = self
            .get_method_by_id(id)
            .ok_or_else(|| CodecError::Unsupported(format!("get-method id {id}")))?;
        let ty = result_type(self, method)?;
        tuple::parse_tuple(self, &ty, reader)
    }
}

fn result_type<'a>(abi: &'a ContractAbi, method: &GetMethod) -> CodecResult<Cow<'a, TypeAbi>> {
    Ok(match method.return_type.resolve_alias() {
        TypeInfo::Struct { name } => Cow::Borrowed(
            abi.find_type(name)
                .ok_or_else(|| CodecError::UnknownStruct(name.clone()))?,
        ),
        _ => Cow::Owned(TypeAbi::new(
            RESULT_TYPE,
            vec![Field::new(super::ANON_FIELD, method.return_type.clone())],
        )),
    })
}
