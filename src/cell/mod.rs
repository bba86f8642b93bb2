//! Cells and their read/write cursors
//!
//! A [`Cell`] is the unit of storage of the VM: up to [`MAX_BITS`] bits of
//! data together with up to [`MAX_REFS`] references to other cells, forming
//! a directed acyclic graph. The cell model itself ([`Cell`], [`DynCell`],
//! [`CellBuilder`] and [`CellSlice`]) comes from `everscale-types`; this
//! module adds the pieces the codecs need on top of it:
//!
//! * [`ops`] reads and writes integers of arbitrary width, the
//!   variable-length integer forms, and whole sub-spans of a slice;
//! * [`literal`] parses and renders the `x{...}`/`b{...}` literals used by
//!   VM tooling for bit strings.
//!
//! Only ordinary cells are read; exotic cells surface as
//! [`CellError::Exotic`](crate::error::CellError::Exotic).

pub use everscale_types::cell::{Cell, CellBuilder, CellFamily, CellSlice, DynCell, HashBytes};

pub mod literal;
pub mod ops;

pub use literal::{parse_literal, to_literal, LiteralError};

/// Maximum number of data bits held by a single cell
pub const MAX_BITS: usize = 1023;

/// Maximum number of references held by a single cell
pub const MAX_REFS: usize = 4;

/// Returns the shared cell with no data and no references
#[inline]
#[must_use]
pub fn empty() -> Cell {
    Cell::empty_cell()
}

/// Renders a cell tree one cell per line, children indented below their
/// parent
#[must_use]
pub fn display_tree(cell: &DynCell) -> String {
    fn walk(cell: &DynCell, indent: usize, out: &mut String) {
        if indent > 0 {
            out.push('\n');
        }
        out.push_str(&" ".repeat(indent));
        out.push_str(&to_literal(cell));
        for ix in 0..cell.reference_count() {
            if let Some(child) = cell.reference(ix) {
                walk(child, indent + 1, out);
            }
        }
    }

    let mut out = String::new();
    walk(cell, 0, &mut out);
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_cell_hash() {
        assert_eq!(
            hex::encode(empty().repr_hash().0),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
    }

    #[test]
    fn depth_and_identity() {
        let leaf = parse_literal("x{01}").unwrap();
        let mut b = CellBuilder::new();
        b.store_reference(leaf.clone()).unwrap();
        let mid = b.build().unwrap();
        let mut b = CellBuilder::new();
        b.store_reference(mid.clone()).unwrap();
        b.store_reference(leaf.clone()).unwrap();
        let top = b.build().unwrap();
        assert_eq!(leaf.repr_depth(), 0);
        assert_eq!(top.repr_depth(), 2);

        assert_eq!(leaf, parse_literal("b{00000001}").unwrap());
        assert_ne!(leaf, mid);
    }

    #[test]
    fn tree_rendering() {
        let leaf = parse_literal("x{AB}").unwrap();
        let mut b = CellBuilder::new();
        b.store_uint(0b101, 3).unwrap();
        b.store_reference(leaf).unwrap();
        let top = b.build().unwrap();
        assert_eq!(display_tree(top.as_ref()), "x{B_}\n x{AB}");
    }
}
