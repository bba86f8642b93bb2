//! Dotted-path views of nested objects
//!
//! Form-style front-ends address nested fields with dotted keys such as
//! `"config.owner.workchain"`. [`flatten`] turns a nested [`ParsedObject`]
//! into such a single-level mapping, and [`unflatten`] groups dotted keys
//! back into [`NestedObject`] wrappers, one per distinct prefix, each named
//! after its own path segment.
//!
//! Undefined and [`Null`](ParsedValue::Null) leaves are carried through in
//! both directions. A nested object with no fields, or with an undefined
//! body, has no leaves and so does not appear in the flattened form.

use crate::value::{NestedObject, ParsedObject, ParsedValue};

/// Path separator
pub const SEPARATOR: char = '.';

/// Errors raised by [`unflatten`]
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PathError {
    /// Key had an empty segment (leading, trailing, or doubled separator)
    #[error("empty path segment in key {0:?}")]
    EmptySegment(String),
    /// Same path used both as a leaf and as a prefix of other keys
    #[error("path {0:?} is used both as a value and as a nested object")]
    Conflict(String),
}

/// Flattens nested objects into dotted keys.
#[must_use]
pub fn flatten(nested: &ParsedObject) -> ParsedObject {
    let mut ret = ParsedObject::new();
    flatten_into(&mut ret, nested, None);
    ret
}

fn flatten_into(acc: &mut ParsedObject, obj: &ParsedObject, prefix: Option<&str>) {
    for (key, value) in obj.iter() {
        let full = match prefix {
            Some(p) => format!("{p}{SEPARATOR}{key}"),
            None => key.to_owned(),
        };
        match value {
            Some(ParsedValue::Nested(n)) => {
                if let Some(inner) = &n.value {
                    flatten_into(acc, inner, Some(&full));
                }
            }
            other => acc.set(full, other.cloned()),
        }
    }
}

/// Groups dotted keys into nested objects.
///
/// Entries are processed in order; nested wrappers appear at the position of
/// the first key that introduced them.
pub fn unflatten(flat: &ParsedObject) -> Result<ParsedObject, PathError> {
    let mut ret = ParsedObject::new();
    for (key, value) in flat.iter() {
        let segments: Vec<&str> = key.split(SEPARATOR).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(PathError::EmptySegment(key.to_owned()));
        }
        insert_path(&mut ret, &segments, value.cloned(), key)?;
    }
    Ok(ret)
}

fn insert_path(
    obj: &mut ParsedObject,
    segments: &[&str],
    value: Option<ParsedValue>,
    key: &str,
) -> Result<(), PathError> {
    let conflict = || PathError::Conflict(key.to_owned());
    match segments {
        [] => Ok(()),
        [leaf] => {
            if matches!(obj.get(leaf), Some(ParsedValue::Nested(_))) {
                return Err(conflict());
            }
            obj.set(*leaf, value);
            Ok(())
        }
        [head, rest @ ..] => {
            let mut child = match obj.entry(head) {
                None => ParsedObject::new(),
                Some(Some(ParsedValue::Nested(NestedObject {
                    value: Some(inner), ..
                }))) => inner.clone(),
                Some(_) => return Err(conflict()),
            };
            insert_path(&mut child, rest, value, key)?;
            obj.insert(*head, ParsedValue::nested(*head, child));
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn groups_by_prefix() {
        let flat = ParsedObject::new()
            .with("a.b.c", 42)
            .with("a.b.d", ParsedValue::Null)
            .with("a.e", true)
            .with("f", 1);
        let nested = unflatten(&flat).unwrap();

        let b = ParsedObject::new()
            .with("c", 42)
            .with("d", ParsedValue::Null);
        let a = ParsedObject::new()
            .with("b", ParsedValue::nested("b", b))
            .with("e", true);
        let expected = ParsedObject::new()
            .with("a", ParsedValue::nested("a", a))
            .with("f", 1);
        assert_eq!(nested, expected);
        assert_eq!(nested.keys().collect::<Vec<_>>(), ["a", "f"]);
        assert_eq!(flatten(&nested), flat);
    }

    #[test]
    fn undefined_leaves_survive() {
        let mut flat = ParsedObject::new();
        flat.set("x.y", None);
        flat.set("z", None);
        let nested = unflatten(&flat).unwrap();
        let x = nested.get("x").and_then(ParsedValue::as_nested).unwrap();
        assert_eq!(x.value.as_ref().unwrap().entry("y"), Some(None));
        assert_eq!(flatten(&nested), flat);
    }

    #[test]
    fn flatten_drops_wrapper_names() {
        let nested = ParsedObject::new().with(
            "ref",
            ParsedValue::nested("Cell<Point>", ParsedObject::new().with("x", 1)),
        );
        assert_eq!(flatten(&nested), ParsedObject::new().with("ref.x", 1));
    }

    #[test]
    fn rejects_malformed_keys() {
        for key in ["", ".a", "a.", "a..b"] {
            let flat = ParsedObject::new().with(key, 1);
            assert_eq!(unflatten(&flat), Err(PathError::EmptySegment(key.into())));
        }
        let flat = ParsedObject::new().with("a", 1).with("a.b", 2);
        assert_eq!(unflatten(&flat), Err(PathError::Conflict("a.b".into())));
        let flat = ParsedObject::new().with("a.b", 2).with("a", 1);
        assert_eq!(unflatten(&flat), Err(PathError::Conflict("a".into())));
    }

    fn leaf() -> impl Strategy<Value = Option<ParsedValue>> {
        prop_oneof![
            Just(None),
            Just(Some(ParsedValue::Null)),
            any::<i64>().prop_map(|i| Some(ParsedValue::from(i))),
            any::<bool>().prop_map(|b| Some(ParsedValue::from(b))),
        ]
    }

    proptest! {
        #[test]
        fn flatten_inverts_unflatten(
            entries in proptest::collection::btree_map(
                proptest::collection::vec("[a-c]", 1..4).prop_map(|v| v.join(".")),
                leaf(),
                0..12,
            )
        ) {
            let flat: ParsedObject = entries.into_iter().collect();
            match unflatten(&flat) {
                Ok(nested) => prop_assert_eq!(flatten(&nested), flat),
                Err(PathError::Conflict(_)) => {}
                Err(e) => prop_assert!(false, "unexpected error {}", e),
            }
        }
    }
}
