//! Pure operations on JSON documents: get, put, and delete at a path.
//!
//! All three are total and deterministic. `put` and `delete` take the
//! document by value and return the new document; callers never observe a
//! partially applied modification.

use crate::path::Path;
use crate::Value;
use serde_json::Map;

/// Descend object keys along `path`.
///
/// Returns `None` as soon as a segment is missing or the current value is
/// not an object. The empty path returns the whole document.
pub fn get<'a>(value: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.segments() {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Place `new` at `path`, creating missing intermediate objects.
///
/// A non-object intermediate (including the root) is overwritten by a fresh
/// object containing the remainder of the path. The empty path replaces the
/// whole document.
pub fn put(value: Value, path: &Path, new: Value) -> Value {
    put_at(value, path.segments(), new)
}

fn put_at(value: Value, segments: &[String], new: Value) -> Value {
    match segments.split_first() {
        None => new,
        Some((head, rest)) => {
            let mut map = match value {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            let child = map.entry(head.clone()).or_insert(Value::Null);
            let old = std::mem::replace(child, Value::Null);
            *child = put_at(old, rest, new);
            Value::Object(map)
        }
    }
}

/// Remove the key at the final segment of `path` if its parent is an object.
///
/// A no-op when the path does not lead to an object key. Deleting the root
/// replaces the document with `null`.
pub fn delete(value: Value, path: &Path) -> Value {
    if path.is_empty() {
        return Value::Null;
    }
    delete_at(value, path.segments())
}

fn delete_at(mut value: Value, segments: &[String]) -> Value {
    let (head, rest) = segments.split_first().expect("segments are non-empty");
    if let Value::Object(map) = &mut value {
        if rest.is_empty() {
            map.shift_remove(head);
        } else if let Some(child) = map.get_mut(head) {
            let old = std::mem::replace(child, Value::Null);
            *child = delete_at(old, rest);
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(uri: &str) -> Path {
        Path::from_uri(uri)
    }

    #[test]
    fn get_after_put_returns_put_value() {
        let value = put(json!({}), &path("a/b"), json!(42));
        assert_eq!(get(&value, &path("a/b")), Some(&json!(42)));
    }

    #[test]
    fn get_after_put_from_arbitrary_roots() {
        for root in [json!(null), json!(5), json!([1, 2]), json!({"a": {"x": 1}})] {
            let value = put(root, &path("a/b"), json!("v"));
            assert_eq!(get(&value, &path("a/b")), Some(&json!("v")));
        }
    }

    #[test]
    fn get_empty_path_returns_whole_document() {
        let value = json!({"a": 1});
        assert_eq!(get(&value, &Path::root()), Some(&value));
    }

    #[test]
    fn get_missing_key_or_non_object_is_none() {
        let value = json!({"a": {"b": 1}, "s": "text"});
        assert_eq!(get(&value, &path("a/x")), None);
        assert_eq!(get(&value, &path("s/deep")), None);
        assert_eq!(get(&value, &path("a/b/c")), None);
    }

    #[test]
    fn put_creates_intermediate_objects() {
        let value = put(json!(null), &path("a/b/c"), json!(1));
        assert_eq!(value, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn put_overwrites_non_object_intermediate() {
        let value = put(json!({"x": 5}), &path("x/y"), json!(7));
        assert_eq!(value, json!({"x": {"y": 7}}));
    }

    #[test]
    fn put_at_root_replaces_document() {
        assert_eq!(put(json!({"a": 1}), &Path::root(), json!([1])), json!([1]));
    }

    #[test]
    fn put_preserves_sibling_keys_and_order() {
        let value = put(json!({"a": 1, "b": 2, "c": 3}), &path("b"), json!(9));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"a":1,"b":9,"c":3}"#
        );
    }

    #[test]
    fn delete_after_put_removes_value() {
        let value = put(json!({}), &path("a/b"), json!(1));
        let value = delete(value, &path("a/b"));
        assert_eq!(get(&value, &path("a/b")), None);
        // The parent object remains.
        assert_eq!(get(&value, &path("a")), Some(&json!({})));
    }

    #[test]
    fn delete_missing_path_is_identity() {
        let original = json!({"a": {"b": 1}, "n": 5});
        for uri in ["a/x", "n/deep", "missing", "a/b/c"] {
            assert_eq!(delete(original.clone(), &path(uri)), original);
        }
    }

    #[test]
    fn delete_root_yields_null() {
        assert_eq!(delete(json!({"a": 1}), &Path::root()), json!(null));
    }

    #[test]
    fn delete_preserves_sibling_order() {
        let value = delete(json!({"a": 1, "b": 2, "c": 3}), &path("b"));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":1,"c":3}"#);
    }

    #[test]
    fn disjoint_puts_commute() {
        let base = json!({"keep": true});
        let p = path("left/x");
        let q = path("right/y");
        let one = put(put(base.clone(), &p, json!(1)), &q, json!(2));
        let two = put(put(base, &q, json!(2)), &p, json!(1));
        assert_eq!(get(&one, &p), get(&two, &p));
        assert_eq!(get(&one, &q), get(&two, &q));
    }

    #[test]
    fn numbers_keep_precision() {
        let value = put(
            json!(null),
            &path("n"),
            serde_json::from_str("123456789012345678901234567890.1").unwrap(),
        );
        assert_eq!(
            serde_json::to_string(get(&value, &path("n")).unwrap()).unwrap(),
            "123456789012345678901234567890.1"
        );
    }
}
