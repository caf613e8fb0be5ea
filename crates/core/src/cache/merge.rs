//! Structural delta merge of JSON documents.
//!
//! Walks the incoming document depth-first over an explicit stack and folds it
//! into a copy of the cached one:
//!
//! - keys missing from the cached copy are added
//! - nested maps present on both sides are descended into
//! - anything else (scalars, lists, map-vs-scalar) is replaced when unequal
//!
//! Lists are compared and replaced as a whole, never merged per element.
//! Keys present only in the cached copy are kept.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::Error;

/// Deepest map nesting the merge will descend into.
pub const MAX_MERGE_DEPTH: usize = 256;

/// Result of merging a fresh document into a cached one.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub merged: Value,
    /// Dotted paths whose value was added or replaced.
    pub changed_paths: BTreeSet<String>,
}

impl MergeOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.changed_paths.is_empty()
    }
}

enum Action<'a> {
    Insert,
    Descend(&'a Map<String, Value>),
    Replace,
    Keep,
}

/// Merge `incoming` into `cached`.
///
/// When either root is not a map the incoming document replaces the cached
/// one wholesale and the change is recorded under the empty path.
///
/// # Errors
///
/// Returns [`Error::MergeTooDeep`] if maps nest deeper than [`MAX_MERGE_DEPTH`].
pub fn merge_documents(cached: &Value, incoming: &Value) -> Result<MergeOutcome, Error> {
    let mut merged = cached.clone();
    let mut changed_paths = BTreeSet::new();

    let (Value::Object(_), Value::Object(incoming_root)) = (cached, incoming) else {
        if cached != incoming {
            merged = incoming.clone();
            changed_paths.insert(String::new());
        }
        return Ok(MergeOutcome { merged, changed_paths });
    };

    let mut stack: Vec<(Vec<String>, &Map<String, Value>)> = vec![(Vec::new(), incoming_root)];

    while let Some((path, incoming_map)) = stack.pop() {
        if path.len() > MAX_MERGE_DEPTH {
            return Err(Error::MergeTooDeep(MAX_MERGE_DEPTH));
        }
        // Only pushed when both sides are maps at this path.
        let Some(target) = object_at_mut(&mut merged, &path) else {
            continue;
        };

        for (key, value) in incoming_map {
            let action = match (target.get(key), value) {
                (None, _) => Action::Insert,
                (Some(Value::Object(_)), Value::Object(child)) => Action::Descend(child),
                (Some(existing), _) if existing != value => Action::Replace,
                _ => Action::Keep,
            };

            let mut child_path = path.clone();
            child_path.push(key.clone());

            match action {
                Action::Insert | Action::Replace => {
                    target.insert(key.clone(), value.clone());
                    changed_paths.insert(child_path.join("."));
                }
                Action::Descend(child) => stack.push((child_path, child)),
                Action::Keep => {}
            }
        }
    }

    Ok(MergeOutcome { merged, changed_paths })
}

fn object_at_mut<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Map<String, Value>> {
    let mut current = root;
    for key in path {
        current = current.as_object_mut()?.get_mut(key)?;
    }
    current.as_object_mut()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_identical_is_noop() {
        let doc = json!({
            "title": "Kyoto",
            "days": [{"activities": [{"title": "Fushimi Inari"}]}],
            "budget": {"currency": "JPY", "total": 120000}
        });
        let outcome = merge_documents(&doc, &doc).unwrap();
        assert_eq!(outcome.merged, doc);
        assert!(outcome.is_unchanged());
    }

    #[test]
    fn test_merge_nested_change_and_addition() {
        let old = json!({"a": {"b": 1, "c": 2}});
        let new = json!({"a": {"b": 1, "c": 3, "d": 4}});
        let outcome = merge_documents(&old, &new).unwrap();

        assert_eq!(outcome.merged, json!({"a": {"b": 1, "c": 3, "d": 4}}));
        assert_eq!(outcome.changed_paths, paths(&["a.c", "a.d"]));
    }

    #[test]
    fn test_merge_keeps_keys_absent_from_incoming() {
        let old = json!({"title": "Trip", "notes": "local only"});
        let new = json!({"title": "Trip v2"});
        let outcome = merge_documents(&old, &new).unwrap();

        assert_eq!(outcome.merged, json!({"title": "Trip v2", "notes": "local only"}));
        assert_eq!(outcome.changed_paths, paths(&["title"]));
    }

    #[test]
    fn test_lists_replace_wholesale() {
        let old = json!({"days": [{"title": "A"}, {"title": "B"}]});
        let new = json!({"days": [{"title": "A"}, {"title": "B"}, {"title": "C"}]});
        let outcome = merge_documents(&old, &new).unwrap();

        assert_eq!(outcome.merged, new);
        assert_eq!(outcome.changed_paths, paths(&["days"]));
    }

    #[test]
    fn test_map_replaced_by_scalar() {
        let old = json!({"hotel": {"name": "Ritz"}});
        let new = json!({"hotel": null});
        let outcome = merge_documents(&old, &new).unwrap();

        assert_eq!(outcome.merged, json!({"hotel": null}));
        assert_eq!(outcome.changed_paths, paths(&["hotel"]));
    }

    #[test]
    fn test_non_map_roots_replace() {
        let outcome = merge_documents(&json!([1, 2]), &json!([1, 2, 3])).unwrap();
        assert_eq!(outcome.merged, json!([1, 2, 3]));
        assert_eq!(outcome.changed_paths, paths(&[""]));

        let same = merge_documents(&json!("x"), &json!("x")).unwrap();
        assert!(same.is_unchanged());
    }

    #[test]
    fn test_depth_bound() {
        fn nested(depth: usize, leaf: i64) -> Value {
            let mut value = json!(leaf);
            for _ in 0..depth {
                value = json!({ "n": value });
            }
            value
        }

        let within = merge_documents(&nested(50, 1), &nested(50, 2)).unwrap();
        assert_eq!(within.changed_paths.len(), 1);

        let too_deep = merge_documents(&nested(MAX_MERGE_DEPTH + 2, 1), &nested(MAX_MERGE_DEPTH + 2, 2));
        assert!(matches!(too_deep, Err(Error::MergeTooDeep(_))));
    }
}
