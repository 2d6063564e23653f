//! Layered merging of configuration records.
//!
//! A child layer wins over its parent. Nested records merge field by field
//! when the parent already has them; everything else is replaced wholesale.

use std::collections::BTreeMap;

/// Produce a new value from `self` (parent) overridden by `over` (child).
///
/// Neither input is modified.
pub trait Merge {
    fn merge(&self, over: &Self) -> Self;
}

/// Maps merge key by key; a key in `over` replaces the parent's entry,
/// including when the child's value is "absent".
impl<V: Clone> Merge for BTreeMap<String, V> {
    fn merge(&self, over: &Self) -> Self {
        let mut merged = self.clone();
        for (key, value) in over {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// Scalar field: the child's value replaces the parent's when present.
pub fn replace<T: Clone>(base: &Option<T>, over: &Option<T>) -> Option<T> {
    over.as_ref().or(base.as_ref()).cloned()
}

/// Nested record: recurse when both layers have it, otherwise take whichever
/// side is present.
pub fn merge_nested<T: Merge + Clone>(base: &Option<T>, over: &Option<T>) -> Option<T> {
    match (base, over) {
        (Some(b), Some(o)) => Some(b.merge(o)),
        (_, Some(o)) => Some(o.clone()),
        (b, None) => b.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_merge_keeps_parent_only_keys() {
        let base = BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]);
        let over = BTreeMap::from([("b".to_string(), 20), ("c".to_string(), 30)]);
        let merged = base.merge(&over);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 20);
        assert_eq!(merged["c"], 30);
        assert_eq!(base.len(), 2, "parent untouched");
        assert_eq!(over.len(), 2, "child untouched");
    }

    #[test]
    fn absent_child_value_still_overrides() {
        let base = BTreeMap::from([("accept".to_string(), Some("text/html".to_string()))]);
        let over = BTreeMap::from([("accept".to_string(), None::<String>)]);
        assert_eq!(base.merge(&over)["accept"], None);
    }

    #[test]
    fn replace_prefers_child() {
        assert_eq!(replace(&Some(1), &Some(2)), Some(2));
        assert_eq!(replace(&Some(1), &None), Some(1));
        assert_eq!(replace::<i32>(&None, &None), None);
    }

    #[test]
    fn nested_merge_recurses_only_when_parent_has_it() {
        let base = Some(BTreeMap::from([("x".to_string(), 1)]));
        let over = Some(BTreeMap::from([("y".to_string(), 2)]));
        let merged = merge_nested(&base, &over).unwrap();
        assert_eq!(merged.len(), 2);

        let merged = merge_nested(&None, &over).unwrap();
        assert_eq!(merged, BTreeMap::from([("y".to_string(), 2)]));
    }
}
