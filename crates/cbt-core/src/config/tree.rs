//! Configuration tree helpers
//!
//! The configuration tree is a [`serde_yaml::Value`] whose mappings keep
//! insertion order. A YAML `null` (an empty key) is treated as absent by
//! every helper here.

use crate::{Error, Result};
use cbt_fs::{ConfigStore, NormalizedPath};
use serde_yaml::{Mapping, Value};

/// Deep merge `overlay` into `base`.
///
/// Mappings merge key by key, recursing into entries present on both sides.
/// Any other overlay value (sequences included) replaces the base value. A
/// null overlay never clobbers an existing value.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => {
                        base_map.insert(key.clone(), overlay_val.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Fill gaps in `tree` from `defaults`, two levels deep.
///
/// A missing section is copied whole. Inside an existing section, only
/// missing entries are added; an entry the tree already has (a complete
/// tool, say) is left exactly as it is.
pub fn fill_defaults(tree: &mut Value, defaults: &Value) {
    let (Some(tree_map), Some(default_map)) = (tree.as_mapping_mut(), defaults.as_mapping()) else {
        return;
    };

    for (section, default_section) in default_map {
        match tree_map.get_mut(section) {
            None | Some(Value::Null) => {
                tree_map.insert(section.clone(), default_section.clone());
            }
            Some(Value::Mapping(existing)) => {
                let Some(default_entries) = default_section.as_mapping() else {
                    continue;
                };
                for (entry, value) in default_entries {
                    if matches!(existing.get(entry), None | Some(Value::Null)) {
                        existing.insert(entry.clone(), value.clone());
                    }
                }
            }
            Some(_) => {}
        }
    }
}

/// Follow `path` through nested mappings.
pub fn lookup<'a>(tree: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = tree;
    for segment in path {
        current = current.as_mapping()?.get(*segment)?;
    }
    (!current.is_null()).then_some(current)
}

pub fn lookup_mut<'a>(tree: &'a mut Value, path: &[&str]) -> Option<&'a mut Value> {
    let mut current = tree;
    for segment in path {
        current = current.as_mapping_mut()?.get_mut(*segment)?;
    }
    (!current.is_null()).then_some(current)
}

/// Boolean at `path`; missing or non-boolean values count as false.
pub fn flag(tree: &Value, path: &[&str]) -> bool {
    lookup(tree, path).and_then(Value::as_bool).unwrap_or(false)
}

/// Mapping stored under `key`, created when absent or null.
///
/// Returns `None` when `tree` is not a mapping or `key` holds some other
/// kind of value.
pub fn ensure_mapping<'a>(tree: &'a mut Value, key: &str) -> Option<&'a mut Mapping> {
    let map = tree.as_mapping_mut()?;
    if matches!(map.get(key), None | Some(Value::Null)) {
        map.insert(Value::from(key), Value::Mapping(Mapping::new()));
    }
    map.get_mut(key)?.as_mapping_mut()
}

/// Scalar rendered as text; `None` for null, sequences and mappings.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

/// Strings of a single value or an arbitrarily nested sequence.
pub fn to_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().flat_map(to_string_list).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

/// Human readable kind of a value, for error messages.
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Load a configuration fragment from disk.
///
/// An empty document yields an empty mapping; any other non-mapping
/// document is malformed.
pub fn load_fragment(store: &ConfigStore, path: &NormalizedPath) -> Result<Value> {
    let value: Value = store.load(path).map_err(|e| match e {
        cbt_fs::Error::Io { path, source } => Error::ConfigLoad {
            path,
            message: source.to_string(),
        },
        cbt_fs::Error::ConfigParse { path, message, .. } => Error::MalformedFragment {
            origin: path.display().to_string(),
            message,
        },
        other => Error::Fs(other),
    })?;

    match value {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        Value::Mapping(_) => Ok(value),
        other => Err(Error::MalformedFragment {
            origin: path.to_string(),
            message: format!("expected a mapping at top level but found a {}", kind(&other)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn deep_merge_recurses_and_replaces_sequences() {
        let mut base = yaml("a: {x: 1, list: [1, 2]}\nb: keep");
        deep_merge(&mut base, &yaml("a: {y: 2, list: [3]}"));
        assert_eq!(base, yaml("a: {x: 1, list: [3], y: 2}\nb: keep"));
    }

    #[test]
    fn null_overlay_never_clobbers() {
        let mut base = yaml("project: {build_root: build}");
        deep_merge(&mut base, &yaml("project: {build_root: ~}"));
        assert_eq!(base, yaml("project: {build_root: build}"));
    }

    #[test]
    fn fill_defaults_keeps_user_entries_whole() {
        let mut tree = yaml("tools: {test_compiler: {executable: clang}}");
        fill_defaults(
            &mut tree,
            &yaml("tools: {test_compiler: {executable: gcc, arguments: [-c]}, test_linker: {executable: gcc}}"),
        );
        assert_eq!(
            tree,
            yaml("tools: {test_compiler: {executable: clang}, test_linker: {executable: gcc}}")
        );
    }

    #[test]
    fn lookup_treats_null_as_absent() {
        let tree = yaml("project: {debug: ~, build_root: out}");
        assert!(lookup(&tree, &["project", "debug"]).is_none());
        assert_eq!(lookup(&tree, &["project", "build_root"]), Some(&Value::from("out")));
        assert!(!flag(&tree, &["project", "debug"]));
    }

    #[test]
    fn to_string_list_flattens_nesting() {
        assert_eq!(to_string_list(&yaml("[a, [b, [c]], 4]")), ["a", "b", "c", "4"]);
        assert_eq!(to_string_list(&yaml("single")), ["single"]);
        assert!(to_string_list(&Value::Null).is_empty());
    }

    #[test]
    fn later_fragment_wins_on_shared_leaf() {
        let first = yaml("project: {shared: first, a: 1}");
        let second = yaml("project: {shared: second, b: 2}");

        let mut forward = Value::Mapping(Mapping::new());
        deep_merge(&mut forward, &first);
        deep_merge(&mut forward, &second);
        assert_eq!(forward, yaml("project: {shared: second, a: 1, b: 2}"));

        let mut backward = Value::Mapping(Mapping::new());
        deep_merge(&mut backward, &second);
        deep_merge(&mut backward, &first);
        assert_eq!(backward, yaml("project: {shared: first, a: 1, b: 2}"));
    }

    fn fragment(prefix: &str, entries: &BTreeMap<String, i64>) -> Value {
        let mut section = Mapping::new();
        for (key, value) in entries {
            section.insert(Value::from(format!("{prefix}_{key}")), Value::from(*value));
        }
        let mut root = Mapping::new();
        root.insert(Value::from("project"), Value::Mapping(section.clone()));
        root.insert(Value::from(format!("{prefix}_section")), Value::Mapping(section));
        Value::Mapping(root)
    }

    fn merged(fragments: &[&Value]) -> Value {
        let mut tree = Value::Mapping(Mapping::new());
        for fragment in fragments {
            deep_merge(&mut tree, fragment);
        }
        tree
    }

    proptest! {
        #[test]
        fn disjoint_fragments_merge_in_any_order(
            a in prop::collection::btree_map("[a-z]{1,4}", any::<i64>(), 0..4),
            b in prop::collection::btree_map("[a-z]{1,4}", any::<i64>(), 0..4),
            c in prop::collection::btree_map("[a-z]{1,4}", any::<i64>(), 0..4),
        ) {
            let (a, b, c) = (fragment("a", &a), fragment("b", &b), fragment("c", &c));
            let forward = merged(&[&a, &b, &c]);
            prop_assert_eq!(&forward, &merged(&[&c, &a, &b]));
            prop_assert_eq!(&forward, &merged(&[&b, &c, &a]));
        }
    }

    #[test]
    fn ensure_mapping_refuses_to_overwrite_scalars() {
        let mut tree = yaml("plugins: ~\nname: x");
        assert!(ensure_mapping(&mut tree, "plugins").is_some());
        assert!(ensure_mapping(&mut tree, "name").is_none());
    }
}
