use indexmap::IndexMap;
use serde_yaml::Value;

use super::tree::scalar_to_string;

/// Flatten a configuration tree one level deep.
///
/// `section.child` becomes `section_child`. A section holding a sequence of
/// single-key mappings (the `environment` layout) flattens each entry as
/// `section_key`; any other top-level value keeps the section name. Names
/// are lowercased and null sections are skipped.
pub fn flatten(tree: &Value) -> IndexMap<String, Value> {
    let mut flat = IndexMap::new();
    let Some(sections) = tree.as_mapping() else {
        return flat;
    };

    for (section, value) in sections {
        let Some(section) = scalar_to_string(section) else {
            continue;
        };
        let section = section.to_lowercase();

        match value {
            Value::Null => {}
            Value::Mapping(children) => {
                for (child, child_value) in children {
                    if let Some(child) = scalar_to_string(child) {
                        flat.insert(
                            format!("{section}_{}", child.to_lowercase()),
                            child_value.clone(),
                        );
                    }
                }
            }
            Value::Sequence(items) if is_keyed_sequence(items) => {
                let entries = items
                    .iter()
                    .filter_map(|item| item.as_mapping().and_then(|m| m.iter().next()));
                for (key, item_value) in entries {
                    if let Some(key) = scalar_to_string(key) {
                        flat.insert(
                            format!("{section}_{}", key.to_lowercase()),
                            item_value.clone(),
                        );
                    }
                }
            }
            other => {
                flat.insert(section, other.clone());
            }
        }
    }

    flat
}

fn is_keyed_sequence(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|item| item.as_mapping().is_some_and(|m| m.len() == 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn joins_section_and_child() {
        let flat = flatten(&yaml("project: {build_root: build, Debug: true}"));
        assert_eq!(flat["project_build_root"], Value::from("build"));
        assert_eq!(flat["project_debug"], Value::Bool(true));
    }

    #[test]
    fn keyed_sequences_flatten_per_entry() {
        let flat = flatten(&yaml("environment:\n  - path: [a, b]\n  - cflags: -O2"));
        assert_eq!(flat["environment_path"], yaml("[a, b]"));
        assert_eq!(flat["environment_cflags"], Value::from("-O2"));
    }

    #[test]
    fn scalars_and_plain_sequences_keep_their_name() {
        let flat = flatten(&yaml("version: 3\nenvironment: []\nempty: ~"));
        assert_eq!(flat["version"], yaml("3"));
        assert_eq!(flat["environment"], yaml("[]"));
        assert!(!flat.contains_key("empty"));
    }

    #[test]
    fn flattening_is_idempotent_for_identical_input() {
        let tree = yaml("paths: {test: [test]}\ntools: {cc: {executable: gcc}}");
        assert_eq!(flatten(&tree), flatten(&tree));
    }
}
