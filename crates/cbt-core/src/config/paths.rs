//! Path evaluation and normalization passes
//!
//! Both passes visit the same set of path-bearing values:
//! `project.build_root`, `release_build.artifacts`, every entry of `paths`
//! and `files`, every tool `executable`, and every second-level key whose
//! name ends in `_path` or `_paths`. Plugins opt into path handling through
//! that naming convention alone.

use crate::Result;
use crate::expression::{ExpressionContext, contains_expression};
use cbt_fs::standardize;
use serde_yaml::Value;

use super::tree::lookup_mut;

const LIST_SECTIONS: &[&str] = &["paths", "files"];

/// Evaluate embedded expressions in every path-bearing value.
pub fn evaluate(tree: &mut Value, context: &ExpressionContext) -> Result<()> {
    reform_lists(tree);
    visit(tree, &mut |path| {
        if contains_expression(path) {
            *path = context.substitute(path)?;
        }
        Ok(())
    })
}

/// Normalize every path-bearing value.
///
/// `paths` and `files` entries end up as flat lists of strings.
pub fn standardize_all(tree: &mut Value) -> Result<()> {
    reform_lists(tree);
    visit(tree, &mut |path| {
        *path = standardize(path);
        Ok(())
    })
}

/// Whether a key opts into path handling by name.
pub fn is_path_key(key: &str) -> bool {
    key.ends_with("_path") || key.ends_with("_paths")
}

/// Turn single strings into one-element lists and flatten nested lists.
fn reform_lists(tree: &mut Value) {
    for section in LIST_SECTIONS {
        let Some(Value::Mapping(entries)) = lookup_mut(tree, &[*section]) else {
            continue;
        };
        for (_, value) in entries.iter_mut() {
            match value {
                Value::String(_) => *value = Value::Sequence(vec![value.clone()]),
                Value::Sequence(items) if items.iter().any(Value::is_sequence) => {
                    *value = Value::Sequence(flatten_sequence(items));
                }
                _ => {}
            }
        }
    }
}

fn flatten_sequence(items: &[Value]) -> Vec<Value> {
    items
        .iter()
        .flat_map(|item| match item {
            Value::Sequence(nested) => flatten_sequence(nested),
            other => vec![other.clone()],
        })
        .collect()
}

fn visit(tree: &mut Value, f: &mut dyn FnMut(&mut String) -> Result<()>) -> Result<()> {
    if let Some(root) = lookup_mut(tree, &["project", "build_root"]) {
        visit_strings(root, f)?;
    }
    if let Some(artifacts) = lookup_mut(tree, &["release_build", "artifacts"]) {
        visit_strings(artifacts, f)?;
    }
    for section in LIST_SECTIONS {
        if let Some(Value::Mapping(entries)) = lookup_mut(tree, &[*section]) {
            for (_, value) in entries.iter_mut() {
                visit_strings(value, f)?;
            }
        }
    }
    if let Some(Value::Mapping(tools)) = lookup_mut(tree, &["tools"]) {
        for (_, tool) in tools.iter_mut() {
            if let Value::Mapping(tool) = tool {
                if let Some(executable) = tool.get_mut("executable") {
                    visit_strings(executable, f)?;
                }
            }
        }
    }

    let Some(sections) = tree.as_mapping_mut() else {
        return Ok(());
    };
    for (_, section) in sections.iter_mut() {
        let Value::Mapping(children) = section else {
            continue;
        };
        for (key, value) in children.iter_mut() {
            if key.as_str().is_some_and(is_path_key) {
                visit_strings(value, f)?;
            }
        }
    }
    Ok(())
}

fn visit_strings(value: &mut Value, f: &mut dyn FnMut(&mut String) -> Result<()>) -> Result<()> {
    match value {
        Value::String(s) => f(s),
        Value::Sequence(items) => items.iter_mut().try_for_each(|item| visit_strings(item, f)),
        _ => Ok(()),
    }
}
