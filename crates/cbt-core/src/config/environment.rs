//! Environment section evaluation and export

use crate::expression::{ExpressionContext, contains_expression, path_list_separator};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use super::tree::{kind, lookup_mut, scalar_to_string};

/// Destination for exported environment variables.
pub trait EnvironmentSink {
    fn set(&mut self, name: &str, value: &str);
}

/// Exports into the environment of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl EnvironmentSink for ProcessEnvironment {
    fn set(&mut self, name: &str, value: &str) {
        // SAFETY: resolution runs single-threaded and completes before any
        // consumer thread that could read the environment is started.
        unsafe { std::env::set_var(name, value) }
    }
}

/// Records exports instead of applying them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordedEnvironment {
    vars: IndexMap<String, String>,
}

impl RecordedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Exported variables in export order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvironmentSink for RecordedEnvironment {
    fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }
}

/// Evaluate and export every `environment` entry.
///
/// Entries are single-key mappings in a sequence, or the keys of a mapping.
/// Values are strings or lists; list items are joined with the platform
/// path-list separator for `path` and concatenated otherwise. The joined
/// value replaces the entry in the tree, is exported uppercased, and is
/// visible to expressions of later entries.
pub fn evaluate(
    tree: &mut Value,
    context: &mut ExpressionContext,
    sink: &mut dyn EnvironmentSink,
) -> Result<()> {
    let Some(environment) = lookup_mut(tree, &["environment"]) else {
        return Ok(());
    };

    match environment {
        Value::Sequence(entries) => {
            for entry in entries.iter_mut() {
                let Value::Mapping(entry) = entry else {
                    return Err(malformed(format!(
                        "expected single-key mappings but found a {}",
                        kind(entry)
                    )));
                };
                export_all(entry, context, sink)?;
            }
        }
        Value::Mapping(entries) => export_all(entries, context, sink)?,
        other => {
            return Err(malformed(format!(
                "expected a sequence or mapping but found a {}",
                kind(other)
            )));
        }
    }

    Ok(())
}

fn export_all(
    entries: &mut Mapping,
    context: &mut ExpressionContext,
    sink: &mut dyn EnvironmentSink,
) -> Result<()> {
    for (key, value) in entries.iter_mut() {
        let Some(name) = scalar_to_string(key) else {
            return Err(malformed(format!("unusable variable name of kind {}", kind(key))));
        };

        let items = match &*value {
            Value::Sequence(items) => items.iter().map(item_text).collect::<Result<Vec<_>>>()?,
            single => vec![item_text(single)?],
        };

        let mut evaluated = Vec::with_capacity(items.len());
        for item in items {
            evaluated.push(if contains_expression(&item) {
                context.substitute(&item)?
            } else {
                item
            });
        }

        let interstitial = if name.eq_ignore_ascii_case("path") {
            path_list_separator()
        } else {
            ""
        };
        let joined = evaluated.join(interstitial);
        let exported = name.to_uppercase();

        sink.set(&exported, &joined);
        context.set_var(exported.as_str(), joined.as_str());
        tracing::debug!(variable = %exported, value = %joined, "Exported environment variable");

        *value = Value::String(joined);
    }
    Ok(())
}

fn item_text(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        other => scalar_to_string(other).ok_or_else(|| {
            malformed(format!("expected a string value but found a {}", kind(other)))
        }),
    }
}

fn malformed(message: String) -> Error {
    Error::MalformedFragment {
        origin: "environment".into(),
        message,
    }
}
