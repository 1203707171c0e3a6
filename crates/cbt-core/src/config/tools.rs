//! Tool definitions
//!
//! A tool is a mapping under `tools` naming an executable and its argument
//! template. Tool setup completes each entry in place; the typed
//! [`ToolDefinition`] view is read back from the flattened configuration.

use crate::expression::{ExpressionContext, contains_expression};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;

use super::tree::{kind, lookup, lookup_mut};

/// Tool entries contributed by the built-in default layers.
pub const DEFAULT_TOOL_NAMES: &[&str] = &[
    "test_compiler",
    "test_linker",
    "test_fixture",
    "test_shallow_includes_preprocessor",
    "test_nested_includes_preprocessor",
    "test_file_preprocessor",
    "test_file_preprocessor_directives",
    "test_assembler",
    "release_compiler",
    "release_linker",
    "release_assembler",
];

/// Prefix of top-level sections that supplement a tool's arguments.
pub const SUPPLEMENT_PREFIX: &str = "tools_";

/// Where a tool's standard error stream goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdErrRedirect {
    #[default]
    None,
    Auto,
    Stdout,
}

impl StdErrRedirect {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "auto" => Some(Self::Auto),
            "stdout" => Some(Self::Stdout),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Auto => "auto",
            Self::Stdout => "stdout",
        }
    }
}

impl fmt::Display for StdErrRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully set up tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub executable: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub stderr_redirect: StdErrRedirect,
    #[serde(default)]
    pub optional: bool,
}

/// Complete every tool entry in place.
///
/// Fills `name` from the key, evaluates expressions in `executable` and
/// defaults `stderr_redirect` and `optional`. A tool that is not a mapping
/// aborts immediately.
pub fn setup(tree: &mut Value, context: &ExpressionContext) -> Result<()> {
    let Some(tools) = lookup_mut(tree, &["tools"]).and_then(Value::as_mapping_mut) else {
        return Ok(());
    };

    for (key, tool) in tools.iter_mut() {
        let name = key.as_str().unwrap_or_default().to_string();
        let Value::Mapping(tool) = tool else {
            return Err(Error::MalformedFragment {
                origin: format!("tools.{name}"),
                message: format!("expected a mapping but found a {}", kind(tool)),
            });
        };

        if matches!(tool.get("name"), None | Some(Value::Null)) {
            tool.insert("name".into(), Value::from(name.as_str()));
        }

        if let Some(Value::String(executable)) = tool.get_mut("executable") {
            if contains_expression(executable) {
                *executable = context.substitute(executable)?;
            }
        }

        if matches!(tool.get("stderr_redirect"), None | Some(Value::Null)) {
            tool.insert(
                "stderr_redirect".into(),
                StdErrRedirect::None.as_str().into(),
            );
        }
        if matches!(tool.get("optional"), None | Some(Value::Null)) {
            tool.insert("optional".into(), Value::Bool(false));
        }
        tracing::trace!(tool = %name, "Tool set up");
    }

    Ok(())
}

/// Remove the built-in default tools from `tools`.
pub fn reset_defaults(tree: &mut Value) {
    if let Some(tools) = lookup_mut(tree, &["tools"]).and_then(Value::as_mapping_mut) {
        for name in DEFAULT_TOOL_NAMES {
            tools.shift_remove(*name);
        }
    }
}

/// Append top-level `tools_<name>: {arguments: [...]}` lists to the
/// flattened tool entries.
pub fn supplement_arguments(tree: &Value, flat: &mut IndexMap<String, Value>) -> Result<()> {
    let Some(tools) = lookup(tree, &["tools"]).and_then(Value::as_mapping) else {
        return Ok(());
    };

    for name in tools.keys().filter_map(Value::as_str) {
        let section = format!("{SUPPLEMENT_PREFIX}{name}");
        let Some(extra) = lookup(tree, &[section.as_str(), "arguments"]) else {
            continue;
        };
        let Value::Sequence(extra) = extra else {
            return Err(Error::MalformedFragment {
                origin: format!("{section}.arguments"),
                message: format!("expected a sequence but found a {}", kind(extra)),
            });
        };

        let Some(Value::Mapping(tool)) = flat.get_mut(&section) else {
            tracing::warn!(tool = name, "No built tool to supplement arguments for");
            continue;
        };
        match tool.get_mut("arguments") {
            Some(Value::Sequence(arguments)) => arguments.extend(extra.iter().cloned()),
            _ => {
                tool.insert("arguments".into(), Value::Sequence(extra.clone()));
            }
        }
        tracing::debug!(tool = name, added = extra.len(), "Supplemented tool arguments");
    }

    Ok(())
}
