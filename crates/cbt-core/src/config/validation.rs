//! Configuration validation
//!
//! Missing required sections abort at once. Every other check runs to
//! completion and reports into a shared list so one pass surfaces every
//! problem.

use crate::{Error, Result};
use cbt_fs::{Aggregation, NormalizedPath, extract_path, has_glob, io, split_aggregation};
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

use super::project::anchor;
use super::tools::StdErrRedirect;
use super::tree::{kind, lookup, to_string_list};

/// Top-level sections without which nothing else can be checked.
pub const REQUIRED_SECTIONS: &[&str] = &["project", "paths"];

const REQUIRED_VALUES: &[&[&str]] = &[
    &["project", "build_root"],
    &["paths", "test"],
    &["paths", "source"],
];

const THREAD_SETTINGS: &[&str] = &["compile_threads", "test_threads"];

static ARGUMENT_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{\d+\}").unwrap());

/// Validates a fully merged and evaluated tree.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    root: &'a NormalizedPath,
    loaded_plugins: &'a [String],
    check_executables: bool,
}

impl<'a> Validator<'a> {
    pub fn new(root: &'a NormalizedPath, loaded_plugins: &'a [String]) -> Self {
        Self {
            root,
            loaded_plugins,
            check_executables: true,
        }
    }

    /// Skip the on-disk lookup of tool executables.
    pub fn with_executable_checks(mut self, enabled: bool) -> Self {
        self.check_executables = enabled;
        self
    }

    pub fn validate(&self, tree: &Value) -> Result<()> {
        let missing: Vec<String> = REQUIRED_SECTIONS
            .iter()
            .filter(|section| lookup(tree, &[**section]).is_none())
            .map(|section| section.to_string())
            .collect();
        if !missing.is_empty() {
            for section in &missing {
                tracing::error!(section = %section, "Required configuration section missing");
            }
            return Err(Error::RequiredSectionMissing { sections: missing });
        }

        let mut failures = Vec::new();
        self.check_required_values(tree, &mut failures);
        self.check_paths(tree, &mut failures);
        self.check_tools(tree, &mut failures);
        self.check_threads(tree, &mut failures);
        self.check_plugins(tree, &mut failures);

        if failures.is_empty() {
            return Ok(());
        }
        for failure in &failures {
            tracing::error!("{failure}");
        }
        Err(Error::Validation { failures })
    }

    fn check_required_values(&self, tree: &Value, failures: &mut Vec<String>) {
        for path in REQUIRED_VALUES {
            if lookup(tree, path).is_none() {
                failures.push(format!("Required value '{}' is missing", path.join(".")));
            }
        }
    }

    fn check_paths(&self, tree: &Value, failures: &mut Vec<String>) {
        for dir in lookup(tree, &["plugins", "load_paths"])
            .map(to_string_list)
            .unwrap_or_default()
        {
            if !self.resolve(&dir).is_dir() {
                failures.push(format!("Plugin load path '{dir}' does not exist"));
            }
        }

        for (section, literal_only) in [("paths", false), ("files", true)] {
            let Some(entries) = lookup(tree, &[section]).and_then(Value::as_mapping) else {
                continue;
            };
            for (key, specs) in entries {
                let key = key.as_str().unwrap_or_default();
                for spec in to_string_list(specs) {
                    let (operator, path) = split_aggregation(&spec);
                    if operator == Aggregation::Remove || path.is_empty() {
                        continue;
                    }
                    let target = if has_glob(path) {
                        if literal_only {
                            continue;
                        }
                        extract_path(path)
                    } else {
                        path.to_string()
                    };
                    if !target.is_empty() && !self.resolve(&target).exists() {
                        failures.push(format!(
                            "Path '{target}' in {section}.{key} does not exist"
                        ));
                    }
                }
            }
        }

        if let Some(helpers) = lookup(tree, &["cmock", "unity_helper"]) {
            if !matches!(helpers, Value::Bool(false)) {
                for helper in to_string_list(helpers) {
                    if !self.resolve(&helper).is_file() {
                        failures.push(format!("cmock.unity_helper '{helper}' does not exist"));
                    }
                }
            }
        }
    }

    fn check_tools(&self, tree: &Value, failures: &mut Vec<String>) {
        let Some(tools) = lookup(tree, &["tools"]) else {
            return;
        };
        let Some(tools) = tools.as_mapping() else {
            failures.push(format!("'tools' must be a mapping but is a {}", kind(tools)));
            return;
        };

        for (name, tool) in tools {
            let name = name.as_str().unwrap_or_default();
            let Some(tool) = tool.as_mapping() else {
                failures.push(format!(
                    "Tool '{name}' must be a mapping but is a {}",
                    kind(tool)
                ));
                continue;
            };

            let executable = match tool.get("executable") {
                Some(Value::String(exe)) if !exe.trim().is_empty() => Some(exe.as_str()),
                _ => {
                    failures.push(format!("Tool '{name}' needs a non-empty string 'executable'"));
                    None
                }
            };

            if let Some(redirect) = tool.get("stderr_redirect") {
                let valid = redirect
                    .as_str()
                    .is_some_and(|r| StdErrRedirect::parse(r).is_some());
                if !valid {
                    failures.push(format!(
                        "Tool '{name}' has invalid stderr_redirect (expected none, auto or stdout)"
                    ));
                }
            }

            match tool.get("arguments") {
                None | Some(Value::Null) => {}
                Some(Value::Sequence(arguments)) => {
                    if arguments.iter().any(|a| !a.is_string()) {
                        failures.push(format!("Tool '{name}' has non-string arguments"));
                    }
                }
                Some(other) => failures.push(format!(
                    "Tool '{name}' arguments must be a sequence but are a {}",
                    kind(other)
                )),
            }

            let optional = tool.get("optional").and_then(Value::as_bool).unwrap_or(false);
            if let Some(executable) = executable {
                if self.check_executables
                    && !optional
                    && !ARGUMENT_PLACEHOLDER.is_match(executable)
                    && io::find_executable(executable).is_none()
                {
                    failures.push(format!(
                        "Tool '{name}' executable '{executable}' not found on disk or in PATH"
                    ));
                }
            }
        }
    }

    fn check_threads(&self, tree: &Value, failures: &mut Vec<String>) {
        for setting in THREAD_SETTINGS {
            let Some(value) = lookup(tree, &["project", *setting]) else {
                continue;
            };
            let valid = match value {
                Value::Number(n) => n.as_u64().is_some_and(|n| n >= 1),
                Value::String(s) => s == "auto",
                _ => false,
            };
            if !valid {
                failures.push(format!(
                    "project.{setting} must be an integer of at least 1 or 'auto'"
                ));
            }
        }
    }

    fn check_plugins(&self, tree: &Value, failures: &mut Vec<String>) {
        for plugin in lookup(tree, &["plugins", "enabled"])
            .map(to_string_list)
            .unwrap_or_default()
        {
            if !self.loaded_plugins.contains(&plugin) {
                failures.push(format!(
                    "Plugin '{plugin}' not found in any load path with build rules or a script"
                ));
            }
        }
    }

    fn resolve(&self, path: &str) -> NormalizedPath {
        NormalizedPath::new(anchor(self.root, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn thread_counts_accept_auto() {
        let root = NormalizedPath::new(".");
        let mut failures = Vec::new();
        Validator::new(&root, &[]).check_threads(
            &yaml("project: {compile_threads: auto, test_threads: 0}"),
            &mut failures,
        );
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("test_threads"));
    }

    #[test]
    fn placeholder_executables_are_not_looked_up() {
        let root = NormalizedPath::new(".");
        let mut failures = Vec::new();
        Validator::new(&root, &[]).check_tools(
            &yaml("tools: {test_fixture: {executable: '${1}', arguments: []}}"),
            &mut failures,
        );
        assert!(failures.is_empty(), "{failures:?}");
    }

    #[test]
    fn tool_structure_problems_are_each_reported() {
        let root = NormalizedPath::new(".");
        let mut failures = Vec::new();
        Validator::new(&root, &[])
            .with_executable_checks(false)
            .check_tools(
                &yaml("tools: {a: gcc, b: {executable: '', stderr_redirect: loud, arguments: -c}}"),
                &mut failures,
            );
        assert_eq!(failures.len(), 4, "{failures:?}");
    }
}
