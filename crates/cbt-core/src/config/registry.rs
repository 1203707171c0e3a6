//! Flattened configuration registry
//!
//! [`FlatConfig`] is the queryable result of a resolution pass: a single
//! level of qualified names bound to resolved values, the lazily resolved
//! file collections, and the top-level sections re-exposed by name.
//! Well-known names get typed read-only accessors; everything else is
//! reachable through [`FlatConfig::get`].

use crate::{Error, Result};
use cbt_fs::FileList;
use indexmap::IndexMap;
use serde_yaml::Value;

use super::tools::ToolDefinition;
use super::tree::to_string_list;

macro_rules! str_accessors {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&self) -> Option<&str> {
                self.get_str(stringify!($name))
            }
        )*
    };
}

macro_rules! list_accessors {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&self) -> Vec<String> {
                self.get_list(stringify!($name))
            }
        )*
    };
}

macro_rules! flag_accessors {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&self) -> bool {
                self.get_bool(stringify!($name))
            }
        )*
    };
}

macro_rules! collection_accessors {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&self) -> Option<&FileList> {
                self.collection(stringify!($name))
            }
        )*
    };
}

/// Single-level view of a resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatConfig {
    values: IndexMap<String, Value>,
    collections: IndexMap<String, FileList>,
    sections: IndexMap<String, Value>,
}

impl FlatConfig {
    pub fn new(values: IndexMap<String, Value>, collections: IndexMap<String, FileList>) -> Self {
        Self {
            values,
            collections,
            sections: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Strings held by `key`; a single string is a one-element list.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key).map(to_string_list).unwrap_or_default()
    }

    /// Flattened names in build order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A lazily resolved file collection such as `collection_all_tests`.
    pub fn collection(&self, name: &str) -> Option<&FileList> {
        self.collections.get(name)
    }

    pub fn collections(&self) -> impl Iterator<Item = (&str, &FileList)> {
        self.collections.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A top-level section re-exposed by `build` or `supplement`.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// The set-up tool named `name` under `tools`.
    pub fn tool(&self, name: &str) -> Result<ToolDefinition> {
        let key = format!("tools_{name}");
        let value = self
            .get(&key)
            .ok_or_else(|| Error::UnknownKey { key: key.clone() })?;
        Ok(serde_yaml::from_value(value.clone())?)
    }

    str_accessors!(
        project_build_root,
        project_test_file_prefix,
        project_build_artifacts_root,
        project_build_tests_root,
        project_build_release_root,
        project_test_artifacts_path,
        project_test_runners_path,
        project_test_results_path,
        project_test_build_output_path,
        project_test_build_cache_path,
        project_test_dependencies_path,
        project_test_preprocess_includes_path,
        project_test_preprocess_files_path,
        project_release_artifacts_path,
        project_release_build_output_path,
        project_release_build_cache_path,
        project_release_dependencies_path,
        project_log_path,
        project_temp_path,
        extension_header,
        extension_source,
        extension_assembly,
        extension_object,
        extension_executable,
        cmock_mock_prefix,
        cmock_mock_path,
    );

    list_accessors!(
        paths_test,
        paths_source,
        paths_support,
        paths_include,
        files_test,
        files_source,
        files_support,
        files_include,
        plugins_load_paths,
        plugins_enabled,
        project_build_paths,
        project_rule_component_files,
        collection_paths_test,
        collection_paths_source,
        collection_paths_support,
        collection_paths_include,
        collection_paths_source_and_include,
        collection_paths_test_support_source_include,
    );

    flag_accessors!(
        project_debug,
        project_release_build,
        project_use_test_preprocessor,
        project_use_mocks,
        project_use_exceptions,
        test_build_use_assembly,
        release_build_use_assembly,
        plugins_display_raw_test_results,
    );

    collection_accessors!(
        collection_all_tests,
        collection_all_source,
        collection_all_headers,
        collection_all_support,
        collection_all_assembly,
    );

    pub(crate) fn values_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.values
    }

    pub(crate) fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub(crate) fn expose_section(&mut self, name: &str, value: Value) {
        self.sections.insert(name.to_string(), value);
    }
}
