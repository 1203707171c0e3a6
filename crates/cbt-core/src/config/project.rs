//! Derived build layout and file collections
//!
//! Everything here is computed from values that are already flattened:
//! build directories below `project.build_root` and the `collection_*`
//! entries built from `paths` and `files`. Relative path specifications are
//! anchored at the project root before touching the filesystem.

use crate::{Error, Result};
use cbt_fs::{FileList, NormalizedPath, collect_paths, revise_file_list, split_aggregation};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::path::Path;

use super::tree::{flag, lookup, to_string_list};

const TESTS_BASE: &str = "test";
const RELEASE_BASE: &str = "release";
const ARTIFACTS_BASE: &str = "artifacts";

/// Anchor a (possibly `+:`/`-:` prefixed) relative path at `root`.
///
/// Absolute paths, and every path when the root is `.` or empty, are
/// returned unchanged.
pub fn anchor(root: &NormalizedPath, spec: &str) -> String {
    let (_, path) = split_aggregation(spec);
    let root_is_cwd = matches!(root.as_str(), "" | ".");
    if root_is_cwd || path.is_empty() || is_absolute(path) {
        return spec.trim().to_string();
    }

    let prefix = &spec.trim_start()[..spec.trim_start().len() - path.len()];
    format!("{}{}", prefix.trim_end(), root.join(path))
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || Path::new(path).is_absolute() || path.get(1..3) == Some(":/")
}

/// Insert the build directories derived from `project_build_root`.
///
/// Values already present (set explicitly by the project) are kept.
pub fn derive_build_paths(flat: &mut IndexMap<String, Value>, tree: &Value) -> Result<()> {
    let build_root = flat
        .get("project_build_root")
        .and_then(Value::as_str)
        .map(NormalizedPath::new)
        .ok_or_else(|| Error::RequiredSectionMissing {
            sections: vec!["project.build_root".into()],
        })?;

    let tests_root = build_root.join(TESTS_BASE);
    let release_root = build_root.join(RELEASE_BASE);
    let artifacts_root = build_root.join(ARTIFACTS_BASE);

    let mut derived = vec![
        ("project_build_artifacts_root", artifacts_root.clone()),
        ("project_build_tests_root", tests_root.clone()),
        ("project_build_release_root", release_root.clone()),
        ("project_test_artifacts_path", artifacts_root.join(TESTS_BASE)),
        ("project_test_runners_path", tests_root.join("runners")),
        ("project_test_results_path", tests_root.join("results")),
        ("project_test_build_output_path", tests_root.join("out")),
        ("project_test_build_cache_path", tests_root.join("cache")),
        ("project_test_dependencies_path", tests_root.join("dependencies")),
        ("project_test_preprocess_includes_path", tests_root.join("preprocess/includes")),
        ("project_test_preprocess_files_path", tests_root.join("preprocess/files")),
        ("project_log_path", build_root.join("logs")),
        ("project_temp_path", build_root.join("temp")),
    ];

    if flag(tree, &["project", "release_build"]) {
        derived.extend([
            ("project_release_artifacts_path", artifacts_root.join(RELEASE_BASE)),
            ("project_release_build_output_path", release_root.join("out")),
            ("project_release_build_cache_path", release_root.join("cache")),
            ("project_release_dependencies_path", release_root.join("dependencies")),
        ]);
    }

    let mut build_paths = Vec::with_capacity(derived.len());
    for (key, path) in derived {
        let value = flat
            .entry(key.to_string())
            .or_insert_with(|| Value::from(path.as_str()));
        if let Some(path) = value.as_str() {
            build_paths.push(Value::from(path));
        }
    }

    flat.insert("project_build_paths".into(), Value::Sequence(build_paths));
    flat.entry("project_rule_component_files".into())
        .or_insert_with(|| Value::Sequence(Vec::new()));
    Ok(())
}

/// Build the `collection_*` entries.
///
/// Directory collections (`collection_paths_*`) are collected eagerly and
/// stored as values; file collections are returned as unresolved
/// [`FileList`]s.
pub fn build_collections(
    flat: &mut IndexMap<String, Value>,
    tree: &Value,
    root: &NormalizedPath,
) -> Result<IndexMap<String, FileList>> {
    let mut dirs: IndexMap<String, Vec<String>> = IndexMap::new();
    if let Some(paths) = lookup(tree, &["paths"]).and_then(Value::as_mapping) {
        for (key, specs) in paths {
            let Some(key) = key.as_str() else { continue };
            let anchored: Vec<String> = to_string_list(specs)
                .iter()
                .map(|spec| anchor(root, spec))
                .collect();
            dirs.insert(key.to_lowercase(), collect_paths(&anchored)?);
        }
    }

    let get = |key: &str| dirs.get(key).cloned().unwrap_or_default();
    let source_and_include = dedup([get("source"), get("include")]);
    let test_support_source_include =
        dedup([get("test"), get("support"), get("source"), get("include")]);

    for (key, collected) in &dirs {
        flat.insert(format!("collection_paths_{key}"), to_sequence(collected));
    }
    flat.insert(
        "collection_paths_source_and_include".into(),
        to_sequence(&source_and_include),
    );
    flat.insert(
        "collection_paths_test_support_source_include".into(),
        to_sequence(&test_support_source_include),
    );

    let extension = |name: &str, fallback: &str| {
        flat.get(&format!("extension_{name}"))
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    };
    let source_ext = extension("source", ".c");
    let header_ext = extension("header", ".h");
    let assembly_ext = extension("assembly", ".s");
    let test_prefix = flat
        .get("project_test_file_prefix")
        .and_then(Value::as_str)
        .unwrap_or("test_")
        .to_string();

    let revisions = |section: &str| -> Vec<String> {
        lookup(tree, &["files", section])
            .map(to_string_list)
            .unwrap_or_default()
            .iter()
            .map(|spec| anchor(root, spec))
            .collect()
    };

    let mut collections = IndexMap::new();
    collections.insert(
        "collection_all_tests".to_string(),
        file_list(&get("test"), &format!("{test_prefix}*{source_ext}"), &revisions("test"))?,
    );
    collections.insert(
        "collection_all_source".to_string(),
        file_list(&get("source"), &format!("*{source_ext}"), &revisions("source"))?,
    );
    collections.insert(
        "collection_all_headers".to_string(),
        file_list(
            &test_support_source_include,
            &format!("*{header_ext}"),
            &revisions("include"),
        )?,
    );
    collections.insert(
        "collection_all_support".to_string(),
        file_list(&get("support"), &format!("*{source_ext}"), &revisions("support"))?,
    );
    if flag(tree, &["test_build", "use_assembly"]) {
        let dirs = dedup([get("source"), get("support")]);
        collections.insert(
            "collection_all_assembly".to_string(),
            file_list(&dirs, &format!("*{assembly_ext}"), &revisions("assembly"))?,
        );
    }

    Ok(collections)
}

fn file_list(dirs: &[String], file_glob: &str, revisions: &[String]) -> Result<FileList> {
    let mut list = FileList::from_patterns(dirs.iter().map(|dir| format!("{dir}/{file_glob}")))?;
    revise_file_list(&mut list, revisions)?;
    Ok(list)
}

fn dedup<const N: usize>(groups: [Vec<String>; N]) -> Vec<String> {
    let mut seen = Vec::new();
    for path in groups.into_iter().flatten() {
        if !seen.contains(&path) {
            seen.push(path);
        }
    }
    seen
}

fn to_sequence(paths: &[String]) -> Value {
    Value::Sequence(paths.iter().map(|p| Value::from(p.as_str())).collect())
}
