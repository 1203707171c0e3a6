//! Tests for configuration validation

use cbt_core::{Error, Validator};
use cbt_fs::NormalizedPath;
use cbt_test_utils::TestProject;
use serde_yaml::Value;

fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).expect("test YAML should parse")
}

fn failures(project: &TestProject, loaded: &[String], tree: &str) -> Vec<String> {
    let root = NormalizedPath::new(project.root());
    match Validator::new(&root, loaded)
        .with_executable_checks(false)
        .validate(&yaml(tree))
    {
        Ok(()) => Vec::new(),
        Err(Error::Validation { failures }) => failures,
        Err(other) => panic!("expected a validation error, got {other:?}"),
    }
}

const VALID: &str = "project: {build_root: build, compile_threads: auto, test_threads: 2}\n\
                     paths: {test: [test], source: ['src/**', '-:src/ghost']}";

#[test]
fn test_valid_project_passes() {
    let project = TestProject::c_project();
    assert!(failures(&project, &[], VALID).is_empty());
}

#[test]
fn test_missing_sections_abort_before_other_checks() {
    let project = TestProject::c_project();
    let root = NormalizedPath::new(project.root());
    let result = Validator::new(&root, &[]).validate(&yaml("tools: {cc: 7}"));

    match result {
        Err(Error::RequiredSectionMissing { sections }) => {
            assert_eq!(sections, ["project", "paths"]);
        }
        other => panic!("expected RequiredSectionMissing, got {other:?}"),
    }
}

#[test]
fn test_every_failure_is_reported_together() {
    let project = TestProject::c_project();
    let found = failures(
        &project,
        &[],
        "project: {build_root: build, test_threads: 0}\npaths: {test: [missing_dir], source: [src]}",
    );

    assert_eq!(found.len(), 2, "{found:?}");
    assert!(found.iter().any(|f| f.contains("missing_dir")));
    assert!(found.iter().any(|f| f.contains("test_threads")));
}

#[test]
fn test_required_values_are_checked() {
    let project = TestProject::c_project();
    let found = failures(&project, &[], "project: {test_file_prefix: test_}\npaths: {test: [test]}");

    assert_eq!(
        found,
        [
            "Required value 'project.build_root' is missing",
            "Required value 'paths.source' is missing",
        ]
    );
}

#[test]
fn test_glob_entries_check_their_base_directory() {
    let project = TestProject::c_project();
    let found = failures(
        &project,
        &[],
        "project: {build_root: build}\npaths: {test: ['nowhere/**'], source: ['src/*']}",
    );
    assert_eq!(found.len(), 1, "{found:?}");
    assert!(found[0].contains("nowhere"));
}

#[test]
fn test_files_check_literal_additions_only() {
    let project = TestProject::c_project();
    let found = failures(
        &project,
        &[],
        &format!("{VALID}\nfiles: {{source: ['+:src/missing.c', 'src/*.x', '-:src/gone.c', src/model.c]}}"),
    );
    assert_eq!(found.len(), 1, "{found:?}");
    assert!(found[0].contains("src/missing.c"));
}

#[test]
fn test_plugin_load_paths_must_exist() {
    let project = TestProject::c_project();
    project.create_dir("plugins");
    let found = failures(
        &project,
        &[],
        &format!("{VALID}\nplugins: {{load_paths: [plugins, absent_plugins]}}"),
    );
    assert_eq!(found.len(), 1, "{found:?}");
    assert!(found[0].contains("absent_plugins"));
}

#[test]
fn test_enabled_plugins_must_be_loaded() {
    let project = TestProject::c_project();
    let loaded = vec!["report".to_string()];
    let found = failures(
        &project,
        &loaded,
        &format!("{VALID}\nplugins: {{enabled: [report, ghost]}}"),
    );
    assert_eq!(found.len(), 1, "{found:?}");
    assert!(found[0].contains("ghost"));
}

#[test]
fn test_unity_helper_must_exist() {
    let project = TestProject::c_project();
    let found = failures(
        &project,
        &[],
        &format!("{VALID}\ncmock: {{unity_helper: [test/support/helper.h, test/support/nope.h]}}"),
    );
    assert_eq!(found.len(), 1, "{found:?}");
    assert!(found[0].contains("nope.h"));
}

#[test]
fn test_missing_executables_are_reported_unless_optional() {
    let project = TestProject::c_project();
    let root = NormalizedPath::new(project.root());
    let tree = yaml(&format!(
        "{VALID}\ntools:\n  \
         required: {{executable: cbt-no-such-tool-7f3a, arguments: []}}\n  \
         extra: {{executable: cbt-no-such-tool-7f3a, optional: true}}\n  \
         fixture: {{executable: '${{1}}'}}"
    ));

    let result = Validator::new(&root, &[]).validate(&tree);
    match result {
        Err(Error::Validation { failures }) => {
            assert_eq!(failures.len(), 1, "{failures:?}");
            assert!(failures[0].contains("'required'"));
        }
        other => panic!("expected a validation error, got {other:?}"),
    }

    assert!(
        Validator::new(&root, &[])
            .with_executable_checks(false)
            .validate(&tree)
            .is_ok()
    );
}
