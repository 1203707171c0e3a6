//! Multi-step scenarios on top of a resolved project
//!
//! These follow what a build run does after setup: per-test configuration
//! changes rolled back between tests, late supplements, coverage builds and
//! freezing the file collections.

use cbt_core::plugins::coverage::{COVERAGE_DEFINE, CoveragePlugin};
use cbt_core::{ExpressionContext, ProjectSetup, RecordedEnvironment, ResolvedProject};
use cbt_test_utils::TestProject;
use pretty_assertions::assert_eq;
use serde_yaml::Value;

fn resolve(project: &TestProject, yaml: &str) -> ResolvedProject {
    let file = project.write_project(yaml);
    ProjectSetup::new(file.as_path())
        .with_context(ExpressionContext::empty())
        .with_executable_checks(false)
        .run(&mut RecordedEnvironment::new())
        .expect("project should resolve")
}

const BASIC: &str = "project: {build_root: build}\n\
                     paths: {test: [test], source: [src], support: [test/support]}\n\
                     defines: {test: [TEST]}\n";

#[test]
fn test_per_test_changes_are_rolled_back() {
    let project = TestProject::c_project();
    let mut resolved = resolve(&project, BASIC);
    let configurator = resolved.configurator_mut();

    for test in ["test_model", "test_other"] {
        configurator.replace_flattened([(
            "defines_test".to_string(),
            Value::Sequence(vec![Value::from("TEST"), Value::from(test.to_uppercase())]),
        )]);
        assert_eq!(
            configurator.config().get_list("defines_test"),
            ["TEST".to_string(), test.to_uppercase()]
        );
        configurator.restore();
    }

    assert_eq!(configurator.config().get_list("defines_test"), ["TEST"]);
}

#[test]
fn test_rollback_keeps_plugin_rules_and_tool_arguments() {
    let project = TestProject::c_project();
    let mut resolved = resolve(
        &project,
        &format!("{BASIC}plugins: {{enabled: [coverage]}}\ntools_test_linker: {{arguments: [-lm]}}\n"),
    );
    let configurator = resolved.configurator_mut();

    let linker_arguments = |configurator: &cbt_core::Configurator| {
        configurator.config().tool("test_linker").unwrap().arguments
    };
    let before = linker_arguments(configurator);
    let rules = configurator.config().project_rule_component_files();
    assert_eq!(before.last().map(String::as_str), Some("-lm"));
    assert!(rules.iter().any(|f| f.ends_with("/coverage.rules")));

    configurator.replace_flattened([(
        "defines_test".to_string(),
        Value::Sequence(vec![Value::from("TEST"), Value::from("TEST_MODEL")]),
    )]);
    configurator.restore();

    assert_eq!(linker_arguments(configurator), before);
    assert_eq!(configurator.config().project_rule_component_files(), rules);
    assert_eq!(configurator.config().get_list("defines_test"), ["TEST"]);
}

#[test]
fn test_supplement_after_setup() {
    let project = TestProject::c_project();
    let resolved = resolve(&project, BASIC);
    let (mut configurator, mut tree) = resolved.into_parts();

    let more: Value = serde_yaml::from_str(
        "report: {format: xml, path: build/report}\nproject: {use_backtrace: true}",
    )
    .unwrap();
    configurator.supplement(&mut tree, &more).unwrap();
    configurator.replace_flattened([("report_format".to_string(), Value::from("html"))]);
    configurator.restore();

    let config = configurator.config();
    assert_eq!(config.get_str("report_format"), Some("xml"));
    assert!(config.get_bool("project_use_backtrace"));
    assert_eq!(config.project_build_root(), Some("build"));
    assert_eq!(
        config.section("project").and_then(|p| p.get("use_backtrace")),
        Some(&Value::Bool(true))
    );
}

#[test]
fn test_coverage_build_redirects_output() {
    let project = TestProject::c_project();
    let mut resolved = resolve(
        &project,
        &format!("{BASIC}plugins: {{enabled: [coverage]}}\ncoverage: {{uncovered_ignore_list: [test/support]}}\n"),
    );

    let plugin = CoveragePlugin::new(resolved.config()).unwrap();
    plugin.apply(resolved.configurator_mut());

    let config = resolved.config();
    assert_eq!(config.project_test_build_output_path(), Some("build/coverage/out"));
    assert_eq!(
        config.project_test_dependencies_path(),
        Some("build/coverage/dependencies")
    );
    assert_eq!(
        config.get_list("defines_test"),
        ["TEST".to_string(), COVERAGE_DEFINE.to_string()]
    );
    assert!(
        config
            .project_rule_component_files()
            .iter()
            .any(|f| f.ends_with("/coverage.rules"))
    );

    let ignored =
        CoveragePlugin::uncovered_ignore_paths(config, resolved.configurator().project_root())
            .unwrap();
    assert_eq!(ignored, [format!("{}/test/support", project.root_str())]);
}

#[test]
fn test_collections_freeze_after_generated_files() {
    let project = TestProject::c_project();
    let resolved = resolve(&project, BASIC);

    project.write_file("test/test_generated.c", "");
    project.assert_exists("test/test_generated.c");
    let total = resolved.configurator().resolve_collections();
    project.write_file("test/test_too_late.c", "");

    let tests = resolved.config().collection_all_tests().unwrap();
    assert_eq!(tests.len(), 3);
    assert!(tests.contains(&format!("{}/test/test_generated.c", project.root_str())));
    assert_eq!(resolved.configurator().resolve_collections(), total);
}
