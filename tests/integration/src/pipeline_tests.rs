//! End-to-end tests of the project setup pipeline
//!
//! Each test lays out a C project on disk, runs the whole resolution
//! pipeline over its project file and inspects the flattened result.

use cbt_core::{
    DefineMatcher, Error, ExpressionContext, ProjectSetup, RecordedEnvironment, ResolvedProject,
};
use cbt_test_utils::TestProject;
use cbt_test_utils::project::PluginParts;
use pretty_assertions::assert_eq;
use std::path::Path;

const PROJECT_YML: &str = r#"
import:
  - config/local.yml
project:
  build_root: build
  use_test_preprocessor: true
  compile_threads: auto
paths:
  test: ['+:test/**', '-:test/support']
  source: ['src/**', '-:src/mocks']
  support: [test/support]
  include: [src]
files:
  source: ['-:src/mocks/mock_skip.c']
defines:
  test: {'*': [TEST], model: [MODEL_UNDER_TEST]}
environment:
  - tool_root: '#{env:TOOLS}'
  - path: ['#{env:TOOL_ROOT}/bin', '#{env:PATH|/usr/bin}']
tools:
  test_compiler:
    executable: '#{env:TOOLS}/bin/cc'
    arguments: [-c, '${1}']
tools_test_linker:
  arguments: [-lm]
plugins:
  load_paths: [plugins]
  enabled: [report]
"#;

fn scaffold() -> TestProject {
    let project = TestProject::c_project();
    project.write_file("config/local.yml", "cmock: {mock_prefix: Fake}\n");
    project.create_plugin(
        "plugins",
        "report",
        PluginParts {
            rules: Some("rule report:run\n"),
            config: Some("report: {format: junit}\n"),
            defaults: Some("report: {format: text, path: build/report}\n"),
            ..Default::default()
        },
    );
    project
}

fn resolve(project_file: &Path) -> (Result<ResolvedProject, Error>, RecordedEnvironment) {
    let mut sink = RecordedEnvironment::new();
    let result = ProjectSetup::new(project_file)
        .with_context(ExpressionContext::empty().with_var("TOOLS", "/opt/tc"))
        .with_executable_checks(false)
        .run(&mut sink);
    (result, sink)
}

#[test]
fn test_full_pipeline_resolves_project() {
    let project = scaffold();
    let root = project.root_str();
    let (result, sink) = resolve(&project.write_project(PROJECT_YML));
    let resolved = result.expect("project should resolve");
    let config = resolved.config();

    assert_eq!(config.project_build_root(), Some("build"));
    assert_eq!(config.cmock_mock_prefix(), Some("Fake"));
    assert_eq!(config.get_str("report_format"), Some("junit"));
    assert_eq!(config.get_str("report_path"), Some("build/report"));

    let compiler = config.tool("test_compiler").unwrap();
    assert_eq!(compiler.executable, "/opt/tc/bin/cc");
    assert_eq!(compiler.arguments, ["-c", "${1}"]);
    assert!(config.tool("test_file_preprocessor").is_ok());
    assert_eq!(
        config.tool("test_linker").unwrap().arguments.last().map(String::as_str),
        Some("-lm")
    );

    assert_eq!(
        config.project_rule_component_files(),
        [format!("{root}/plugins/report/report.rules")]
    );
    assert!(resolved.coordinator().discovered().iter().any(|p| p.name == "report"));

    assert_eq!(sink.get("TOOL_ROOT"), Some("/opt/tc"));
    let separator = if cfg!(windows) { ";" } else { ":" };
    assert_eq!(sink.get("PATH"), Some(format!("/opt/tc/bin{separator}/usr/bin").as_str()));
    assert!(config.section("environment").is_some());
}

#[test]
fn test_pipeline_builds_collections() {
    let project = scaffold();
    let root = project.root_str();
    let (result, _) = resolve(&project.write_project(PROJECT_YML));
    let resolved = result.expect("project should resolve");
    let config = resolved.config();

    assert_eq!(config.collection_paths_test(), [format!("{root}/test")]);
    assert_eq!(config.collection_paths_source(), [format!("{root}/src")]);
    assert_eq!(
        config.collection_paths_source_and_include(),
        [format!("{root}/src")]
    );

    let tests = config.collection_all_tests().unwrap();
    assert_eq!(
        tests.resolve(),
        [
            format!("{root}/test/test_model.c"),
            format!("{root}/test/test_other.c"),
        ]
    );
    assert_eq!(
        config.collection_all_source().unwrap().resolve(),
        [format!("{root}/src/model.c")]
    );
    assert!(
        config
            .collection_all_headers()
            .unwrap()
            .contains(&format!("{root}/test/support/helper.h"))
    );
}

#[test]
fn test_resolved_defines_follow_file_names() {
    let project = scaffold();
    let (result, _) = resolve(&project.write_project(PROJECT_YML));
    let resolved = result.expect("project should resolve");

    let defines = DefineMatcher::new(resolved.config()).unwrap();
    assert_eq!(
        defines.defines_for("test", "test/test_model.c"),
        ["TEST", "MODEL_UNDER_TEST"]
    );
    assert_eq!(defines.defines_for("test", "test/test_other.c"), ["TEST"]);
}

#[test]
fn test_json_project_file_is_accepted() {
    let project = TestProject::c_project();
    let file = project.write_file(
        "project.json",
        r#"{"project": {"build_root": "out"}, "paths": {"test": ["test"], "source": ["src"]}}"#,
    );
    let (result, _) = resolve(&file);
    let resolved = result.expect("JSON project should resolve");
    assert_eq!(
        resolved.config().project_test_build_output_path(),
        Some("out/test/out")
    );
}

#[test]
fn test_validation_failures_arrive_together() {
    let project = TestProject::c_project();
    let file = project.write_project(
        "project: {build_root: build, test_threads: 0}\n\
         paths: {test: [nope], source: [src]}\n\
         plugins: {enabled: [ghost]}\n",
    );
    let (result, sink) = resolve(&file);

    match result {
        Err(Error::Validation { failures }) => {
            assert_eq!(failures.len(), 3, "{failures:?}");
            assert!(failures.iter().any(|f| f.contains("nope")));
            assert!(failures.iter().any(|f| f.contains("test_threads")));
            assert!(failures.iter().any(|f| f.contains("ghost")));
        }
        other => panic!("expected validation failures, got {other:?}"),
    }
    assert!(sink.is_empty());
}

#[test]
fn test_missing_paths_section_is_fatal() {
    let project = TestProject::c_project();
    let file = project.write_project("project: {build_root: build}\n");
    let (result, _) = resolve(&file);

    match result {
        Err(Error::RequiredSectionMissing { sections }) => assert_eq!(sections, ["paths"]),
        other => panic!("expected a missing section, got {other:?}"),
    }
}

#[test]
fn test_unreadable_and_malformed_project_files() {
    let project = TestProject::new();
    let (missing, _) = resolve(&project.path("absent.yml"));
    assert!(matches!(missing, Err(Error::ConfigLoad { .. })), "{missing:?}");

    let (malformed, _) = resolve(&project.write_project("project: [unclosed\n"));
    assert!(
        matches!(malformed, Err(Error::MalformedFragment { .. })),
        "{malformed:?}"
    );

    let (scalar, _) = resolve(&project.write_project("just text\n"));
    assert!(matches!(scalar, Err(Error::MalformedFragment { .. })), "{scalar:?}");
}

#[test]
fn test_missing_executable_is_reported_when_checked() {
    let project = TestProject::c_project();
    let file = project.write_project(
        "project: {build_root: build}\n\
         paths: {test: [test], source: [src]}\n\
         tools: {test_compiler: {executable: cbt-missing-cc-4d1e}}\n",
    );

    let result = ProjectSetup::new(file.as_path())
        .with_context(ExpressionContext::empty())
        .run(&mut RecordedEnvironment::new());
    match result {
        Err(Error::Validation { failures }) => {
            assert!(
                failures.iter().any(|f| f.contains("cbt-missing-cc-4d1e")),
                "{failures:?}"
            );
        }
        other => panic!("expected validation failures, got {other:?}"),
    }
}
