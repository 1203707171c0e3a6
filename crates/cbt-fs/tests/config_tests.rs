use assert_fs::TempDir;
use assert_fs::prelude::*;
use cbt_fs::{ConfigStore, Error, NormalizedPath};
use serde_yaml::Value;

#[test]
fn test_load_yaml_fragment() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("project.yml");
    file.write_str("project:\n  build_root: build\npaths:\n  test: [test]\n")
        .unwrap();

    let value: Value = ConfigStore::new()
        .load(&NormalizedPath::new(file.path()))
        .unwrap();

    assert_eq!(value["project"]["build_root"], Value::from("build"));
    assert_eq!(value["paths"]["test"][0], Value::from("test"));
}

#[test]
fn test_load_json_and_toml_fragments() {
    let temp = TempDir::new().unwrap();
    temp.child("a.json")
        .write_str(r#"{"project": {"test_threads": 4}}"#)
        .unwrap();
    temp.child("b.toml")
        .write_str("[project]\nrelease_build = true\n")
        .unwrap();

    let store = ConfigStore::new();
    let json: Value = store
        .load(&NormalizedPath::new(temp.child("a.json").path()))
        .unwrap();
    let toml: Value = store
        .load(&NormalizedPath::new(temp.child("b.toml").path()))
        .unwrap();

    assert_eq!(json["project"]["test_threads"].as_u64(), Some(4));
    assert_eq!(toml["project"]["release_build"], Value::Bool(true));
}

#[test]
fn test_malformed_yaml_is_a_parse_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("broken.yml");
    file.write_str("project: [unterminated\n").unwrap();

    let result: cbt_fs::Result<Value> = ConfigStore::new().load(&NormalizedPath::new(file.path()));

    assert!(matches!(result, Err(Error::ConfigParse { ref format, .. }) if format == "YAML"));
}

#[test]
fn test_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("project.ini");
    file.write_str("[x]").unwrap();

    let result: cbt_fs::Result<Value> = ConfigStore::new().load(&NormalizedPath::new(file.path()));

    assert!(matches!(result, Err(Error::UnsupportedFormat { ref extension }) if extension == "ini"));
}

#[test]
fn test_missing_file_is_io_error() {
    let result: cbt_fs::Result<Value> =
        ConfigStore::new().load(&NormalizedPath::new("/nonexistent/cbt/project.yml"));
    assert!(matches!(result, Err(Error::Io { .. })));
}
