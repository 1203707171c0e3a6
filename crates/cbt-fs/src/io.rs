//! Read-only filesystem helpers used during configuration resolution

use crate::{Error, NormalizedPath, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Locate an executable the way a shell would.
///
/// Names containing a path separator are checked directly; bare names are
/// searched for in every directory of `PATH`. On Windows the `.exe` suffix
/// is tried as well.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    if name.contains('/') || name.contains('\\') {
        return candidates(Path::new(name)).into_iter().find(|p| p.is_file());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path)
        .flat_map(|dir| candidates(&dir.join(name)))
        .find(|p| p.is_file())
}

fn candidates(path: &Path) -> Vec<PathBuf> {
    let mut found = vec![path.to_path_buf()];
    if cfg!(windows) && path.extension().is_none() {
        found.push(path.with_extension("exe"));
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_text_reports_missing_file_path() {
        let err = read_text(&NormalizedPath::new("/nonexistent/cbt/project.yml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cbt/project.yml"));
    }

    #[test]
    fn find_executable_rejects_blank_names() {
        assert!(find_executable("   ").is_none());
    }

    #[test]
    fn find_executable_checks_explicit_paths() {
        let temp = tempfile::TempDir::new().unwrap();
        let tool = temp.path().join("fake-cc");
        fs::write(&tool, "").unwrap();

        assert_eq!(find_executable(tool.to_str().unwrap()), Some(tool.clone()));
        assert!(find_executable(temp.path().join("missing-cc").to_str().unwrap()).is_none());
    }
}
