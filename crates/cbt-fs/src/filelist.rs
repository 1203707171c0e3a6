//! Lazily resolved file lists
//!
//! A [`FileList`] records include and exclude patterns and expands them
//! against the filesystem only once: on first access, or when [`FileList::resolve`]
//! is called explicitly. Build steps that create files (generated runners,
//! mocks) run before the lists are frozen, so the expansion moment matters.

use crate::path::{has_glob, standardize};
use crate::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::sync::OnceLock;

const EXCLUDE_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// An ordered set of include/exclude patterns with a memoized expansion.
#[derive(Debug, Clone, Default)]
pub struct FileList {
    includes: Vec<String>,
    excludes: Vec<String>,
    resolved: OnceLock<Vec<String>>,
}

/// Lists are equal when their patterns are; resolution state is ignored.
impl PartialEq for FileList {
    fn eq(&self, other: &Self) -> bool {
        self.includes == other.includes && self.excludes == other.excludes
    }
}

impl FileList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list from include patterns.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for pattern in patterns {
            list.include(pattern.as_ref())?;
        }
        Ok(list)
    }

    /// Add an include pattern (glob or literal path).
    ///
    /// A malformed glob is rejected. Any previous expansion is discarded.
    pub fn include(&mut self, pattern: &str) -> Result<()> {
        self.includes.push(checked(pattern)?);
        self.resolved = OnceLock::new();
        Ok(())
    }

    /// Add an exclude pattern (glob or literal path).
    ///
    /// A malformed glob is rejected. Any previous expansion is discarded.
    pub fn exclude(&mut self, pattern: &str) -> Result<()> {
        self.excludes.push(checked(pattern)?);
        self.resolved = OnceLock::new();
        Ok(())
    }

    /// Include patterns in insertion order.
    pub fn include_patterns(&self) -> &[String] {
        &self.includes
    }

    /// Exclude patterns in insertion order.
    pub fn exclude_patterns(&self) -> &[String] {
        &self.excludes
    }

    /// Whether the patterns have already been expanded.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Expand the patterns if not yet done and return the files.
    ///
    /// The result is sorted and free of duplicates. Literal include entries
    /// are kept even when they do not exist yet.
    pub fn resolve(&self) -> &[String] {
        self.resolved.get_or_init(|| self.expand())
    }

    /// Alias of [`FileList::resolve`] for read-only consumers.
    pub fn files(&self) -> &[String] {
        self.resolve()
    }

    /// Whether the resolved list contains `path`.
    pub fn contains(&self, path: &str) -> bool {
        let path = standardize(path);
        self.resolve().iter().any(|entry| *entry == path)
    }

    pub fn len(&self) -> usize {
        self.resolve().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolve().is_empty()
    }

    fn expand(&self) -> Vec<String> {
        let excludes: Vec<Pattern> = self
            .excludes
            .iter()
            .filter(|pattern| has_glob(pattern))
            .filter_map(|pattern| Pattern::new(pattern).ok())
            .collect();

        let mut files = BTreeSet::new();
        for pattern in &self.includes {
            if has_glob(pattern) {
                let Ok(entries) = glob::glob(pattern) else {
                    continue;
                };
                for entry in entries.flatten() {
                    files.insert(standardize(&entry.to_string_lossy()));
                }
            } else {
                files.insert(pattern.clone());
            }
        }

        files
            .into_iter()
            .filter(|file| {
                !self.excludes.iter().any(|exclude| exclude == file)
                    && !excludes
                        .iter()
                        .any(|pattern| pattern.matches_with(file, EXCLUDE_OPTIONS))
            })
            .collect()
    }
}

/// Standardize `pattern`, making sure a glob compiles.
fn checked(pattern: &str) -> Result<String> {
    let pattern = standardize(pattern);
    if has_glob(&pattern) {
        Pattern::new(&pattern).map_err(|e| Error::glob(&pattern, e))?;
    }
    Ok(pattern)
}
