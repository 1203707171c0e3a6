//! Normalized path handling for cross-platform compatibility
//!
//! Configuration documents may be written on any platform, so every path
//! string is reduced to a canonical form before it is compared, globbed or
//! flattened: forward slashes, no surrounding whitespace, no trailing
//! separator. Path specifications may additionally carry an aggregation
//! operator (`+:` add, `-:` remove) which is kept by [`standardize`] and only
//! removed when a caller asks for the bare path.

use std::path::{Path, PathBuf};

/// Characters that turn a path specification into a glob.
const GLOB_CHARS: &[char] = &['*', '?', '{', '}', '[', ']'];

/// Aggregation operator carried by a path specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    /// `+:` prefix, or no prefix at all.
    Add,
    /// `-:` prefix.
    Remove,
}

/// Canonicalize a path string.
///
/// Trims surrounding whitespace, converts backslashes to forward slashes and
/// drops trailing separators (a bare root such as `/` or `C:/` is kept).
/// Normalizing an already canonical path returns it unchanged.
pub fn standardize(path: &str) -> String {
    let mut current = path.replace('\\', "/");
    loop {
        let trimmed = current.trim();
        let stripped = if trimmed.len() > 1 && trimmed.ends_with('/') && !trimmed.ends_with(":/")
        {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };
        if stripped.len() == current.len() {
            return current;
        }
        current = stripped.to_string();
    }
}

/// Split a specification into its aggregation operator and the path text.
///
/// Whitespace between the operator and the path is ignored, so `"+: src/*"`
/// and `"+:src/*"` are equivalent.
pub fn split_aggregation(spec: &str) -> (Aggregation, &str) {
    let trimmed = spec.trim_start();
    if let Some(rest) = trimmed.strip_prefix("+:") {
        (Aggregation::Add, rest.trim_start())
    } else if let Some(rest) = trimmed.strip_prefix("-:") {
        (Aggregation::Remove, rest.trim_start())
    } else {
        (Aggregation::Add, trimmed)
    }
}

/// Path text of a specification without its aggregation operator.
pub fn strip_aggregation(spec: &str) -> &str {
    split_aggregation(spec).1
}

/// Whether the specification contains glob wildcards.
pub fn has_glob(spec: &str) -> bool {
    spec.contains(GLOB_CHARS)
}

/// Directory portion of a specification, up to its first glob specifier.
///
/// Unlike [`Path::parent`], a plain path is returned whole: `files/foo`
/// stays `files/foo`, while `files/foo/*.c` becomes `files/foo`.
pub fn extract_path(spec: &str) -> String {
    let path = strip_aggregation(spec);
    let Some(glob_at) = path.find(GLOB_CHARS) else {
        return path.strip_suffix('/').unwrap_or(path).to_string();
    };
    let head = &path[..glob_at];
    match head.rfind('/') {
        Some(separator) => head[..separator].to_string(),
        None => head.to_string(),
    }
}

/// A path normalized to use forward slashes internally.
///
/// Provides consistent path handling across platforms by normalizing
/// all paths to forward slashes internally and converting to
/// platform-native format only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: standardize(&path_str),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment = standardize(segment);
        let joined = if self.inner.is_empty() {
            segment
        } else if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self { inner: joined }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// File name without its final extension.
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[..idx]),
            _ => Some(name),
        }
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[idx + 1..]),
            _ => None,
        }
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Whether `self` equals `ancestor` or lies somewhere below it.
    pub fn is_within(&self, ancestor: &NormalizedPath) -> bool {
        self.inner == ancestor.inner
            || self
                .inner
                .strip_prefix(&ancestor.inner)
                .is_some_and(|rest| rest.starts_with('/') || ancestor.inner.ends_with('/'))
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
