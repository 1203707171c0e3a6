//! Aggregated path collection
//!
//! Path lists in a project file are sequences of specifications such as
//! `+:src/**`, `-:src/mocks` or `include`. [`collect_paths`] turns them into
//! a concrete, sorted set of directories; [`revise_file_list`] applies the same
//! operator convention to an existing [`FileList`].

use crate::path::{Aggregation, NormalizedPath, split_aggregation, standardize, strip_aggregation};
use crate::{Error, FileList, Result};
use std::collections::BTreeSet;

/// Build a directory list from `+:`/`-:` path and glob specifications.
///
/// Wildcard specifications expand to the matching directories; when the
/// wildcard run sits directly after the final separator (`src/*`,
/// `src/**`) the base directory itself is included too. Plain paths are
/// taken literally, whether or not they exist yet.
///
/// The result holds every added path that is neither equal to nor nested
/// under a removed path, sorted lexicographically and free of duplicates.
/// Removal therefore wins regardless of the order of specifications.
pub fn collect_paths<S: AsRef<str>>(specs: &[S]) -> Result<Vec<String>> {
    let mut plus = BTreeSet::new();
    let mut minus = BTreeSet::new();

    for spec in specs {
        let (operator, path) = split_aggregation(spec.as_ref());
        let path = standardize(path);
        if path.is_empty() {
            continue;
        }

        let dirs = if path.contains('*') {
            expand_directories(&path)?
        } else {
            vec![path]
        };

        match operator {
            Aggregation::Add => plus.extend(dirs),
            Aggregation::Remove => minus.extend(dirs),
        }
    }

    let removed: Vec<NormalizedPath> = minus.iter().map(NormalizedPath::new).collect();
    Ok(plus
        .into_iter()
        .filter(|path| {
            let candidate = NormalizedPath::new(path);
            !removed.iter().any(|gone| candidate.is_within(gone))
        })
        .collect())
}

/// Add to or remove from a file list using `+:`/`-:` operators.
///
/// Each revision is an individual path or glob; unprefixed entries add.
/// A malformed glob fails the whole revision.
pub fn revise_file_list<S: AsRef<str>>(list: &mut FileList, revisions: &[S]) -> Result<()> {
    for revision in revisions {
        let revision = revision.as_ref();
        let path = strip_aggregation(revision);
        match split_aggregation(revision).0 {
            Aggregation::Add => list.include(path)?,
            Aggregation::Remove => list.exclude(path)?,
        }
    }
    Ok(())
}

fn expand_directories(pattern: &str) -> Result<Vec<String>> {
    let mut dirs = Vec::new();

    let without_stars = pattern.trim_end_matches('*');
    if without_stars.len() < pattern.len() && without_stars.ends_with('/') {
        dirs.push(crate::path::extract_path(pattern));
    }

    let entries = glob::glob(pattern).map_err(|e| Error::glob(pattern, e))?;
    for entry in entries.flatten() {
        if entry.is_dir() {
            dirs.push(standardize(&entry.to_string_lossy()));
        }
    }

    tracing::trace!(pattern, found = dirs.len(), "Expanded directory glob");
    Ok(dirs)
}
