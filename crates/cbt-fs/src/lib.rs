//! Filesystem layer for the cbt configuration engine
//!
//! Provides canonical path handling, `+:`/`-:` aggregated path collection,
//! lazily resolved file lists and format-agnostic fragment loading.

pub mod collect;
pub mod config;
pub mod error;
pub mod filelist;
pub mod io;
pub mod path;

pub use collect::{collect_paths, revise_file_list};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use filelist::FileList;
pub use path::{
    Aggregation, NormalizedPath, extract_path, has_glob, split_aggregation, standardize,
    strip_aggregation,
};
