//! Shared test utilities for the cbt workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`project`]: [`project::TestProject`] builder for on-disk C projects

pub mod project;

pub use project::TestProject;
