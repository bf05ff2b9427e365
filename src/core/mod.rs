//! Core engine for forgeplan
//!
//! - **config**: forgeplan.toml parsing and validation
//! - **context**: Workspace root and configuration shared by every operation
//! - **error**: Error types with exit codes and contextual help messages
//! - **executor**: Resumable plan execution
//! - **plan**: Persisted plan documents and the closed set of actions
//! - **tools**: External tool invocation
//! - **vcs**: Version control abstraction (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod plan;
pub mod tools;
pub mod vcs;
