//! Version control collaborator
//!
//! Planning only needs a handful of questions answered about each component
//! tree, and execution only needs to commit and push version bumps. Both go
//! through the [`Vcs`] trait so tests can substitute in-memory repositories.

pub mod system_git;

use crate::core::error::ForgeResult;
use std::path::{Path, PathBuf};

pub use system_git::SystemGit;

/// Operations on one component working tree
pub trait Vcs {
  /// Tracked files have uncommitted modifications
  fn is_dirty(&self) -> ForgeResult<bool>;

  /// Untracked, non-ignored files are present
  fn has_untracked(&self) -> ForgeResult<bool>;

  /// Revision id of the checked-out commit
  fn head_revision(&self) -> ForgeResult<String>;

  fn add(&self, files: &[PathBuf]) -> ForgeResult<()>;

  /// Commit staged changes, skipping hooks
  fn commit(&self, message: &str) -> ForgeResult<()>;

  fn push(&self) -> ForgeResult<()>;
}

/// Opens working trees
pub trait VcsProvider {
  fn open(&self, path: &Path) -> ForgeResult<Box<dyn Vcs>>;
}

/// Provider backed by the system `git` binary
#[derive(Debug, Default)]
pub struct SystemGitProvider;

impl VcsProvider for SystemGitProvider {
  fn open(&self, path: &Path) -> ForgeResult<Box<dyn Vcs>> {
    Ok(Box::new(SystemGit::open(path)?))
  }
}
