//! Unified workspace context - build once, pass everywhere
//!
//! `ForgeContext` replaces any notion of a process-wide "current root". It is
//! built in main.rs from `--root` (or `FORGEPLAN_ROOT`, or the current
//! directory) and passed by reference to every command, loader and action.
//!
//! ```text
//! main.rs:
//!   ForgeContext::build() -> &ForgeContext
//!   |
//!   v
//! commands/plan.rs, apply.rs, graph.rs:
//!   fn run_*(ctx: &ForgeContext, ...)
//! ```

use crate::core::config::ForgeConfig;
use crate::core::error::ForgeResult;
use std::path::{Path, PathBuf};

/// Workspace layout and configuration shared by every operation
#[derive(Debug, Clone)]
pub struct ForgeContext {
  /// Workspace root directory
  pub root: PathBuf,

  /// Configuration (forgeplan.toml)
  pub config: ForgeConfig,
}

impl ForgeContext {
  /// Build a context from a workspace root, loading its configuration
  pub fn build(workspace_root: &Path) -> ForgeResult<Self> {
    let root = workspace_root.to_path_buf();
    let config = ForgeConfig::load(&root)?;
    Ok(Self { root, config })
  }

  /// Build a context from an already loaded configuration
  pub fn new(root: impl Into<PathBuf>, config: ForgeConfig) -> Self {
    Self {
      root: root.into(),
      config,
    }
  }

  /// Directory holding one source tree per component
  pub fn src_dir(&self) -> PathBuf {
    self.root.join("src")
  }

  /// Directory holding the current plan and everything it generates
  pub fn plan_dir(&self) -> PathBuf {
    self.root.join("plan")
  }

  /// The persisted plan document
  pub fn plan_file(&self) -> PathBuf {
    self.plan_dir().join("actions.json")
  }

  /// Generated package-builder recipes, one directory per package
  pub fn recipes_dir(&self) -> PathBuf {
    self.plan_dir().join("recipes")
  }

  /// Package builder output
  pub fn packages_dir(&self) -> PathBuf {
    self.plan_dir().join("packages")
  }

  /// Environment manifest driving the build pipeline
  pub fn manifest_path(&self) -> PathBuf {
    self.root.join(&self.config.build.manifest)
  }

  /// Build pipeline status document
  pub fn status_file(&self) -> PathBuf {
    self.root.join(&self.config.build.status_file)
  }

  /// File name of the release history for an environment version
  pub fn history_file_name(&self, environment_version: &str) -> String {
    format!("{}-{}.json", self.config.meta_package(), environment_version)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_layout() {
    let config = ForgeConfig::parse("[environment]\nname = \"demo-env\"\nversion = \"6.0\"\n").unwrap();
    let ctx = ForgeContext::new("/work", config);
    assert_eq!(ctx.plan_file(), PathBuf::from("/work/plan/actions.json"));
    assert_eq!(ctx.recipes_dir(), PathBuf::from("/work/plan/recipes"));
    assert_eq!(ctx.packages_dir(), PathBuf::from("/work/plan/packages"));
    assert_eq!(ctx.manifest_path(), PathBuf::from("/work/pyproject.toml"));
    assert_eq!(ctx.status_file(), PathBuf::from("/work/conf/build_info.json"));
    assert_eq!(ctx.history_file_name("6.0"), "demo-env-6.0.json");
  }
}
