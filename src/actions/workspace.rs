//! Source tree actions: file rewrites, commits and the build pipeline

use crate::core::context::ForgeContext;
use crate::core::error::{ForgeResult, ResultExt};
use crate::core::tools::{CommandLine, CommandRunner};
use crate::core::vcs::VcsProvider;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn modify_file(file: &Path, contents: &str) -> ForgeResult<()> {
  info!("Writing {}", file.display());
  fs::write(file, contents).with_context(|| format!("Failed to write {}", file.display()))
}

/// Stage `modified`, commit without hooks and push
pub fn git_commit(vcs: &dyn VcsProvider, repo: &Path, modified: &[PathBuf], message: &str) -> ForgeResult<()> {
  let repository = vcs.open(repo)?;
  repository.add(modified)?;
  repository.commit(message)?;
  repository.push()
}

/// The build pipeline command (configure, build, doc)
pub fn rebuild_command(ctx: &ForgeContext) -> CommandLine {
  CommandLine::new("pixi")
    .arg("run")
    .arg("--manifest-path")
    .arg(ctx.manifest_path().display().to_string())
    .args(["bv_maker", "configure", "build", "doc"])
    .current_dir(&ctx.root)
}

pub fn rebuild(ctx: &ForgeContext, runner: &dyn CommandRunner) -> ForgeResult<()> {
  runner.run(&rebuild_command(ctx))
}
