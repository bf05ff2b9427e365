//! Action handlers
//!
//! One handler per [`Action`] variant. Dispatch is an exhaustive match, so a
//! new action kind cannot be planned without being executable.

pub mod build_status;
pub mod package;
pub mod publish;
pub mod workspace;

use crate::core::context::ForgeContext;
use crate::core::error::ForgeResult;
use crate::core::plan::Action;
use crate::core::tools::CommandRunner;
use crate::core::vcs::VcsProvider;

/// Collaborators an action may use
pub struct ActionEnv<'a> {
  pub ctx: &'a ForgeContext,
  pub runner: &'a dyn CommandRunner,
  pub vcs: &'a dyn VcsProvider,
}

/// Run one action to completion
pub fn perform(env: &ActionEnv<'_>, action: &Action) -> ForgeResult<()> {
  match action {
    Action::CheckBuildStatus => build_status::check_build_status(env.ctx),
    Action::ModifyFile { file, file_contents } => workspace::modify_file(file, file_contents),
    Action::GitCommit { repo, modified, message } => workspace::git_commit(env.vcs, repo, modified, message),
    Action::Rebuild => workspace::rebuild(env.ctx, env.runner),
    Action::CreatePackage { package, test } => package::create_package(env.ctx, env.runner, package, *test),
    Action::Publish(request) => publish::publish(env.ctx, env.runner, request),
  }
}
