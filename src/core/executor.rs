//! Resumable plan execution
//!
//! Actions run strictly in plan order. After each success the action is marked
//! done and the whole plan is persisted before the next one starts, so an
//! interrupted or failed apply resumes at the first action that is not done.
//! A failing action stops execution and keeps its pending status.

use crate::actions::{self, ActionEnv};
use crate::core::context::ForgeContext;
use crate::core::error::ForgeResult;
use crate::core::plan::{ActionStatus, Plan};
use crate::core::tools::CommandRunner;
use crate::core::vcs::VcsProvider;
use crate::ui::progress::ActionObserver;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
  pub executed: usize,
  /// Already done in a previous apply
  pub skipped: usize,
}

pub struct PlanExecutor<'a> {
  env: ActionEnv<'a>,
}

impl<'a> PlanExecutor<'a> {
  pub fn new(ctx: &'a ForgeContext, runner: &'a dyn CommandRunner, vcs: &'a dyn VcsProvider) -> Self {
    Self {
      env: ActionEnv { ctx, runner, vcs },
    }
  }

  /// Apply the plan stored at `plan_path`
  pub fn apply(&self, plan_path: &Path, observer: &mut dyn ActionObserver) -> ForgeResult<ApplySummary> {
    let mut plan = Plan::load(plan_path)?;
    info!("Applying plan {} ({} pending of {})", plan.id, plan.pending_count(), plan.len());

    let mut summary = ApplySummary::default();
    for index in 0..plan.actions.len() {
      if plan.actions[index].is_done() {
        debug!("skipping completed action {}", index + 1);
        summary.skipped += 1;
        continue;
      }

      let description = plan.actions[index].action.to_string();
      observer.started(index, &description);
      info!("{}", description);

      actions::perform(&self.env, &plan.actions[index].action)?;

      plan.actions[index].status = ActionStatus::Success;
      plan.save(plan_path)?;
      summary.executed += 1;
      observer.finished(index);
    }

    Ok(summary)
  }
}
