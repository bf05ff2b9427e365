//! `forgeplan apply-plan`

use crate::core::context::ForgeContext;
use crate::core::error::{ForgeError, ForgeResult};
use crate::core::executor::PlanExecutor;
use crate::core::plan::Plan;
use crate::core::tools::SystemRunner;
use crate::core::vcs::SystemGitProvider;
use crate::ui::progress::{ActionObserver, ActionProgress, Silent};
use std::io::IsTerminal;

/// Execute the pending actions of the current plan
pub fn run_apply_plan(ctx: &ForgeContext) -> ForgeResult<()> {
  let path = ctx.plan_file();
  let Some(plan) = Plan::load_if_exists(&path)? else {
    return Err(ForgeError::with_help(
      format!("No plan found at {}", path.display()),
      "Create one with `forgeplan plan` or `forgeplan version-plan`",
    ));
  };

  let pending = plan.pending_count();
  if pending == 0 {
    println!("✅ Plan {} is already fully applied", plan.id);
    return Ok(());
  }

  println!("🚀 Applying plan {} ({} of {} actions pending)", plan.id, pending, plan.len());
  let mut observer: Box<dyn ActionObserver> = if std::io::stderr().is_terminal() {
    Box::new(ActionProgress::new(pending, "Applying plan"))
  } else {
    Box::new(Silent)
  };
  let summary = PlanExecutor::new(ctx, &SystemRunner, &SystemGitProvider).apply(&path, observer.as_mut())?;

  println!();
  println!("✅ Plan applied: {} action(s) executed", summary.executed);
  if summary.skipped > 0 {
    println!("   {} action(s) already done in a previous run", summary.skipped);
  }
  Ok(())
}
