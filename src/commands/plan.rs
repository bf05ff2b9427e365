//! Planning commands: `plan`, `version-plan` and `show-plan`

use crate::core::context::ForgeContext;
use crate::core::error::{ConfigError, ForgeError, ForgeResult, ResultExt};
use crate::core::plan::Plan;
use crate::core::vcs::SystemGitProvider;
use crate::recipes::store::RecipeStore;
use crate::release::compiler::{PlanCompiler, PlanRequest, PlanWriter};
use crate::release::history::ReleaseHistory;
use crate::release::version_plan::VersionPlanner;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options of `forgeplan plan`
#[derive(Debug, Clone, Default)]
pub struct PlanArgs {
  /// `None` uses the configured directory; `"none"` disables publication
  pub publish_dir: Option<String>,
  pub select: Vec<String>,
  pub force: bool,
  pub test: bool,
}

/// Publication directory from the command line or configuration; must exist
pub fn resolve_publication_dir(ctx: &ForgeContext, requested: Option<&str>) -> ForgeResult<Option<PathBuf>> {
  let dir = match requested {
    Some(value) if value.trim().is_empty() || value.eq_ignore_ascii_case("none") => return Ok(None),
    Some(value) => PathBuf::from(value),
    None => match &ctx.config.publish.directory {
      Some(dir) => dir.clone(),
      None => return Ok(None),
    },
  };

  let dir = if dir.is_relative() {
    std::path::absolute(&dir).with_context(|| format!("Failed to resolve {}", dir.display()))?
  } else {
    dir
  };

  if !dir.is_dir() {
    return Err(ForgeError::Config(ConfigError::MissingPublicationDir { path: dir }));
  }
  Ok(Some(dir))
}

/// Release history of the configured environment, empty when unknown
pub fn load_history(ctx: &ForgeContext, publication_dir: Option<&Path>) -> ForgeResult<ReleaseHistory> {
  let Some(dir) = publication_dir else {
    return Ok(ReleaseHistory::default());
  };

  let file = dir.join(ctx.history_file_name(&ctx.config.environment.version));
  if !file.exists() {
    warn!("{} does not exist", file.display());
    return Ok(ReleaseHistory::default());
  }

  info!("Release history file: {}", file.display());
  ReleaseHistory::load(&file, ctx.config.meta_package())
}

/// Compute a packaging plan and write it to `<root>/plan`
pub fn run_plan(ctx: &ForgeContext, args: PlanArgs) -> ForgeResult<()> {
  let writer = PlanWriter::new(ctx);
  writer.check_replaceable(args.force)?;

  let publication_dir = resolve_publication_dir(ctx, args.publish_dir.as_deref())?;
  let history = load_history(ctx, publication_dir.as_deref())?;
  let graph = RecipeStore::load(ctx)?;

  let request = PlanRequest {
    selection: args.select,
    publication_dir,
    force: args.force,
    test: args.test,
  };

  let Some(compiled) = PlanCompiler::new(ctx, &graph, &SystemGitProvider).compile(&request, history)? else {
    // a stale plan must not stay applicable
    writer.erase()?;
    println!("✅ Nothing to do, every selected package matches its last release");
    return Ok(());
  };

  writer.write(&compiled.recipes, &compiled.plan)?;

  println!(
    "📦 Plan {} for {} {}",
    compiled.plan.id,
    ctx.config.meta_package(),
    compiled.future_version
  );
  println!();
  println!("  Packages to build ({}):", compiled.selected.len());
  for package in &compiled.selected {
    let annotation = &compiled.annotations[package];
    let cause = compiled
      .propagated
      .iter()
      .find(|p| &p.package == package)
      .map(|p| format!(" (binary dependent on {})", p.cause))
      .unwrap_or_default();
    let warning = if annotation.source_errors.is_empty() { "" } else { " ⚠️  unclean sources" };
    println!("    • {} {}{}{}", package, annotation.version, cause, warning);
  }
  println!();
  match &request.publication_dir {
    Some(dir) => println!("  Publication: {}", dir.display()),
    None => println!("  Publication: none"),
  }
  println!("  Actions: {}", compiled.plan.len());
  println!();
  println!("📝 Written to {}", ctx.plan_file().display());
  println!("   Review with `forgeplan show-plan`, execute with `forgeplan apply-plan`");

  Ok(())
}

/// Plan version bumps of modified packages
pub fn run_version_plan(ctx: &ForgeContext, args: PlanArgs) -> ForgeResult<()> {
  let writer = PlanWriter::new(ctx);
  writer.check_replaceable(args.force)?;

  let publication_dir = resolve_publication_dir(ctx, args.publish_dir.as_deref())?;
  let history = load_history(ctx, publication_dir.as_deref())?;
  let graph = RecipeStore::load(ctx)?;

  let planned = VersionPlanner::new(&graph, &SystemGitProvider).compile(
    &args.select,
    &ctx.config.environment.version,
    &history,
  )?;
  let Some(planned) = planned else {
    writer.erase()?;
    println!("✅ Nothing to do, no modified package needs a version bump");
    return Ok(());
  };

  writer.write(&[], &planned.plan)?;

  println!("🔖 Version plan {}", planned.plan.id);
  println!();
  for bump in &planned.bumps {
    println!("    • {} {} → {} ({})", bump.package, bump.from, bump.to, bump.file.display());
  }
  println!();
  println!("📝 Written to {}", ctx.plan_file().display());

  Ok(())
}

/// Print the current plan with the status of each action
pub fn run_show_plan(ctx: &ForgeContext) -> ForgeResult<()> {
  let path = ctx.plan_file();
  let Some(plan) = Plan::load_if_exists(&path)? else {
    return Err(ForgeError::with_help(
      format!("No plan found at {}", path.display()),
      "Create one with `forgeplan plan` or `forgeplan version-plan`",
    ));
  };
  print!("{}", plan.to_human_readable());
  Ok(())
}
