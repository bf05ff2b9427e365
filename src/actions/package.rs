//! Package builder invocation

use crate::core::context::ForgeContext;
use crate::core::error::{ConfigError, ForgeError, ForgeResult, ResultExt};
use crate::core::tools::{CommandLine, CommandRunner};
use std::fs;
use toml_edit::DocumentMut;
use tracing::info;

/// Package channels from configuration, or from the environment manifest
///
/// The manifest is read at `tool.pixi.project.channels`, then
/// `tool.pixi.workspace.channels`.
pub fn channels(ctx: &ForgeContext) -> ForgeResult<Vec<String>> {
  if !ctx.config.build.channels.is_empty() {
    return Ok(ctx.config.build.channels.clone());
  }

  let path = ctx.manifest_path();
  let content = fs::read_to_string(&path).with_context(|| format!("Failed to read manifest {}", path.display()))?;
  let doc: DocumentMut = content.parse()?;

  for table in ["project", "workspace"] {
    if let Some(array) = doc
      .get("tool")
      .and_then(|t| t.get("pixi"))
      .and_then(|p| p.get(table))
      .and_then(|t| t.get("channels"))
      .and_then(|c| c.as_array())
    {
      return Ok(array.iter().filter_map(|v| v.as_str()).map(String::from).collect());
    }
  }

  Err(ForgeError::Config(ConfigError::MissingField {
    field: format!("tool.pixi.project.channels in {}", path.display()),
  }))
}

/// Builder command for one package
pub fn create_package_command(ctx: &ForgeContext, package: &str, test: bool) -> ForgeResult<CommandLine> {
  let recipe_dir = ctx.recipes_dir().join(package);
  let output = ctx.packages_dir();

  let mut command = CommandLine::new("rattler-build")
    .args(["build", "--experimental", "--no-build-id", "-r"])
    .arg(recipe_dir.display().to_string())
    .arg("--output-dir")
    .arg(output.display().to_string());
  if !test {
    command = command.arg("--no-test");
  }
  for channel in channels(ctx)?
    .into_iter()
    .chain(std::iter::once(format!("file://{}", output.display())))
  {
    command = command.arg("-c").arg(channel);
  }
  Ok(command)
}

/// Build one package from `plan/recipes/<package>` into `plan/packages`
pub fn create_package(ctx: &ForgeContext, runner: &dyn CommandRunner, package: &str, test: bool) -> ForgeResult<()> {
  info!("Creating package {} (test={})", package, test);

  let stale = ctx.packages_dir().join("bld").join(format!("rattler-build_{}", package));
  if stale.exists() {
    fs::remove_dir_all(&stale).with_context(|| format!("Failed to remove {}", stale.display()))?;
  }

  runner.run(&create_package_command(ctx, package, test)?)
}
