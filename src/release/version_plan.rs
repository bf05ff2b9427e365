//! Version bump planning
//!
//! A package whose sources moved since the last release but whose declared
//! version did not is bumped on its trailing component. The bump is planned as
//! file rewrites followed by commits and a single rebuild, so nothing in the
//! source trees changes until the plan is applied.

use crate::core::error::{ConfigError, ForgeError, ForgeResult, ResultExt};
use crate::core::plan::{Action, Plan};
use crate::core::vcs::VcsProvider;
use crate::graph::recipe_graph::RecipeGraph;
use crate::graph::selection;
use crate::release::changes::{ChangeVerdict, detect_change, inspect_sources};
use crate::release::history::ReleaseHistory;
use crate::release::version::DottedVersion;
use crate::recipes::version_info::{locate_version_file, rewrite_version};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
  pub package: String,
  pub from: String,
  pub to: String,
  pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct VersionPlan {
  pub plan: Plan,
  pub bumps: Vec<VersionBump>,
}

pub struct VersionPlanner<'a> {
  graph: &'a RecipeGraph,
  vcs: &'a dyn VcsProvider,
}

impl<'a> VersionPlanner<'a> {
  pub fn new(graph: &'a RecipeGraph, vcs: &'a dyn VcsProvider) -> Self {
    Self { graph, vcs }
  }

  /// Plan version bumps for the selected packages; `None` when nothing needs one
  ///
  /// Only the packages the terms name are considered, dependencies are not
  /// pulled in.
  pub fn compile(
    &self,
    patterns: &[String],
    environment: &str,
    history: &ReleaseHistory,
  ) -> ForgeResult<Option<VersionPlan>> {
    let chosen = selection::initial_selection(self.graph, patterns)?;
    for name in self.graph.names().filter(|n| !chosen.contains(*n)) {
      info!("Package {} excluded from selection", name);
    }

    let mut modifications = Vec::new();
    let mut commits = Vec::new();
    let mut bumps = Vec::new();

    for package in self.graph.topo_sort(&chosen)? {
      let recipe = self.graph.recipe(&package)?;
      let Some(first) = recipe.components.first() else {
        continue;
      };

      let state = inspect_sources(recipe, self.vcs)?;
      for error in &state.errors {
        warn!("{}", error);
      }

      match detect_change(&package, &state.changesets, history) {
        ChangeVerdict::NeverReleased => {
          info!("Package {} not found in release history", package);
          continue;
        }
        ChangeVerdict::Unchanged => {
          info!("No change detected in package {}", package);
          continue;
        }
        ChangeVerdict::Modified { .. } => info!("Package {} modified since last release", package),
      }

      let Some(released) = history.last_released_version(&package) else {
        continue;
      };
      if recipe.version != released {
        continue;
      }

      let new_version = DottedVersion::parse(released)?.bump_last()?.to_string();
      info!("Set {} version from {} to {}", package, released, new_version);

      let version_file = locate_version_file(&first.path)?.ok_or_else(|| {
        ForgeError::Config(ConfigError::InvalidRecipe {
          package: package.clone(),
          reason: format!(
            "cannot find component version file (pyproject.toml, project_info.cmake or info.py) in {}",
            first.path.display()
          ),
        })
      })?;
      let contents = fs::read_to_string(&version_file.path)
        .with_context(|| format!("Failed to read {}", version_file.path.display()))?;
      let file_contents = rewrite_version(&contents, version_file.format, &new_version)?;

      modifications.push(Action::ModifyFile {
        file: version_file.path.clone(),
        file_contents,
      });
      commits.push(Action::GitCommit {
        repo: first.path.clone(),
        modified: vec![version_file.path.clone()],
        message: format!(
          "Set package {} from version {} to version {}",
          package, released, new_version
        ),
      });
      bumps.push(VersionBump {
        package: package.clone(),
        from: released.to_string(),
        to: new_version,
        file: version_file.path,
      });
    }

    if bumps.is_empty() {
      info!("Nothing to do.");
      return Ok(None);
    }

    let mut actions = modifications;
    actions.extend(commits);
    actions.push(Action::Rebuild);

    Ok(Some(VersionPlan {
      plan: Plan::new(environment, actions)?,
      bumps,
    }))
  }
}
