//! Change detection against the release history
//!
//! Component state is read fresh from version control on every run. A package
//! needs a build when it was never released or when any component revision
//! differs from the one recorded for its last released version.

use crate::core::error::{ConfigError, ForgeError, ForgeResult};
use crate::core::vcs::VcsProvider;
use crate::recipes::recipe::{PackageKind, Recipe};
use crate::release::history::{Changesets, ReleaseHistory};

/// Current revisions of a recipe's components, and why they may be unclean
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceState {
  pub changesets: Changesets,
  /// Dirty or untracked trees; block non-forced builds
  pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeVerdict {
  NeverReleased,
  /// Components whose revision differs from the last release
  Modified { components: Vec<String> },
  Unchanged,
}

impl ChangeVerdict {
  pub fn needs_build(&self) -> bool {
    !matches!(self, ChangeVerdict::Unchanged)
  }
}

/// Read revision and cleanliness of every component of a recipe
pub fn inspect_sources(recipe: &Recipe, vcs: &dyn VcsProvider) -> ForgeResult<SourceState> {
  if recipe.components.is_empty() {
    return Err(match recipe.kind {
      PackageKind::Virtual => ForgeError::NotImplemented {
        feature: format!("packaging of virtual package {}", recipe.name),
      },
      _ => ForgeError::Config(ConfigError::InvalidRecipe {
        package: recipe.name.clone(),
        reason: "no component defined".to_string(),
      }),
    });
  }

  let mut state = SourceState::default();
  for component in &recipe.components {
    let repo = vcs.open(&component.path)?;
    if repo.is_dirty()? {
      state
        .errors
        .push(format!("repository {} contains uncommitted files", component.path.display()));
    } else if repo.has_untracked()? {
      state
        .errors
        .push(format!("repository {} has untracked files", component.path.display()));
    }
    state.changesets.insert(component.name.clone(), repo.head_revision()?);
  }
  Ok(state)
}

/// Compare current changesets with those of the last released version
pub fn detect_change(package: &str, current: &Changesets, history: &ReleaseHistory) -> ChangeVerdict {
  let latest = match history.latest_changesets(package) {
    Some(latest) if !latest.is_empty() => latest,
    _ => return ChangeVerdict::NeverReleased,
  };

  if latest == current {
    return ChangeVerdict::Unchanged;
  }

  let mut components: Vec<String> = current
    .iter()
    .filter(|(name, revision)| latest.get(*name) != Some(*revision))
    .map(|(name, _)| name.clone())
    .chain(latest.keys().filter(|name| !current.contains_key(*name)).cloned())
    .collect();
  components.sort();
  ChangeVerdict::Modified { components }
}
