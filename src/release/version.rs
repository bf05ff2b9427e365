//! Dotted numeric versions (`6.0`, `6.0.3`, `5.2.1.7`)
//!
//! Package and environment versions in a distribution are plain dot-separated
//! integers. The only arithmetic the planner needs is "bump the trailing
//! component", which semver cannot express for two-component versions.

use crate::core::error::{ConfigError, ForgeError, ForgeResult};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DottedVersion(Vec<u64>);

impl DottedVersion {
  pub fn parse(text: &str) -> ForgeResult<Self> {
    let invalid = || {
      ForgeError::Config(ConfigError::InvalidVersion {
        version: text.to_string(),
      })
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
      return Err(invalid());
    }

    let parts = trimmed
      .split('.')
      .map(|part| part.parse::<u64>().map_err(|_| invalid()))
      .collect::<ForgeResult<Vec<_>>>()?;

    Ok(Self(parts))
  }

  /// Number of components
  pub fn component_count(&self) -> usize {
    self.0.len()
  }

  /// Increment the trailing component: `6.0` -> `6.1`, `6.0.9` -> `6.0.10`
  pub fn bump_last(&self) -> ForgeResult<Self> {
    let mut parts = self.0.clone();
    if let Some(last) = parts.last_mut() {
      *last = last.checked_add(1).ok_or_else(|| {
        ForgeError::Config(ConfigError::InvalidVersion {
          version: self.to_string(),
        })
      })?;
    }
    Ok(Self(parts))
  }

  /// Append a component: `6.0` + 0 -> `6.0.0`
  pub fn with_component(&self, value: u64) -> Self {
    let mut parts = self.0.clone();
    parts.push(value);
    Self(parts)
  }
}

impl Ord for DottedVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    let len = self.0.len().max(other.0.len());
    for i in 0..len {
      let a = self.0.get(i).copied().unwrap_or(0);
      let b = other.0.get(i).copied().unwrap_or(0);
      match a.cmp(&b) {
        Ordering::Equal => continue,
        ord => return ord,
      }
    }
    self.0.len().cmp(&other.0.len())
  }
}

impl PartialOrd for DottedVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl fmt::Display for DottedVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
    write!(f, "{}", parts.join("."))
  }
}

/// Version of the environment release line that follows `environment`
pub fn next_environment_version(environment: &DottedVersion) -> ForgeResult<DottedVersion> {
  environment.bump_last()
}

/// Version the next publication will carry
///
/// Bumps the trailing component of the last published release, or starts the
/// environment line at `<environment>.0` when nothing was published yet.
pub fn future_published_version(environment: &DottedVersion, last_published: Option<&str>) -> ForgeResult<DottedVersion> {
  match last_published {
    Some(last) => DottedVersion::parse(last)?.bump_last(),
    None => Ok(environment.with_component(0)),
  }
}
