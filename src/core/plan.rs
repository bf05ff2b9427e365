//! Persisted, resumable release plans
//!
//! A plan is produced once by `forgeplan plan` (or `version-plan`) and consumed,
//! possibly over several process invocations, by `forgeplan apply-plan`.
//!
//! # Architecture
//!
//! ```text
//! PlanCompiler (what to do)
//!   ↓
//! Plan (plan/actions.json, written once, in full)
//!   ↓
//! PlanExecutor (apply, persisting status after every action)
//! ```
//!
//! Each action is a closed [`Action`] variant carrying its own typed payload, so
//! an unknown action kind is a deserialization error when the plan is loaded,
//! never a lookup failure halfway through an apply.

use crate::core::error::{ConfigError, ForgeError, ForgeResult, ResultExt};
use crate::release::history::ReleaseHistory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Plan identifier (SHA256 hash of the action list)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// One step of a plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
  /// Verify the build pipeline ran configure, build and doc successfully, in order
  CheckBuildStatus,

  /// Overwrite a file with new contents
  ModifyFile { file: PathBuf, file_contents: String },

  /// Stage, commit (hooks skipped) and push files of one component repository
  GitCommit {
    repo: PathBuf,
    modified: Vec<PathBuf>,
    message: String,
  },

  /// Run the build pipeline (configure, build, doc)
  Rebuild,

  /// Build one package from its generated recipe
  CreatePackage { package: String, test: bool },

  /// Copy artifacts and the release history to the publication directory
  Publish(PublishRequest),
}

/// Payload of a publish action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishRequest {
  /// Environment version the history file is named after
  pub environment: String,
  pub publication_dir: PathBuf,
  pub packages_dir: PathBuf,
  /// Packages whose artifacts are published (meta-package first)
  pub packages: Vec<String>,
  pub release_history: ReleaseHistory,
  /// Run the artifact indexer after copying
  #[serde(default)]
  pub index: bool,
  /// Overwrite existing artifact destinations
  #[serde(default)]
  pub force: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
  #[default]
  Pending,
  Success,
}

impl ActionStatus {
  fn is_pending(&self) -> bool {
    *self == ActionStatus::Pending
  }
}

/// An action with its execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannedAction {
  #[serde(flatten)]
  pub action: Action,
  #[serde(default, skip_serializing_if = "ActionStatus::is_pending")]
  pub status: ActionStatus,
}

impl PlannedAction {
  pub fn pending(action: Action) -> Self {
    Self {
      action,
      status: ActionStatus::Pending,
    }
  }

  pub fn is_done(&self) -> bool {
    self.status == ActionStatus::Success
  }
}

/// An ordered list of actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
  /// Content hash of the actions (statuses excluded)
  pub id: PlanId,

  pub created: DateTime<Utc>,

  /// Environment version the plan was computed for
  pub environment: String,

  pub actions: Vec<PlannedAction>,
}

impl Plan {
  /// Create a new plan with every action pending
  pub fn new(environment: impl Into<String>, actions: Vec<Action>) -> ForgeResult<Self> {
    let id = Self::compute_id(&actions)?;
    Ok(Self {
      id,
      created: Utc::now(),
      environment: environment.into(),
      actions: actions.into_iter().map(PlannedAction::pending).collect(),
    })
  }

  fn compute_id(actions: &[Action]) -> ForgeResult<PlanId> {
    let json = serde_json::to_vec(actions).context("Failed to serialize plan actions")?;
    Ok(PlanId::from_contents(&json))
  }

  /// Load a plan document
  pub fn load(path: &Path) -> ForgeResult<Self> {
    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read plan from {}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| {
      ForgeError::Config(ConfigError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
      })
    })
  }

  /// Load a plan document if one exists
  pub fn load_if_exists(path: &Path) -> ForgeResult<Option<Self>> {
    if !path.exists() {
      return Ok(None);
    }
    Self::load(path).map(Some)
  }

  /// Persist the plan atomically (temporary file + rename)
  pub fn save(&self, path: &Path) -> ForgeResult<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(self)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
  }

  /// At least one action already ran successfully
  pub fn has_applied_actions(&self) -> bool {
    self.actions.iter().any(PlannedAction::is_done)
  }

  pub fn pending_count(&self) -> usize {
    self.actions.iter().filter(|a| !a.is_done()).count()
  }

  pub fn len(&self) -> usize {
    self.actions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.actions.is_empty()
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    output.push_str(&format!("📋 Plan {} for environment {}\n", self.id, self.environment));
    output.push_str(&format!("   Created: {}\n", self.created.format("%Y-%m-%d %H:%M:%S UTC")));
    output.push_str(&format!(
      "\n   Actions ({}, {} pending):\n",
      self.len(),
      self.pending_count()
    ));
    if self.is_empty() {
      output.push_str("   (none)\n");
    }

    for (i, planned) in self.actions.iter().enumerate() {
      let mark = if planned.is_done() { "✅" } else { "⏳" };
      output.push_str(&format!("   {:>3}. {} {}\n", i + 1, mark, planned.action));
    }

    output
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Action::CheckBuildStatus => write!(f, "Check build status"),
      Action::ModifyFile { file, .. } => write!(f, "Modify {}", file.display()),
      Action::GitCommit { repo, message, .. } => write!(f, "Commit and push {} ({})", repo.display(), message),
      Action::Rebuild => write!(f, "Rebuild (configure, build, doc)"),
      Action::CreatePackage { package, test } => {
        if *test {
          write!(f, "Create package {} (with tests)", package)
        } else {
          write!(f, "Create package {}", package)
        }
      }
      Action::Publish(request) => write!(
        f,
        "Publish {} packages to {}",
        request.packages.len(),
        request.publication_dir.display()
      ),
    }
  }
}
