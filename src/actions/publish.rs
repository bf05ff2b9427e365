//! Rollback-safe publication
//!
//! ```text
//! locate artifacts ─> check destinations ─> copy ─> back up history
//!                                              ─> write history ─> index
//! ```
//!
//! Nothing is copied unless every artifact is found and every destination is
//! free. Once copying starts, any failure removes what this invocation created
//! and restores every file it replaced (forced artifacts, history). A crash between two filesystem
//! operations can still leave partial state.

use crate::core::context::ForgeContext;
use crate::core::error::{ForgeError, ForgeResult, PublishError, ResultExt};
use crate::core::plan::PublishRequest;
use crate::core::tools::{CommandLine, CommandRunner};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The single built artifact of `package` in `platform_dir`
pub fn find_artifact(platform_dir: &Path, package: &str) -> ForgeResult<PathBuf> {
  let pattern = Regex::new(&format!(r"^{}-\d+\.\d+(\.\d+)?-.+\.conda$", regex::escape(package)))?;

  let mut candidates = Vec::new();
  if platform_dir.is_dir() {
    for entry in fs::read_dir(platform_dir).with_context(|| format!("Failed to list {}", platform_dir.display()))? {
      let entry = entry?;
      if pattern.is_match(&entry.file_name().to_string_lossy()) {
        candidates.push(entry.path());
      }
    }
  }
  candidates.sort();

  match candidates.len() {
    0 => Err(ForgeError::Publish(PublishError::MissingArtifact {
      package: package.to_string(),
      directory: platform_dir.to_path_buf(),
    })),
    1 => Ok(candidates.remove(0)),
    _ => Err(ForgeError::Publish(PublishError::AmbiguousArtifact {
      package: package.to_string(),
      candidates,
    })),
  }
}

/// Everything one publication changed, undone in reverse
#[derive(Default)]
struct Rollback {
  created_dirs: Vec<PathBuf>,
  created: Vec<PathBuf>,
  /// (backup, original) pairs of files that were moved aside
  backups: Vec<(PathBuf, PathBuf)>,
}

impl Rollback {
  /// Move an existing file aside so it can be restored
  fn back_up(&mut self, original: &Path) -> ForgeResult<()> {
    let mut backup = original.as_os_str().to_owned();
    backup.push(".backup");
    let backup = PathBuf::from(backup);
    fs::rename(original, &backup).with_context(|| format!("Failed to back up {}", original.display()))?;
    self.backups.push((backup, original.to_path_buf()));
    Ok(())
  }

  fn undo(&self) {
    for path in self.created.iter().rev() {
      match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove {} during rollback: {}", path.display(), e),
      }
    }
    for (backup, original) in self.backups.iter().rev() {
      if let Err(e) = fs::rename(backup, original) {
        warn!("could not restore {}: {}", original.display(), e);
      }
    }
    for dir in self.created_dirs.iter().rev() {
      if let Err(e) = fs::remove_dir(dir) {
        warn!("could not remove {} during rollback: {}", dir.display(), e);
      }
    }
  }

  fn commit(&self) -> ForgeResult<()> {
    for (backup, _) in &self.backups {
      fs::remove_file(backup).with_context(|| format!("Failed to remove {}", backup.display()))?;
    }
    Ok(())
  }
}

pub fn publish(ctx: &ForgeContext, runner: &dyn CommandRunner, request: &PublishRequest) -> ForgeResult<()> {
  let platform = &ctx.config.publish.platform;
  let source_dir = request.packages_dir.join(platform);
  let target_dir = request.publication_dir.join(platform);

  let mut transfers = Vec::new();
  for package in &request.packages {
    let artifact = find_artifact(&source_dir, package)?;
    let Some(name) = artifact.file_name() else {
      continue;
    };
    let destination = target_dir.join(name);
    if !request.force && destination.exists() {
      return Err(ForgeError::Publish(PublishError::DestinationExists { path: destination }));
    }
    transfers.push((artifact, destination));
  }

  let history_file = request
    .publication_dir
    .join(ctx.history_file_name(&request.environment));
  let mut rollback = Rollback::default();

  let result = (|| -> ForgeResult<()> {
    if !target_dir.is_dir() {
      let mut missing = Vec::new();
      let mut dir = target_dir.as_path();
      while !dir.exists() {
        missing.push(dir.to_path_buf());
        let Some(parent) = dir.parent() else {
          break;
        };
        dir = parent;
      }
      fs::create_dir_all(&target_dir).with_context(|| format!("Failed to create {}", target_dir.display()))?;
      rollback.created_dirs.extend(missing.into_iter().rev());
    }

    for (source, destination) in &transfers {
      info!("{} -> {}", source.display(), destination.display());
      if destination.exists() {
        rollback.back_up(destination)?;
      }
      rollback.created.push(destination.clone());
      fs::copy(source, destination)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), destination.display()))?;
    }

    if history_file.exists() {
      rollback.back_up(&history_file)?;
    }
    rollback.created.push(history_file.clone());
    request
      .release_history
      .write(&history_file, ctx.config.meta_package())?;

    if request.index {
      runner.run(
        &CommandLine::new("conda")
          .arg("index")
          .arg(request.publication_dir.display().to_string()),
      )?;
    }
    Ok(())
  })();

  match result {
    Ok(()) => {
      rollback.commit()?;
      info!(
        "Published {} package(s) to {}",
        transfers.len(),
        request.publication_dir.display()
      );
      Ok(())
    }
    Err(e) => {
      rollback.undo();
      Err(ForgeError::Publish(PublishError::RolledBack { reason: e.to_string() }))
    }
  }
}
