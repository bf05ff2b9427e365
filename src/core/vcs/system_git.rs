//! System git backend
//!
//! Every query is one `git` subprocess with an isolated environment. Nothing is
//! cached: component state is read fresh on each planning run.

use crate::core::error::{ForgeError, ForgeResult, ResultExt};
use crate::core::vcs::Vcs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Git backend using system git
pub struct SystemGit {
  /// Working tree of the component
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open a git working tree
  pub fn open(path: &Path) -> ForgeResult<Self> {
    let git = Self {
      repo_path: path.to_path_buf(),
    };

    let output = git
      .git_cmd()
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ForgeError::with_help(
        format!("{} is not a git repository: {}", path.display(), stderr.trim()),
        "Every component source tree must be a git working tree",
      ));
    }

    Ok(git)
  }

  /// Run git and return stdout, mapping failures to `ExternalTool`
  fn run(&self, args: &[&str]) -> ForgeResult<String> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;
    self.check(args, output)
  }

  fn check(&self, args: &[&str], output: Output) -> ForgeResult<String> {
    if !output.status.success() {
      let mut command = format!("'git' '-C' '{}'", self.repo_path.display());
      for arg in args {
        command.push_str(&format!(" '{}'", arg));
      }
      return Err(ForgeError::ExternalTool {
        command,
        status: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("core.quotePath=false");

    cmd
  }
}

impl Vcs for SystemGit {
  fn is_dirty(&self) -> ForgeResult<bool> {
    let stdout = self.run(&["status", "--porcelain", "--untracked-files=no"])?;
    Ok(!stdout.trim().is_empty())
  }

  fn has_untracked(&self) -> ForgeResult<bool> {
    let stdout = self.run(&["ls-files", "--others", "--exclude-standard"])?;
    Ok(!stdout.trim().is_empty())
  }

  fn head_revision(&self) -> ForgeResult<String> {
    Ok(self.run(&["rev-parse", "HEAD"])?.trim().to_string())
  }

  fn add(&self, files: &[PathBuf]) -> ForgeResult<()> {
    let paths: Vec<String> = files.iter().map(|f| f.to_string_lossy().to_string()).collect();
    let mut args = vec!["add", "--"];
    args.extend(paths.iter().map(String::as_str));
    self.run(&args)?;
    Ok(())
  }

  fn commit(&self, message: &str) -> ForgeResult<()> {
    self.run(&["commit", "-m", message, "-n"])?;
    Ok(())
  }

  fn push(&self) -> ForgeResult<()> {
    self.run(&["push"])?;
    Ok(())
  }
}
