//! External tool invocation
//!
//! Every external program (build pipeline, package builder, indexer) is
//! described as a [`CommandLine`] and run through a [`CommandRunner`], so that
//! failures always carry the exact invocation and tests can record commands
//! instead of spawning them.

use crate::core::error::{ForgeError, ForgeResult};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

/// A fully specified external invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
}

impl CommandLine {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }
}

/// Each argument single-quoted, so the line can be pasted into a shell
impl fmt::Display for CommandLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "'{}'", self.program)?;
    for arg in &self.args {
      write!(f, " '{}'", arg)?;
    }
    Ok(())
  }
}

/// Runs external commands to completion
pub trait CommandRunner {
  fn run(&self, command: &CommandLine) -> ForgeResult<()>;
}

/// Spawns commands as child processes with inherited stdio
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, command: &CommandLine) -> ForgeResult<()> {
    tracing::debug!(command = %command, "running external tool");

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);
    if let Some(cwd) = &command.cwd {
      cmd.current_dir(cwd);
    }

    let status = cmd.status().map_err(|e| ForgeError::ExternalTool {
      command: command.to_string(),
      status: None,
      stderr: e.to_string(),
    })?;

    if !status.success() {
      return Err(ForgeError::ExternalTool {
        command: command.to_string(),
        status: status.code(),
        stderr: String::new(),
      });
    }

    Ok(())
  }
}
