//! In-memory collaborators for unit tests

use crate::core::error::{ForgeError, ForgeResult};
use crate::core::tools::{CommandLine, CommandRunner};
use crate::core::vcs::{Vcs, VcsProvider};
use crate::recipes::recipe::{Component, PackageKind, Recipe};
use serde_yaml_ng::Mapping;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Recipe whose only component is its own tree under `/work/src`
pub fn recipe(name: &str, kind: PackageKind, deps: &[&str]) -> Recipe {
  Recipe {
    name: name.to_string(),
    version: "1.0.0".to_string(),
    kind,
    components: vec![Component {
      name: name.to_string(),
      path: PathBuf::from("/work/src").join(name),
    }],
    internal_dependencies: deps.iter().map(|d| d.to_string()).collect(),
    run_requirements: Vec::new(),
    document: Mapping::new(),
  }
}

#[derive(Debug, Clone, Default)]
pub struct RepoState {
  pub revision: String,
  pub dirty: bool,
  pub untracked: bool,
}

/// Repositories keyed by path; every mutating call is logged
#[derive(Default)]
pub struct FakeVcsProvider {
  repos: RefCell<BTreeMap<PathBuf, RepoState>>,
  log: Rc<RefCell<Vec<String>>>,
}

impl FakeVcsProvider {
  pub fn with_repo(self, path: impl Into<PathBuf>, revision: &str) -> Self {
    self.set(
      path,
      RepoState {
        revision: revision.to_string(),
        ..Default::default()
      },
    );
    self
  }

  pub fn set(&self, path: impl Into<PathBuf>, state: RepoState) {
    self.repos.borrow_mut().insert(path.into(), state);
  }

  pub fn log(&self) -> Vec<String> {
    self.log.borrow().clone()
  }
}

impl VcsProvider for FakeVcsProvider {
  fn open(&self, path: &Path) -> ForgeResult<Box<dyn Vcs>> {
    let state = self
      .repos
      .borrow()
      .get(path)
      .cloned()
      .ok_or_else(|| ForgeError::message(format!("{} is not a git repository", path.display())))?;
    Ok(Box::new(FakeVcs {
      path: path.to_path_buf(),
      state,
      log: Rc::clone(&self.log),
    }))
  }
}

struct FakeVcs {
  path: PathBuf,
  state: RepoState,
  log: Rc<RefCell<Vec<String>>>,
}

impl Vcs for FakeVcs {
  fn is_dirty(&self) -> ForgeResult<bool> {
    Ok(self.state.dirty)
  }

  fn has_untracked(&self) -> ForgeResult<bool> {
    Ok(self.state.untracked)
  }

  fn head_revision(&self) -> ForgeResult<String> {
    Ok(self.state.revision.clone())
  }

  fn add(&self, files: &[PathBuf]) -> ForgeResult<()> {
    let files: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
    self
      .log
      .borrow_mut()
      .push(format!("add {} {}", self.path.display(), files.join(" ")));
    Ok(())
  }

  fn commit(&self, message: &str) -> ForgeResult<()> {
    self
      .log
      .borrow_mut()
      .push(format!("commit {} {}", self.path.display(), message));
    Ok(())
  }

  fn push(&self) -> ForgeResult<()> {
    self.log.borrow_mut().push(format!("push {}", self.path.display()));
    Ok(())
  }
}

/// Records commands instead of running them; fails when the program matches `fail_on`
#[derive(Default)]
pub struct RecordingRunner {
  pub commands: RefCell<Vec<CommandLine>>,
  pub fail_on: Option<String>,
}

impl RecordingRunner {
  pub fn failing_on(program: &str) -> Self {
    Self {
      commands: RefCell::default(),
      fail_on: Some(program.to_string()),
    }
  }

  pub fn programs(&self) -> Vec<String> {
    self.commands.borrow().iter().map(|c| c.program.clone()).collect()
  }
}

impl CommandRunner for RecordingRunner {
  fn run(&self, command: &CommandLine) -> ForgeResult<()> {
    self.commands.borrow_mut().push(command.clone());
    if self.fail_on.as_deref() == Some(command.program.as_str()) {
      return Err(ForgeError::ExternalTool {
        command: command.to_string(),
        status: Some(1),
        stderr: String::new(),
      });
    }
    Ok(())
  }
}
