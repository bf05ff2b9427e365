//! Test helpers for integration tests

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const META: &str = "demo-env";

/// A workspace whose component trees are git repositories
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
  pub channel: PathBuf,
}

impl TestWorkspace {
  /// Workspace for environment `version` with an empty publication directory
  pub fn new(version: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("work");
    let channel = root.path().join("channel");
    std::fs::create_dir_all(path.join("src"))?;
    std::fs::create_dir_all(&channel)?;

    std::fs::write(
      path.join("forgeplan.toml"),
      format!(
        r#"[environment]
name = "{META}"
version = "{version}"

[build]
channels = ["conda-forge"]

[publish]
directory = "{}"
"#,
        channel.display()
      ),
    )?;

    Ok(Self {
      _root: root,
      path,
      channel,
    })
  }

  pub fn tree(&self, name: &str) -> PathBuf {
    self.path.join("src").join(name)
  }

  /// Add a component tree holding the recipe of package `name`
  pub fn add_package(&self, name: &str, kind: &str, deps: &[&str], run: &[&str]) -> Result<PathBuf> {
    let tree = self.tree(name);
    std::fs::create_dir_all(tree.join(META))?;

    git(&tree, &["init", "--initial-branch=main"])?;
    git(&tree, &["config", "user.name", "Test User"])?;
    git(&tree, &["config", "user.email", "test@example.com"])?;

    std::fs::write(
      tree.join("pyproject.toml"),
      format!("[project]\nname = \"{}\"\nversion = \"1.0.0\"\n", name),
    )?;

    let list = |items: &[&str]| format!("[{}]", items.join(", "));
    std::fs::write(
      tree.join(META).join(format!("{}-recipe.yaml", META)),
      format!(
        "package:\n  name: {name}\n{META}:\n  type: {kind}\n  internal-dependencies: {}\nrequirements:\n  run: {}\nabout:\n  summary: {name} test package\n",
        list(deps),
        list(run)
      ),
    )?;

    git(&tree, &["add", "."])?;
    git(&tree, &["commit", "-m", "Initial commit"])?;
    Ok(tree)
  }

  /// Commit a change in a component tree, returning the new revision
  pub fn change(&self, name: &str) -> Result<String> {
    let tree = self.tree(name);
    std::fs::write(tree.join("CHANGES"), format!("change in {}\n", name))?;
    git(&tree, &["add", "."])?;
    git(&tree, &["commit", "-m", "Change"])?;
    self.revision(name)
  }

  pub fn revision(&self, name: &str) -> Result<String> {
    let output = git(&self.tree(name), &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn history_file(&self, environment: &str) -> PathBuf {
    self.channel.join(format!("{}-{}.json", META, environment))
  }

  /// Record a published release holding the current revision of every package
  pub fn record_release(&self, environment: &str, release: &str, packages: &[&str]) -> Result<()> {
    let mut versions = Map::new();
    let mut sources = Map::new();
    for package in packages {
      versions.insert(package.to_string(), json!("1.0.0"));
      let mut changesets = Map::new();
      changesets.insert(package.to_string(), json!(self.revision(package)?));
      let mut by_version = Map::new();
      by_version.insert("1.0.0".to_string(), Value::Object(changesets));
      sources.insert(package.to_string(), Value::Object(by_version));
    }
    let mut releases = Map::new();
    releases.insert(release.to_string(), Value::Object(versions));
    let mut history = Map::new();
    history.insert(META.to_string(), Value::Object(releases));
    history.insert("packages".to_string(), Value::Object(sources));
    std::fs::write(self.history_file(environment), serde_json::to_string_pretty(&history)?)?;
    Ok(())
  }

  pub fn plan_file(&self) -> PathBuf {
    self.path.join("plan").join("actions.json")
  }

  pub fn read_plan(&self) -> Result<Value> {
    let content = std::fs::read_to_string(self.plan_file()).context("plan file missing")?;
    Ok(serde_json::from_str(&content)?)
  }

  /// Write a plan document made of `actions`
  pub fn write_plan(&self, actions: Value) -> Result<()> {
    let plan = json!({
      "id": "0123456789abcdef",
      "created": "2026-01-01T00:00:00Z",
      "environment": "6.0",
      "actions": actions,
    });
    std::fs::create_dir_all(self.path.join("plan"))?;
    std::fs::write(self.plan_file(), serde_json::to_string_pretty(&plan)?)?;
    Ok(())
  }
}

/// Kinds of the actions of a plan document, in order
pub fn action_kinds(plan: &Value) -> Vec<String> {
  plan["actions"]
    .as_array()
    .map(|actions| {
      actions
        .iter()
        .map(|a| a["action"].as_str().unwrap_or_default().to_string())
        .collect()
    })
    .unwrap_or_default()
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run forgeplan in a workspace, whatever its exit status
pub fn forgeplan(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_forgeplan"))
    .current_dir(cwd)
    .env_remove("FORGEPLAN_ROOT")
    .env("RUST_LOG", "forgeplan=info")
    .args(args)
    .output()
    .context("Failed to run forgeplan")
}

/// Run forgeplan and require success
pub fn run_forgeplan(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = forgeplan(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "forgeplan command failed: forgeplan {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
