//! Integration tests for `forgeplan apply-plan`

use crate::helpers::{META, TestWorkspace, forgeplan, run_forgeplan, stderr, stdout};
use anyhow::Result;
use serde_json::json;

fn statuses(ws: &TestWorkspace) -> Result<Vec<String>> {
  let plan = ws.read_plan()?;
  Ok(
    plan["actions"]
      .as_array()
      .map(|actions| {
        actions
          .iter()
          .map(|a| a["status"].as_str().unwrap_or("pending").to_string())
          .collect()
      })
      .unwrap_or_default(),
  )
}

fn build_status(doc_start: u64) -> serde_json::Value {
  json!({ "brainvisa-cmake": {
    "configure": { "status": "succeeded", "start": 100, "stop": 200 },
    "build": { "status": "succeeded", "start": 201, "stop": 300 },
    "doc": { "status": "succeeded", "start": doc_start, "stop": 400 }
  }})
}

#[test]
fn test_apply_resumes_after_failed_build_status() -> Result<()> {
  let ws = TestWorkspace::new("6.0")?;
  let target = ws.path.join("notes.txt");
  std::fs::write(&target, "before")?;
  std::fs::create_dir_all(ws.path.join("conf"))?;
  std::fs::write(ws.path.join("conf/build_info.json"), build_status(250).to_string())?;

  ws.write_plan(json!([
    { "action": "modify_file", "file": target, "file_contents": "after" },
    { "action": "check_build_status" },
    { "action": "modify_file", "file": target, "file_contents": "final" }
  ]))?;

  let output = forgeplan(&ws.path, &["apply-plan"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("doc step started before the end of build"));
  assert_eq!(statuses(&ws)?, vec!["success", "pending", "pending"]);
  assert_eq!(std::fs::read_to_string(&target)?, "after");

  std::fs::write(ws.path.join("conf/build_info.json"), build_status(301).to_string())?;
  let output = run_forgeplan(&ws.path, &["apply-plan"])?;
  assert!(stdout(&output).contains("2 action(s) executed"));
  assert!(stdout(&output).contains("1 action(s) already done"));
  assert_eq!(statuses(&ws)?, vec!["success", "success", "success"]);
  assert_eq!(std::fs::read_to_string(&target)?, "final");

  let output = run_forgeplan(&ws.path, &["apply-plan"])?;
  assert!(stdout(&output).contains("already fully applied"));
  Ok(())
}

fn publish_plan(ws: &TestWorkspace, packages_dir: &std::path::Path) -> Result<()> {
  ws.write_plan(json!([{
    "action": "publish",
    "environment": "6.0",
    "publication_dir": ws.channel,
    "packages_dir": packages_dir,
    "packages": [META, "lib-a"],
    "release_history": {
      "releases": { "6.0.0": { "lib-a": "1.0.0" } },
      "packages": { "lib-a": { "1.0.0": { "lib-a": "abc123" } } }
    }
  }]))
}

fn built_artifacts(ws: &TestWorkspace) -> Result<std::path::PathBuf> {
  let packages_dir = ws.path.join("plan/packages");
  std::fs::create_dir_all(packages_dir.join("linux-64"))?;
  std::fs::write(packages_dir.join("linux-64/demo-env-6.0.0-py312.conda"), "meta")?;
  std::fs::write(packages_dir.join("linux-64/lib-a-1.0.0-py312.conda"), "lib")?;
  Ok(packages_dir)
}

#[test]
fn test_publish_writes_artifacts_and_history() -> Result<()> {
  let ws = TestWorkspace::new("6.0")?;
  let packages_dir = built_artifacts(&ws)?;
  publish_plan(&ws, &packages_dir)?;

  run_forgeplan(&ws.path, &["apply-plan"])?;

  assert!(ws.channel.join("linux-64/demo-env-6.0.0-py312.conda").is_file());
  assert!(ws.channel.join("linux-64/lib-a-1.0.0-py312.conda").is_file());

  let history: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(ws.history_file("6.0"))?)?;
  assert_eq!(history[META]["6.0.0"]["lib-a"], "1.0.0");
  assert_eq!(history["packages"]["lib-a"]["1.0.0"]["lib-a"], "abc123");
  assert_eq!(statuses(&ws)?, vec!["success"]);
  Ok(())
}

#[test]
fn test_publish_refuses_existing_destination() -> Result<()> {
  let ws = TestWorkspace::new("6.0")?;
  let packages_dir = built_artifacts(&ws)?;
  publish_plan(&ws, &packages_dir)?;

  std::fs::create_dir_all(ws.channel.join("linux-64"))?;
  std::fs::write(ws.channel.join("linux-64/lib-a-1.0.0-py312.conda"), "published")?;
  std::fs::write(ws.history_file("6.0"), "{}")?;

  let output = forgeplan(&ws.path, &["apply-plan"])?;
  assert_eq!(output.status.code(), Some(2));
  assert!(stderr(&output).contains("already exists"));
  assert!(!ws.channel.join("linux-64/demo-env-6.0.0-py312.conda").exists());
  assert_eq!(std::fs::read_to_string(ws.history_file("6.0"))?, "{}");
  assert_eq!(
    std::fs::read_to_string(ws.channel.join("linux-64/lib-a-1.0.0-py312.conda"))?,
    "published"
  );
  assert_eq!(statuses(&ws)?, vec!["pending"]);
  Ok(())
}

#[test]
fn test_apply_without_plan() -> Result<()> {
  let ws = TestWorkspace::new("6.0")?;
  let output = forgeplan(&ws.path, &["apply-plan"])?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("No plan found"));
  Ok(())
}
