//! Integration tests for `forgeplan version-plan`

use crate::helpers::{TestWorkspace, action_kinds, run_forgeplan, stdout};
use anyhow::Result;

#[test]
fn test_version_plan_bumps_modified_package() -> Result<()> {
  let ws = TestWorkspace::new("6.0")?;
  ws.add_package("lib-a", "compiled", &[], &[])?;
  ws.add_package("lib-b", "compiled", &["lib-a"], &[])?;
  ws.record_release("6.0", "6.0.0", &["lib-a", "lib-b"])?;
  ws.change("lib-a")?;

  let output = run_forgeplan(&ws.path, &["version-plan"])?;
  assert!(stdout(&output).contains("lib-a 1.0.0 → 1.0.1"));

  let plan = ws.read_plan()?;
  assert_eq!(action_kinds(&plan), vec!["modify_file", "git_commit", "rebuild"]);
  assert!(
    plan["actions"][0]["file_contents"]
      .as_str()
      .unwrap()
      .contains("version = \"1.0.1\"")
  );
  assert_eq!(
    plan["actions"][1]["message"],
    "Set package lib-a from version 1.0.0 to version 1.0.1"
  );

  // sources stay untouched until the plan is applied
  let pyproject = std::fs::read_to_string(ws.tree("lib-a").join("pyproject.toml"))?;
  assert!(pyproject.contains("version = \"1.0.0\""));
  Ok(())
}

#[test]
fn test_version_plan_nothing_to_do() -> Result<()> {
  let ws = TestWorkspace::new("6.0")?;
  ws.add_package("lib-a", "compiled", &[], &[])?;
  ws.record_release("6.0", "6.0.0", &["lib-a"])?;

  let output = run_forgeplan(&ws.path, &["version-plan"])?;
  assert!(stdout(&output).contains("Nothing to do"));
  assert!(!ws.plan_file().exists());
  Ok(())
}
