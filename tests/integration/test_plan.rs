//! Integration tests for `forgeplan plan` and `forgeplan show-plan`

use crate::helpers::{TestWorkspace, action_kinds, forgeplan, run_forgeplan, stderr, stdout};
use anyhow::Result;

/// lib-a (compiled) <- lib-b (compiled) <- app-c (interpreted)
fn abc() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new("6.0")?;
  ws.add_package("lib-a", "compiled", &[], &[])?;
  ws.add_package("lib-b", "compiled", &["lib-a"], &["zlib"])?;
  ws.add_package("app-c", "interpreted", &["lib-b"], &[])?;
  Ok(ws)
}

#[test]
fn test_first_plan_selects_everything() -> Result<()> {
  let ws = abc()?;

  let output = run_forgeplan(&ws.path, &["plan"])?;
  assert!(stdout(&output).contains("Packages to build (3)"));
  assert!(stderr(&output).contains("does not exist"), "missing history is reported");

  let plan = ws.read_plan()?;
  assert_eq!(
    action_kinds(&plan),
    vec![
      "check_build_status",
      "create_package",
      "create_package",
      "create_package",
      "create_package",
      "publish"
    ]
  );
  let packages: Vec<&str> = plan["actions"]
    .as_array()
    .unwrap()
    .iter()
    .filter_map(|a| a["package"].as_str())
    .collect();
  assert_eq!(packages, vec!["demo-env", "lib-a", "lib-b", "app-c"]);

  let publish = &plan["actions"][5];
  assert_eq!(publish["packages"][0], "demo-env");
  assert_eq!(publish["release_history"]["releases"]["6.0.0"]["lib-b"], "1.0.0");

  let meta = std::fs::read_to_string(ws.path.join("plan/recipes/demo-env/recipe.yaml"))?;
  assert!(meta.contains("version: 6.0.0"));
  assert!(meta.contains("python==3.12"));

  let lib_b = std::fs::read_to_string(ws.path.join("plan/recipes/lib-b/recipe.yaml"))?;
  assert!(lib_b.contains("zlib"));
  assert!(lib_b.contains("lib-a>=1.0.0"));
  assert!(lib_b.contains("demo-env>=6.0.0,<6.1"));
  assert!(lib_b.contains("summary: lib-b test package"));
  assert!(!lib_b.contains("internal-dependencies"), "namespace section is stripped");
  Ok(())
}

#[test]
fn test_change_propagates_to_compiled_dependents_only() -> Result<()> {
  let ws = abc()?;
  ws.record_release("6.0", "6.0.0", &["lib-a", "lib-b", "app-c"])?;
  ws.change("lib-a")?;

  run_forgeplan(&ws.path, &["plan"])?;

  let plan = ws.read_plan()?;
  let publish = plan["actions"]
    .as_array()
    .unwrap()
    .iter()
    .find(|a| a["action"] == "publish")
    .cloned()
    .unwrap();
  assert_eq!(publish["packages"], serde_json::json!(["demo-env", "lib-a", "lib-b"]));
  assert_eq!(publish["release_history"]["releases"]["6.0.1"]["app-c"], "1.0.0");

  let lib_b = std::fs::read_to_string(ws.path.join("plan/recipes/lib-b/recipe.yaml"))?;
  assert!(lib_b.contains("demo-env>=6.0.1,<6.1"));
  assert!(!ws.path.join("plan/recipes/app-c").exists());
  Ok(())
}

#[test]
fn test_nothing_to_do_erases_pending_plan() -> Result<()> {
  let ws = abc()?;
  ws.record_release("6.0", "6.0.0", &["lib-a", "lib-b", "app-c"])?;
  ws.write_plan(serde_json::json!([{ "action": "rebuild" }]))?;

  let output = run_forgeplan(&ws.path, &["plan"])?;
  assert!(stdout(&output).contains("Nothing to do"));
  assert!(!ws.plan_file().exists());

  let output = forgeplan(&ws.path, &["apply-plan"])?;
  assert!(stderr(&output).contains("No plan found"));
  Ok(())
}

#[test]
fn test_nothing_to_do_keeps_applied_plan_without_force() -> Result<()> {
  let ws = abc()?;
  ws.record_release("6.0", "6.0.0", &["lib-a", "lib-b", "app-c"])?;
  ws.write_plan(serde_json::json!([{ "action": "rebuild", "status": "success" }]))?;

  let output = forgeplan(&ws.path, &["plan"])?;
  assert_eq!(output.status.code(), Some(1));
  assert_eq!(action_kinds(&ws.read_plan()?), vec!["rebuild"]);
  Ok(())
}

#[test]
fn test_selection_and_no_publication() -> Result<()> {
  let ws = abc()?;

  run_forgeplan(&ws.path, &["plan", "--publish-dir", "none", "--select", "lib-*,-lib-a"])?;

  let plan = ws.read_plan()?;
  let kinds = action_kinds(&plan);
  assert!(!kinds.contains(&"publish".to_string()));
  // lib-b pulls in its dependency lib-a
  assert!(ws.path.join("plan/recipes/lib-a/recipe.yaml").exists());
  assert!(ws.path.join("plan/recipes/lib-b/recipe.yaml").exists());
  assert!(!ws.path.join("plan/recipes/app-c").exists());
  Ok(())
}

#[test]
fn test_dirty_sources_require_force() -> Result<()> {
  let ws = abc()?;
  std::fs::write(ws.tree("lib-a").join("pyproject.toml"), "[project]\nversion = \"1.0.0\"\n# edited\n")?;

  let output = forgeplan(&ws.path, &["plan"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("contains uncommitted files"));
  assert!(!ws.plan_file().exists());

  run_forgeplan(&ws.path, &["plan", "--force"])?;
  assert!(ws.plan_file().exists());
  Ok(())
}

#[test]
fn test_applied_plan_is_not_replaced_without_force() -> Result<()> {
  let ws = abc()?;
  ws.write_plan(serde_json::json!([
    { "action": "check_build_status", "status": "success" },
    { "action": "rebuild" }
  ]))?;

  let output = forgeplan(&ws.path, &["plan"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("was used"));
  assert_eq!(action_kinds(&ws.read_plan()?), vec!["check_build_status", "rebuild"]);

  run_forgeplan(&ws.path, &["plan", "--force"])?;
  assert_eq!(action_kinds(&ws.read_plan()?)[0], "check_build_status");
  assert_eq!(ws.read_plan()?["actions"].as_array().unwrap().len(), 6);
  Ok(())
}

#[test]
fn test_missing_publication_directory() -> Result<()> {
  let ws = abc()?;
  let missing = ws.path.join("no-such-channel");
  let output = forgeplan(&ws.path, &["plan", "--publish-dir", missing.to_str().unwrap()])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("does not exist"));
  Ok(())
}

#[test]
fn test_cycle_is_reported() -> Result<()> {
  let ws = TestWorkspace::new("6.0")?;
  ws.add_package("ping", "compiled", &["pong"], &[])?;
  ws.add_package("pong", "compiled", &["ping"], &[])?;

  let output = forgeplan(&ws.path, &["plan"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Circular internal dependency"));
  assert!(!ws.plan_file().exists());
  Ok(())
}

#[test]
fn test_show_plan() -> Result<()> {
  let ws = abc()?;
  ws.write_plan(serde_json::json!([
    { "action": "check_build_status", "status": "success" },
    { "action": "create_package", "package": "lib-a", "test": false }
  ]))?;

  let output = run_forgeplan(&ws.path, &["show-plan"])?;
  let out = stdout(&output);
  assert!(out.contains("2, 1 pending"));
  assert!(out.contains("✅"));
  assert!(out.contains("lib-a"));
  Ok(())
}
