//! Integration tests for `forgeplan graph`

use crate::helpers::{TestWorkspace, run_forgeplan, stdout};
use anyhow::Result;

fn workspace() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new("6.0")?;
  ws.add_package("lib-a", "compiled", &[], &["zlib"])?;
  ws.add_package("lib-b", "compiled", &["lib-a"], &[])?;
  ws.add_package("app-c", "interpreted", &["lib-b"], &["numpy>=1.24", "tools"])?;
  ws.add_package("tools", "interpreted", &[], &[])?;
  Ok(ws)
}

#[test]
fn test_graph_of_everything() -> Result<()> {
  let ws = workspace()?;
  let out = stdout(&run_forgeplan(&ws.path, &["graph"])?);

  assert!(out.starts_with("digraph {\n  node [shape=box, color=black, style=filled]\n"));
  assert!(out.contains("  \"lib-a\" [label=\"lib-a\",fillcolor=\"darkgreen\",fontcolor=white]\n"));
  assert!(out.contains("  \"app-c\" [label=\"app-c\",fillcolor=\"aquamarine2\"]\n"));
  assert!(out.contains("  \"lib-b\" -> \"lib-a\"\n"));
  assert!(out.contains("  \"app-c\" -> \"tools\"\n"));
  assert!(!out.contains("numpy"));
  assert!(!out.contains("bisque"), "tools is drawn as a selected package");
  assert!(out.ends_with("}\n"));
  Ok(())
}

#[test]
fn test_graph_selection_closure_and_options() -> Result<()> {
  let ws = workspace()?;
  let out = stdout(&run_forgeplan(
    &ws.path,
    &["graph", "--select", "lib-b", "--show-versions", "--show-external"],
  )?);

  assert!(out.contains("\"lib-b\" [label=\"lib-b (1.0.0)\""));
  assert!(out.contains("\"lib-a\" [label=\"lib-a (1.0.0)\""));
  assert!(!out.contains("\"app-c\" ["));
  assert!(out.contains("  \"lib-a\" -> \"zlib\"\n"));
  assert!(out.contains("  \"zlib\" [fillcolor=\"aliceblue\"]\n"));
  Ok(())
}

#[test]
fn test_graph_is_deterministic() -> Result<()> {
  let ws = workspace()?;
  let first = stdout(&run_forgeplan(&ws.path, &["graph", "--show-external"])?);
  let second = stdout(&run_forgeplan(&ws.path, &["graph", "--show-external"])?);
  assert_eq!(first, second);
  Ok(())
}
