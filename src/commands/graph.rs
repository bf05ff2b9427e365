//! `forgeplan graph`

use crate::core::context::ForgeContext;
use crate::core::error::ForgeResult;
use crate::graph::dot::{self, DotOptions};
use crate::graph::selection;
use crate::recipes::store::RecipeStore;

/// Print the Graphviz digraph of the selected packages and their dependencies
pub fn run_graph(ctx: &ForgeContext, select: &[String], options: DotOptions) -> ForgeResult<()> {
  let graph = RecipeStore::load(ctx)?;
  let selected = selection::select(&graph, select)?;
  print!("{}", dot::render(&graph, &selected, options));
  Ok(())
}
