//! Compiled-to-compiled selection propagation
//!
//! A compiled package linked against another compiled package must be rebuilt
//! whenever that dependency is rebuilt, even if its own sources did not change.
//! Computed as a worklist: only dependents of newly selected packages are
//! re-examined.

use crate::graph::recipe_graph::RecipeGraph;
use std::collections::{BTreeSet, VecDeque};
use tracing::info;

/// A package added by propagation and the selected dependency that caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagation {
  pub package: String,
  pub cause: String,
}

/// Extend `selected` to its fixpoint within `universe`
///
/// Monotone: nothing is ever removed from `selected`.
pub fn propagate(graph: &RecipeGraph, universe: &BTreeSet<String>, selected: &mut BTreeSet<String>) -> Vec<Propagation> {
  let is_compiled = |name: &str| graph.get(name).is_some_and(|r| r.is_compiled());

  let mut queue: VecDeque<String> = selected.iter().filter(|n| is_compiled(n.as_str())).cloned().collect();
  let mut added = Vec::new();

  while let Some(package) = queue.pop_front() {
    for dependent in graph.dependents(&package) {
      if selected.contains(&dependent) || !universe.contains(&dependent) || !is_compiled(dependent.as_str()) {
        continue;
      }
      info!(
        "Select {} because it is binary dependent on {} which is selected",
        dependent, package
      );
      selected.insert(dependent.clone());
      added.push(Propagation {
        package: dependent.clone(),
        cause: package.clone(),
      });
      queue.push_back(dependent);
    }
  }

  added
}
