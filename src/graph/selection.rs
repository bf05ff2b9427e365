//! Package selection
//!
//! Terms are applied left to right:
//!
//! - `all` adds every package
//! - a name or glob (`lib-*`, `py?`, `[ab]*`) adds the matching packages
//! - a leading `-` subtracts instead of adding
//!
//! The result is then closed under internal dependency.

use crate::core::error::{ConfigError, ForgeError, ForgeResult};
use crate::graph::recipe_graph::RecipeGraph;
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, warn};

/// Default selection when none is given
pub const ALL: &str = "all";

fn is_glob(term: &str) -> bool {
  term.contains(['*', '?', '['])
}

/// Packages matched by a single term
fn matching(graph: &RecipeGraph, term: &str) -> ForgeResult<BTreeSet<String>> {
  if term == ALL {
    return Ok(graph.names().cloned().collect());
  }

  if is_glob(term) {
    let pattern = glob::Pattern::new(term)?;
    let matched: BTreeSet<String> = graph.names().filter(|n| pattern.matches(n)).cloned().collect();
    if matched.is_empty() {
      warn!(pattern = term, "selection pattern matches no package");
    }
    return Ok(matched);
  }

  if !graph.contains(term) {
    return Err(ForgeError::Config(ConfigError::UnknownPackage {
      name: term.to_string(),
      referenced_by: None,
    }));
  }
  Ok(BTreeSet::from([term.to_string()]))
}

/// Apply the selection terms without dependency closure
pub fn initial_selection(graph: &RecipeGraph, patterns: &[String]) -> ForgeResult<BTreeSet<String>> {
  let default = [ALL.to_string()];
  let patterns = if patterns.is_empty() { &default[..] } else { patterns };

  let mut selected = BTreeSet::new();
  for raw in patterns {
    let raw = raw.trim();
    if raw.is_empty() {
      continue;
    }
    match raw.strip_prefix('-') {
      Some(term) => {
        for name in matching(graph, term.trim())? {
          selected.remove(&name);
        }
      }
      None => selected.extend(matching(graph, raw)?),
    }
  }
  Ok(selected)
}

/// Expand a set breadth-first through internal-dependency edges
pub fn dependency_closure(graph: &RecipeGraph, initial: &BTreeSet<String>) -> BTreeSet<String> {
  let mut done = BTreeSet::new();
  let mut queue: VecDeque<String> = initial.iter().cloned().collect();

  while let Some(package) = queue.pop_front() {
    if !done.insert(package.clone()) {
      continue;
    }
    for dependency in graph.dependencies(&package) {
      if !done.contains(&dependency) {
        if !initial.contains(&dependency) {
          debug!(package = %dependency, required_by = %package, "selected as dependency");
        }
        queue.push_back(dependency);
      }
    }
  }
  done
}

/// Select packages by pattern, closed under internal dependency
pub fn select(graph: &RecipeGraph, patterns: &[String]) -> ForgeResult<BTreeSet<String>> {
  let initial = initial_selection(graph, patterns)?;
  Ok(dependency_closure(graph, &initial))
}
