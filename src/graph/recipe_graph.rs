//! Recipe dependency graph built with petgraph
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "A internally depends on B"
//! - **Nodes**: package names, one per recipe
//! - **Index**: name → node, name → recipe (sorted, for deterministic output)
//! - **Algorithms**: Kahn sequencing with a lexicographic ready queue, SCC for cycle reports

use crate::core::error::{ConfigError, ForgeError, ForgeResult};
use crate::recipes::recipe::Recipe;
use petgraph::Direction;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Package name → recipe, with internal-dependency edges
#[derive(Debug)]
pub struct RecipeGraph {
  recipes: BTreeMap<String, Recipe>,
  graph: DiGraph<String, ()>,
  name_to_node: HashMap<String, NodeIndex>,
}

impl RecipeGraph {
  /// Build the graph; every dependency must name a known package
  pub fn new(recipes: Vec<Recipe>) -> ForgeResult<Self> {
    let mut by_name = BTreeMap::new();
    for recipe in recipes {
      if by_name.contains_key(&recipe.name) {
        return Err(ForgeError::Config(ConfigError::InvalidRecipe {
          package: recipe.name.clone(),
          reason: "declared by more than one component tree".to_string(),
        }));
      }
      by_name.insert(recipe.name.clone(), recipe);
    }

    let mut graph = DiGraph::new();
    let mut name_to_node = HashMap::new();
    for name in by_name.keys() {
      let idx = graph.add_node(name.clone());
      name_to_node.insert(name.clone(), idx);
    }

    for recipe in by_name.values() {
      let from = name_to_node[&recipe.name];
      for dependency in &recipe.internal_dependencies {
        let to = name_to_node.get(dependency).ok_or_else(|| {
          ForgeError::Config(ConfigError::UnknownPackage {
            name: dependency.clone(),
            referenced_by: Some(recipe.name.clone()),
          })
        })?;
        graph.update_edge(from, *to, ());
      }
    }

    Ok(Self {
      recipes: by_name,
      graph,
      name_to_node,
    })
  }

  pub fn get(&self, name: &str) -> Option<&Recipe> {
    self.recipes.get(name)
  }

  /// Get a recipe or fail with an unknown-package error
  pub fn recipe(&self, name: &str) -> ForgeResult<&Recipe> {
    self.recipes.get(name).ok_or_else(|| {
      ForgeError::Config(ConfigError::UnknownPackage {
        name: name.to_string(),
        referenced_by: None,
      })
    })
  }

  pub fn contains(&self, name: &str) -> bool {
    self.recipes.contains_key(name)
  }

  /// All package names, sorted
  pub fn names(&self) -> impl Iterator<Item = &String> {
    self.recipes.keys()
  }

  pub fn len(&self) -> usize {
    self.recipes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.recipes.is_empty()
  }

  /// Direct internal dependencies of a package, sorted and deduplicated
  pub fn dependencies(&self, name: &str) -> Vec<String> {
    self.neighbors(name, Direction::Outgoing)
  }

  /// Packages that directly depend on `name`, sorted
  pub fn dependents(&self, name: &str) -> Vec<String> {
    self.neighbors(name, Direction::Incoming)
  }

  fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
    let Some(idx) = self.name_to_node.get(name) else {
      return Vec::new();
    };
    let mut names: Vec<String> = self
      .graph
      .neighbors_directed(*idx, direction)
      .map(|n| self.graph[n].clone())
      .collect();
    names.sort();
    names.dedup();
    names
  }

  /// Order `set` so that every package comes after its dependencies within the set
  ///
  /// Kahn's algorithm; among simultaneously ready packages the lexicographically
  /// smallest goes first. Fails with `CyclicDependency` instead of dropping
  /// packages it cannot order.
  pub fn topo_sort(&self, set: &BTreeSet<String>) -> ForgeResult<Vec<String>> {
    for name in set {
      self.recipe(name)?;
    }

    let mut remaining: BTreeMap<&str, usize> = BTreeMap::new();
    for name in set {
      let count = self.dependencies(name).iter().filter(|d| set.contains(*d)).count();
      remaining.insert(name.as_str(), count);
    }

    let mut ready: BTreeSet<String> = remaining
      .iter()
      .filter(|(_, count)| **count == 0)
      .map(|(name, _)| name.to_string())
      .collect();

    let mut order = Vec::with_capacity(set.len());
    while let Some(package) = ready.pop_first() {
      for dependent in self.dependents(&package) {
        if let Some(count) = remaining.get_mut(dependent.as_str()) {
          *count -= 1;
          if *count == 0 {
            ready.insert(dependent);
          }
        }
      }
      order.push(package);
    }

    if order.len() < set.len() {
      let placed: BTreeSet<&String> = order.iter().collect();
      let unplaced: Vec<String> = set.iter().filter(|n| !placed.contains(n)).cloned().collect();
      return Err(ForgeError::CyclicDependency {
        cycles: self.cycles_among(&unplaced),
        packages: unplaced,
      });
    }

    Ok(order)
  }

  /// Strongly connected components that form cycles, restricted to `names`
  fn cycles_among(&self, names: &[String]) -> Vec<Vec<String>> {
    let members: BTreeSet<&String> = names.iter().collect();
    let mut cycles: Vec<Vec<String>> = algo::tarjan_scc(&self.graph)
      .into_iter()
      .filter(|scc| {
        scc.len() > 1 || scc.iter().any(|n| self.graph.contains_edge(*n, *n))
      })
      .map(|scc| {
        let mut cycle: Vec<String> = scc.iter().map(|n| self.graph[*n].clone()).collect();
        cycle.sort();
        cycle
      })
      .filter(|cycle| cycle.iter().all(|n| members.contains(n)))
      .collect();
    cycles.sort();
    cycles
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::recipes::recipe::PackageKind;
  use crate::testing::recipe;

  fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
  }

  fn position(order: &[String], name: &str) -> usize {
    order.iter().position(|n| n == name).unwrap()
  }

  #[test]
  fn test_topo_sort_respects_dependencies() {
    let graph = RecipeGraph::new(vec![
      recipe("app", PackageKind::Interpreted, &["core", "io"]),
      recipe("io", PackageKind::Compiled, &["core"]),
      recipe("core", PackageKind::Compiled, &[]),
      recipe("docs", PackageKind::Interpreted, &[]),
    ])
    .unwrap();

    let all = set(&["app", "io", "core", "docs"]);
    let order = graph.topo_sort(&all).unwrap();
    assert_eq!(order.len(), 4);
    for name in &all {
      for dep in graph.dependencies(name) {
        assert!(position(&order, &dep) < position(&order, name), "{dep} must precede {name}");
      }
    }
    // lexicographic tie-break among ready packages
    assert_eq!(order, vec!["core", "docs", "io", "app"]);
  }

  #[test]
  fn test_topo_sort_ignores_dependencies_outside_set() {
    let graph = RecipeGraph::new(vec![
      recipe("a", PackageKind::Compiled, &[]),
      recipe("b", PackageKind::Compiled, &["a"]),
    ])
    .unwrap();
    assert_eq!(graph.topo_sort(&set(&["b"])).unwrap(), vec!["b"]);
  }

  #[test]
  fn test_cycle_is_reported_not_dropped() {
    let graph = RecipeGraph::new(vec![
      recipe("a", PackageKind::Compiled, &["c"]),
      recipe("b", PackageKind::Compiled, &["a"]),
      recipe("c", PackageKind::Compiled, &["b"]),
      recipe("d", PackageKind::Compiled, &[]),
      recipe("e", PackageKind::Compiled, &["a"]),
    ])
    .unwrap();

    let err = graph.topo_sort(&set(&["a", "b", "c", "d", "e"])).unwrap_err();
    match err {
      ForgeError::CyclicDependency { packages, cycles } => {
        assert_eq!(packages, vec!["a", "b", "c", "e"]);
        assert_eq!(cycles, vec![vec!["a", "b", "c"]]);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn test_self_dependency_is_a_cycle() {
    let graph = RecipeGraph::new(vec![recipe("a", PackageKind::Compiled, &["a"])]).unwrap();
    assert!(matches!(
      graph.topo_sort(&set(&["a"])),
      Err(ForgeError::CyclicDependency { .. })
    ));
  }

  #[test]
  fn test_duplicate_package_is_rejected() {
    let err = RecipeGraph::new(vec![
      recipe("a", PackageKind::Compiled, &[]),
      recipe("a", PackageKind::Interpreted, &[]),
    ])
    .err()
    .unwrap();
    assert!(matches!(err, ForgeError::Config(ConfigError::InvalidRecipe { .. })));
  }

  #[test]
  fn test_dependents() {
    let graph = RecipeGraph::new(vec![
      recipe("a", PackageKind::Compiled, &[]),
      recipe("c", PackageKind::Compiled, &["a"]),
      recipe("b", PackageKind::Compiled, &["a", "a"]),
    ])
    .unwrap();
    assert_eq!(graph.dependents("a"), vec!["b", "c"]);
    assert_eq!(graph.dependencies("b"), vec!["a"]);
  }
}
