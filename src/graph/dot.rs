//! Graphviz rendering of the recipe graph

use crate::graph::recipe_graph::RecipeGraph;
use crate::recipes::recipe::PackageKind;
use std::collections::BTreeSet;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct DotOptions {
  /// Draw third-party run requirements
  pub show_external: bool,
  /// Include versions in node labels
  pub show_versions: bool,
}

/// Package name of a requirement spec such as `numpy>=1.24` or `libfoo 2.*`
pub fn requirement_name(requirement: &str) -> &str {
  let requirement = requirement.trim();
  let end = requirement
    .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    .unwrap_or(requirement.len());
  &requirement[..end]
}

fn node_style(kind: PackageKind) -> &'static str {
  match kind {
    PackageKind::Interpreted => "fillcolor=\"aquamarine2\"",
    PackageKind::Compiled => "fillcolor=\"darkgreen\",fontcolor=white",
    PackageKind::Virtual => "fillcolor=\"powderblue\"",
  }
}

/// Render `selection` (already closed under dependency) as a digraph
pub fn render(graph: &RecipeGraph, selection: &BTreeSet<String>, options: DotOptions) -> String {
  let mut edges: BTreeSet<(String, String)> = BTreeSet::new();
  let mut known: BTreeSet<String> = BTreeSet::new();
  let mut external: BTreeSet<String> = BTreeSet::new();

  let mut out = String::new();
  out.push_str("digraph {\n");
  out.push_str("  node [shape=box, color=black, style=filled]\n");

  for recipe in selection.iter().filter_map(|name| graph.get(name)) {
    let label = if options.show_versions {
      format!("{} ({})", recipe.name, recipe.version)
    } else {
      recipe.name.clone()
    };
    let _ = writeln!(
      out,
      "  \"{}\" [label=\"{}\",{}]",
      recipe.name,
      label,
      node_style(recipe.kind)
    );

    for dependency in &recipe.internal_dependencies {
      edges.insert((recipe.name.clone(), dependency.clone()));
    }

    for requirement in &recipe.run_requirements {
      let name = requirement_name(requirement);
      if name.is_empty() {
        continue;
      }
      if graph.contains(name) {
        if !selection.contains(name) {
          known.insert(name.to_string());
        }
        edges.insert((recipe.name.clone(), name.to_string()));
      } else if options.show_external {
        external.insert(name.to_string());
        edges.insert((recipe.name.clone(), name.to_string()));
      }
    }
  }

  for (from, to) in &edges {
    let _ = writeln!(out, "  \"{}\" -> \"{}\"", from, to);
  }
  for name in &known {
    let _ = writeln!(out, "  \"{}\" [fillcolor=\"bisque\"]", name);
  }
  for name in &external {
    let _ = writeln!(out, "  \"{}\" [fillcolor=\"aliceblue\"]", name);
  }
  out.push_str("}\n");
  out
}
