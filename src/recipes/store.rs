//! Recipe store: scan component trees, resolve versions and components
//!
//! ```text
//! <root>/src/<tree>/<ns>/<ns>-recipe.yaml  ->  Recipe { name, version, components, ... }
//!                                          ->  RecipeGraph
//! ```

use crate::core::context::ForgeContext;
use crate::core::error::{ConfigError, ForgeError, ForgeResult, ResultExt};
use crate::graph::recipe_graph::RecipeGraph;
use crate::recipes::recipe::{Component, PackageKind, Recipe, RecipeDescriptor};
use crate::recipes::version_info::read_component_version;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct RecipeStore;

impl RecipeStore {
  /// Load every recipe of the workspace into a dependency graph
  pub fn load(ctx: &ForgeContext) -> ForgeResult<RecipeGraph> {
    let recipes = Self::scan(ctx)?;
    let graph = RecipeGraph::new(recipes)?;
    if graph.is_empty() {
      warn!("No recipe found under {}", ctx.src_dir().display());
    } else {
      debug!("{} recipes loaded", graph.len());
    }
    Ok(graph)
  }

  /// Read every recipe descriptor found under `<root>/src`, sorted by tree name
  pub fn scan(ctx: &ForgeContext) -> ForgeResult<Vec<Recipe>> {
    let src_dir = ctx.src_dir();
    if !src_dir.is_dir() {
      return Err(ForgeError::with_help(
        format!("Source directory {} does not exist", src_dir.display()),
        "Component source trees are expected under <root>/src",
      ));
    }

    let mut trees: Vec<PathBuf> = fs::read_dir(&src_dir)
      .with_context(|| format!("Failed to list {}", src_dir.display()))?
      .filter_map(Result::ok)
      .map(|entry| entry.path())
      .filter(|path| path.is_dir())
      .collect();
    trees.sort();

    let namespace = ctx.config.meta_package();
    let recipe_file_name = format!("{}-recipe.yaml", namespace);

    let mut recipes = Vec::new();
    for tree in trees {
      let recipe_file = tree.join(namespace).join(&recipe_file_name);
      if !recipe_file.is_file() {
        continue;
      }
      debug!(file = %recipe_file.display(), "reading recipe");
      recipes.push(Self::read_recipe(ctx, &tree, &recipe_file)?);
    }

    Ok(recipes)
  }

  fn read_recipe(ctx: &ForgeContext, tree: &Path, recipe_file: &Path) -> ForgeResult<Recipe> {
    let content = fs::read_to_string(recipe_file)
      .map_err(|e| {
        ForgeError::Config(ConfigError::Malformed {
          path: recipe_file.to_path_buf(),
          reason: e.to_string(),
        })
      })?;
    let descriptor = RecipeDescriptor::parse(&content, ctx.config.meta_package(), recipe_file)?;

    let version = Self::resolve_version(ctx, tree, &descriptor)?;

    let src_dir = ctx.src_dir();
    let mut components = Vec::new();
    if descriptor.kind != PackageKind::Virtual {
      components.push(Component {
        name: tree_name(tree),
        path: tree.to_path_buf(),
      });
    }
    for name in &descriptor.declared_components {
      if components.iter().any(|c| &c.name == name) {
        continue;
      }
      components.push(Component {
        name: name.clone(),
        path: src_dir.join(name),
      });
    }

    Ok(Recipe {
      name: descriptor.name,
      version,
      kind: descriptor.kind,
      components,
      internal_dependencies: descriptor.internal_dependencies,
      run_requirements: descriptor.run_requirements,
      document: descriptor.document,
    })
  }

  fn resolve_version(ctx: &ForgeContext, tree: &Path, descriptor: &RecipeDescriptor) -> ForgeResult<String> {
    let environment_version = &ctx.config.environment.version;

    if ctx.config.is_development() {
      return Ok(environment_version.clone());
    }
    if let Some(version) = &descriptor.explicit_version {
      return Ok(version.clone());
    }
    if descriptor.kind != PackageKind::Virtual {
      match read_component_version(tree) {
        Ok(Some(version)) => return Ok(version),
        Ok(None) => {}
        Err(e) => warn!(package = %descriptor.name, "cannot read component version: {}", e),
      }
    }

    warn!(
      package = %descriptor.name,
      "directory {} declares no version (pyproject.toml, project_info.cmake, python/*/info.py or */info.py); using {}",
      tree.display(),
      environment_version
    );
    Ok(environment_version.clone())
  }
}

fn tree_name(tree: &Path) -> String {
  tree
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default()
}
