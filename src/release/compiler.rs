//! Plan compilation
//!
//! ```text
//! RecipeGraph ─ select ─> universe ─ topo_sort ─> order
//!                                     │
//!              inspect_sources + detect_change ─> selected
//!                                     │
//!                          propagate (compiled → compiled)
//!                                     │
//!        PlanningAnnotations per package, generated recipes, history, actions
//! ```
//!
//! Compilation never touches the plan directory. [`PlanWriter`] replaces it only
//! once a [`CompiledPlan`] exists, writing the plan document last.

use crate::core::context::ForgeContext;
use crate::core::error::{ConflictError, ForgeError, ForgeResult, ResultExt};
use crate::core::plan::{Action, Plan, PublishRequest};
use crate::core::vcs::VcsProvider;
use crate::graph::recipe_graph::RecipeGraph;
use crate::graph::selection;
use crate::release::changes::{ChangeVerdict, SourceState, detect_change, inspect_sources};
use crate::release::history::{Changesets, ReleaseHistory};
use crate::release::propagate::{Propagation, propagate};
use crate::release::version::{DottedVersion, future_published_version, next_environment_version};
use serde_yaml_ng::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Caller choices for one planning run
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
  /// Selection terms (`all`, names, globs, `-term`)
  pub selection: Vec<String>,
  /// Publish to this directory at the end of the plan
  pub publication_dir: Option<PathBuf>,
  /// Build unclean sources
  pub force: bool,
  /// Run package tests while building
  pub test: bool,
}

/// Scratch data computed for a selected package; recipes stay untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanningAnnotations {
  pub version: String,
  pub build_string: String,
  pub build_script: String,
  /// Author requirements, internal lower bounds, then the meta-package range
  pub requirements: Vec<String>,
  pub changesets: Changesets,
  pub source_errors: Vec<String>,
}

/// A package-builder recipe ready to be written
#[derive(Debug, Clone)]
pub struct GeneratedRecipe {
  pub package: String,
  pub document: Mapping,
}

/// Result of a successful compilation
#[derive(Debug, Clone)]
pub struct CompiledPlan {
  pub plan: Plan,
  /// Meta-package recipe first, then selected packages in dependency order
  pub recipes: Vec<GeneratedRecipe>,
  /// Selected packages in dependency order
  pub selected: Vec<String>,
  pub annotations: BTreeMap<String, PlanningAnnotations>,
  /// Packages selected only because a compiled dependency is rebuilt
  pub propagated: Vec<Propagation>,
  pub future_version: String,
}

pub struct PlanCompiler<'a> {
  ctx: &'a ForgeContext,
  graph: &'a RecipeGraph,
  vcs: &'a dyn VcsProvider,
}

impl<'a> PlanCompiler<'a> {
  pub fn new(ctx: &'a ForgeContext, graph: &'a RecipeGraph, vcs: &'a dyn VcsProvider) -> Self {
    Self { ctx, graph, vcs }
  }

  /// Compile a packaging plan; `None` means nothing needs to be built
  pub fn compile(&self, request: &PlanRequest, mut history: ReleaseHistory) -> ForgeResult<Option<CompiledPlan>> {
    let config = &self.ctx.config;
    let meta = config.meta_package();

    for missing in history.check_consistency() {
      warn!(
        "release {} lists {} {} without recorded sources",
        missing.release, missing.package, missing.version
      );
    }

    let environment = DottedVersion::parse(&config.environment.version)?;
    let next_environment = next_environment_version(&environment)?.to_string();
    let future_version = future_published_version(&environment, history.last_published())?.to_string();

    let universe = selection::select(self.graph, &request.selection)?;
    for name in self.graph.names().filter(|n| !universe.contains(*n)) {
      info!("Package {} excluded from selection", name);
    }
    let order = self.graph.topo_sort(&universe)?;

    let mut sources: BTreeMap<String, SourceState> = BTreeMap::new();
    let mut selected: BTreeSet<String> = BTreeSet::new();
    for package in &order {
      let recipe = self.graph.recipe(package)?;
      let state = inspect_sources(recipe, self.vcs)?;
      let verdict = detect_change(package, &state.changesets, &history);
      match &verdict {
        ChangeVerdict::NeverReleased => {
          info!("Select {} because no source changesets was found in release history", package)
        }
        ChangeVerdict::Modified { components } => info!(
          "Select {} for building because some source has changed (in {}) since latest release",
          package,
          components.join(" ")
        ),
        ChangeVerdict::Unchanged => info!("No change detected in package {}", package),
      }
      if verdict.needs_build() {
        selected.insert(package.clone());
      }
      sources.insert(package.clone(), state);
    }

    if selected.is_empty() {
      info!("Nothing to do.");
      return Ok(None);
    }

    let propagated = propagate(self.graph, &universe, &mut selected);

    let selected_order: Vec<String> = order.iter().filter(|p| selected.contains(*p)).cloned().collect();

    if !request.force {
      for package in &selected_order {
        let errors = sources.get(package).map(|s| s.errors.clone()).unwrap_or_default();
        if !errors.is_empty() {
          return Err(ForgeError::RecipeConflict(ConflictError::UncleanSources {
            package: package.clone(),
            reasons: errors,
          }));
        }
      }
    }

    history.start_release(&future_version);

    let build_string = config.build_string();
    let mut annotations: BTreeMap<String, PlanningAnnotations> = BTreeMap::new();
    let mut recipes = vec![self.meta_recipe(&future_version)];

    for package in &selected_order {
      let recipe = self.graph.recipe(package)?;
      let state = sources.remove(package).unwrap_or_default();

      let version = if config.is_development() {
        future_version.clone()
      } else {
        recipe.version.clone()
      };

      let mut requirements = recipe.run_requirements.clone();
      for dependency in &recipe.internal_dependencies {
        let dependency_version = match annotations.get(dependency) {
          Some(a) => a.version.clone(),
          None => self.graph.recipe(dependency)?.version.clone(),
        };
        requirements.push(format!("{}>={}", dependency, dependency_version));
      }
      requirements.push(format!("{}>={},<{}", meta, future_version, next_environment));

      let annotation = PlanningAnnotations {
        version: version.clone(),
        build_string: build_string.clone(),
        build_script: self.build_script(&recipe.component_names()),
        requirements,
        changesets: state.changesets,
        source_errors: state.errors,
      };

      info!("Generate recipe for {} {}", package, version);
      recipes.push(GeneratedRecipe {
        package: package.clone(),
        document: package_document(&recipe.document, &annotation),
      });
      history.record(&future_version, package, &version, annotation.changesets.clone());
      annotations.insert(package.clone(), annotation);
    }

    let mut actions = vec![
      Action::CheckBuildStatus,
      Action::CreatePackage {
        package: meta.to_string(),
        test: false,
      },
    ];
    actions.extend(selected_order.iter().map(|package| Action::CreatePackage {
      package: package.clone(),
      test: request.test,
    }));

    if let Some(publication_dir) = &request.publication_dir {
      let mut packages = vec![meta.to_string()];
      packages.extend(selected_order.iter().cloned());
      actions.push(Action::Publish(PublishRequest {
        environment: config.environment.version.clone(),
        publication_dir: publication_dir.clone(),
        packages_dir: self.ctx.packages_dir(),
        packages,
        release_history: history.clone(),
        index: config.publish.index,
        force: false,
      }));
    }

    Ok(Some(CompiledPlan {
      plan: Plan::new(config.environment.version.clone(), actions)?,
      recipes,
      selected: selected_order,
      annotations,
      propagated,
      future_version,
    }))
  }

  /// Script installing the four artifact classes of every component
  fn build_script(&self, components: &[String]) -> String {
    let root = self.ctx.root.display();
    let manifest = self.ctx.manifest_path();
    [
      format!("cd '{}'", root),
      format!("pixi run --manifest-path='{}' bash << END", manifest.display()),
      "set -x".to_string(),
      format!("cd '{}/build'", root),
      "export BRAINVISA_INSTALL_PREFIX=\"$PREFIX\"".to_string(),
      format!("for component in {}; do", components.join(" ")),
      "  make install-\\${component}".to_string(),
      "  make install-\\${component}-dev".to_string(),
      "  make install-\\${component}-usrdoc".to_string(),
      "  make install-\\${component}-devdoc".to_string(),
      "done".to_string(),
      "END".to_string(),
    ]
    .join("\n")
  }

  fn meta_recipe(&self, future_version: &str) -> GeneratedRecipe {
    let config = &self.ctx.config;
    let meta = config.meta_package();

    let mut document = Mapping::new();
    set_in(&mut document, "package", "name", Value::from(meta));
    set_in(&mut document, "package", "version", Value::from(future_version));
    set_in(&mut document, "build", "string", Value::from(config.build_string()));
    set_in(
      &mut document,
      "build",
      "script",
      Value::from(format!(
        "mkdir --parents $PREFIX/share/{meta}\necho '{future_version}' > $PREFIX/share/{meta}/{meta}.version"
      )),
    );
    set_in(
      &mut document,
      "requirements",
      "run",
      Value::Sequence(vec![Value::from(format!("python=={}", config.python_short()))]),
    );

    GeneratedRecipe {
      package: meta.to_string(),
      document,
    }
  }
}

/// Set `doc[section][key]`, creating the section when needed
fn set_in(doc: &mut Mapping, section: &str, key: &str, value: Value) {
  match doc.get_mut(section) {
    Some(Value::Mapping(inner)) => {
      inner.insert(Value::from(key), value);
    }
    _ => {
      let mut inner = Mapping::new();
      inner.insert(Value::from(key), value);
      doc.insert(Value::from(section), Value::Mapping(inner));
    }
  }
}

/// The author's descriptor with version, build and requirements filled in
fn package_document(document: &Mapping, annotation: &PlanningAnnotations) -> Mapping {
  let mut doc = document.clone();
  set_in(&mut doc, "package", "version", Value::from(annotation.version.as_str()));
  set_in(&mut doc, "build", "string", Value::from(annotation.build_string.as_str()));
  set_in(&mut doc, "build", "script", Value::from(annotation.build_script.as_str()));
  set_in(
    &mut doc,
    "requirements",
    "run",
    Value::Sequence(annotation.requirements.iter().map(|r| Value::from(r.as_str())).collect()),
  );
  doc
}

/// Replaces the plan directory with a freshly compiled plan
pub struct PlanWriter<'a> {
  ctx: &'a ForgeContext,
}

impl<'a> PlanWriter<'a> {
  pub fn new(ctx: &'a ForgeContext) -> Self {
    Self { ctx }
  }

  /// Refuse to replace a plan that was already (partially) applied
  pub fn check_replaceable(&self, force: bool) -> ForgeResult<()> {
    if force {
      return Ok(());
    }
    if let Some(existing) = Plan::load_if_exists(&self.ctx.plan_file())?
      && existing.has_applied_actions()
    {
      return Err(ForgeError::RecipeConflict(ConflictError::PlanAlreadyApplied {
        plan_dir: self.ctx.plan_dir(),
      }));
    }
    Ok(())
  }

  /// Remove the previous plan, if any
  pub fn erase(&self) -> ForgeResult<()> {
    let plan_dir = self.ctx.plan_dir();
    if plan_dir.exists() {
      info!("Erasing existing plan: {}", plan_dir.display());
      fs::remove_dir_all(&plan_dir).with_context(|| format!("Failed to erase {}", plan_dir.display()))?;
    }
    Ok(())
  }

  /// Erase the plan directory, write generated recipes, then the plan
  pub fn write(&self, recipes: &[GeneratedRecipe], plan: &Plan) -> ForgeResult<()> {
    self.erase()?;

    for recipe in recipes {
      let dir = self.ctx.recipes_dir().join(&recipe.package);
      fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
      let yaml = serde_yaml_ng::to_string(&recipe.document)?;
      let path = dir.join("recipe.yaml");
      fs::write(&path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    plan.save(&self.ctx.plan_file())
  }
}
