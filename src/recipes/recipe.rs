//! Recipe descriptors
//!
//! A component tree declares a package with `<ns>/<ns>-recipe.yaml`, `<ns>`
//! being the meta-package name:
//!
//! ```yaml
//! package:
//!   name: lib-b
//!   version: '2.1.0'      # optional, quoted
//! demo-env:
//!   type: compiled
//!   components:
//!     lib-b-extras: {}
//!   internal-dependencies: [lib-a]
//! requirements:
//!   run: [numpy]
//! about:
//!   summary: ...
//! ```
//!
//! The namespace section drives planning and never reaches the package builder.
//! Every other key is kept verbatim in [`Recipe::document`].

use crate::core::error::{ConfigError, ForgeError, ForgeResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Governs binary-compatibility propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
  Interpreted,
  Compiled,
  Virtual,
}

impl fmt::Display for PackageKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PackageKind::Interpreted => write!(f, "interpreted"),
      PackageKind::Compiled => write!(f, "compiled"),
      PackageKind::Virtual => write!(f, "virtual"),
    }
  }
}

/// One source tree bundled by a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
  pub name: String,
  pub path: PathBuf,
}

/// Immutable packaging descriptor for one distributable package
#[derive(Debug, Clone)]
pub struct Recipe {
  pub name: String,
  pub version: String,
  pub kind: PackageKind,
  /// Hosting tree first, then declared components
  pub components: Vec<Component>,
  pub internal_dependencies: Vec<String>,
  /// Author-supplied run requirements
  pub run_requirements: Vec<String>,
  /// Descriptor without the namespace section
  pub document: Mapping,
}

#[derive(Deserialize)]
struct PackageSection {
  name: String,
  #[serde(default)]
  version: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct NamespaceSection {
  #[serde(rename = "type")]
  kind: PackageKind,
  #[serde(default)]
  components: IndexMap<String, Value>,
  #[serde(default)]
  internal_dependencies: Vec<String>,
}

/// Descriptor as written by the author, before versions and paths are resolved
#[derive(Debug, Clone)]
pub struct RecipeDescriptor {
  pub name: String,
  pub explicit_version: Option<String>,
  pub kind: PackageKind,
  pub declared_components: Vec<String>,
  pub internal_dependencies: Vec<String>,
  pub run_requirements: Vec<String>,
  pub document: Mapping,
}

impl RecipeDescriptor {
  /// Parse descriptor text; `namespace` is the meta-package name
  pub fn parse(content: &str, namespace: &str, path: &Path) -> ForgeResult<Self> {
    let malformed = |reason: String| {
      ForgeError::Config(ConfigError::Malformed {
        path: path.to_path_buf(),
        reason,
      })
    };

    let value: Value = serde_yaml_ng::from_str(content).map_err(|e| malformed(e.to_string()))?;
    let Value::Mapping(mut document) = value else {
      return Err(malformed("expected a mapping at the top level".to_string()));
    };

    let package_value = document
      .get("package")
      .cloned()
      .ok_or_else(|| malformed("missing 'package' section".to_string()))?;
    let package: PackageSection =
      serde_yaml_ng::from_value(package_value).map_err(|e| malformed(format!("package: {}", e)))?;

    let namespace_value = document
      .remove(namespace)
      .ok_or_else(|| malformed(format!("missing '{}' section", namespace)))?;
    let section: NamespaceSection = serde_yaml_ng::from_value(namespace_value).map_err(|e| {
      ForgeError::Config(ConfigError::InvalidRecipe {
        package: package.name.clone(),
        reason: format!("{}: {}", namespace, e),
      })
    })?;

    let explicit_version = match package.version {
      None | Some(Value::Null) => None,
      Some(Value::String(s)) => Some(s),
      // YAML reads `1.10` as the float 1.1
      Some(Value::Number(n)) => {
        warn!(
          package = %package.name,
          "package.version {} is not a string, quote it to keep trailing zeros",
          n
        );
        Some(n.to_string())
      }
      Some(other) => {
        return Err(ForgeError::Config(ConfigError::InvalidRecipe {
          package: package.name,
          reason: format!("package.version must be a string, found {:?}", other),
        }));
      }
    };

    let run_requirements = match document.get("requirements").and_then(|r| r.get("run")) {
      None | Some(Value::Null) => Vec::new(),
      Some(run) => serde_yaml_ng::from_value(run.clone()).map_err(|e| {
        ForgeError::Config(ConfigError::InvalidRecipe {
          package: package.name.clone(),
          reason: format!("requirements.run: {}", e),
        })
      })?,
    };

    Ok(Self {
      name: package.name,
      explicit_version,
      kind: section.kind,
      declared_components: section.components.into_keys().collect(),
      internal_dependencies: section.internal_dependencies,
      run_requirements,
      document,
    })
  }
}

impl Recipe {
  pub fn is_compiled(&self) -> bool {
    self.kind == PackageKind::Compiled
  }

  /// Names of the bundled components, in order
  pub fn component_names(&self) -> Vec<String> {
    self.components.iter().map(|c| c.name.clone()).collect()
  }
}
