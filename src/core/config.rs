use crate::core::error::{ConfigError, ForgeError, ForgeResult, ResultExt};
use crate::release::version::DottedVersion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for forgeplan
/// Searched in order: forgeplan.toml, .forgeplan.toml, .config/forgeplan.toml, conf/forgeplan.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeConfig {
  pub environment: EnvironmentConfig,
  #[serde(default)]
  pub build: BuildConfig,
  #[serde(default)]
  pub publish: PublishConfig,
}

/// The distribution being released
///
/// # Example
///
/// ```toml
/// [environment]
/// name = "soma-env"
/// version = "6.0"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
  /// Meta-package name; also the recipe namespace and the history file prefix
  pub name: String,

  /// Current development line of the distribution (dotted numeric)
  pub version: String,
}

/// Build pipeline and package builder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
  /// Interpreter version used in build strings and the meta-package pin
  #[serde(default = "default_python")]
  pub python: String,

  /// Environment manifest, relative to the workspace root
  #[serde(default = "default_manifest")]
  pub manifest: PathBuf,

  /// Build pipeline status document, relative to the workspace root
  #[serde(default = "default_status_file")]
  pub status_file: PathBuf,

  /// Section of the status document holding the pipeline stages
  #[serde(default = "default_status_section")]
  pub status_section: String,

  /// Package channels; empty means "read them from the manifest"
  #[serde(default)]
  pub channels: Vec<String>,
}

fn default_python() -> String {
  "3.12".to_string()
}

fn default_manifest() -> PathBuf {
  PathBuf::from("pyproject.toml")
}

fn default_status_file() -> PathBuf {
  PathBuf::from("conf").join("build_info.json")
}

fn default_status_section() -> String {
  "brainvisa-cmake".to_string()
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      python: default_python(),
      manifest: default_manifest(),
      status_file: default_status_file(),
      status_section: default_status_section(),
      channels: Vec::new(),
    }
  }
}

/// Publication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
  /// Default publication directory when --publish-dir is not given
  #[serde(default)]
  pub directory: Option<PathBuf>,

  /// Artifact platform subdirectory
  #[serde(default = "default_platform")]
  pub platform: String,

  /// Run the artifact indexer after publication
  #[serde(default)]
  pub index: bool,
}

fn default_platform() -> String {
  "linux-64".to_string()
}

impl Default for PublishConfig {
  fn default() -> Self {
    Self {
      directory: None,
      platform: default_platform(),
      index: false,
    }
  }
}

impl ForgeConfig {
  /// Find config file in search order
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("forgeplan.toml"),
      path.join(".forgeplan.toml"),
      path.join(".config").join("forgeplan.toml"),
      path.join("conf").join("forgeplan.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from forgeplan.toml (searches multiple locations)
  pub fn load(path: &Path) -> ForgeResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      ForgeError::Config(ConfigError::NotFound {
        workspace_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    Ok(config)
  }

  /// Parse and validate configuration text
  pub fn parse(content: &str) -> ForgeResult<Self> {
    let config: ForgeConfig = toml_edit::de::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Validate configuration values
  pub fn validate(&self) -> ForgeResult<()> {
    if self.environment.name.trim().is_empty() {
      return Err(ForgeError::Config(ConfigError::MissingField {
        field: "environment.name".to_string(),
      }));
    }

    DottedVersion::parse(&self.environment.version)?;

    let python = DottedVersion::parse(&self.build.python)?;
    if python.component_count() < 2 {
      return Err(ForgeError::with_help(
        format!("Invalid build.python '{}'", self.build.python),
        "Use a major.minor interpreter version such as \"3.12\"",
      ));
    }

    Ok(())
  }

  /// Meta-package name (also the recipe namespace)
  pub fn meta_package(&self) -> &str {
    &self.environment.name
  }

  /// Development environments version every package with the environment version
  pub fn is_development(&self) -> bool {
    self.environment.version.starts_with("0.")
  }

  /// Build string derived from the interpreter, e.g. `py312`
  pub fn build_string(&self) -> String {
    let mut parts = self.build.python.split('.');
    let major = parts.next().unwrap_or_default();
    let minor = parts.next().unwrap_or_default();
    format!("py{}{}", major, minor)
  }

  /// Interpreter version as `major.minor`
  pub fn python_short(&self) -> String {
    self.build.python.split('.').take(2).collect::<Vec<_>>().join(".")
  }
}
