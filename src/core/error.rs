//! Error types for forgeplan with contextual messages and exit codes
//!
//! Every fatal condition of planning or execution maps onto one [`ForgeError`] variant.
//! Variants carry enough data to print an actionable message, and most of them know
//! how to suggest a fix through [`ForgeError::help_message`].

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for forgeplan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (configuration, recipes, selection, plan conflicts)
  User = 1,
  /// System error (external tools, publication, I/O)
  System = 2,
  /// Validation failure (build status checks)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for forgeplan
#[derive(Debug)]
pub enum ForgeError {
  /// Malformed or incomplete configuration, recipe or version metadata
  Config(ConfigError),

  /// The dependency graph of the selected packages contains a cycle
  CyclicDependency {
    /// Packages the sequencer could not order
    packages: Vec<String>,
    /// Strongly connected components forming the cycles
    cycles: Vec<Vec<String>>,
  },

  /// Planning refused to overwrite state or to build unclean sources
  RecipeConflict(ConflictError),

  /// An external program exited unsuccessfully (or could not be started)
  ExternalTool {
    command: String,
    status: Option<i32>,
    stderr: String,
  },

  /// The publish sequence failed (rollback has already been performed)
  Publish(PublishError),

  /// A validation step failed
  Validation(ValidationError),

  /// A recipe kind whose planning is not supported
  NotImplemented { feature: String },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ForgeError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ForgeError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ForgeError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ForgeError::Message { message, context, help } => ForgeError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      // Bare I/O errors carry no path, so the context becomes the headline
      ForgeError::Io(err) => ForgeError::Message {
        message: ctx_str,
        context: Some(format!("I/O error: {}", err)),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ForgeError::Config(_) => ExitCode::User,
      ForgeError::CyclicDependency { .. } => ExitCode::User,
      ForgeError::RecipeConflict(_) => ExitCode::User,
      ForgeError::ExternalTool { .. } => ExitCode::System,
      ForgeError::Publish(_) => ExitCode::System,
      ForgeError::Validation(_) => ExitCode::Validation,
      ForgeError::NotImplemented { .. } => ExitCode::User,
      ForgeError::Io(_) => ExitCode::System,
      ForgeError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ForgeError::Config(e) => e.help_message(),
      ForgeError::CyclicDependency { .. } => {
        Some("Remove one of the internal-dependencies entries forming the cycle.".to_string())
      }
      ForgeError::RecipeConflict(e) => e.help_message(),
      ForgeError::ExternalTool { .. } => {
        Some("Run the command above by hand to diagnose, then re-run `forgeplan apply-plan` to resume.".to_string())
      }
      ForgeError::Publish(e) => e.help_message(),
      ForgeError::Validation(e) => e.help_message(),
      ForgeError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ForgeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ForgeError::Config(e) => write!(f, "{}", e),
      ForgeError::CyclicDependency { packages, cycles } => {
        write!(f, "Circular internal dependency among: {}", packages.join(", "))?;
        for cycle in cycles {
          write!(f, "\n  cycle: {}", cycle.join(" -> "))?;
        }
        Ok(())
      }
      ForgeError::RecipeConflict(e) => write!(f, "{}", e),
      ForgeError::ExternalTool { command, status, stderr } => {
        match status {
          Some(code) => write!(f, "Command failed with exit code {}: {}", code, command)?,
          None => write!(f, "Command failed: {}", command)?,
        }
        if !stderr.trim().is_empty() {
          write!(f, "\n{}", stderr.trim_end())?;
        }
        Ok(())
      }
      ForgeError::Publish(e) => write!(f, "{}", e),
      ForgeError::Validation(e) => write!(f, "{}", e),
      ForgeError::NotImplemented { feature } => write!(f, "Not implemented: {}", feature),
      ForgeError::Io(e) => write!(f, "I/O error: {}", e),
      ForgeError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ForgeError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ForgeError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ForgeError {
  fn from(err: io::Error) -> Self {
    ForgeError::Io(err)
  }
}

impl From<String> for ForgeError {
  fn from(msg: String) -> Self {
    ForgeError::message(msg)
  }
}

impl From<&str> for ForgeError {
  fn from(msg: &str) -> Self {
    ForgeError::message(msg)
  }
}

impl From<toml_edit::TomlError> for ForgeError {
  fn from(err: toml_edit::TomlError) -> Self {
    ForgeError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for ForgeError {
  fn from(err: toml_edit::de::Error) -> Self {
    ForgeError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for ForgeError {
  fn from(err: serde_json::Error) -> Self {
    ForgeError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml_ng::Error> for ForgeError {
  fn from(err: serde_yaml_ng::Error) -> Self {
    ForgeError::message(format!("YAML error: {}", err))
  }
}

impl From<regex::Error> for ForgeError {
  fn from(err: regex::Error) -> Self {
    ForgeError::message(format!("Regex error: {}", err))
  }
}

impl From<glob::PatternError> for ForgeError {
  fn from(err: glob::PatternError) -> Self {
    ForgeError::message(format!("Invalid pattern: {}", err))
  }
}

impl From<std::num::ParseIntError> for ForgeError {
  fn from(err: std::num::ParseIntError) -> Self {
    ForgeError::message(format!("Parse error: {}", err))
  }
}

impl From<ConfigError> for ForgeError {
  fn from(err: ConfigError) -> Self {
    ForgeError::Config(err)
  }
}

impl From<PublishError> for ForgeError {
  fn from(err: PublishError) -> Self {
    ForgeError::Publish(err)
  }
}

/// Configuration, recipe and version metadata errors
#[derive(Debug)]
pub enum ConfigError {
  /// forgeplan.toml not found
  NotFound { workspace_root: PathBuf },

  /// Missing required field
  MissingField { field: String },

  /// A structured document could not be parsed
  Malformed { path: PathBuf, reason: String },

  /// A selection or dependency names a package no recipe defines
  UnknownPackage {
    name: String,
    referenced_by: Option<String>,
  },

  /// A recipe is structurally invalid
  InvalidRecipe { package: String, reason: String },

  /// A version string is not a dotted numeric version
  InvalidVersion { version: String },

  /// The publication directory does not exist
  MissingPublicationDir { path: PathBuf },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create forgeplan.toml with an [environment] table (name and version).".to_string())
      }
      ConfigError::UnknownPackage { referenced_by: Some(owner), .. } => Some(format!(
        "Fix the internal-dependencies list of '{}' or add the missing recipe.",
        owner
      )),
      ConfigError::UnknownPackage { .. } => {
        Some("Run `forgeplan graph` to list the packages known in this workspace.".to_string())
      }
      ConfigError::MissingPublicationDir { .. } => {
        Some("Create the directory or pass --publish-dir none to plan without publication.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { workspace_root } => {
        write!(
          f,
          "No forgeplan configuration found.\nExpected file: {}/forgeplan.toml",
          workspace_root.display()
        )
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field: {}", field)
      }
      ConfigError::Malformed { path, reason } => {
        write!(f, "Malformed document {}: {}", path.display(), reason)
      }
      ConfigError::UnknownPackage {
        name,
        referenced_by: Some(owner),
      } => {
        write!(f, "Package '{}' depends on unknown package '{}'", owner, name)
      }
      ConfigError::UnknownPackage { name, referenced_by: None } => {
        write!(f, "Unknown package '{}'", name)
      }
      ConfigError::InvalidRecipe { package, reason } => {
        write!(f, "Invalid recipe for {}: {}", package, reason)
      }
      ConfigError::InvalidVersion { version } => {
        write!(f, "Invalid version '{}': expected dot-separated numbers", version)
      }
      ConfigError::MissingPublicationDir { path } => {
        write!(f, "Publication directory {} does not exist", path.display())
      }
    }
  }
}

/// Planning conflicts
#[derive(Debug)]
pub enum ConflictError {
  /// The existing plan has already been (partially) applied
  PlanAlreadyApplied { plan_dir: PathBuf },

  /// A selected package has uncommitted or untracked sources
  UncleanSources { package: String, reasons: Vec<String> },
}

impl ConflictError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConflictError::PlanAlreadyApplied { .. } => {
        Some("Erase the plan directory or use --force to replace it.".to_string())
      }
      ConflictError::UncleanSources { .. } => {
        Some("Commit or clean the component sources, or use --force to build them anyway.".to_string())
      }
    }
  }
}

impl fmt::Display for ConflictError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConflictError::PlanAlreadyApplied { plan_dir } => {
        write!(f, "A plan already exists in {} and was used", plan_dir.display())
      }
      ConflictError::UncleanSources { package, reasons } => {
        write!(f, "Cannot build {} because {}", package, reasons.join(", "))
      }
    }
  }
}

/// Publication errors
#[derive(Debug)]
pub enum PublishError {
  /// No artifact file found for a package
  MissingArtifact { package: String, directory: PathBuf },

  /// More than one artifact file found for a package
  AmbiguousArtifact { package: String, candidates: Vec<PathBuf> },

  /// Destination file exists and force was not requested
  DestinationExists { path: PathBuf },

  /// The sequence failed midway and was rolled back
  RolledBack { reason: String },
}

impl PublishError {
  fn help_message(&self) -> Option<String> {
    match self {
      PublishError::MissingArtifact { .. } | PublishError::AmbiguousArtifact { .. } => {
        Some("Clean the plan packages directory and re-run the create_package actions.".to_string())
      }
      PublishError::DestinationExists { .. } => {
        Some("This version was already published; bump the package version before publishing again.".to_string())
      }
      PublishError::RolledBack { .. } => {
        Some("The publication directory was restored; fix the cause and re-run `forgeplan apply-plan`.".to_string())
      }
    }
  }
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishError::MissingArtifact { package, directory } => {
        write!(f, "No package file found for {} in {}", package, directory.display())
      }
      PublishError::AmbiguousArtifact { package, candidates } => {
        let names: Vec<String> = candidates.iter().map(|c| c.display().to_string()).collect();
        write!(f, "Several package files found for {}: {}", package, names.join(", "))
      }
      PublishError::DestinationExists { path } => {
        write!(f, "Destination file {} already exists", path.display())
      }
      PublishError::RolledBack { reason } => {
        write!(f, "Publication failed and was rolled back: {}", reason)
      }
    }
  }
}

/// Validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// The build pipeline status does not allow packaging
  BuildStatus { reason: String },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::BuildStatus { .. } => {
        Some("Run the configure, build and doc steps again, in that order.".to_string())
      }
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::BuildStatus { reason } => {
        write!(f, "Build status check failed: {}", reason)
      }
    }
  }
}

/// Result type alias for forgeplan
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ForgeResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ForgeResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ForgeError>,
{
  fn context(self, ctx: impl Into<String>) -> ForgeResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ForgeResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ForgeError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
