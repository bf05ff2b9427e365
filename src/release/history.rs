//! Release history: what was published, when, and from which sources
//!
//! The on-disk document is keyed by the meta-package name:
//!
//! ```json
//! {
//!     "demo-env": {"6.0.0": {"lib-a": "1.2.0"}},
//!     "packages": {"lib-a": {"1.2.0": {"lib-a": "3f2c..."}}}
//! }
//! ```
//!
//! Release order is document order, so every map is an `IndexMap`; the last key
//! of the releases map is the last published version.

use crate::core::error::{ConfigError, ForgeError, ForgeResult, ResultExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Component name → revision id
pub type Changesets = BTreeMap<String, String>;

/// Append-only record of releases and package sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseHistory {
  /// release version → package → package version
  pub releases: IndexMap<String, IndexMap<String, String>>,

  /// package → package version → changesets
  pub packages: IndexMap<String, IndexMap<String, Changesets>>,
}

#[derive(Deserialize)]
struct HistoryDocument {
  #[serde(default)]
  packages: IndexMap<String, IndexMap<String, Changesets>>,
  #[serde(flatten)]
  releases_by_meta: IndexMap<String, IndexMap<String, IndexMap<String, String>>>,
}

#[derive(Serialize)]
struct HistoryDocumentRef<'a> {
  #[serde(flatten)]
  releases_by_meta: IndexMap<&'a str, &'a IndexMap<String, IndexMap<String, String>>>,
  packages: &'a IndexMap<String, IndexMap<String, Changesets>>,
}

/// A `releases[v][pkg] = ver` entry without matching package sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSources {
  pub release: String,
  pub package: String,
  pub version: String,
}

impl ReleaseHistory {
  /// Parse a history document for the given meta-package
  pub fn from_json(content: &str, meta_package: &str) -> ForgeResult<Self> {
    let mut document: HistoryDocument = serde_json::from_str(content)?;
    let releases = document.releases_by_meta.shift_remove(meta_package).unwrap_or_default();
    Ok(Self {
      releases,
      packages: document.packages,
    })
  }

  /// Load a history file
  pub fn load(path: &Path, meta_package: &str) -> ForgeResult<Self> {
    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read release history {}", path.display()))?;
    Self::from_json(&content, meta_package).map_err(|e| {
      ForgeError::Config(ConfigError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
      })
    })
  }

  /// Render the document with 4-space indentation, preserving order
  pub fn to_json(&self, meta_package: &str) -> ForgeResult<String> {
    let mut releases_by_meta = IndexMap::new();
    releases_by_meta.insert(meta_package, &self.releases);
    let document = HistoryDocumentRef {
      releases_by_meta,
      packages: &self.packages,
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| ForgeError::message(format!("History is not valid UTF-8: {}", e)))
  }

  /// Write a history file
  pub fn write(&self, path: &Path, meta_package: &str) -> ForgeResult<()> {
    let json = self.to_json(meta_package)?;
    fs::write(path, json).with_context(|| format!("Failed to write release history {}", path.display()))
  }

  /// Last published release version, in document order
  pub fn last_published(&self) -> Option<&str> {
    self.releases.keys().last().map(String::as_str)
  }

  /// Version of a package in the last published release
  pub fn last_released_version(&self, package: &str) -> Option<&str> {
    let (_, release) = self.releases.last()?;
    release.get(package).map(String::as_str)
  }

  /// Changesets of a package as of the last published release
  ///
  /// `None` means the package was never released.
  pub fn latest_changesets(&self, package: &str) -> Option<&Changesets> {
    let version = self.last_released_version(package)?;
    self.packages.get(package)?.get(version)
  }

  /// Open a new release entry as a deep copy of the last one
  pub fn start_release(&mut self, version: &str) {
    let entry = self.releases.last().map(|(_, r)| r.clone()).unwrap_or_default();
    self.releases.insert(version.to_string(), entry);
  }

  /// Record a package version in a release together with its sources
  pub fn record(&mut self, release: &str, package: &str, version: &str, changesets: Changesets) {
    self
      .releases
      .entry(release.to_string())
      .or_default()
      .insert(package.to_string(), version.to_string());
    self
      .packages
      .entry(package.to_string())
      .or_default()
      .insert(version.to_string(), changesets);
  }

  /// Every release entry whose package version has no recorded sources
  pub fn check_consistency(&self) -> Vec<MissingSources> {
    let mut missing = Vec::new();
    for (release, packages) in &self.releases {
      for (package, version) in packages {
        let known = self.packages.get(package).is_some_and(|versions| versions.contains_key(version));
        if !known {
          missing.push(MissingSources {
            release: release.clone(),
            package: package.clone(),
            version: version.clone(),
          });
        }
      }
    }
    missing
  }
}
