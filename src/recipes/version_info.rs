//! Component version metadata
//!
//! Component trees record their version in one of three places, checked in
//! this order: `pyproject.toml`, `project_info.cmake`, or an `info.py` module
//! (`info.py`, `*/info.py`, `python/*/info.py`).

use crate::core::error::{ForgeError, ForgeResult};
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFormat {
  Pyproject,
  ProjectInfoCmake,
  InfoPy,
}

/// The file holding a component's version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFile {
  pub path: PathBuf,
  pub format: VersionFormat,
}

fn info_py_candidates(tree: &Path) -> ForgeResult<Vec<PathBuf>> {
  let base = glob::Pattern::escape(&tree.to_string_lossy());
  let mut found = Vec::new();
  for pattern in ["info.py", "*/info.py", "python/*/info.py"] {
    let mut matches: Vec<PathBuf> = glob::glob(&format!("{}/{}", base, pattern))?
      .filter_map(Result::ok)
      .collect();
    matches.sort();
    found.extend(matches);
  }
  Ok(found)
}

fn candidates(tree: &Path) -> ForgeResult<Vec<VersionFile>> {
  let mut files = Vec::new();
  let pyproject = tree.join("pyproject.toml");
  if pyproject.is_file() {
    files.push(VersionFile {
      path: pyproject,
      format: VersionFormat::Pyproject,
    });
  }
  let cmake = tree.join("project_info.cmake");
  if cmake.is_file() {
    files.push(VersionFile {
      path: cmake,
      format: VersionFormat::ProjectInfoCmake,
    });
  }
  for path in info_py_candidates(tree)? {
    files.push(VersionFile {
      path,
      format: VersionFormat::InfoPy,
    });
  }
  Ok(files)
}

/// First version file present in a component tree
pub fn locate_version_file(tree: &Path) -> ForgeResult<Option<VersionFile>> {
  Ok(candidates(tree)?.into_iter().next())
}

/// Read the version declared by a component tree, if any
///
/// Unreadable or unparsable version files are skipped with a warning.
pub fn read_component_version(tree: &Path) -> ForgeResult<Option<String>> {
  for file in candidates(tree)? {
    let contents = match fs::read_to_string(&file.path) {
      Ok(contents) => contents,
      Err(e) => {
        warn!("cannot read {}: {}", file.path.display(), e);
        continue;
      }
    };
    let version = match file.format {
      VersionFormat::Pyproject => pyproject_version(&contents, &file.path),
      VersionFormat::ProjectInfoCmake => numbered_version(&contents, &cmake_patterns()?),
      VersionFormat::InfoPy => numbered_version(&contents, &info_py_patterns()?),
    };
    if version.is_some() {
      return Ok(version);
    }
  }
  Ok(None)
}

fn pyproject_version(contents: &str, path: &Path) -> Option<String> {
  let doc = match contents.parse::<toml_edit::DocumentMut>() {
    Ok(doc) => doc,
    Err(e) => {
      warn!("ignoring unparsable {}: {}", path.display(), e);
      return None;
    }
  };
  doc
    .get("project")
    .and_then(|p| p.get("version"))
    .and_then(|v| v.as_str())
    .map(str::to_string)
}

/// Join the first capture of each pattern; all must match
fn numbered_version(contents: &str, patterns: &[Regex]) -> Option<String> {
  let mut parts = Vec::new();
  for pattern in patterns {
    let caps = pattern.captures(contents)?;
    parts.push(caps.get(2)?.as_str().to_string());
  }
  Some(parts.join("."))
}

fn pyproject_patterns() -> ForgeResult<Vec<Regex>> {
  Ok(vec![
    Regex::new(r#"(\bversion\s*=\s*")([0-9]+)(\.[0-9]+\.[0-9]+")"#)?,
    Regex::new(r#"(\bversion\s*=\s*"[0-9]+\.)([0-9]+)(\.[0-9]+")"#)?,
    Regex::new(r#"(\bversion\s*=\s*"[0-9]+\.[0-9]+\.)([0-9]+)(")"#)?,
  ])
}

fn cmake_patterns() -> ForgeResult<Vec<Regex>> {
  ["MAJOR", "MINOR", "PATCH"]
    .iter()
    .map(|part| {
      RegexBuilder::new(&format!(
        r"(\bset\s*\(\s*BRAINVISA_PACKAGE_VERSION_{}\s*)([0-9]+)(\s*\))",
        part
      ))
      .case_insensitive(true)
      .build()
      .map_err(ForgeError::from)
    })
    .collect()
}

fn info_py_patterns() -> ForgeResult<Vec<Regex>> {
  ["major", "minor", "micro"]
    .iter()
    .map(|part| Regex::new(&format!(r"(\bversion_{}\s*=\s*)([0-9]+)(\b)", part)).map_err(ForgeError::from))
    .collect()
}

/// Rewrite the version numbers of a version file's contents
pub fn rewrite_version(contents: &str, format: VersionFormat, new_version: &str) -> ForgeResult<String> {
  let patterns = match format {
    VersionFormat::Pyproject => pyproject_patterns()?,
    VersionFormat::ProjectInfoCmake => cmake_patterns()?,
    VersionFormat::InfoPy => info_py_patterns()?,
  };

  let mut result = contents.to_string();
  for (pattern, number) in patterns.iter().zip(new_version.split('.')) {
    let replacement = format!("${{1}}{}${{3}}", number);
    result = pattern.replace_all(&result, replacement.as_str()).into_owned();
  }
  Ok(result)
}
