//! Build pipeline status verification
//!
//! The build pipeline records one entry per step in a JSON status document:
//!
//! ```json
//! { "brainvisa-cmake": {
//!     "configure": { "status": "succeeded", "start": ..., "stop": ... },
//!     "build":     { ... },
//!     "doc":       { ... } } }
//! ```
//!
//! Packaging is only allowed when the three steps succeeded and ran in order.

use crate::core::context::ForgeContext;
use crate::core::error::{ForgeError, ForgeResult, ResultExt, ValidationError};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const STEPS: [&str; 3] = ["configure", "build", "doc"];
const SUCCEEDED: &str = "succeeded";

#[derive(Debug, Deserialize)]
struct StepInfo {
  #[serde(default)]
  status: Option<String>,
  #[serde(default)]
  start: Option<Value>,
  #[serde(default)]
  stop: Option<Value>,
}

fn invalid(reason: impl Into<String>) -> ForgeError {
  ForgeError::Validation(ValidationError::BuildStatus { reason: reason.into() })
}

/// Seconds since the epoch, from a number or a date-time string
fn timestamp(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => {
      let s = s.trim();
      if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_micros() as f64 / 1e6);
      }
      ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y/%m/%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|dt| dt.and_utc().timestamp_micros() as f64 / 1e6)
    }
    _ => None,
  }
}

fn step_time(step: &str, field: &str, value: Option<&Value>) -> ForgeResult<f64> {
  value
    .and_then(timestamp)
    .ok_or_else(|| invalid(format!("{} step has no valid {} time", step, field)))
}

/// Check a status document's contents
pub fn check_status_document(contents: &str, section: &str, source: &Path) -> ForgeResult<()> {
  let document: BTreeMap<String, Value> = serde_json::from_str(contents)
    .map_err(|e| invalid(format!("cannot parse {}: {}", source.display(), e)))?;

  let steps: BTreeMap<String, StepInfo> = match document.get(section) {
    Some(value) => serde_json::from_value(value.clone())
      .map_err(|e| invalid(format!("malformed section '{}' in {}: {}", section, source.display(), e)))?,
    None => BTreeMap::new(),
  };

  let mut previous: Option<(&str, &StepInfo)> = None;
  for step in STEPS {
    let info = steps
      .get(step)
      .ok_or_else(|| invalid(format!("no {} step information in {}", step, source.display())))?;

    let status = info.status.as_deref().unwrap_or("unknown");
    if status != SUCCEEDED {
      return Err(invalid(format!("{} step not successful: {}", step, status)));
    }

    if let Some((previous_step, previous_info)) = previous {
      let start = step_time(step, "start", info.start.as_ref())?;
      let stop = step_time(previous_step, "stop", previous_info.stop.as_ref())?;
      if start <= stop {
        return Err(invalid(format!(
          "{} step started before the end of {}",
          step, previous_step
        )));
      }
    }
    previous = Some((step, info));
  }

  Ok(())
}

/// Verify the workspace's build status document
pub fn check_build_status(ctx: &ForgeContext) -> ForgeResult<()> {
  let path = ctx.status_file();
  let contents =
    fs::read_to_string(&path).with_context(|| format!("Failed to read build status {}", path.display()))?;
  check_status_document(&contents, &ctx.config.build.status_section, &path)
}
