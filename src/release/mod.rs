//! Release planning
//!
//! # Core Invariants
//!
//! 1. **Recipes are never mutated while planning**
//!    - Per-package results live in `PlanningAnnotations`
//!    - Generated recipes are new documents written under `plan/recipes`
//!
//! 2. **Change detection reads sources fresh on every run**
//!    - A package is rebuilt when a component revision differs from its last release
//!    - Compiled dependents of a rebuilt compiled package are rebuilt too
//!
//! 3. **The release history is only written by a successful publish**
//!    - Planning computes the next history snapshot and embeds it in the plan

pub mod changes;
pub mod compiler;
pub mod history;
pub mod propagate;
pub mod version;
pub mod version_plan;
