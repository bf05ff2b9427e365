//! CLI commands for forgeplan
//!
//! ## Planning
//! - **plan**: Compute a packaging plan for changed packages
//! - **version-plan**: Plan version bumps of modified packages
//! - **show-plan**: Print the current plan and its progress
//!
//! ## Execution
//! - **apply-plan**: Run pending plan actions, resumably
//!
//! ## Inspection
//! - **graph**: Graphviz rendering of the recipe graph
//!
//! All commands accept `&ForgeContext` built once in `main`.

pub mod apply;
pub mod graph;
pub mod plan;

pub use apply::run_apply_plan;
pub use graph::run_graph;
pub use plan::{PlanArgs, run_plan, run_show_plan, run_version_plan};
