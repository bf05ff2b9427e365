//! Integration tests driving the forgeplan binary against temporary workspaces

mod helpers;
mod test_apply;
mod test_graph;
mod test_plan;
mod test_version_plan;
