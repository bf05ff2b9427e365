//! Recipe graph, package selection and Graphviz rendering
//!
//! Built on petgraph for direct control and minimal abstraction.

pub mod dot;
pub mod recipe_graph;
pub mod selection;

