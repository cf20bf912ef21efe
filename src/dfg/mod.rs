//! Data flow graph over CFG nodes.
//!
//! The DFG makes control-flow successors and predecessors explicit as
//! edge sets so a backward analysis can walk the graph, loop cycles
//! included, without re-deriving structure from the CFG's chain shape.
//!
//! # Modules
//!
//! - [`types`]: node arena, identity tokens, CFG lookup
//! - [`builder`]: materialization, forward edges, cycle-guarded transpose
//! - [`render`]: per-node edge dump

pub mod builder;
pub mod render;
pub mod types;

pub use builder::build_dfg;
pub use types::{Dfg, DfgNode, DfgNodeId};
