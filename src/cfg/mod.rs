//! Control flow graph construction and rendering.
//!
//! Lowers the structured AST (sequences, `if`, `while`) into a
//! branch-aware node graph with one entry and a single exit sentinel.
//! Loop back edges are represented by a zero-effect join node at each
//! loop's continuation point.
//!
//! # Modules
//!
//! - [`types`]: node arena, node kinds, identity tokens
//! - [`builder`]: reverse-walk construction
//! - [`render`]: indented pseudo-code dump

pub mod builder;
pub mod render;
pub mod types;

pub use builder::build_cfg;
pub use types::{
    Assignment, AssignmentId, BasicBlock, Cfg, CfgNode, CfgNodeId, CfgNodeKind, IfNode,
    LoopJoinNode, WhileNode,
};
