//! Abstract syntax tree for the analyzed language.
//!
//! Produced by [`crate::parse`] and consumed read-only by the CFG builder
//! and the liveness seed. Nodes own their children; the graph stages
//! borrow expressions out of the tree rather than copying them.

pub mod types;

pub use types::{
    AssignmentStmt, BinaryExpr, BinaryOp, Constant, Expr, IfStmt, Name, ParenExpr, Program, Span,
    Stmt, StmtList, WhileStmt,
};
