//! CFG type definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{Expr, Name, Span};

/// Unique identifier for a CFG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CfgNodeId(pub usize);

impl fmt::Display for CfgNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Unique identifier for an assignment unit inside the CFG.
///
/// Assignments are independently addressable units of work: the analyzer
/// deduplicates dead-store records by this id, never by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub usize);

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// A single `name = expr` unit of work.
#[derive(Debug, Clone)]
pub struct Assignment<'p> {
    pub name: Name,
    pub expr: &'p Expr,
    pub span: Span,
}

/// Maximal straight-line run of assignments, in execution order.
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    pub assignments: Vec<AssignmentId>,
}

/// Conditional branch. Control re-converges through the `next` pointer the
/// node shares with its branch tail; no merge node is materialized.
#[derive(Debug, Clone)]
pub struct IfNode<'p> {
    pub condition: &'p Expr,
    pub then_branch: CfgNodeId,
}

/// Loop head. `body` is a sub-chain whose tail is the loop's join node;
/// `next` is the post-loop continuation.
#[derive(Debug, Clone)]
pub struct WhileNode<'p> {
    pub condition: &'p Expr,
    pub body: CfgNodeId,
}

/// Zero-effect marker at a loop's continuation point.
///
/// Sits where "fall through to the next iteration test" and "fall through
/// past the loop" meet; its only control-flow successor is the loop head.
/// `header` is back-patched once the head node exists; `None` after
/// construction completes is an internal-consistency violation.
#[derive(Debug, Clone)]
pub struct LoopJoinNode {
    pub header: Option<CfgNodeId>,
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum CfgNodeKind<'p> {
    Basic(BasicBlock),
    If(IfNode<'p>),
    While(WhileNode<'p>),
    LoopJoin(LoopJoinNode),
    Exit,
}

impl CfgNodeKind<'_> {
    /// Short label for rendering and error context.
    pub fn label(&self) -> &'static str {
        match self {
            CfgNodeKind::Basic(_) => "basic_block",
            CfgNodeKind::If(_) => "if",
            CfgNodeKind::While(_) => "while",
            CfgNodeKind::LoopJoin(_) => "loop_join",
            CfgNodeKind::Exit => "exit",
        }
    }
}

/// A node in the control flow graph.
#[derive(Debug, Clone)]
pub struct CfgNode<'p> {
    pub id: CfgNodeId,
    pub kind: CfgNodeKind<'p>,
    /// The node executed next along the non-branching path. `None` only
    /// for `Exit`.
    pub next: Option<CfgNodeId>,
}

/// Control flow graph: an arena of nodes with one entry and one exit.
///
/// Nodes reference each other by id. Branch targets and the loop join's
/// back-reference are plain ids resolved against the arena, so the cyclic
/// loop structure involves no ownership cycles.
#[derive(Debug, Clone)]
pub struct Cfg<'p> {
    nodes: Vec<CfgNode<'p>>,
    assignments: Vec<Assignment<'p>>,
    /// First node executed.
    pub entry: CfgNodeId,
    /// The single exit sentinel.
    pub exit: CfgNodeId,
}

impl<'p> Cfg<'p> {
    pub(crate) fn new(
        nodes: Vec<CfgNode<'p>>,
        assignments: Vec<Assignment<'p>>,
        entry: CfgNodeId,
        exit: CfgNodeId,
    ) -> Self {
        Self {
            nodes,
            assignments,
            entry,
            exit,
        }
    }

    #[inline]
    pub fn node(&self, id: CfgNodeId) -> &CfgNode<'p> {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn assignment(&self, id: AssignmentId) -> &Assignment<'p> {
        &self.assignments[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CfgNode<'p>> {
        self.nodes.iter()
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment<'p>> {
        self.assignments.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}
