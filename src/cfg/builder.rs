//! CFG construction.
//!
//! Statements are walked in reverse source order, prepending nodes onto a
//! running entry pointer, so `next` links always point at already-built
//! structure. The result is a chain from `entry` to the single `Exit`
//! node; `if` branches and `while` bodies are sub-chains that rejoin the
//! main chain through shared `next` ids, never through node duplication.

use tracing::debug;

use crate::ast::{AssignmentStmt, Program, Stmt, StmtList};
use crate::cfg::types::{
    Assignment, AssignmentId, BasicBlock, Cfg, CfgNode, CfgNodeId, CfgNodeKind, IfNode,
    LoopJoinNode, WhileNode,
};

/// Lower a program to its control flow graph.
///
/// This stage performs no validation; a malformed AST is a contract
/// violation by the parser.
pub fn build_cfg(program: &Program) -> Cfg<'_> {
    let mut builder = CfgBuilder::new();
    let exit = builder.exit;
    let entry = builder.lower_stmt_list(&program.statements, exit, true);
    debug!(
        nodes = builder.nodes.len(),
        assignments = builder.assignments.len(),
        "built CFG"
    );
    Cfg::new(builder.nodes, builder.assignments, entry, exit)
}

struct CfgBuilder<'p> {
    nodes: Vec<CfgNode<'p>>,
    assignments: Vec<Assignment<'p>>,
    exit: CfgNodeId,
}

impl<'p> CfgBuilder<'p> {
    fn new() -> Self {
        let exit = CfgNodeId(0);
        Self {
            nodes: vec![CfgNode {
                id: exit,
                kind: CfgNodeKind::Exit,
                next: None,
            }],
            assignments: Vec::new(),
            exit,
        }
    }

    fn push_node(&mut self, kind: CfgNodeKind<'p>, next: Option<CfgNodeId>) -> CfgNodeId {
        let id = CfgNodeId(self.nodes.len());
        self.nodes.push(CfgNode { id, kind, next });
        id
    }

    fn push_assignment(&mut self, stmt: &'p AssignmentStmt) -> AssignmentId {
        let id = AssignmentId(self.assignments.len());
        self.assignments.push(Assignment {
            name: stmt.lhs.clone(),
            expr: &*stmt.rhs,
            span: stmt.span,
        });
        id
    }

    /// Lower a statement list onto `entry`, returning the new entry.
    ///
    /// `allow_direct` controls whether the first assignment encountered
    /// may be folded into an entry node that is already a basic block.
    /// `if` bodies are lowered with it disabled so they never merge into a
    /// block that lives outside the branch.
    fn lower_stmt_list(
        &mut self,
        list: &'p StmtList,
        mut entry: CfgNodeId,
        mut allow_direct: bool,
    ) -> CfgNodeId {
        for stmt in list.statements.iter().rev() {
            match stmt {
                Stmt::Assignment(a) => {
                    let assignment = self.push_assignment(a);
                    entry = self.prepend_assignment(assignment, entry, &mut allow_direct);
                }
                Stmt::If(s) => {
                    let then_branch = self.lower_stmt_list(&s.then_block, entry, false);
                    entry = self.push_node(
                        CfgNodeKind::If(IfNode {
                            condition: &*s.condition,
                            then_branch,
                        }),
                        Some(entry),
                    );
                }
                Stmt::While(s) => {
                    let after = entry;
                    let join =
                        self.push_node(CfgNodeKind::LoopJoin(LoopJoinNode { header: None }), Some(after));
                    let body = self.lower_stmt_list(&s.body, join, true);
                    let head = self.push_node(
                        CfgNodeKind::While(WhileNode {
                            condition: &*s.condition,
                            body,
                        }),
                        Some(after),
                    );
                    match &mut self.nodes[join.0].kind {
                        CfgNodeKind::LoopJoin(j) => j.header = Some(head),
                        _ => unreachable!("join id always addresses a loop join"),
                    }
                    entry = head;
                }
            }
        }
        entry
    }

    /// Prepend one assignment, growing the entry block at the front when
    /// direct linking permits it and starting a fresh block otherwise.
    fn prepend_assignment(
        &mut self,
        assignment: AssignmentId,
        entry: CfgNodeId,
        allow_direct: &mut bool,
    ) -> CfgNodeId {
        if *allow_direct {
            if let CfgNodeKind::Basic(block) = &mut self.nodes[entry.0].kind {
                block.assignments.insert(0, assignment);
                return entry;
            }
        }
        *allow_direct = true;
        self.push_node(
            CfgNodeKind::Basic(BasicBlock {
                assignments: vec![assignment],
            }),
            Some(entry),
        )
    }
}
