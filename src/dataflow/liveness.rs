//! Backward live-variable analysis and dead-store detection.
//!
//! A variable is live at a program point if its current value may still
//! be read along some execution path. Facts flow backward from the
//! program exit:
//!
//! - `live_out(n)` = union of `live_in(s)` over the successors `s` of `n`
//! - `live_in(n)` = reads(n) UNION (live_out(n) minus defs(n))
//!
//! An assignment whose target is not live immediately after it is a dead
//! store.
//!
//! # Scheduling
//!
//! Nodes are pulled from a work list, preferring a node whose successors
//! all have computed facts. Inside an unresolved loop cycle no such node
//! exists; the scheduler then pops from the end of the list and relies on
//! the loop sub-analysis for the facts that were not yet available.
//!
//! # Loops
//!
//! A loop body's liveness depends on itself: a value read at the top of
//! an iteration may have been written by the previous one. The loop
//! sub-analysis walks the body twice: first seeded with only the
//! post-loop requirements plus the condition's reads, then re-seeded with
//! the body head's own pass-1 requirements, so that intra-loop reuse
//! becomes visible on the second pass. Two passes are exact for chains of simple
//! reassignment; the scheme is a bounded approximation of full fixpoint
//! iteration, not a proven least fixpoint for arbitrarily deep cyclic
//! dependencies.

use fixedbitset::FixedBitSet;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::{debug, trace};

use crate::ast::{Expr, Name, Program, Span};
use crate::cfg::{AssignmentId, BasicBlock, Cfg, CfgNodeId, CfgNodeKind, WhileNode};
use crate::dfg::{Dfg, DfgNodeId};
use crate::error::{DeadwoodError, Result};

/// Set of single-character variable names.
pub type VarSet = FxHashSet<char>;

/// Live-variable facts for one DFG node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFacts {
    /// Variables live on entry to the node.
    pub live_in: VarSet,
    /// Variables live on exit from the node.
    pub live_out: VarSet,
}

/// An assignment whose written value is never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeadStore {
    /// The assigned variable.
    pub variable: char,
    /// Byte range of the whole assignment statement.
    pub span: Span,
    /// Identity of the assignment unit in the CFG.
    pub assignment: AssignmentId,
}

/// Counters describing one analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LivenessMetrics {
    /// Work-list items processed, loop re-analysis included.
    pub nodes_processed: usize,
    /// Loop bodies analyzed (two passes each).
    pub loops_analyzed: usize,
}

/// Result of a liveness run.
#[derive(Debug, Clone)]
pub struct LivenessInfo {
    /// Per-node facts keyed by DFG node.
    pub facts: FxHashMap<DfgNodeId, NodeFacts>,
    /// Dead stores, ordered by ascending span start.
    pub dead_stores: Vec<DeadStore>,
    pub metrics: LivenessMetrics,
}

impl LivenessInfo {
    /// JSON representation of the dead stores and run metrics.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "dead_stores": self.dead_stores,
            "metrics": self.metrics,
        })
    }
}

/// Variables required at program exit: every name occurring anywhere in
/// the program, assignment targets included. Anything the program
/// mentions is treated as externally observable, a conservative
/// over-approximation of real output liveness.
///
/// Rejects names longer than one character with
/// [`DeadwoodError::InvalidVariableName`].
pub fn program_live_out(program: &Program) -> Result<VarSet> {
    let mut vars = VarSet::default();
    let mut invalid = Ok(());
    program.for_each_name(&mut |name| {
        if invalid.is_err() {
            return;
        }
        match var_of(name) {
            Ok(var) => {
                vars.insert(var);
            }
            Err(err) => invalid = Err(err),
        }
    });
    invalid?;
    Ok(vars)
}

/// Run the backward analysis over a built DFG.
///
/// `program_outputs` is the whole-program live-out seed, normally from
/// [`program_live_out`].
pub fn analyze_liveness(cfg: &Cfg<'_>, dfg: &Dfg, program_outputs: &VarSet) -> Result<LivenessInfo> {
    let mut analyzer = Analyzer {
        cfg,
        dfg,
        facts: FxHashMap::default(),
        dead_stores: Vec::new(),
        dead_seen: FxHashSet::default(),
        loop_joins: FxHashMap::default(),
        metrics: LivenessMetrics::default(),
    };
    analyzer.run(program_outputs)?;

    let Analyzer {
        facts,
        mut dead_stores,
        metrics,
        ..
    } = analyzer;
    dead_stores.sort_by_key(|dead| (dead.span.start, dead.span.end));
    debug!(
        dead_stores = dead_stores.len(),
        nodes_processed = metrics.nodes_processed,
        "liveness analysis complete"
    );
    Ok(LivenessInfo {
        facts,
        dead_stores,
        metrics,
    })
}

struct Analyzer<'a, 'p> {
    cfg: &'a Cfg<'p>,
    dfg: &'a Dfg,
    facts: FxHashMap<DfgNodeId, NodeFacts>,
    dead_stores: Vec<DeadStore>,
    dead_seen: FxHashSet<AssignmentId>,
    /// Loop head CFG node -> the DFG node of its loop join.
    loop_joins: FxHashMap<CfgNodeId, DfgNodeId>,
    metrics: LivenessMetrics,
}

impl Analyzer<'_, '_> {
    fn run(&mut self, program_outputs: &VarSet) -> Result<()> {
        self.index_loop_joins()?;

        let exit = self.dfg.node_for_cfg(self.cfg.exit)?;
        self.facts.insert(
            exit,
            NodeFacts {
                live_in: program_outputs.clone(),
                live_out: VarSet::default(),
            },
        );

        let work_list = self.dfg.node(exit).in_nodes.clone();
        let mut visited = FixedBitSet::with_capacity(self.dfg.len());
        self.drain(work_list, &mut visited)
    }

    /// Map each loop head to its join node, failing on an unresolved
    /// back-reference.
    fn index_loop_joins(&mut self) -> Result<()> {
        for node in self.dfg.nodes() {
            if let CfgNodeKind::LoopJoin(join) = &self.cfg.node(node.cfg).kind {
                let header = join.header.ok_or_else(|| {
                    DeadwoodError::internal(
                        "liveness",
                        format!("loop join {} has an unresolved loop header", node.cfg),
                    )
                })?;
                self.loop_joins.insert(header, node.id);
            }
        }
        Ok(())
    }

    /// Process work-list items until none remain.
    fn drain(&mut self, mut work_list: Vec<DfgNodeId>, visited: &mut FixedBitSet) -> Result<()> {
        while let Some(id) = self.next_ready(&mut work_list) {
            if visited.contains(id.0) {
                continue;
            }
            visited.insert(id.0);
            self.metrics.nodes_processed += 1;

            let node = self.dfg.node(id);
            let mut live_out = VarSet::default();
            for succ in &node.out_nodes {
                if let Some(facts) = self.facts.get(succ) {
                    live_out.extend(facts.live_in.iter().copied());
                }
            }

            match &self.cfg.node(node.cfg).kind {
                CfgNodeKind::Basic(block) => {
                    let live_in = self.scan_block(block, live_out.clone())?;
                    trace!(node = id.0, "basic block facts computed");
                    self.facts.insert(id, NodeFacts { live_in, live_out });
                    self.push_predecessors(id, &mut work_list, None);
                }
                CfgNodeKind::If(branch) => {
                    let mut live_in = live_out.clone();
                    expr_reads(branch.condition, &mut live_in)?;
                    self.facts.insert(id, NodeFacts { live_in, live_out });
                    self.push_predecessors(id, &mut work_list, None);
                }
                CfgNodeKind::While(head) => {
                    let join = *self.loop_joins.get(&node.cfg).ok_or_else(|| {
                        DeadwoodError::internal(
                            "liveness",
                            format!("no loop join recorded for loop head {}", node.cfg),
                        )
                    })?;
                    let live_in = self.analyze_loop(head, join, &live_out, visited)?;
                    self.facts.insert(id, NodeFacts { live_in, live_out });
                    // the back edge through the join is resolved by the
                    // loop sub-analysis, not the outer walk
                    self.push_predecessors(id, &mut work_list, Some(join));
                }
                CfgNodeKind::LoopJoin(_) | CfgNodeKind::Exit => {
                    self.facts.insert(
                        id,
                        NodeFacts {
                            live_in: live_out.clone(),
                            live_out,
                        },
                    );
                    self.push_predecessors(id, &mut work_list, None);
                }
            }
        }
        Ok(())
    }

    /// Pick the next work-list node: the first whose successors all have
    /// computed facts, falling back to the end of the list when a cycle
    /// leaves none ready.
    fn next_ready(&self, work_list: &mut Vec<DfgNodeId>) -> Option<DfgNodeId> {
        if work_list.is_empty() {
            return None;
        }
        let ready = work_list.iter().position(|&id| {
            self.dfg
                .node(id)
                .out_nodes
                .iter()
                .all(|succ| self.facts.contains_key(succ))
        });
        match ready {
            Some(index) => Some(work_list.remove(index)),
            None => work_list.pop(),
        }
    }

    /// Reverse-scan a basic block: a required target is consumed by its
    /// assignment, an unrequired one is a dead store, and the right-hand
    /// side's reads become required.
    fn scan_block(&mut self, block: &BasicBlock, mut required: VarSet) -> Result<VarSet> {
        for &id in block.assignments.iter().rev() {
            let assignment = self.cfg.assignment(id);
            let target = var_of(&assignment.name)?;
            let span = assignment.span;
            let rhs = assignment.expr;
            if !required.remove(&target) {
                self.record_dead_store(id, target, span);
            }
            expr_reads(rhs, &mut required)?;
        }
        Ok(required)
    }

    fn record_dead_store(&mut self, id: AssignmentId, variable: char, span: Span) {
        if self.dead_seen.insert(id) {
            debug!(%variable, start = span.start, end = span.end, "dead store");
            self.dead_stores.push(DeadStore {
                variable,
                span,
                assignment: id,
            });
        }
    }

    fn push_predecessors(
        &self,
        id: DfgNodeId,
        work_list: &mut Vec<DfgNodeId>,
        skip: Option<DfgNodeId>,
    ) {
        for &pred in &self.dfg.node(id).in_nodes {
            if Some(pred) == skip {
                continue;
            }
            work_list.push(pred);
        }
    }

    /// Two-pass analysis of one loop.
    ///
    /// Pass 1 seeds the loop's join with the loop head's live-out (the
    /// post-loop required set) plus the condition's reads and walks the
    /// body backward from its tail. Pass 2 re-seeds the join with the
    /// body head's pass-1 requirements (what the next iteration will
    /// read) and walks again. The returned live-in set is the pass-2
    /// body-head set plus the condition's reads, valid both on first
    /// entry and on re-entry after an iteration.
    fn analyze_loop(
        &mut self,
        head: &WhileNode<'_>,
        join: DfgNodeId,
        live_out: &VarSet,
        visited: &FixedBitSet,
    ) -> Result<VarSet> {
        self.metrics.loops_analyzed += 1;

        let mut condition_reads = VarSet::default();
        expr_reads(head.condition, &mut condition_reads)?;

        let body = self.dfg.node_for_cfg(head.body)?;
        let tail_work_list = self.dfg.node(join).in_nodes.clone();

        let mut seed = live_out.clone();
        seed.extend(condition_reads.iter().copied());
        self.facts.insert(
            join,
            NodeFacts {
                live_in: seed,
                live_out: live_out.clone(),
            },
        );
        let mut pass_visited = visited.clone();
        self.drain(tail_work_list.clone(), &mut pass_visited)?;

        let mut reseed = self.body_live_in(body)?;
        reseed.extend(condition_reads.iter().copied());
        self.facts.insert(
            join,
            NodeFacts {
                live_in: reseed,
                live_out: live_out.clone(),
            },
        );
        let mut pass_visited = visited.clone();
        self.drain(tail_work_list, &mut pass_visited)?;

        let mut live_in = self.body_live_in(body)?;
        live_in.extend(condition_reads.iter().copied());
        Ok(live_in)
    }

    fn body_live_in(&self, body: DfgNodeId) -> Result<VarSet> {
        self.facts
            .get(&body)
            .map(|facts| facts.live_in.clone())
            .ok_or_else(|| {
                DeadwoodError::internal(
                    "liveness",
                    format!("loop body head {body} has no computed facts"),
                )
            })
    }
}

/// Convert a name to its single-character variable.
fn var_of(name: &Name) -> Result<char> {
    let mut chars = name.text.chars();
    match (chars.next(), chars.next()) {
        (Some(var), None) => Ok(var),
        _ => Err(DeadwoodError::InvalidVariableName {
            name: name.text.clone(),
            span: name.span,
        }),
    }
}

/// Collect the variables read by an expression.
fn expr_reads(expr: &Expr, out: &mut VarSet) -> Result<()> {
    let mut invalid = Ok(());
    expr.for_each_name(&mut |name| {
        if invalid.is_err() {
            return;
        }
        match var_of(name) {
            Ok(var) => {
                out.insert(var);
            }
            Err(err) => invalid = Err(err),
        }
    });
    invalid
}
