//! DFG type definitions.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfg::CfgNodeId;
use crate::error::{DeadwoodError, Result};

/// Unique identifier for a DFG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DfgNodeId(pub usize);

impl fmt::Display for DfgNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// One DFG node per reachable CFG node.
///
/// `in_nodes` and `out_nodes` are identity sets kept in insertion order:
/// adding a neighbor that is already present is a no-op. Edges carry no
/// ownership; they are ids resolved against the arena.
#[derive(Debug, Clone)]
pub struct DfgNode {
    pub id: DfgNodeId,
    /// The CFG node this DFG node wraps.
    pub cfg: CfgNodeId,
    /// Predecessors: the transpose of `out_nodes`.
    pub in_nodes: Vec<DfgNodeId>,
    /// Control-flow successors.
    pub out_nodes: Vec<DfgNodeId>,
}

/// Data-flow graph over CFG nodes.
#[derive(Debug, Clone, Default)]
pub struct Dfg {
    nodes: Vec<DfgNode>,
    by_cfg: FxHashMap<CfgNodeId, DfgNodeId>,
}

impl Dfg {
    pub(crate) fn push_node(&mut self, cfg: CfgNodeId) -> DfgNodeId {
        let id = DfgNodeId(self.nodes.len());
        self.nodes.push(DfgNode {
            id,
            cfg,
            in_nodes: Vec::new(),
            out_nodes: Vec::new(),
        });
        self.by_cfg.insert(cfg, id);
        id
    }

    pub(crate) fn add_out_edge(&mut self, from: DfgNodeId, to: DfgNodeId) {
        let outs = &mut self.nodes[from.0].out_nodes;
        if !outs.contains(&to) {
            outs.push(to);
        }
    }

    pub(crate) fn add_in_edge(&mut self, node: DfgNodeId, pred: DfgNodeId) {
        let ins = &mut self.nodes[node.0].in_nodes;
        if !ins.contains(&pred) {
            ins.push(pred);
        }
    }

    #[inline]
    pub fn node(&self, id: DfgNodeId) -> &DfgNode {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DfgNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve the DFG node wrapping a CFG node.
    ///
    /// Every reachable CFG node has exactly one DFG counterpart; a missing
    /// entry means a builder invariant was violated.
    pub fn node_for_cfg(&self, cfg: CfgNodeId) -> Result<DfgNodeId> {
        self.by_cfg.get(&cfg).copied().ok_or_else(|| {
            DeadwoodError::internal("dfg-lookup", format!("no DFG node for CFG node {cfg}"))
        })
    }
}
