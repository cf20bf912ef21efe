//! DFG construction.
//!
//! Three phases over the finished CFG:
//!
//! 1. **Materialization**: one DFG node per reachable CFG node. Each CFG
//!    node is discovered along exactly one edge (`next` for basic blocks
//!    and loop joins, `then_branch` for `if`, `body` for `while`), so the
//!    walk is linear and never revisits.
//! 2. **Forward edges**: explicit successor sets (two for `if`/`while`,
//!    one for everything else; the loop join's single successor is the
//!    loop head it back-references).
//! 3. **Backward edges**: transpose of the forward edges. The traversal
//!    checks, before following an edge, whether the reverse edge is
//!    already recorded; a loop back edge is recognized that way on its
//!    second encounter and not re-traversed.

use tracing::debug;

use crate::cfg::{Cfg, CfgNodeId, CfgNodeKind};
use crate::dfg::types::{Dfg, DfgNodeId};
use crate::error::{DeadwoodError, Result};

/// Derive the data-flow graph for a CFG.
pub fn build_dfg(cfg: &Cfg<'_>) -> Result<Dfg> {
    let mut dfg = Dfg::default();
    materialize(cfg, &mut dfg);
    forward_link(cfg, &mut dfg)?;
    let entry = dfg.node_for_cfg(cfg.entry)?;
    backward_link(&mut dfg, entry, None);
    debug!(nodes = dfg.len(), "built DFG");
    Ok(dfg)
}

fn materialize(cfg: &Cfg<'_>, dfg: &mut Dfg) {
    let mut cursor = Some(cfg.entry);
    while let Some(id) = cursor {
        dfg.push_node(id);
        let node = cfg.node(id);
        cursor = match &node.kind {
            CfgNodeKind::Basic(_) | CfgNodeKind::LoopJoin(_) => node.next,
            CfgNodeKind::If(n) => Some(n.then_branch),
            CfgNodeKind::While(n) => Some(n.body),
            CfgNodeKind::Exit => None,
        };
    }
}

fn forward_link(cfg: &Cfg<'_>, dfg: &mut Dfg) -> Result<()> {
    let mut cursor = Some(cfg.entry);
    while let Some(id) = cursor {
        let node = cfg.node(id);
        let from = dfg.node_for_cfg(id)?;
        cursor = match &node.kind {
            CfgNodeKind::Basic(_) => {
                let next = chain_next(cfg, id)?;
                let to = dfg.node_for_cfg(next)?;
                dfg.add_out_edge(from, to);
                Some(next)
            }
            CfgNodeKind::If(n) => {
                let branch = dfg.node_for_cfg(n.then_branch)?;
                dfg.add_out_edge(from, branch);
                let next = chain_next(cfg, id)?;
                let fallthrough = dfg.node_for_cfg(next)?;
                dfg.add_out_edge(from, fallthrough);
                Some(n.then_branch)
            }
            CfgNodeKind::While(n) => {
                let body = dfg.node_for_cfg(n.body)?;
                dfg.add_out_edge(from, body);
                let next = chain_next(cfg, id)?;
                let fallthrough = dfg.node_for_cfg(next)?;
                dfg.add_out_edge(from, fallthrough);
                Some(n.body)
            }
            CfgNodeKind::LoopJoin(join) => {
                // the join's only successor is the loop head; the
                // post-loop continuation is the head's own `next`
                let header = join.header.ok_or_else(|| {
                    DeadwoodError::internal(
                        "dfg-link",
                        format!("loop join {id} has an unresolved loop header"),
                    )
                })?;
                let head = dfg.node_for_cfg(header)?;
                dfg.add_out_edge(from, head);
                Some(chain_next(cfg, id)?)
            }
            CfgNodeKind::Exit => None,
        };
    }
    Ok(())
}

fn chain_next(cfg: &Cfg<'_>, id: CfgNodeId) -> Result<CfgNodeId> {
    cfg.node(id).next.ok_or_else(|| {
        DeadwoodError::internal(
            "dfg-link",
            format!("{} node {id} has no successor", cfg.node(id).kind.label()),
        )
    })
}

/// Record `prev` as a predecessor of `node`, then follow forward edges
/// depth-first. An edge whose transpose already exists has been traversed
/// before and is skipped, which terminates loop cycles.
fn backward_link(dfg: &mut Dfg, node: DfgNodeId, prev: Option<DfgNodeId>) {
    if let Some(pred) = prev {
        dfg.add_in_edge(node, pred);
    }
    let outs = dfg.node(node).out_nodes.clone();
    for out in outs {
        if dfg.node(out).in_nodes.contains(&node) {
            continue;
        }
        backward_link(dfg, out, Some(node));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;
    use crate::cfg::{build_cfg, CfgNodeKind};
    use crate::parse::parse_program;

    fn parse(source: &str) -> Program {
        parse_program(source).unwrap()
    }

    fn assert_edge_symmetry(dfg: &Dfg) {
        for node in dfg.nodes() {
            for &out in &node.out_nodes {
                assert!(
                    dfg.node(out).in_nodes.contains(&node.id),
                    "missing transpose of {} -> {}",
                    node.id,
                    out
                );
            }
            for &pred in &node.in_nodes {
                assert!(
                    dfg.node(pred).out_nodes.contains(&node.id),
                    "in edge {} -> {} has no forward edge",
                    pred,
                    node.id
                );
            }
        }
    }

    #[test]
    fn one_dfg_node_per_cfg_node() {
        let program = parse("a = 1\nif a > 2\n  b = 2\nend\nwhile a < 9\n  a = a + 1\nend\n");
        let cfg = build_cfg(&program);
        let dfg = build_dfg(&cfg).unwrap();
        assert_eq!(dfg.len(), cfg.node_count());
        for node in cfg.nodes() {
            assert!(dfg.node_for_cfg(node.id).is_ok());
        }
    }

    #[test]
    fn straight_line_edges() {
        let program = parse("a = 1\nb = a\n");
        let cfg = build_cfg(&program);
        let dfg = build_dfg(&cfg).unwrap();

        let block = dfg.node(dfg.node_for_cfg(cfg.entry).unwrap());
        let exit = dfg.node(dfg.node_for_cfg(cfg.exit).unwrap());
        assert_eq!(block.out_nodes, vec![exit.id]);
        assert_eq!(exit.in_nodes, vec![block.id]);
        assert!(exit.out_nodes.is_empty());
        assert_edge_symmetry(&dfg);
    }

    #[test]
    fn if_has_branch_and_fallthrough() {
        let program = parse("a = 1\nif a > 2\n  b = 2\nend\nc = 3\n");
        let cfg = build_cfg(&program);
        let dfg = build_dfg(&cfg).unwrap();

        let if_cfg = cfg
            .nodes()
            .find(|n| matches!(n.kind, CfgNodeKind::If(_)))
            .unwrap();
        let if_dfg = dfg.node(dfg.node_for_cfg(if_cfg.id).unwrap());
        assert_eq!(if_dfg.out_nodes.len(), 2);

        let CfgNodeKind::If(branch) = &if_cfg.kind else {
            unreachable!();
        };
        let branch_dfg = dfg.node_for_cfg(branch.then_branch).unwrap();
        let fallthrough_dfg = dfg.node_for_cfg(if_cfg.next.unwrap()).unwrap();
        assert_eq!(if_dfg.out_nodes, vec![branch_dfg, fallthrough_dfg]);

        // the merge point has two predecessors: the if and the branch tail
        assert_eq!(dfg.node(fallthrough_dfg).in_nodes.len(), 2);
        assert_edge_symmetry(&dfg);
    }

    #[test]
    fn loop_forms_a_cycle_through_the_join() {
        let program = parse("a = 1\nwhile a < 9\n  a = a + 1\nend\nb = a\n");
        let cfg = build_cfg(&program);
        let dfg = build_dfg(&cfg).unwrap();

        let head_cfg = cfg
            .nodes()
            .find(|n| matches!(n.kind, CfgNodeKind::While(_)))
            .unwrap();
        let CfgNodeKind::While(loop_node) = &head_cfg.kind else {
            unreachable!();
        };

        let head = dfg.node(dfg.node_for_cfg(head_cfg.id).unwrap());
        let body = dfg.node_for_cfg(loop_node.body).unwrap();
        let after = dfg.node_for_cfg(head_cfg.next.unwrap()).unwrap();
        assert_eq!(head.out_nodes, vec![body, after]);

        let join_cfg = cfg
            .nodes()
            .find(|n| matches!(n.kind, CfgNodeKind::LoopJoin(_)))
            .unwrap();
        let join = dfg.node(dfg.node_for_cfg(join_cfg.id).unwrap());
        assert_eq!(join.out_nodes, vec![head.id]);
        assert!(head.in_nodes.contains(&join.id));

        assert_edge_symmetry(&dfg);
    }

    #[test]
    fn empty_loop_body_makes_a_two_node_cycle() {
        let program = parse("while a < 9\nend\n");
        let cfg = build_cfg(&program);
        let dfg = build_dfg(&cfg).unwrap();

        let head = dfg.node(dfg.node_for_cfg(cfg.entry).unwrap());
        let join_cfg = cfg
            .nodes()
            .find(|n| matches!(n.kind, CfgNodeKind::LoopJoin(_)))
            .unwrap();
        let join = dfg.node(dfg.node_for_cfg(join_cfg.id).unwrap());

        assert!(head.out_nodes.contains(&join.id));
        assert_eq!(join.out_nodes, vec![head.id]);
        assert_edge_symmetry(&dfg);
    }

    #[test]
    fn nested_structures_stay_symmetric() {
        let program = parse(
            "a = 1\nwhile a < 9\n  if a > 4\n    b = a\n  end\n  while b > 0\n    b = b - 1\n  end\n  a = a + 1\nend\nc = a\n",
        );
        let cfg = build_cfg(&program);
        let dfg = build_dfg(&cfg).unwrap();
        assert_eq!(dfg.len(), cfg.node_count());
        assert_edge_symmetry(&dfg);
    }
}
