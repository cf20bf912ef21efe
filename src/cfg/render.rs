//! ASCII rendering of the CFG as indented pseudo-code.
//!
//! Not part of the analysis contract; used by tests and the CLI to make
//! graph shapes visible. Output is deterministic.

use std::fmt::Write;

use crate::cfg::types::{Cfg, CfgNodeId, CfgNodeKind};

/// Render the whole graph, entry to exit.
pub fn to_ascii(cfg: &Cfg<'_>) -> String {
    let mut out = String::new();
    render_chain(cfg, &mut out, cfg.entry, 0, None);
    out
}

/// One-line summary of a node, used by the DFG dump.
pub fn node_summary(cfg: &Cfg<'_>, id: CfgNodeId) -> String {
    match &cfg.node(id).kind {
        CfgNodeKind::Basic(block) => format!("basic_block ({} assignments)", block.assignments.len()),
        CfgNodeKind::If(n) => format!("if {}", n.condition),
        CfgNodeKind::While(n) => format!("while {}", n.condition),
        CfgNodeKind::LoopJoin(_) => "loop_join".to_string(),
        CfgNodeKind::Exit => "exit".to_string(),
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Render a chain of nodes until `stop_at` (the convergence point of an
/// enclosing `if`) or a node that ends its chain.
fn render_chain(
    cfg: &Cfg<'_>,
    out: &mut String,
    id: CfgNodeId,
    depth: usize,
    stop_at: Option<CfgNodeId>,
) {
    if Some(id) == stop_at {
        return;
    }
    let node = cfg.node(id);
    match &node.kind {
        CfgNodeKind::Basic(block) => {
            indent(out, depth);
            out.push_str("basic_block\n");
            for &assignment in &block.assignments {
                let a = cfg.assignment(assignment);
                indent(out, depth + 1);
                let _ = writeln!(out, "{} = {}", a.name.text, a.expr);
            }
            if let Some(next) = node.next {
                render_chain(cfg, out, next, depth, stop_at);
            }
        }
        CfgNodeKind::If(n) => {
            indent(out, depth);
            let _ = writeln!(out, "if {}", n.condition);
            render_chain(cfg, out, n.then_branch, depth + 1, node.next);
            indent(out, depth);
            out.push_str("end\n");
            if let Some(next) = node.next {
                render_chain(cfg, out, next, depth, stop_at);
            }
        }
        CfgNodeKind::While(n) => {
            indent(out, depth);
            let _ = writeln!(out, "while {}", n.condition);
            // the body chain ends at the loop join, which never follows
            // its own next pointer
            render_chain(cfg, out, n.body, depth + 1, stop_at);
            indent(out, depth);
            out.push_str("end\n");
            if let Some(next) = node.next {
                render_chain(cfg, out, next, depth, stop_at);
            }
        }
        CfgNodeKind::LoopJoin(_) => {
            indent(out, depth);
            out.push_str("loop_join\n");
        }
        CfgNodeKind::Exit => {
            indent(out, depth);
            out.push_str("exit\n");
        }
    }
}
