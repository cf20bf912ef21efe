//! ASCII dump of the DFG.
//!
//! One entry per node: the CFG payload summary plus the in/out neighbor
//! lists. Deterministic; nodes print in materialization order.

use std::fmt::Write;

use crate::cfg::{render::node_summary, Cfg};
use crate::dfg::types::{Dfg, DfgNodeId};

pub fn to_ascii(cfg: &Cfg<'_>, dfg: &Dfg) -> String {
    let mut out = String::new();
    for node in dfg.nodes() {
        let _ = writeln!(out, "node {}: {}", node.id.0, node_summary(cfg, node.cfg));
        let _ = writeln!(out, "    in:  [{}]", id_list(&node.in_nodes));
        let _ = writeln!(out, "    out: [{}]", id_list(&node.out_nodes));
    }
    out
}

fn id_list(ids: &[DfgNodeId]) -> String {
    ids.iter()
        .map(|id| id.0.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::build_cfg;
    use crate::dfg::build_dfg;
    use crate::parse::parse_program;

    #[test]
    fn renders_every_node_with_edges() {
        let program = parse_program("a = 1\nwhile a < 9\n  a = a + 1\nend\n").unwrap();
        let cfg = build_cfg(&program);
        let dfg = build_dfg(&cfg).unwrap();
        let rendered = to_ascii(&cfg, &dfg);

        assert_eq!(rendered.matches("node ").count(), dfg.len());
        assert!(rendered.contains("while a < 9"));
        assert!(rendered.contains("loop_join"));
        assert!(rendered.contains("exit"));
    }
}
