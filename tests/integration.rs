//! End-to-end tests over the full pipeline: parse -> CFG -> DFG ->
//! backward liveness -> dead-store report.

use deadwood::ast::Expr;
use deadwood::cfg::{build_cfg, CfgNodeKind};
use deadwood::dataflow::{analyze_liveness, program_live_out, VarSet};
use deadwood::dfg::build_dfg;
use deadwood::{analyze_source, parse_program, DeadwoodError, SyntaxError};

fn dead_slices<'s>(source: &'s str) -> Vec<&'s str> {
    analyze_source(source)
        .unwrap()
        .iter()
        .map(|dead| dead.span.slice(source))
        .collect()
}

// =============================================================================
// Scenario tests
// =============================================================================

#[test]
fn transitive_reads_keep_everything_alive() {
    assert!(dead_slices("x = 1\ny = x\n").is_empty());
}

#[test]
fn immediate_overwrite_is_reported() {
    assert_eq!(dead_slices("a = 1\na = 2\nb = a\n"), vec!["a = 1"]);
}

#[test]
fn loop_dead_store_reported_once_loop_counter_kept() {
    let source = "a = 1\nb = a\nwhile (b < 5)\n  z = 5\n  b = b + 1\nend\n";
    assert_eq!(dead_slices(source), vec!["z = 5"]);
}

#[test]
fn exclusive_branch_assignments_used_after_merge_are_kept() {
    let source = "a = 1\nif a > 1\n  x = 1\nend\nif a < 1\n  x = 2\nend\ny = x\n";
    assert!(dead_slices(source).is_empty());
}

#[test]
fn reference_program_report() {
    let source = "\na = 1\nb = a\nx = 3\ny = 4\n\nwhile (b < 5)\n  z = x\n  b = b + 1\n  x = 9\n  y = 10\nend\n";
    let dead = analyze_source(source).unwrap();

    let report: Vec<(char, &str)> = dead
        .iter()
        .map(|d| (d.variable, d.span.slice(source)))
        .collect();
    assert_eq!(
        report,
        vec![('y', "y = 4"), ('z', "z = x"), ('y', "y = 10")]
    );

    // spans are ascending, so text reports are deterministic
    let starts: Vec<usize> = dead.iter().map(|d| d.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);
}

#[test]
fn nested_loops_converge() {
    let source = "a = 3\nb = 0\nwhile (a > 0)\n  c = a\n  while (c > 0)\n    c = c - 1\n    b = b + 1\n  end\n  a = a - 1\nend\n";
    assert!(dead_slices(source).is_empty());
}

#[test]
fn dead_store_inside_branch_is_reported() {
    let source = "a = 1\nif a > 0\n  b = 9\n  b = a\nend\nc = b\n";
    assert_eq!(dead_slices(source), vec!["b = 9"]);
}

#[test]
fn syntax_errors_surface_through_the_pipeline() {
    let err = analyze_source("end\n").unwrap_err();
    assert!(matches!(
        err,
        DeadwoodError::Syntax(SyntaxError::UnexpectedEnd { pos: 0 })
    ));
}

#[test]
fn multi_character_names_are_rejected() {
    let err = analyze_source("ab = 1\n").unwrap_err();
    assert!(matches!(err, DeadwoodError::InvalidVariableName { .. }));
}

// =============================================================================
// Structural properties
// =============================================================================

const PROGRAMS: &[&str] = &[
    "",
    "a = 1\n",
    "a = 1\nb = a\nc = b\n",
    "a = 1\nif a > 2\n  b = 2\nend\nc = 3\n",
    "while b < 5\n  b = b + 1\nend\n",
    "a = 1\nwhile a < 9\n  if a > 4\n    b = a\n  end\n  a = a + 1\nend\nc = a\n",
    "while a > 0\n  while b > 0\n    b = b - 1\n  end\n  a = a - 1\nend\n",
];

/// The discovery walk (`next` for blocks and joins, branch for `if`, body
/// for `while`) visits every node exactly once and ends at the exit.
#[test]
fn cfg_chains_are_well_formed() {
    for source in PROGRAMS {
        let program = parse_program(source).unwrap();
        let cfg = build_cfg(&program);

        let mut seen = vec![false; cfg.node_count()];
        let mut cursor = Some(cfg.entry);
        let mut last = cfg.entry;
        while let Some(id) = cursor {
            assert!(!seen[id.0], "{source:?}: node {id} discovered twice");
            seen[id.0] = true;
            last = id;
            cursor = match &cfg.node(id).kind {
                CfgNodeKind::Basic(_) | CfgNodeKind::LoopJoin(_) => cfg.node(id).next,
                CfgNodeKind::If(n) => Some(n.then_branch),
                CfgNodeKind::While(n) => Some(n.body),
                CfgNodeKind::Exit => None,
            };
        }
        assert_eq!(last, cfg.exit, "{source:?}: walk did not end at exit");
        assert!(seen.iter().all(|&s| s), "{source:?}: unreachable nodes");
    }
}

/// `v in out(u)` holds exactly when `u in in(v)`.
#[test]
fn dfg_edges_are_symmetric() {
    for source in PROGRAMS {
        let program = parse_program(source).unwrap();
        let cfg = build_cfg(&program);
        let dfg = build_dfg(&cfg).unwrap();
        for node in dfg.nodes() {
            for &out in &node.out_nodes {
                assert!(
                    dfg.node(out).in_nodes.contains(&node.id),
                    "{source:?}: {} -> {} has no transpose",
                    node.id,
                    out
                );
            }
            for &pred in &node.in_nodes {
                assert!(
                    dfg.node(pred).out_nodes.contains(&node.id),
                    "{source:?}: {} -> {} has no forward edge",
                    pred,
                    node.id
                );
            }
        }
    }
}

fn expr_vars(expr: &Expr) -> VarSet {
    let mut vars = VarSet::default();
    expr.for_each_name(&mut |name| {
        vars.insert(name.text.chars().next().unwrap());
    });
    vars
}

/// Stored facts satisfy the transfer functions: straight-line and branch
/// nodes never carry a live-in variable that is neither read locally nor
/// live-out past the local definitions.
#[test]
fn liveness_is_never_fabricated() {
    for source in PROGRAMS {
        let program = parse_program(source).unwrap();
        let cfg = build_cfg(&program);
        let dfg = build_dfg(&cfg).unwrap();
        let outputs = program_live_out(&program).unwrap();
        let info = analyze_liveness(&cfg, &dfg, &outputs).unwrap();
        for node in dfg.nodes() {
            let facts = &info.facts[&node.id];
            match &cfg.node(node.cfg).kind {
                CfgNodeKind::Basic(block) => {
                    let mut expected = facts.live_out.clone();
                    for &id in block.assignments.iter().rev() {
                        let assignment = cfg.assignment(id);
                        expected.remove(&assignment.name.text.chars().next().unwrap());
                        expected.extend(expr_vars(assignment.expr));
                    }
                    assert_eq!(
                        facts.live_in, expected,
                        "{source:?}: block {} facts diverge from its transfer",
                        node.id
                    );
                }
                CfgNodeKind::If(branch) => {
                    let mut expected = facts.live_out.clone();
                    expected.extend(expr_vars(branch.condition));
                    assert_eq!(facts.live_in, expected);
                }
                // loop heads and joins are seeded by the two-pass
                // sub-analysis; the exit is seeded from the program
                CfgNodeKind::While(_) | CfgNodeKind::LoopJoin(_) | CfgNodeKind::Exit => {}
            }
        }
    }
}

#[test]
fn analysis_is_idempotent_end_to_end() {
    let source = "a = 1\nb = a\nwhile (b < 5)\n  z = 5\n  b = b + 1\nend\n";
    let first = analyze_source(source).unwrap();
    let second = analyze_source(source).unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Reporting
// =============================================================================

#[test]
fn text_report_matches_expected_shape() {
    let source = "a = 1\na = 2\nb = a\n";
    let dead = analyze_source(source).unwrap();
    let report: Vec<String> = dead
        .iter()
        .map(|d| {
            format!(
                "Unused assignment to {} at {}..{}\n{}",
                d.variable,
                d.span.start,
                d.span.end,
                d.span.slice(source)
            )
        })
        .collect();
    assert_eq!(report, vec!["Unused assignment to a at 0..5\na = 1"]);
}

#[test]
fn json_report_round_trips_spans() {
    let source = "a = 1\na = 2\nb = a\n";
    let program = parse_program(source).unwrap();
    let cfg = build_cfg(&program);
    let dfg = build_dfg(&cfg).unwrap();
    let outputs = program_live_out(&program).unwrap();
    let info = analyze_liveness(&cfg, &dfg, &outputs).unwrap();
    let json = info.to_json();
    assert_eq!(json["dead_stores"][0]["span"]["start"], 0);
    assert_eq!(json["dead_stores"][0]["span"]["end"], 5);
    assert_eq!(json["metrics"]["loops_analyzed"], 0);
}
