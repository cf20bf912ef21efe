//! deadwood - dead-store detection for a minimal imperative language.
//!
//! The language has variables, integer constants, six binary operators,
//! assignment, `if`, and `while`. The analysis reports assignments whose
//! written value is never subsequently read.
//!
//! # Architecture
//!
//! The pipeline is four stages, each consuming the previous one:
//!
//! - **Parse** ([`parse`]): source text to an AST with byte spans
//! - **CFG** ([`cfg`]): AST to a control flow graph, an arena of nodes
//!   with loop back edges represented through join markers
//! - **DFG** ([`dfg`]): CFG to explicit successor/predecessor edge sets,
//!   cycles included
//! - **Liveness** ([`dataflow`]): backward work-list analysis computing
//!   live-variable facts and collecting dead stores
//!
//! # Quick start
//!
//! ```
//! use deadwood::analyze_source;
//!
//! let dead = analyze_source("a = 1\na = 2\nb = a\n")?;
//! assert_eq!(dead.len(), 1);
//! assert_eq!(dead[0].variable, 'a');
//! # Ok::<(), deadwood::DeadwoodError>(())
//! ```
//!
//! The stages compose manually when intermediate graphs are needed:
//!
//! ```
//! use deadwood::{analyze_liveness, parse_program, program_live_out};
//! use deadwood::cfg::build_cfg;
//! use deadwood::dfg::build_dfg;
//!
//! let program = parse_program("x = 1\ny = x\n")?;
//! let cfg = build_cfg(&program);
//! let dfg = build_dfg(&cfg)?;
//! let seed = program_live_out(&program)?;
//! let info = analyze_liveness(&cfg, &dfg, &seed)?;
//! assert!(info.dead_stores.is_empty());
//! # Ok::<(), deadwood::DeadwoodError>(())
//! ```

pub mod ast;
pub mod cfg;
pub mod dataflow;
pub mod dfg;
pub mod error;
pub mod parse;

pub use dataflow::{analyze_liveness, program_live_out, DeadStore, LivenessInfo};
pub use error::{DeadwoodError, Result, SyntaxError};
pub use parse::parse_program;

/// Parse `source` and run the full pipeline, returning dead stores
/// ordered by ascending span start.
pub fn analyze_source(source: &str) -> Result<Vec<DeadStore>> {
    let program = parse::parse_program(source)?;
    let cfg = cfg::build_cfg(&program);
    let dfg = dfg::build_dfg(&cfg)?;
    let outputs = dataflow::program_live_out(&program)?;
    let info = dataflow::analyze_liveness(&cfg, &dfg, &outputs)?;
    Ok(info.dead_stores)
}
