//! Data flow analyses over the DFG.
//!
//! One backward analysis lives here: live variables with dead-store
//! collection, plus the whole-program seed it starts from.

pub mod liveness;

pub use liveness::{
    analyze_liveness, program_live_out, DeadStore, LivenessInfo, LivenessMetrics, NodeFacts,
    VarSet,
};
