//! Expression-granularity flow model and the local flow engine.
//!
//! [`DataFlowGraph`] refines a [`crate::cfg::ControlFlowGraph`] to one vertex
//! per expression, ordered by evaluation within each block and stitched
//! across block boundaries along the control edges. Assignments and call
//! arguments additionally get explicit value-transfer edges.
//!
//! [`find_flows`] runs the source→sink reachability query described by a
//! caller-supplied [`FlowSpec`]: sanitizers and barriers prune paths, loops
//! terminate via per-query visited state, and every surviving source is
//! reported with concrete witness paths.

mod engine;
mod nodes;
mod spec;

pub use engine::{
    any_match, find_flows, find_flows_from, none_match, FlowReport, SourceFlows,
    DEFAULT_MAX_PATHS_PER_SOURCE,
};
pub use nodes::{DataFlowGraph, FlowNode, FlowNodeId};
pub use spec::{FlowNodeRef, FlowSpec};

#[cfg(test)]
mod tests;
