//! Control-flow graph construction over the syntax-node arena.
//!
//! One [`ControlFlowGraph`] is built per analyzed body by a single
//! depth-first pass that maintains a "current block" cursor. Sequential
//! statements share a block; branching constructs split blocks and connect
//! them with typed edges; loops close their body back to the header with an
//! explicit [`EdgeKind::LoopBack`] edge, so the graph is a general directed
//! graph that may contain cycles.
//!
//! Code following an unconditional `return`/`raise`/`break`/`continue` lands
//! in a block disconnected from the entry. That is a valid, representable
//! condition surfaced through [`ControlFlowGraph::unreachable_blocks`], not
//! an error.

mod builder;
mod graph;
mod types;

pub use types::{BasicBlock, BlockId, ControlFlowGraph, Edge, EdgeId, EdgeKind};

#[cfg(test)]
mod tests;
