//! Flow-analysis primitives for reasoning about value flow through syntax trees.
//!
//! `flowtrace` builds control-flow graphs from structured source, derives an
//! expression-granularity data-flow graph from them, and answers source→sink
//! reachability queries with sanitizer/barrier semantics. A taint recipe layered
//! on top detects untrusted input reaching dangerous Python calls.
//!
//! The analysis pipeline:
//!
//! 1. [`tree`]: lower parsed source into a flat syntax-node arena.
//! 2. [`cfg`]: build a basic-block control-flow graph over the arena.
//! 3. [`flow`]: derive flow nodes and run reachability queries against a
//!    caller-supplied [`flow::FlowSpec`].
//! 4. [`taint`]: the built-in security recipe mapping flow paths to findings.
//!
//! All graphs are built once per analyzed body and are read-only afterwards;
//! independent bodies can be analyzed from parallel workers without locking.

/// Control-flow graph construction and queries.
pub mod cfg;
/// Command line argument definitions.
pub mod cli;
/// Shared entry point used by every binary front end.
pub mod entry_point;
/// Error taxonomy for graph construction.
pub mod error;
/// Flow-node model, specification contract, and the local flow engine.
pub mod flow;
/// Report rendering (tables and JSON).
pub mod output;
/// Taint-analysis recipe built on the flow engine.
pub mod taint;
/// Syntax-node arena and source lowering.
pub mod tree;
/// Small shared helpers (line index, pragma handling).
pub mod utils;

pub use error::FlowError;
