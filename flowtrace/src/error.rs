use ruff_text_size::TextRange;
use thiserror::Error;

/// Errors surfaced by graph construction.
///
/// `UnsupportedConstruct` is a per-body condition the caller is expected to
/// handle (skip the body, or fall back to a coarser approximation).
/// `MalformedGraph` indicates a builder bug and is only produced by
/// [`crate::cfg::ControlFlowGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// The builder met a syntactic form it cannot classify into blocks/edges.
    #[error("unsupported construct `{construct}` at byte range {span:?}")]
    UnsupportedConstruct {
        /// Human-readable description of the offending form.
        construct: String,
        /// Byte range of the offending node in the original source.
        span: TextRange,
    },

    /// An internal graph invariant does not hold.
    #[error("malformed control-flow graph: {0}")]
    MalformedGraph(String),
}
