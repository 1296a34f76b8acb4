use compact_str::CompactString;
use ruff_text_size::TextRange;

use crate::tree::{NodeId, NodeKind, SyntaxTree};

use super::nodes::{DataFlowGraph, FlowNodeId};

/// Read-only view of one flow vertex handed to specification predicates.
///
/// Bundles the vertex id with its arena and graph so predicates can inspect
/// the wrapped syntax (kind, text, parent chain) without owning anything.
#[derive(Debug, Clone, Copy)]
pub struct FlowNodeRef<'a> {
    tree: &'a SyntaxTree,
    graph: &'a DataFlowGraph,
    id: FlowNodeId,
}

impl<'a> FlowNodeRef<'a> {
    /// Creates a view over `id`.
    #[must_use]
    pub fn new(tree: &'a SyntaxTree, graph: &'a DataFlowGraph, id: FlowNodeId) -> Self {
        Self { tree, graph, id }
    }

    /// The vertex id.
    #[must_use]
    pub fn id(&self) -> FlowNodeId {
        self.id
    }

    /// The wrapped syntax node.
    #[must_use]
    pub fn syntax(&self) -> NodeId {
        self.graph.node(self.id).syntax
    }

    /// Syntactic classification of the wrapped node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.tree.kind(self.syntax())
    }

    /// Identifier/attribute/keyword text of the wrapped node.
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        self.tree.text(self.syntax())
    }

    /// Byte range of the wrapped node in the original source.
    #[must_use]
    pub fn span(&self) -> TextRange {
        self.tree.span(self.syntax())
    }

    /// Parent syntax node of the wrapped node.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.tree.parent(self.syntax())
    }

    /// Dotted name of the wrapped node when it is a plain name chain.
    #[must_use]
    pub fn dotted_name(&self) -> Option<CompactString> {
        self.tree.dotted_name(self.syntax())
    }

    /// Dotted callee name when the wrapped node is a call.
    #[must_use]
    pub fn call_name(&self) -> Option<CompactString> {
        self.tree.call_name(self.syntax())
    }

    /// The backing arena.
    #[must_use]
    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    /// The backing flow graph.
    #[must_use]
    pub fn graph(&self) -> &'a DataFlowGraph {
        self.graph
    }
}

/// Caller-defined flow policy consumed by the engine.
///
/// Implementations must be pure functions of the node: the engine may
/// evaluate them in any order and assumes repeated calls agree. The engine
/// never mutates the specification, so one instance can serve concurrent
/// searches over different bodies.
///
/// The sanitizer and barrier predicates default to `false`, so a bare
/// source/sink specification degrades to plain reachability.
pub trait FlowSpec {
    /// Whether a tracked value originates at this node.
    fn is_source(&self, node: FlowNodeRef<'_>) -> bool;

    /// Whether reaching this node is the property under test.
    fn is_sink(&self, node: FlowNodeRef<'_>) -> bool;

    /// Whether this node neutralizes the tracked value. Takes precedence
    /// over `is_sink` on the same node.
    fn is_sanitizer(&self, node: FlowNodeRef<'_>) -> bool {
        let _ = node;
        false
    }

    /// Whether tracking stops here regardless of value semantics, e.g. a
    /// variable overwritten from untainted data.
    fn is_barrier(&self, node: FlowNodeRef<'_>) -> bool {
        let _ = node;
        false
    }
}
