use smallvec::SmallVec;

use crate::tree::NodeId;

/// Handle to a basic block within one [`ControlFlowGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl BlockId {
    /// Position of this block in the graph's block list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to an edge within one [`ControlFlowGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Position of this edge in the graph's edge list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Classification of a control-flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Unconditional fall-through.
    Normal,
    /// Taken when the guarding condition evaluates truthy.
    TrueBranch,
    /// Taken when the guarding condition evaluates falsy.
    FalseBranch,
    /// Taken when a statement raises into a handler or finally clause.
    Exceptional,
    /// Loop body tail (or `continue`) jumping back to the loop header.
    LoopBack,
}

/// A directed edge between two basic blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Origin block.
    pub from: BlockId,
    /// Destination block.
    pub to: BlockId,
    /// Edge classification.
    pub kind: EdgeKind,
}

/// A maximal straight-line sequence of syntax nodes.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Unique block id, equal to its position in the graph.
    pub id: BlockId,
    /// Statements (and desugared condition expressions) in program order.
    pub statements: Vec<NodeId>,
    /// Outgoing edges, in creation order.
    pub successors: SmallVec<[EdgeId; 2]>,
    /// Incoming edges, in creation order.
    pub predecessors: SmallVec<[EdgeId; 2]>,
}

impl BasicBlock {
    pub(super) fn new(id: BlockId) -> Self {
        Self {
            id,
            statements: Vec::new(),
            successors: SmallVec::new(),
            predecessors: SmallVec::new(),
        }
    }
}

/// Control-flow graph for a single analyzed body.
///
/// Structurally immutable once built; safe to share read-only across
/// threads, each running its own searches.
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    /// Basic blocks indexed by [`BlockId`].
    pub blocks: Vec<BasicBlock>,
    /// Edges indexed by [`EdgeId`].
    pub edges: Vec<Edge>,
    /// Entry block; never has incoming edges.
    pub entry: BlockId,
    /// Blocks from which execution leaves the body normally.
    pub exits: Vec<BlockId>,
}
