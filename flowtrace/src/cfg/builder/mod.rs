mod visits;

use smallvec::SmallVec;

use crate::error::FlowError;
use crate::tree::{NodeId, NodeKind, SyntaxTree};

use super::types::{BasicBlock, BlockId, ControlFlowGraph, Edge, EdgeId, EdgeKind};

/// Innermost-loop context for `break`/`continue` wiring.
struct LoopFrame {
    header: BlockId,
    exit: BlockId,
}

/// Nearest-enclosing-try context for exceptional edges.
struct TryFrame {
    handlers: SmallVec<[BlockId; 2]>,
    finally: Option<BlockId>,
}

/// Builder for constructing a CFG from the syntax arena.
///
/// The cursor is `None` after an unconditional jump; appending a statement
/// then lazily opens a fresh block, which is how dead code ends up in a
/// disconnected block rather than aborting the build.
pub(super) struct CfgBuilder<'t> {
    tree: &'t SyntaxTree,
    blocks: Vec<BasicBlock>,
    edges: Vec<Edge>,
    current: Option<BlockId>,
    loop_stack: Vec<LoopFrame>,
    try_stack: Vec<TryFrame>,
}

impl<'t> CfgBuilder<'t> {
    pub(super) fn new(tree: &'t SyntaxTree) -> Self {
        let entry = BasicBlock::new(BlockId(0));
        Self {
            tree,
            blocks: vec![entry],
            edges: Vec::new(),
            current: Some(BlockId(0)),
            loop_stack: Vec::new(),
            try_stack: Vec::new(),
        }
    }

    pub(super) fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub(super) fn new_block(&mut self) -> BlockId {
        let id = BlockId(u32::try_from(self.blocks.len()).unwrap_or(u32::MAX));
        self.blocks.push(BasicBlock::new(id));
        id
    }

    /// The block the cursor points at, opening a detached one if the
    /// previous statement terminated control flow.
    pub(super) fn current_block(&mut self) -> BlockId {
        match self.current {
            Some(block) => block,
            None => {
                let block = self.new_block();
                self.current = Some(block);
                block
            }
        }
    }

    pub(super) fn set_current(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    pub(super) fn cursor(&self) -> Option<BlockId> {
        self.current
    }

    /// Closes the current block; the next append opens a detached one.
    pub(super) fn terminate(&mut self) {
        self.current = None;
    }

    pub(super) fn add_edge(&mut self, from: BlockId, to: BlockId, kind: EdgeKind) {
        let duplicate = self
            .edges
            .iter()
            .any(|e| e.from == from && e.to == to && e.kind == kind);
        if duplicate {
            return;
        }
        let eid = EdgeId(u32::try_from(self.edges.len()).unwrap_or(u32::MAX));
        self.edges.push(Edge { from, to, kind });
        self.blocks[from.index()].successors.push(eid);
        self.blocks[to.index()].predecessors.push(eid);
    }

    /// Appends a node to the current block, wiring the conservative
    /// exceptional edges of the nearest enclosing try region.
    pub(super) fn append(&mut self, node: NodeId) -> Result<(), FlowError> {
        if self.tree.kind(node) == NodeKind::Unsupported {
            return Err(self.unsupported(node));
        }
        let block = self.current_block();
        self.blocks[block.index()].statements.push(node);

        if let Some(frame) = self.try_stack.last() {
            let handlers = frame.handlers.clone();
            let finally = frame.finally;
            for handler in handlers {
                self.add_edge(block, handler, EdgeKind::Exceptional);
            }
            if let Some(finally) = finally {
                self.add_edge(block, finally, EdgeKind::Exceptional);
            }
        }
        Ok(())
    }

    pub(super) fn unsupported(&self, node: NodeId) -> FlowError {
        let construct = self
            .tree
            .text(node)
            .map_or_else(|| format!("{:?}", self.tree.kind(node)), str::to_owned);
        FlowError::UnsupportedConstruct {
            construct,
            span: self.tree.span(node),
        }
    }

    pub(super) fn push_loop(&mut self, header: BlockId, exit: BlockId) {
        self.loop_stack.push(LoopFrame { header, exit });
    }

    pub(super) fn pop_loop(&mut self) {
        self.loop_stack.pop();
    }

    pub(super) fn loop_exit(&self) -> Option<BlockId> {
        self.loop_stack.last().map(|frame| frame.exit)
    }

    pub(super) fn loop_header(&self) -> Option<BlockId> {
        self.loop_stack.last().map(|frame| frame.header)
    }

    pub(super) fn push_try(&mut self, handlers: SmallVec<[BlockId; 2]>, finally: Option<BlockId>) {
        self.try_stack.push(TryFrame { handlers, finally });
    }

    pub(super) fn pop_try(&mut self) {
        self.try_stack.pop();
    }

    /// Finalizes the graph: prunes blocks that carry nothing and touch no
    /// edge, renumbers the survivors, and computes the exit set.
    pub(super) fn finish(self) -> ControlFlowGraph {
        let CfgBuilder { blocks, edges, .. } = self;

        let mut keep = vec![false; blocks.len()];
        keep[0] = true;
        for (index, block) in blocks.iter().enumerate() {
            if !block.statements.is_empty() {
                keep[index] = true;
            }
        }
        for edge in &edges {
            keep[edge.from.index()] = true;
            keep[edge.to.index()] = true;
        }

        let mut remap = vec![0u32; blocks.len()];
        let mut next = 0u32;
        for (index, kept) in keep.iter().enumerate() {
            if *kept {
                remap[index] = next;
                next += 1;
            }
        }

        let mut new_blocks: Vec<BasicBlock> = blocks
            .into_iter()
            .enumerate()
            .filter(|(index, _)| keep[*index])
            .map(|(index, block)| BasicBlock {
                id: BlockId(remap[index]),
                statements: block.statements,
                successors: SmallVec::new(),
                predecessors: SmallVec::new(),
            })
            .collect();

        let new_edges: Vec<Edge> = edges
            .iter()
            .map(|edge| Edge {
                from: BlockId(remap[edge.from.index()]),
                to: BlockId(remap[edge.to.index()]),
                kind: edge.kind,
            })
            .collect();

        for (index, edge) in new_edges.iter().enumerate() {
            let eid = EdgeId(u32::try_from(index).unwrap_or(u32::MAX));
            new_blocks[edge.from.index()].successors.push(eid);
            new_blocks[edge.to.index()].predecessors.push(eid);
        }

        let mut graph = ControlFlowGraph {
            blocks: new_blocks,
            edges: new_edges,
            entry: BlockId(0),
            exits: Vec::new(),
        };

        let reachable = graph.reachable_blocks();
        let exits: Vec<BlockId> = graph
            .blocks
            .iter()
            .filter(|block| {
                reachable[block.id.index()]
                    && block
                        .successors
                        .iter()
                        .all(|&eid| graph.edges[eid.index()].kind == EdgeKind::Exceptional)
            })
            .map(|block| block.id)
            .collect();
        graph.exits = if exits.is_empty() {
            vec![graph.entry]
        } else {
            exits
        };
        graph
    }
}
