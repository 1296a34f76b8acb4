//! Flat syntax-node arena consumed by the flow analyses.
//!
//! The arena is the seam between language front ends and the analysis core:
//! a lowering adapter (see [`python`]) classifies every node of the parsed
//! source into a closed [`NodeKind`] once, and everything downstream (CFG
//! construction, flow nodes, specifications) navigates the tree purely
//! through [`SyntaxTree::children`], [`SyntaxTree::parent`], and
//! [`SyntaxTree::kind`]. Nodes are addressed by [`NodeId`] handles, so cyclic
//! analysis structures built on top never hold owning references into the
//! tree.
//!
//! # Child-order conventions
//!
//! Children are stored in evaluation order, which is what the flow model
//! replays:
//!
//! - `Assign` / `AugAssign`: `[value, target...]` (value first).
//! - `If`: `[test, then-Block, else-Block?]`.
//! - `While`: `[test, body-Block, OrElse?]`.
//! - `For`: `[target, iter, body-Block, OrElse?]`.
//! - `Try`: `[body-Block, Handler*, OrElse?, Finally?]`;
//!   `Handler`: `[type-expr?, body-Block]`.
//! - `Switch`: `[subject, Case*]`; `Case`: `[guard-expr?, body-Block]`.
//! - `Call`: `[callee, positional-args..., Keyword*]`.
//! - `With`: `[context-exprs..., body-Block]`.

pub mod python;


use compact_str::CompactString;
use ruff_text_size::TextRange;

/// Handle to a node in a [`SyntaxTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of this node in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Syntactic role of a node, resolved once when the tree is lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Function or method definition (the analyzed body root).
    Function,
    /// Formal parameter of the analyzed function.
    Parameter,
    /// Ordered statement sequence.
    Block,
    /// Expression evaluated for effect.
    ExprStmt,
    /// Assignment; value child first, then targets.
    Assign,
    /// Augmented assignment (`+=` and friends).
    AugAssign,
    /// Return from the analyzed body.
    Return,
    /// Raise/throw.
    Throw,
    /// Break out of the innermost loop.
    Break,
    /// Continue the innermost loop.
    Continue,
    /// No-op statement.
    Pass,
    /// Conditional statement.
    If,
    /// Condition-guarded loop.
    While,
    /// Iterator-driven loop.
    For,
    /// Multi-way dispatch (`match` and switch-like forms).
    Switch,
    /// One arm of a [`NodeKind::Switch`].
    Case,
    /// Exception-guarded region.
    Try,
    /// Catch clause of a [`NodeKind::Try`].
    Handler,
    /// `else:` clause of a loop or try.
    OrElse,
    /// `finally:` clause of a try.
    Finally,
    /// Context-manager statement.
    With,
    /// Identifier read or write.
    Name,
    /// Literal constant.
    Literal,
    /// Call expression; callee child first.
    Call,
    /// Attribute access; the `text` holds the attribute name.
    Attribute,
    /// Subscript/index access.
    Subscript,
    /// Keyword argument wrapper inside a call; `text` holds the keyword.
    Keyword,
    /// Short-circuit conjunction (n-ary).
    BoolAnd,
    /// Short-circuit disjunction (n-ary).
    BoolOr,
    /// Logical negation.
    Not,
    /// Binary operator expression.
    Binary,
    /// Comparison chain.
    Compare,
    /// Conditional (ternary) expression: `[test, then, else]`.
    Conditional,
    /// Tuple/list/set/dict/f-string-like aggregate of sub-expressions.
    Collection,
    /// Uninterpreted expression or statement; children still flow-ordered.
    Opaque,
    /// A form the CFG builder must refuse.
    Unsupported,
}

impl NodeKind {
    /// Whether nodes of this kind participate in the flow-node model.
    #[must_use]
    pub const fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::Name
                | NodeKind::Literal
                | NodeKind::Call
                | NodeKind::Attribute
                | NodeKind::Subscript
                | NodeKind::Keyword
                | NodeKind::BoolAnd
                | NodeKind::BoolOr
                | NodeKind::Not
                | NodeKind::Binary
                | NodeKind::Compare
                | NodeKind::Conditional
                | NodeKind::Collection
                | NodeKind::Opaque
        )
    }
}

/// One node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    span: TextRange,
    text: Option<CompactString>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Immutable arena of syntax nodes for one analyzed body.
#[derive(Debug, Default, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
}

impl SyntaxTree {
    /// Syntactic classification of `id`.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    /// Children of `id` in evaluation order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Parent of `id`, if it has been attached to one.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Byte range of `id` in the original source.
    #[must_use]
    pub fn span(&self, id: NodeId) -> TextRange {
        self.nodes[id.index()].span
    }

    /// Identifier, attribute, keyword, or literal text carried by `id`.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.index()].text.as_deref()
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all node ids in arena order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    /// Dotted name of a name/attribute chain, e.g. `os.environ` or
    /// `request.args`. Returns `None` when the base is not a plain name
    /// chain (a call result, a subscript, ...).
    #[must_use]
    pub fn dotted_name(&self, id: NodeId) -> Option<CompactString> {
        match self.kind(id) {
            NodeKind::Name => self.text(id).map(CompactString::from),
            NodeKind::Attribute => {
                let base = *self.children(id).first()?;
                let mut name = self.dotted_name(base)?;
                name.push('.');
                name.push_str(self.text(id)?);
                Some(name)
            }
            _ => None,
        }
    }

    /// Dotted name of a call's target, when `id` is a call.
    #[must_use]
    pub fn call_name(&self, id: NodeId) -> Option<CompactString> {
        if self.kind(id) != NodeKind::Call {
            return None;
        }
        self.dotted_name(*self.children(id).first()?)
    }
}

/// Incremental arena constructor used by lowering adapters and tests.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    /// Adds a childless node.
    pub fn leaf(&mut self, kind: NodeKind) -> NodeId {
        self.push(Node {
            kind,
            span: TextRange::default(),
            text: None,
            children: Vec::new(),
            parent: None,
        })
    }

    /// Adds a childless node carrying identifier/literal text.
    pub fn text_leaf(&mut self, kind: NodeKind, text: impl Into<CompactString>) -> NodeId {
        let id = self.leaf(kind);
        self.nodes[id.index()].text = Some(text.into());
        id
    }

    /// Adds an interior node and re-parents `children` under it.
    pub fn node(&mut self, kind: NodeKind, children: &[NodeId]) -> NodeId {
        let id = self.push(Node {
            kind,
            span: TextRange::default(),
            text: None,
            children: children.to_vec(),
            parent: None,
        });
        for &child in children {
            self.nodes[child.index()].parent = Some(id);
        }
        id
    }

    /// Adds an interior node with text (attribute name, keyword name).
    pub fn text_node(
        &mut self,
        kind: NodeKind,
        text: impl Into<CompactString>,
        children: &[NodeId],
    ) -> NodeId {
        let id = self.node(kind, children);
        self.nodes[id.index()].text = Some(text.into());
        id
    }

    /// Records the source byte range of an existing node.
    pub fn set_span(&mut self, id: NodeId, span: TextRange) {
        self.nodes[id.index()].span = span;
    }

    /// Finalizes the arena.
    #[must_use]
    pub fn finish(self) -> SyntaxTree {
        SyntaxTree { nodes: self.nodes }
    }
}
