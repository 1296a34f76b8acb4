use super::*;
use crate::error::FlowError;
use crate::tree::python::lower_module;
use crate::tree::{NodeKind, TreeBuilder};

fn build(source: &str, name: &str) -> ControlFlowGraph {
    let parsed = ruff_python_parser::parse_module(source).expect("source should parse");
    let bodies = lower_module(&parsed.into_syntax().body);
    let body = bodies
        .into_iter()
        .find(|b| b.name == name)
        .expect("requested body");
    let cfg = ControlFlowGraph::build(&body.tree, body.root).expect("cfg should build");
    cfg.validate().expect("built graph should be well-formed");
    cfg
}

fn count_kind(cfg: &ControlFlowGraph, kind: EdgeKind) -> usize {
    cfg.edges.iter().filter(|e| e.kind == kind).count()
}

#[test]
fn straight_line_body_is_one_block_with_no_edges() {
    let cfg = build("def f():\n    x = 1\n    y = 2\n    z = x\n", "f");
    assert_eq!(cfg.blocks.len(), 1);
    assert_eq!(cfg.edges.len(), 0);
    assert_eq!(cfg.exits, vec![cfg.entry]);
}

#[test]
fn if_else_is_four_blocks_and_four_edges() {
    let cfg = build(
        "def f(c):\n    if c:\n        x = 1\n    else:\n        x = 2\n    return x\n",
        "f",
    );
    assert_eq!(cfg.blocks.len(), 4, "header, then, else, join");
    assert_eq!(cfg.edges.len(), 4);
    assert_eq!(count_kind(&cfg, EdgeKind::TrueBranch), 1);
    assert_eq!(count_kind(&cfg, EdgeKind::FalseBranch), 1);
    assert_eq!(count_kind(&cfg, EdgeKind::Normal), 2);
    assert_eq!(cfg.exits.len(), 1);
}

#[test]
fn entry_block_has_no_incoming_edges() {
    let cfg = build(
        "def f(c):\n    while c:\n        c = step(c)\n    done()\n",
        "f",
    );
    assert!(cfg.blocks[cfg.entry.index()].predecessors.is_empty());
}

#[test]
fn while_loop_emits_a_loop_back_edge() {
    let cfg = build(
        "def f(c):\n    while c:\n        c = step(c)\n    done()\n",
        "f",
    );
    assert_eq!(count_kind(&cfg, EdgeKind::LoopBack), 1);
    assert_eq!(count_kind(&cfg, EdgeKind::TrueBranch), 1);
    assert_eq!(count_kind(&cfg, EdgeKind::FalseBranch), 1);

    // The back edge targets the loop header, which carries the condition.
    let back = cfg
        .edges
        .iter()
        .find(|e| e.kind == EdgeKind::LoopBack)
        .expect("loop back edge");
    let header = &cfg.blocks[back.to.index()];
    assert!(!header.statements.is_empty());
}

#[test]
fn continue_jumps_back_and_break_jumps_out() {
    let cfg = build(
        "def f(c):\n    while c:\n        if c:\n            continue\n        break\n    done()\n",
        "f",
    );
    // One back edge from the loop tail region via `continue`.
    assert!(count_kind(&cfg, EdgeKind::LoopBack) >= 1);
    // `break` leaves through a normal edge to the loop exit.
    assert!(count_kind(&cfg, EdgeKind::Normal) >= 1);
}

#[test]
fn code_after_return_is_disconnected_not_an_error() {
    let cfg = build("def f():\n    return 1\n    x = 2\n", "f");
    let unreachable = cfg.unreachable_blocks();
    assert_eq!(unreachable.len(), 1);

    let dead = &cfg.blocks[unreachable[0].index()];
    assert!(!dead.statements.is_empty());
    assert!(dead.predecessors.is_empty());
}

#[test]
fn try_statements_get_exceptional_edges_into_the_handler() {
    let cfg = build(
        "def f():\n    try:\n        risky()\n        more()\n    except ValueError:\n        handle()\n    done()\n",
        "f",
    );
    assert!(count_kind(&cfg, EdgeKind::Exceptional) >= 1);

    // Every exceptional edge lands on the handler entry block.
    for edge in cfg.edges.iter().filter(|e| e.kind == EdgeKind::Exceptional) {
        let handler = &cfg.blocks[edge.to.index()];
        assert!(!handler.statements.is_empty());
    }
}

#[test]
fn finally_is_wired_from_normal_and_exceptional_paths() {
    let cfg = build(
        "def f():\n    try:\n        risky()\n    finally:\n        cleanup()\n    done()\n",
        "f",
    );
    // The try body reaches the finally clause both ways.
    let normal = count_kind(&cfg, EdgeKind::Normal);
    let exceptional = count_kind(&cfg, EdgeKind::Exceptional);
    assert!(normal >= 1);
    assert!(exceptional >= 1);

    let normal_targets: Vec<BlockId> = cfg
        .edges
        .iter()
        .filter(|e| e.kind == EdgeKind::Normal)
        .map(|e| e.to)
        .collect();
    let exceptional_targets: Vec<BlockId> = cfg
        .edges
        .iter()
        .filter(|e| e.kind == EdgeKind::Exceptional)
        .map(|e| e.to)
        .collect();
    assert!(exceptional_targets.iter().any(|t| normal_targets.contains(t)));
}

#[test]
fn short_circuit_condition_splits_into_guarded_blocks() {
    let cfg = build("def f(a, b):\n    if a and b:\n        use(a)\n    done()\n", "f");
    // `b` only evaluates along the edge where `a` was truthy.
    assert_eq!(count_kind(&cfg, EdgeKind::TrueBranch), 2);
    assert_eq!(count_kind(&cfg, EdgeKind::FalseBranch), 2);
}

#[test]
fn conditional_expression_statement_branches() {
    let cfg = build("def f(c):\n    first() if c else second()\n", "f");
    assert_eq!(cfg.blocks.len(), 4);
    assert_eq!(count_kind(&cfg, EdgeKind::TrueBranch), 1);
    assert_eq!(count_kind(&cfg, EdgeKind::FalseBranch), 1);
}

#[test]
fn match_arms_chain_through_guarded_dispatch() {
    let cfg = build(
        "def f(x):\n    match x:\n        case 1:\n            a()\n        case _:\n            b()\n    done()\n",
        "f",
    );
    assert_eq!(count_kind(&cfg, EdgeKind::TrueBranch), 2);
    assert_eq!(count_kind(&cfg, EdgeKind::FalseBranch), 2);
}

#[test]
fn unsupported_construct_is_reported_not_built() {
    let mut builder = TreeBuilder::new();
    let ok = builder.leaf(NodeKind::Pass);
    let bad = builder.text_leaf(NodeKind::Unsupported, "vendor escape");
    let block = builder.node(NodeKind::Block, &[ok, bad]);
    let tree = builder.finish();

    let err = ControlFlowGraph::build(&tree, block).expect_err("must refuse");
    match err {
        FlowError::UnsupportedConstruct { construct, .. } => {
            assert_eq!(construct, "vendor escape");
        }
        FlowError::MalformedGraph(_) => panic!("wrong error variant"),
    }
}

#[test]
fn loop_else_clause_hangs_off_the_false_edge() {
    let cfg = build(
        "def f(c):\n    while c:\n        step()\n    else:\n        fallback()\n    done()\n",
        "f",
    );
    let false_edge = cfg
        .edges
        .iter()
        .find(|e| e.kind == EdgeKind::FalseBranch)
        .expect("loop exit condition");
    let orelse = &cfg.blocks[false_edge.to.index()];
    assert!(!orelse.statements.is_empty(), "else clause block");
}
