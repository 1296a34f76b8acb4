use super::*;
use crate::cfg::ControlFlowGraph;
use crate::tree::python::lower_module;
use crate::tree::{NodeKind, SyntaxTree};

fn analyze(source: &str, name: &str) -> (SyntaxTree, DataFlowGraph) {
    let parsed = ruff_python_parser::parse_module(source).expect("source should parse");
    let bodies = lower_module(&parsed.into_syntax().body);
    let body = bodies
        .into_iter()
        .find(|b| b.name == name)
        .expect("requested body");
    let cfg = ControlFlowGraph::build(&body.tree, body.root).expect("cfg should build");
    cfg.validate().expect("built graph should be well-formed");
    let graph = DataFlowGraph::from_cfg(&body.tree, &cfg);
    (body.tree, graph)
}

/// Policy used by most tests: values originate at calls to `source`, the
/// property under test is any argument of a call to `sink`, calls to
/// `sanitizer` neutralize, and (optionally) assignment targets overwritten
/// from a literal sever tracking.
struct CallSpec {
    source: &'static str,
    sink: &'static str,
    sanitizer: Option<&'static str>,
    literal_overwrite_barrier: bool,
}

impl CallSpec {
    fn plain(source: &'static str, sink: &'static str) -> Self {
        Self {
            source,
            sink,
            sanitizer: None,
            literal_overwrite_barrier: false,
        }
    }
}

impl FlowSpec for CallSpec {
    fn is_source(&self, node: FlowNodeRef<'_>) -> bool {
        node.call_name().as_deref() == Some(self.source)
    }

    fn is_sink(&self, node: FlowNodeRef<'_>) -> bool {
        let Some(parent) = node.parent() else {
            return false;
        };
        let tree = node.tree();
        tree.kind(parent) == NodeKind::Call
            && tree.call_name(parent).as_deref() == Some(self.sink)
            && tree.children(parent).first() != Some(&node.syntax())
    }

    fn is_sanitizer(&self, node: FlowNodeRef<'_>) -> bool {
        self.sanitizer
            .is_some_and(|name| node.call_name().as_deref() == Some(name))
    }

    fn is_barrier(&self, node: FlowNodeRef<'_>) -> bool {
        if !self.literal_overwrite_barrier || node.kind() != NodeKind::Name {
            return false;
        }
        let Some(parent) = node.parent() else {
            return false;
        };
        let tree = node.tree();
        if tree.kind(parent) != NodeKind::Assign {
            return false;
        }
        let children = tree.children(parent);
        children.first().is_some_and(|&value| {
            tree.kind(value) == NodeKind::Literal && children[1..].contains(&node.syntax())
        })
    }
}

#[test]
fn both_branches_report_distinct_paths() {
    let (tree, graph) = analyze(
        "def f(cond):\n    data = src()\n    if cond:\n        x = data\n    else:\n        x = data\n    sink(x)\n",
        "f",
    );
    let report = find_flows(&tree, &graph, &CallSpec::plain("src", "sink"));

    assert_eq!(report.flows.len(), 1);
    let flows = &report.flows[0];
    assert_eq!(flows.paths.len(), 2, "one witness path per branch");
    assert!(!flows.truncated);
    for path in &flows.paths {
        assert_eq!(path.first(), Some(&flows.source));
        let sink = path.last().copied().expect("non-empty path");
        assert_eq!(tree.text(graph.node(sink).syntax), Some("x"));
    }
    assert_ne!(flows.paths[0], flows.paths[1]);
}

#[test]
fn literal_overwrite_cuts_one_branch() {
    let source = "def f(cond):\n    data = src()\n    if cond:\n        x = \"safe\"\n    else:\n        x = data\n    sink(x)\n";
    let (tree, graph) = analyze(source, "f");

    let mut spec = CallSpec::plain("src", "sink");
    spec.literal_overwrite_barrier = true;
    let cut = find_flows(&tree, &graph, &spec);
    assert_eq!(cut.flows.len(), 1);
    assert_eq!(cut.flows[0].paths.len(), 1, "only the forwarding branch");

    // Removing the barrier restores the second branch.
    let open = find_flows(&tree, &graph, &CallSpec::plain("src", "sink"));
    assert_eq!(open.flows[0].paths.len(), 2);
}

#[test]
fn sanitizer_call_blocks_the_chain() {
    let source = "def f():\n    data = src()\n    clean = scrub(data)\n    sink(clean)\n";
    let (tree, graph) = analyze(source, "f");

    let mut spec = CallSpec::plain("src", "sink");
    spec.sanitizer = Some("scrub");
    assert!(find_flows(&tree, &graph, &spec).is_empty());
    assert!(none_match(&tree, &graph, &spec));

    // The same graph flows freely without the sanitizer.
    assert!(any_match(&tree, &graph, &CallSpec::plain("src", "sink")));
}

#[test]
fn loop_body_sanitizing_every_iteration_guards_later_sink() {
    let source = "def f(cond):\n    while cond:\n        data = src()\n        data = scrub(data)\n    sink(data)\n";
    let (tree, graph) = analyze(source, "f");

    let mut spec = CallSpec::plain("src", "sink");
    spec.sanitizer = Some("scrub");
    assert!(find_flows(&tree, &graph, &spec).is_empty());
}

/// Policy where the same call satisfies sink and (optionally) sanitizer.
struct PrecedenceSpec {
    sanitize: bool,
}

impl FlowSpec for PrecedenceSpec {
    fn is_source(&self, node: FlowNodeRef<'_>) -> bool {
        node.call_name().as_deref() == Some("src")
    }

    fn is_sink(&self, node: FlowNodeRef<'_>) -> bool {
        node.call_name().as_deref() == Some("scrub")
    }

    fn is_sanitizer(&self, node: FlowNodeRef<'_>) -> bool {
        self.sanitize && node.call_name().as_deref() == Some("scrub")
    }
}

#[test]
fn sanitizer_takes_precedence_over_sink_on_the_same_node() {
    let source = "def f():\n    data = src()\n    scrub(data)\n";
    let (tree, graph) = analyze(source, "f");

    let reachable = find_flows(&tree, &graph, &PrecedenceSpec { sanitize: false });
    assert_eq!(reachable.flows.len(), 1);

    let blocked = find_flows(&tree, &graph, &PrecedenceSpec { sanitize: true });
    assert!(blocked.is_empty());
}

#[test]
fn no_source_means_empty_report() {
    let (tree, graph) = analyze("def f():\n    x = other()\n    sink(x)\n", "f");
    let report = find_flows(&tree, &graph, &CallSpec::plain("src", "sink"));
    assert!(report.is_empty());
    assert!(report.participants().is_empty());
}

/// A vertex can be source and sink at once.
struct SelfSpec;

impl FlowSpec for SelfSpec {
    fn is_source(&self, node: FlowNodeRef<'_>) -> bool {
        node.call_name().as_deref() == Some("srcsink")
    }

    fn is_sink(&self, node: FlowNodeRef<'_>) -> bool {
        node.call_name().as_deref() == Some("srcsink")
    }
}

#[test]
fn source_matching_sink_yields_zero_length_path() {
    let (tree, graph) = analyze("def f():\n    srcsink()\n", "f");
    let report = find_flows(&tree, &graph, &SelfSpec);
    assert_eq!(report.flows.len(), 1);
    assert_eq!(report.flows[0].paths.len(), 1);
    assert_eq!(report.flows[0].paths[0].len(), 1);
}

#[test]
fn loops_terminate_and_results_are_deterministic() {
    let source = "def f(cond):\n    data = src()\n    while cond:\n        data = step(data)\n    sink(data)\n";
    let (tree, graph) = analyze(source, "f");
    let spec = CallSpec::plain("src", "sink");

    let first = find_flows(&tree, &graph, &spec);
    let second = find_flows(&tree, &graph, &spec);

    assert!(!first.is_empty(), "loop must not hide the flow");
    assert_eq!(first.flows.len(), second.flows.len());
    for (a, b) in first.flows.iter().zip(second.flows.iter()) {
        assert_eq!(a.source, b.source);
        assert_eq!(a.paths, b.paths);
    }
}

#[test]
fn per_source_query_agrees_with_full_query() {
    let source = "def f():\n    data = src()\n    sink(data)\n";
    let (tree, graph) = analyze(source, "f");
    let spec = CallSpec::plain("src", "sink");

    let report = find_flows(&tree, &graph, &spec);
    assert_eq!(report.flows.len(), 1);
    let source_id = report.flows[0].source;

    let single = find_flows_from(&tree, &graph, source_id, &spec).expect("flow from source");
    assert_eq!(single.paths, report.flows[0].paths);

    // A non-source vertex yields nothing.
    let other = graph
        .ids()
        .find(|&id| id != source_id)
        .expect("graph has several vertices");
    assert!(find_flows_from(&tree, &graph, other, &spec).is_none());
}

#[test]
fn value_transfer_edges_connect_assignment_value_to_target() {
    let (tree, graph) = analyze("def f():\n    x = src()\n", "f");
    let call = graph
        .ids()
        .find(|&id| tree.kind(graph.node(id).syntax) == NodeKind::Call)
        .expect("call vertex");
    let target = graph
        .ids()
        .find(|&id| tree.text(graph.node(id).syntax) == Some("x"))
        .expect("target vertex");
    assert!(graph.successors(call).contains(&target));
    assert!(graph.predecessors(target).contains(&call));
}
