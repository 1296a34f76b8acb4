//! Tests for taint sink detection.
//!
//! Checks that security sinks (eval, exec, SQL execution, etc.) are correctly
//! identified from the lowered syntax arena.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use flowtrace::taint::sinks::{check_sink, has_shell_true};
use flowtrace::taint::types::VulnType;
use flowtrace::tree::python::lower_statements;
use flowtrace::tree::{NodeId, NodeKind, SyntaxTree};

fn parse_call(source: &str) -> (SyntaxTree, NodeId) {
    let parsed = ruff_python_parser::parse_module(source).unwrap();
    let body = lower_statements("<module>", &parsed.into_syntax().body);
    let call = body
        .tree
        .ids()
        .find(|&id| body.tree.kind(id) == NodeKind::Call)
        .expect("expected a call expression");
    (body.tree, call)
}

#[test]
fn test_eval_sink() {
    let (tree, call) = parse_call("eval(x)\n");
    let sink = check_sink(&tree, call);
    assert!(sink.is_some());
    assert!(matches!(sink.unwrap().vuln_type, VulnType::CodeInjection));
}

#[test]
fn test_execute_sink() {
    let (tree, call) = parse_call("cursor.execute(query)\n");
    let sink = check_sink(&tree, call);
    assert!(sink.is_some());
    assert!(matches!(sink.unwrap().vuln_type, VulnType::SqlInjection));
}

#[test]
fn test_subprocess_shell_true() {
    let (tree, call) = parse_call("subprocess.run(cmd, shell=True)\n");
    assert!(has_shell_true(&tree, call));
    let sink = check_sink(&tree, call);
    assert!(sink.is_some());
    assert!(matches!(
        sink.unwrap().vuln_type,
        VulnType::CommandInjection
    ));
}

#[test]
fn test_subprocess_without_shell_is_not_a_sink() {
    let (tree, call) = parse_call("subprocess.run([\"ls\", \"-l\"])\n");
    assert!(!has_shell_true(&tree, call));
    assert!(check_sink(&tree, call).is_none());
}

#[test]
fn test_os_system_sink() {
    let (tree, call) = parse_call("os.system(cmd)\n");
    let sink = check_sink(&tree, call).unwrap();
    assert!(matches!(sink.vuln_type, VulnType::CommandInjection));
    assert_eq!(sink.dangerous_args, vec![0]);
}

#[test]
fn test_pickle_loads_sink() {
    let (tree, call) = parse_call("pickle.loads(blob)\n");
    let sink = check_sink(&tree, call).unwrap();
    assert!(matches!(sink.vuln_type, VulnType::UnsafeDeserialization));
}

#[test]
fn test_plain_call_is_not_a_sink() {
    let (tree, call) = parse_call("print(x)\n");
    assert!(check_sink(&tree, call).is_none());
}
