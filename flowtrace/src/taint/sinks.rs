//! Builtin dangerous-sink tables, keyed by dotted names over the arena.

use crate::tree::{NodeId, NodeKind, SyntaxTree};

use super::types::{Severity, VulnType};

/// Sink patterns handled by the builtin tables.
pub const SINK_PATTERNS: &[&str] = &[
    "eval",
    "exec",
    "compile",
    "os.system",
    "os.popen",
    "subprocess.run",
    "subprocess.call",
    "subprocess.check_output",
    "subprocess.Popen",
    "cursor.execute",
    "cursor.executemany",
    "connection.execute",
    "db.execute",
    "open",
    "os.remove",
    "shutil.rmtree",
    "pickle.loads",
    "marshal.loads",
    "yaml.load",
    "requests.get",
    "requests.post",
    "urllib.request.urlopen",
];

/// Information about a detected sink.
#[derive(Debug, Clone)]
pub struct SinkInfo {
    /// Name of the sink function/pattern.
    pub name: String,
    /// Rule ID.
    pub rule_id: String,
    /// Type of vulnerability this sink can cause.
    pub vuln_type: VulnType,
    /// Severity level.
    pub severity: Severity,
    /// Which positional argument positions are dangerous (0-indexed).
    /// Empty means every argument is.
    pub dangerous_args: Vec<usize>,
    /// Which keyword arguments are dangerous.
    pub dangerous_keywords: Vec<String>,
    /// Suggested remediation.
    pub remediation: String,
}

impl SinkInfo {
    fn new(
        name: &str,
        rule_id: &str,
        vuln_type: VulnType,
        severity: Severity,
        dangerous_args: Vec<usize>,
        remediation: &str,
    ) -> Self {
        Self {
            name: name.to_owned(),
            rule_id: rule_id.to_owned(),
            vuln_type,
            severity,
            dangerous_args,
            dangerous_keywords: Vec::new(),
            remediation: remediation.to_owned(),
        }
    }
}

/// Checks if a call node is a dangerous sink.
#[must_use]
pub fn check_sink(tree: &SyntaxTree, call: NodeId) -> Option<SinkInfo> {
    let name = tree.call_name(call)?;

    check_code_injection(&name)
        .or_else(|| check_sql_injection(&name))
        .or_else(|| check_command_injection(&name, tree, call))
        .or_else(|| check_path_traversal(&name))
        .or_else(|| check_deserialization(&name))
        .or_else(|| check_network(&name))
}

fn check_code_injection(name: &str) -> Option<SinkInfo> {
    match name {
        "eval" | "exec" | "compile" => Some(SinkInfo::new(
            name,
            "FT-CODE-001",
            VulnType::CodeInjection,
            Severity::Critical,
            vec![0],
            "Never pass untrusted data to dynamic code execution.",
        )),
        _ => None,
    }
}

fn check_sql_injection(name: &str) -> Option<SinkInfo> {
    let is_execute = name.ends_with(".execute") || name.ends_with(".executemany");
    if is_execute || name == "sqlite3.complete_statement" {
        return Some(SinkInfo::new(
            name,
            "FT-SQL-001",
            VulnType::SqlInjection,
            Severity::High,
            vec![0],
            "Use parameterized queries instead of string-built SQL.",
        ));
    }
    None
}

fn check_command_injection(name: &str, tree: &SyntaxTree, call: NodeId) -> Option<SinkInfo> {
    match name {
        "os.system" | "os.popen" => Some(SinkInfo::new(
            name,
            "FT-CMD-001",
            VulnType::CommandInjection,
            Severity::Critical,
            vec![0],
            "Use subprocess with an argument list and shell=False.",
        )),
        "subprocess.run" | "subprocess.call" | "subprocess.check_output" | "subprocess.Popen" => {
            // Only a shell invocation interprets the command string.
            if has_shell_true(tree, call) {
                Some(SinkInfo::new(
                    name,
                    "FT-CMD-002",
                    VulnType::CommandInjection,
                    Severity::Critical,
                    vec![0],
                    "Drop shell=True and pass the command as a list.",
                ))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn check_path_traversal(name: &str) -> Option<SinkInfo> {
    match name {
        "open" | "os.remove" | "os.unlink" | "shutil.rmtree" => Some(SinkInfo::new(
            name,
            "FT-PATH-001",
            VulnType::PathTraversal,
            Severity::High,
            vec![0],
            "Resolve and validate paths against an allowed base directory.",
        )),
        _ => None,
    }
}

fn check_deserialization(name: &str) -> Option<SinkInfo> {
    match name {
        "pickle.loads" | "pickle.load" | "marshal.loads" | "yaml.load" => Some(SinkInfo::new(
            name,
            "FT-DESER-001",
            VulnType::UnsafeDeserialization,
            Severity::High,
            vec![0],
            "Deserialize only trusted data, or use a safe loader.",
        )),
        _ => None,
    }
}

fn check_network(name: &str) -> Option<SinkInfo> {
    match name {
        "requests.get" | "requests.post" | "urllib.request.urlopen" => Some(SinkInfo::new(
            name,
            "FT-SSRF-001",
            VulnType::Ssrf,
            Severity::Medium,
            vec![0],
            "Validate or allowlist outbound request targets.",
        )),
        _ => None,
    }
}

/// Checks if a subprocess-style call carries `shell=True`.
#[must_use]
pub fn has_shell_true(tree: &SyntaxTree, call: NodeId) -> bool {
    tree.children(call).iter().any(|&child| {
        tree.kind(child) == NodeKind::Keyword
            && tree.text(child) == Some("shell")
            && tree
                .children(child)
                .first()
                .is_some_and(|&value| tree.text(value) == Some("True"))
    })
}
