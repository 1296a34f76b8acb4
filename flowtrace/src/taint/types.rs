use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Informational.
    Low,
    /// Worth reviewing.
    Medium,
    /// Likely exploitable.
    High,
    /// Directly exploitable.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// Vulnerability class a sink can cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VulnType {
    /// `eval`/`exec` style code execution.
    CodeInjection,
    /// Unparameterized SQL execution.
    SqlInjection,
    /// Shell command execution.
    CommandInjection,
    /// File access under attacker-controlled paths.
    PathTraversal,
    /// Server-side request forgery.
    Ssrf,
    /// Deserialization of untrusted bytes.
    UnsafeDeserialization,
}

impl fmt::Display for VulnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VulnType::CodeInjection => "Code Injection",
            VulnType::SqlInjection => "SQL Injection",
            VulnType::CommandInjection => "Command Injection",
            VulnType::PathTraversal => "Path Traversal",
            VulnType::Ssrf => "SSRF",
            VulnType::UnsafeDeserialization => "Unsafe Deserialization",
        };
        f.write_str(label)
    }
}

/// Where a tracked value originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaintSource {
    /// Interactive `input()`.
    Input,
    /// Environment variables.
    Environment,
    /// Process arguments.
    CommandLine,
    /// Data read from a file.
    FileRead,
    /// A formal parameter of the analyzed function.
    FunctionParam(String),
    /// Flask request object access.
    FlaskRequest(String),
    /// Django request object access.
    DjangoRequest(String),
    /// Custom pattern from configuration.
    Custom(String),
}

impl fmt::Display for TaintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaintSource::Input => f.write_str("input()"),
            TaintSource::Environment => f.write_str("environment variable"),
            TaintSource::CommandLine => f.write_str("command line argument"),
            TaintSource::FileRead => f.write_str("file read"),
            TaintSource::FunctionParam(name) => write!(f, "parameter `{name}`"),
            TaintSource::FlaskRequest(attr) => write!(f, "flask request.{attr}"),
            TaintSource::DjangoRequest(attr) => write!(f, "django request.{attr}"),
            TaintSource::Custom(pattern) => write!(f, "custom source `{pattern}`"),
        }
    }
}

/// One reported source→sink flow.
#[derive(Debug, Clone, Serialize)]
pub struct TaintFinding {
    /// Human-readable source description.
    pub source: String,
    /// Line the tracked value originates at (1-indexed).
    pub source_line: usize,
    /// Name of the sink pattern that was reached.
    pub sink: String,
    /// Stable rule identifier.
    pub rule_id: String,
    /// Line of the sink call (1-indexed).
    pub sink_line: usize,
    /// Vulnerability class.
    pub vuln_type: VulnType,
    /// Severity of the finding.
    pub severity: Severity,
    /// File the flow was found in.
    pub file: PathBuf,
    /// Suggested remediation.
    pub remediation: String,
    /// Lines the witness path passes through, deduplicated in order.
    pub flow_path: Vec<usize>,
}
