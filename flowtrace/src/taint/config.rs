//! Taint recipe configuration, including TOML-supplied custom patterns.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use super::types::{Severity, VulnType};

/// Configuration for the taint recipe.
#[derive(Debug, Clone)]
pub struct TaintConfig {
    /// Treat every function parameter as a taint source (conservative).
    pub taint_parameters: bool,
    /// Custom source patterns from config.
    pub custom_sources: Vec<CustomSourceConfig>,
    /// Custom sink patterns from config.
    pub custom_sinks: Vec<CustomSinkConfig>,
}

impl Default for TaintConfig {
    fn default() -> Self {
        Self {
            taint_parameters: true,
            custom_sources: Vec::new(),
            custom_sinks: Vec::new(),
        }
    }
}

/// Custom source configuration (from TOML or flags).
#[derive(Debug, Clone)]
pub struct CustomSourceConfig {
    /// Name of the source.
    pub name: String,
    /// Pattern to match (e.g. `mylib.get_input`).
    pub pattern: String,
    /// Severity level.
    pub severity: Severity,
}

/// Custom sink configuration (from TOML or flags).
#[derive(Debug, Clone)]
pub struct CustomSinkConfig {
    /// Name of the sink.
    pub name: String,
    /// Pattern to match (e.g. `mylib.dangerous_func`).
    pub pattern: String,
    /// Vulnerability type.
    pub vuln_type: VulnType,
    /// Severity level.
    pub severity: Severity,
    /// Remediation advice.
    pub remediation: String,
}

impl TaintConfig {
    /// Creates a config with custom patterns added to the defaults.
    #[must_use]
    pub fn with_custom(sources: Vec<String>, sinks: Vec<String>) -> Self {
        let mut config = Self::default();

        for pattern in sources {
            config.custom_sources.push(CustomSourceConfig {
                name: format!("Custom: {pattern}"),
                pattern,
                severity: Severity::High,
            });
        }

        for pattern in sinks {
            config.custom_sinks.push(CustomSinkConfig {
                name: format!("Custom: {pattern}"),
                pattern,
                vuln_type: VulnType::CodeInjection,
                severity: Severity::High,
                remediation: "Review data flow from custom source to this sink.".to_owned(),
            });
        }

        config
    }

    /// Parses a configuration document.
    ///
    /// ```toml
    /// taint_parameters = false
    ///
    /// [[sources]]
    /// pattern = "mylib.get_input"
    ///
    /// [[sinks]]
    /// pattern = "mylib.run_query"
    /// remediation = "Use the prepared-statement helper."
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error when the document is not valid TOML.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let file: FileConfig = toml::from_str(content).context("invalid taint configuration")?;
        let mut config = Self::with_custom(
            file.sources.iter().map(|s| s.pattern.clone()).collect(),
            file.sinks.iter().map(|s| s.pattern.clone()).collect(),
        );
        if let Some(taint_parameters) = file.taint_parameters {
            config.taint_parameters = taint_parameters;
        }
        for (sink, file_sink) in config.custom_sinks.iter_mut().zip(file.sinks.iter()) {
            if let Some(name) = &file_sink.name {
                sink.name.clone_from(name);
            }
            if let Some(remediation) = &file_sink.remediation {
                sink.remediation.clone_from(remediation);
            }
        }
        for (source, file_source) in config.custom_sources.iter_mut().zip(file.sources.iter()) {
            if let Some(name) = &file_source.name {
                source.name.clone_from(name);
            }
        }
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    taint_parameters: Option<bool>,
    #[serde(default)]
    sources: Vec<FilePattern>,
    #[serde(default)]
    sinks: Vec<FilePattern>,
}

#[derive(Debug, Deserialize)]
struct FilePattern {
    name: Option<String>,
    pattern: String,
    remediation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_round_trips_custom_patterns() {
        let config = TaintConfig::from_toml_str(
            "taint_parameters = false\n\n[[sources]]\npattern = \"mylib.fetch\"\n\n[[sinks]]\npattern = \"mylib.run\"\nremediation = \"Use the helper.\"\n",
        )
        .expect("valid config");

        assert!(!config.taint_parameters);
        assert_eq!(config.custom_sources.len(), 1);
        assert_eq!(config.custom_sources[0].pattern, "mylib.fetch");
        assert_eq!(config.custom_sinks.len(), 1);
        assert_eq!(config.custom_sinks[0].remediation, "Use the helper.");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(TaintConfig::from_toml_str("[[sources]\npattern = 1").is_err());
    }
}
