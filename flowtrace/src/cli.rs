use clap::Parser;
use std::path::PathBuf;

/// Command line interface configuration using `clap`.
#[derive(Parser, Debug)]
#[command(author, version, about = "Source-to-sink value flow analysis for Python", long_about = None)]
pub struct Cli {
    /// Paths to analyze (files or directories).
    /// When no paths are provided, defaults to the current directory.
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output raw JSON.
    #[arg(long)]
    pub json: bool,

    /// Path to a `flowtrace.toml` with custom source/sink patterns.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Additional source patterns (dotted names), repeatable.
    #[arg(long = "source", value_name = "PATTERN")]
    pub sources: Vec<String>,

    /// Additional sink patterns (dotted names), repeatable.
    #[arg(long = "sink", value_name = "PATTERN")]
    pub sinks: Vec<String>,

    /// Do not treat function parameters as taint sources.
    #[arg(long)]
    pub no_param_sources: bool,

    /// Exit with a non-zero code when any flow is reported.
    #[arg(long)]
    pub strict: bool,

    /// Folders to exclude from analysis.
    #[arg(long, alias = "exclude-folder")]
    pub exclude_folders: Vec<String>,
}
