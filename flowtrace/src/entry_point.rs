//! Shared entry point used by every binary front end.

use anyhow::Result;
use clap::Parser;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::output;
use crate::taint::{TaintConfig, TaintFinding, TaintRecipe};

/// Runs the analyzer with the given arguments using stdout as the writer.
///
/// # Errors
///
/// Returns an error if configuration loading or output writing fails.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Runs the analyzer, writing output to the specified writer.
///
/// This is the testable version of [`run_with_args`] that allows output
/// capture.
///
/// # Errors
///
/// Returns an error if configuration loading or output writing fails.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["flowtrace".to_owned()];
    program_args.extend(args);
    let cli = match Cli::try_parse_from(program_args) {
        Ok(cli) => cli,
        Err(e) => {
            return match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    write!(writer, "{e}")?;
                    writer.flush()?;
                    Ok(0)
                }
                _ => {
                    eprint!("{e}");
                    Ok(1)
                }
            };
        }
    };

    let mut config = match &cli.config {
        Some(path) => TaintConfig::load(path)?,
        None => TaintConfig::default(),
    };
    if !cli.sources.is_empty() || !cli.sinks.is_empty() {
        let extra = TaintConfig::with_custom(cli.sources.clone(), cli.sinks.clone());
        config.custom_sources.extend(extra.custom_sources);
        config.custom_sinks.extend(extra.custom_sinks);
    }
    if cli.no_param_sources {
        config.taint_parameters = false;
    }

    let files = collect_python_files(&cli.paths, &cli.exclude_folders);
    let recipe = TaintRecipe::new(config);

    let mut findings: Vec<TaintFinding> = files
        .par_iter()
        .flat_map(|path| match std::fs::read_to_string(path) {
            Ok(source) => recipe.analyze_source(&source, path),
            Err(err) => {
                eprintln!("flowtrace: skipping {}: {err}", path.display());
                Vec::new()
            }
        })
        .collect();
    findings.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.sink_line.cmp(&b.sink_line))
            .then(a.source_line.cmp(&b.source_line))
    });

    if cli.json {
        output::print_json(writer, &findings)?;
    } else {
        output::print_taint_findings(writer, "Taint Flows", &findings)?;
        output::print_summary(writer, files.len(), &findings)?;
    }

    Ok(i32::from(cli.strict && !findings.is_empty()))
}

/// Collects `.py` files under the given paths, honoring gitignore rules and
/// user folder exclusions.
fn collect_python_files(paths: &[PathBuf], exclude_folders: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            if is_python(path) {
                files.push(path.clone());
            }
            continue;
        }
        for entry in ignore::WalkBuilder::new(path).build().flatten() {
            let entry_path = entry.path();
            if entry_path.is_file()
                && is_python(entry_path)
                && !is_excluded(entry_path, exclude_folders)
            {
                files.push(entry_path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

fn is_python(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}

fn is_excluded(path: &Path, exclude_folders: &[String]) -> bool {
    path.components().any(|component| {
        exclude_folders
            .iter()
            .any(|folder| component.as_os_str() == folder.as_str())
    })
}
