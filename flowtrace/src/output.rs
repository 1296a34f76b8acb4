//! Rendering of findings as colored tables or JSON.

use std::io::Write;

use colored::Colorize;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::taint::{Severity, TaintFinding};

fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Low => Color::Blue,
        Severity::Medium => Color::Yellow,
        Severity::High => Color::Red,
        Severity::Critical => Color::Magenta,
    }
}

/// Print taint findings as a table.
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
pub fn print_taint_findings(
    writer: &mut impl Write,
    title: &str,
    findings: &[TaintFinding],
) -> std::io::Result<()> {
    if findings.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", title.bold().underline())?;
    let mut table = create_table(vec!["Rule ID", "Message", "Location", "Severity"]);

    for finding in findings {
        let location = format!("{}:{}", finding.file.display(), finding.sink_line);
        let message = format!(
            "{} via {} (source: {})",
            finding.vuln_type, finding.sink, finding.source
        );
        table.add_row(vec![
            Cell::new(&finding.rule_id).add_attribute(Attribute::Dim),
            Cell::new(message).add_attribute(Attribute::Bold),
            Cell::new(location),
            Cell::new(finding.severity.to_string()).fg(severity_color(finding.severity)),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print findings as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn print_json(writer: &mut impl Write, findings: &[TaintFinding]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, findings)?;
    writeln!(writer)?;
    Ok(())
}

/// Print a one-line run summary.
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
pub fn print_summary(
    writer: &mut impl Write,
    files: usize,
    findings: &[TaintFinding],
) -> std::io::Result<()> {
    let summary = format!(
        "Analyzed {files} file(s): {} flow(s) reported",
        findings.len()
    );
    if findings.is_empty() {
        writeln!(writer, "{}", summary.green())
    } else {
        writeln!(writer, "{}", summary.red().bold())
    }
}
