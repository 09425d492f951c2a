//! Output formatting for oascheck results.
//!
//! Supports four output formats:
//! - Pretty: colored terminal output grouped by category
//! - JSON: the canonical result object
//! - Markdown: category-grouped summary for pull request comments
//! - Outputs: `key=value` lines for CI step outputs

use colored::*;
use std::fmt::Write as _;
use std::path::Path;

use crate::result::{AnalysisReport, RepositoryReport};
use crate::rules::Category;
use crate::score::calculate_grade;

/// Selectable output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Markdown,
    Outputs,
}

/// What is being reported on.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    File {
        source: &'a str,
        report: &'a AnalysisReport,
    },
    Repository(&'a RepositoryReport),
}

/// Render a subject in the given format.
pub fn render(format: OutputFormat, subject: Subject<'_>) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => render_json(subject),
        OutputFormat::Pretty => Ok(render_pretty(subject)),
        OutputFormat::Markdown => Ok(render_markdown(subject)),
        OutputFormat::Outputs => Ok(render_outputs(subject)),
    }
}

/// Print to stdout, or write to `output` when given.
pub fn emit(rendered: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .map_err(|e| anyhow::anyhow!("failed to write {}: {}", path.display(), e))?;
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

// =============================================================================
// JSON Format
// =============================================================================

pub fn render_json(subject: Subject<'_>) -> anyhow::Result<String> {
    let mut json = match subject {
        Subject::File { report, .. } => serde_json::to_string_pretty(report)?,
        Subject::Repository(repo) => serde_json::to_string_pretty(repo)?,
    };
    json.push('\n');
    Ok(json)
}

// =============================================================================
// Pretty Format
// =============================================================================

pub fn render_pretty(subject: Subject<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {} v{}",
        "oascheck".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    let _ = writeln!(out);

    match subject {
        Subject::File { source, report } => write_file(&mut out, source, report),
        Subject::Repository(repo) => {
            let _ = writeln!(
                out,
                "  {}{} ({})",
                "Repository: ".dimmed(),
                repo.repository.full_name,
                repo.repository.url
            );
            let _ = writeln!(out);
            if repo.openapi_files.is_empty() {
                let _ = writeln!(out, "  {}", "No specification files found.".yellow());
                let _ = writeln!(out);
            }
            for file in &repo.openapi_files {
                write_file(&mut out, &file.file_info.path, &file.report);
            }
        }
    }
    out
}

fn write_file(out: &mut String, source: &str, report: &AnalysisReport) {
    let _ = writeln!(out, "  {}{}", "Source: ".dimmed(), source);

    if !report.is_success() {
        let _ = writeln!(
            out,
            "  {}  {}",
            "✗ ERROR".red(),
            report.message.as_deref().unwrap_or("analysis failed")
        );
        let _ = writeln!(out);
        return;
    }

    if let Some(summary) = &report.summary {
        let _ = writeln!(
            out,
            "  {}{}  Paths: {}  Operations: {}  Schemas: {}",
            "OpenAPI: ".dimmed(),
            summary.openapi_version.as_deref().unwrap_or("unknown"),
            summary.paths_count,
            summary.operations_count,
            summary.schemas_count
        );
    }
    let _ = writeln!(out);

    write_result_summary(out, report);
    let _ = writeln!(out);

    for category in Category::ALL {
        let messages = report.messages(category);
        if messages.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {} ({}):", category.title().bold(), messages.len());
        for message in messages {
            let _ = writeln!(out, "    {} {}", "•".dimmed(), message);
        }
        let _ = writeln!(out);
    }
}

fn write_result_summary(out: &mut String, report: &AnalysisReport) {
    let grade = calculate_grade(report.maintainability_score);
    let _ = writeln!(
        out,
        "  {}  Maintainability: {}  Grade: {}  Complexity: {:.2}  Findings: {}",
        "✓ VALID".green(),
        colored_score(report.maintainability_score),
        colored_grade(grade),
        report.complexity_score,
        report.total_findings
    );
}

fn colored_score(score: f64) -> ColoredString {
    let text = format!("{:.2}", score);
    match calculate_grade(score) {
        "A" => text.green().bold(),
        "B" => text.green(),
        "C" => text.yellow(),
        "D" => text.yellow().bold(),
        _ => text.red(),
    }
}

fn colored_grade(grade: &str) -> ColoredString {
    match grade {
        "A" => grade.green().bold(),
        "B" => grade.green(),
        "C" => grade.yellow(),
        "D" => grade.yellow().bold(),
        _ => grade.red(),
    }
}

// =============================================================================
// Markdown Format
// =============================================================================

pub fn render_markdown(subject: Subject<'_>) -> String {
    let mut out = String::new();
    match subject {
        Subject::File { source, report } => {
            let _ = writeln!(out, "## OpenAPI analysis: `{}`", source);
            let _ = writeln!(out);
            write_markdown_report(&mut out, report, 3);
        }
        Subject::Repository(repo) => {
            let _ = writeln!(out, "## OpenAPI analysis: {}", repo.repository.full_name);
            let _ = writeln!(out);
            if repo.openapi_files.is_empty() {
                let _ = writeln!(out, "No specification files found.");
            }
            for file in &repo.openapi_files {
                let _ = writeln!(out, "### `{}`", file.file_info.path);
                let _ = writeln!(out);
                write_markdown_report(&mut out, &file.report, 4);
            }
        }
    }
    out
}

fn write_markdown_report(out: &mut String, report: &AnalysisReport, level: usize) {
    if !report.is_success() {
        let _ = writeln!(
            out,
            "**Error:** {}",
            report.message.as_deref().unwrap_or("analysis failed")
        );
        let _ = writeln!(out);
        return;
    }

    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|---|---|");
    if let Some(summary) = &report.summary {
        let version = summary.openapi_version.as_deref().unwrap_or("unknown");
        let _ = writeln!(out, "| OpenAPI version | {} |", version);
        let _ = writeln!(out, "| Paths | {} |", summary.paths_count);
        let _ = writeln!(out, "| Operations | {} |", summary.operations_count);
        let _ = writeln!(out, "| Schemas | {} |", summary.schemas_count);
    }
    let _ = writeln!(out, "| Complexity | {:.2} |", report.complexity_score);
    let _ = writeln!(
        out,
        "| Maintainability | {:.2} ({}) |",
        report.maintainability_score,
        calculate_grade(report.maintainability_score)
    );
    let _ = writeln!(out, "| Findings | {} |", report.total_findings);
    let _ = writeln!(out);

    let heading = "#".repeat(level);
    for category in Category::ALL {
        let messages = report.messages(category);
        if messages.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{} {} ({})", heading, category.title(), messages.len());
        let _ = writeln!(out);
        for message in messages {
            let _ = writeln!(out, "- {}", message);
        }
        let _ = writeln!(out);
    }
}

// =============================================================================
// Outputs Format
// =============================================================================

pub fn render_outputs(subject: Subject<'_>) -> String {
    let mut out = String::new();
    match subject {
        Subject::File { report, .. } => {
            let status = if report.is_success() { "success" } else { "error" };
            let _ = writeln!(out, "status={}", status);
            let _ = writeln!(out, "is_valid={}", report.is_valid);
            let summary = report.summary.as_ref();
            let _ = writeln!(out, "paths_count={}", summary.map_or(0, |s| s.paths_count));
            let _ = writeln!(
                out,
                "operations_count={}",
                summary.map_or(0, |s| s.operations_count)
            );
            let _ = writeln!(out, "schemas_count={}", summary.map_or(0, |s| s.schemas_count));
            let _ = writeln!(out, "total_findings={}", report.total_findings);
            let _ = writeln!(out, "complexity_score={}", report.complexity_score);
            let _ = writeln!(out, "maintainability_score={}", report.maintainability_score);
        }
        Subject::Repository(repo) => {
            let status = if repo.all_succeeded() { "success" } else { "error" };
            let _ = writeln!(out, "status={}", status);
            let _ = writeln!(out, "files_count={}", repo.openapi_files.len());
            let _ = writeln!(out, "total_findings={}", repo.total_findings());
            if let Some(min) = repo.min_maintainability() {
                let _ = writeln!(out, "maintainability_score={}", min);
            }
        }
    }
    out
}
