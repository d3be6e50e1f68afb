use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::io::{self, Write};
use ctx_core::{AppError, Discovery, ResolvedFile};

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    project: &'a str,
    files: &'a [ResolvedFile],
}

// --- Public Output Functions ---

pub fn print_report(discovery: &Discovery, format: &str) -> Result<()> {
    let content = match format.to_lowercase().as_str() {
        "json" => render_json(discovery)?,
        _ => render_text(discovery),
    };
    write_to_stdout(&content)
}

pub fn report_warnings(warnings: &[AppError], quiet: bool) {
    if warnings.is_empty() || quiet {
        return;
    }
    eprintln!(
        "\n{}",
        "Warning: Problems encountered during discovery:".yellow()
    );
    for warning in warnings {
        eprintln!(" - {}", warning);
    }
    eprintln!("---");
}

// --- Rendering ---

fn render_json(discovery: &Discovery) -> Result<String> {
    let report = JsonReport {
        project: &discovery.project_name,
        files: &discovery.files,
    };
    serde_json::to_string_pretty(&report)
        .map_err(AppError::from)
        .context("Failed to serialize report as JSON")
}

/// Multi-document YAML-style stream: a header with the path tree, then one
/// `path` / `content` block per file, separated by `---`.
pub fn render_text(discovery: &Discovery) -> String {
    // 1. Header and path tree
    let mut buffer: Vec<String> = Vec::new();
    buffer.push(format!("# Project Audit: {}", discovery.project_name));
    buffer.push("# Context Map:".to_string());
    buffer.push("project_structure: |".to_string());

    let paths: Vec<&str> = discovery.files.iter().map(|f| f.path.as_str()).collect();
    buffer.extend(render_tree(&paths).into_iter().map(|line| format!("  {}", line)));
    buffer.push("\n---\n".to_string());

    // 2. One indented block per file
    for file in &discovery.files {
        buffer.push(format!("path: {}", file.path));
        buffer.push("content: |".to_string());
        buffer.extend(file.content.lines().map(|line| format!("  {}", line)));
        buffer.push("\n---\n".to_string());
    }
    buffer.join("\n")
}

/// Renders sorted slash-separated paths as an indented tree. Each directory
/// appears once with a trailing `/`, two spaces per depth level.
pub fn render_tree(sorted_paths: &[&str]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut open_dirs: Vec<&str> = Vec::new();

    for path in sorted_paths {
        let parts: Vec<&str> = path.split('/').collect();
        let Some((name, dirs)) = parts.split_last() else {
            continue;
        };
        // Reuse the directories already printed for the previous path
        let common = open_dirs
            .iter()
            .zip(dirs)
            .take_while(|(open, dir)| open == dir)
            .count();
        open_dirs.truncate(common);
        for (depth, dir) in dirs.iter().enumerate().skip(common) {
            lines.push(format!("{}{}/", "  ".repeat(depth), dir));
            open_dirs.push(*dir);
        }
        lines.push(format!("{}{}", "  ".repeat(dirs.len()), name));
    }
    lines
}

// --- Internal Helpers ---

fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    // Add a trailing newline for the terminal
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
