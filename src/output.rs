//! CLI output formatting for all pipeline phases.
//!
//! Output is **page-centric**: each phase lists the pages it wrote as
//! root-relative paths, followed by an indented summary line. Image counts
//! appear only for phases that rewrite images.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! ==> Articles
//!     ahu/ahu-bao-tri.html
//!     ahu/ahu-la-gi.html
//!     2 written
//!     Images: 1 converted
//! ==> Indexes
//!     ahu/index.html
//!     ...
//! Cache: 3 cached, 2 encoded (5 total)
//! ```
//!
//! ## Check
//!
//! ```text
//! Articles
//! 001 AHU là gì?
//!     Source: ahu-la-gi.html
//!     Category: ahu
//!     Tags: ahu, thông gió
//!
//! Static pages
//! 001 home.html → index.html
//! 002 dich-vu.html → dich-vu.html (missing)
//!
//! Categories
//! 001 AHU - Phòng sạch (2 articles)
//!     Directory: ahu/
//!
//! Partials: header.html, footer.html found
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::cache::CacheStats;
use crate::pictures::PictureStats;
use crate::pipeline::{CheckReport, PhaseReport};
use std::path::Path;

// ============================================================================
// Helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 article`, `3 articles`.
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Root-relative display path with `/` separators.
fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// `Images: 2 converted, 1 failed, 1 background`; `None` when nothing
/// happened.
fn picture_line(stats: &PictureStats) -> Option<String> {
    if *stats == PictureStats::default() {
        return None;
    }
    let mut parts = vec![format!("{} converted", stats.converted)];
    if stats.failed > 0 {
        parts.push(format!("{} failed", stats.failed));
    }
    if stats.backgrounds > 0 {
        parts.push(plural(stats.backgrounds, "background"));
    }
    Some(format!("Images: {}", parts.join(", ")))
}

// ============================================================================
// Build
// ============================================================================

pub fn format_phase_report(report: &PhaseReport, root: &Path) -> Vec<String> {
    let mut lines = vec![format!("==> {}", report.phase)];
    for path in &report.written {
        lines.push(format!("{}{}", indent(1), display_path(root, path)));
    }

    let mut summary = vec![format!("{} written", report.written.len())];
    if report.unchanged > 0 {
        summary.push(format!("{} unchanged", report.unchanged));
    }
    if report.skipped > 0 {
        summary.push(format!("{} skipped", report.skipped));
    }
    lines.push(format!("{}{}", indent(1), summary.join(", ")));

    if let Some(line) = picture_line(&report.pictures) {
        lines.push(format!("{}{}", indent(1), line));
    }
    lines
}

pub fn format_build_output(
    reports: &[PhaseReport],
    cache: Option<&CacheStats>,
    root: &Path,
) -> Vec<String> {
    let mut lines: Vec<String> = reports
        .iter()
        .flat_map(|report| format_phase_report(report, root))
        .collect();
    if let Some(stats) = cache {
        lines.push(format!("Cache: {}", stats));
    }
    lines
}

/// Print build output to stdout.
pub fn print_build_output(reports: &[PhaseReport], cache: Option<&CacheStats>, root: &Path) {
    for line in format_build_output(reports, cache, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = vec!["Articles".to_string()];
    for (i, article) in report.articles.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), article.title));
        lines.push(format!("{}Source: {}", indent(1), article.file_name));
        if article.known_category {
            lines.push(format!("{}Category: {}", indent(1), article.category));
        } else {
            lines.push(format!(
                "{}Category: {} (not configured)",
                indent(1),
                article.category
            ));
        }
        if !article.tags.is_empty() {
            lines.push(format!("{}Tags: {}", indent(1), article.tags.join(", ")));
        }
    }

    lines.push(String::new());
    lines.push("Static pages".to_string());
    for (i, (source, output, present)) in report.static_pages.iter().enumerate() {
        let missing = if *present { "" } else { " (missing)" };
        lines.push(format!("{} {} → {}{}", format_index(i + 1), source, output, missing));
    }

    lines.push(String::new());
    lines.push("Categories".to_string());
    for (i, (dir, title, count)) in report.categories.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            title,
            plural(*count, "article")
        ));
        lines.push(format!("{}Directory: {}/", indent(1), dir));
    }

    lines.push(String::new());
    if report.partials_present {
        lines.push("Partials: header.html, footer.html found".to_string());
    } else {
        lines.push("Partials: missing".to_string());
    }
    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
