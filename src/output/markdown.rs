//! Markdown report generation
//!
//! This module generates human-readable markdown reports of crawl results,
//! including per-site outcomes, statistics, abandoned pages and the postings
//! found.

use super::stats::CrawlStatistics;
use super::OutputResult;
use crate::crawler::{CrawlReport, PageOutcome};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report of `reports` to `output_path`
///
/// # Arguments
///
/// * `reports` - One report per crawled site
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(reports: &[CrawlReport], output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(reports);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Wrote crawl report to {}", output_path.display());
    Ok(())
}

/// Formats crawl reports as markdown
pub fn format_markdown_report(reports: &[CrawlReport]) -> String {
    let stats = CrawlStatistics::from_reports(reports);
    let mut md = String::new();

    md.push_str("# Job-Scout Crawl Report\n\n");

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Sites**: {}\n", stats.sites));
    md.push_str(&format!("- **Pages Visited**: {}\n", stats.pages_visited));
    md.push_str(&format!("- **Job Postings**: {}\n", stats.postings));
    md.push_str(&format!("- **Dead Ends**: {}\n", stats.dead_ends));
    md.push_str(&format!(
        "- **Abandoned Pages**: {}\n",
        stats.pages_abandoned()
    ));
    md.push_str(&format!(
        "- **Link Acceptance**: {:.2}%\n\n",
        stats.acceptance_rate()
    ));

    for report in reports {
        md.push_str(&format!("## {}\n\n", report.start_url));
        md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
        md.push_str(&format!(
            "- **Finished**: {}\n",
            report.finished_at.to_rfc3339()
        ));
        md.push_str(&format!(
            "- **Duration**: {} seconds\n",
            report.duration().num_seconds()
        ));
        md.push_str(&format!("- **Status**: {}\n", status(report)));
        md.push_str(&format!("- **Pages Visited**: {}\n", report.pages_visited()));
        md.push_str(&format!("- **Job Postings**: {}\n\n", report.postings.len()));

        let abandoned: Vec<_> = report
            .pages
            .iter()
            .filter_map(|page| match page.outcome {
                PageOutcome::Abandoned(kind) => Some((page, kind)),
                _ => None,
            })
            .collect();
        if !abandoned.is_empty() {
            md.push_str("### Abandoned Pages\n\n");
            md.push_str("| URL | Depth | Phase | Error |\n");
            md.push_str("|-----|-------|-------|-------|\n");
            for (page, kind) in abandoned {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    escape_cell(&page.url),
                    page.depth,
                    page.phase,
                    kind
                ));
            }
            md.push('\n');
        }

        if !report.postings.is_empty() {
            md.push_str("### Postings\n\n");
            md.push_str("| Title | Location | Salary Range |\n");
            md.push_str("|-------|----------|--------------|\n");
            for posting in &report.postings {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    escape_cell(&posting.title),
                    escape_cell(&posting.location),
                    escape_cell(&posting.salary_range)
                ));
            }
            md.push('\n');
        }
    }

    md
}

fn status(report: &CrawlReport) -> String {
    match (&report.error, report.cancelled) {
        (Some(error), _) => format!("failed ({})", error),
        (None, true) => "cancelled".to_string(),
        (None, false) => "completed".to_string(),
    }
}

/// Makes text safe for a single markdown table cell
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
