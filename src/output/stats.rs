//! Statistics over crawl reports

use crate::crawler::{CrawlReport, PageOutcome};
use crate::ErrorKind;
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Number of sites crawled
    pub sites: usize,

    /// Sites whose crawl could not start or stopped early
    pub failed_sites: usize,

    /// Sites whose crawl was cancelled
    pub cancelled_sites: usize,

    /// Pages actually loaded
    pub pages_visited: u64,

    /// Frontier entries dropped at the depth cap
    pub pages_skipped: u64,

    /// Pages without job links or apply signal
    pub dead_ends: u64,

    /// Abandoned pages by error kind
    pub abandoned: BTreeMap<ErrorKind, u64>,

    /// Loaded pages by depth
    pub pages_by_depth: BTreeMap<u32, u64>,

    /// Links sent to the classifier
    pub links_classified: u64,

    /// Links the classifier accepted
    pub links_accepted: u64,

    /// Pages carrying an apply signal
    pub apply_pages: u64,

    /// Postings extracted
    pub postings: u64,

    /// Distinct URLs marked visited
    pub visited_urls: u64,
}

impl CrawlStatistics {
    /// Aggregates statistics over one or more crawl reports
    pub fn from_reports(reports: &[CrawlReport]) -> Self {
        let mut stats = Self {
            sites: reports.len(),
            ..Self::default()
        };

        for report in reports {
            if report.error.is_some() {
                stats.failed_sites += 1;
            }
            if report.cancelled {
                stats.cancelled_sites += 1;
            }
            stats.postings += report.postings.len() as u64;
            stats.visited_urls += report.visited as u64;

            for page in &report.pages {
                match page.outcome {
                    PageOutcome::Skipped => {
                        stats.pages_skipped += 1;
                        continue;
                    }
                    PageOutcome::DeadEnd => stats.dead_ends += 1,
                    PageOutcome::Abandoned(kind) => {
                        *stats.abandoned.entry(kind).or_insert(0) += 1;
                    }
                    PageOutcome::Explored { .. } => {}
                }

                stats.pages_visited += 1;
                *stats.pages_by_depth.entry(page.depth).or_insert(0) += 1;
                stats.links_classified += page.links_classified as u64;
                stats.links_accepted += page.links_accepted as u64;
                if page.apply_signal {
                    stats.apply_pages += 1;
                }
            }
        }

        stats
    }

    /// Total abandoned pages
    pub fn pages_abandoned(&self) -> u64 {
        self.abandoned.values().sum()
    }

    /// Share of classified links the classifier accepted, in percent
    pub fn acceptance_rate(&self) -> f64 {
        if self.links_classified == 0 {
            0.0
        } else {
            (self.links_accepted as f64 / self.links_classified as f64) * 100.0
        }
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// Stdout is reserved for postings.
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    eprintln!("=== Crawl Statistics ===\n");

    eprintln!("Overview:");
    eprintln!("  Sites crawled: {}", stats.sites);
    if stats.failed_sites > 0 {
        eprintln!("  Sites stopped early: {}", stats.failed_sites);
    }
    if stats.cancelled_sites > 0 {
        eprintln!("  Sites cancelled: {}", stats.cancelled_sites);
    }
    eprintln!("  Pages visited: {}", stats.pages_visited);
    eprintln!("  URLs marked visited: {}", stats.visited_urls);
    eprintln!("  Job postings: {}", stats.postings);
    eprintln!();

    eprintln!("Pages:");
    eprintln!("  Dead ends: {}", stats.dead_ends);
    eprintln!("  With apply link: {}", stats.apply_pages);
    eprintln!("  Depth cap reached: {}", stats.pages_skipped);
    eprintln!("  Abandoned: {}", stats.pages_abandoned());
    eprintln!();

    if !stats.pages_by_depth.is_empty() {
        eprintln!("Pages by Depth:");
        for (depth, count) in &stats.pages_by_depth {
            eprintln!("  {}: {}", depth, count);
        }
        eprintln!();
    }

    if !stats.abandoned.is_empty() {
        eprintln!("Abandoned Pages:");
        let mut counts: Vec<_> = stats.abandoned.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in counts {
            eprintln!("  {}: {}", kind, count);
        }
        eprintln!();
    }

    eprintln!(
        "Link Acceptance: {:.1}% ({} / {} links classified as jobs)",
        stats.acceptance_rate(),
        stats.links_accepted,
        stats.links_classified
    );
}
