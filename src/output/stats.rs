//! Sweep statistics rendering
//!
//! This module turns a [`RunStats`] record into the human-readable report
//! printed after a sweep or by `schedule` status updates.

use crate::schedule::{DetailStatus, RunStats};
use std::fmt::Write;

/// Renders sweep statistics as a text report
pub fn render_run_stats(stats: &RunStats) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Sweep Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Started: {}", stats.started_at.to_rfc3339());
    match stats.finished_at {
        Some(finished) => {
            let seconds = (finished - stats.started_at).num_seconds();
            let _ = writeln!(out, "  Finished: {} ({}s)", finished.to_rfc3339(), seconds);
        }
        None => {
            let _ = writeln!(out, "  Finished: still running ({} pending)", stats.pending());
        }
    }
    let _ = writeln!(out, "  Guides: {}", stats.total_guides);
    let _ = writeln!(out, "  Scraped: {}", stats.scraped);
    let _ = writeln!(out, "  Skipped: {}", stats.skipped);
    let _ = writeln!(out, "  Errors: {}", stats.errors);
    let _ = writeln!(out);

    if !stats.details.is_empty() {
        let _ = writeln!(out, "Guides:");
        let mut details: Vec<_> = stats.details.iter().collect();
        details.sort_by(|a, b| a.slug.cmp(&b.slug));

        for detail in details {
            let summary = match (detail.status, detail.pages, detail.error.as_deref()) {
                (DetailStatus::Scraped, Some(pages), _) => format!("{} pages", pages),
                (_, _, Some(error)) => error.to_string(),
                _ => String::new(),
            };
            let _ = writeln!(
                out,
                "  {:<8} {} {} {}",
                detail.status,
                detail.slug,
                detail.website_url.as_deref().unwrap_or("-"),
                summary
            );
        }
        let _ = writeln!(out);
    }

    let attempted = stats.scraped + stats.errors;
    let success_rate = if attempted > 0 {
        (stats.scraped as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} crawled guides cached)",
        success_rate, stats.scraped, attempted
    );

    out
}

/// Prints sweep statistics to stdout
pub fn print_run_stats(stats: &RunStats) {
    print!("{}", render_run_stats(stats));
}
