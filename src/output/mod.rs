//! Output module for human-readable reports
//!
//! This module handles:
//! - Sweep statistics reports
//! - Crawl summaries broken down by page kind
//! - Cache listings and site-search results

mod report;
pub mod stats;

pub use report::{
    kind_breakdown, print_cache_listing, print_crawl_outcome, print_search_hits,
    render_cache_listing, render_crawl_outcome, render_search_hits,
};
pub use stats::{print_run_stats, render_run_stats};
