//! Scheduling module for tenant sweeps
//!
//! This module runs the crawl engine for every active tenant on a fixed
//! interval, or for one tenant on demand, and stores the results in the
//! cache:
//! - Tenant directory abstraction and its config-backed implementation
//! - Per-sweep statistics
//! - The single-flight scheduler

mod directory;
mod scheduler;
mod stats;

pub use directory::{StaticDirectory, Tenant, TenantDirectory};
pub use scheduler::{Scheduler, SchedulerStatus, SharedStats};
pub use stats::{DetailStatus, RunStats, SweepDetail};
