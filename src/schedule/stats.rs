//! Sweep statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to one tenant during a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailStatus {
    Scraped,
    Skipped,
    Error,
}

impl fmt::Display for DetailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scraped => "scraped",
            Self::Skipped => "skipped",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Per-tenant sweep outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepDetail {
    pub slug: String,
    pub status: DetailStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SweepDetail {
    pub fn scraped(slug: &str, website_url: &str, pages: usize) -> Self {
        Self {
            slug: slug.to_string(),
            status: DetailStatus::Scraped,
            website_url: Some(website_url.to_string()),
            pages: Some(pages),
            error: None,
        }
    }

    pub fn skipped(slug: &str, website_url: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            slug: slug.to_string(),
            status: DetailStatus::Skipped,
            website_url: website_url.map(str::to_string),
            pages: None,
            error: Some(reason.into()),
        }
    }

    pub fn failed(slug: &str, website_url: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            slug: slug.to_string(),
            status: DetailStatus::Error,
            website_url: website_url.map(str::to_string),
            pages: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of one all-tenants sweep
///
/// Created when the sweep starts, filled in as tenants finish, and frozen
/// once `finished_at` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_guides: usize,
    pub scraped: usize,
    pub skipped: usize,
    pub errors: usize,
    pub details: Vec<SweepDetail>,
}

impl RunStats {
    /// Starts a new, empty record
    pub fn begin(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: None,
            total_guides: 0,
            scraped: 0,
            skipped: 0,
            errors: 0,
            details: Vec::new(),
        }
    }

    /// Adds one tenant outcome and bumps the matching counter
    pub fn record(&mut self, detail: SweepDetail) {
        match detail.status {
            DetailStatus::Scraped => self.scraped += 1,
            DetailStatus::Skipped => self.skipped += 1,
            DetailStatus::Error => self.errors += 1,
        }
        self.details.push(detail);
    }

    pub fn finish(&mut self, finished_at: DateTime<Utc>) {
        self.finished_at = Some(finished_at);
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Tenants not yet accounted for
    pub fn pending(&self) -> usize {
        self.total_guides
            .saturating_sub(self.scraped + self.skipped + self.errors)
    }
}
