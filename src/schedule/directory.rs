//! Tenant directory
//!
//! The sweep only needs to list active tenants and look one up by slug. The
//! directory is a trait so the platform's own document store can stand in
//! for the config-backed [`StaticDirectory`].

use crate::config::TenantEntry;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A guide tenant as the directory knows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    pub is_active: bool,
}

impl From<&TenantEntry> for Tenant {
    fn from(entry: &TenantEntry) -> Self {
        Self {
            slug: entry.slug.clone(),
            website_url: entry.website_url.clone(),
            is_active: entry.active,
        }
    }
}

/// Source of tenants for sweeps and single-tenant refreshes
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Every tenant flagged active
    async fn list_active(&self) -> Result<Vec<Tenant>>;

    /// One tenant by slug, active or not
    async fn find(&self, slug: &str) -> Result<Option<Tenant>>;
}

/// Fixed, in-memory tenant directory
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    tenants: Vec<Tenant>,
}

impl StaticDirectory {
    pub fn new(tenants: Vec<Tenant>) -> Self {
        Self { tenants }
    }

    /// Builds the directory from the `[[tenant]]` configuration entries
    pub fn from_config(entries: &[TenantEntry]) -> Self {
        Self::new(entries.iter().map(Tenant::from).collect())
    }
}

#[async_trait]
impl TenantDirectory for StaticDirectory {
    async fn list_active(&self) -> Result<Vec<Tenant>> {
        Ok(self
            .tenants
            .iter()
            .filter(|tenant| tenant.is_active)
            .cloned()
            .collect())
    }

    async fn find(&self, slug: &str) -> Result<Option<Tenant>> {
        Ok(self.tenants.iter().find(|tenant| tenant.slug == slug).cloned())
    }
}
