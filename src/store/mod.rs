pub mod rest;

use crate::error::CustodianError;
use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

/// One row of the authoritative blueprint table, as returned by the store's
/// REST surface. `id` is the join key against on-disk content; everything
/// else feeds the index manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: String,
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub author_steam_id: Option<String>,
    pub category: String,
    pub version: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(rename = "github_path")]
    pub path: String,
    #[serde(rename = "is_active", default = "default_active")]
    pub active: bool,
    #[serde(rename = "stat_likes", default)]
    pub likes: u64,
    #[serde(rename = "stat_dislikes", default)]
    pub dislikes: u64,
    #[serde(rename = "stat_added_to_library", default)]
    pub saved_count: u64,
    #[serde(default)]
    pub created_at: String,
}

/// The authoritative metadata store. The filesystem is never consulted to
/// decide validity; this capability is the sole arbiter.
pub trait MetadataStore {
    /// List every record the store currently considers active. An empty list
    /// is a valid answer, distinct from `StoreUnavailable`.
    fn list_active_records(&self) -> Result<Vec<StoreRecord>, CustodianError>;
}
