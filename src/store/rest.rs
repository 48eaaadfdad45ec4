use crate::error::CustodianError;
use crate::store::{MetadataStore, StoreRecord};
use reqwest::blocking::Client;
use std::env;
use std::time::Duration;

const SELECT_COLUMNS: &str = "id,name,author,author_steam_id,category,tags,width,height,version,github_path,is_active,stat_likes,stat_dislikes,stat_added_to_library,created_at";

/// Supabase-style REST client for the blueprint table. The read path is
/// bounded by a fixed timeout; a timeout is reported the same way as any
/// other transport or HTTP failure.
#[derive(Debug, Clone)]
pub struct RestMetadataStore {
    base_url: String,
    service_key: String,
    timeout_secs: u64,
}

fn env_non_empty(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn unavailable(reason: impl Into<String>) -> CustodianError {
    CustodianError::StoreUnavailable(reason.into())
}

impl RestMetadataStore {
    pub fn new(base_url: &str, service_key: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            timeout_secs,
        }
    }

    /// Build a client from `CUSTODIAN_STORE_URL` / `CUSTODIAN_STORE_KEY`.
    /// Returns `None` when either credential is absent; the caller decides
    /// whether that is fatal or a fallback trigger.
    pub fn from_env(timeout_secs: u64) -> Option<Self> {
        let base_url = env_non_empty("CUSTODIAN_STORE_URL")?;
        let service_key = env_non_empty("CUSTODIAN_STORE_KEY")?;
        Some(Self::new(&base_url, &service_key, timeout_secs))
    }

    fn records_url(&self) -> String {
        format!(
            "{}/rest/v1/blueprints?select={}&is_active=eq.true",
            self.base_url, SELECT_COLUMNS
        )
    }
}

impl MetadataStore for RestMetadataStore {
    fn list_active_records(&self) -> Result<Vec<StoreRecord>, CustodianError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|err| unavailable(format!("failed to build http client: {err}")))?;

        let response = client
            .get(self.records_url())
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .map_err(|err| unavailable(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("store responded with status {status}")));
        }

        let records: Vec<StoreRecord> = response
            .json()
            .map_err(|err| unavailable(format!("invalid store response body: {err}")))?;
        Ok(records)
    }
}
