use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::Cache;
use crate::model::KevCatalog;

/// URL of the CISA Known Exploited Vulnerabilities catalog document.
pub const KEV_CATALOG_URL: &str =
    "https://www.cisa.gov/sites/default/files/feeds/known_exploited_vulnerabilities.json";

const CACHE_KEY: &str = "kev_catalog";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the KEV catalog. The catalog is one static document fetched
/// wholesale and cached under a fixed key; membership checks happen against
/// the cached copy via [`KevCatalog::entry_for`]. Not rate limited.
pub struct KevClient {
    client: reqwest::Client,
    cache: Arc<Cache>,
}

impl KevClient {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache,
        }
    }

    pub async fn fetch_catalog(&self) -> Option<KevCatalog> {
        if let Some(hit) = self.cache.get::<KevCatalog>(CACHE_KEY) {
            debug!(source = "KEV", "cache hit");
            return Some(hit);
        }

        let response = match self
            .client
            .get(KEV_CATALOG_URL)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(source = "KEV", error = %e, "request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(source = "KEV", status = %response.status(), "non-success response");
            return None;
        }

        let catalog: KevCatalog = match response.json().await {
            Ok(c) => c,
            Err(e) => {
                warn!(source = "KEV", error = %e, "malformed catalog body");
                return None;
            }
        };

        debug!(source = "KEV", entries = catalog.vulnerabilities.len(), "fetched catalog");
        if let Err(e) = self.cache.set(CACHE_KEY, &catalog) {
            warn!(source = "KEV", error = %e, "failed to cache catalog");
        }
        Some(catalog)
    }
}
