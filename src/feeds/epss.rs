use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::Cache;
use crate::model::{EpssResponse, EpssScore};

/// Base URL for the FIRST.org EPSS API.
pub const EPSS_API_URL: &str = "https://api.first.org/data/v1/epss";

/// Ids per request. The API takes a comma-joined list; batching bounds the
/// URL length for large analytics queries.
const BATCH_SIZE: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the EPSS exploitation-probability feed. Not rate limited.
pub struct EpssClient {
    client: reqwest::Client,
    cache: Arc<Cache>,
}

impl EpssClient {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache,
        }
    }

    /// Fetches scores for a list of CVE ids, batched per [`BATCH_SIZE`].
    ///
    /// Ids without a published score are simply absent from the result map.
    /// A failed batch is logged and contributes nothing; the remaining
    /// batches are still fetched.
    pub async fn fetch_scores(&self, cve_ids: &[String]) -> HashMap<String, EpssScore> {
        let mut all = HashMap::new();

        for chunk in cve_ids.chunks(BATCH_SIZE) {
            let joined = chunk.join(",");
            let cache_key = format!("epss_{joined}");

            if let Some(hit) = self.cache.get::<HashMap<String, EpssScore>>(&cache_key) {
                debug!(source = "EPSS", ids = chunk.len(), "cache hit");
                all.extend(hit);
                continue;
            }

            match self.fetch_batch(&joined).await {
                Some(scores) => {
                    if let Err(e) = self.cache.set(&cache_key, &scores) {
                        warn!(source = "EPSS", error = %e, "failed to cache scores");
                    }
                    all.extend(scores);
                }
                None => {
                    warn!(source = "EPSS", ids = chunk.len(), "batch failed, skipping");
                }
            }
        }

        all
    }

    /// Convenience lookup for a single id.
    pub async fn fetch_score(&self, cve_id: &str) -> Option<EpssScore> {
        let ids = [cve_id.to_string()];
        let mut scores = self.fetch_scores(&ids).await;
        scores.remove(cve_id)
    }

    async fn fetch_batch(&self, joined_ids: &str) -> Option<HashMap<String, EpssScore>> {
        debug!(source = "EPSS", "fetching scores");

        let response = match self
            .client
            .get(EPSS_API_URL)
            .query(&[("cve", joined_ids)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(source = "EPSS", error = %e, "request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(source = "EPSS", status = %response.status(), "non-success response");
            return None;
        }

        let body: EpssResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(source = "EPSS", error = %e, "malformed response body");
                return None;
            }
        };

        Some(
            body.data
                .into_iter()
                .map(|score| (score.cve.clone(), score))
                .collect(),
        )
    }
}
