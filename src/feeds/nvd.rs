use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use crate::cache::Cache;
use crate::daterange::{split_range, DateWindow, MAX_WINDOW_DAYS};
use crate::model::{NvdResponse, NvdVulnerability};
use crate::ratelimit::RateLimiter;

/// Base URL for the NVD CVE API 2.0.
pub const NVD_API_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const RANGE_TIMEOUT: Duration = Duration::from_secs(20);

/// Client for the primary CVE source.
///
/// Every request funnels through the injected [`RateLimiter`], so bulk
/// callers running joins concurrently still serialize their NVD traffic.
/// An API key, when configured, is sent in the `apiKey` header for the
/// higher upstream rate allowance.
pub struct NvdClient {
    client: reqwest::Client,
    cache: Arc<Cache>,
    limiter: Arc<RateLimiter>,
    api_key: Option<String>,
}

impl NvdClient {
    pub fn new(cache: Arc<Cache>, limiter: Arc<RateLimiter>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache,
            limiter,
            api_key,
        }
    }

    async fn request(
        &self,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Option<NvdResponse> {
        self.limiter.acquire().await;

        let mut request = self.client.get(NVD_API_URL).query(params).timeout(timeout);
        if let Some(key) = &self.api_key {
            request = request.header("apiKey", key);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(source = "NVD", error = %e, ?params, "request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(source = "NVD", status = %response.status(), ?params, "non-success response");
            return None;
        }

        match response.json::<NvdResponse>().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(source = "NVD", error = %e, ?params, "malformed response body");
                None
            }
        }
    }

    /// Looks up a single CVE by id. `None` means not found or upstream
    /// failure; the two are indistinguishable at this layer and both leave
    /// the cache untouched.
    pub async fn fetch_by_id(&self, cve_id: &str) -> Option<NvdResponse> {
        let cache_key = format!("nvd_{cve_id}");
        if let Some(hit) = self.cache.get::<NvdResponse>(&cache_key) {
            debug!(source = "NVD", cve_id, "cache hit");
            return Some(hit);
        }

        let params = [("cveId", cve_id.to_string())];
        let response = self.request(&params, LOOKUP_TIMEOUT).await?;
        if response.vulnerabilities.is_empty() {
            return None;
        }

        if let Err(e) = self.cache.set(&cache_key, &response) {
            warn!(source = "NVD", cve_id, error = %e, "failed to cache response");
        }
        Some(response)
    }

    /// Keyword search, one page. Backs autocomplete and simple search.
    pub async fn search(&self, keyword: &str, results_per_page: u32) -> Option<NvdResponse> {
        let cache_key = format!("nvd_search_{keyword}_{results_per_page}");
        if let Some(hit) = self.cache.get::<NvdResponse>(&cache_key) {
            debug!(source = "NVD", keyword, "cache hit");
            return Some(hit);
        }

        let params = [
            ("keywordSearch", keyword.to_string()),
            ("resultsPerPage", results_per_page.to_string()),
        ];
        let response = self.request(&params, SEARCH_TIMEOUT).await?;

        if let Err(e) = self.cache.set(&cache_key, &response) {
            warn!(source = "NVD", keyword, error = %e, "failed to cache response");
        }
        Some(response)
    }

    /// Keyword search bounded by publication date.
    ///
    /// Ranges within the upstream's 120-day cap go out as one request and
    /// keep the upstream-reported total. Wider ranges are split into
    /// sub-120-day windows fetched sequentially through the rate limiter
    /// and concatenated into one synthetic response whose total is the
    /// concatenated length (the upstream total is unreliable across
    /// chunks). A failed chunk is logged and skipped rather than discarding
    /// the chunks already fetched, but a response missing chunks is never
    /// cached, so a retry reaches upstream. When every chunk fails the
    /// search returns `None`.
    pub async fn search_date_range(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
        results_per_page: u32,
    ) -> Option<NvdResponse> {
        let cache_key = format!("nvd_date_{keyword}_{start}_{end}_{results_per_page}");
        if let Some(hit) = self.cache.get::<NvdResponse>(&cache_key) {
            debug!(source = "NVD", keyword, "cache hit");
            return Some(hit);
        }

        let span_days = (end - start).num_days();
        if span_days <= 120 {
            let window = DateWindow { start, end };
            let params = [
                ("keywordSearch", keyword.to_string()),
                ("pubStartDate", window.pub_start_param()),
                ("pubEndDate", window.pub_end_param()),
                ("resultsPerPage", results_per_page.to_string()),
            ];
            let response = self.request(&params, RANGE_TIMEOUT).await?;

            if let Err(e) = self.cache.set(&cache_key, &response) {
                warn!(source = "NVD", keyword, error = %e, "failed to cache response");
            }
            return Some(response);
        }

        let windows = split_range(start, end, MAX_WINDOW_DAYS);
        debug!(
            source = "NVD",
            keyword,
            span_days,
            chunks = windows.len(),
            "range exceeds upstream cap, chunking"
        );

        let mut pages: Vec<Option<NvdResponse>> = Vec::with_capacity(windows.len());
        for (i, window) in windows.iter().enumerate() {
            debug!(
                source = "NVD",
                chunk = i + 1,
                total = windows.len(),
                start = %window.start,
                end = %window.end,
                "fetching chunk"
            );

            let params = [
                ("keywordSearch", keyword.to_string()),
                ("pubStartDate", window.pub_start_param()),
                ("pubEndDate", window.pub_end_param()),
                ("resultsPerPage", results_per_page.to_string()),
            ];
            let page = self.request(&params, RANGE_TIMEOUT).await;
            if page.is_none() {
                warn!(
                    source = "NVD",
                    keyword,
                    start = %window.start,
                    end = %window.end,
                    "chunk failed, continuing with partial results"
                );
            }
            pages.push(page);
        }

        let (combined, complete) = combine_pages(results_per_page, pages)?;
        if complete {
            if let Err(e) = self.cache.set(&cache_key, &combined) {
                warn!(source = "NVD", keyword, error = %e, "failed to cache response");
            }
        } else {
            warn!(source = "NVD", keyword, "chunked result is partial, skipping cache");
        }
        Some(combined)
    }
}

/// Concatenates per-window pages into one synthetic response whose
/// `total_results` is the concatenated length. The flag reports whether
/// every window succeeded; `None` when no window did, so the caller falls
/// through instead of serving an empty result.
fn combine_pages(
    results_per_page: u32,
    pages: Vec<Option<NvdResponse>>,
) -> Option<(NvdResponse, bool)> {
    let windows = pages.len();
    let mut fetched = 0usize;
    let mut all: Vec<NvdVulnerability> = Vec::new();
    for page in pages.into_iter().flatten() {
        fetched += 1;
        all.extend(page.vulnerabilities);
    }
    if fetched == 0 {
        return None;
    }

    let combined = NvdResponse {
        results_per_page,
        start_index: 0,
        total_results: all.len() as u32,
        format: "NVD_CVE".to_string(),
        version: "2.0".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        vulnerabilities: all,
    };
    Some((combined, fetched == windows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CveMetrics, NvdCveItem};

    fn page(ids: &[&str]) -> NvdResponse {
        NvdResponse {
            results_per_page: 100,
            start_index: 0,
            total_results: ids.len() as u32,
            format: "NVD_CVE".to_string(),
            version: "2.0".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            vulnerabilities: ids
                .iter()
                .map(|id| NvdVulnerability {
                    cve: NvdCveItem {
                        id: id.to_string(),
                        source_identifier: None,
                        published: "2024-01-01T00:00:00.000".to_string(),
                        last_modified: "2024-01-01T00:00:00.000".to_string(),
                        vuln_status: None,
                        descriptions: Vec::new(),
                        metrics: CveMetrics::default(),
                        weaknesses: Vec::new(),
                        references: Vec::new(),
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn combine_pages_concatenates_complete_windows() {
        let pages = vec![
            Some(page(&["CVE-2024-0001", "CVE-2024-0002"])),
            Some(page(&["CVE-2024-0003"])),
        ];
        let (combined, complete) = combine_pages(100, pages).unwrap();
        assert!(complete);
        assert_eq!(combined.total_results, 3);
        assert_eq!(combined.vulnerabilities.len(), 3);
        assert_eq!(combined.vulnerabilities[2].cve.id, "CVE-2024-0003");
    }

    #[test]
    fn combine_pages_flags_partial_result() {
        let pages = vec![Some(page(&["CVE-2024-0001"])), None];
        let (combined, complete) = combine_pages(100, pages).unwrap();
        assert!(!complete);
        assert_eq!(combined.total_results, 1);
    }

    #[test]
    fn combine_pages_yields_nothing_when_every_window_fails() {
        assert!(combine_pages(100, vec![None, None, None]).is_none());
    }
}
