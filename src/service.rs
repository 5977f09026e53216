//! The downstream surface of the aggregation layer.
//!
//! [`CveService`] wires the three feed clients, the shared cache, and the
//! NVD rate limiter together, and exposes the operations the UI/API layer
//! consumes: single detail, bulk detail with partial-failure accounting,
//! autocomplete, and analytics.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::analytics::summarize_reports;
use crate::cache::Cache;
use crate::config::Config;
use crate::daterange::lookback_range;
use crate::enrich::{build_report, CveJoiner, DetailSource};
use crate::error::IntelError;
use crate::feeds::{EpssClient, KevClient, NvdClient};
use crate::ingest::is_valid_cve_id;
use crate::model::{AnalyticsSummary, BulkOutcome, BulkReport, CveReport, Suggestion};
use crate::ratelimit::{RateLimiter, NVD_MIN_INTERVAL};

/// Cap on ids per bulk request. With a cold cache each NVD lookup costs a
/// 6-second limiter slot, so 50 uncached ids already run about five minutes.
pub const MAX_BULK_IDS: usize = 50;

/// Queries shorter than this return an empty suggestion list without
/// touching the upstream.
pub const MIN_AUTOCOMPLETE_LEN: usize = 3;

const SUGGESTION_PAGE: u32 = 10;
const SUGGESTION_PREVIEW_CHARS: usize = 100;

/// Aggregates the three vulnerability feeds behind one interface.
pub struct CveService {
    nvd: Arc<NvdClient>,
    epss: Arc<EpssClient>,
    kev: Arc<KevClient>,
    joiner: CveJoiner,
    results_per_page: u32,
}

impl CveService {
    /// Builds the service from configuration: one shared cache, one NVD
    /// rate limiter, three clients.
    pub fn new(config: &Config) -> Self {
        let cache = Arc::new(Cache::with_ttl_hours(config.cache_ttl_hours));
        let limiter = Arc::new(RateLimiter::new(NVD_MIN_INTERVAL));

        let nvd = Arc::new(NvdClient::new(
            cache.clone(),
            limiter,
            config.nvd_api_key(),
        ));
        let epss = Arc::new(EpssClient::new(cache.clone()));
        let kev = Arc::new(KevClient::new(cache));

        let joiner = CveJoiner::new(nvd.clone(), epss.clone(), kev.clone());

        Self {
            nvd,
            epss,
            kev,
            joiner,
            results_per_page: config.results_per_page,
        }
    }

    /// Joined detail for one CVE. `Ok(None)` means not found or upstream
    /// unavailable; a malformed id is rejected before any upstream call.
    pub async fn details(&self, cve_id: &str) -> Result<Option<CveReport>, IntelError> {
        let cve_id = cve_id.trim();
        if !is_valid_cve_id(cve_id) {
            return Err(IntelError::InvalidCveId(cve_id.to_string()));
        }
        Ok(self.joiner.details(&cve_id.to_uppercase()).await)
    }

    /// Bulk detail lookup with per-item accounting. Rejects requests over
    /// [`MAX_BULK_IDS`] before any upstream call; individual malformed or
    /// missing ids become per-item failures, never a whole-batch error.
    pub async fn bulk(&self, cve_ids: &[String]) -> Result<BulkReport, IntelError> {
        if cve_ids.len() > MAX_BULK_IDS {
            return Err(IntelError::TooManyIds {
                given: cve_ids.len(),
                max: MAX_BULK_IDS,
            });
        }
        Ok(bulk_details(&self.joiner, cve_ids).await)
    }

    /// Suggestion list for a partial keyword. Sub-3-character queries yield
    /// an empty list without an upstream call.
    pub async fn autocomplete(&self, query: &str) -> Vec<Suggestion> {
        let query = query.trim();
        if query.chars().count() < MIN_AUTOCOMPLETE_LEN {
            return Vec::new();
        }

        let Some(response) = self.nvd.search(query, SUGGESTION_PAGE).await else {
            return Vec::new();
        };

        response
            .vulnerabilities
            .iter()
            .map(|v| Suggestion {
                id: v.cve.id.clone(),
                description: truncate(v.cve.english_description(), SUGGESTION_PREVIEW_CHARS),
            })
            .collect()
    }

    /// Analytics over a keyword and a lookback window in months.
    ///
    /// Unlike the single-CVE path this batches the EPSS lookup across all
    /// hits in one call and fetches the KEV catalog once, keeping the NVD
    /// limiter the only pacing constraint. Zero hits (or an unavailable
    /// upstream) yields the empty summary rather than an error.
    pub async fn summarize(&self, keyword: &str, months: u32) -> AnalyticsSummary {
        let (start, end) = lookback_range(months);
        debug!(keyword, months, %start, %end, "running analytics query");

        let Some(response) = self
            .nvd
            .search_date_range(keyword, start, end, self.results_per_page)
            .await
        else {
            return AnalyticsSummary::default();
        };
        if response.vulnerabilities.is_empty() {
            return AnalyticsSummary::default();
        }

        let ids: Vec<String> = response
            .vulnerabilities
            .iter()
            .map(|v| v.cve.id.clone())
            .collect();
        let scores = self.epss.fetch_scores(&ids).await;
        let catalog = self.kev.fetch_catalog().await;

        let reports: Vec<CveReport> = response
            .vulnerabilities
            .iter()
            .map(|v| {
                let kev_entry = catalog
                    .as_ref()
                    .and_then(|c| c.entry_for(&v.cve.id))
                    .cloned();
                build_report(&v.cve, scores.get(&v.cve.id), kev_entry)
            })
            .collect();

        summarize_reports(&reports)
    }
}

/// Runs per-id joins concurrently and collects every outcome.
///
/// Each id is validated first; invalid ids fail with a distinct reason and
/// never reach the network. Join failures (not found, upstream down) fail
/// only their own item. Apparent concurrency notwithstanding, uncached NVD
/// lookups still serialize through the shared rate limiter.
pub async fn bulk_details<S: DetailSource + ?Sized>(
    source: &S,
    cve_ids: &[String],
) -> BulkReport {
    let lookups = cve_ids.iter().map(|raw| async move {
        let trimmed = raw.trim();
        if !is_valid_cve_id(trimmed) {
            return BulkOutcome::Failed {
                cve_id: raw.clone(),
                reason: "invalid CVE identifier".to_string(),
            };
        }

        let id = trimmed.to_uppercase();
        match source.details(&id).await {
            Some(report) => BulkOutcome::Fetched(report),
            None => BulkOutcome::Failed {
                cve_id: id,
                reason: "not found".to_string(),
            },
        }
    });

    BulkReport::from_outcomes(join_all(lookups).await)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut preview: String = text.chars().take(max_chars).collect();
        preview.push_str("...");
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Detail source backed by a fixed map, standing in for the joiner.
    struct FixedSource {
        reports: HashMap<String, CveReport>,
    }

    #[async_trait]
    impl DetailSource for FixedSource {
        async fn details(&self, cve_id: &str) -> Option<CveReport> {
            self.reports.get(cve_id).cloned()
        }
    }

    fn report(id: &str) -> CveReport {
        CveReport {
            id: id.to_string(),
            description: String::new(),
            published: String::new(),
            last_modified: String::new(),
            cvss_score: 7.5,
            severity: "HIGH".to_string(),
            vector_string: String::new(),
            epss: None,
            epss_percentile: None,
            cwe: None,
            is_kev: false,
            kev: None,
            references: Vec::new(),
            affected_products: Vec::new(),
        }
    }

    #[tokio::test]
    async fn bulk_collects_partial_failures() {
        let source = FixedSource {
            reports: HashMap::from([("CVE-2024-0001".to_string(), report("CVE-2024-0001"))]),
        };
        let ids = vec![
            "CVE-2024-0001".to_string(),
            "garbage-id".to_string(),
            "CVE-2024-9999".to_string(),
        ];

        let bulk = bulk_details(&source, &ids).await;

        assert_eq!(bulk.total, 3);
        assert_eq!(bulk.succeeded, 1);
        assert_eq!(bulk.failed, 2);
        assert_eq!(bulk.reports[0].id, "CVE-2024-0001");

        let reasons: HashMap<&str, &str> = bulk
            .errors
            .iter()
            .map(|e| (e.cve_id.as_str(), e.reason.as_str()))
            .collect();
        assert_eq!(reasons["garbage-id"], "invalid CVE identifier");
        assert_eq!(reasons["CVE-2024-9999"], "not found");
    }

    #[tokio::test]
    async fn bulk_normalizes_case_before_lookup() {
        let source = FixedSource {
            reports: HashMap::from([("CVE-2024-0001".to_string(), report("CVE-2024-0001"))]),
        };
        let bulk = bulk_details(&source, &["cve-2024-0001".to_string()]).await;
        assert_eq!(bulk.succeeded, 1);
    }

    #[tokio::test]
    async fn bulk_of_empty_list_is_empty_report() {
        let source = FixedSource {
            reports: HashMap::new(),
        };
        let bulk = bulk_details(&source, &[]).await;
        assert_eq!(bulk.total, 0);
        assert_eq!(bulk.succeeded, 0);
        assert_eq!(bulk.failed, 0);
    }

    #[tokio::test]
    async fn oversized_bulk_is_rejected_up_front() {
        let service = CveService::new(&Config::default());
        let ids: Vec<String> = (0..51).map(|i| format!("CVE-2024-{i:04}")).collect();
        match service.bulk(&ids).await {
            Err(IntelError::TooManyIds { given, max }) => {
                assert_eq!(given, 51);
                assert_eq!(max, MAX_BULK_IDS);
            }
            other => panic!("expected TooManyIds, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_detail_id_is_rejected_up_front() {
        let service = CveService::new(&Config::default());
        match service.details("not-a-cve").await {
            Err(IntelError::InvalidCveId(id)) => assert_eq!(id, "not-a-cve"),
            other => panic!("expected InvalidCveId, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn short_autocomplete_query_skips_upstream() {
        let service = CveService::new(&Config::default());
        assert!(service.autocomplete("ab").await.is_empty());
        assert!(service.autocomplete("  a  ").await.is_empty());
    }

    #[test]
    fn truncate_preserves_short_text() {
        assert_eq!(truncate("short", 100), "short");
        let long = "x".repeat(150);
        let preview = truncate(&long, 100);
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
    }
}
