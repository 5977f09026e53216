//! Joins a raw NVD record with its EPSS score and KEV entry into one
//! normalized [`CveReport`].
//!
//! Field extraction falls back per field: the CVSS v3.1 metric's value,
//! then v2's, then score 0 / label "Unknown", so a v3.1 block missing its
//! severity label still borrows v2's. The affected-product list is a heuristic
//! pattern match over the free-text description - approximate by design and
//! never authoritative.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::feeds::{EpssClient, KevClient, NvdClient};
use crate::model::{CveReport, CvssData, CvssMetric, EpssScore, KevEntry, NvdCveItem};

/// Cap on heuristic product matches taken from the description text.
const MAX_PRODUCT_MATCHES: usize = 5;

/// Known vendor tokens followed by a product-name-ish tail.
static PRODUCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:Microsoft|Windows|Oracle|Linux|Apache|Cisco|VMware|Adobe|Google|Apple|IBM|SAP|Dell|HP|Nvidia|Intel|AMD)[\w\s\-\.]+",
    )
    .expect("product regex is valid")
});

/// Source of joined per-CVE details. The production implementation is
/// [`CveJoiner`]; bulk aggregation is generic over this trait so partial
/// failure handling can be exercised with a stub.
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// Returns the joined report, or `None` when the CVE doesn't exist or
    /// the primary source is unavailable.
    async fn details(&self, cve_id: &str) -> Option<CveReport>;
}

/// Joins the three feeds for a single CVE id.
pub struct CveJoiner {
    nvd: Arc<NvdClient>,
    epss: Arc<EpssClient>,
    kev: Arc<KevClient>,
}

impl CveJoiner {
    pub fn new(nvd: Arc<NvdClient>, epss: Arc<EpssClient>, kev: Arc<KevClient>) -> Self {
        Self { nvd, epss, kev }
    }
}

#[async_trait]
impl DetailSource for CveJoiner {
    async fn details(&self, cve_id: &str) -> Option<CveReport> {
        let response = self.nvd.fetch_by_id(cve_id).await?;
        let item = &response.vulnerabilities.first()?.cve;

        let epss_score = self.epss.fetch_score(&item.id).await;
        let catalog = self.kev.fetch_catalog().await;
        let kev_entry = catalog.as_ref().and_then(|c| c.entry_for(&item.id)).cloned();

        let mut report = build_report(item, epss_score.as_ref(), kev_entry);
        report.affected_products =
            extract_affected_products(&report.description, report.kev.as_ref());
        Some(report)
    }
}

fn first_cvss(metrics: &[CvssMetric]) -> Option<&CvssData> {
    metrics.first().map(|m| &m.cvss_data)
}

/// Builds a normalized report from a raw record plus its optional EPSS
/// score and KEV entry. Leaves `affected_products` empty; the single-CVE
/// join path fills it in via [`extract_affected_products`], the analytics
/// path deliberately does not.
pub fn build_report(
    item: &NvdCveItem,
    epss: Option<&EpssScore>,
    kev_entry: Option<KevEntry>,
) -> CveReport {
    let v31 = first_cvss(&item.metrics.cvss_metric_v31);
    let v2 = first_cvss(&item.metrics.cvss_metric_v2);

    let cvss_score = v31.or(v2).map(|d| d.base_score).unwrap_or(0.0);
    let severity = v31
        .and_then(|d| d.base_severity.clone())
        .or_else(|| v2.and_then(|d| d.base_severity.clone()))
        .unwrap_or_else(|| "Unknown".to_string());
    let vector_string = v31
        .and_then(|d| d.vector_string.clone())
        .or_else(|| v2.and_then(|d| d.vector_string.clone()))
        .unwrap_or_default();

    let cwe = item
        .weaknesses
        .first()
        .and_then(|w| w.description.first())
        .map(|d| d.value.clone());

    CveReport {
        id: item.id.clone(),
        description: item.english_description().to_string(),
        published: item.published.clone(),
        last_modified: item.last_modified.clone(),
        cvss_score,
        severity,
        vector_string,
        epss: epss.map(|s| s.epss),
        epss_percentile: epss.map(|s| s.percentile),
        cwe,
        is_kev: kev_entry.is_some(),
        kev: kev_entry,
        references: item.references.clone(),
        affected_products: Vec::new(),
    }
}

/// Best-effort affected-product extraction.
///
/// Scans the description for known vendor tokens (case-insensitive),
/// deduplicates, caps at [`MAX_PRODUCT_MATCHES`], and appends the
/// KEV-supplied vendor/product string when present. Output is noisy and
/// incomplete by nature.
pub fn extract_affected_products(description: &str, kev: Option<&KevEntry>) -> Vec<String> {
    let mut products: Vec<String> = Vec::new();

    for m in PRODUCT_RE.find_iter(description).take(MAX_PRODUCT_MATCHES) {
        let candidate = m.as_str().trim().to_string();
        if !products.iter().any(|p| p.eq_ignore_ascii_case(&candidate)) {
            products.push(candidate);
        }
    }

    if let Some(entry) = kev {
        products.push(format!("{} {}", entry.vendor_project, entry.product));
    }

    products
}
