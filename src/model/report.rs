use serde::{Deserialize, Serialize};

use super::{CveReference, KevEntry};

/// One CVE merged across NVD, EPSS, and KEV.
///
/// Missing EPSS/KEV/CWE fields are valid, expected outcomes of a degraded
/// fetch, not error states. `is_kev` reflects membership in the catalog as
/// of the last fetch, a point-in-time test rather than history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CveReport {
    pub id: String,
    pub description: String,
    pub published: String,
    pub last_modified: String,
    /// Base severity score, 0-10. v3.1 preferred, v2 fallback, else 0.
    pub cvss_score: f64,
    /// Severity label from the same fallback chain, else "Unknown".
    pub severity: String,
    pub vector_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epss_percentile: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwe: Option<String>,
    pub is_kev: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kev: Option<KevEntry>,
    pub references: Vec<CveReference>,
    /// Heuristic vendor/product matches from the free-text description.
    /// Approximate by construction; never treat as authoritative.
    pub affected_products: Vec<String>,
}

impl CveReport {
    pub fn severity_band(&self) -> SeverityBand {
        SeverityBand::from_score(self.cvss_score)
    }

    /// Publication day (UTC), the `YYYY-MM-DD` prefix of the NVD timestamp.
    pub fn published_day(&self) -> &str {
        self.published.split('T').next().unwrap_or_default()
    }
}

/// Fixed severity buckets over the 0-10 CVSS scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityBand {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityBand {
    pub const ALL: [SeverityBand; 5] = [
        SeverityBand::None,
        SeverityBand::Low,
        SeverityBand::Medium,
        SeverityBand::High,
        SeverityBand::Critical,
    ];

    /// Buckets: None (=0), Low (0,4), Medium [4,7), High [7,9), Critical [9,10].
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 9.0 => SeverityBand::Critical,
            s if s >= 7.0 => SeverityBand::High,
            s if s >= 4.0 => SeverityBand::Medium,
            s if s > 0.0 => SeverityBand::Low,
            _ => SeverityBand::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::None => "None",
            SeverityBand::Low => "Low",
            SeverityBand::Medium => "Medium",
            SeverityBand::High => "High",
            SeverityBand::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Batch statistics derived from a set of [`CveReport`]s. Recomputed from
/// scratch on every query; nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_cves: usize,
    pub avg_cvss: f64,
    pub avg_epss: f64,
    pub kev_count: usize,
    pub top_cvss: Vec<CveReport>,
    pub top_epss: Vec<CveReport>,
    pub cvss_distribution: Vec<SeverityCount>,
    pub cwe_distribution: Vec<CweCount>,
    pub timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub severity: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CweCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub date: String,
    pub count: usize,
    pub avg_cvss: f64,
}

/// Per-item outcome of a bulk lookup. Failures are values, not exceptions,
/// so a batch always yields the full total/succeeded/failed accounting.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOutcome {
    Fetched(CveReport),
    Failed { cve_id: String, reason: String },
}

/// Result of a bulk lookup with partial-failure accounting. One item's
/// failure never discards its siblings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub reports: Vec<CveReport>,
    pub errors: Vec<BulkError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkError {
    pub cve_id: String,
    pub reason: String,
}

impl BulkReport {
    pub fn from_outcomes(outcomes: Vec<BulkOutcome>) -> Self {
        let total = outcomes.len();
        let mut reports = Vec::new();
        let mut errors = Vec::new();

        for outcome in outcomes {
            match outcome {
                BulkOutcome::Fetched(report) => reports.push(report),
                BulkOutcome::Failed { cve_id, reason } => {
                    errors.push(BulkError { cve_id, reason })
                }
            }
        }

        Self {
            total,
            succeeded: reports.len(),
            failed: errors.len(),
            reports,
            errors,
        }
    }
}

/// Autocomplete hit: an id plus a truncated description preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub description: String,
}
