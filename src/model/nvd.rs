use serde::{Deserialize, Serialize};

/// Top-level response from the NVD CVE API 2.0.
///
/// For chunked date-range searches the aggregation layer synthesizes one of
/// these from several upstream pages; `total_results` is then the
/// concatenated length rather than the upstream-reported total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NvdResponse {
    pub results_per_page: u32,
    pub start_index: u32,
    pub total_results: u32,
    pub format: String,
    pub version: String,
    pub timestamp: String,
    #[serde(default)]
    pub vulnerabilities: Vec<NvdVulnerability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NvdVulnerability {
    pub cve: NvdCveItem,
}

/// A single CVE record as returned by NVD. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NvdCveItem {
    pub id: String,
    #[serde(default)]
    pub source_identifier: Option<String>,
    pub published: String,
    pub last_modified: String,
    #[serde(default)]
    pub vuln_status: Option<String>,
    #[serde(default)]
    pub descriptions: Vec<LangValue>,
    #[serde(default)]
    pub metrics: CveMetrics,
    #[serde(default)]
    pub weaknesses: Vec<CveWeakness>,
    #[serde(default)]
    pub references: Vec<CveReference>,
}

impl NvdCveItem {
    /// The English description, or empty when none is present.
    pub fn english_description(&self) -> &str {
        self.descriptions
            .iter()
            .find(|d| d.lang == "en")
            .map(|d| d.value.as_str())
            .unwrap_or("")
    }
}

/// Language-tagged free text, used for descriptions and weakness labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangValue {
    pub lang: String,
    pub value: String,
}

/// Nested CVSS metrics. v3.1 is preferred, v2 is the fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CveMetrics {
    #[serde(default, rename = "cvssMetricV31")]
    pub cvss_metric_v31: Vec<CvssMetric>,
    #[serde(default, rename = "cvssMetricV2")]
    pub cvss_metric_v2: Vec<CvssMetric>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvssMetric {
    pub cvss_data: CvssData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvssData {
    #[serde(default)]
    pub base_score: f64,
    #[serde(default)]
    pub base_severity: Option<String>,
    #[serde(default)]
    pub vector_string: Option<String>,
}

/// CWE classification. The first description value is the CWE code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CveWeakness {
    #[serde(default)]
    pub description: Vec<LangValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CveReference {
    pub url: String,
    #[serde(default)]
    pub source: Option<String>,
}
