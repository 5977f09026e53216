use serde::{Deserialize, Serialize};

/// The CISA Known Exploited Vulnerabilities catalog, fetched and cached
/// wholesale. Membership checks are linear scans; the catalog holds a few
/// thousand entries so an id index isn't worth carrying at this scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KevCatalog {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub catalog_version: String,
    #[serde(default)]
    pub date_released: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub vulnerabilities: Vec<KevEntry>,
}

impl KevCatalog {
    /// Finds the entry for a CVE id, if the catalog lists it.
    pub fn entry_for(&self, cve_id: &str) -> Option<&KevEntry> {
        self.vulnerabilities.iter().find(|v| v.cve_id == cve_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KevEntry {
    #[serde(rename = "cveID")]
    pub cve_id: String,
    #[serde(default)]
    pub vendor_project: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub vulnerability_name: String,
    #[serde(default)]
    pub date_added: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub required_action: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub known_ransomware_campaign_use: String,
    #[serde(default)]
    pub notes: String,
}
