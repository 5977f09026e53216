//! CVE identifier extraction from uploaded batch files.
//!
//! TXT and CSV content is scanned for the `CVE-\d{4}-\d{4,}` pattern;
//! matches are uppercased and deduplicated preserving first-seen order. The
//! resulting id list is the input contract for bulk lookups. Other formats
//! are rejected with a descriptive error before any upstream call.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::IntelError;

static CVE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CVE-\d{4}-\d{4,}").expect("CVE pattern is valid"));

static CVE_ID_EXACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^CVE-\d{4}-\d{4,}$").expect("CVE pattern is valid"));

/// Whether the string is exactly one well-formed CVE identifier.
pub fn is_valid_cve_id(id: &str) -> bool {
    CVE_ID_EXACT_RE.is_match(id)
}

/// Extracts every CVE identifier from free text, uppercased, deduplicated,
/// in first-seen order.
pub fn extract_cve_ids(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ids = Vec::new();

    for m in CVE_ID_RE.find_iter(text) {
        let id = m.as_str().to_uppercase();
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }

    ids
}

/// Reads a batch file and extracts its CVE identifiers.
///
/// # Errors
///
/// [`IntelError::UnsupportedFormat`] for anything but `.txt`/`.csv`, or
/// [`IntelError::Io`] if the file can't be read.
pub fn parse_file(path: &Path) -> Result<Vec<String>, IntelError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "txt" | "csv" => {
            let content = fs::read_to_string(path)?;
            Ok(extract_cve_ids(&content))
        }
        "" => Err(IntelError::UnsupportedFormat("(no extension)".to_string())),
        other => Err(IntelError::UnsupportedFormat(format!(".{other}"))),
    }
}
