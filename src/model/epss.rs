use serde::{Deserialize, Deserializer, Serialize};

/// Response envelope from the FIRST.org EPSS API.
#[derive(Debug, Clone, Deserialize)]
pub struct EpssResponse {
    pub status: String,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub data: Vec<EpssScore>,
}

/// EPSS score for a single CVE: a point-in-time snapshot, not versioned.
///
/// The upstream returns `epss` and `percentile` as numeric strings; the
/// flexible deserializer also accepts plain numbers so cached copies
/// round-trip through JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpssScore {
    pub cve: String,
    /// Probability of exploitation in the next 30 days, in [0, 1].
    #[serde(deserialize_with = "f64_from_string_or_number")]
    pub epss: f64,
    /// Rank against all scored CVEs, in [0, 1].
    #[serde(deserialize_with = "f64_from_string_or_number")]
    pub percentile: f64,
    /// Date the score was calculated.
    #[serde(default)]
    pub date: Option<String>,
}

fn f64_from_string_or_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }

    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_scores() {
        let json = r#"{"cve":"CVE-2024-1234","epss":"0.974320000","percentile":"0.999120000","date":"2024-05-01"}"#;
        let score: EpssScore = serde_json::from_str(json).unwrap();
        assert!((score.epss - 0.97432).abs() < 1e-9);
        assert!((score.percentile - 0.99912).abs() < 1e-9);
    }

    #[test]
    fn round_trips_through_json() {
        let score = EpssScore {
            cve: "CVE-2024-1234".to_string(),
            epss: 0.5,
            percentile: 0.9,
            date: None,
        };
        let value = serde_json::to_value(&score).unwrap();
        let back: EpssScore = serde_json::from_value(value).unwrap();
        assert_eq!(back, score);
    }

    #[test]
    fn rejects_unparseable_score() {
        let json = r#"{"cve":"CVE-2024-1234","epss":"not a number","percentile":"0.5"}"#;
        assert!(serde_json::from_str::<EpssScore>(json).is_err());
    }
}
