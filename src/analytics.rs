//! Reduces a batch of joined CVE reports into summary statistics.
//!
//! Pure over its input: the same batch always produces the same summary, so
//! repeated analytics queries inside the cache TTL are idempotent. All
//! output orderings are deterministic (ties broken by name/date).

use std::collections::BTreeMap;

use crate::model::{
    AnalyticsSummary, CveReport, CweCount, SeverityBand, SeverityCount, TimelinePoint,
};

const TOP_N: usize = 10;
const CWE_TOP_N: usize = 10;

/// Reduces reports into an [`AnalyticsSummary`]. An empty batch yields the
/// all-zero/empty summary.
pub fn summarize_reports(reports: &[CveReport]) -> AnalyticsSummary {
    if reports.is_empty() {
        return AnalyticsSummary::default();
    }

    // Means exclude absent values: severity over scored records only, EPSS
    // over records that have a score at all.
    let scored: Vec<f64> = reports
        .iter()
        .map(|r| r.cvss_score)
        .filter(|s| *s > 0.0)
        .collect();
    let avg_cvss = round_to(mean(&scored), 10.0);

    let epss_values: Vec<f64> = reports.iter().filter_map(|r| r.epss).collect();
    let avg_epss = round_to(mean(&epss_values), 1000.0);

    let kev_count = reports.iter().filter(|r| r.is_kev).count();

    let mut top_cvss = reports.to_vec();
    top_cvss.sort_by(|a, b| {
        b.cvss_score
            .partial_cmp(&a.cvss_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top_cvss.truncate(TOP_N);

    let mut top_epss: Vec<CveReport> = reports
        .iter()
        .filter(|r| r.epss.is_some())
        .cloned()
        .collect();
    top_epss.sort_by(|a, b| {
        b.epss
            .partial_cmp(&a.epss)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top_epss.truncate(TOP_N);

    let cvss_distribution = severity_distribution(reports);
    let cwe_distribution = cwe_distribution(reports);
    let timeline = timeline(reports);

    AnalyticsSummary {
        total_cves: reports.len(),
        avg_cvss,
        avg_epss,
        kev_count,
        top_cvss,
        top_epss,
        cvss_distribution,
        cwe_distribution,
        timeline,
    }
}

/// Counts per severity band in fixed band order; zero-count bands omitted.
fn severity_distribution(reports: &[CveReport]) -> Vec<SeverityCount> {
    SeverityBand::ALL
        .iter()
        .map(|band| SeverityCount {
            severity: band.as_str().to_string(),
            count: reports
                .iter()
                .filter(|r| r.severity_band() == *band)
                .count(),
        })
        .filter(|d| d.count > 0)
        .collect()
}

/// Frequency of the first-listed weakness per record, "Unknown" for
/// unclassified records, top ten by count.
fn cwe_distribution(reports: &[CveReport]) -> Vec<CweCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for report in reports {
        let name = report.cwe.as_deref().unwrap_or("Unknown");
        *counts.entry(name).or_insert(0) += 1;
    }

    let mut distribution: Vec<CweCount> = counts
        .into_iter()
        .map(|(name, count)| CweCount {
            name: name.to_string(),
            count,
        })
        .collect();
    // BTreeMap iteration gives the name tiebreak; only count needs ordering
    distribution.sort_by(|a, b| b.count.cmp(&a.count));
    distribution.truncate(CWE_TOP_N);
    distribution
}

/// Per-publication-day (count, mean severity), ascending by date.
fn timeline(reports: &[CveReport]) -> Vec<TimelinePoint> {
    let mut days: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for report in reports {
        let entry = days.entry(report.published_day().to_string()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += report.cvss_score;
    }

    days.into_iter()
        .map(|(date, (count, total))| TimelinePoint {
            date,
            count,
            avg_cvss: total / count as f64,
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, score: f64) -> CveReport {
        CveReport {
            id: id.to_string(),
            description: String::new(),
            published: "2024-03-15T10:15:00.000".to_string(),
            last_modified: String::new(),
            cvss_score: score,
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

    #[test]
    fn empty_batch_yields_empty_summary() {
        let summary = summarize_reports(&[]);
        assert_eq!(summary, AnalyticsSummary::default());
        assert_eq!(summary.total_cves, 0);
        assert_eq!(summary.avg_cvss, 0.0);
    }

    #[test]
    fn histogram_buckets_by_fixed_thresholds() {
        let reports: Vec<CveReport> = [0.0, 3.9, 4.0, 6.9, 7.0, 8.9, 9.0, 10.0]
            .iter()
            .enumerate()
            .map(|(i, s)| report(&format!("CVE-2024-{i:04}"), *s))
            .collect();

        let summary = summarize_reports(&reports);
        let counts: Vec<(&str, usize)> = summary
            .cvss_distribution
            .iter()
            .map(|d| (d.severity.as_str(), d.count))
            .collect();

        assert_eq!(
            counts,
            vec![
                ("None", 1),
                ("Low", 1),
                ("Medium", 2),
                ("High", 2),
                ("Critical", 2)
            ]
        );
    }

    #[test]
    fn zero_count_buckets_are_omitted() {
        let reports = vec![report("CVE-2024-0001", 9.5)];
        let summary = summarize_reports(&reports);
        assert_eq!(summary.cvss_distribution.len(), 1);
        assert_eq!(summary.cvss_distribution[0].severity, "Critical");
    }

    #[test]
    fn mean_severity_excludes_unscored_records() {
        let reports = vec![
            report("CVE-2024-0001", 8.0),
            report("CVE-2024-0002", 4.0),
            report("CVE-2024-0003", 0.0),
        ];
        let summary = summarize_reports(&reports);
        assert_eq!(summary.avg_cvss, 6.0);
    }

    #[test]
    fn mean_epss_excludes_absent_scores() {
        let mut a = report("CVE-2024-0001", 5.0);
        a.epss = Some(0.2);
        let mut b = report("CVE-2024-0002", 5.0);
        b.epss = Some(0.4);
        let c = report("CVE-2024-0003", 5.0);

        let summary = summarize_reports(&[a, b, c]);
        assert_eq!(summary.avg_epss, 0.3);
    }

    #[test]
    fn top_epss_excludes_unscored_records() {
        let mut a = report("CVE-2024-0001", 5.0);
        a.epss = Some(0.2);
        let b = report("CVE-2024-0002", 9.0);

        let summary = summarize_reports(&[a, b]);
        assert_eq!(summary.top_epss.len(), 1);
        assert_eq!(summary.top_epss[0].id, "CVE-2024-0001");
    }

    #[test]
    fn top_cvss_is_descending_and_capped() {
        let reports: Vec<CveReport> = (0..15)
            .map(|i| report(&format!("CVE-2024-{i:04}"), i as f64 / 2.0))
            .collect();
        let summary = summarize_reports(&reports);
        assert_eq!(summary.top_cvss.len(), 10);
        for pair in summary.top_cvss.windows(2) {
            assert!(pair[0].cvss_score >= pair[1].cvss_score);
        }
    }

    #[test]
    fn cwe_distribution_defaults_to_unknown_bucket() {
        let mut a = report("CVE-2024-0001", 5.0);
        a.cwe = Some("CWE-79".to_string());
        let mut b = report("CVE-2024-0002", 5.0);
        b.cwe = Some("CWE-79".to_string());
        let c = report("CVE-2024-0003", 5.0);

        let summary = summarize_reports(&[a, b, c]);
        assert_eq!(summary.cwe_distribution[0].name, "CWE-79");
        assert_eq!(summary.cwe_distribution[0].count, 2);
        assert!(summary
            .cwe_distribution
            .iter()
            .any(|d| d.name == "Unknown" && d.count == 1));
    }

    #[test]
    fn timeline_groups_by_publication_day() {
        let mut a = report("CVE-2024-0001", 8.0);
        a.published = "2024-03-15T10:00:00.000".to_string();
        let mut b = report("CVE-2024-0002", 4.0);
        b.published = "2024-03-15T22:00:00.000".to_string();
        let mut c = report("CVE-2024-0003", 6.0);
        c.published = "2024-03-14T01:00:00.000".to_string();

        let summary = summarize_reports(&[a, b, c]);
        assert_eq!(summary.timeline.len(), 2);
        assert_eq!(summary.timeline[0].date, "2024-03-14");
        assert_eq!(summary.timeline[0].count, 1);
        assert_eq!(summary.timeline[1].date, "2024-03-15");
        assert_eq!(summary.timeline[1].count, 2);
        assert_eq!(summary.timeline[1].avg_cvss, 6.0);
    }

    #[test]
    fn identical_input_produces_identical_summary() {
        let mut reports = Vec::new();
        for i in 0..20 {
            let mut r = report(&format!("CVE-2024-{i:04}"), (i % 10) as f64);
            r.cwe = Some(format!("CWE-{}", i % 3));
            r.epss = if i % 2 == 0 { Some(0.1 * (i % 5) as f64) } else { None };
            reports.push(r);
        }
        assert_eq!(summarize_reports(&reports), summarize_reports(&reports));
    }

    #[test]
    fn kev_count_tallies_membership() {
        let mut a = report("CVE-2024-0001", 5.0);
        a.is_kev = true;
        let b = report("CVE-2024-0002", 5.0);
        let summary = summarize_reports(&[a, b]);
        assert_eq!(summary.kev_count, 1);
    }
}
