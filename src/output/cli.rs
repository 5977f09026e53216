use tabled::{settings::Style, Table, Tabled};

use crate::model::{AnalyticsSummary, BulkReport, CveReport, Suggestion};

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "CVE")]
    id: String,
    #[tabled(rename = "CVSS")]
    cvss: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "EPSS")]
    epss: String,
    #[tabled(rename = "KEV")]
    kev: String,
    #[tabled(rename = "Published")]
    published: String,
}

impl ReportRow {
    fn from_report(report: &CveReport) -> Self {
        Self {
            id: report.id.clone(),
            cvss: format!("{:.1}", report.cvss_score),
            severity: report.severity.clone(),
            epss: report
                .epss
                .map(|e| format!("{:.3}", e))
                .unwrap_or_else(|| "-".to_string()),
            kev: if report.is_kev { "yes" } else { "no" }.to_string(),
            published: report.published_day().to_string(),
        }
    }
}

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "CVE")]
    cve_id: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Count")]
    count: usize,
}

#[derive(Tabled)]
struct TimelineRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "CVEs")]
    count: usize,
    #[tabled(rename = "Avg CVSS")]
    avg_cvss: String,
}

pub fn print_report_table(report: &CveReport) {
    println!();
    println!("{}", report.id);
    println!();
    println!("  CVSS:      {:.1} ({})", report.cvss_score, report.severity);
    if !report.vector_string.is_empty() {
        println!("  Vector:    {}", report.vector_string);
    }
    match (report.epss, report.epss_percentile) {
        (Some(epss), Some(pct)) => {
            println!("  EPSS:      {:.3} (percentile {:.3})", epss, pct)
        }
        _ => println!("  EPSS:      no score"),
    }
    if let Some(cwe) = &report.cwe {
        println!("  CWE:       {}", cwe);
    }
    println!("  Published: {}", report.published);
    println!("  Modified:  {}", report.last_modified);

    if let Some(kev) = &report.kev {
        println!();
        println!("  In CISA KEV catalog (added {}):", kev.date_added);
        println!("    {} {} - {}", kev.vendor_project, kev.product, kev.vulnerability_name);
        println!("    Required action: {}", kev.required_action);
        println!("    Due date: {}, ransomware use: {}", kev.due_date, kev.known_ransomware_campaign_use);
    }

    if !report.description.is_empty() {
        println!();
        println!("  {}", report.description);
    }

    if !report.affected_products.is_empty() {
        println!();
        println!("  Possibly affected (approximate, from description text):");
        for product in &report.affected_products {
            println!("    - {}", product);
        }
    }

    if !report.references.is_empty() {
        println!();
        println!("  References:");
        for reference in &report.references {
            println!("    {}", reference.url);
        }
    }
    println!();
}

pub fn print_bulk_table(bulk: &BulkReport) {
    println!();
    println!(
        "Processed {} CVEs: {} succeeded, {} failed",
        bulk.total, bulk.succeeded, bulk.failed
    );

    if !bulk.reports.is_empty() {
        println!();
        let rows: Vec<ReportRow> = bulk.reports.iter().map(ReportRow::from_report).collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    if !bulk.errors.is_empty() {
        println!();
        println!("Failures:");
        let rows: Vec<ErrorRow> = bulk
            .errors
            .iter()
            .map(|e| ErrorRow {
                cve_id: e.cve_id.clone(),
                reason: e.reason.clone(),
            })
            .collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }
}

pub fn print_suggestions(suggestions: &[Suggestion]) {
    if suggestions.is_empty() {
        println!("No matches.");
        return;
    }
    for suggestion in suggestions {
        println!("{}  {}", suggestion.id, suggestion.description);
    }
}

pub fn print_summary_table(summary: &AnalyticsSummary) {
    println!();
    println!("Total CVEs: {}", summary.total_cves);
    println!("Average CVSS: {:.1}", summary.avg_cvss);
    println!("Average EPSS: {:.3}", summary.avg_epss);
    println!("In KEV catalog: {}", summary.kev_count);

    if !summary.cvss_distribution.is_empty() {
        println!();
        println!("Severity distribution:");
        let rows: Vec<CountRow> = summary
            .cvss_distribution
            .iter()
            .map(|d| CountRow {
                name: d.severity.clone(),
                count: d.count,
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if !summary.cwe_distribution.is_empty() {
        println!();
        println!("Top weaknesses:");
        let rows: Vec<CountRow> = summary
            .cwe_distribution
            .iter()
            .map(|d| CountRow {
                name: d.name.clone(),
                count: d.count,
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if !summary.top_cvss.is_empty() {
        println!();
        println!("Top by CVSS:");
        let rows: Vec<ReportRow> = summary.top_cvss.iter().map(ReportRow::from_report).collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if !summary.top_epss.is_empty() {
        println!();
        println!("Top by EPSS:");
        let rows: Vec<ReportRow> = summary.top_epss.iter().map(ReportRow::from_report).collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if !summary.timeline.is_empty() {
        println!();
        println!("Timeline:");
        let rows: Vec<TimelineRow> = summary
            .timeline
            .iter()
            .map(|t| TimelineRow {
                date: t.date.clone(),
                count: t.count,
                avg_cvss: format!("{:.1}", t.avg_cvss),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }
    println!();
}
