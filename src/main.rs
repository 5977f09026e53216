use anyhow::Result;
use clap::{Parser, Subcommand};
use cveintel::{
    config::Config,
    ingest,
    output::{
        print_bulk_table, print_json, print_report_table, print_suggestions,
        print_summary_table, OutputFormat,
    },
    CveService,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cveintel")]
#[command(
    author,
    version,
    about = "Aggregate NVD, EPSS, and CISA KEV intelligence per CVE"
)]
struct Cli {
    /// Output format (table, json)
    #[arg(short, long, global = true)]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a single CVE across all three feeds
    Lookup {
        /// CVE identifier (e.g., CVE-2021-44228)
        cve_id: String,
    },

    /// Look up a batch of CVEs with per-item success/failure accounting
    Bulk {
        /// CVE identifiers
        cve_ids: Vec<String>,

        /// Read identifiers from a TXT or CSV file instead
        #[arg(long, conflicts_with = "cve_ids")]
        file: Option<PathBuf>,
    },

    /// Keyword search returning id + description suggestions
    Search {
        /// Partial keyword, at least 3 characters
        query: String,
    },

    /// Summary statistics for a keyword over a lookback window
    Analytics {
        /// Search keyword
        #[arg(short, long)]
        keyword: Option<String>,

        /// Lookback window in months
        #[arg(short, long)]
        months: Option<u32>,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    let format_str = cli.format.clone().unwrap_or(config.default_format.clone());
    let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Lookup { cve_id } => {
            let service = CveService::new(&config);
            match service.details(&cve_id).await? {
                Some(report) => match format {
                    OutputFormat::Table => print_report_table(&report),
                    OutputFormat::Json => print_json(&report)?,
                },
                None => anyhow::bail!("{} not found", cve_id.to_uppercase()),
            }
        }

        Commands::Bulk { cve_ids, file } => {
            let ids = match file {
                Some(path) => ingest::parse_file(&path)?,
                None => cve_ids,
            };
            if ids.is_empty() {
                anyhow::bail!("no CVE identifiers given");
            }

            let service = CveService::new(&config);
            let progress = bulk_progress(&format, ids.len());
            let bulk = service.bulk(&ids).await?;
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }

            match format {
                OutputFormat::Table => print_bulk_table(&bulk),
                OutputFormat::Json => print_json(&bulk)?,
            }
        }

        Commands::Search { query } => {
            let service = CveService::new(&config);
            let suggestions = service.autocomplete(&query).await;
            match format {
                OutputFormat::Table => print_suggestions(&suggestions),
                OutputFormat::Json => print_json(&suggestions)?,
            }
        }

        Commands::Analytics { keyword, months } => {
            let keyword = keyword.unwrap_or(config.default_keyword.clone());
            let months = months.unwrap_or(config.default_months);

            let service = CveService::new(&config);
            let progress = spinner(&format, format!("Summarizing \"{}\"...", keyword));
            let summary = service.summarize(&keyword, months).await;
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }

            match format {
                OutputFormat::Table => print_summary_table(&summary),
                OutputFormat::Json => print_json(&summary)?,
            }
        }

        Commands::Config { init, path } => handle_config(init, path)?,
    }

    Ok(())
}

/// Spinner for bulk fetches: uncached lookups serialize through the 6-second
/// NVD limit, so a large batch takes minutes and needs visible feedback.
fn bulk_progress(format: &OutputFormat, count: usize) -> Option<ProgressBar> {
    spinner(
        format,
        format!(
            "Fetching {} CVEs (NVD allows one request every 6s; uncached batches are slow)...",
            count
        ),
    )
}

fn spinner(format: &OutputFormat, message: String) -> Option<ProgressBar> {
    if *format != OutputFormat::Table {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Some(pb)
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'cveintel config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
