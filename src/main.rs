use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use fortune500_dash::apis::{run_scrape, FortuneChinaCrawler};
use fortune500_dash::charts::{format_amount, ChartOptions, ChartRenderer};
use fortune500_dash::cleaner::clean_store;
use fortune500_dash::config::AppConfig;
use fortune500_dash::constants::DEFAULT_CONFIG_PATH;
use fortune500_dash::export::export_visualizations;
use fortune500_dash::server::{self, AppState};
use fortune500_dash::storage::SqliteStore;
use fortune500_dash::{logging, pipeline, NormalizedRecord, SearchFilter};

#[derive(Parser)]
#[command(name = "fortune500_dash")]
#[command(about = "Fortune China 500 scraper, cleaner and dashboard")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the ranking page and append its rows to the database
    Scrape,
    /// Deduplicate the stored rows in place
    Clean,
    /// Run the login + dashboard web server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write the normalized table as CSV plus the three chart images
    Export {
        #[arg(long, default_value = "visualizations")]
        out_dir: PathBuf,
        /// Only include companies or countries matching this text
        #[arg(long)]
        query: Option<String>,
    },
    /// Print the normalized table
    Show {
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

/// Normalized rows, or `None` after printing why there is nothing to show.
fn load_records(store: &SqliteStore, filter: Option<&SearchFilter>) -> Result<Option<Vec<NormalizedRecord>>> {
    match pipeline::load(store, filter) {
        Ok(records) => Ok(Some(records)),
        Err(e) if e.is_data_unavailable() => {
            println!("❌ No usable rows: {} - run `scrape` first", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;

    let _log_guard = logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Scrape => {
            println!("🔄 Scraping {} ...", config.scraper.url);
            let store = SqliteStore::create(&config.storage.db_path)?;
            let crawler = FortuneChinaCrawler::new(&config.scraper)?;
            match run_scrape(&crawler, &store).await {
                Ok(written) => println!("✅ Stored {} rows in {}", written, store.path().display()),
                Err(e) => {
                    error!("Scrape failed: {}", e);
                    println!("❌ Scrape failed: {}", e);
                }
            }
        }
        Commands::Clean => {
            println!("🔨 Cleaning {} ...", config.storage.db_path.display());
            let store = SqliteStore::open(&config.storage.db_path);
            match clean_store(&store) {
                Ok(report) => {
                    println!("\n📊 Cleaning report:");
                    println!("   Rows before:        {}", report.original_rows);
                    println!("   Distinct raw names: {}", report.unique_raw_names);
                    println!("   Duplicate names:    {}", report.duplicate_groups);
                    for (name, count) in &report.top_duplicates {
                        println!("     - {} x{}", name, count);
                    }
                    println!("   Max revenue:        {}", format_amount(report.max_revenue));
                    println!("   Max profit:         {}", format_amount(report.max_profit));
                    println!("   Rows after:         {}", report.cleaned_rows);
                    println!("   Rows removed:       {}", report.removed_rows);
                    println!("   Duplicates left:    {}", report.remaining_duplicate_groups);
                    println!("✅ Cleaning completed");
                }
                Err(e) => {
                    error!("Cleaning failed: {}", e);
                    println!("❌ Cleaning failed: {}", e);
                }
            }
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let addr = config.server.socket_addr()?;
            let state = AppState::from_config(&config);
            info!(users = state.credentials.len(), db = %config.storage.db_path.display(), "starting dashboard");
            println!("🚀 Dashboard at http://{}", addr);
            server::serve(addr, state).await?;
        }
        Commands::Export { out_dir, query } => {
            let store = SqliteStore::open(&config.storage.db_path);
            let filter = query.as_deref().and_then(SearchFilter::parse);
            let Some(records) = load_records(&store, filter.as_ref())? else {
                return Ok(());
            };
            if records.is_empty() {
                println!("❌ No companies match the query");
                return Ok(());
            }
            let renderer = ChartRenderer::new(ChartOptions::from(&config.charts));
            let written = export_visualizations(&records, &renderer, &out_dir)?;
            println!("✅ Exported {} companies:", records.len());
            for path in written {
                println!("   {}", path.display());
            }
        }
        Commands::Show { query, limit } => {
            let store = SqliteStore::open(&config.storage.db_path);
            let filter = query.as_deref().and_then(SearchFilter::parse);
            let Some(records) = load_records(&store, filter.as_ref())? else {
                return Ok(());
            };
            println!("{:>5}  {:<30}  {:>14}  {:>12}  {}", "rank", "company", "revenue", "profit", "country");
            for record in records.iter().take(limit) {
                println!(
                    "{:>5}  {:<30}  {:>14}  {:>12}  {}",
                    record.raw.rank,
                    record.canonical_name,
                    format_amount(record.revenue_value),
                    format_amount(record.profit_value),
                    record.raw.country
                );
            }
            println!("\n{} companies after deduplication", records.len());
        }
    }
    Ok(())
}
