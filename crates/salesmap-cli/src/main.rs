use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use salesmap_core::{AppConfig, EditHistoryLog, Workspace};
use salesmap_storage::Storage;

#[derive(Debug, Parser)]
#[command(name = "salesmap-cli")]
#[command(about = "Sales-territory map data tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load the dataset, join against the roster, and print match statistics.
    Stats,
    /// Report records excluded from the map and stores without a roster match.
    Validate,
    /// Write the edit history as a spreadsheet-ready CSV file.
    ExportHistory {
        /// Output path, e.g. ./edit_history.csv
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = salesmap_core::load_app_config()?;

    match cli.command {
        Commands::Stats => stats(&config).await,
        Commands::Validate => validate(&config).await,
        Commands::ExportHistory { path } => export_history(&config, &path),
    }
}

async fn load_workspace(config: &AppConfig) -> anyhow::Result<Workspace> {
    let roster = salesmap_core::load_roster(&config.roster_path)?;
    let storage = Storage::from_config(config)?;
    let loaded = storage.load().await?;
    Ok(Workspace::load_and_join(loaded, &roster))
}

async fn stats(config: &AppConfig) -> anyhow::Result<()> {
    let workspace = load_workspace(config).await?;
    let stats = workspace.stats();
    let geo_valid = workspace.geo_records().count();

    println!("records:     {}", stats.total);
    println!(
        "matched:     {} ({:.1}%)",
        stats.matched,
        stats.match_rate() * 100.0
    );
    println!("unmatched:   {}", stats.total - stats.matched);
    println!("geo-valid:   {geo_valid}");
    println!("off-map:     {}", stats.total - geo_valid);

    let facets = workspace.facets();
    println!(
        "facets:      {} branches, {} offices, {} salespeople",
        facets.branches.len(),
        facets.offices.len(),
        facets.salespeople.len()
    );
    Ok(())
}

async fn validate(config: &AppConfig) -> anyhow::Result<()> {
    let workspace = load_workspace(config).await?;

    let mut findings = 0usize;
    for record in workspace.records() {
        let name = &record.store.store_name;
        if !record.store.has_valid_coordinates() {
            println!("off-map (no coordinates): {name}");
            findings += 1;
        }
        if record.sales_info.is_none() {
            let number = record.store.employee_no();
            if number.is_empty() {
                println!("no employee number:       {name}");
            } else {
                println!("no roster match ({number}): {name}");
            }
            findings += 1;
        }
    }

    if findings == 0 {
        println!("dataset is clean: every record maps and joins");
    } else {
        println!("{findings} finding(s)");
    }
    Ok(())
}

fn export_history(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let log = EditHistoryLog::load(&config.history_path, config.history_cap)?;
    std::fs::write(path, log.export_csv()?)?;
    println!("wrote {} history entries to {}", log.len(), path.display());
    Ok(())
}
