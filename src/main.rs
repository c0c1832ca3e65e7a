// Entry point: loads a facility-status snapshot and prints the dashboard
// views (headline figures, per-type progress, rollout table, change log).
mod changelog;
mod config;
mod error;
mod loader;
mod output;
mod summary;
mod types;
mod util;

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use config::DashboardConfig;
use loader::SnapshotTable;
use types::FacilityType;

#[derive(Parser)]
#[command(name = "facility-dashboard")]
#[command(about = "Facility electrification progress dashboard", long_about = None)]
struct Cli {
    /// Snapshot file (.csv, .tsv, .txt, .xlsx, .xlsm, .xls, .ods)
    #[arg(long, default_value = "data/facilities_summary_by_date_status_type.csv")]
    data: PathBuf,
    /// JSON file with targets, dashboard facility types and titles
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline figures and progress for every dashboard facility type
    Overview {
        #[arg(long)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Progress summary for a single facility type
    Summary {
        #[arg(long = "type", default_value = "Total")]
        facility_type: String,
        #[arg(long)]
        json: bool,
    },
    /// Date x status rollout table for stacked charts
    Rollout {
        #[arg(long = "type", default_value = "Total")]
        facility_type: String,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Emit the target and long-format (date, status, n_facilities) points as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare status counts between two snapshot dates
    ChangeLog {
        #[arg(long)]
        previous: Option<NaiveDate>,
        #[arg(long)]
        current: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// List snapshot dates and facility types present in the data
    Dates,
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG takes precedence, fallback to info
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DashboardConfig::from_path(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    let (table, report) = loader::load(&cli.data)
        .with_context(|| format!("failed to load snapshot {}", cli.data.display()))?;
    let skipped = report.total_rows - report.kept_rows;
    if skipped > 0 {
        tracing::warn!(skipped, "rows skipped due to unparseable date, status or format");
    }
    if table.is_empty() {
        tracing::warn!("snapshot has no usable rows; every figure will be zero");
    }

    match cli.command {
        Commands::Overview { json, out } => run_overview(&table, &config, json, out)?,
        Commands::Summary { facility_type, json } => {
            let selection = FacilityType::parse(&facility_type);
            let mut s = summary::extract_facility_summary(&table, &selection, &config.targets);
            s.title = config.title_for(&selection);
            if json {
                println!("{}", output::to_json(&s)?);
            } else {
                println!("{} (as of {})\n", s.title, as_of_label(&table));
                output::preview_table_rows(&output::summary_rows(&[s]), 1);
            }
        }
        Commands::Rollout {
            facility_type,
            out,
            json,
        } => {
            let selection = FacilityType::parse(&facility_type);
            let matrix = summary::StatusMatrix::build(&table, &selection);
            let target = config.targets.lookup(&selection);
            if json {
                println!("{}", output::to_json(&matrix.chart(target))?);
                return Ok(());
            }
            let rows = matrix.rows(target);
            println!("Facility Rollout Progress: {}\n", config.title_for(&selection));
            output::preview_table_rows(&rows, rows.len());
            if let Some(path) = out {
                output::write_csv(&path, &rows)
                    .map_err(|e| anyhow!("failed to write {}: {}", path.display(), e))?;
                println!("(Full table exported to {})", path.display());
            }
        }
        Commands::ChangeLog {
            previous,
            current,
            json,
        } => run_change_log(&table, previous, current, json)?,
        Commands::Dates => {
            println!("Snapshot dates:");
            for d in table.dates() {
                println!("- {} ({})", util::iso_date(d), util::friendly_date(d));
            }
            println!("\nFacility types:");
            for t in table.facility_types() {
                println!("- {}", t);
            }
        }
    }

    Ok(())
}

fn as_of_label(table: &SnapshotTable) -> String {
    table
        .latest_date()
        .map(|d| d.format("%B %d, %Y").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn run_overview(
    table: &SnapshotTable,
    config: &DashboardConfig,
    json: bool,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let stats = summary::overall_statistics(table, &config.targets);
    let summaries = summary::extract_all_facility_summaries(table, config);

    if json {
        let payload = serde_json::json!({ "overall": stats, "facilities": summaries });
        println!("{}", output::to_json(&payload)?);
        return Ok(());
    }

    println!("Data as of: {}\n", as_of_label(table));
    println!(
        "Facilities Energized / Target: {} / {}",
        util::format_int(stats.energized_facilities),
        util::format_int(stats.target)
    );
    println!(
        "Total Beneficiaries: {} ({} female, {} male)",
        util::format_number(stats.total_beneficiaries, 0),
        util::format_number(stats.female_beneficiaries, 0),
        util::format_number(stats.male_beneficiaries, 0)
    );
    println!(
        "Installed Solar Capacity (kW): {}",
        util::format_number(stats.solar_capacity_kw, 1)
    );
    println!(
        "Installed Battery Capacity (kWh): {}\n",
        util::format_number(stats.storage_capacity_kwh, 1)
    );

    let rows = output::summary_rows(&summaries);
    output::preview_table_rows(&rows, rows.len());
    if let Some(path) = out {
        output::write_csv(&path, &rows)
            .map_err(|e| anyhow!("failed to write {}: {}", path.display(), e))?;
        println!("(Full table exported to {})", path.display());
    }
    Ok(())
}

fn run_change_log(
    table: &SnapshotTable,
    previous: Option<NaiveDate>,
    current: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let defaults = changelog::default_comparison_dates(table);
    let Some((default_previous, default_current)) = defaults else {
        println!("No valid date entries found in dataset.");
        return Ok(());
    };
    let previous = previous.unwrap_or(default_previous);
    let current = current.unwrap_or(default_current);

    let entries = changelog::build_change_log(table, previous, current);
    if json {
        println!("{}", output::to_json(&entries)?);
        return Ok(());
    }
    output::preview_table_rows(&output::change_log_rows(&entries), entries.len());
    println!(
        "Compared {} -> {}",
        util::friendly_date(previous),
        util::friendly_date(current)
    );
    Ok(())
}
