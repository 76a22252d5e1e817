// ==========================================
// EEU Ingest - command line entry point
// ==========================================
// eeu-ingest <url-or-path> [options]
// Runs the full pipeline and prints the result as JSON.
// ==========================================

use anyhow::{Context, Result};
use clap::Parser;
use eeu_ingest::config::{config_keys, IngestConfig};
use eeu_ingest::domain::{BaselineDesign, EnumCategory};
use eeu_ingest::importer::{
    ImportOutcome, NoopWeatherLookup, ReportImporter, ReportImporterImpl, StaticEnumLookup, UploadRequest,
};
use eeu_ingest::logging;
use eeu_ingest::repository::{EeuRecordRepository, InMemoryEeuRecordRepository, SqliteEeuRecordRepository};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "eeu-ingest")]
#[command(about = "Parse a building energy simulation report into canonical end-use energy")]
#[command(version)]
struct Cli {
    /// Document URL (http/https/file) or local path
    url: String,

    /// Report type code (1, 2, 3, 4, 5, 6, 8, 9); auto-detected when omitted
    #[arg(short = 't', long)]
    report_type: Option<u8>,

    /// Which model the document describes
    #[arg(short, long, default_value = "design", value_parser = parse_baseline_design)]
    baseline_design: BaselineDesign,

    /// Conditioned area in square feet, for reports that do not print one
    #[arg(long)]
    conditioned_area: Option<f64>,

    /// Zip code, for reports that do not name a weather file
    #[arg(long)]
    zip_code: Option<String>,

    /// Directory with field_list.csv, column_mapping.csv and energy_codes.csv
    #[arg(long, env = config_keys::DEPENDENCIES_DIR)]
    dependencies: Option<PathBuf>,

    /// SQLite file for stored records
    #[arg(long, env = config_keys::DB_PATH, conflicts_with = "dry_run")]
    db: Option<String>,

    /// Keep the record in memory instead of writing it to SQLite
    #[arg(long)]
    dry_run: bool,

    /// JSON object of valid enum values for multi-project sheets,
    /// e.g. {"project_use_type": ["Office"], "energy_code": [...]}
    #[arg(long)]
    enum_values: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn parse_baseline_design(value: &str) -> Result<BaselineDesign, String> {
    BaselineDesign::from_label(value).ok_or_else(|| format!("expected 'baseline' or 'design', got '{}'", value))
}

fn load_enum_values(path: Option<&PathBuf>) -> Result<StaticEnumLookup> {
    let Some(path) = path else {
        return Ok(StaticEnumLookup::new());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let values: HashMap<EnumCategory, Vec<String>> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(StaticEnumLookup::from_values(values))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }
    info!(version = eeu_ingest::VERSION, "{} starting", eeu_ingest::APP_NAME);

    let mut config = IngestConfig::from_env()?;
    if let Some(dir) = cli.dependencies.clone() {
        config.dependencies_dir = Some(dir);
    }
    if let Some(db) = cli.db.clone() {
        config.db_path = db;
    }

    let repository: Box<dyn EeuRecordRepository> = if cli.dry_run {
        Box::new(InMemoryEeuRecordRepository::new())
    } else {
        info!(db_path = %config.db_path, "using record store");
        Box::new(SqliteEeuRecordRepository::new(&config.db_path)?)
    };
    let enum_lookup = load_enum_values(cli.enum_values.as_ref())?;

    let importer = ReportImporterImpl::with_default_fetcher(
        config,
        Box::new(NoopWeatherLookup),
        repository,
        Box::new(enum_lookup),
    )?;

    let request = UploadRequest {
        url: cli.url,
        report_type: cli.report_type,
        baseline_design: cli.baseline_design,
        conditioned_area: cli.conditioned_area,
        zip_code: cli.zip_code,
    };

    let output = match importer.import(request).await? {
        ImportOutcome::Single(upload) => serde_json::Value::Object(upload.to_row()),
        batch @ ImportOutcome::MultiProject(_) => serde_json::to_value(&batch)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
