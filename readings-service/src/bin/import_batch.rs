use anyhow::{bail, Result};
use readings_service::{config::AppConfig, import::Importer, observability, DirectoryLoader};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: import_batch <roster.csv> [series.csv ...]");
    }
    let roster = &args[1];
    let series = &args[2..];

    // Load configuration (READINGS_CONFIG may point at a batch-specific file).
    let cfg = AppConfig::load()?;
    let store = cfg.database.open_store().await?;

    // Names are resolved relative to the working directory.
    let loader = DirectoryLoader::new(".");
    let report = Importer::new(store).import_batch(&loader, roster, series).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.files.iter().any(|f| f.error.is_some()) {
        bail!("{} of {} files failed", report.files.iter().filter(|f| f.error.is_some()).count(), report.files.len());
    }
    Ok(())
}
