use anyhow::Result;
use readings_service::{
    api::{self, AppState},
    config::AppConfig,
    import::{DirectoryLoader, Importer},
    metrics_server, observability,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let store = cfg.database.open_store().await?;
    tracing::info!(kind = ?cfg.database.kind, "store ready");

    // Optional startup batch. Failures are logged and the server still starts.
    if let Some(import_cfg) = &cfg.import {
        let loader = DirectoryLoader::new(&import_cfg.data_dir);
        let importer = Importer::new(store.clone());
        match importer
            .import_batch(&loader, &import_cfg.roster, &import_cfg.series)
            .await
        {
            Ok(report) => {
                for file in &report.files {
                    if let Some(error) = &file.error {
                        tracing::warn!(file = %file.name, imported = file.report.imported, %error, "file import failed");
                    }
                }
            }
            Err(e) => tracing::error!(error = %e, "startup import aborted"),
        }
    }

    let app = api::router(AppState::new(store));
    let listener = tokio::net::TcpListener::bind(&cfg.http.bind_addr).await?;
    tracing::info!(addr = %cfg.http.bind_addr, "http listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
