//! Import orchestration: single files and roster-plus-series batches.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use readings_client::Store;
use serde::Serialize;

use crate::{
    pipeline::{ImportError, ImportFailure, ImportReport, Pipeline},
    sinks::{CustomerSink, ReadingSink},
    sources::{CustomerRosterSource, ReadingSeriesSource},
};

/// Resolves a resource name to its full text.
#[async_trait::async_trait]
pub trait ResourceLoader: Send + Sync {
    async fn load(&self, name: &str) -> Result<String, ImportError>;
}

/// Loads resources from files below a base directory.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    base: PathBuf,
}

impl DirectoryLoader {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl ResourceLoader for DirectoryLoader {
    async fn load(&self, name: &str) -> Result<String, ImportError> {
        let path = self.base.join(name);
        tokio::fs::read_to_string(&path).await.map_err(|source| match source.kind() {
            ErrorKind::NotFound => ImportError::ResourceNotFound(path.display().to_string()),
            _ => ImportError::Io {
                name: path.display().to_string(),
                source,
            },
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub name: String,
    pub report: ImportReport,
    /// Hard failure that ended this file early; rows before it stay persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn total_imported(&self) -> usize {
        self.files.iter().map(|f| f.report.imported).sum()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("batch aborted: {0}")]
    Resource(#[source] ImportError),
    #[error("roster import failed: {0}")]
    Roster(#[source] ImportFailure),
}

/// Runs import pipelines against a shared store.
pub struct Importer<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for Importer<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store + ?Sized> Importer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn import_customers(&self, text: &str) -> Result<ImportReport, ImportFailure> {
        Pipeline {
            name: "customers".to_string(),
            source: CustomerRosterSource::new(text),
            sink: CustomerSink::new(self.store.clone()),
        }
        .run()
        .await
    }

    /// Import one series file. `file_name` is only a meter-kind hint.
    pub async fn import_reading_series(
        &self,
        text: &str,
        file_name: Option<&str>,
    ) -> Result<ImportReport, ImportFailure> {
        let mut source = ReadingSeriesSource::new(text);
        if let Some(name) = file_name {
            source = source.with_file_name(name);
        }
        Pipeline {
            name: file_name.unwrap_or("readings").to_string(),
            source,
            sink: ReadingSink::new(self.store.clone()),
        }
        .run()
        .await
    }

    /// Import the roster, then each series file in order.
    ///
    /// A failing series file is recorded and the batch moves on. A missing
    /// resource or a failing roster aborts the whole batch.
    pub async fn import_batch<L>(
        &self,
        loader: &L,
        roster: &str,
        series: &[String],
    ) -> Result<BatchReport, BatchError>
    where
        L: ResourceLoader + ?Sized,
    {
        let mut batch = BatchReport::default();

        let text = loader.load(roster).await.map_err(BatchError::Resource)?;
        let report = self.import_customers(&text).await.map_err(BatchError::Roster)?;
        batch.files.push(FileOutcome {
            name: roster.to_string(),
            report,
            error: None,
        });

        for name in series {
            let text = loader.load(name).await.map_err(BatchError::Resource)?;
            let outcome = match self.import_reading_series(&text, Some(name)).await {
                Ok(report) => FileOutcome {
                    name: name.clone(),
                    report,
                    error: None,
                },
                Err(failure) => FileOutcome {
                    name: name.clone(),
                    error: Some(failure.error.to_string()),
                    report: failure.partial,
                },
            };
            batch.files.push(outcome);
        }

        tracing::info!(
            files = batch.files.len(),
            imported = batch.total_imported(),
            "batch import finished"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use readings_client::MemoryStore;

    use crate::pipeline::SkipReason;

    const ROSTER: &str = "UUID,Anrede,Vorname,Nachname,Geburtsdatum\n\
        ec617965-88b4-4721-8158-ee36c38e4db3,Herr,Pumukel,Kobold,21.02.1962\n\
        848c39a1-0cbf-4ab1-8bd8-1a3a2e9b1b39,Frau,Ute,Jäger,\n";

    fn series(customer: &str, rows: &[&str]) -> String {
        let mut text = format!(
            "\"Kunde\";\"{customer}\";\n\"Zählernummer\";\"MST-1\";\n;;\n\"Datum\";\"Zählerstand\";\"Kommentar\"\n"
        );
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    struct MapLoader(HashMap<String, String>);

    #[async_trait::async_trait]
    impl ResourceLoader for MapLoader {
        async fn load(&self, name: &str) -> Result<String, ImportError> {
            self.0
                .get(name)
                .cloned()
                .ok_or_else(|| ImportError::ResourceNotFound(name.to_string()))
        }
    }

    fn loader(files: &[(&str, String)]) -> MapLoader {
        MapLoader(files.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[tokio::test]
    async fn failing_series_file_does_not_stop_the_batch() {
        let store = Arc::new(MemoryStore::new());
        let importer = Importer::new(store.clone());
        let files = loader(&[
            ("kunden.csv", ROSTER.to_string()),
            (
                "strom.csv",
                series("ec617965-88b4-4721-8158-ee36c38e4db3", &["\"01.01.2024\";\"10\";\"\""]),
            ),
            (
                "wasser.csv",
                series(
                    "00000000-0000-0000-0000-000000000001",
                    &["\"01.01.2024\";\"1\";\"\""],
                ),
            ),
            (
                "heizung.csv",
                series(
                    "848c39a1-0cbf-4ab1-8bd8-1a3a2e9b1b39",
                    &["\"01.01.2024\";\"1\";\"\"", "\"01.02.2024\";\"2\";\"\""],
                ),
            ),
        ]);

        let series_names = ["strom.csv", "wasser.csv", "heizung.csv"].map(String::from);
        let report = importer
            .import_batch(&files, "kunden.csv", &series_names)
            .await
            .unwrap();

        assert_eq!(report.files.len(), 4);
        assert_eq!(report.files[0].report.imported, 2);
        assert_eq!(report.files[1].report.imported, 1);
        assert_eq!(report.files[2].report.imported, 0);
        assert!(report.files[2].error.as_deref().unwrap().contains("does not exist"));
        assert_eq!(report.files[3].report.imported, 2);
        assert_eq!(report.total_imported(), 5);
        assert_eq!(store.list_readings().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_resource_aborts_the_batch() {
        let store = Arc::new(MemoryStore::new());
        let importer = Importer::new(store.clone());
        let files = loader(&[("kunden.csv", ROSTER.to_string())]);

        let err = importer
            .import_batch(&files, "kunden.csv", &["fehlt.csv".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Resource(ImportError::ResourceNotFound(name)) if name == "fehlt.csv"));
    }

    #[tokio::test]
    async fn broken_roster_aborts_the_batch() {
        let importer = Importer::new(Arc::new(MemoryStore::new()));
        let files = loader(&[(
            "kunden.csv",
            "header\nnot-a-uuid,Herr,A,B,\n".to_string(),
        )]);

        let err = importer.import_batch(&files, "kunden.csv", &[]).await.unwrap_err();
        assert!(matches!(err, BatchError::Roster(_)));
    }

    #[tokio::test]
    async fn repeated_roster_id_is_skipped_not_fatal() {
        let store = Arc::new(MemoryStore::new());
        let importer = Importer::new(store.clone());
        let text = format!("{ROSTER}ec617965-88b4-4721-8158-ee36c38e4db3,Frau,Andere,Person,\n");

        let report = importer.import_customers(&text).await.unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, 4);
        assert!(matches!(report.skipped[0].reason, SkipReason::DuplicateId { .. }));
        assert_eq!(store.list_customers().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn series_without_metadata_imports_nothing() {
        let store = Arc::new(MemoryStore::new());
        let importer = Importer::new(store.clone());
        importer.import_customers(ROSTER).await.unwrap();

        let text = ";;\n\"Datum\";\"Zählerstand\"\n\"01.01.2024\";\"1\"\n";
        let report = importer.import_reading_series(text, None).await.unwrap();
        assert_eq!(report.imported, 0);
        assert!(report.aborted.is_some());
        assert!(store.list_readings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_customer_keeps_nothing_and_reports_failure() {
        let importer = Importer::new(Arc::new(MemoryStore::new()));
        let text = series("ec617965-88b4-4721-8158-ee36c38e4db3", &["\"01.01.2024\";\"1\""]);
        let failure = importer.import_reading_series(&text, None).await.unwrap_err();
        assert!(matches!(failure.error, ImportError::UnknownCustomer(_)));
        assert_eq!(failure.partial.imported, 0);
    }

    #[tokio::test]
    async fn directory_loader_maps_missing_files() {
        let loader = DirectoryLoader::new(env!("CARGO_MANIFEST_DIR"));
        assert!(loader.load("Cargo.toml").await.unwrap().contains("readings-service"));
        let err = loader.load("no-such-file.csv").await.unwrap_err();
        assert!(matches!(err, ImportError::ResourceNotFound(_)));
    }
}
