use std::{fmt, pin::Pin};

use futures::{Stream, StreamExt};
use readings_client::StoreError;
use serde::Serialize;
use uuid::Uuid;

use crate::parse::InvalidIdentifier;

/// A parsed record together with the 1-based source line it came from.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub line: u64,
}

/// Why a row was dropped without failing the import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    TooFewFields { found: usize, required: usize },
    EmptyDate,
    EmptyValue,
    /// The store already holds a record with this id.
    DuplicateId { id: Uuid },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewFields { found, required } => {
                write!(f, "expected at least {required} fields, found {found}")
            }
            Self::EmptyDate => f.write_str("date field is empty"),
            Self::EmptyValue => f.write_str("reading value field is empty"),
            Self::DuplicateId { id } => write!(f, "id {id} already exists"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDiagnostic {
    pub line: u64,
    pub reason: SkipReason,
}

/// One item produced by a source: either a record to persist or a row that
/// was tolerated and skipped.
#[derive(Debug, Clone)]
pub enum Row<T> {
    Record(Envelope<T>),
    Skipped(RowDiagnostic),
}

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),
    #[error("could not extract {missing} from series preamble")]
    IncompletePreamble { missing: &'static str },
    #[error("customer {0} referenced by series file does not exist")]
    UnknownCustomer(Uuid),
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    #[error("failed to read '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ImportError {
    /// Soft failures end the current file with zero records but are not
    /// reported as errors to the caller.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::IncompletePreamble { .. })
    }
}

/// Outcome of importing one source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<RowDiagnostic>,
    /// Set when the file was abandoned by a soft failure.
    pub aborted: Option<String>,
}

/// A hard failure, with whatever was persisted before it happened.
#[derive(thiserror::Error, Debug)]
#[error("{error} ({} records imported before the failure)", .partial.imported)]
pub struct ImportFailure {
    #[source]
    pub error: ImportError,
    pub partial: ImportReport,
}

impl From<ImportError> for ImportFailure {
    fn from(error: ImportError) -> Self {
        Self {
            error,
            partial: ImportReport::default(),
        }
    }
}

pub type RowStream<T> = Pin<Box<dyn Stream<Item = Result<Row<T>, ImportError>> + Send>>;

#[async_trait::async_trait]
pub trait Source: Send + Sync {
    type Record: Send + 'static;

    async fn stream(&self) -> RowStream<Self::Record>;
}

/// What a sink did with one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Written {
    Stored,
    /// The record was refused without failing the import.
    Rejected(SkipReason),
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn write(&mut self, record: Envelope<T>) -> Result<Written, ImportError>;
}

/// Drives a source into a sink one row at a time: the next line is only
/// parsed after the previous record has been written.
pub struct Pipeline<S, K> {
    pub name: String,
    pub source: S,
    pub sink: K,
}

impl<S, K> Pipeline<S, K>
where
    S: Source,
    K: Sink<S::Record>,
{
    pub async fn run(mut self) -> Result<ImportReport, ImportFailure> {
        let mut stream = self.source.stream().await;
        let mut report = ImportReport::default();

        while let Some(item) = stream.next().await {
            match item {
                Ok(Row::Record(env)) => {
                    let line = env.line;
                    match self.sink.write(env).await {
                        Ok(Written::Stored) => {
                            report.imported += 1;
                            metrics::counter!("import_records_persisted_total").increment(1);
                        }
                        Ok(Written::Rejected(reason)) => self.skip(&mut report, RowDiagnostic { line, reason }),
                        Err(error) => return Err(self.fail(error, report)),
                    }
                }
                Ok(Row::Skipped(diag)) => self.skip(&mut report, diag),
                Err(error) if error.is_soft() => {
                    tracing::warn!(file = %self.name, error = %error, "abandoning file");
                    report.aborted = Some(error.to_string());
                    break;
                }
                Err(error) => return Err(self.fail(error, report)),
            }
        }

        tracing::info!(
            file = %self.name,
            imported = report.imported,
            skipped = report.skipped.len(),
            "import finished"
        );
        Ok(report)
    }

    fn skip(&self, report: &mut ImportReport, diag: RowDiagnostic) {
        tracing::debug!(file = %self.name, line = diag.line, reason = %diag.reason, "skipping row");
        metrics::counter!("import_rows_skipped_total").increment(1);
        report.skipped.push(diag);
    }

    fn fail(&self, error: ImportError, partial: ImportReport) -> ImportFailure {
        tracing::error!(file = %self.name, error = %error, imported = partial.imported, "import failed");
        metrics::counter!("import_files_failed_total").increment(1);
        ImportFailure { error, partial }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecSource(Vec<Result<Row<u32>, &'static str>>);

    #[async_trait::async_trait]
    impl Source for VecSource {
        type Record = u32;

        async fn stream(&self) -> RowStream<u32> {
            let items: Vec<_> = self
                .0
                .iter()
                .map(|item| match item {
                    Ok(row) => Ok(row.clone()),
                    Err("soft") => Err(ImportError::IncompletePreamble { missing: "meter id" }),
                    Err(_) => Err(ImportError::UnknownCustomer(Uuid::nil())),
                })
                .collect();
            Box::pin(futures::stream::iter(items))
        }
    }

    #[derive(Default)]
    struct CollectSink(Vec<u32>);

    #[async_trait::async_trait]
    impl Sink<u32> for CollectSink {
        async fn write(&mut self, record: Envelope<u32>) -> Result<Written, ImportError> {
            // Payloads above 100 are refused.
            if record.payload > 100 {
                return Ok(Written::Rejected(SkipReason::DuplicateId { id: Uuid::nil() }));
            }
            self.0.push(record.payload);
            Ok(Written::Stored)
        }
    }

    fn record(payload: u32, line: u64) -> Result<Row<u32>, &'static str> {
        Ok(Row::Record(Envelope { payload, line }))
    }

    fn pipeline(items: Vec<Result<Row<u32>, &'static str>>) -> Pipeline<VecSource, CollectSink> {
        Pipeline {
            name: "test".to_string(),
            source: VecSource(items),
            sink: CollectSink::default(),
        }
    }

    #[tokio::test]
    async fn counts_records_and_collects_skips() {
        let skipped = RowDiagnostic {
            line: 2,
            reason: SkipReason::EmptyValue,
        };
        let report = pipeline(vec![record(1, 1), Ok(Row::Skipped(skipped.clone())), record(3, 3)])
            .run()
            .await
            .unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, vec![skipped]);
        assert!(report.aborted.is_none());
    }

    #[tokio::test]
    async fn soft_error_ends_file_without_failing() {
        let report = pipeline(vec![Err("soft"), record(1, 5)]).run().await.unwrap();
        assert_eq!(report.imported, 0);
        assert_eq!(
            report.aborted.as_deref(),
            Some("could not extract meter id from series preamble")
        );
    }

    #[tokio::test]
    async fn hard_error_keeps_partial_count() {
        let failure = pipeline(vec![record(1, 1), Err("hard"), record(2, 3)])
            .run()
            .await
            .unwrap_err();
        assert_eq!(failure.partial.imported, 1);
        assert!(matches!(failure.error, ImportError::UnknownCustomer(_)));
    }

    #[tokio::test]
    async fn rejected_records_are_skipped_and_the_file_continues() {
        let report = pipeline(vec![record(1, 1), record(101, 2), record(4, 3)])
            .run()
            .await
            .unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(
            report.skipped,
            vec![RowDiagnostic {
                line: 2,
                reason: SkipReason::DuplicateId { id: Uuid::nil() },
            }]
        );
    }
}
