use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::pipeline::{ImportReport, RowDiagnostic};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportParams {
    /// Original file name of the upload, used to guess the meter kind.
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub count: usize,
    pub skipped: Vec<RowDiagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl ImportResponse {
    fn new(report: ImportReport, what: &str) -> Self {
        Self {
            message: format!("Successfully imported {} {what}", report.imported),
            count: report.imported,
            skipped: report.skipped,
            aborted: report.aborted,
        }
    }
}

fn require_content(body: &str) -> Result<(), ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("CSV content is required".to_string()));
    }
    Ok(())
}

pub async fn customers(State(state): State<AppState>, body: String) -> Result<Json<ImportResponse>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "import").increment(1);
    require_content(&body)?;
    let report = state.importer.import_customers(&body).await?;
    Ok(Json(ImportResponse::new(report, "customers")))
}

pub async fn readings(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: String,
) -> Result<Json<ImportResponse>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "import").increment(1);
    require_content(&body)?;
    let report = state
        .importer
        .import_reading_series(&body, params.file_name.as_deref())
        .await?;
    Ok(Json(ImportResponse::new(report, "readings")))
}
