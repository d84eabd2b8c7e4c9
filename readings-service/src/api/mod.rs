//! JSON HTTP API over the store and the importer.

mod customers;
mod import;
mod readings;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use readings_client::{Store, StoreError};
use serde_json::json;
use uuid::Uuid;

use crate::{import::Importer, pipeline::ImportFailure, validation::MissingFields};

pub use customers::{CustomerBody, CustomersBody, DeletedCustomerBody};
pub use import::{ImportParams, ImportResponse};
pub use readings::{ReadingBody, ReadingFilter, ReadingsBody};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub importer: Importer<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            importer: Importer::new(store.clone()),
            store,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/customers",
            get(customers::list).post(customers::create).put(customers::update),
        )
        .route("/customers/:id", get(customers::find).delete(customers::delete))
        .route(
            "/readings",
            get(readings::list).post(readings::create).put(readings::update),
        )
        .route("/readings/:id", get(readings::find).delete(readings::delete))
        .route("/import/customers", post(import::customers))
        .route("/import/readings", post(import::readings))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] MissingFields),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Import failed: {0}")]
    Import(#[from] ImportFailure),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Duplicate { .. } | StoreError::CustomerInUse(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::UnknownCustomer(_) | StoreError::MissingId(_)) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Import(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        metrics::counter!("http_errors_total", "status" => status.as_u16().to_string()).increment(1);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid UUID format: {raw}")))
}
