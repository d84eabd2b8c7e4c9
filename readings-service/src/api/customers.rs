use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use readings_client::{Customer, Reading};
use serde::{Deserialize, Serialize};

use super::{parse_id, ApiError, AppState};
use crate::validation::{validate_customer, Intent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerBody {
    pub customer: Customer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomersBody {
    pub customers: Vec<Customer>,
}

/// Response of a delete: the removed customer and its readings, which are
/// always empty since customers with readings cannot be deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedCustomerBody {
    pub customer: Customer,
    pub readings: Vec<Reading>,
}

fn body(payload: Result<Json<CustomerBody>, JsonRejection>) -> Result<Customer, ApiError> {
    payload
        .map(|Json(body)| body.customer)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON format or missing customer object: {e}")))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<CustomersBody>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "customers").increment(1);
    let customers = state.store.list_customers().await?;
    Ok(Json(CustomersBody { customers }))
}

pub async fn find(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerBody>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "customers").increment(1);
    let id = parse_id(&id)?;
    let customer = state
        .store
        .find_customer(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Customer with ID {id} not found")))?;
    Ok(Json(CustomerBody { customer }))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CustomerBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerBody>), ApiError> {
    metrics::counter!("http_requests_total", "route" => "customers").increment(1);
    let customer = body(payload)?;
    validate_customer(&customer, Intent::Create)?;

    let customer = state.store.create_customer(customer).await?;
    tracing::info!(id = ?customer.id, "customer created");
    Ok((StatusCode::CREATED, Json(CustomerBody { customer })))
}

pub async fn update(
    State(state): State<AppState>,
    payload: Result<Json<CustomerBody>, JsonRejection>,
) -> Result<Json<CustomerBody>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "customers").increment(1);
    let customer = body(payload)?;
    validate_customer(&customer, Intent::Update)?;

    if !state.store.update_customer(&customer).await? {
        let id = customer.id.unwrap_or_default();
        return Err(ApiError::NotFound(format!("Customer with ID {id} not found")));
    }
    Ok(Json(CustomerBody { customer }))
}

/// Deletes a customer without readings and returns it with an empty reading list.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedCustomerBody>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "customers").increment(1);
    let id = parse_id(&id)?;
    let not_found = || ApiError::NotFound(format!("Customer with ID {id} not found"));

    let customer = state.store.find_customer(id).await?.ok_or_else(not_found)?;
    if !state.store.delete_customer(id).await? {
        return Err(not_found());
    }
    tracing::info!(%id, "customer deleted");
    Ok(Json(DeletedCustomerBody {
        customer,
        readings: Vec::new(),
    }))
}
