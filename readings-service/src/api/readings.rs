use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use readings_client::{MeterKind, Reading};
use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};

use super::{parse_id, ApiError, AppState};
use crate::validation::{validate_reading, Intent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingBody {
    pub reading: Reading,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingsBody {
    pub readings: Vec<Reading>,
}

/// Query string of `GET /readings`. Blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingFilter {
    pub customer: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub kind_of_meter: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_iso_date(raw: &str, which: &str) -> Result<Date, ApiError> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ApiError::BadRequest(format!("Invalid {which} date format. Expected yyyy-MM-dd: {raw}")))
}

fn body(payload: Result<Json<ReadingBody>, JsonRejection>) -> Result<Reading, ApiError> {
    payload
        .map(|Json(body)| body.reading)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON format or missing reading object: {e}")))
}

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ReadingFilter>,
) -> Result<Json<ReadingsBody>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "readings").increment(1);

    let start = present(&filter.start).map(|s| parse_iso_date(s, "start")).transpose()?;
    let end = present(&filter.end).map(|s| parse_iso_date(s, "end")).transpose()?;
    let kind = present(&filter.kind_of_meter)
        .map(|k| {
            k.parse::<MeterKind>().map_err(|_| {
                ApiError::BadRequest("Invalid kindOfMeter. Valid values: HEIZUNG, STROM, WASSER, UNBEKANNT".to_string())
            })
        })
        .transpose()?;

    let mut readings = match present(&filter.customer) {
        Some(raw) => {
            let id = parse_id(raw)
                .map_err(|_| ApiError::BadRequest(format!("Invalid customer UUID format: {raw}")))?;
            state.store.find_readings_by_customer(id).await?
        }
        None => state.store.list_readings().await?,
    };

    // Date bounds are inclusive and drop readings without a date.
    readings.retain(|r| {
        let after_start = start.map_or(true, |s| r.date_of_reading.is_some_and(|d| d >= s));
        let before_end = end.map_or(true, |e| r.date_of_reading.is_some_and(|d| d <= e));
        let kind_matches = kind.map_or(true, |k| r.kind_of_meter == k);
        after_start && before_end && kind_matches
    });

    Ok(Json(ReadingsBody { readings }))
}

pub async fn find(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReadingBody>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "readings").increment(1);
    let id = parse_id(&id)?;
    let reading = state
        .store
        .find_reading(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Reading with ID {id} not found")))?;
    Ok(Json(ReadingBody { reading }))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ReadingBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ReadingBody>), ApiError> {
    metrics::counter!("http_requests_total", "route" => "readings").increment(1);
    let reading = body(payload)?;
    validate_reading(&reading, Intent::Create)?;

    let reading = state.store.create_reading(reading).await?;
    tracing::info!(id = ?reading.id, meter = %reading.meter_id, "reading created");
    Ok((StatusCode::CREATED, Json(ReadingBody { reading })))
}

pub async fn update(
    State(state): State<AppState>,
    payload: Result<Json<ReadingBody>, JsonRejection>,
) -> Result<Json<ReadingBody>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "readings").increment(1);
    let reading = body(payload)?;
    validate_reading(&reading, Intent::Update)?;

    if !state.store.update_reading(&reading).await? {
        let id = reading.id.unwrap_or_default();
        return Err(ApiError::NotFound(format!("Reading with ID {id} not found")));
    }
    // Return the stored form so the customer reflects the persisted record.
    let stored = match reading.id {
        Some(id) => state.store.find_reading(id).await?,
        None => None,
    };
    Ok(Json(ReadingBody {
        reading: stored.unwrap_or(reading),
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReadingBody>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "readings").increment(1);
    let id = parse_id(&id)?;
    let not_found = || ApiError::NotFound(format!("Reading with ID {id} not found"));

    let reading = state.store.find_reading(id).await?.ok_or_else(not_found)?;
    if !state.store.delete_reading(id).await? {
        return Err(not_found());
    }
    Ok(Json(ReadingBody { reading }))
}
