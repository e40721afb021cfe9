use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::types::{
    CreateResponse, GreetingResponse, LookupResponse, RecordDto, RecordInput, SearchParams,
    UpdateParams, UpdateResponse,
};
use super::validation::{
    sanitize_record_input, validate_coordinate, validate_ip, validate_limit, validate_text_field,
    validate_zip_filter,
};
use super::{ApiError, AppState};
use crate::db::{NewRecord, RecordChanges, RecordFilter, RecordInsertError};

pub async fn index() -> Json<GreetingResponse> {
    Json(GreetingResponse {
        message: "Greetings from the geodex geolocation API!".to_string(),
    })
}

pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(ip): Path<String>,
) -> Result<Json<LookupResponse>, ApiError> {
    let ip = validate_ip(&ip)?;

    let records = state
        .store()
        .find_records_by_ip(ip)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if records.is_empty() {
        return Err(ApiError::ip_not_found(ip));
    }

    Ok(Json(LookupResponse {
        result: records.into_iter().map(RecordDto::from).collect(),
    }))
}

pub async fn search_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<LookupResponse>, ApiError> {
    let limit = validate_limit(params.limit)?;

    if let Some(ip) = &params.ip {
        validate_ip(ip)?;
    }
    for (field, value) in [
        ("country", &params.country),
        ("region", &params.region),
        ("city", &params.city),
    ] {
        if let Some(value) = value {
            validate_text_field(field, value)?;
        }
    }
    if let Some(zip) = params.zip_code {
        validate_zip_filter(zip)?;
    }

    let filter = RecordFilter {
        ip_address: params.ip,
        country: params.country,
        region: params.region,
        city: params.city,
        zip: params.zip_code,
        latitude: params.latitude,
        longitude: params.longitude,
    };

    // The limit alone never authorizes an unconditional table scan.
    if filter.is_empty() {
        return Err(ApiError::validation(
            "At least one filtering parameter must be provided",
        ));
    }

    let records = state
        .store()
        .search_records(&filter, limit)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if records.is_empty() {
        return Err(ApiError::NotFound(
            "No data found for provided parameters".to_string(),
        ));
    }

    Ok(Json(LookupResponse {
        result: records.into_iter().map(RecordDto::from).collect(),
    }))
}

pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RecordInput>,
) -> Result<Json<CreateResponse>, ApiError> {
    let input = sanitize_record_input(input)?;

    let record = NewRecord {
        ip_address: input.ip.clone(),
        country: Some(input.country.clone()),
        region: Some(input.region.clone()),
        city: Some(input.city.clone()),
        zip: Some(input.zip_code),
        latitude: Some(input.latitude),
        longitude: Some(input.longitude),
    };

    match state.store().add_record(record).await {
        Ok(()) => Ok(Json(CreateResponse { added: input })),
        Err(RecordInsertError::Duplicate(ip)) => Err(ApiError::duplicate_ip(&ip)),
        Err(RecordInsertError::Db(e)) => Err(ApiError::DatabaseError(e.to_string())),
    }
}

pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Path(ip): Path<String>,
    Query(params): Query<UpdateParams>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let ip = validate_ip(&ip)?;

    for (field, value) in [
        ("country", &params.country),
        ("region", &params.region),
        ("city", &params.city),
    ] {
        if let Some(value) = value {
            validate_text_field(field, value)?;
        }
    }
    if let Some(zip) = params.zip_code {
        validate_zip_filter(zip)?;
    }
    if let Some(latitude) = params.latitude {
        validate_coordinate("latitude", latitude)?;
    }
    if let Some(longitude) = params.longitude {
        validate_coordinate("longitude", longitude)?;
    }

    let changes = RecordChanges {
        country: params.country,
        region: params.region,
        city: params.city,
        zip: params.zip_code,
        latitude: params.latitude,
        longitude: params.longitude,
    };

    if changes.is_empty() {
        return Err(ApiError::validation("No update parameters passed"));
    }

    let affected = state
        .store()
        .update_record_by_ip(ip, &changes)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if affected == 0 {
        return Err(ApiError::ip_not_found(ip));
    }

    let records = state
        .store()
        .find_records_by_ip(ip)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let record = records
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::internal(format!("Updated record for ip={} disappeared", ip)))?;

    Ok(Json(UpdateResponse {
        updated: record.into(),
    }))
}
