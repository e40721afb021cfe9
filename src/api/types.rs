use serde::{Deserialize, Serialize};

use crate::db::GeoRecord;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub message: String,
}

/// `{"result": [...]}` — point lookups and filtered searches share this shape.
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub result: Vec<RecordDto>,
}

/// `{"added": ...}` — echoes the sanitized input, not a re-read of the row.
#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub added: RecordInput,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub updated: RecordDto,
}

#[derive(Debug, Serialize)]
pub struct RecordDto {
    pub ip_address: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<GeoRecord> for RecordDto {
    fn from(r: GeoRecord) -> Self {
        Self {
            ip_address: r.ip_address,
            country: r.country,
            region: r.region,
            city: r.city,
            zip_code: r.zip_code,
            latitude: r.latitude,
            longitude: r.longitude,
        }
    }
}

/// Client-supplied record. Every field is required; the string fields are
/// trimmed and title-cased before validation and persistence.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordInput {
    pub ip: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub zip_code: i32,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub ip: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
