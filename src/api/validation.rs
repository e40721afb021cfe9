use super::ApiError;
use super::types::RecordInput;

// Shortest dotted-quad IPv4 through the longest IPv4-mapped IPv6 textual form.
const IP_MIN_LEN: usize = 7;
const IP_MAX_LEN: usize = 45;

const TEXT_MAX_LEN: usize = 100;

const DEFAULT_LIMIT: u64 = 10;

/// Strips leading/trailing whitespace and title-cases the remainder.
pub fn sanitize_text(value: &str) -> String {
    title_case(value.trim())
}

// Python-style title casing: a letter is uppercased when it follows a
// non-letter boundary and lowercased otherwise.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_is_letter = false;

    for c in value.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }

    out
}

pub fn validate_ip(ip: &str) -> Result<&str, ApiError> {
    if !(IP_MIN_LEN..=IP_MAX_LEN).contains(&ip.len()) {
        return Err(ApiError::validation(format!(
            "Invalid ip '{}'. Length must be between {} and {} characters",
            ip, IP_MIN_LEN, IP_MAX_LEN
        )));
    }
    Ok(ip)
}

pub fn validate_text_field(field: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() || value.len() > TEXT_MAX_LEN {
        return Err(ApiError::validation(format!(
            "Invalid {}: must be between 1 and {} characters",
            field, TEXT_MAX_LEN
        )));
    }
    Ok(())
}

pub fn validate_zip_code(zip: i32) -> Result<i32, ApiError> {
    if zip < 1 {
        return Err(ApiError::validation(format!(
            "Invalid zip_code: {}. Must be a positive integer",
            zip
        )));
    }
    Ok(zip)
}

/// Filter and update parameters accept zero, unlike record creation.
pub fn validate_zip_filter(zip: i32) -> Result<i32, ApiError> {
    if zip < 0 {
        return Err(ApiError::validation(format!(
            "Invalid zip_code: {}. Must not be negative",
            zip
        )));
    }
    Ok(zip)
}

pub fn validate_coordinate(field: &str, value: f64) -> Result<f64, ApiError> {
    if !value.is_finite() {
        return Err(ApiError::validation(format!(
            "Invalid {}: must be a finite number",
            field
        )));
    }
    Ok(value)
}

pub fn validate_limit(limit: Option<u64>) -> Result<u64, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 {
        return Err(ApiError::validation(
            "Invalid limit: 0. Limit must be a positive integer",
        ));
    }
    Ok(limit)
}

/// Sanitizes the string fields of an incoming record, then enforces the field
/// bounds on the sanitized values.
pub fn sanitize_record_input(input: RecordInput) -> Result<RecordInput, ApiError> {
    let input = RecordInput {
        ip: sanitize_text(&input.ip),
        country: sanitize_text(&input.country),
        region: sanitize_text(&input.region),
        city: sanitize_text(&input.city),
        zip_code: input.zip_code,
        latitude: input.latitude,
        longitude: input.longitude,
    };

    validate_ip(&input.ip)?;
    validate_text_field("country", &input.country)?;
    validate_text_field("region", &input.region)?;
    validate_text_field("city", &input.city)?;
    validate_zip_code(input.zip_code)?;
    validate_coordinate("latitude", input.latitude)?;
    validate_coordinate("longitude", input.longitude)?;

    Ok(input)
}
