use std::io::Read;

use tiny_http::Request;

use crate::error::ApiError;
use crate::util::multipart::{extract_boundary, parse_multipart, Part};

pub fn content_type(request: &Request) -> String {
    request.headers().iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default()
}

/// Reads the request body, refusing anything larger than `limit` bytes.
pub fn read_body(request: &mut Request, limit: usize) -> Result<Vec<u8>, ApiError> {
    if request.body_length().map_or(false, |len| len > limit) {
        return Err(ApiError::PayloadTooLarge(limit));
    }
    let mut body = Vec::new();
    request.as_reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| ApiError::BadRequest(format!("failed to read request body: {}", e)))?;
    if body.len() > limit {
        return Err(ApiError::PayloadTooLarge(limit));
    }
    Ok(body)
}

/// Reads and parses a `multipart/form-data` body.
pub fn read_multipart(request: &mut Request, limit: usize) -> Result<Vec<Part>, ApiError> {
    let content_type = content_type(request);
    if !content_type.starts_with("multipart/form-data") {
        return Err(ApiError::BadRequest("Expected a multipart/form-data upload.".into()));
    }
    let boundary = extract_boundary(&content_type)
        .ok_or_else(|| ApiError::BadRequest("Invalid multipart request.".into()))?;
    let body = read_body(request, limit)?;
    Ok(parse_multipart(&body, &boundary))
}
