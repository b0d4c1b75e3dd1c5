use std::io::Cursor;
use std::time::Instant;

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::handlers;
use crate::state::SharedState;

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn header(field: &str, value: &str) -> Option<Header> {
    Header::from_bytes(field.as_bytes(), value.as_bytes()).ok()
}

fn build(status: u16, headers: Vec<Option<Header>>, body: Vec<u8>) -> HttpResponse {
    let len = body.len();
    Response::new(
        StatusCode(status),
        headers.into_iter().flatten().collect(),
        Cursor::new(body),
        Some(len),
        None,
    )
}

pub fn bytes_response(status: u16, content_type: &str, body: Vec<u8>) -> HttpResponse {
    build(status, vec![header("Content-Type", content_type)], body)
}

pub fn json_response<T: Serialize>(status: u16, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => bytes_response(status, "application/json", body),
        Err(e) => {
            warn!(error = %e, "failed to serialize response body");
            bytes_response(500, "text/plain", b"500 Internal Server Error".to_vec())
        }
    }
}

/// JSON error body: `{"detail": "..."}`.
pub fn error_response(status: u16, detail: &str) -> HttpResponse {
    json_response(status, &serde_json::json!({ "detail": detail }))
}

pub fn download_response(body: Vec<u8>, content_type: &str, filename: &str) -> HttpResponse {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    build(
        200,
        vec![
            header("Content-Type", content_type),
            header("Content-Disposition", &disposition),
        ],
        body,
    )
}

pub fn not_found() -> HttpResponse {
    ApiError::NotFound("Not Found".into()).into_response()
}

fn preflight() -> HttpResponse {
    build(
        204,
        vec![
            header("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
            header("Access-Control-Allow-Headers", "*"),
            header("Access-Control-Max-Age", "600"),
        ],
        Vec::new(),
    )
}

fn with_cors(response: HttpResponse) -> HttpResponse {
    match header("Access-Control-Allow-Origin", "*") {
        Some(h) => response.with_header(h),
        None => response,
    }
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler.
///
/// Handlers receive a `&mut Request` so that the dispatcher retains ownership
/// and can call `request.respond(response)` at the end.
pub fn dispatch(mut request: Request, state: SharedState) {
    let started = Instant::now();
    let method = request.method().clone();
    let url    = request.url().to_owned();

    let (path, query) = if let Some(pos) = url.find('?') {
        (url[..pos].to_owned(), url[pos + 1..].to_owned())
    } else {
        (url.clone(), String::new())
    };

    let response = match (&method, path.as_str()) {
        (Method::Options, _) => preflight(),

        (Method::Get, "/") => handlers::root::handle_get(),

        (Method::Post, "/upload-image/") | (Method::Post, "/upload-image") => {
            handlers::preview::handle_upload(&mut request, &state)
        }
        (Method::Post, "/upload-zip/") | (Method::Post, "/upload-zip") => {
            handlers::dataset::handle_upload_zip(&mut request, &query, &state)
        }
        (Method::Post, "/upload-zip-download/") | (Method::Post, "/upload-zip-download") => {
            handlers::dataset::handle_upload_zip_download(&mut request, &state)
        }

        (Method::Get, p) if p.starts_with("/static/") => {
            handlers::static_files::handle_get(&p["/static/".len()..], &state)
        }

        _ => not_found(),
    };

    let status = response.status_code().0;
    info!(
        method = %method,
        path = %path,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "handled request"
    );

    if let Err(e) = request.respond(with_cors(response)) {
        warn!(error = %e, "failed to send response");
    }
}

#[cfg(test)]
pub(crate) fn header_value(response: &HttpResponse, field: &'static str) -> Option<String> {
    response.headers().iter()
        .find(|h| h.field.equiv(field))
        .map(|h| h.value.as_str().to_owned())
}

#[cfg(test)]
pub(crate) fn body_of(response: HttpResponse) -> Vec<u8> {
    response.into_reader().into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_response_allows_any_origin() {
        for response in [not_found(), json_response(200, &serde_json::json!({})), preflight()] {
            let response = with_cors(response);
            assert_eq!(header_value(&response, "Access-Control-Allow-Origin").as_deref(), Some("*"));
        }
    }

    #[test]
    fn preflight_is_empty_204() {
        let response = preflight();
        assert_eq!(response.status_code().0, 204);
        assert!(header_value(&response, "Access-Control-Allow-Methods").unwrap().contains("POST"));
        assert!(body_of(response).is_empty());
    }

    #[test]
    fn downloads_are_attachments() {
        let response = download_response(b"PK".to_vec(), "application/zip", "filtered_dataset.zip");
        assert_eq!(response.status_code().0, 200);
        assert_eq!(header_value(&response, "Content-Type").as_deref(), Some("application/zip"));
        assert_eq!(
            header_value(&response, "Content-Disposition").as_deref(),
            Some("attachment; filename=\"filtered_dataset.zip\"")
        );
        assert_eq!(body_of(response), b"PK");
    }

    #[test]
    fn unknown_routes_get_a_json_detail() {
        let response = not_found();
        assert_eq!(response.status_code().0, 404);
        let body: serde_json::Value = serde_json::from_slice(&body_of(response)).unwrap();
        assert_eq!(body["detail"], "Not Found");
    }
}
