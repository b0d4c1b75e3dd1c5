use tiny_http::Request;
use tracing::warn;

use ferrite_filter::imaging::grayscale_preview;

use crate::error::ApiError;
use crate::routes::{bytes_response, HttpResponse};
use crate::state::ServerState;
use crate::util::multipart::first_file;
use crate::util::request::read_multipart;

const ACCEPTED_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

// ---------------------------------------------------------------------------
// POST /upload-image/
// ---------------------------------------------------------------------------

/// Returns the uploaded image as a square grayscale PNG preview.
pub fn handle_upload(request: &mut Request, state: &ServerState) -> HttpResponse {
    upload(request, state).unwrap_or_else(ApiError::into_response)
}

fn upload(request: &mut Request, state: &ServerState) -> Result<HttpResponse, ApiError> {
    let parts = read_multipart(request, state.config.max_upload_bytes)?;
    let file = first_file(&parts)
        .filter(|p| !p.data.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No image file was uploaded.".into()))?;

    let content_type = file.content_type.as_deref().unwrap_or("");
    if !ACCEPTED_TYPES.contains(&content_type) {
        return Err(ApiError::BadRequest("File must be JPEG or PNG".into()));
    }

    let size = state.config.preview_size;
    match grayscale_preview(&file.data, size, size) {
        Ok(png) => Ok(bytes_response(200, "image/png", png)),
        Err(e) => {
            warn!(error = %e, "preview failed");
            Err(ApiError::Internal {
                public: format!("Error processing image: {}", e),
                detail: e.to_string(),
            })
        }
    }
}
