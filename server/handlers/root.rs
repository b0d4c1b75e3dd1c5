use crate::routes::{json_response, HttpResponse};

/// `GET /`
pub fn handle_get() -> HttpResponse {
    json_response(200, &serde_json::json!({ "message": "ferrite-filter image processing API" }))
}
