use std::path::{Component, Path, PathBuf};

use crate::routes::{bytes_response, not_found, HttpResponse};
use crate::state::ServerState;
use crate::util::form::percent_decode_path;

/// `GET /static/{path}`
///
/// Serves a file below the configured static directory.
pub fn handle_get(rel: &str, state: &ServerState) -> HttpResponse {
    let rel = match safe_relative_path(&percent_decode_path(rel)) {
        Some(p) => p,
        None => return not_found(),
    };
    let path = state.config.static_dir.join(&rel);
    match std::fs::read(&path) {
        Ok(bytes) => bytes_response(200, content_type_for(&path), bytes),
        Err(_) => not_found(),
    }
}

/// Accepts only plain relative paths made of normal components.
fn safe_relative_path(rel: &str) -> Option<PathBuf> {
    if rel.is_empty() || rel.contains('\\') {
        return None;
    }
    let path = Path::new(rel);
    if path.components().all(|c| matches!(c, Component::Normal(_))) {
        Some(path.to_path_buf())
    } else {
        None
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "bmp"          => "image/bmp",
        "zip"          => "application/zip",
        "json"         => "application/json",
        "html"         => "text/html; charset=utf-8",
        _              => "application/octet-stream",
    }
}
