use std::io::ErrorKind;
use std::path::Path;

use rand::Rng;
use serde::Serialize;
use tiny_http::Request;
use tracing::{info, warn};

use ferrite_filter::pipeline::{run_archive, FailureSummary, JobOutput};
use ferrite_filter::{FilterParams, ServiceConfig};

use crate::error::ApiError;
use crate::routes::{download_response, json_response, HttpResponse};
use crate::state::ServerState;
use crate::util::form::{form_get, parse_form};
use crate::util::multipart::{first_file, text_field, Part};
use crate::util::request::read_multipart;

const DOWNLOAD_FILENAME: &str = "filtered_dataset.zip";

#[derive(Debug, Serialize)]
struct SampleView {
    class_name: String,
    original_image: String,
    filtered_image: String,
}

#[derive(Debug, Serialize)]
struct UploadZipResponse {
    samples: Vec<SampleView>,
    download_url: String,
    blur_parameter: f64,
    processed: usize,
    failed: Vec<FailureSummary>,
}

// ---------------------------------------------------------------------------
// POST /upload-zip/
// ---------------------------------------------------------------------------

/// Filters an uploaded dataset zip and publishes samples plus the result zip
/// under the static tree.
pub fn handle_upload_zip(request: &mut Request, query: &str, state: &ServerState) -> HttpResponse {
    upload_zip(request, query, state).unwrap_or_else(ApiError::into_response)
}

fn upload_zip(request: &mut Request, query: &str, state: &ServerState) -> Result<HttpResponse, ApiError> {
    let config = &state.config;
    let parts = read_multipart(request, config.max_upload_bytes)?;
    let archive = zip_part(&parts)?;
    let params = tuned_params(query, &parts, config)?;

    let body = publish_job(&archive.data, params, state, &mut rand::thread_rng())?;
    Ok(json_response(200, &body))
}

/// Runs one tuned job, then publishes its samples and result zip under the
/// static tree. On failure the job's sample folder is removed again.
fn publish_job<R: Rng + ?Sized>(
    archive: &[u8],
    params: FilterParams,
    state: &ServerState,
    rng: &mut R,
) -> Result<UploadZipResponse, ApiError> {
    let job_id = state.next_job_id();
    let samples_dir = state.config.samples_dir().join(&job_id);

    let published = run_and_store(archive, params, &state.config, &job_id, &samples_dir, rng);
    if published.is_err() {
        discard_dir(&samples_dir);
    }
    published
}

fn run_and_store<R: Rng + ?Sized>(
    archive: &[u8],
    params: FilterParams,
    config: &ServiceConfig,
    job_id: &str,
    samples_dir: &Path,
    rng: &mut R,
) -> Result<UploadZipResponse, ApiError> {
    let spec = config.job_spec(params, Some(samples_dir.to_path_buf()));
    let output = run_archive(archive, &spec, rng)?;

    let downloads = config.downloads_dir();
    std::fs::create_dir_all(&downloads).map_err(ApiError::internal)?;
    let zip_name = format!("filtered_results_{}.zip", job_id);
    std::fs::write(downloads.join(&zip_name), &output.archive).map_err(ApiError::internal)?;

    info!(%job_id, classes = output.classes.len(), processed = output.report.processed(), "dataset job done");

    Ok(UploadZipResponse {
        samples: sample_views(&output, job_id),
        download_url: format!("/static/downloads/{}", zip_name),
        blur_parameter: params.blur_parameter,
        processed: output.report.processed(),
        failed: output.failures,
    })
}

fn discard_dir(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => info!(dir = %dir.display(), "removed samples of failed job"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(dir = %dir.display(), error = %e, "failed to remove samples of failed job"),
    }
}

fn sample_views(output: &JobOutput, job_id: &str) -> Vec<SampleView> {
    output.report.samples.iter()
        .map(|s| SampleView {
            class_name: s.class_name.clone(),
            original_image: format!("/static/samples/{}/{}", job_id, s.original_file),
            filtered_image: format!("/static/samples/{}/{}", job_id, s.filtered_file),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// POST /upload-zip-download/
// ---------------------------------------------------------------------------

/// Filters an uploaded dataset zip with the fixed defaults and returns the
/// result zip directly.
pub fn handle_upload_zip_download(request: &mut Request, state: &ServerState) -> HttpResponse {
    upload_zip_download(request, state).unwrap_or_else(ApiError::into_response)
}

fn upload_zip_download(request: &mut Request, state: &ServerState) -> Result<HttpResponse, ApiError> {
    let config = &state.config;
    let parts = read_multipart(request, config.max_upload_bytes)?;
    let archive = zip_part(&parts)?;
    download_job(&archive.data, config, &mut rand::thread_rng())
}

fn download_job<R: Rng + ?Sized>(archive: &[u8], config: &ServiceConfig, rng: &mut R) -> Result<HttpResponse, ApiError> {
    let spec = config.job_spec(config.download_defaults, None);
    let output = run_archive(archive, &spec, rng)?;
    info!(classes = output.classes.len(), processed = output.report.processed(), "dataset download job done");

    Ok(download_response(output.archive, "application/zip", DOWNLOAD_FILENAME))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn zip_part(parts: &[Part]) -> Result<&Part, ApiError> {
    let part = first_file(parts)
        .ok_or_else(|| ApiError::BadRequest("No ZIP file was uploaded.".into()))?;
    let is_zip = part.filename.as_deref()
        .map(|name| name.to_ascii_lowercase().ends_with(".zip"))
        .unwrap_or(false);
    if !is_zip {
        return Err(ApiError::BadRequest("File must be a ZIP archive.".into()));
    }
    Ok(part)
}

/// Reads `blur_parameter`, `kernel_size` and `center_parameter` from the query
/// string, falling back to multipart text fields, then to the config defaults.
fn tuned_params(query: &str, parts: &[Part], config: &ServiceConfig) -> Result<FilterParams, ApiError> {
    let pairs = parse_form(query);
    let lookup = |key: &str| -> Option<String> {
        form_get(&pairs, key)
            .or_else(|| text_field(parts, key))
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    };
    let defaults = config.tuned_defaults;

    let blur_parameter = match lookup("blur_parameter") {
        Some(v) => v.parse::<f64>()
            .map_err(|_| ApiError::Unprocessable(format!("blur_parameter must be a number, got {:?}", v)))?,
        None => defaults.blur_parameter,
    };

    let kernel_size = match lookup("kernel_size") {
        Some(v) => v.parse::<usize>()
            .map_err(|_| ApiError::Unprocessable(format!("kernel_size must be a positive integer, got {:?}", v)))?,
        None => defaults.kernel_size,
    };
    if kernel_size > config.max_kernel_size {
        return Err(ApiError::Unprocessable(format!(
            "kernel_size must not exceed {}",
            config.max_kernel_size
        )));
    }

    let center_parameter = match lookup("center_parameter") {
        Some(v) if v.eq_ignore_ascii_case("none") || v.eq_ignore_ascii_case("null") => None,
        Some(v) => Some(v.parse::<f64>()
            .map_err(|_| ApiError::Unprocessable(format!("center_parameter must be a number or none, got {:?}", v)))?),
        None => defaults.center_parameter,
    };

    let params = FilterParams::new(kernel_size, blur_parameter, center_parameter);
    params.validate()?;
    Ok(params)
}
