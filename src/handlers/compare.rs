// src/handlers/compare.rs
// DOCUMENTATION: Video comparison upload handler
// PURPOSE: Stream the multipart form to disk, validate it, run the comparison

use crate::errors::DashboardError;
use crate::models::SessionParams;
use crate::services::storage::{is_allowed_video, sanitize_filename};
use crate::services::{CompareService, UploadStore, UploadedVideo};
use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{web, HttpResponse, ResponseError};
use futures_util::StreamExt;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use validator::Validate;

/// Upper bound for the session_id text field
const MAX_TEXT_FIELD_BYTES: usize = 256;

const VIDEO_FIELDS: [&str; 2] = ["video1", "video2"];

/// A video written to the staging directory
#[derive(Debug)]
struct StagedVideo {
    /// Sanitized client file name
    original: String,
    /// File name inside staging and, later, the session directory
    stored: String,
}

/// Everything collected from one compare form
#[derive(Debug, Default)]
struct UploadForm {
    videos: [Option<StagedVideo>; 2],
    seen: [bool; 2],
    empty_selection: bool,
    session_id: Option<String>,
}

impl UploadForm {
    fn into_videos(self) -> Result<(StagedVideo, StagedVideo), DashboardError> {
        if !self.seen.iter().all(|seen| *seen) {
            return Err(DashboardError::InvalidInput(
                "Both video files are required".to_string(),
            ));
        }
        if self.empty_selection {
            return Err(DashboardError::InvalidInput("No files selected".to_string()));
        }

        match self.videos {
            [Some(first), Some(second)] => Ok((first, second)),
            _ => Err(DashboardError::InvalidInput(
                "Both video files are required".to_string(),
            )),
        }
    }
}

fn malformed(err: MultipartError) -> DashboardError {
    DashboardError::InvalidInput(format!("Malformed multipart body: {}", err))
}

/// POST /api/compare
/// Upload two screen recordings and compare their scroll smoothness
///
/// DOCUMENTATION: Files land in a private staging directory first and are
/// moved into `uploads/<session_id>/` only once the whole form is valid
pub async fn compare_videos(
    store: web::Data<UploadStore>,
    service: web::Data<CompareService>,
    payload: Multipart,
) -> Result<HttpResponse, DashboardError> {
    service.check_rate()?;

    let staging = store.create_staging().await?;
    let result = handle_upload(&store, &service, &staging, payload).await;

    if let Err(e) = &result {
        if e.status_code().is_server_error() {
            log::error!("Comparison failed: {}", e);
        } else {
            log::warn!("Compare request rejected: {}", e);
        }
        store.discard(&staging).await;
    }

    result
}

async fn handle_upload(
    store: &UploadStore,
    service: &CompareService,
    staging: &Path,
    payload: Multipart,
) -> Result<HttpResponse, DashboardError> {
    let mut form = receive_form(store, staging, payload).await?;

    let session_id = match form.session_id.take() {
        Some(session_id) => {
            let params = SessionParams { session_id };
            params
                .validate()
                .map_err(|e| DashboardError::InvalidInput(format!("Invalid session_id: {}", e)))?;
            params.session_id
        }
        None => Uuid::new_v4().to_string(),
    };

    let (first, second) = form.into_videos()?;
    let session_dir = store
        .commit(staging, &session_id, &[first.stored.as_str(), second.stored.as_str()])
        .await?;

    let video1 = UploadedVideo {
        path: session_dir.join(&first.stored),
        name: first.original,
    };
    let video2 = UploadedVideo {
        path: session_dir.join(&second.stored),
        name: second.original,
    };

    let response = service
        .compare(&session_id, &session_dir, &video1, &video2)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn receive_form(
    store: &UploadStore,
    staging: &Path,
    mut payload: Multipart,
) -> Result<UploadForm, DashboardError> {
    let mut form = UploadForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        if let Some(slot) = VIDEO_FIELDS.iter().position(|f| *f == name) {
            if form.seen[slot] {
                return Err(DashboardError::InvalidInput(format!(
                    "Duplicate field {}",
                    name
                )));
            }
            form.seen[slot] = true;

            let filename = field
                .content_disposition()
                .get_filename()
                .unwrap_or_default()
                .to_string();

            if filename.is_empty() {
                form.empty_selection = true;
                drain(&mut field).await?;
                continue;
            }
            if !is_allowed_video(&filename) {
                return Err(DashboardError::UnsupportedFormat(filename));
            }

            let original = sanitize_filename(&filename);
            let stored = format!("{}_{}", name, original);
            let bytes = write_field(
                &mut field,
                &staging.join(&stored),
                store.max_file_bytes(),
                &name,
            )
            .await?;

            log::info!("Received {} ({} bytes) as {}", filename, bytes, stored);
            form.videos[slot] = Some(StagedVideo { original, stored });
        } else if name == "session_id" {
            let value = read_text(&mut field).await?;
            let value = value.trim();
            if !value.is_empty() {
                form.session_id = Some(value.to_string());
            }
        } else {
            log::debug!("Ignoring form field '{}'", name);
            drain(&mut field).await?;
        }
    }

    Ok(form)
}

/// Stream a file field to disk, failing as soon as it passes `limit` bytes
async fn write_field(
    field: &mut Field,
    dest: &Path,
    limit: u64,
    label: &str,
) -> Result<u64, DashboardError> {
    let mut file = fs::File::create(dest).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(malformed)?;
        written += data.len() as u64;
        if written > limit {
            return Err(DashboardError::PayloadTooLarge(format!(
                "{} exceeds the limit of {} bytes",
                label, limit
            )));
        }
        file.write_all(&data).await?;
    }

    file.flush().await?;
    Ok(written)
}

async fn read_text(field: &mut Field) -> Result<String, DashboardError> {
    let mut buf = Vec::new();

    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(malformed)?;
        if buf.len() + data.len() > MAX_TEXT_FIELD_BYTES {
            return Err(DashboardError::InvalidInput("Form field too long".to_string()));
        }
        buf.extend_from_slice(&data);
    }

    String::from_utf8(buf)
        .map_err(|_| DashboardError::InvalidInput("Form field is not valid UTF-8".to_string()))
}

async fn drain(field: &mut Field) -> Result<(), DashboardError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(malformed)?;
    }
    Ok(())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/compare", web::post().to(compare_videos));
}
