//! Handlers for `/files` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/files/photo` | multipart: `file`, optional `account_id` |
//! | `POST`   | `/files/certificate` | multipart: `file`, optional `account_id` |
//! | `GET`    | `/files` | Admins see all files, alumni their own |
//! | `GET`    | `/files/{id}` | Metadata only |
//! | `DELETE` | `/files/{id}` | Removes metadata, then the bytes |
//!
//! Bytes land in the configured upload directory as `<uuid><ext>`. The
//! metadata row is only written after the bytes are on disk, and the bytes
//! are removed again if that write fails.

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use bytes::Bytes;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracer_core::{
  actor::Actor,
  store::RecordStore,
  upload::{StoredFile, UploadKind},
};
use uuid::Uuid;

use crate::{ApiState, Listing, auth::AuthUser, error::ApiError};

/// The parts of an upload form we care about.
struct UploadForm {
  bytes:         Bytes,
  original_name: String,
  media_type:    String,
  account_id:    Option<Uuid>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
  let mut file = None;
  let mut account_id = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(e.to_string()))?
  {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some("file") => {
        let original_name = field.file_name().unwrap_or("upload").to_owned();
        let media_type = field
          .content_type()
          .unwrap_or("application/octet-stream")
          .to_ascii_lowercase();
        let bytes = field
          .bytes()
          .await
          .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        file = Some((bytes, original_name, media_type));
      }
      Some("account_id") => {
        let raw = field
          .text()
          .await
          .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let raw = raw.trim();
        if !raw.is_empty() {
          account_id = Some(
            Uuid::parse_str(raw)
              .map_err(|_| ApiError::BadRequest(format!("invalid account_id {raw:?}")))?,
          );
        }
      }
      _ => {}
    }
  }

  let (bytes, original_name, media_type) =
    file.ok_or_else(|| ApiError::BadRequest("missing multipart field \"file\"".into()))?;
  Ok(UploadForm { bytes, original_name, media_type, account_id })
}

fn extension_for(media_type: &str) -> &'static str {
  match media_type {
    "image/jpeg" | "image/jpg" => ".jpg",
    "image/png" => ".png",
    "application/pdf" => ".pdf",
    _ => "",
  }
}

async fn upload<S: RecordStore + 'static>(
  state: ApiState<S>,
  actor: Actor,
  kind: UploadKind,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
  let form = read_form(multipart).await?;
  let size = form.bytes.len() as u64;
  let owner = state
    .registry
    .authorize_upload(&actor, form.account_id, kind, &form.media_type, size)
    .await?;

  let file_id = Uuid::new_v4();
  let file_name = format!("{file_id}{}", extension_for(&form.media_type));
  let path = state.upload_dir.join(&file_name);

  tokio::fs::create_dir_all(state.upload_dir.as_path()).await?;
  tokio::fs::write(&path, &form.bytes).await?;

  let record = StoredFile {
    file_id,
    account_id: owner,
    kind,
    file_name,
    original_name: form.original_name,
    path: path.to_string_lossy().into_owned(),
    size,
    media_type: form.media_type,
    content_hash: hex::encode(Sha256::digest(&form.bytes)),
    uploaded_at: Utc::now(),
  };

  match state.registry.record_file(record).await {
    Ok(stored) => Ok((StatusCode::CREATED, Json(stored))),
    Err(e) => {
      if let Err(rm) = tokio::fs::remove_file(&path).await {
        tracing::warn!(path = %path.display(), error = %rm, "failed to remove orphaned upload");
      }
      Err(e.into())
    }
  }
}

/// `POST /files/photo`
pub async fn upload_photo<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
  upload(state, actor, UploadKind::Photo, multipart).await
}

/// `POST /files/certificate`
pub async fn upload_certificate<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
  upload(state, actor, UploadKind::Certificate, multipart).await
}

/// `GET /files`
pub async fn list<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
) -> Result<Json<Listing<StoredFile>>, ApiError> {
  Ok(Json(state.registry.list_files(&actor).await?.into()))
}

/// `GET /files/{id}`
pub async fn get_one<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<StoredFile>, ApiError> {
  Ok(Json(state.registry.get_file(&actor, id).await?))
}

/// `DELETE /files/{id}`
pub async fn delete_one<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let file = state.registry.delete_file(&actor, id).await?;
  match tokio::fs::remove_file(&file.path).await {
    Ok(()) => {}
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      tracing::warn!(file = %id, path = %file.path, "file bytes already missing");
    }
    Err(e) => return Err(e.into()),
  }
  Ok(StatusCode::NO_CONTENT)
}
