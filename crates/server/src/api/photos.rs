use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};

use vanish_core::{ConsumedPhoto, PhotoId, ReceiptId, ViewTokenId};
use vanish_vault::UploadRequest;

use super::AppState;
use super::schemas::{BurnResponse, FetchQuery, Success, UnlockRequest};
use crate::error::ServerError;

/// The `photo` part of an upload.
struct PhotoPart {
    bytes: Bytes,
    filename: Option<String>,
    content_type: Option<String>,
}

/// `POST /photos/upload` -- store a photo and return the uploader's receipt.
///
/// Multipart fields: `photo` (file, required), `ttl` (integer seconds) and
/// `passphrase`.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    let mut photo = None;
    let mut ttl_seconds = None;
    let mut passphrase = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("photo") => {
                let filename = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                photo = Some(PhotoPart {
                    bytes,
                    filename,
                    content_type,
                });
            }
            Some("ttl") => {
                let text = field.text().await.map_err(bad_multipart)?;
                ttl_seconds = parse_ttl(&text)?;
            }
            Some("passphrase") => {
                passphrase = Some(field.text().await.map_err(bad_multipart)?);
            }
            _ => {}
        }
    }

    let photo = photo.ok_or_else(|| ServerError::BadRequest("no photo provided".into()))?;
    let content_type = photo.content_type.as_deref().unwrap_or_default();
    if !state.upload.allows(content_type) {
        return Err(ServerError::BadRequest(
            "invalid file type; only JPEG, PNG, GIF and WebP images are allowed".into(),
        ));
    }
    if photo.bytes.len() > state.upload.max_file_size_bytes {
        return Err(ServerError::BadRequest(format!(
            "photo exceeds the {} byte limit",
            state.upload.max_file_size_bytes
        )));
    }

    let request = UploadRequest {
        bytes: photo.bytes.to_vec(),
        filename: photo.filename,
        mime_type: photo.content_type,
        ttl_seconds,
        passphrase,
    };
    let receipt = state.vault.upload(request).await?;
    Ok(Json(Success::new(receipt)))
}

/// `GET /photos/{id}` -- deliver the photo once, then it is gone.
pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FetchQuery>,
) -> Result<Response, ServerError> {
    let id = PhotoId::from(id);
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .map(ViewTokenId::from);

    let ConsumedPhoto { meta, blob } = state.vault.fetch_guarded(&id, token.as_ref()).await?;

    let content_type = HeaderValue::from_str(&meta.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", meta.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));

    let headers = [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_LENGTH, HeaderValue::from(blob.len())),
        (header::CONTENT_DISPOSITION, disposition),
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        ),
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (
            HeaderName::from_static("x-one-time"),
            HeaderValue::from_static("true"),
        ),
    ];
    Ok((headers, blob).into_response())
}

/// `GET /photos/{id}/status`
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let status = state.vault.status_by_id(&PhotoId::from(id)).await?;
    Ok(Json(Success::new(status)))
}

/// `GET /photos/receipt/{receipt_id}/status`
pub async fn receipt_status(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let status = state
        .vault
        .status_by_receipt(&ReceiptId::from(receipt_id))
        .await?;
    Ok(Json(Success::new(status)))
}

/// `POST /photos/{id}/unlock` -- exchange the passphrase for a view token.
pub async fn unlock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UnlockRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServerError> {
    let Json(request) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let grant = state
        .vault
        .unlock(&PhotoId::from(id), &request.passphrase)
        .await?;
    Ok(Json(Success::new(grant)))
}

/// `DELETE /photos/{id}` -- destroy the photo. Succeeds even if already gone.
pub async fn burn(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    state.vault.burn(&PhotoId::from(id)).await?;
    Ok(Json(BurnResponse {
        success: true,
        message: "photo burned",
    }))
}

fn bad_multipart(e: MultipartError) -> ServerError {
    ServerError::BadRequest(format!("invalid upload: {}", e.body_text()))
}

/// Blank means "use the default"; anything else must be a non-negative integer.
fn parse_ttl(raw: &str) -> Result<Option<u64>, ServerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ServerError::BadRequest("ttl must be a whole number of seconds".into()))
}
