use actix_multipart::{Field, Multipart};
use actix_web::web::{self, BytesMut};
use actix_web::HttpResponse;
use futures::StreamExt;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::MessageResponse;
use crate::state::AppState;
use crate::storage::ImageUpload;

/// Multipart field that carries the file.
pub const IMAGE_FIELD: &str = "image";

fn malformed(err: actix_multipart::MultipartError) -> ApiError {
    ApiError::Validation(format!("Malformed upload: {}", err))
}

fn too_large(limit: usize) -> ApiError {
    if limit % (1024 * 1024) == 0 {
        ApiError::Validation(format!("File size exceeds {}MB limit", limit / (1024 * 1024)))
    } else {
        ApiError::Validation(format!("File size exceeds {} byte limit", limit))
    }
}

async fn drain(field: &mut Field) -> ApiResult<()> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(malformed)?;
    }
    Ok(())
}

/// Reads the first `image` field, enforcing the size limit while streaming so
/// an oversize body is rejected before anything reaches storage.
pub async fn read_upload(mut payload: Multipart, limit: usize) -> ApiResult<ImageUpload> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        if field.name() != IMAGE_FIELD {
            drain(&mut field).await?;
            continue;
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(ApiError::Validation("Only image files are allowed".to_string()));
        }
        let original_name = field
            .content_disposition()
            .get_filename()
            .map(str::to_string)
            .unwrap_or_else(|| "upload".to_string());

        let mut bytes = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(malformed)?;
            if bytes.len() + chunk.len() > limit {
                return Err(too_large(limit));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(ApiError::Validation("Uploaded file is empty".to_string()));
        }

        return Ok(ImageUpload {
            original_name,
            content_type,
            bytes: bytes.freeze(),
        });
    }
    Err(ApiError::Validation("No file uploaded".to_string()))
}

pub async fn list_images(state: web::Data<AppState>, _user: AuthUser) -> ApiResult<HttpResponse> {
    let images = state.images.list().await?;
    Ok(HttpResponse::Ok().json(images))
}

pub async fn upload_image(
    state: web::Data<AppState>,
    user: AuthUser,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let upload = read_upload(payload, state.max_upload_bytes).await?;
    let stored = state.images.put(upload).await?;
    log::info!("user {} uploaded {}", user.id, stored.filename);
    Ok(HttpResponse::Created().json(stored))
}

pub async fn delete_image(
    state: web::Data<AppState>,
    user: AuthUser,
    filename: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let filename = filename.into_inner();
    if filename.is_empty() {
        return Err(ApiError::Validation("Filename required".to_string()));
    }
    state.images.delete(&filename).await?;
    log::info!("user {} deleted {}", user.id, filename);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Image deleted successfully")))
}
