use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminUser;
use crate::entities::beat;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::catalog::{CreateBeatInput, UpdateBeatInput};
use crate::ApiResponse;

#[derive(Debug, Validate)]
struct BeatUploadFields {
    #[validate(length(min = 1))]
    title: String,
    #[validate(length(min = 1))]
    artist: String,
    #[validate(length(min = 1))]
    genre: String,
    price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBeatRequest {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub artist: Option<String>,
    #[validate(length(min = 1))]
    pub genre: Option<String>,
    pub price: Option<Decimal>,
}

/// List all beats in the catalog
#[utoipa::path(
    get,
    path = "/api/v1/beats",
    responses(
        (status = 200, description = "Catalog listing", body = crate::ApiResponse<Vec<beat::Model>>)
    ),
    tag = "Beats"
)]
pub async fn list_beats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<beat::Model>>>, ServiceError> {
    let beats = state.services.catalog.list_beats().await?;
    Ok(Json(ApiResponse::success(beats)))
}

/// Get a single beat
#[utoipa::path(
    get,
    path = "/api/v1/beats/:id",
    params(("id" = Uuid, Path, description = "Beat ID")),
    responses(
        (status = 200, description = "Beat details", body = crate::ApiResponse<beat::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Beats"
)]
pub async fn get_beat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<beat::Model>>, ServiceError> {
    let beat = state.services.catalog.get_beat(id).await?;
    Ok(Json(ApiResponse::success(beat)))
}

/// Upload a new beat (multipart: metadata fields + audio_file + optional image)
#[utoipa::path(
    post,
    path = "/api/v1/beats",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Beat uploaded", body = crate::ApiResponse<beat::Model>),
        (status = 400, description = "Missing field or file", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admins only", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Beats"
)]
pub async fn upload_beat(
    State(state): State<AppState>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<beat::Model>>), ServiceError> {
    let mut title = None;
    let mut artist = None;
    let mut genre = None;
    let mut price = None;
    let mut audio: Option<(String, Vec<u8>)> = None;
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(read_text(field).await?),
            "artist" => artist = Some(read_text(field).await?),
            "genre" => genre = Some(read_text(field).await?),
            "price" => {
                let raw = read_text(field).await?;
                let parsed: Decimal = raw.parse().map_err(|_| {
                    ServiceError::ValidationError(format!("invalid price: {}", raw))
                })?;
                price = Some(parsed);
            }
            "audio_file" => audio = Some(read_file(field).await?),
            "image" => image = Some(read_file(field).await?),
            _ => {}
        }
    }

    let fields = BeatUploadFields {
        title: title.ok_or_else(|| ServiceError::ValidationError("title is required".into()))?,
        artist: artist.ok_or_else(|| ServiceError::ValidationError("artist is required".into()))?,
        genre: genre.ok_or_else(|| ServiceError::ValidationError("genre is required".into()))?,
        price: price.ok_or_else(|| ServiceError::ValidationError("price is required".into()))?,
    };
    fields.validate()?;

    let (audio_name, audio_bytes) = audio
        .ok_or_else(|| ServiceError::ValidationError("Audio file is required!".to_string()))?;
    let stored_audio = state
        .services
        .file_store
        .save_audio(&audio_name, &audio_bytes)
        .await?;

    let image_url = match image {
        Some((image_name, image_bytes)) => Some(
            state
                .services
                .file_store
                .save_image(&image_name, &image_bytes)
                .await?
                .url,
        ),
        None => None,
    };

    let created = state
        .services
        .catalog
        .create_beat(CreateBeatInput {
            title: fields.title,
            artist: fields.artist,
            genre: fields.genre,
            price: fields.price,
            audio_file: stored_audio.url,
            image: image_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ServiceError> {
    field
        .text()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("invalid multipart field: {}", e)))
}

async fn read_file(
    field: axum::extract::multipart::Field<'_>,
) -> Result<(String, Vec<u8>), ServiceError> {
    let name = field.file_name().unwrap_or("upload.bin").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("invalid multipart file: {}", e)))?;
    Ok((name, bytes.to_vec()))
}

/// Update beat metadata
#[utoipa::path(
    put,
    path = "/api/v1/beats/:id",
    params(("id" = Uuid, Path, description = "Beat ID")),
    request_body = UpdateBeatRequest,
    responses(
        (status = 200, description = "Beat updated", body = crate::ApiResponse<beat::Model>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Beats"
)]
pub async fn update_beat(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBeatRequest>,
) -> Result<Json<ApiResponse<beat::Model>>, ServiceError> {
    request.validate()?;
    let updated = state
        .services
        .catalog
        .update_beat(
            id,
            UpdateBeatInput {
                title: request.title,
                artist: request.artist,
                genre: request.genre,
                price: request.price,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete a beat
#[utoipa::path(
    delete,
    path = "/api/v1/beats/:id",
    params(("id" = Uuid, Path, description = "Beat ID")),
    responses(
        (status = 200, description = "Beat deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Beats"
)]
pub async fn delete_beat(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.catalog.delete_beat(id).await?;
    Ok(Json(ApiResponse::success(())))
}

/// Beat catalog routes
pub fn beat_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_beats))
        .route("/", post(upload_beat))
        .route("/:id", get(get_beat))
        .route("/:id", put(update_beat))
        .route("/:id", delete(delete_beat))
}
