use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use log::*;
use service::AppState;

use crate::controller::ApiResponse;
use crate::error::Error;
use crate::response::stream::{RetiredStreamResponse, StreamSummaryResponse};
use engine::error::Error as EngineError;

/// GET all periodic streams currently registered.
#[utoipa::path(
    get,
    path = "/streams",
    responses(
        (status = 200, description = "Successfully listed all periodic streams", body = [StreamSummaryResponse])
    )
)]
pub async fn stream_index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    debug!("GET all periodic streams");

    let summaries: Vec<StreamSummaryResponse> = app_state
        .event_streams
        .list()
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), summaries)))
}

/// DELETE a periodic stream by identifier, stopping its generator and
/// disconnecting every attached viewer.
#[utoipa::path(
    delete,
    path = "/streams/{id}",
    params(
        ("id" = String, Path, description = "Stream identifier to delete")
    ),
    responses(
        (status = 200, description = "Successfully deleted the stream", body = RetiredStreamResponse),
        (status = 404, description = "Stream not found")
    )
)]
pub async fn stream_delete(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE periodic stream {id}");

    let retired = app_state
        .event_streams
        .delete(&id)
        .ok_or_else(EngineError::stream_not_found)?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        RetiredStreamResponse::from(retired),
    )))
}

/// GET all chunk streams currently registered.
#[utoipa::path(
    get,
    path = "/chunk-streams",
    responses(
        (status = 200, description = "Successfully listed all chunk streams", body = [StreamSummaryResponse])
    )
)]
pub async fn chunk_index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    debug!("GET all chunk streams");

    let summaries: Vec<StreamSummaryResponse> = app_state
        .chunk_streams
        .list()
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), summaries)))
}

/// DELETE a chunk stream by identifier.
#[utoipa::path(
    delete,
    path = "/chunk-streams/{id}",
    params(
        ("id" = String, Path, description = "Chunk stream identifier to delete")
    ),
    responses(
        (status = 200, description = "Successfully deleted the chunk stream", body = RetiredStreamResponse),
        (status = 404, description = "Chunk stream not found")
    )
)]
pub async fn chunk_delete(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE chunk stream {id}");

    let retired = app_state
        .chunk_streams
        .delete(&id)
        .ok_or_else(EngineError::stream_not_found)?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        RetiredStreamResponse::from(retired),
    )))
}
