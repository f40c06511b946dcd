use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    requests::{
        dto::{CreateRequestBody, DeleteResponse, RequestView, UpdateRequestBody},
        services,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create_request))
        .route("/requests/incoming", get(get_incoming))
        .route("/requests/outgoing", get(get_outgoing))
        .route(
            "/requests/:id",
            patch(update_request_status).delete(delete_request),
        )
}

#[instrument(skip(state, identity, payload))]
pub async fn create_request(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<RequestView>), ApiError> {
    let view = services::create(&state, identity.sub, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state, identity))]
pub async fn get_incoming(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<RequestView>>, ApiError> {
    let views = services::find_incoming(&state, identity.sub).await?;
    Ok(Json(views))
}

#[instrument(skip(state, identity))]
pub async fn get_outgoing(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<RequestView>>, ApiError> {
    let views = services::find_outgoing(&state, identity.sub).await?;
    Ok(Json(views))
}

#[instrument(skip(state, identity, payload))]
pub async fn update_request_status(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequestBody>,
) -> Result<Json<RequestView>, ApiError> {
    let view = services::update_status(&state, id, payload.status, identity.sub).await?;
    Ok(Json(view))
}

#[instrument(skip(state, identity))]
pub async fn delete_request(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    services::remove_outgoing(&state, id, identity.sub).await?;
    Ok(Json(DeleteResponse {
        message: "Request deleted",
    }))
}
