use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    skills::{dto::CreateSkillRequest, repo_types::Skill},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/skills/:id", get(get_skill))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/skills", post(create_skill))
}

#[instrument(skip(state, identity, payload))]
pub async fn create_skill(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateSkillRequest>,
) -> Result<(StatusCode, Json<Skill>), ApiError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".into()));
    }

    // Один владелец — один навык с таким названием
    if Skill::find_by_owner_and_title(&state.db, identity.sub, title)
        .await?
        .is_some()
    {
        warn!(user_id = %identity.sub, %title, "duplicate skill title");
        return Err(ApiError::Conflict(format!(
            "Skill \"{title}\" already exists"
        )));
    }

    let skill = Skill::create(
        &state.db,
        identity.sub,
        title,
        &payload.description,
        &payload.category,
        &payload.images,
    )
    .await?;

    info!(skill_id = %skill.id, user_id = %identity.sub, "skill created");
    Ok((StatusCode::CREATED, Json(skill)))
}

#[instrument(skip(state))]
pub async fn get_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Skill>, ApiError> {
    let skill = Skill::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Skill not found".into()))?;
    Ok(Json(skill))
}
