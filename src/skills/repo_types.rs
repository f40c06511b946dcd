use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Skill record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub images: Vec<String>, // ordered list of URIs
    pub owner_id: Uuid,
    pub created_at: OffsetDateTime,
}
