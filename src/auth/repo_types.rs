use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::claims::UserRole;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 hash, not exposed in JSON
    pub role: UserRole,
    pub about: Option<String>,
    pub avatar: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Credential projection loaded for the login path.
#[derive(Debug, Clone, FromRow)]
pub struct AuthUserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub refresh_token_hash: Option<String>,
}
