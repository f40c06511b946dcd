use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role stored on the row and carried in the token payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// JWT payload shared by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user ID
    pub email: String,  // user email
    pub role: UserRole, // user / admin
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
}

/// Authenticated identity threaded through every gated operation.
#[derive(Debug, Clone)]
pub struct Identity {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        Self {
            sub: c.sub,
            email: c.email,
            role: c.role,
        }
    }
}
