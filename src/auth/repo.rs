use crate::auth::repo_types::{AuthUserRow, User};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, about, avatar, \
                            refresh_token_hash, created_at, updated_at";

impl User {
    /// Insert a new user. A duplicate email surfaces as a unique violation.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        about: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, about, avatar)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(about)
        .bind(avatar)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Credential projection for login: hash, role and stored refresh hash only.
    pub async fn find_auth_by_email(
        db: &PgPool,
        email: &str,
    ) -> Result<Option<AuthUserRow>, sqlx::Error> {
        sqlx::query_as::<_, AuthUserRow>(
            r#"
            SELECT id, email, password_hash, role, refresh_token_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Overwrite the stored refresh-token hash. Logout passes an empty string.
    pub async fn set_refresh_token_hash(
        db: &PgPool,
        id: Uuid,
        hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(hash)
        .execute(db)
        .await?;
        Ok(())
    }
}
