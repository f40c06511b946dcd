use crate::skills::repo_types::Skill;
use sqlx::PgPool;
use uuid::Uuid;

const SKILL_COLUMNS: &str = "id, title, description, category, images, owner_id, created_at";

impl Skill {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Skill>, sqlx::Error> {
        sqlx::query_as::<_, Skill>(&format!(
            r#"SELECT {SKILL_COLUMNS} FROM skills WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_owner_and_title(
        db: &PgPool,
        owner_id: Uuid,
        title: &str,
    ) -> Result<Option<Skill>, sqlx::Error> {
        sqlx::query_as::<_, Skill>(&format!(
            r#"SELECT {SKILL_COLUMNS} FROM skills WHERE owner_id = $1 AND title = $2"#
        ))
        .bind(owner_id)
        .bind(title)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        owner_id: Uuid,
        title: &str,
        description: &str,
        category: &str,
        images: &[String],
    ) -> Result<Skill, sqlx::Error> {
        sqlx::query_as::<_, Skill>(&format!(
            r#"
            INSERT INTO skills (owner_id, title, description, category, images)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SKILL_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(images)
        .fetch_one(db)
        .await
    }
}
