use sqlx::PgPool;
use uuid::Uuid;

use crate::requests::repo_types::{DecisionRow, RequestRelationsRow, RequestStatus};

const RELATIONS_SELECT: &str = r#"
    SELECT r.id, r.status, r.is_read, r.created_at,
           s.id   AS sender_id,
           s.name AS sender_name,
           s.avatar AS sender_avatar,
           rc.id   AS receiver_id,
           rc.name AS receiver_name,
           rc.avatar AS receiver_avatar,
           rq.id AS requested_skill_id,
           rq.title AS requested_skill_title,
           rq.description AS requested_skill_description,
           rq.category AS requested_skill_category,
           rq.images AS requested_skill_images,
           os.id AS offered_skill_id,
           os.title AS offered_skill_title,
           os.description AS offered_skill_description,
           os.category AS offered_skill_category,
           os.images AS offered_skill_images
    FROM requests r
    JOIN users s   ON s.id  = r.sender_id
    JOIN users rc  ON rc.id = r.receiver_id
    JOIN skills rq ON rq.id = r.requested_skill_id
    JOIN skills os ON os.id = r.offered_skill_id
"#;

pub async fn insert(
    db: &PgPool,
    sender_id: Uuid,
    receiver_id: Uuid,
    requested_skill_id: Uuid,
    offered_skill_id: Uuid,
) -> Result<Uuid, sqlx::Error> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO requests (sender_id, receiver_id, requested_skill_id, offered_skill_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .bind(requested_skill_id)
    .bind(offered_skill_id)
    .fetch_one(db)
    .await?;
    Ok(id)
}

pub async fn find_relations(
    db: &PgPool,
    id: Uuid,
) -> Result<Option<RequestRelationsRow>, sqlx::Error> {
    sqlx::query_as::<_, RequestRelationsRow>(&format!("{RELATIONS_SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_for_receiver(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Vec<RequestRelationsRow>, sqlx::Error> {
    sqlx::query_as::<_, RequestRelationsRow>(&format!(
        "{RELATIONS_SELECT} WHERE r.receiver_id = $1 ORDER BY r.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn list_for_sender(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Vec<RequestRelationsRow>, sqlx::Error> {
    sqlx::query_as::<_, RequestRelationsRow>(&format!(
        "{RELATIONS_SELECT} WHERE r.sender_id = $1 ORDER BY r.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Accept in one transaction: lock the row, re-check it is still pending,
/// mirror both skills to the opposite parties, flip the status. Returns
/// false when a concurrent decision won the race (or the row vanished).
pub async fn accept_if_pending(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;

    let row = sqlx::query_as::<_, DecisionRow>(
        r#"
        SELECT status, sender_id, receiver_id, requested_skill_id, offered_skill_id
        FROM requests
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        return Ok(false);
    };
    if row.status != RequestStatus::Pending {
        return Ok(false);
    }

    // requested skill goes to the sender, offered skill to the receiver
    clone_skill(&mut tx, row.requested_skill_id, row.sender_id).await?;
    clone_skill(&mut tx, row.offered_skill_id, row.receiver_id).await?;

    sqlx::query(
        r#"
        UPDATE requests
        SET status = 'accepted', is_read = true
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

async fn clone_skill(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    skill_id: Uuid,
    new_owner: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO skills (title, description, category, images, owner_id)
        SELECT title, description, category, images, $2
        FROM skills
        WHERE id = $1
        "#,
    )
    .bind(skill_id)
    .bind(new_owner)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Reject needs no transaction: a single conditional update is atomic and
/// loses cleanly to any decision that already committed.
pub async fn reject_if_pending(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE requests
        SET status = 'rejected', is_read = true
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM requests WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
