use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Exchange-request state machine: pending is the only non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Request row joined with both parties and both skills.
///
/// Flat projection straight from the SQL join; the nested client view is
/// assembled in `dto`.
#[derive(Debug, Clone, FromRow)]
pub struct RequestRelationsRow {
    pub id: Uuid,
    pub status: RequestStatus,
    pub is_read: bool,
    pub created_at: OffsetDateTime,

    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_avatar: Option<String>,

    pub receiver_id: Uuid,
    pub receiver_name: String,
    pub receiver_avatar: Option<String>,

    pub requested_skill_id: Uuid,
    pub requested_skill_title: String,
    pub requested_skill_description: String,
    pub requested_skill_category: String,
    pub requested_skill_images: Vec<String>,

    pub offered_skill_id: Uuid,
    pub offered_skill_title: String,
    pub offered_skill_description: String,
    pub offered_skill_category: String,
    pub offered_skill_images: Vec<String>,
}

/// Minimal projection locked inside the accept transaction.
#[derive(Debug, FromRow)]
pub struct DecisionRow {
    pub status: RequestStatus,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub requested_skill_id: Uuid,
    pub offered_skill_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<RequestStatus>("\"accepted\"").unwrap(),
            RequestStatus::Accepted
        );
        assert_eq!(
            serde_json::from_str::<RequestStatus>("\"rejected\"").unwrap(),
            RequestStatus::Rejected
        );
    }
}
