use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::requests::repo_types::{RequestRelationsRow, RequestStatus};

/// Request body for submitting an exchange request. The receiver is never
/// supplied by the caller; it is derived from the requested skill's owner.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub requested_skill_id: Uuid,
    pub offered_skill_id: Uuid,
}

/// Request body for the receiver's accept/reject decision.
#[derive(Debug, Deserialize)]
pub struct UpdateRequestBody {
    pub status: RequestStatus,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PartyView {
    pub id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SkillView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub images: Vec<String>,
}

/// Client-facing request with all four relations populated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub id: Uuid,
    pub status: RequestStatus,
    pub is_read: bool,
    pub created_at: OffsetDateTime,
    pub sender: PartyView,
    pub receiver: PartyView,
    pub requested_skill: SkillView,
    pub offered_skill: SkillView,
}

impl From<RequestRelationsRow> for RequestView {
    fn from(r: RequestRelationsRow) -> Self {
        Self {
            id: r.id,
            status: r.status,
            is_read: r.is_read,
            created_at: r.created_at,
            sender: PartyView {
                id: r.sender_id,
                name: r.sender_name,
                avatar: r.sender_avatar,
            },
            receiver: PartyView {
                id: r.receiver_id,
                name: r.receiver_name,
                avatar: r.receiver_avatar,
            },
            requested_skill: SkillView {
                id: r.requested_skill_id,
                title: r.requested_skill_title,
                description: r.requested_skill_description,
                category: r.requested_skill_category,
                images: r.requested_skill_images,
            },
            offered_skill: SkillView {
                id: r.offered_skill_id,
                title: r.offered_skill_title,
                description: r.offered_skill_description,
                category: r.offered_skill_category,
                images: r.offered_skill_images,
            },
        }
    }
}
