use tracing::info;
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    error::{ApiError, ApiResult},
    notifications::{NotificationKind, NotificationPayload, UserBrief},
    requests::{
        dto::{CreateRequestBody, RequestView},
        repo,
        repo_types::{RequestRelationsRow, RequestStatus},
    },
    skills::repo_types::Skill,
    state::AppState,
};

/// Submit a new exchange request. Validation is fail-fast, in this order:
/// equal skill ids, missing sender, missing requested skill, missing offered
/// skill. The receiver is derived from the requested skill's owner.
pub async fn create(
    state: &AppState,
    sender_id: Uuid,
    body: CreateRequestBody,
) -> ApiResult<RequestView> {
    if body.requested_skill_id == body.offered_skill_id {
        return Err(ApiError::Conflict(
            "requestedSkillId and offeredSkillId must be different".into(),
        ));
    }

    let sender = User::find_by_id(&state.db, sender_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Sender not found".into()))?;

    let requested_skill = Skill::find_by_id(&state.db, body.requested_skill_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Requested skill not found".into()))?;

    let offered_skill = Skill::find_by_id(&state.db, body.offered_skill_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Offered skill not found".into()))?;

    let receiver_id = requested_skill.owner_id;

    let request_id = repo::insert(
        &state.db,
        sender.id,
        receiver_id,
        requested_skill.id,
        offered_skill.id,
    )
    .await?;

    let row = repo::find_relations(&state.db, request_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;

    info!(%request_id, sender_id = %sender.id, %receiver_id, "exchange request created");

    state
        .notifier
        .notify_user(
            receiver_id,
            NotificationPayload {
                kind: NotificationKind::NewRequest,
                skill_title: requested_skill.title,
                from_user: UserBrief {
                    id: sender.id,
                    name: sender.name,
                    avatar: sender.avatar,
                },
            },
        )
        .await;

    Ok(row.into())
}

/// Requests addressed to `user_id`, newest first. An empty result set is
/// NOT_FOUND, not an empty list — observable behavior kept as-is.
pub async fn find_incoming(state: &AppState, user_id: Uuid) -> ApiResult<Vec<RequestView>> {
    let rows = repo::list_for_receiver(&state.db, user_id).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound("Incoming requests not found".into()));
    }
    Ok(rows.into_iter().map(RequestView::from).collect())
}

pub async fn find_outgoing(state: &AppState, user_id: Uuid) -> ApiResult<Vec<RequestView>> {
    let rows = repo::list_for_sender(&state.db, user_id).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound("Outgoing requests not found".into()));
    }
    Ok(rows.into_iter().map(RequestView::from).collect())
}

/// Only the receiver may decide, and only while the request is pending.
fn authorize_decision(request: &RequestRelationsRow, acting_user: Uuid) -> ApiResult<()> {
    if request.receiver_id != acting_user {
        return Err(ApiError::Forbidden(
            "You can update only incoming requests".into(),
        ));
    }
    if request.status != RequestStatus::Pending {
        return Err(ApiError::Conflict("Request status is already updated".into()));
    }
    Ok(())
}

/// A decision is a transition to a terminal state; re-submitting `pending`
/// names no edge of the state machine.
fn validate_decision(new_status: RequestStatus) -> ApiResult<()> {
    if new_status == RequestStatus::Pending {
        return Err(ApiError::BadRequest(
            "Status must be accepted or rejected".into(),
        ));
    }
    Ok(())
}

pub async fn update_status(
    state: &AppState,
    request_id: Uuid,
    new_status: RequestStatus,
    acting_user: Uuid,
) -> ApiResult<RequestView> {
    let request = repo::find_relations(&state.db, request_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;

    authorize_decision(&request, acting_user)?;
    validate_decision(new_status)?;

    let decided = match new_status {
        RequestStatus::Accepted => repo::accept_if_pending(&state.db, request_id).await?,
        RequestStatus::Rejected => repo::reject_if_pending(&state.db, request_id).await?,
        RequestStatus::Pending => unreachable!(),
    };

    // Lost the race against a concurrent decision
    if !decided {
        return Err(ApiError::Conflict("Request status is already updated".into()));
    }

    let updated = repo::find_relations(&state.db, request_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;

    info!(%request_id, status = ?new_status, "exchange request decided");

    let kind = match new_status {
        RequestStatus::Accepted => NotificationKind::RequestAccepted,
        _ => NotificationKind::RequestDeclined,
    };
    state
        .notifier
        .notify_user(
            updated.sender_id,
            NotificationPayload {
                kind,
                skill_title: updated.requested_skill_title.clone(),
                from_user: UserBrief {
                    id: updated.receiver_id,
                    name: updated.receiver_name.clone(),
                    avatar: updated.receiver_avatar.clone(),
                },
            },
        )
        .await;

    Ok(updated.into())
}

/// Delete an outgoing request. Any status is deletable; mirrored skills from
/// an accepted request stay in place.
pub async fn remove_outgoing(
    state: &AppState,
    request_id: Uuid,
    acting_user: Uuid,
) -> ApiResult<()> {
    let request = repo::find_relations(&state.db, request_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;

    if request.sender_id != acting_user {
        return Err(ApiError::Forbidden(
            "You can delete only outgoing requests".into(),
        ));
    }

    repo::delete(&state.db, request_id).await?;
    info!(%request_id, "exchange request deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn row(status: RequestStatus) -> RequestRelationsRow {
        RequestRelationsRow {
            id: Uuid::new_v4(),
            status,
            is_read: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            sender_id: Uuid::new_v4(),
            sender_name: "Sender".into(),
            sender_avatar: None,
            receiver_id: Uuid::new_v4(),
            receiver_name: "Receiver".into(),
            receiver_avatar: None,
            requested_skill_id: Uuid::new_v4(),
            requested_skill_title: "Requested".into(),
            requested_skill_description: String::new(),
            requested_skill_category: String::new(),
            requested_skill_images: vec![],
            offered_skill_id: Uuid::new_v4(),
            offered_skill_title: "Offered".into(),
            offered_skill_description: String::new(),
            offered_skill_category: String::new(),
            offered_skill_images: vec![],
        }
    }

    #[test]
    fn only_the_receiver_may_decide() {
        let request = row(RequestStatus::Pending);
        let err = authorize_decision(&request, request.sender_id).unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
        assert_eq!(err.to_string(), "You can update only incoming requests");
    }

    #[test]
    fn receiver_may_decide_pending_request() {
        let request = row(RequestStatus::Pending);
        assert!(authorize_decision(&request, request.receiver_id).is_ok());
    }

    #[test]
    fn terminal_request_cannot_be_redecided() {
        for status in [RequestStatus::Accepted, RequestStatus::Rejected] {
            let request = row(status);
            let err = authorize_decision(&request, request.receiver_id).unwrap_err();
            assert_eq!(err.error_code(), "CONFLICT");
            assert_eq!(err.to_string(), "Request status is already updated");
        }
    }

    #[test]
    fn forbidden_wins_over_conflict_for_non_receiver() {
        // A stranger hitting a decided request sees FORBIDDEN, not CONFLICT
        let request = row(RequestStatus::Accepted);
        let err = authorize_decision(&request, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn equal_skill_ids_conflict_before_any_lookup() {
        // Fail-fast: equal ids conflict even though nothing exists and the
        // fake state's pool is never connected
        let state = crate::state::AppState::fake();
        let id = Uuid::new_v4();
        let err = create(
            &state,
            Uuid::new_v4(),
            CreateRequestBody {
                requested_skill_id: id,
                offered_skill_id: id,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "CONFLICT");
        assert_eq!(
            err.to_string(),
            "requestedSkillId and offeredSkillId must be different"
        );
    }

    #[test]
    fn pending_is_not_a_valid_decision() {
        let err = validate_decision(RequestStatus::Pending).unwrap_err();
        assert_eq!(err.error_code(), "BAD_REQUEST");
        assert!(validate_decision(RequestStatus::Accepted).is_ok());
        assert!(validate_decision(RequestStatus::Rejected).is_ok());
    }
}
