use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

/// Event kinds delivered over the notification socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationKind {
    #[serde(rename = "newRequest")]
    NewRequest,
    #[serde(rename = "requestAccepted")]
    RequestAccepted,
    #[serde(rename = "requestDeclined")]
    RequestDeclined,
}

/// Minimal sender projection shipped with every notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBrief {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub skill_title: String,
    pub from_user: UserBrief,
}

/// Per-user channel registry. One live connection per user; a reconnect
/// replaces the previous sender.
#[derive(Clone, Default)]
pub struct Notifier {
    clients: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<NotificationPayload>>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    async fn register(&self, user_id: Uuid) -> mpsc::UnboundedReceiver<NotificationPayload> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.write().await.insert(user_id, tx);
        rx
    }

    async fn unregister(&self, user_id: Uuid) {
        self.clients.write().await.remove(&user_id);
        info!(%user_id, "notification client disconnected");
    }

    /// Fire-and-forget delivery. No connected receiver, or a receiver that
    /// went away, drops the payload silently.
    pub async fn notify_user(&self, user_id: Uuid, payload: NotificationPayload) {
        let clients = self.clients.read().await;
        match clients.get(&user_id) {
            Some(tx) => {
                if tx.send(payload).is_err() {
                    debug!(%user_id, "notification channel closed, dropping");
                }
            }
            None => debug!(%user_id, "no connected client, dropping notification"),
        }
    }

    pub async fn connected(&self, user_id: Uuid) -> bool {
        self.clients.read().await.contains_key(&user_id)
    }
}

/// Cookie-authenticated upgrade; the socket only pushes, client frames are
/// ignored apart from close.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, identity.sub))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let mut rx = state.notifier.register(user_id).await;
    info!(%user_id, "notification client connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            payload = rx.recv() => {
                let Some(payload) = payload else { break };
                let Ok(text) = serde_json::to_string(&payload) else { continue };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    state.notifier.unregister(user_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(kind: NotificationKind) -> NotificationPayload {
        NotificationPayload {
            kind,
            skill_title: "Guitar lessons".into(),
            from_user: UserBrief {
                id: Uuid::new_v4(),
                name: "Alice".into(),
                avatar: None,
            },
        }
    }

    #[test]
    fn payload_wire_shape() {
        let json =
            serde_json::to_value(payload(NotificationKind::NewRequest)).unwrap();
        assert_eq!(json["type"], "newRequest");
        assert_eq!(json["skillTitle"], "Guitar lessons");
        assert_eq!(json["fromUser"]["name"], "Alice");
        assert!(json["fromUser"].get("avatar").is_none());
    }

    #[test]
    fn all_kinds_serialize_as_expected() {
        for (kind, wire) in [
            (NotificationKind::NewRequest, "newRequest"),
            (NotificationKind::RequestAccepted, "requestAccepted"),
            (NotificationKind::RequestDeclined, "requestDeclined"),
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), wire);
        }
    }

    #[tokio::test]
    async fn notify_delivers_to_registered_user() {
        let notifier = Notifier::new();
        let user_id = Uuid::new_v4();
        let mut rx = notifier.register(user_id).await;

        notifier
            .notify_user(user_id, payload(NotificationKind::RequestAccepted))
            .await;

        let got = rx.recv().await.expect("payload delivered");
        assert_eq!(got.kind, NotificationKind::RequestAccepted);
    }

    #[tokio::test]
    async fn notify_without_client_is_a_silent_noop() {
        let notifier = Notifier::new();
        // Must not panic or error
        notifier
            .notify_user(Uuid::new_v4(), payload(NotificationKind::NewRequest))
            .await;
    }

    #[tokio::test]
    async fn unregister_stops_delivery() {
        let notifier = Notifier::new();
        let user_id = Uuid::new_v4();
        let _rx = notifier.register(user_id).await;
        assert!(notifier.connected(user_id).await);

        notifier.unregister(user_id).await;
        assert!(!notifier.connected(user_id).await);
        notifier
            .notify_user(user_id, payload(NotificationKind::NewRequest))
            .await;
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_fail_notify() {
        let notifier = Notifier::new();
        let user_id = Uuid::new_v4();
        let rx = notifier.register(user_id).await;
        drop(rx);
        notifier
            .notify_user(user_id, payload(NotificationKind::NewRequest))
            .await;
    }
}
