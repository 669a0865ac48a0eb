//! WebSocket push channel.
//!
//! Browsers can't set an Authorization header on a WebSocket handshake, so the
//! session token travels as `?token=`. After the upgrade the server only
//! sends; inbound frames other than Close are ignored.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::Query,
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::middleware::{self, AuthUser};
use crate::config::Config;
use crate::error::AppError;
use crate::notify::{Notifier, Subscription};

#[derive(Deserialize)]
pub struct EventsQuery {
    pub token: String,
}

/// GET /api/events?token=...
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Extension(notifier): Extension<Notifier>,
    Query(q): Query<EventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = middleware::authenticate(&pool, &config, &q.token).await?;
    let subscription = notifier.subscribe(user.id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user, subscription)))
}

async fn handle_socket(socket: WebSocket, user: AuthUser, mut subscription: Subscription) {
    let (mut sender, mut receiver) = socket.split();
    tracing::debug!("Event stream opened for {}", user.username);

    loop {
        tokio::select! {
            event = subscription.next() => {
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::error!("Failed to encode event: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                }
            }
        }
    }

    tracing::debug!("Event stream closed for {}", user.username);
}
