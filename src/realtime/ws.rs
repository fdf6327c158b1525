//! Websocket endpoint that pushes task lifecycle events to clients.
//!
//! Clients authenticate at handshake with the same bearer token as the HTTP
//! API, via the `Authorization` header or a `token` query parameter, and then
//! only listen; the server ignores everything except ping and close frames.

use actix_web::{get, http::header, rt, web, HttpRequest, HttpResponse};
use actix_ws::Message;
use futures::StreamExt;
use serde::Deserialize;
use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::auth::token::{verify_token, Claims};
use crate::error::AppError;
use crate::realtime::{EventBus, TaskEvent};

#[derive(Debug, Deserialize)]
struct HandshakeQuery {
    token: Option<String>,
}

/// GET /api/events — upgrade to a websocket and stream task events.
#[get("/events")]
pub async fn events(
    req: HttpRequest,
    stream: web::Payload,
    pool: web::Data<PgPool>,
    bus: web::Data<EventBus>,
) -> Result<HttpResponse, actix_web::Error> {
    let claims = authenticate_handshake(&req, pool.get_ref()).await?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;
    let receiver = bus.subscribe();
    rt::spawn(run_session(session, msg_stream, receiver, claims.sub));

    Ok(response)
}

/// Resolve and verify the handshake credential, including the check that the
/// embedded user still exists.
async fn authenticate_handshake(req: &HttpRequest, pool: &PgPool) -> Result<Claims, AppError> {
    let header_token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    let query_token = web::Query::<HandshakeQuery>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().token);

    let token = match header_token.or(query_token) {
        Some(token) => token,
        None => {
            return Err(AppError::Unauthorized(
                "You are not logged in! Please log in to get access.".into(),
            ))
        }
    };

    let claims = verify_token(&token)?;

    let user_exists = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(pool)
        .await?;

    if user_exists.is_none() {
        return Err(AppError::Unauthorized(
            "The user belonging to this token no longer exists".into(),
        ));
    }

    Ok(claims)
}

/// Pump events to one client until it disconnects or falls irrecoverably
/// behind. Lagged clients skip events; they reconcile by refetching.
async fn run_session(
    mut session: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    mut receiver: broadcast::Receiver<TaskEvent>,
    user_id: i32,
) {
    log::info!("realtime client connected (user {})", user_id);

    loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Ok(event) => {
                    let frame = match serde_json::to_string(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            log::error!("failed to serialize {}: {}", event.kind(), e);
                            continue;
                        }
                    };
                    if session.text(frame).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "realtime client lagged, skipped {} event(s) (user {})",
                        skipped,
                        user_id
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = msg_stream.next() => match msg {
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    // Clients send nothing beyond the handshake; ignore.
                }
                Some(Err(_)) => break,
            },
        }
    }

    let _ = session.close(None).await;
    log::info!("realtime client disconnected (user {})", user_id);
}
