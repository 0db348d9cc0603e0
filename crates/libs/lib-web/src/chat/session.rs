//! # Chat Session
//!
//! One websocket connection from upgrade to teardown. Each session owns an
//! unbounded outbound channel; the presence table and other sessions push
//! events into it and the session loop writes them to the socket.
//!
//! Lifecycle: connect -> (optional) register handshake -> bound traffic ->
//! disconnect cleanup. Cleanup runs on every exit path and is keyed by the
//! session's own connection id, so a crashed or replaced session can never
//! remove a newer binding for the same user.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use lib_core::model::code::unique_code;
use lib_core::model::store::{user_repository::is_unique_violation, DbPool, UserRepository};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::presence::{ConnId, ConnectionBinding, PresenceTable};
use crate::chat::protocol::{ClientEvent, HandshakeRequest, ServerEvent};
use crate::chat::router;
use crate::server::AppState;

/// Upgrade handler for `GET /ws`.
pub async fn chat_websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one websocket connection until either side closes it.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id: ConnId = Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    info!("[CHAT] Connection {} opened", conn_id);

    // New connections see who is online before they even register.
    let _ = tx.send(ServerEvent::OnlineUsers {
        users: state.presence.online_usernames(),
    });

    let mut binding: Option<ConnectionBinding> = None;

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(event) = outbound else { break };
                let payload = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("[CHAT] Failed to serialize event for {}: {}", conn_id, e);
                        continue;
                    }
                };
                if ws_tx.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => {
                                dispatch_event(
                                    &state.db,
                                    &state.presence,
                                    conn_id,
                                    &tx,
                                    &mut binding,
                                    event,
                                )
                                .await;
                            }
                            Err(e) => {
                                debug!("[CHAT] Unparseable event from {}: {}", conn_id, e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong/binary, nothing to do
                    Some(Err(e)) => {
                        debug!("[CHAT] Socket error on {}: {}", conn_id, e);
                        break;
                    }
                }
            }
        }
    }

    finish_session(&state.presence, conn_id, binding.as_ref());

    info!("[CHAT] Connection {} closed", conn_id);
}

/// Tear down a connection's presence state.
///
/// Unbound connections leave no trace. For bound ones the removal is keyed
/// by `conn_id`, and the updated online-user list is broadcast exactly once,
/// only when an entry was actually removed.
pub(crate) fn finish_session(
    presence: &PresenceTable,
    conn_id: ConnId,
    binding: Option<&ConnectionBinding>,
) {
    let Some(binding) = binding else { return };

    if presence.set_offline(conn_id, binding) {
        info!("[CHAT] {} went offline ({})", binding.username, conn_id);
        presence.broadcast_presence();
    }
}

/// Apply one client event to the connection's state.
pub(crate) async fn dispatch_event(
    pool: &DbPool,
    presence: &PresenceTable,
    conn_id: ConnId,
    tx: &UnboundedSender<ServerEvent>,
    binding: &mut Option<ConnectionBinding>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Register { identity } => {
            let ack = handle_register(pool, presence, conn_id, tx, binding, identity).await;
            let _ = tx.send(ack);
        }
        ClientEvent::AddFriend { friend_code } => {
            let ack = match binding.as_ref() {
                Some(requester) => router::add_friend(pool, requester, &friend_code).await,
                None => ServerEvent::add_friend_err("Register first"),
            };
            let _ = tx.send(ack);
        }
        ClientEvent::PrivateMessage { to_code, message } => {
            router::route_private_message(
                presence,
                pool,
                binding.as_ref(),
                tx,
                &to_code,
                &message,
            )
            .await;
        }
    }
}

/// Run the registration handshake for this connection.
///
/// Resolves the claimed identity against the durable store (creating the user
/// for a fresh bare username), then binds it in the presence table. Returns
/// the single ack the client is owed; on success the presence change has
/// already been broadcast.
pub(crate) async fn handle_register(
    pool: &DbPool,
    presence: &PresenceTable,
    conn_id: ConnId,
    tx: &UnboundedSender<ServerEvent>,
    binding: &mut Option<ConnectionBinding>,
    identity: HandshakeRequest,
) -> ServerEvent {
    // A bound connection may repeat the same handshake (client retry after a
    // dropped ack) but may not switch identities.
    if let Some(current) = binding.as_ref() {
        let same_identity = match &identity {
            HandshakeRequest::PreAuthenticated { username, code } => {
                current.username == *username && current.code == *code
            }
            HandshakeRequest::UsernameOnly(username) => current.username == *username,
        };
        return if same_identity {
            ServerEvent::register_ok(current.username.clone(), current.code.clone())
        } else {
            ServerEvent::register_err("Connection is already registered")
        };
    }

    let resolved = match identity {
        HandshakeRequest::PreAuthenticated { username, code } => {
            if username.trim().is_empty() || code.trim().is_empty() {
                return ServerEvent::register_err("Username and code are required");
            }
            ConnectionBinding { username, code }
        }
        HandshakeRequest::UsernameOnly(raw) => {
            let username = raw.trim().to_string();
            if username.is_empty() {
                return ServerEvent::register_err("Username is required");
            }
            match resolve_or_create_user(pool, &username).await {
                Ok(binding) => binding,
                Err(ack) => return ack,
            }
        }
    };

    if !presence.set_online(conn_id, &resolved, tx.clone()) {
        return ServerEvent::register_err("That user is already online");
    }

    info!("[CHAT] {} came online ({})", resolved.username, conn_id);
    let ack = ServerEvent::register_ok(resolved.username.clone(), resolved.code.clone());
    *binding = Some(resolved);
    presence.broadcast_presence();
    ack
}

/// Look up `username` in the identity store, creating the record when it does
/// not exist yet. Two connections racing to create the same new username are
/// serialized by the UNIQUE constraint: the loser re-reads the winner's row.
async fn resolve_or_create_user(
    pool: &DbPool,
    username: &str,
) -> Result<ConnectionBinding, ServerEvent> {
    match UserRepository::find_by_username(pool, username).await {
        Ok(Some(user)) => {
            return Ok(ConnectionBinding {
                username: user.username,
                code: user.code,
            })
        }
        Ok(None) => {}
        Err(e) => {
            warn!("[CHAT] User lookup failed for {}: {}", username, e);
            return Err(ServerEvent::register_err("Registration failed, try again"));
        }
    }

    let code = match unique_code(pool).await {
        Ok(code) => code,
        Err(e) => {
            warn!("[CHAT] Code generation failed for {}: {}", username, e);
            return Err(ServerEvent::register_err("Registration failed, try again"));
        }
    };

    // Chat-only users have no password; the HTTP login path rejects them
    // until they register a password through /api/register.
    match UserRepository::create(pool, username, &code, "").await {
        Ok(user) => Ok(ConnectionBinding {
            username: user.username,
            code: user.code,
        }),
        Err(e) if is_unique_violation(&e) => {
            match UserRepository::find_by_username(pool, username).await {
                Ok(Some(user)) => Ok(ConnectionBinding {
                    username: user.username,
                    code: user.code,
                }),
                Ok(None) => {
                    warn!("[CHAT] Lost creation race for {} but no row found", username);
                    Err(ServerEvent::register_err("Registration failed, try again"))
                }
                Err(e) => {
                    warn!("[CHAT] Re-read after creation race failed for {}: {}", username, e);
                    Err(ServerEvent::register_err("Registration failed, try again"))
                }
            }
        }
        Err(e) => {
            warn!("[CHAT] User creation failed for {}: {}", username, e);
            Err(ServerEvent::register_err("Registration failed, try again"))
        }
    }
}

// ========== Tests ==========
