//! # Chat Wire Protocol
//!
//! JSON events exchanged over the websocket, tagged by a `type` field.
//!
//! Every client request that expects an answer (`register`, `add_friend`)
//! receives exactly one ack event. `private_message` has no direct ack; it
//! triggers server-initiated `private_message` or `system_message` events.

use serde::{Deserialize, Serialize};

/// Identity presented by the registration handshake.
///
/// Clients either send a bare username (unauthenticated flow, the server
/// creates or looks up the user record) or the trusted `{username, code}`
/// pair obtained from a prior `/api/login` (pre-authenticated flow, no
/// identity-store round-trip).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandshakeRequest {
    PreAuthenticated { username: String, code: String },
    UsernameOnly(String),
}

/// Event sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Register {
        identity: HandshakeRequest,
    },
    AddFriend {
        friend_code: String,
    },
    PrivateMessage {
        to_code: String,
        message: String,
    },
}

/// Event sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Ack for a `register` request.
    RegisterAck {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Ack for an `add_friend` request.
    AddFriendAck {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Full list of online usernames, pushed to all connections on every
    /// presence change and to each new connection immediately on connect.
    OnlineUsers { users: Vec<String> },
    /// A chat message. `self` is set on the copy echoed back to the sender
    /// so both ends can render the same thread without optimistic appends.
    PrivateMessage {
        from: String,
        message: String,
        #[serde(rename = "self", default, skip_serializing_if = "is_false")]
        to_self: bool,
    },
    /// Server-generated notice to one client, not a chat message.
    SystemMessage { recipient: String, text: String },
}

fn is_false(value: &bool) -> bool {
    !value
}

impl ServerEvent {
    /// Successful register ack carrying the bound identity.
    pub fn register_ok(username: String, user_code: String) -> Self {
        ServerEvent::RegisterAck {
            success: true,
            username: Some(username),
            user_code: Some(user_code),
            message: None,
        }
    }

    /// Failed register ack with a reason.
    pub fn register_err(message: impl Into<String>) -> Self {
        ServerEvent::RegisterAck {
            success: false,
            username: None,
            user_code: None,
            message: Some(message.into()),
        }
    }

    /// Successful add-friend ack carrying the friend's public identity.
    pub fn add_friend_ok(username: String, code: String) -> Self {
        ServerEvent::AddFriendAck {
            success: true,
            username: Some(username),
            code: Some(code),
            message: None,
        }
    }

    /// Failed add-friend ack with a reason.
    pub fn add_friend_err(message: impl Into<String>) -> Self {
        ServerEvent::AddFriendAck {
            success: false,
            username: None,
            code: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_with_bare_username() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"register","identity":"ana"}"#).unwrap();

        assert_eq!(
            event,
            ClientEvent::Register {
                identity: HandshakeRequest::UsernameOnly("ana".to_string()),
            }
        );
    }

    #[test]
    fn test_register_with_preauthenticated_pair() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"register","identity":{"username":"ana","code":"ABC123"}}"#,
        )
        .unwrap();

        assert_eq!(
            event,
            ClientEvent::Register {
                identity: HandshakeRequest::PreAuthenticated {
                    username: "ana".to_string(),
                    code: "ABC123".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_private_message_event() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"private_message","to_code":"XYZ789","message":"hola"}"#,
        )
        .unwrap();

        assert_eq!(
            event,
            ClientEvent::PrivateMessage {
                to_code: "XYZ789".to_string(),
                message: "hola".to_string(),
            }
        );
    }

    #[test]
    fn test_self_flag_omitted_when_unset() {
        let event = ServerEvent::PrivateMessage {
            from: "ana".to_string(),
            message: "hola".to_string(),
            to_self: false,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("self"));

        let echo = ServerEvent::PrivateMessage {
            from: "ana".to_string(),
            message: "hola".to_string(),
            to_self: true,
        };

        let json = serde_json::to_string(&echo).unwrap();
        assert!(json.contains(r#""self":true"#));
    }

    #[test]
    fn test_register_ack_wire_shape() {
        let ack = ServerEvent::register_ok("ana".to_string(), "ABC123".to_string());
        let json = serde_json::to_string(&ack).unwrap();

        assert_eq!(
            json,
            r#"{"type":"register_ack","success":true,"username":"ana","user_code":"ABC123"}"#
        );
    }
}
