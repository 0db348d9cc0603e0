//! # Message Router
//!
//! Friend lookup and private-message delivery. These functions never fail the
//! connection: every outcome, including storage errors, is reported back to
//! the requesting client as a protocol event.

use lib_core::model::store::{DbPool, UserRepository};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::chat::presence::{ConnectionBinding, PresenceTable};
use crate::chat::protocol::ServerEvent;

/// Resolve a friend code to its owner's public identity.
///
/// Always returns exactly one ack event for the caller.
pub async fn add_friend(
    pool: &DbPool,
    requester: &ConnectionBinding,
    friend_code: &str,
) -> ServerEvent {
    let friend_code = friend_code.trim().to_uppercase();

    if friend_code.is_empty() {
        return ServerEvent::add_friend_err("Friend code is required");
    }
    if friend_code == requester.code {
        return ServerEvent::add_friend_err("You can't add yourself");
    }

    match UserRepository::find_by_code(pool, &friend_code).await {
        Ok(Some(user)) => {
            debug!("[CHAT] {} added friend {}", requester.username, user.username);
            ServerEvent::add_friend_ok(user.username, user.code)
        }
        Ok(None) => ServerEvent::add_friend_err("No user with that code"),
        Err(e) => {
            warn!("[CHAT] Friend lookup failed for {}: {}", friend_code, e);
            ServerEvent::add_friend_err("Lookup failed, try again")
        }
    }
}

/// Route a private message from a bound sender to the owner of `to_code`.
///
/// A live recipient gets the message and the sender gets an echo with the
/// `self` flag set, in that order. An offline-but-known recipient and an
/// unknown code each produce a single system message for the sender.
/// Unbound senders are dropped silently.
pub async fn route_private_message(
    presence: &PresenceTable,
    pool: &DbPool,
    sender: Option<&ConnectionBinding>,
    sender_tx: &UnboundedSender<ServerEvent>,
    to_code: &str,
    message: &str,
) {
    let Some(sender) = sender else {
        debug!("[CHAT] Dropping private_message from unregistered connection");
        return;
    };

    let to_code = to_code.trim().to_uppercase();

    if let Some(recipient_tx) = presence.sender_for_code(&to_code) {
        let _ = recipient_tx.send(ServerEvent::PrivateMessage {
            from: sender.username.clone(),
            message: message.to_string(),
            to_self: false,
        });
        let _ = sender_tx.send(ServerEvent::PrivateMessage {
            from: sender.username.clone(),
            message: message.to_string(),
            to_self: true,
        });
        return;
    }

    let text = match UserRepository::find_by_code(pool, &to_code).await {
        Ok(Some(user)) => format!("{} is offline", user.username),
        Ok(None) => "No user with that code".to_string(),
        Err(e) => {
            warn!("[CHAT] Recipient lookup failed for {}: {}", to_code, e);
            "Delivery failed, try again".to_string()
        }
    };

    let _ = sender_tx.send(ServerEvent::SystemMessage {
        recipient: sender.username.clone(),
        text,
    });
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    async fn setup_test_db() -> DbPool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        sqlx::query(
            r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                code TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                last_login TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .expect("Failed to create users table");

        pool
    }

    async fn seed_user(pool: &DbPool, username: &str, code: &str) {
        UserRepository::create(pool, username, code, "hash")
            .await
            .expect("Failed to seed user");
    }

    fn binding(username: &str, code: &str) -> ConnectionBinding {
        ConnectionBinding {
            username: username.to_string(),
            code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_friend_found() {
        let pool = setup_test_db().await;
        seed_user(&pool, "ben", "DEF456").await;

        let ack = add_friend(&pool, &binding("ana", "ABC123"), "DEF456").await;
        assert_eq!(
            ack,
            ServerEvent::add_friend_ok("ben".to_string(), "DEF456".to_string())
        );
    }

    #[tokio::test]
    async fn test_add_friend_normalizes_code() {
        let pool = setup_test_db().await;
        seed_user(&pool, "ben", "DEF456").await;

        let ack = add_friend(&pool, &binding("ana", "ABC123"), "  def456 ").await;
        assert!(matches!(ack, ServerEvent::AddFriendAck { success: true, .. }));
    }

    #[tokio::test]
    async fn test_add_friend_unknown_code() {
        let pool = setup_test_db().await;

        let ack = add_friend(&pool, &binding("ana", "ABC123"), "ZZZ999").await;
        assert_eq!(ack, ServerEvent::add_friend_err("No user with that code"));
    }

    #[tokio::test]
    async fn test_add_friend_own_code_rejected() {
        let pool = setup_test_db().await;
        seed_user(&pool, "ana", "ABC123").await;

        let ack = add_friend(&pool, &binding("ana", "ABC123"), "ABC123").await;
        assert_eq!(ack, ServerEvent::add_friend_err("You can't add yourself"));
    }

    #[tokio::test]
    async fn test_add_friend_empty_code_rejected() {
        let pool = setup_test_db().await;

        let ack = add_friend(&pool, &binding("ana", "ABC123"), "   ").await;
        assert_eq!(ack, ServerEvent::add_friend_err("Friend code is required"));
    }

    #[tokio::test]
    async fn test_message_to_online_recipient_delivers_both_copies() {
        let pool = setup_test_db().await;
        let presence = PresenceTable::new();

        let (ana_tx, mut ana_rx) = mpsc::unbounded_channel();
        let (ben_tx, mut ben_rx) = mpsc::unbounded_channel();
        presence.set_online(Uuid::new_v4(), &binding("ben", "DEF456"), ben_tx);

        route_private_message(
            &presence,
            &pool,
            Some(&binding("ana", "ABC123")),
            &ana_tx,
            "DEF456",
            "study at 5?",
        )
        .await;

        assert_eq!(
            ben_rx.try_recv().unwrap(),
            ServerEvent::PrivateMessage {
                from: "ana".to_string(),
                message: "study at 5?".to_string(),
                to_self: false,
            }
        );
        assert_eq!(
            ana_rx.try_recv().unwrap(),
            ServerEvent::PrivateMessage {
                from: "ana".to_string(),
                message: "study at 5?".to_string(),
                to_self: true,
            }
        );
        // Exactly one event each.
        assert!(ben_rx.try_recv().is_err());
        assert!(ana_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_message_to_offline_known_user() {
        let pool = setup_test_db().await;
        seed_user(&pool, "ben", "DEF456").await;
        let presence = PresenceTable::new();
        let (ana_tx, mut ana_rx) = mpsc::unbounded_channel();

        route_private_message(
            &presence,
            &pool,
            Some(&binding("ana", "ABC123")),
            &ana_tx,
            "DEF456",
            "hello?",
        )
        .await;

        assert_eq!(
            ana_rx.try_recv().unwrap(),
            ServerEvent::SystemMessage {
                recipient: "ana".to_string(),
                text: "ben is offline".to_string(),
            }
        );
        assert!(ana_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_message_to_unknown_code() {
        let pool = setup_test_db().await;
        let presence = PresenceTable::new();
        let (ana_tx, mut ana_rx) = mpsc::unbounded_channel();

        route_private_message(
            &presence,
            &pool,
            Some(&binding("ana", "ABC123")),
            &ana_tx,
            "ZZZ999",
            "hello?",
        )
        .await;

        assert_eq!(
            ana_rx.try_recv().unwrap(),
            ServerEvent::SystemMessage {
                recipient: "ana".to_string(),
                text: "No user with that code".to_string(),
            }
        );
        assert!(ana_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unbound_sender_is_dropped_silently() {
        let pool = setup_test_db().await;
        let presence = PresenceTable::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        route_private_message(&presence, &pool, None, &tx, "DEF456", "hello?").await;

        assert!(rx.try_recv().is_err());
    }
}
