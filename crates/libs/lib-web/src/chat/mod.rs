//! # Chat Module
//!
//! Real-time private messaging over websockets: the presence table, the wire
//! protocol, the message router, and the per-connection session loop.
//!
//! A connection is `Unbound` until its registration handshake succeeds, then
//! `Bound` to a `{username, code}` identity until disconnect. All routing and
//! friend operations except the handshake require `Bound`.

pub mod presence;
pub mod protocol;
pub mod router;
pub mod session;

pub use presence::{ConnectionBinding, PresenceTable};
pub use protocol::{ClientEvent, HandshakeRequest, ServerEvent};
pub use session::chat_websocket;
