//! WebSocket message types for the snapshot stream

use serde::{Deserialize, Serialize};

use crate::Snapshot;

// ============================================================================
// Client -> Server Messages
// ============================================================================

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ping to keep connection alive
    Ping {
        /// Client timestamp
        timestamp: i64,
    },
    /// Flip the boost flag
    ToggleBoost,
}

// ============================================================================
// Server -> Client Messages
// ============================================================================

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full feed snapshot
    Snapshot { snapshot: Snapshot },
    /// Pong response to ping
    Pong {
        client_timestamp: i64,
        server_timestamp: i64,
    },
    /// Error message
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_parse() {
        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping","timestamp":17}"#).unwrap();
        assert!(matches!(ping, ClientMessage::Ping { timestamp: 17 }));

        let toggle: ClientMessage = serde_json::from_str(r#"{"type":"toggle_boost"}"#).unwrap();
        assert!(matches!(toggle, ClientMessage::ToggleBoost));
    }

    #[test]
    fn test_server_error_tagged() {
        let msg = ServerMessage::Error {
            message: "bad".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "bad");
    }
}
