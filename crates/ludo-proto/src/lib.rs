//! Replication protocol for ludo-link.
//!
//! One-directional authority: only the host mutates canonical state.
//! Guests send intents (`JOIN`, `ROLL`, `MOVE`, `UPDATE_PROFILE`) and
//! mirror whatever arrives in `SYNC` snapshots. Messages are JSON on the
//! wire; the transport below carries them as opaque byte payloads.

use ludo_core::{GameEngine, GameState, ProfileField, Roster, TokenId, TurnStep};
use serde::{Deserialize, Serialize};

/// Wire codec failure.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Full-state snapshot broadcast after every mutation.
///
/// Snapshots are idempotent: applying the same snapshot twice leaves a
/// guest mirror unchanged. Guests replace their entire local copy; there
/// is no delta application and therefore no merge conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub game_state: GameState,
    pub profiles: Roster,
    pub turn_step: TurnStep,
    pub move_timer: u32,
}

impl Snapshot {
    /// Captures the host's current canonical state.
    pub fn of(engine: &GameEngine, roster: &Roster) -> Self {
        Self {
            game_state: engine.state().clone(),
            profiles: roster.clone(),
            turn_step: engine.turn_step(),
            move_timer: engine.move_timer(),
        }
    }
}

/// Every message exchanged between host and guests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Guest -> host: request a color slot.
    Join,
    /// Host -> guest: slot assigned.
    Welcome { color: ludo_core::Color },
    /// Host -> guest: join rejected; terminal for this connection.
    Error { message: String },
    /// Host -> guest: forcibly removed; terminal for this connection.
    Kicked,
    /// Host -> guests: canonical state broadcast.
    Sync(Snapshot),
    /// Guest -> host: "please roll for me."
    Roll,
    /// Guest -> host: "please move this token."
    Move { token_id: TokenId },
    /// Guest -> host: edit the sender's own slot.
    UpdateProfile { field: ProfileField, value: String },
}

impl Message {
    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        serde_json::to_vec(self).map_err(ProtoError::Encode)
    }

    pub fn decode(data: &[u8]) -> Result<Self, ProtoError> {
        serde_json::from_slice(data).map_err(ProtoError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludo_core::Color;

    #[test]
    fn test_wire_tags_match_protocol() {
        let encoded = Message::Join.encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(value["type"], "JOIN");

        let encoded = Message::Welcome { color: Color::Blue }.encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(value["type"], "WELCOME");
        assert_eq!(value["color"], "blue");

        let encoded = Message::UpdateProfile {
            field: ProfileField::Name,
            value: "Dana".to_owned(),
        }
        .encode()
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(value["type"], "UPDATE_PROFILE");
        assert_eq!(value["field"], "name");
    }

    #[test]
    fn test_sync_roundtrip() {
        let engine = GameEngine::new(3);
        let roster = Roster::new();
        let msg = Message::Sync(Snapshot::of(&engine, &roster));

        let decoded = Message::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_move_roundtrip() {
        let msg = Message::Move {
            token_id: TokenId::new(Color::Red, 0),
        };
        let decoded = Message::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_malformed_input_rejected() {
        assert!(Message::decode(b"").is_err());
        assert!(Message::decode(b"not json").is_err());
        assert!(Message::decode(br#"{"type":"TELEPORT"}"#).is_err());
    }
}
