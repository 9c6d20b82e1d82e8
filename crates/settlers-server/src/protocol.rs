//! WebSocket protocol messages for multiplayer games.

use serde::{Deserialize, Serialize};
use settlers_core::{GameAction, GameError, GameEvent, GameState, PlayerId};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new game room
    CreateRoom { player_name: String, max_players: u8 },

    /// Join an existing room
    JoinRoom { room_id: Uuid, player_name: String },

    /// Leave current room
    LeaveRoom,

    /// Start the game (host only), filling up to `ai_players` empty seats with bots
    StartGame {
        #[serde(default)]
        ai_players: u8,
    },

    /// Submit a game action
    GameAction { action: GameAction },

    /// Write the room's game to a new save file (host only)
    SaveGame,

    /// Replace the room's game with the latest save (host only)
    LoadGame,

    /// Send chat message
    Chat { message: String },

    /// Request room list
    ListRooms,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned connection ID
    Welcome { player_id: Uuid },

    /// Room created successfully
    RoomCreated { room_id: Uuid },

    /// Joined room successfully
    JoinedRoom { room: RoomInfo },

    /// Left room successfully
    LeftRoom,

    /// Room state updated (player joined/left)
    RoomUpdated { room: RoomInfo },

    /// Game started
    GameStarted { state: Box<GameState> },

    /// Game state updated
    GameState { state: Box<GameState> },

    /// Outcome of a submitted action
    ActionResult {
        success: bool,
        events: Vec<GameEvent>,
        error: Option<GameError>,
    },

    /// Valid actions for current player
    ValidActions { actions: Vec<GameAction> },

    /// Current player changed
    TurnChanged { player_id: PlayerId },

    /// Game written to disk
    GameSaved { file: String },

    /// Chat message received
    ChatMessage { player_name: String, message: String },

    /// List of available rooms
    RoomList { rooms: Vec<RoomInfo> },

    /// A player reached the target score
    GameOver { winner: PlayerId, winner_name: String },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

/// Room information for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: Uuid,
    pub name: String,
    pub players: Vec<PlayerInfo>,
    pub max_players: u8,
    pub host_id: Uuid,
    pub status: RoomStatus,
}

/// Player information in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
    /// Seat in the game, once started
    pub seat: Option<PlayerId>,
}

/// Room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Waiting,
    InGame,
}

#[cfg(test)]
mod tests {
    use super::*;
    use settlers_core::IntersectionId;

    #[test]
    fn test_client_message_wire_format() {
        let json = r#"{"type":"GameAction","payload":{"action":{"PlaceSetupSettlement":12}}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::GameAction {
                action: GameAction::PlaceSetupSettlement(IntersectionId(12))
            }
        ));
    }

    #[test]
    fn test_start_game_defaults_to_no_bots() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"StartGame","payload":{}}"#).unwrap();
        assert!(matches!(msg, ClientMessage::StartGame { ai_players: 0 }));
    }

    #[test]
    fn test_unit_messages() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"Ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(json, r#"{"type":"Pong"}"#);
    }

    #[test]
    fn test_failed_action_carries_error_kind() {
        let msg = ServerMessage::ActionResult {
            success: false,
            events: vec![],
            error: Some(GameError::IllegalPhase),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["payload"]["error"], "IllegalPhase");
    }
}
