//! WebSocket server and connection handling.

use crate::config::ServerConfig;
use crate::protocol::{ClientMessage, RoomInfo, RoomStatus, ServerMessage};
use crate::room::{GameRoom, RoomError};
use crate::saves::SaveStore;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use settlers_core::{BotDifficulty, GameAction, GameEvent, GameState, PlayerId};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// All active rooms
    pub rooms: DashMap<Uuid, GameRoom>,
    /// Mapping from player ID to their room ID
    pub player_rooms: DashMap<Uuid, Uuid>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// Numbered save files
    pub saves: SaveStore,
    /// Policy for AI seats in new rooms
    pub bot_difficulty: BotDifficulty,
}

/// What every player needs to redraw after the game changed
struct GameUpdate {
    state: Box<GameState>,
    actions: Vec<GameAction>,
    current_player: PlayerId,
    winner: Option<(PlayerId, String)>,
}

impl GameUpdate {
    fn from_room(room: &GameRoom) -> Option<Self> {
        Some(Self {
            state: room.get_game_state()?,
            actions: room.get_valid_actions()?,
            current_player: room.get_current_player()?,
            winner: room.get_winner(),
        })
    }
}

impl ServerState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            player_rooms: DashMap::new(),
            player_senders: DashMap::new(),
            saves: SaveStore::new(config.save_dir.clone()),
            bot_difficulty: config.bot_difficulty,
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn send_error(&self, player_id: Uuid, message: impl Into<String>) {
        self.send_to_player(
            player_id,
            ServerMessage::Error {
                message: message.into(),
            },
        );
    }

    /// Broadcast a message to all players in a room.
    pub fn broadcast_to_room(&self, room_id: Uuid, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(&room_id) {
            for player_id in room.players.keys() {
                self.send_to_player(*player_id, msg.clone());
            }
        }
    }

    /// Broadcast a message to all players in a room except one.
    pub fn broadcast_to_room_except(&self, room_id: Uuid, except: Uuid, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(&room_id) {
            for player_id in room.players.keys() {
                if *player_id != except {
                    self.send_to_player(*player_id, msg.clone());
                }
            }
        }
    }

    /// Get list of waiting rooms.
    pub fn get_waiting_rooms(&self) -> Vec<RoomInfo> {
        self.rooms
            .iter()
            .filter(|r| r.status == RoomStatus::Waiting)
            .map(|r| r.to_info())
            .collect()
    }

    fn room_of(&self, player_id: Uuid) -> Option<Uuid> {
        self.player_rooms.get(&player_id).map(|r| *r)
    }

    /// Send the new state, legal moves and turn holder to the whole room
    fn broadcast_game(&self, room_id: Uuid, update: GameUpdate, started: bool) {
        let state_msg = if started {
            ServerMessage::GameStarted { state: update.state }
        } else {
            ServerMessage::GameState { state: update.state }
        };
        self.broadcast_to_room(room_id, state_msg);
        self.broadcast_to_room(
            room_id,
            ServerMessage::ValidActions {
                actions: update.actions,
            },
        );
        self.broadcast_to_room(
            room_id,
            ServerMessage::TurnChanged {
                player_id: update.current_player,
            },
        );
        if let Some((winner, winner_name)) = update.winner {
            self.broadcast_to_room(room_id, ServerMessage::GameOver { winner, winner_name });
        }
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Settlers server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a player ID
    let player_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    // Send welcome message
    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Could not encode server message: {}", e),
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", player_id, e);
                    state.send_error(player_id, format!("Invalid message: {}", e));
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateRoom {
            player_name,
            max_players,
        } => {
            let room_id = Uuid::new_v4();
            let room = GameRoom::new(room_id, player_id, player_name, max_players, state.bot_difficulty);
            let room_info = room.to_info();

            state.rooms.insert(room_id, room);
            state.player_rooms.insert(player_id, room_id);
            info!("Player {} created room {}", player_id, room_id);

            state.send_to_player(player_id, ServerMessage::RoomCreated { room_id });
            state.send_to_player(player_id, ServerMessage::JoinedRoom { room: room_info });
        }

        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => {
            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                state.send_error(player_id, "Room not found");
                return;
            };
            match room.add_player(player_id, player_name) {
                Ok(()) => {
                    let room_info = room.to_info();
                    state.player_rooms.insert(player_id, room_id);

                    // Release lock before broadcasting
                    drop(room);
                    state.send_to_player(
                        player_id,
                        ServerMessage::JoinedRoom {
                            room: room_info.clone(),
                        },
                    );
                    state.broadcast_to_room_except(
                        room_id,
                        player_id,
                        ServerMessage::RoomUpdated { room: room_info },
                    );
                }
                Err(e) => {
                    drop(room);
                    state.send_error(player_id, e.to_string());
                }
            }
        }

        ClientMessage::LeaveRoom => {
            if let Some((_, room_id)) = state.player_rooms.remove(&player_id) {
                leave_room(player_id, room_id, state);
                state.send_to_player(player_id, ServerMessage::LeftRoom);
            }
        }

        ClientMessage::StartGame { ai_players } => {
            with_room(player_id, state, |room| room.start_game(player_id, ai_players), true);
        }

        ClientMessage::GameAction { action } => {
            let Some(room_id) = state.room_of(player_id) else {
                state.send_error(player_id, "Not in a room");
                return;
            };
            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                return;
            };

            match room.apply_action(player_id, action) {
                Ok(events) => {
                    let update = GameUpdate::from_room(&room);
                    drop(room);

                    send_action_result(state, player_id, Ok(events));
                    if let Some(update) = update {
                        state.broadcast_game(room_id, update, false);
                    }
                }
                Err(e) => {
                    drop(room);
                    debug!("Rejected action from {}: {}", player_id, e);
                    send_action_result(state, player_id, Err(e));
                }
            }
        }

        ClientMessage::SaveGame => {
            let Some(room_id) = state.room_of(player_id) else {
                state.send_error(player_id, "Not in a room");
                return;
            };
            let game = match state.rooms.get(&room_id) {
                Some(room) if room.host_id != player_id => {
                    drop(room);
                    state.send_error(player_id, RoomError::NotHost.to_string());
                    return;
                }
                Some(room) => room.game.clone(),
                None => None,
            };
            let Some(game) = game else {
                state.send_error(player_id, RoomError::GameNotStarted.to_string());
                return;
            };

            match state.saves.save(&game) {
                Ok(path) => {
                    let file = path
                        .file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    state.broadcast_to_room(room_id, ServerMessage::GameSaved { file });
                }
                Err(e) => {
                    error!("Saving room {} failed: {}", room_id, e);
                    state.send_error(player_id, format!("Save failed: {}", e));
                }
            }
        }

        ClientMessage::LoadGame => {
            let Some(game) = state.saves.load_latest() else {
                state.send_error(player_id, "No saved game found");
                return;
            };
            with_room(player_id, state, |room| room.load_game(player_id, game), true);
        }

        ClientMessage::Chat { message } => {
            if let Some(room_id) = state.room_of(player_id) {
                let player_name = state
                    .rooms
                    .get(&room_id)
                    .and_then(|r| r.players.get(&player_id).map(|p| p.name.clone()))
                    .unwrap_or_else(|| "Unknown".to_string());

                state.broadcast_to_room(
                    room_id,
                    ServerMessage::ChatMessage {
                        player_name,
                        message,
                    },
                );
            }
        }

        ClientMessage::ListRooms => {
            let rooms = state.get_waiting_rooms();
            state.send_to_player(player_id, ServerMessage::RoomList { rooms });
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Run a room operation that (re)starts the game and broadcast the result
fn with_room<F>(player_id: Uuid, state: &Arc<ServerState>, op: F, started: bool)
where
    F: FnOnce(&mut GameRoom) -> Result<Vec<GameEvent>, RoomError>,
{
    let Some(room_id) = state.room_of(player_id) else {
        state.send_error(player_id, "Not in a room");
        return;
    };
    let Some(mut room) = state.rooms.get_mut(&room_id) else {
        return;
    };

    match op(&mut *room) {
        Ok(_) => {
            let update = GameUpdate::from_room(&room);
            let room_info = room.to_info();
            drop(room);

            info!("Game started in room {}", room_id);
            state.broadcast_to_room(room_id, ServerMessage::RoomUpdated { room: room_info });
            if let Some(update) = update {
                state.broadcast_game(room_id, update, started);
            }
        }
        Err(e) => {
            drop(room);
            state.send_error(player_id, e.to_string());
        }
    }
}

fn send_action_result(state: &ServerState, player_id: Uuid, result: Result<Vec<GameEvent>, RoomError>) {
    let msg = match result {
        Ok(events) => ServerMessage::ActionResult {
            success: true,
            events,
            error: None,
        },
        Err(RoomError::Game(e)) => ServerMessage::ActionResult {
            success: false,
            events: vec![],
            error: Some(e),
        },
        Err(e) => {
            state.send_error(player_id, e.to_string());
            return;
        }
    };
    state.send_to_player(player_id, msg);
}

/// Remove a player from a room, dropping the room once it is empty
fn leave_room(player_id: Uuid, room_id: Uuid, state: &Arc<ServerState>) {
    let Some(mut room) = state.rooms.get_mut(&room_id) else {
        return;
    };
    let is_empty = room.remove_player(player_id).unwrap_or(false);
    let room_info = room.to_info();
    drop(room);

    if is_empty {
        state.rooms.remove(&room_id);
        info!("Room {} closed", room_id);
    } else {
        state.broadcast_to_room(room_id, ServerMessage::RoomUpdated { room: room_info });
    }
}

/// Handle player disconnect.
fn handle_disconnect(player_id: Uuid, state: &Arc<ServerState>) {
    let Some((_, room_id)) = state.player_rooms.remove(&player_id) else {
        return;
    };
    let in_game = state
        .rooms
        .get(&room_id)
        .map(|room| room.status == RoomStatus::InGame)
        .unwrap_or(false);

    if in_game {
        // Keep the seat during a game so the player can be shown as away
        let room_info = state.rooms.get_mut(&room_id).map(|mut room| {
            room.set_player_connected(player_id, false);
            room.to_info()
        });
        if let Some(room_info) = room_info {
            state.broadcast_to_room(room_id, ServerMessage::RoomUpdated { room: room_info });
        }
    } else {
        leave_room(player_id, room_id, state);
    }
}
