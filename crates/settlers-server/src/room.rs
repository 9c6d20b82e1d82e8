//! Game room management.
//!
//! A room owns one authoritative [`GameState`]. Remote actions are applied
//! one at a time, only for the seat whose turn it is, and AI seats are
//! played out right after every human action.

use settlers_core::{Bot, BotDifficulty, GameAction, GameConfig, GameError, GameEvent, GameState, Player, PlayerId};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::{PlayerInfo, RoomInfo, RoomStatus};

/// Bot turns run after one human action before control is handed back
const MAX_BOT_TURNS: usize = 64;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Not the host")]
    NotHost,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Not enough players")]
    NotEnoughPlayers,

    #[error("Game not started")]
    GameNotStarted,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Save has {found} human seats, room has {expected} players")]
    SeatMismatch { expected: usize, found: usize },

    #[error("Action rejected: {0}")]
    Game(#[from] GameError),
}

/// A player in a game room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
    /// Seat in the game, assigned when the game starts
    pub seat: Option<PlayerId>,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            connected: true,
            seat: None,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            connected: self.connected,
            seat: self.seat,
        }
    }
}

/// A game room that can hold multiple players.
pub struct GameRoom {
    pub id: Uuid,
    pub name: String,
    pub max_players: u8,
    pub host_id: Uuid,
    pub status: RoomStatus,
    pub players: HashMap<Uuid, RoomPlayer>,
    /// Order of players for seat assignment
    pub player_order: Vec<Uuid>,
    /// The game state (once started)
    pub game: Option<GameState>,
    /// Policies driving the AI seats
    bots: Vec<Bot>,
    bot_difficulty: BotDifficulty,
}

impl GameRoom {
    pub fn new(id: Uuid, host_id: Uuid, host_name: String, max_players: u8, bot_difficulty: BotDifficulty) -> Self {
        let mut players = HashMap::new();
        players.insert(host_id, RoomPlayer::new(host_id, host_name.clone()));

        Self {
            id,
            name: format!("{}'s Game", host_name),
            max_players: max_players.clamp(2, 4),
            host_id,
            status: RoomStatus::Waiting,
            players,
            player_order: vec![host_id],
            game: None,
            bots: Vec::new(),
            bot_difficulty,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players as usize
    }

    pub fn add_player(&mut self, player_id: Uuid, name: String) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        self.players.insert(player_id, RoomPlayer::new(player_id, name));
        self.player_order.push(player_id);
        Ok(())
    }

    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        self.players.remove(&player_id);
        self.player_order.retain(|&id| id != player_id);

        // If host left, assign new host
        if player_id == self.host_id && !self.player_order.is_empty() {
            self.host_id = self.player_order[0];
        }

        // Return true if room is now empty
        Ok(self.players.is_empty())
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.connected = connected;
        }
    }

    fn check_host(&self, requester_id: Uuid) -> Result<(), RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        Ok(())
    }

    /// Start a new game: humans take the first seats, then up to
    /// `ai_players` bots fill the remaining ones.
    pub fn start_game(&mut self, requester_id: Uuid, ai_players: u8) -> Result<Vec<GameEvent>, RoomError> {
        self.check_host(requester_id)?;
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }

        let humans = self.player_order.len() as u8;
        let ais = ai_players.min(self.max_players.saturating_sub(humans));
        if humans + ais < 2 {
            return Err(RoomError::NotEnoughPlayers);
        }

        let mut seats: Vec<Player> = self
            .player_order
            .iter()
            .filter_map(|id| self.players.get(id))
            .enumerate()
            .map(|(i, p)| Player::new(i as PlayerId, p.name.clone()))
            .collect();
        seats.extend((0..ais).map(|i| Player::new_ai(humans + i, format!("AI {}", i + 1))));

        self.begin(GameState::new(seats, GameConfig::default()))
    }

    /// Resume a saved game. Human seats in the save are handed to the room's
    /// players in join order; AI seats get bots.
    pub fn load_game(&mut self, requester_id: Uuid, game: GameState) -> Result<Vec<GameEvent>, RoomError> {
        self.check_host(requester_id)?;

        let human_seats = game.players.iter().filter(|p| !p.is_ai).count();
        if human_seats != self.player_order.len() {
            return Err(RoomError::SeatMismatch {
                expected: self.player_order.len(),
                found: human_seats,
            });
        }

        self.begin(game)
    }

    fn begin(&mut self, game: GameState) -> Result<Vec<GameEvent>, RoomError> {
        let mut human_seats = game.players.iter().filter(|p| !p.is_ai).map(|p| p.id);
        for player_id in &self.player_order {
            if let Some(player) = self.players.get_mut(player_id) {
                player.seat = human_seats.next();
            }
        }

        self.bots = game
            .players
            .iter()
            .filter(|p| p.is_ai)
            .map(|p| Bot::new(p.id, self.bot_difficulty))
            .collect();
        self.game = Some(game);
        self.status = RoomStatus::InGame;

        self.run_bots()
    }

    /// Apply a human player's action, then let bots play until a human is up
    pub fn apply_action(&mut self, player_id: Uuid, action: GameAction) -> Result<Vec<GameEvent>, RoomError> {
        let seat = self
            .players
            .get(&player_id)
            .ok_or(RoomError::PlayerNotInRoom)?
            .seat
            .ok_or(RoomError::PlayerNotInRoom)?;
        let game = self.game.as_mut().ok_or(RoomError::GameNotStarted)?;

        // Check if it's this player's turn
        if game.current_player != seat {
            return Err(RoomError::NotYourTurn);
        }

        let totals = game.economy_totals();
        let events = game.apply_action(action)?;
        let bot_turns = self.run_bots();
        let events = self.after_committed(events, bot_turns);

        debug_assert_eq!(
            self.game.as_ref().map(GameState::economy_totals),
            Some(totals),
            "resources leaked out of the economy"
        );
        Ok(events)
    }

    /// Bot turns follow an action that is already applied, so a bot failure
    /// is logged and the action's own events are still reported.
    fn after_committed(
        &self,
        mut events: Vec<GameEvent>,
        bot_turns: Result<Vec<GameEvent>, RoomError>,
    ) -> Vec<GameEvent> {
        match bot_turns {
            Ok(bot_events) => events.extend(bot_events),
            Err(e) => warn!("Bots stopped in room {}: {}", self.id, e),
        }
        events
    }

    /// Play AI seats while one of them holds the turn
    pub fn run_bots(&mut self) -> Result<Vec<GameEvent>, RoomError> {
        let game = self.game.as_mut().ok_or(RoomError::GameNotStarted)?;
        let mut events = Vec::new();

        for _ in 0..MAX_BOT_TURNS {
            let current = game.current_player;
            let Some(bot) = self.bots.iter_mut().find(|b| b.player_id == current) else {
                break;
            };
            debug!("Bot seat {} taking its turn in room {}", current, self.id);
            events.extend(bot.take_turn(game)?);
        }

        Ok(events)
    }

    pub fn get_game_state(&self) -> Option<Box<GameState>> {
        self.game.clone().map(Box::new)
    }

    pub fn get_valid_actions(&self) -> Option<Vec<GameAction>> {
        self.game.as_ref().map(GameState::valid_actions)
    }

    pub fn get_current_player(&self) -> Option<PlayerId> {
        self.game.as_ref().map(|g| g.current_player)
    }

    pub fn get_winner(&self) -> Option<(PlayerId, String)> {
        let game = self.game.as_ref()?;
        let winner = game.winner()?;
        let name = game.get_player(winner)?.name.clone();
        Some((winner, name))
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            players: self
                .player_order
                .iter()
                .filter_map(|id| self.players.get(id).map(|p| p.to_info()))
                .collect(),
            max_players: self.max_players,
            host_id: self.host_id,
            status: self.status,
        }
    }
}
