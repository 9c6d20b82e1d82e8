//! Core game state machine.
//!
//! This module contains the main `GameState` struct and all game logic.
//! Every public action validates first and only then mutates, so a failed
//! action leaves the state exactly as it was.

use crate::actions::{GameAction, GameEvent};
use crate::board::{Board, PlayerId, VertexBuilding};
use crate::dev_cards::{self, DevCardPile, DevelopmentCard};
use crate::ledger::{Bank, Production, STARTING_BANK_PER_RESOURCE};
use crate::player::{costs, Player, ResourceHand};
use crate::topology::{IntersectionId, PathId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Victory points needed to win
const VICTORY_POINTS_TO_WIN: u32 = 10;

/// Game phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Snake-order placement of free settlements and roads
    #[default]
    Setup,
    /// Start of a turn, dice not rolled yet
    TurnRoll,
    /// Building, buying and ending the turn
    TurnActions,
    /// A 7 was rolled; the robber must move
    Robber,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Setup => "SETUP",
            GamePhase::TurnRoll => "TURN_ROLL",
            GamePhase::TurnActions => "TURN_ACTIONS",
            GamePhase::Robber => "ROBBER",
        };
        f.write_str(name)
    }
}

/// What we're placing during setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupPlacing {
    Settlement,
    Road,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Invalid action for current phase")]
    IllegalPhase,

    #[error("Cannot afford this")]
    InsufficientResources,

    #[error("Location already occupied")]
    AlreadyOccupied,

    #[error("No development cards left in deck")]
    EmptyDrawPile,

    #[error("Don't have that card")]
    MissingCard,

    #[error("Invalid target")]
    InvalidTarget,
}

/// Errors raised while loading a serialized game
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("board has {found} tiles, layout expects {expected}")]
    TileCount { expected: usize, found: usize },

    #[error("unknown intersection {0}")]
    UnknownIntersection(IntersectionId),

    #[error("unknown path {0}")]
    UnknownPath(PathId),

    #[error("robber tile {0} is off the board")]
    RobberOutOfRange(usize),

    #[error("current player {0} has no seat")]
    UnknownPlayer(PlayerId),

    #[error("snapshot has no players")]
    NoPlayers,

    #[error("player in seat {seat} has id {id}")]
    SeatId { seat: usize, id: PlayerId },

    #[error("buildings on tile {0} disagree with the intersection table")]
    TileBuildings(usize),
}

/// Match-level settings threaded into construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Bank contents at game start
    pub starting_bank: ResourceHand,
    /// Score that `GameState::winner` reports on. Never ends the game.
    pub victory_points_to_win: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_bank: ResourceHand::uniform(STARTING_BANK_PER_RESOURCE),
            victory_points_to_win: VICTORY_POINTS_TO_WIN,
        }
    }
}

/// Dice outcome of a roll together with what it paid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub dice: (u8, u8),
    pub production: Production,
}

impl RollOutcome {
    pub fn total(&self) -> u8 {
        self.dice.0 + self.dice.1
    }
}

/// Read-only view for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub phase: GamePhase,
    pub player: PlayerId,
    pub name: String,
    pub victory_points: u32,
    pub resources: ResourceHand,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Turn: {} | VP: {} | {}",
            self.phase, self.name, self.victory_points, self.resources
        )
    }
}

/// The complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GameSnapshot")]
pub struct GameState {
    /// The game board
    pub board: Board,
    /// All players, indexed by id
    pub players: Vec<Player>,
    /// Whose turn it is
    pub current_player: PlayerId,
    /// Current game phase
    pub phase: GamePhase,
    /// Tile the robber sits on
    pub robber_tile: usize,
    /// Dice already rolled this turn
    pub has_rolled: bool,
    /// Shared resource pool
    pub bank: Bank,
    /// Development card stack (last card drawn first)
    pub dev_card_pile: DevCardPile,
    /// Setup round (1 ascending, 2 descending)
    pub setup_step: u8,
    /// Placements made so far during setup (even: settlement, odd: road)
    pub setup_pointer: u32,
    /// Last dice roll
    pub last_roll: Option<(u8, u8)>,
    pub config: GameConfig,
}

impl GameState {
    /// Create a new game for the given seats
    pub fn new(players: Vec<Player>, config: GameConfig) -> Self {
        Self::with_rng(players, config, &mut rand::thread_rng())
    }

    /// Create a new game with a provided RNG (board and deck shuffles).
    ///
    /// Seats are renumbered to their position in `players`.
    pub fn with_rng<R: Rng + ?Sized>(mut players: Vec<Player>, config: GameConfig, rng: &mut R) -> Self {
        assert!(!players.is_empty(), "Must have at least one player");

        for (i, player) in players.iter_mut().enumerate() {
            player.id = i as PlayerId;
        }

        let board = Board::standard_with_rng(rng);
        let robber_tile = board.desert_index().unwrap_or(0);

        Self {
            board,
            players,
            current_player: 0,
            phase: GamePhase::Setup,
            robber_tile,
            has_rolled: false,
            bank: Bank::new(config.starting_bank),
            dev_card_pile: DevCardPile::shuffled_with_rng(rng),
            setup_step: 1,
            setup_pointer: 0,
            last_roll: None,
            config,
        }
    }

    /// Humans first ("Human 1", ...), then AI seats ("AI 1", ...)
    pub fn new_match(humans: u8, ais: u8, config: GameConfig) -> Self {
        Self::new(seats(humans, ais), config)
    }

    pub fn new_match_with_rng<R: Rng + ?Sized>(humans: u8, ais: u8, config: GameConfig, rng: &mut R) -> Self {
        Self::with_rng(seats(humans, ais), config, rng)
    }

    // ==================== Queries ====================

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    /// The player whose turn it is
    pub fn current(&self) -> &Player {
        &self.players[self.current_player as usize]
    }

    fn current_mut(&mut self) -> &mut Player {
        let index = self.current_player as usize;
        &mut self.players[index]
    }

    /// What the current setup placement is, outside setup `None`
    pub fn setup_placing(&self) -> Option<SetupPlacing> {
        if self.phase != GamePhase::Setup {
            return None;
        }
        if self.setup_pointer % 2 == 0 {
            Some(SetupPlacing::Settlement)
        } else {
            Some(SetupPlacing::Road)
        }
    }

    pub fn status(&self) -> Status {
        let player = self.current();
        Status {
            phase: self.phase,
            player: player.id,
            name: player.name.clone(),
            victory_points: player.victory_points,
            resources: player.resources,
        }
    }

    /// First player to reach the configured score, if any
    pub fn winner(&self) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.victory_points >= self.config.victory_points_to_win)
            .map(|p| p.id)
    }

    /// Bank plus every player hand, per resource
    pub fn economy_totals(&self) -> ResourceHand {
        let mut totals = *self.bank.resources();
        for player in &self.players {
            totals.add_hand(&player.resources);
        }
        totals
    }

    /// Get all valid actions for the current player
    pub fn valid_actions(&self) -> Vec<GameAction> {
        let mut actions = Vec::new();
        let player = self.current();

        match self.phase {
            GamePhase::Setup => match self.setup_placing() {
                Some(SetupPlacing::Settlement) => {
                    actions.extend(self.board.free_intersections().map(GameAction::PlaceSetupSettlement));
                }
                Some(SetupPlacing::Road) => {
                    actions.extend(self.board.free_paths().map(GameAction::PlaceSetupRoad));
                }
                None => {}
            },
            GamePhase::Robber => {
                actions.extend((0..self.board.tile_count()).map(GameAction::MoveRobber));
            }
            GamePhase::TurnRoll | GamePhase::TurnActions => {
                if !self.has_rolled {
                    actions.push(GameAction::Roll);
                }
                if self.phase == GamePhase::TurnActions && self.has_rolled {
                    if player.can_afford(&costs::road()) {
                        actions.push(GameAction::BuildRoad);
                    }
                    if player.can_afford(&costs::development_card()) && !self.dev_card_pile.is_empty() {
                        actions.push(GameAction::BuyDevelopmentCard);
                    }
                }
                if player.has_dev_card(DevelopmentCard::Knight) {
                    actions.extend(
                        (0..self.board.tile_count())
                            .filter(|t| *t != self.robber_tile)
                            .map(GameAction::PlayKnight),
                    );
                }
                if self.phase == GamePhase::TurnActions && self.has_rolled {
                    actions.push(GameAction::EndTurn);
                }
            }
        }

        actions
    }

    // ==================== Action Dispatch ====================

    /// Apply an action for the current player
    pub fn apply_action(&mut self, action: GameAction) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action_with_rng(action, &mut rand::thread_rng())
    }

    /// Apply an action, rolling dice with the provided RNG
    pub fn apply_action_with_rng<R: Rng + ?Sized>(
        &mut self,
        action: GameAction,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let player = self.current_player;
        let mut events = Vec::new();

        match action {
            GameAction::PlaceSetupSettlement(intersection) => {
                self.place_setup_settlement(intersection)?;
                events.push(GameEvent::SettlementPlaced {
                    player,
                    intersection,
                });
            }

            GameAction::PlaceSetupRoad(path) => {
                let completed = self.place_setup_road(path)?;
                events.push(GameEvent::RoadBuilt {
                    player,
                    path: Some(path),
                });
                if completed {
                    events.push(GameEvent::SetupCompleted);
                }
            }

            GameAction::Roll => {
                let outcome = self.roll_with_rng(rng)?;
                events.push(GameEvent::DiceRolled {
                    player,
                    roll: outcome.dice,
                    total: outcome.total(),
                });
                if outcome.production.total_granted() > 0 {
                    events.push(GameEvent::ResourcesProduced {
                        production: outcome.production,
                    });
                }
            }

            GameAction::MoveRobber(tile) => {
                self.move_robber(tile)?;
                events.push(GameEvent::RobberMoved { player, tile });
            }

            GameAction::BuildRoad => {
                self.build_road()?;
                events.push(GameEvent::RoadBuilt { player, path: None });
            }

            GameAction::BuyDevelopmentCard => {
                let card = self.buy_dev_card()?;
                events.push(GameEvent::DevelopmentCardPurchased { player, card });
            }

            GameAction::PlayKnight(tile) => {
                self.play_knight(tile)?;
                events.push(GameEvent::KnightPlayed { player, tile });
                events.push(GameEvent::RobberMoved { player, tile });
            }

            GameAction::EndTurn => {
                self.end_turn()?;
                events.push(GameEvent::TurnEnded {
                    player,
                    next: self.current_player,
                });
            }
        }

        Ok(events)
    }

    // ==================== Setup Phase ====================

    /// Place the current player's free settlement
    pub fn place_setup_settlement(&mut self, intersection: IntersectionId) -> Result<(), GameError> {
        if self.setup_placing() != Some(SetupPlacing::Settlement) {
            return Err(GameError::IllegalPhase);
        }
        let owner = self.current_player;
        self.board
            .occupy_intersection(intersection, VertexBuilding::Settlement(owner))?;

        let player = self.current_mut();
        player.settlements += 1;
        player.victory_points += 1;
        self.setup_pointer += 1;
        Ok(())
    }

    /// Place the current player's free road and advance the draft.
    ///
    /// Returns true when this placement finished setup. The road does not
    /// need to touch the player's settlement.
    pub fn place_setup_road(&mut self, path: PathId) -> Result<bool, GameError> {
        if self.setup_placing() != Some(SetupPlacing::Road) {
            return Err(GameError::IllegalPhase);
        }
        let owner = self.current_player;
        self.board.occupy_path(path, owner)?;

        self.current_mut().roads += 1;
        Ok(self.advance_setup())
    }

    /// Move to the next seat in snake order: 0..N-1, then N-1..0
    fn advance_setup(&mut self) -> bool {
        self.setup_pointer += 1;
        let last = (self.players.len() - 1) as PlayerId;

        if self.setup_step == 1 {
            if self.current_player < last {
                self.current_player += 1;
            } else {
                // the last seat places twice in a row
                self.setup_step = 2;
            }
            return false;
        }

        if self.current_player > 0 {
            self.current_player -= 1;
            return false;
        }

        self.phase = GamePhase::TurnRoll;
        self.current_player = 0;
        self.has_rolled = false;
        true
    }

    // ==================== Turn Actions ====================

    fn check_can_roll(&self) -> Result<(), GameError> {
        let phase_ok = matches!(self.phase, GamePhase::TurnRoll | GamePhase::TurnActions);
        if !phase_ok || self.has_rolled {
            return Err(GameError::IllegalPhase);
        }
        Ok(())
    }

    /// Roll two dice and pay out production
    pub fn roll(&mut self) -> Result<RollOutcome, GameError> {
        self.roll_with_rng(&mut rand::thread_rng())
    }

    pub fn roll_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<RollOutcome, GameError> {
        self.check_can_roll()?;
        let d1 = rng.gen_range(1..=6);
        let d2 = rng.gen_range(1..=6);
        self.roll_fixed(d1, d2)
    }

    /// Resolve a known pair of dice.
    ///
    /// A 7 produces nothing and moves the game to the robber phase. Either
    /// way the turn counts as rolled.
    pub fn roll_fixed(&mut self, d1: u8, d2: u8) -> Result<RollOutcome, GameError> {
        self.check_can_roll()?;
        if !(1..=6).contains(&d1) || !(1..=6).contains(&d2) {
            return Err(GameError::InvalidTarget);
        }

        let total = d1 + d2;
        self.has_rolled = true;
        self.last_roll = Some((d1, d2));

        let production = if total == 7 {
            self.phase = GamePhase::Robber;
            Production::empty(total)
        } else {
            self.phase = GamePhase::TurnActions;
            self.bank
                .distribute(&self.board, self.robber_tile, total, &mut self.players)
        };

        Ok(RollOutcome {
            dice: (d1, d2),
            production,
        })
    }

    fn check_main_phase(&self) -> Result<(), GameError> {
        if self.phase != GamePhase::TurnActions || !self.has_rolled {
            return Err(GameError::IllegalPhase);
        }
        Ok(())
    }

    /// Pay for a road. Placement is not tracked outside setup.
    pub fn build_road(&mut self) -> Result<(), GameError> {
        self.check_main_phase()?;
        let index = self.current_player as usize;
        self.bank.spend(&mut self.players[index], &costs::road())?;
        self.players[index].roads += 1;
        Ok(())
    }

    /// Buy the top development card
    pub fn buy_dev_card(&mut self) -> Result<DevelopmentCard, GameError> {
        self.check_main_phase()?;
        let index = self.current_player as usize;
        self.dev_card_pile
            .buy(&mut self.bank, &mut self.players[index])
    }

    /// Play a knight from hand and move the robber to `tile`
    pub fn play_knight(&mut self, tile: usize) -> Result<(), GameError> {
        if !matches!(self.phase, GamePhase::TurnRoll | GamePhase::TurnActions) {
            return Err(GameError::IllegalPhase);
        }
        if !self.board.is_valid_tile(tile) {
            return Err(GameError::InvalidTarget);
        }
        dev_cards::play_knight(self.current_mut())?;
        self.robber_tile = tile;
        Ok(())
    }

    /// Relocate the robber after a 7. Nothing is stolen.
    pub fn move_robber(&mut self, tile: usize) -> Result<(), GameError> {
        if self.phase != GamePhase::Robber {
            return Err(GameError::IllegalPhase);
        }
        if !self.board.is_valid_tile(tile) {
            return Err(GameError::InvalidTarget);
        }
        self.robber_tile = tile;
        self.phase = GamePhase::TurnActions;
        Ok(())
    }

    /// Pass control to the next seat
    pub fn end_turn(&mut self) -> Result<(), GameError> {
        self.check_main_phase()?;
        self.has_rolled = false;
        self.current_player = ((self.current_player as usize + 1) % self.players.len()) as PlayerId;
        self.phase = GamePhase::TurnRoll;
        Ok(())
    }

    // ==================== Serialization ====================

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a snapshot, defaulting missing optional fields
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: GameSnapshot = serde_json::from_str(json)?;
        Self::try_from(snapshot)
    }
}

fn seats(humans: u8, ais: u8) -> Vec<Player> {
    let human_seats = (0..humans).map(|i| Player::new(i, format!("Human {}", i + 1)));
    let ai_seats = (0..ais).map(|i| Player::new_ai(humans + i, format!("AI {}", i + 1)));
    human_seats.chain(ai_seats).collect()
}

/// Deserialization shape of [`GameState`]; every field except the board and
/// players may be absent.
#[derive(Debug, Clone, Deserialize)]
pub struct GameSnapshot {
    pub board: Board,
    pub players: Vec<Player>,
    #[serde(default)]
    pub current_player: PlayerId,
    #[serde(default)]
    pub phase: GamePhase,
    #[serde(default)]
    pub robber_tile: Option<usize>,
    #[serde(default)]
    pub has_rolled: bool,
    #[serde(default)]
    pub bank: Option<Bank>,
    #[serde(default)]
    pub dev_card_pile: DevCardPile,
    #[serde(default = "first_setup_step")]
    pub setup_step: u8,
    #[serde(default)]
    pub setup_pointer: u32,
    #[serde(default)]
    pub last_roll: Option<(u8, u8)>,
    #[serde(default)]
    pub config: GameConfig,
}

fn first_setup_step() -> u8 {
    1
}

impl TryFrom<GameSnapshot> for GameState {
    type Error = SnapshotError;

    fn try_from(snapshot: GameSnapshot) -> Result<Self, Self::Error> {
        if snapshot.players.is_empty() {
            return Err(SnapshotError::NoPlayers);
        }
        if snapshot.current_player as usize >= snapshot.players.len() {
            return Err(SnapshotError::UnknownPlayer(snapshot.current_player));
        }
        // Occupancy and the ledger both key players by seat index
        if let Some((seat, player)) = snapshot
            .players
            .iter()
            .enumerate()
            .find(|(seat, p)| p.id as usize != *seat)
        {
            return Err(SnapshotError::SeatId { seat, id: player.id });
        }

        let robber_tile = snapshot
            .robber_tile
            .unwrap_or_else(|| snapshot.board.desert_index().unwrap_or(0));
        if !snapshot.board.is_valid_tile(robber_tile) {
            return Err(SnapshotError::RobberOutOfRange(robber_tile));
        }

        let bank = snapshot
            .bank
            .unwrap_or_else(|| Bank::new(snapshot.config.starting_bank));

        Ok(GameState {
            board: snapshot.board,
            players: snapshot.players,
            current_player: snapshot.current_player,
            phase: snapshot.phase,
            robber_tile,
            has_rolled: snapshot.has_rolled,
            bank,
            dev_card_pile: snapshot.dev_card_pile,
            setup_step: snapshot.setup_step,
            setup_pointer: snapshot.setup_pointer,
            last_roll: snapshot.last_roll,
            config: snapshot.config,
        })
    }
}
