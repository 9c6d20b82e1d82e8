//! Automated players.
//!
//! A bot only ever picks from [`GameState::valid_actions`] and applies its
//! choice through the same public surface a human uses:
//! - Easy: random valid moves
//! - Medium: basic heuristics (productive corners, robber on opponents,
//!   spend before ending the turn)

use crate::actions::{GameAction, GameEvent};
use crate::board::{EdgeBuilding, PlayerId};
use crate::game::{GameError, GameState};
use crate::topology::{IntersectionId, PathId};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on actions a bot takes in one call to [`Bot::take_turn`]
pub const MAX_TURN_STEPS: usize = 32;

/// Bot difficulty level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotDifficulty {
    Easy,
    #[default]
    Medium,
}

#[derive(Debug, Error)]
#[error("unknown bot difficulty: {0}")]
pub struct ParseDifficultyError(String);

impl FromStr for BotDifficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(BotDifficulty::Easy),
            "medium" => Ok(BotDifficulty::Medium),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

impl fmt::Display for BotDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotDifficulty::Easy => f.write_str("easy"),
            BotDifficulty::Medium => f.write_str("medium"),
        }
    }
}

/// A bot player that can decide on actions
pub struct Bot {
    pub player_id: PlayerId,
    pub difficulty: BotDifficulty,
    rng: StdRng,
}

impl Bot {
    pub fn new(player_id: PlayerId, difficulty: BotDifficulty) -> Self {
        Self {
            player_id,
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(player_id: PlayerId, difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            player_id,
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose an action, or `None` when it is not this bot's turn
    pub fn choose_action(&mut self, game: &GameState) -> Option<GameAction> {
        if game.current_player != self.player_id {
            return None;
        }
        let valid_actions = game.valid_actions();
        if valid_actions.is_empty() {
            return None;
        }

        match self.difficulty {
            BotDifficulty::Easy => self.choose_easy(&valid_actions),
            BotDifficulty::Medium => self.choose_medium(game, &valid_actions),
        }
    }

    /// Play until control passes to another seat.
    ///
    /// Stops after [`MAX_TURN_STEPS`] actions so a table of bots cannot loop
    /// forever inside one call.
    pub fn take_turn(&mut self, game: &mut GameState) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();
        for _ in 0..MAX_TURN_STEPS {
            let Some(action) = self.choose_action(game) else {
                break;
            };
            events.extend(game.apply_action_with_rng(action, &mut self.rng)?);
            if game.current_player != self.player_id {
                break;
            }
        }
        Ok(events)
    }

    /// Easy: Just pick a random valid action
    fn choose_easy(&mut self, actions: &[GameAction]) -> Option<GameAction> {
        actions.choose(&mut self.rng).copied()
    }

    /// Medium: Use basic heuristics
    fn choose_medium(&mut self, game: &GameState, actions: &[GameAction]) -> Option<GameAction> {
        if actions.contains(&GameAction::Roll) {
            return Some(GameAction::Roll);
        }

        let settlements: Vec<IntersectionId> = actions
            .iter()
            .filter_map(|a| match a {
                GameAction::PlaceSetupSettlement(id) => Some(*id),
                _ => None,
            })
            .collect();
        if let Some(best) = settlements
            .iter()
            .max_by_key(|id| score_intersection(game, **id))
        {
            return Some(GameAction::PlaceSetupSettlement(*best));
        }

        let roads: Vec<PathId> = actions
            .iter()
            .filter_map(|a| match a {
                GameAction::PlaceSetupRoad(id) => Some(*id),
                _ => None,
            })
            .collect();
        if !roads.is_empty() {
            return self.choose_setup_road(game, &roads).map(GameAction::PlaceSetupRoad);
        }

        let robber_tiles: Vec<usize> = actions
            .iter()
            .filter_map(|a| match a {
                GameAction::MoveRobber(tile) => Some(*tile),
                _ => None,
            })
            .collect();
        if let Some(tile) = self.best_robber_tile(game, &robber_tiles) {
            return Some(GameAction::MoveRobber(tile));
        }

        // Knights only to chase the robber off our own corners
        if self.robber_score(game, game.robber_tile) < 0 {
            let knight_tiles: Vec<usize> = actions
                .iter()
                .filter_map(|a| match a {
                    GameAction::PlayKnight(tile) => Some(*tile),
                    _ => None,
                })
                .collect();
            if let Some(tile) = self.best_robber_tile(game, &knight_tiles) {
                return Some(GameAction::PlayKnight(tile));
            }
        }

        if actions.contains(&GameAction::BuyDevelopmentCard) {
            return Some(GameAction::BuyDevelopmentCard);
        }
        if actions.contains(&GameAction::BuildRoad) {
            return Some(GameAction::BuildRoad);
        }
        if actions.contains(&GameAction::EndTurn) {
            return Some(GameAction::EndTurn);
        }

        self.choose_easy(actions)
    }

    /// Prefer a free path leaving one of our settlements
    fn choose_setup_road(&mut self, game: &GameState, roads: &[PathId]) -> Option<PathId> {
        let topology = game.board.topology();
        let own_paths: Vec<PathId> = game
            .board
            .player_intersections(self.player_id)
            .into_iter()
            .filter_map(|id| topology.intersection(id))
            .flat_map(|intersection| intersection.paths.iter().copied())
            .filter(|path| game.board.path(*path) == EdgeBuilding::Empty)
            .collect();

        if let Some(path) = own_paths.choose(&mut self.rng) {
            return Some(*path);
        }
        roads.choose(&mut self.rng).copied()
    }

    fn best_robber_tile(&self, game: &GameState, tiles: &[usize]) -> Option<usize> {
        tiles
            .iter()
            .copied()
            .filter(|tile| *tile != game.robber_tile)
            .max_by_key(|tile| self.robber_score(game, *tile))
    }

    /// Opponents blocked minus own buildings blocked, weighted by tile odds
    fn robber_score(&self, game: &GameState, tile: usize) -> i32 {
        let Some(weight) = game.board.tile(tile).filter(|t| !t.is_desert()).map(|t| pips(t.number)) else {
            return 0;
        };
        game.board
            .players_adjacent_to_tile(tile)
            .into_iter()
            .map(|player| if player == self.player_id { -2 * weight } else { weight })
            .sum()
    }
}

/// Dots on a number token: chance out of 36 that it is rolled
fn pips(number: u8) -> i32 {
    if !(2..=12).contains(&number) || number == 7 {
        return 0;
    }
    6 - (7 - number as i32).abs()
}

/// Pip total of the producing tiles around an intersection, plus a bonus per
/// distinct resource
fn score_intersection(game: &GameState, id: IntersectionId) -> i32 {
    let mut score = 0;
    let mut resources = Vec::new();
    for tile in game.board.topology().tiles_at(id) {
        let Some(tile) = game.board.tile(*tile) else {
            continue;
        };
        if let Some(resource) = tile.resource() {
            score += pips(tile.number);
            if !resources.contains(&resource) {
                resources.push(resource);
            }
        }
    }
    score * 2 + resources.len() as i32
}
