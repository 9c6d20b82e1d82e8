//! The shared bank and every resource transfer that touches it.
//!
//! Units only move between the bank and player hands through [`Bank::distribute`]
//! and [`Bank::spend`], so for each resource the bank plus all player hands
//! always add up to the starting bank.

use crate::board::{Board, PlayerId, Resource};
use crate::game::GameError;
use crate::player::{Player, ResourceHand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Units of each resource in a fresh bank
pub const STARTING_BANK_PER_RESOURCE: u32 = 19;

/// Finite pool of resources not held by any player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bank {
    resources: ResourceHand,
}

impl Bank {
    pub fn new(resources: ResourceHand) -> Self {
        Self { resources }
    }

    /// 19 of each producible resource
    pub fn standard() -> Self {
        Self::new(ResourceHand::uniform(STARTING_BANK_PER_RESOURCE))
    }

    pub fn resources(&self) -> &ResourceHand {
        &self.resources
    }

    pub fn available(&self, resource: Resource) -> u32 {
        self.resources.get(resource)
    }

    /// Return units to the bank
    pub fn receive(&mut self, hand: &ResourceHand) {
        self.resources.add_hand(hand);
    }

    /// Pay out a roll.
    ///
    /// Requests are settled in player-id order and clamped to what is left in
    /// the bank, so an early player can exhaust a resource before a later one
    /// is paid. Players without a seat in `players` are skipped.
    pub fn distribute(
        &mut self,
        board: &Board,
        robber_tile: usize,
        roll: u8,
        players: &mut [Player],
    ) -> Production {
        let requested = board.production(roll, robber_tile);
        let mut granted = BTreeMap::new();

        for player in players.iter_mut() {
            let Some(request) = requested.get(&player.id) else {
                granted.insert(player.id, ResourceHand::new());
                continue;
            };

            let mut paid = ResourceHand::new();
            for (resource, amount) in request.iter() {
                let moved = amount.min(self.available(resource));
                self.resources.set(resource, self.available(resource) - moved);
                paid.add(resource, moved);
            }
            player.resources.add_hand(&paid);
            granted.insert(player.id, paid);
        }

        Production {
            roll,
            requested,
            granted,
        }
    }

    /// Move `cost` from the player to the bank, or nothing at all
    pub fn spend(&mut self, player: &mut Player, cost: &ResourceHand) -> Result<(), GameError> {
        player.resources.subtract(cost)?;
        self.receive(cost);
        Ok(())
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::standard()
    }
}

/// Outcome of a production roll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    /// Dice total
    pub roll: u8,
    /// What the board owed each player before the bank limit
    pub requested: BTreeMap<PlayerId, ResourceHand>,
    /// What each player actually received
    pub granted: BTreeMap<PlayerId, ResourceHand>,
}

impl Production {
    /// A roll that produced nothing (7s, or no buildings on matching tiles)
    pub fn empty(roll: u8) -> Self {
        Self {
            roll,
            ..Self::default()
        }
    }

    /// Units received by a player (zero hand if none)
    pub fn granted_to(&self, player: PlayerId) -> ResourceHand {
        self.granted.get(&player).copied().unwrap_or_default()
    }

    /// Total units paid out across all players
    pub fn total_granted(&self) -> u32 {
        self.granted.values().map(ResourceHand::total).sum()
    }

    /// Whether the bank fell short of any request
    pub fn was_clamped(&self) -> bool {
        self.requested
            .iter()
            .any(|(player, hand)| self.granted_to(*player) != *hand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Tile, VertexBuilding};
    use crate::topology::IntersectionId;
    use pretty_assertions::assert_eq;

    fn players(count: u8) -> Vec<Player> {
        (0..count).map(|i| Player::new(i, format!("Human {}", i + 1))).collect()
    }

    /// Wheat 8 on tile 4, everything else desert
    fn wheat_board() -> Board {
        let mut tiles = vec![Tile::desert(); 19];
        tiles[4] = Tile::new_resource(Resource::Wheat, 8);
        Board::from_tiles(tiles).unwrap()
    }

    fn settle(board: &mut Board, tile: usize, corner: usize, building: VertexBuilding) -> IntersectionId {
        let id = board.topology().intersection_at(tile, corner).unwrap();
        board.occupy_intersection(id, building).unwrap();
        id
    }

    #[test]
    fn test_distribute_credits_player_and_debits_bank() {
        let mut board = wheat_board();
        settle(&mut board, 4, 0, VertexBuilding::Settlement(0));
        let mut players = players(2);
        let mut bank = Bank::standard();

        let production = bank.distribute(&board, 0, 8, &mut players);

        assert_eq!(players[0].resources, ResourceHand::single(Resource::Wheat, 1));
        assert_eq!(bank.available(Resource::Wheat), 18);
        assert_eq!(production.granted_to(1), ResourceHand::new());
        assert!(!production.was_clamped());
    }

    #[test]
    fn test_depleted_bank_pays_nothing() {
        let mut board = wheat_board();
        settle(&mut board, 4, 0, VertexBuilding::Settlement(0));
        let mut players = players(2);
        let mut bank = Bank::standard();
        bank.resources.set(Resource::Wheat, 0);

        let production = bank.distribute(&board, 0, 8, &mut players);

        assert_eq!(production.requested.get(&0), Some(&ResourceHand::single(Resource::Wheat, 1)));
        assert_eq!(production.granted_to(0), ResourceHand::new());
        assert_eq!(bank.available(Resource::Wheat), 0);
        assert_eq!(players[0].resources.wheat, 0);
        assert!(production.was_clamped());
    }

    #[test]
    fn test_scarce_bank_pays_lower_ids_first() {
        let mut board = wheat_board();
        settle(&mut board, 4, 0, VertexBuilding::City(0));
        settle(&mut board, 4, 3, VertexBuilding::City(1));
        let mut players = players(2);
        let mut bank = Bank::standard();
        bank.resources.set(Resource::Wheat, 3);

        let production = bank.distribute(&board, 0, 8, &mut players);

        assert_eq!(production.granted_to(0), ResourceHand::single(Resource::Wheat, 2));
        assert_eq!(production.granted_to(1), ResourceHand::single(Resource::Wheat, 1));
        assert_eq!(bank.available(Resource::Wheat), 0);
    }

    #[test]
    fn test_spend_moves_cost_to_bank() {
        let mut bank = Bank::standard();
        let mut player = Player::new(0, "Human 1");
        player.resources = ResourceHand::with_amounts(2, 1, 0, 0, 0);
        bank.resources.set(Resource::Wood, 17);
        bank.resources.set(Resource::Brick, 18);

        bank.spend(&mut player, &ResourceHand::with_amounts(1, 1, 0, 0, 0)).unwrap();

        assert_eq!(player.resources, ResourceHand::with_amounts(1, 0, 0, 0, 0));
        assert_eq!(bank.available(Resource::Wood), 18);
        assert_eq!(bank.available(Resource::Brick), 19);
    }

    #[test]
    fn test_failed_spend_changes_nothing() {
        let mut bank = Bank::standard();
        let mut player = Player::new(0, "Human 1");
        player.resources = ResourceHand::single(Resource::Wood, 1);

        let result = bank.spend(&mut player, &ResourceHand::with_amounts(1, 1, 0, 0, 0));

        assert_eq!(result, Err(GameError::InsufficientResources));
        assert_eq!(player.resources, ResourceHand::single(Resource::Wood, 1));
        assert_eq!(bank, Bank::standard());
    }

    #[test]
    fn test_bank_serializes_as_plain_hand() {
        let json = serde_json::to_value(Bank::standard()).unwrap();
        assert_eq!(json["wheat"], 19);
    }
}
